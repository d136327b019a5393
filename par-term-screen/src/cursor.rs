//! Cursor position/style and the save/restore stack DECSC/DECRC rely on
//! (spec §3, §4.2 "cursor").

use crate::cell::UnderlineStyle;
use crate::color::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorShape {
    #[default]
    Block,
    Underline,
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CursorStyle {
    pub shape: CursorShape,
    pub blinking: bool,
}

/// The subset of graphics-rendition state that travels with a cursor
/// save/restore (spec §4.2 "save_cursor"/"restore_cursor").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphicsState {
    pub fg: Color,
    pub bg: Color,
    pub decoration: Color,
    pub flags: crate::cell::CellFlags,
    pub underline: UnderlineStyle,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            fg: Color::Default,
            bg: Color::Default,
            decoration: Color::Default,
            flags: crate::cell::CellFlags::empty(),
            underline: UnderlineStyle::None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cursor {
    pub x: usize,
    pub y: usize,
    pub visible: bool,
    pub style: CursorStyle,
    pub graphics: GraphicsState,
    /// Set by `draw_text` when the cursor sits just past the last column;
    /// the *next* printable character wraps instead of overflowing (the
    /// classic "deferred autowrap" flag, spec §4.2 "draw_text" edge cases).
    pub pending_wrap: bool,
    /// Saved origin-mode flag at cursor-save time (DECOM interacts with
    /// DECSC/DECRC, spec §4.2 "set_mode").
    pub origin_mode: bool,
    /// 0 = no active hyperlink; otherwise an id into the host's hyperlink
    /// pool, applied to every cell subsequently drawn (spec §3 "Cursor").
    pub active_hyperlink_id: u16,
}

impl Default for Cursor {
    fn default() -> Self {
        Self {
            x: 0,
            y: 0,
            visible: true,
            style: CursorStyle::default(),
            graphics: GraphicsState::default(),
            pending_wrap: false,
            origin_mode: false,
            active_hyperlink_id: 0,
        }
    }
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset_pending_wrap(&mut self) {
        self.pending_wrap = false;
    }
}

/// A fixed-depth save stack. Real terminals only ever nest one level deep
/// (DECSC/DECRC aren't meant to recurse), but xterm keeps a small stack so
/// nested save/restore from scripts doesn't clobber outer state; we mirror
/// that rather than hard-coding depth 1.
#[derive(Debug, Clone, Default)]
pub struct CursorSaveStack {
    stack: Vec<Cursor>,
}

impl CursorSaveStack {
    pub fn push(&mut self, cursor: Cursor) {
        self.stack.push(cursor);
    }

    pub fn pop(&mut self) -> Option<Cursor> {
        self.stack.pop()
    }

    /// Non-destructive peek, used by DECRC when no save has happened yet
    /// (falls back to the cursor's current state per xterm behavior).
    pub fn last(&self) -> Option<&Cursor> {
        self.stack.last()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_restore_round_trips_position_and_graphics() {
        let mut stack = CursorSaveStack::default();
        let mut cursor = Cursor::new();
        cursor.x = 10;
        cursor.y = 4;
        cursor.graphics.fg = Color::Indexed(3);
        stack.push(cursor);

        let mut restored = Cursor::new();
        restored.x = 99;
        let saved = stack.pop().unwrap();
        restored.x = saved.x;
        restored.y = saved.y;
        restored.graphics = saved.graphics;

        assert_eq!(restored.x, 10);
        assert_eq!(restored.y, 4);
        assert_eq!(restored.graphics.fg, Color::Indexed(3));
    }

    #[test]
    fn restore_with_empty_stack_leaves_caller_to_use_current_cursor() {
        let stack = CursorSaveStack::default();
        assert!(stack.last().is_none());
        assert!(stack.is_empty());
    }
}
