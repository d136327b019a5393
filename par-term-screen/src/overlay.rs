//! Overlay line: IME composition text rendered at the cursor row without
//! mutating the underlying cells (spec §4.6).

use crate::cell::Cell;
use crate::line::Line;
use unicode_width::UnicodeWidthStr;

#[derive(Debug, Clone, Default)]
pub struct OverlayState {
    pub is_active: bool,
    pub ynum: usize,
    pub xstart: usize,
    pub xnum: usize,
    pub cursor_x: usize,
    pub overlay_text: String,
    original_line: Option<Line>,
    pub is_dirty: bool,
}

impl OverlayState {
    /// Replace the composing text. An empty string just deactivates the
    /// overlay (spec §4.6 "An empty `str` just deactivates").
    pub fn update_text(&mut self, text: &str, cursor_x: usize, cursor_y: usize, columns: usize) {
        self.deactivate_without_restoring();
        if text.is_empty() {
            return;
        }
        self.is_active = true;
        self.ynum = cursor_y;
        self.xnum = UnicodeWidthStr::width(text);
        self.xstart = if cursor_x + self.xnum > columns {
            columns.saturating_sub(self.xnum)
        } else {
            cursor_x
        };
        self.cursor_x = cursor_x;
        self.overlay_text = text.to_string();
        self.is_dirty = true;
    }

    fn deactivate_without_restoring(&mut self) {
        self.is_active = false;
        self.original_line = None;
        self.overlay_text.clear();
    }

    /// Update positions when the real cursor moves while composing (spec
    /// §4.6 "Cursor motion while active updates xstart/ynum").
    pub fn follow_cursor(&mut self, cursor_x: usize, cursor_y: usize, columns: usize) {
        if !self.is_active {
            return;
        }
        self.ynum = cursor_y;
        self.xstart = if cursor_x + self.xnum > columns {
            columns.saturating_sub(self.xnum)
        } else {
            cursor_x
        };
        self.cursor_x = cursor_x;
        self.is_dirty = true;
    }

    /// Draw the overlay text onto `line` (normally a clone of the real row
    /// at `ynum`), saving the untouched original so [`Self::restore`] can
    /// put it back after the frame is captured.
    pub fn render_onto(&mut self, line: &mut Line) {
        if !self.is_active {
            return;
        }
        self.original_line = Some(line.clone());
        let mut x = self.xstart;
        for ch in self.overlay_text.chars() {
            if x >= line.columns() {
                break;
            }
            let cell = Cell::new(ch);
            let w = cell.width.cells().max(1) as usize;
            *line.cell_mut(x).unwrap() = cell;
            x += w;
        }
        self.is_dirty = false;
    }

    /// Undo [`Self::render_onto`] so the next frame without IME changes
    /// compares equal to the untouched grid (spec §4.6).
    pub fn restore(&mut self, line: &mut Line) {
        if let Some(saved) = self.original_line.take() {
            *line = saved;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_deactivates() {
        let mut overlay = OverlayState::default();
        overlay.update_text("draft", 2, 1, 20);
        assert!(overlay.is_active);
        overlay.update_text("", 2, 1, 20);
        assert!(!overlay.is_active);
    }

    #[test]
    fn render_then_restore_is_identity() {
        let mut overlay = OverlayState::default();
        overlay.update_text("hi", 0, 0, 10);
        let mut line = Line::new(10);
        let before = line.clone();
        overlay.render_onto(&mut line);
        assert_eq!(line.text().trim_end(), "hi");
        overlay.restore(&mut line);
        assert_eq!(line.text(), before.text());
    }

    #[test]
    fn overflowing_overlay_right_aligns() {
        let mut overlay = OverlayState::default();
        overlay.update_text("0123456789", 8, 0, 10);
        assert_eq!(overlay.xstart, 0);
    }
}
