//! The `Cell`: one grid position and everything needed to render it.
//!
//! Kept deliberately small and `Copy`-free-but-cheap-to-clone since it lives
//! in a contiguous pool (see [`crate::linebuffer::LineBuffer`]) and is the
//! hottest data structure in the engine (spec §3).

use unicode_width::UnicodeWidthChar;

/// Number of inline combining-mark slots per cell.
///
/// Spec §9 notes this as a documented choice: a fixed array keeps `Cell`
/// small; we do not spill to a side table. Slots beyond this are dropped
/// (matching how real terminals cap combining mark counts per grapheme).
pub const MAX_COMBINING_MARKS: usize = 3;

/// Visual width a cell's primary codepoint occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Width {
    /// Zero-width: this cell is the trailer of the wide cell to its left,
    /// or carries a zero-width codepoint.
    Zero,
    #[default]
    Narrow,
    Wide,
}

impl Width {
    pub fn cells(self) -> u8 {
        match self {
            Width::Zero => 0,
            Width::Narrow => 1,
            Width::Wide => 2,
        }
    }
}

/// Underline rendering style (spec §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnderlineStyle {
    #[default]
    None,
    Straight,
    Double,
    Curly,
    Dotted,
    Dashed,
}

bitflags::bitflags! {
    /// Boolean/small-enum attributes that aren't colors or underline style.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct CellFlags: u16 {
        const BOLD                  = 1 << 0;
        const ITALIC                = 1 << 1;
        const REVERSE                = 1 << 2;
        const STRIKETHROUGH          = 1 << 3;
        const DIM                   = 1 << 4;
        /// Set on the last cell of a row that wrapped into the next row
        /// without an explicit line feed (the "soft wrap" continuation flag).
        const NEXT_CHAR_WAS_WRAPPED  = 1 << 5;
        /// This cell carries a user mark (see `mark_id` for which one).
        const MARKED                 = 1 << 6;
        /// This cell is the image-placeholder sentinel (U+10EEEE family).
        const IMAGE_PLACEHOLDER      = 1 << 7;
    }
}

/// A single grid position.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Primary codepoint. 0 means "empty" (rendered as a space).
    pub codepoint: u32,
    /// Up to [`MAX_COMBINING_MARKS`] combining codepoints attached to
    /// `codepoint`. Unused slots are 0. Slot 0 doubles as tab-width storage
    /// for the TAB sentinel cell (spec §4.2 "tab").
    pub marks: [u32; MAX_COMBINING_MARKS],
    pub width: Width,
    pub flags: CellFlags,
    pub underline: UnderlineStyle,
    pub mark_id: u16,
    pub fg: crate::color::Color,
    pub bg: crate::color::Color,
    pub decoration: crate::color::Color,
    /// 0 = no hyperlink; otherwise an index into an external hyperlink pool.
    pub hyperlink_id: u16,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            codepoint: 0,
            marks: [0; MAX_COMBINING_MARKS],
            width: Width::Narrow,
            flags: CellFlags::empty(),
            underline: UnderlineStyle::None,
            mark_id: 0,
            fg: crate::color::Color::Default,
            bg: crate::color::Color::Default,
            decoration: crate::color::Color::Default,
            hyperlink_id: 0,
        }
    }
}

impl Cell {
    /// A blank cell carrying the given colors/attributes (used when erasing
    /// with the cursor's current SGR state, spec §4.2 `erase_in_line`).
    pub fn blank_with(fg: crate::color::Color, bg: crate::color::Color) -> Self {
        Self {
            fg,
            bg,
            ..Self::default()
        }
    }

    pub fn new(ch: char) -> Self {
        let mut cell = Self::default();
        cell.set_char(ch);
        cell
    }

    pub fn is_empty(&self) -> bool {
        self.codepoint == 0
    }

    /// True if this cell is the zero-width trailer of a wide character.
    pub fn is_wide_spacer(&self) -> bool {
        self.width == Width::Zero && self.codepoint == 0
    }

    pub fn is_wide(&self) -> bool {
        self.width == Width::Wide
    }

    pub fn has_combining_chars(&self) -> bool {
        self.marks.iter().any(|&m| m != 0)
    }

    /// The cell's primary character, or a space for an empty cell.
    pub fn base_char(&self) -> char {
        if self.codepoint == 0 {
            ' '
        } else {
            char::from_u32(self.codepoint).unwrap_or(' ')
        }
    }

    /// Full grapheme cluster: base char plus any attached combining marks.
    pub fn get_grapheme(&self) -> String {
        if !self.has_combining_chars() {
            return self.base_char().to_string();
        }
        let mut s = String::with_capacity(1 + MAX_COMBINING_MARKS);
        s.push(self.base_char());
        for &m in &self.marks {
            if m != 0 {
                if let Some(c) = char::from_u32(m) {
                    s.push(c);
                }
            }
        }
        s
    }

    /// Overwrite the primary character, clearing any attached marks.
    pub fn set_char(&mut self, ch: char) {
        self.codepoint = ch as u32;
        self.marks = [0; MAX_COMBINING_MARKS];
        self.width = width_of(ch);
    }

    /// Attach a combining mark codepoint in the first free slot.
    /// No-op (silently dropped, per spec §7 "never raise") once full.
    pub fn push_mark(&mut self, mark: char) {
        if self.codepoint == 0 {
            return;
        }
        for slot in &mut self.marks {
            if *slot == 0 {
                *slot = mark as u32;
                return;
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Cell::blank_with(self.fg, self.bg);
        self.fg = crate::color::Color::Default;
        self.bg = crate::color::Color::Default;
    }

    /// Clear but keep current SGR colors/attributes (used by erase ops when
    /// `private` is false, spec §4.2).
    pub fn clear_keep_style(&mut self) {
        let fg = self.fg;
        let bg = self.bg;
        let flags = self.flags;
        let underline = self.underline;
        *self = Cell::default();
        self.fg = fg;
        self.bg = bg;
        self.flags = flags & (CellFlags::BOLD | CellFlags::ITALIC | CellFlags::DIM);
        self.underline = underline;
    }
}

/// `wcwidth`-style width classification (spec §4.2 "draw text").
///
/// `-1` ("control/ambiguous, treat as 1") from the spec maps to `Narrow`;
/// a genuine control character is never routed here (the draw-text loop
/// dispatches `ch < 0x20` before computing width).
pub fn wcwidth_std(ch: char) -> Width {
    match UnicodeWidthChar::width(ch) {
        None => Width::Zero,
        Some(0) => Width::Zero,
        Some(1) => Width::Narrow,
        Some(_) => Width::Wide,
    }
}

fn width_of(ch: char) -> Width {
    wcwidth_std(ch)
}

/// U+FE0F VARIATION SELECTOR-16 (emoji presentation): upgrades width.
pub const VS16: char = '\u{FE0F}';
/// U+FE0E VARIATION SELECTOR-15 (text presentation): downgrades width.
pub const VS15: char = '\u{FE0E}';

/// True for the two ranges that make up Regional Indicator Symbols
/// (flag emoji halves, U+1F1E6..=U+1F1FF).
pub fn is_flag_codepoint(ch: char) -> bool {
    matches!(ch as u32, 0x1F1E6..=0x1F1FF)
}

/// Format controls the draw-text loop skips outright (spec §4.2).
pub fn is_ignored(ch: char) -> bool {
    matches!(
        ch as u32,
        0x200B..=0x200F // ZWSP, ZWNJ, ZWJ, LRM/RLM family
            | 0x202A..=0x202E // embedding/override controls
            | 0x2060..=0x2064
            | 0xFEFF // BOM / ZWNBSP
    )
}

pub fn is_combining(ch: char) -> bool {
    if ch == VS16 || ch == VS15 {
        return true;
    }
    matches!(ch as u32,
        0x0300..=0x036F   // combining diacritical marks
        | 0x1AB0..=0x1AFF
        | 0x1DC0..=0x1DFF
        | 0x20D0..=0x20FF
        | 0xFE20..=0xFE2F
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_cell_is_empty() {
        let c = Cell::default();
        assert!(c.is_empty());
        assert_eq!(c.base_char(), ' ');
    }

    #[test]
    fn wide_char_reports_width_two() {
        let c = Cell::new('\u{4E2D}'); // 中
        assert_eq!(c.width, Width::Wide);
    }

    #[test]
    fn combining_mark_appends_to_grapheme() {
        let mut c = Cell::new('e');
        c.push_mark('\u{0301}'); // combining acute accent
        assert_eq!(c.get_grapheme(), "e\u{0301}");
        assert!(c.has_combining_chars());
    }

    #[test]
    fn marks_overflow_is_dropped_not_panicking() {
        let mut c = Cell::new('a');
        for i in 0..10 {
            c.push_mark(char::from_u32(0x0300 + i).unwrap());
        }
        assert_eq!(c.marks.iter().filter(|&&m| m != 0).count(), MAX_COMBINING_MARKS);
    }
}
