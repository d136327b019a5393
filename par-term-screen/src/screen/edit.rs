//! Edit operations: erase/insert/delete families, SGR, and DECALN (spec
//! §4.2 "Edit operations", "SGR").

use super::{Region, Screen, SgrRegionMode};
use crate::cell::{CellFlags, UnderlineStyle};
use crate::color::{Color, NamedColor};

impl Screen {
    // ---- erase (spec §4.2 `erase_in_line`/`erase_in_display`) -----------

    /// `mode`: 0 = cursor..end, 1 = start..cursor, 2 = full line. When
    /// `private` (DECSEL, `CSI ? Ps K`) leave cell attributes/colors
    /// unchanged; otherwise apply the cursor's current background like a
    /// normal erase.
    pub fn erase_in_line(&mut self, mode: u16, private: bool) {
        let y = self.cursor().y;
        let columns = self.columns();
        let x = self.cursor().x;
        let (from, to) = match mode {
            0 => (x, columns),
            1 => (0, x + 1),
            2 => (0, columns),
            _ => return,
        };
        self.erase_cells(y, from, to.min(columns), private);
        self.mark_row_dirty(y);
    }

    /// `mode`: 0 cursor..end-of-screen, 1 start..cursor, 2 all, 22 move
    /// visible content to scrollback then act as 2 (main only), 3 all +
    /// clear scrollback.
    pub fn erase_in_display(&mut self, mode: u16) {
        self.erase_in_display_ex(mode, false);
    }

    pub(crate) fn erase_in_display_ex(&mut self, mode: u16, private: bool) {
        let rows = self.rows();
        let y = self.cursor().y;
        match mode {
            0 => {
                self.erase_in_line(0, private);
                for row in (y + 1)..rows {
                    self.clear_row_respecting_private(row, private);
                }
            }
            1 => {
                self.erase_in_line(1, private);
                for row in 0..y {
                    self.clear_row_respecting_private(row, private);
                }
            }
            2 => {
                for row in 0..rows {
                    self.clear_row_respecting_private(row, private);
                }
            }
            22 => {
                if self.is_main() {
                    for row in 0..rows {
                        let line = self.linebuf().line(row).clone();
                        self.historybuf_mut().push(line);
                    }
                }
                self.erase_in_display_ex(2, private);
                return;
            }
            3 => {
                self.erase_in_display_ex(2, private);
                self.historybuf_mut().clear();
            }
            _ => return,
        }
        self.graphics.remove_cell_images_in_range(0, rows.saturating_sub(1));
    }

    fn clear_row_respecting_private(&mut self, y: usize, private: bool) {
        if private {
            let line = self.linebuf_mut().line_mut(y);
            for cell in line.cells_mut() {
                cell.clear_keep_style();
            }
            self.mark_row_dirty(y);
        } else {
            self.clear_row(y);
        }
    }

    fn erase_cells(&mut self, y: usize, from: usize, to: usize, private: bool) {
        if from >= to {
            return;
        }
        let blank = self.blank_cell();
        let line = self.linebuf_mut().line_mut(y);
        for cell in &mut line.cells_mut()[from..to] {
            if private {
                cell.clear_keep_style();
            } else {
                *cell = blank.clone();
            }
        }
    }

    // ---- insert/delete lines (spec §4.2) --------------------------------

    /// Only effective while the cursor sits inside the scrolling region.
    pub fn insert_lines(&mut self, n: usize) {
        let (top, bottom) = self.margins();
        let y = self.cursor().y;
        if y < top || y > bottom || n == 0 {
            return;
        }
        self.linebuf_mut().insert_lines(n, y, bottom);
        self.graphics.remove_cell_images_in_range(y, bottom);
        self.mark_region_dirty(y, bottom);
    }

    pub fn delete_lines(&mut self, n: usize) {
        let (top, bottom) = self.margins();
        let y = self.cursor().y;
        if y < top || y > bottom || n == 0 {
            return;
        }
        self.linebuf_mut().delete_lines(n, y, bottom);
        self.graphics.remove_cell_images_in_range(y, bottom);
        self.mark_region_dirty(y, bottom);
    }

    // ---- insert/delete/erase characters (spec §4.2) ---------------------

    pub fn insert_characters(&mut self, n: usize) {
        let y = self.cursor().y;
        let x = self.cursor().x;
        let blank = self.blank_cell();
        let line = self.linebuf_mut().line_mut(y);
        let columns = line.columns();
        if x >= columns {
            return;
        }
        let n = n.min(columns - x);
        let mut i = columns;
        while i > x + n {
            i -= 1;
            line.cells_mut()[i] = line.cells()[i - n].clone();
        }
        for cell in &mut line.cells_mut()[x..x + n] {
            *cell = blank.clone();
        }
        self.mark_row_dirty(y);
    }

    pub fn delete_characters(&mut self, n: usize) {
        let y = self.cursor().y;
        let x = self.cursor().x;
        let blank = self.blank_cell();
        let line = self.linebuf_mut().line_mut(y);
        let columns = line.columns();
        if x >= columns {
            return;
        }
        let n = n.min(columns - x);
        for i in x..(columns - n) {
            line.cells_mut()[i] = line.cells()[i + n].clone();
        }
        for cell in &mut line.cells_mut()[(columns - n)..columns] {
            *cell = blank.clone();
        }
        self.mark_row_dirty(y);
    }

    pub fn erase_characters(&mut self, n: usize) {
        let y = self.cursor().y;
        let x = self.cursor().x;
        let columns = self.columns();
        self.erase_cells(y, x, (x + n).min(columns), false);
        self.mark_row_dirty(y);
    }

    /// DECALN: fill every visible cell with `'E'`, home the cursor, full
    /// region (spec §4.2 `alignment_display`).
    pub fn alignment_display(&mut self) {
        let rows = self.rows();
        let columns = self.columns();
        for y in 0..rows {
            let line = self.linebuf_mut().line_mut(y);
            for x in 0..columns {
                line.cells_mut()[x].set_char('E');
            }
            self.mark_row_dirty(y);
        }
        self.cursor_position(1, 1);
    }

    // ---- SGR (spec §4.2 "SGR") -------------------------------------------

    /// With no `region`, updates the cursor's pending graphics state so it
    /// applies to subsequently drawn cells. With a region, directly
    /// rewrites the GPU-attribute bytes of cells inside it — rectangular
    /// or linear depending on `self.sgr_region_mode()` (DECSACE).
    pub fn select_graphic_rendition(&mut self, params: &[SgrParam], region: Option<Region>) {
        match region {
            None => {
                let mut graphics = self.cursor().graphics;
                apply_sgr_params(&mut graphics, params);
                self.cursor_mut().graphics = graphics;
            }
            Some(region) => match self.sgr_region_mode() {
                SgrRegionMode::Rectangular => self.apply_sgr_rect(region, params),
                SgrRegionMode::Linear => self.apply_sgr_linear(region, params),
            },
        }
    }

    fn apply_sgr_rect(&mut self, region: Region, params: &[SgrParam]) {
        let bottom = region.bottom.min(self.rows().saturating_sub(1));
        let right = region.right.min(self.columns());
        for y in region.top..=bottom {
            let line = self.linebuf_mut().line_mut(y);
            for x in region.left..right.min(line.columns()) {
                let mut graphics = cell_graphics(&line.cells()[x]);
                apply_sgr_params(&mut graphics, params);
                write_cell_graphics(&mut line.cells_mut()[x], &graphics);
            }
            self.mark_row_dirty(y);
        }
    }

    fn apply_sgr_linear(&mut self, region: Region, params: &[SgrParam]) {
        let bottom = region.bottom.min(self.rows().saturating_sub(1));
        for y in region.top..=bottom {
            let line = self.linebuf_mut().line_mut(y);
            let columns = line.columns();
            let (from, to) = if y == region.top && y == bottom {
                (region.left, region.right.min(columns))
            } else if y == region.top {
                (region.left, columns)
            } else if y == bottom {
                (0, region.right.min(columns))
            } else {
                (0, columns)
            };
            for x in from..to {
                let mut graphics = cell_graphics(&line.cells()[x]);
                apply_sgr_params(&mut graphics, params);
                write_cell_graphics(&mut line.cells_mut()[x], &graphics);
            }
            self.mark_row_dirty(y);
        }
    }
}

/// One parsed SGR parameter, sub-parameters intact (spec §4.2
/// "`is_sub_param_group`" — e.g. `4:3` for curly underline arrives as
/// `Underline(Some(3))` rather than two flat params).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SgrParam {
    Reset,
    Bold,
    Dim,
    Italic,
    Underline(Option<u16>),
    NoUnderline,
    Reverse,
    NoReverse,
    Strikethrough,
    NoStrikethrough,
    NoBoldDim,
    NoItalic,
    Foreground(Color),
    Background(Color),
    Decoration(Color),
    DefaultForeground,
    DefaultBackground,
    DefaultDecoration,
}

fn apply_sgr_params(graphics: &mut crate::cursor::GraphicsState, params: &[SgrParam]) {
    for &p in params {
        match p {
            SgrParam::Reset => *graphics = crate::cursor::GraphicsState::default(),
            SgrParam::Bold => graphics.flags.insert(CellFlags::BOLD),
            SgrParam::Dim => graphics.flags.insert(CellFlags::DIM),
            SgrParam::NoBoldDim => graphics.flags.remove(CellFlags::BOLD | CellFlags::DIM),
            SgrParam::Italic => graphics.flags.insert(CellFlags::ITALIC),
            SgrParam::NoItalic => graphics.flags.remove(CellFlags::ITALIC),
            SgrParam::Underline(sub) => {
                graphics.underline = match sub {
                    None | Some(1) => UnderlineStyle::Straight,
                    Some(2) => UnderlineStyle::Double,
                    Some(3) => UnderlineStyle::Curly,
                    Some(4) => UnderlineStyle::Dotted,
                    Some(5) => UnderlineStyle::Dashed,
                    Some(0) => UnderlineStyle::None,
                    _ => UnderlineStyle::Straight,
                };
            }
            SgrParam::NoUnderline => graphics.underline = UnderlineStyle::None,
            SgrParam::Reverse => graphics.flags.insert(CellFlags::REVERSE),
            SgrParam::NoReverse => graphics.flags.remove(CellFlags::REVERSE),
            SgrParam::Strikethrough => graphics.flags.insert(CellFlags::STRIKETHROUGH),
            SgrParam::NoStrikethrough => graphics.flags.remove(CellFlags::STRIKETHROUGH),
            SgrParam::Foreground(c) => graphics.fg = c,
            SgrParam::Background(c) => graphics.bg = c,
            SgrParam::Decoration(c) => graphics.decoration = c,
            SgrParam::DefaultForeground => graphics.fg = Color::Default,
            SgrParam::DefaultBackground => graphics.bg = Color::Default,
            SgrParam::DefaultDecoration => graphics.decoration = Color::Default,
        }
    }
}

fn cell_graphics(cell: &crate::cell::Cell) -> crate::cursor::GraphicsState {
    crate::cursor::GraphicsState {
        fg: cell.fg,
        bg: cell.bg,
        decoration: cell.decoration,
        flags: cell.flags & (CellFlags::BOLD | CellFlags::ITALIC | CellFlags::REVERSE | CellFlags::STRIKETHROUGH | CellFlags::DIM),
        underline: cell.underline,
    }
}

fn write_cell_graphics(cell: &mut crate::cell::Cell, graphics: &crate::cursor::GraphicsState) {
    cell.fg = graphics.fg;
    cell.bg = graphics.bg;
    cell.decoration = graphics.decoration;
    cell.underline = graphics.underline;
    let preserved = cell.flags
        & !(CellFlags::BOLD | CellFlags::ITALIC | CellFlags::REVERSE | CellFlags::STRIKETHROUGH | CellFlags::DIM);
    cell.flags = preserved | graphics.flags;
}

/// Convenience for callers translating raw SGR integer codes (spec's
/// `select_graphic_rendition(params, ...)` contract leaves parsing to the
/// caller/parser; this is the mapping the parser is expected to use).
pub fn sgr_param_from_code(code: u16, sub: Option<u16>) -> Option<SgrParam> {
    Some(match code {
        0 => SgrParam::Reset,
        1 => SgrParam::Bold,
        2 => SgrParam::Dim,
        3 => SgrParam::Italic,
        4 => SgrParam::Underline(sub),
        5 | 6 => return None, // blink: not modeled (spec's Cell has no blink flag)
        7 => SgrParam::Reverse,
        9 => SgrParam::Strikethrough,
        21 => SgrParam::Underline(Some(2)),
        22 => SgrParam::NoBoldDim,
        23 => SgrParam::NoItalic,
        24 => SgrParam::NoUnderline,
        27 => SgrParam::NoReverse,
        29 => SgrParam::NoStrikethrough,
        30..=37 => SgrParam::Foreground(Color::Named(named_from_offset(code - 30))),
        38 => return None, // extended color: caller parses the full sequence itself
        39 => SgrParam::DefaultForeground,
        40..=47 => SgrParam::Background(Color::Named(named_from_offset(code - 40))),
        48 => return None,
        49 => SgrParam::DefaultBackground,
        58 => return None,
        59 => SgrParam::DefaultDecoration,
        90..=97 => SgrParam::Foreground(Color::Named(named_from_offset(code - 90 + 8))),
        100..=107 => SgrParam::Background(Color::Named(named_from_offset(code - 100 + 8))),
        _ => return None,
    })
}

fn named_from_offset(offset: u16) -> NamedColor {
    const TABLE: [NamedColor; 16] = [
        NamedColor::Black,
        NamedColor::Red,
        NamedColor::Green,
        NamedColor::Yellow,
        NamedColor::Blue,
        NamedColor::Magenta,
        NamedColor::Cyan,
        NamedColor::White,
        NamedColor::BrightBlack,
        NamedColor::BrightRed,
        NamedColor::BrightGreen,
        NamedColor::BrightYellow,
        NamedColor::BrightBlue,
        NamedColor::BrightMagenta,
        NamedColor::BrightCyan,
        NamedColor::BrightWhite,
    ];
    TABLE[offset as usize % 16]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;

    fn screen(rows: usize, cols: usize) -> Screen {
        Screen::new(rows, cols, 1000, Box::new(NullHost))
    }

    #[test]
    fn erase_in_line_mode_0_clears_cursor_to_end() {
        let mut s = screen(3, 10);
        s.draw_text("abcdefg");
        s.cursor_position(1, 3);
        s.erase_in_line(0, false);
        assert_eq!(s.linebuf().line(0).text().trim_end(), "ab");
    }

    #[test]
    fn insert_characters_shifts_right_and_blanks() {
        let mut s = screen(3, 10);
        s.draw_text("abc");
        s.cursor_position(1, 2);
        s.insert_characters(2);
        assert_eq!(s.linebuf().line(0).text().trim_end(), "a  bc");
        assert_eq!(s.cursor().x, 1);
    }

    #[test]
    fn delete_characters_shifts_left() {
        let mut s = screen(3, 10);
        s.draw_text("abcdef");
        s.cursor_position(1, 2);
        s.delete_characters(2);
        assert_eq!(s.linebuf().line(0).text().trim_end(), "adef");
    }

    #[test]
    fn erase_in_display_22_then_2_moves_content_to_history_on_main() {
        let mut s = screen(2, 5);
        s.draw_text("hi");
        s.erase_in_display(22);
        assert_eq!(s.history().len(), 2);
        assert!(!s.linebuf().line(0).has_content());
    }

    #[test]
    fn erase_in_display_3_clears_scrollback() {
        let mut s = screen(2, 5);
        s.draw_text("hi");
        s.linefeed();
        s.linefeed();
        assert!(s.history().len() > 0);
        s.erase_in_display(3);
        assert_eq!(s.history().len(), 0);
    }

    #[test]
    fn alignment_display_fills_e_and_homes_cursor() {
        let mut s = screen(2, 3);
        s.cursor_position(2, 2);
        s.alignment_display();
        assert_eq!(s.linebuf().line(0).text(), "EEE");
        assert_eq!((s.cursor().y, s.cursor().x), (0, 0));
    }

    #[test]
    fn sgr_updates_pending_cursor_graphics() {
        let mut s = screen(2, 5);
        s.select_graphic_rendition(&[SgrParam::Bold, SgrParam::Foreground(Color::Named(NamedColor::Red))], None);
        assert!(s.cursor().graphics.flags.contains(CellFlags::BOLD));
        s.draw_text("x");
        assert!(s.linebuf().line(0).cell(0).unwrap().flags.contains(CellFlags::BOLD));
        assert_eq!(s.linebuf().line(0).cell(0).unwrap().fg, Color::Named(NamedColor::Red));
    }

    #[test]
    fn sgr_reset_clears_all_attrs() {
        let mut s = screen(2, 5);
        s.select_graphic_rendition(&[SgrParam::Bold], None);
        s.select_graphic_rendition(&[SgrParam::Reset], None);
        assert!(!s.cursor().graphics.flags.contains(CellFlags::BOLD));
    }
}
