//! `draw_text`: the hot path every printable byte from the parser funnels
//! through, plus `tab`/`repeat_character` which share its cell-writing
//! machinery (spec §4.2 "draw_text").

use super::Screen;
use crate::cell::{is_combining, is_flag_codepoint, is_ignored, wcwidth_std, Cell, Width, VS15, VS16};

impl Screen {
    /// Feed a run of printable text (control chars embedded in the run are
    /// dispatched inline rather than written as cells, spec §4.2
    /// "draw_text... control-char dispatch").
    pub fn draw_text(&mut self, text: &str) {
        for ch in text.chars() {
            self.draw_char(ch);
        }
    }

    fn draw_char(&mut self, ch: char) {
        match ch {
            '\r' => {
                self.carriage_return();
                return;
            }
            '\n' => {
                self.linefeed();
                return;
            }
            '\u{08}' => {
                self.backspace();
                return;
            }
            '\t' => {
                self.tab();
                return;
            }
            '\u{07}' => {
                self.bell();
                return;
            }
            _ => {}
        }
        let code = ch as u32;
        if code < 0x20 || code == 0x7F {
            return; // other C0/DEL: no-op in draw_text
        }
        if is_ignored(ch) {
            return;
        }
        if is_combining(ch) {
            self.attach_combining(ch);
            return;
        }
        if is_flag_codepoint(ch) && self.try_coalesce_flag(ch) {
            return;
        }
        self.write_graphic_char(ch);
    }

    /// Attach a combining mark (or apply VS16/VS15 width promotion/demotion)
    /// to the most recently written cell (spec §4.2 "combining marks... VS16
    /// upgrades width, VS15 downgrades it").
    fn attach_combining(&mut self, ch: char) {
        let Some((x, y)) = self.last_write() else { return };
        let columns = self.columns();
        let line = self.linebuf_mut().line_mut(y);
        if x >= line.columns() || line.cells()[x].is_empty() {
            return;
        }
        let width = line.cells()[x].width;
        match ch {
            c if c == VS16 => {
                if width == Width::Narrow {
                    line.cells_mut()[x].width = Width::Wide;
                    if x + 1 < columns {
                        line.cells_mut()[x + 1] = Cell { width: Width::Zero, ..Cell::default() };
                    }
                }
            }
            c if c == VS15 => {
                if width == Width::Wide {
                    line.cells_mut()[x].width = Width::Narrow;
                    if x + 1 < columns {
                        line.cells_mut()[x + 1] = Cell::default();
                    }
                }
            }
            _ => line.cells_mut()[x].push_mark(ch),
        }
        self.mark_row_dirty(y);
    }

    /// Merge a second regional-indicator codepoint into the previous cell as
    /// a flag emoji pair, widening it to occupy two columns (spec §4.2
    /// "flag codepoints coalesce with their immediate predecessor").
    fn try_coalesce_flag(&mut self, ch: char) -> bool {
        let Some(prev) = self.last_graphic_char() else { return false };
        if !is_flag_codepoint(prev) {
            return false;
        }
        let Some((px, py)) = self.last_write() else { return false };
        if py != self.cursor().y {
            return false;
        }
        let columns = self.columns();
        let line = self.linebuf_mut().line_mut(py);
        if px >= line.columns() || line.cells()[px].width == Width::Wide {
            return false;
        }
        line.cells_mut()[px].push_mark(ch);
        line.cells_mut()[px].width = Width::Wide;
        if px + 1 < columns {
            line.cells_mut()[px + 1] = Cell { width: Width::Zero, ..Cell::default() };
        }
        self.mark_row_dirty(py);
        self.set_last_write(Some((px, py)));
        // the pair is now consumed; a third regional indicator starts fresh.
        self.set_last_graphic_char('\0');
        let new_x = (px + 2).min(columns.saturating_sub(1));
        self.set_cursor_x_after_write(new_x, px + 2 >= columns);
        true
    }

    fn write_graphic_char(&mut self, ch: char) {
        self.perform_pending_wrap_if_needed();

        let width = wcwidth_std(ch);
        let w = width.cells().max(1) as usize;
        let columns = self.columns();
        let y = self.cursor().y;
        let mut x = self.cursor().x;

        if self.modes().insert_mode {
            self.shift_right_for_insert(y, x, w);
        }

        let cursor = *self.cursor();
        let line = self.linebuf_mut().line_mut(y);
        if x >= line.columns() {
            x = line.columns().saturating_sub(1);
        }
        let mut cell = Cell::new(ch);
        cell.width = width;
        cell.fg = cursor.graphics.fg;
        cell.bg = cursor.graphics.bg;
        cell.decoration = cursor.graphics.decoration;
        cell.flags = cursor.graphics.flags;
        cell.underline = cursor.graphics.underline;
        cell.hyperlink_id = cursor.active_hyperlink_id;
        line.cells_mut()[x] = cell;
        if width == Width::Wide && x + 1 < line.columns() {
            line.cells_mut()[x + 1] = Cell { width: Width::Zero, ..Cell::default() };
        }
        self.mark_row_dirty(y);
        self.set_last_write(Some((x, y)));
        self.set_last_graphic_char(ch);

        let new_x = x + w;
        self.set_cursor_x_after_write(new_x.min(columns), new_x >= columns);
    }

    fn set_cursor_x_after_write(&mut self, new_x: usize, hit_right_edge: bool) {
        let columns = self.columns();
        if hit_right_edge {
            self.cursor_mut().x = columns.saturating_sub(1);
            self.cursor_mut().pending_wrap = self.modes().autowrap;
        } else {
            self.cursor_mut().x = new_x;
            self.cursor_mut().pending_wrap = false;
        }
    }

    fn perform_pending_wrap_if_needed(&mut self) {
        if !self.cursor().pending_wrap || !self.modes().autowrap {
            return;
        }
        let y = self.cursor().y;
        self.linebuf_mut().line_mut(y).set_next_char_was_wrapped(true);
        self.advance_row_for_wrap();
        self.cursor_mut().x = 0;
        self.cursor_mut().pending_wrap = false;
    }

    /// IRM: shift `[x, end)` right by `w` columns before writing, dropping
    /// whatever falls off the right edge (spec §4.2 "insert mode").
    fn shift_right_for_insert(&mut self, y: usize, x: usize, w: usize) {
        let line = self.linebuf_mut().line_mut(y);
        let columns = line.columns();
        if x >= columns {
            return;
        }
        let mut i = columns;
        while i > x + w {
            i -= 1;
            line.cells_mut()[i] = line.cells()[i - w].clone();
        }
        for cell in &mut line.cells_mut()[x..(x + w).min(columns)] {
            *cell = Cell::default();
        }
    }

    /// CSI Ps b (REP): repeat the last drawn character `n` times by
    /// re-invoking `draw_text`, which naturally handles wide characters and
    /// wrap (spec §9 Open Question resolution).
    pub fn repeat_character(&mut self, n: usize) {
        let Some(ch) = self.last_graphic_char() else { return };
        if ch == '\0' || n == 0 {
            return;
        }
        let text: String = std::iter::repeat(ch).take(n).collect();
        self.draw_text(&text);
    }

    /// HT: advance to the next tab stop, writing a TAB sentinel cell that
    /// records the skipped width in its first mark slot (spec §4.2 "tab").
    pub fn tab(&mut self) {
        let from = self.cursor().x;
        let columns = self.columns();
        let last = columns.saturating_sub(1);
        let mut to = from + 1;
        while to < last && !self.tab_stop_at(to) {
            to += 1;
        }
        let to = to.min(last);
        let width = (to - from) as u32;
        let y = self.cursor().y;
        let line = self.linebuf_mut().line_mut(y);
        if let Some(cell) = line.cell_mut(from) {
            cell.codepoint = ' ' as u32;
            cell.marks[0] = width;
        }
        // "intervening cells become blank" (spec §4.2 "tab"). `to` can equal
        // `from` when the cursor starts on the last column (no room to
        // advance), in which case there's nothing between them to blank.
        if to > from + 1 {
            for cell in &mut line.cells_mut()[(from + 1)..to] {
                *cell = Cell::default();
            }
        }
        self.mark_row_dirty(y);
        self.cursor_mut().x = to;
        self.cursor_mut().pending_wrap = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;

    fn screen(rows: usize, cols: usize) -> Screen {
        Screen::new(rows, cols, 1000, Box::new(NullHost))
    }

    #[test]
    fn draw_text_writes_cells_and_advances_cursor() {
        let mut s = screen(5, 10);
        s.draw_text("hi");
        assert_eq!(s.cursor().x, 2);
        assert_eq!(s.linebuf().line(0).text().trim_end(), "hi");
    }

    #[test]
    fn wide_char_writes_spacer_trailer() {
        let mut s = screen(5, 10);
        s.draw_text("\u{4E2D}");
        assert!(s.linebuf().line(0).cell(1).unwrap().is_wide_spacer());
        assert_eq!(s.cursor().x, 2);
    }

    #[test]
    fn autowrap_defers_to_next_printable_char() {
        let mut s = screen(5, 3);
        s.draw_text("abc");
        assert_eq!(s.cursor().x, 2);
        assert!(s.cursor().pending_wrap);
        s.draw_text("d");
        assert_eq!((s.cursor().y, s.cursor().x), (1, 1));
        assert!(s.linebuf().line(0).next_char_was_wrapped());
    }

    #[test]
    fn combining_mark_attaches_to_previous_cell() {
        let mut s = screen(5, 10);
        s.draw_text("e\u{0301}");
        assert_eq!(s.cursor().x, 1);
        assert_eq!(s.linebuf().line(0).cell(0).unwrap().get_grapheme(), "e\u{0301}");
    }

    #[test]
    fn tab_advances_to_next_stop_and_writes_sentinel() {
        let mut s = screen(5, 20);
        s.cursor_position(1, 2);
        s.tab();
        assert_eq!(s.cursor().x, 8);
        // base char is a space (spec §4.2 "the first cell... holds ' '"),
        // width recorded in mark slot 0, intervening cells blanked.
        let cell = s.linebuf().line(0).cell(1).unwrap();
        assert_eq!(cell.base_char(), ' ');
        assert_eq!(cell.marks[0], 7);
        assert_eq!(s.linebuf().line(0).cell(5).unwrap().codepoint, 0);
    }

    #[test]
    fn repeat_character_reinvokes_draw_text() {
        let mut s = screen(5, 10);
        s.draw_text("a");
        s.repeat_character(3);
        assert_eq!(s.linebuf().line(0).text().trim_end(), "aaaa");
    }
}
