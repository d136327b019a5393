//! Scrolling-region primitives: `index`/`reverse_index` (the VT "index"
//! concept, named distinctly from ring and logical-row indices per spec
//! §9), `scroll`/`reverse_scroll`, and scrollback-view navigation (spec
//! §4.2 "Scrolling region and scrolls", §4.3 "HistoryBuffer and
//! scrolling").

use super::Screen;
use crate::graphics::ScrollData;
use crate::history::ScrollAmount;
use crate::line::PromptKind;

impl Screen {
    /// LF (and the index half of CR+LF under LNM): scroll if the cursor
    /// sits on the scrolling region's bottom margin, else just move down
    /// (spec §4.2 `index`).
    pub fn index(&mut self) {
        let (top, bottom) = self.margins();
        if self.cursor().y == bottom {
            self.scroll_region_up(top, bottom, 1);
        } else {
            self.cursor_down(1);
        }
    }

    pub fn linefeed(&mut self) {
        self.index();
        if self.modes().newline_mode {
            self.carriage_return();
        }
    }

    /// RI: symmetric to [`Screen::index`] (spec §4.2 `reverse_index`).
    pub fn reverse_index(&mut self) {
        let (top, bottom) = self.margins();
        if self.cursor().y == top {
            self.scroll_region_down(top, bottom, 1, false);
        } else {
            self.cursor_up(1, false);
        }
    }

    /// Called from `draw_text`'s autowrap path: always a plain index (the
    /// cursor is by construction already on the last column, not
    /// necessarily the bottom margin, so this just reuses `index`).
    pub(crate) fn advance_row_for_wrap(&mut self) {
        self.index();
    }

    /// CSI Ps S: scroll `n` lines up within the margin region regardless of
    /// cursor position (spec §4.2 `scroll`).
    pub fn scroll(&mut self, n: usize) {
        let (top, bottom) = self.margins();
        self.scroll_region_up(top, bottom, n);
    }

    /// CSI Ps T: scroll `n` lines down. When `fill_from_scrollback` and the
    /// main screen's top margin is at row 0, each iteration first tries to
    /// pull a row back out of history onto the top (spec §4.2
    /// `reverse_scroll`).
    pub fn reverse_scroll(&mut self, n: usize, fill_from_scrollback: bool) {
        let (top, bottom) = self.margins();
        self.scroll_region_down(top, bottom, n, fill_from_scrollback);
    }

    /// Shared by `index`/`scroll`: evict `top` off the region `n` times,
    /// pushing each evicted row to history iff on the main screen with an
    /// unmodified top margin (spec §4.2 `index` "the evicted row is pushed
    /// to history iff `linebuf == main` and `margin_top == 0`").
    pub(crate) fn scroll_region_up(&mut self, top: usize, bottom: usize, n: usize) {
        let push_history = self.is_main() && top == 0;
        for _ in 0..n {
            if push_history {
                let evicted = self.linebuf().line(top).clone();
                self.historybuf_mut().push(evicted);
            }
            self.linebuf_mut().index(top, bottom);
        }
        self.notify_scroll(n as i64, top, bottom, top != 0 || bottom + 1 != self.rows());
        self.mark_region_dirty(top, bottom);
    }

    /// Shared by `reverse_index`/`reverse_scroll`.
    pub(crate) fn scroll_region_down(&mut self, top: usize, bottom: usize, n: usize, fill_from_scrollback: bool) {
        let pull_history = fill_from_scrollback && self.is_main() && top == 0;
        for _ in 0..n {
            self.linebuf_mut().reverse_index(top, bottom);
            if pull_history {
                if let Some(line) = self.historybuf_mut().pop_line_to() {
                    *self.linebuf_mut().line_mut(top) = line;
                }
            }
        }
        self.notify_scroll(-(n as i64), top, bottom, top != 0 || bottom + 1 != self.rows());
        self.mark_region_dirty(top, bottom);
    }

    fn notify_scroll(&mut self, amount: i64, top: usize, bottom: usize, has_margins: bool) {
        let limit = -(self.history().capacity() as i64);
        self.graphics.on_scroll(ScrollData {
            amount,
            limit,
            margin_top: top,
            margin_bottom: bottom,
            has_margins,
        });
    }

    // ---- scrollback view (spec §4.3) ------------------------------------

    /// `amount`: `ScrollAmount::Lines(n)` for a relative scroll,
    /// `ScrollAmount::Page` for `rows-1`, `ScrollAmount::Full` for all the
    /// way to the oldest/newest line. `upwards` looks further into the
    /// past; scrolling down clamps at `scrolled_by == 0` (spec §4.3
    /// `history_scroll`).
    pub fn history_scroll(&mut self, amount: ScrollAmount, upwards: bool) {
        let history_len = self.history().len();
        let n = match amount {
            ScrollAmount::Lines(n) => n,
            ScrollAmount::Page => self.rows().saturating_sub(1),
            ScrollAmount::Full => history_len,
        };
        let current = self.scrolled_by();
        let new_value = if upwards {
            (current + n).min(history_len)
        } else {
            current.saturating_sub(n)
        };
        self.set_scrolled_by(new_value);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.set_scrolled_by(0);
    }

    pub fn scrolled_by_amount(&self) -> usize {
        self.scrolled_by()
    }

    /// Walk visually up (`n > 0`) or down (`n < 0`) among logical rows
    /// whose line-attr is `PROMPT_START`, setting `scrolled_by` so that row
    /// lands at the top of the viewport. `n == 0` returns to
    /// `last_visited_prompt` (spec §4.3 `scroll_to_prompt`; spec §9 open
    /// question: with no prompt marked yet, falls back to the cursor row).
    pub fn scroll_to_prompt(&mut self, n: i32) {
        let prompt_rows = self.logical_prompt_rows();
        if prompt_rows.is_empty() {
            // Fall back to the cursor row, per spec §9 open question.
            let cursor_row = self.cursor().y;
            self.set_last_visited_prompt(Some(cursor_row));
            return;
        }
        if n == 0 {
            if let Some(row) = self.last_visited_prompt() {
                self.scroll_absolute_row_to_top(row);
            }
            return;
        }
        let current_absolute = self.history().len() + self.cursor().y - self.scrolled_by();
        let target = if n > 0 {
            // Visually "up" == further into the past == smaller absolute row.
            prompt_rows
                .iter()
                .rev()
                .filter(|&&r| r < current_absolute)
                .nth((n - 1) as usize)
                .copied()
        } else {
            prompt_rows
                .iter()
                .filter(|&&r| r > current_absolute)
                .nth((-n - 1) as usize)
                .copied()
        };
        if let Some(row) = target {
            self.set_last_visited_prompt(Some(row));
            self.scroll_absolute_row_to_top(row);
        }
    }

    /// Absolute row indices (0 = oldest history line) of every
    /// `PROMPT_START`/`SECONDARY_PROMPT` row across history + the visible
    /// screen.
    fn logical_prompt_rows(&self) -> Vec<usize> {
        let mut rows = Vec::new();
        for (i, line) in self.history().iter().enumerate() {
            if matches!(line.attrs.prompt_kind, PromptKind::PromptStart | PromptKind::SecondaryPrompt) {
                rows.push(i);
            }
        }
        let base = self.history().len();
        for y in 0..self.linebuf().rows() {
            let line = self.linebuf().line(y);
            if matches!(line.attrs.prompt_kind, PromptKind::PromptStart | PromptKind::SecondaryPrompt) {
                rows.push(base + y);
            }
        }
        rows
    }

    fn scroll_absolute_row_to_top(&mut self, absolute_row: usize) {
        let history_len = self.history().len();
        let scrolled = history_len.saturating_sub(absolute_row);
        self.set_scrolled_by(scrolled.min(history_len));
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
    fn index_at_bottom_margin_scrolls_and_pushes_history() {
        let mut s = screen(3, 5);
        s.draw_text("a");
        s.cursor_position(3, 1);
        s.index();
        assert_eq!(s.history().len(), 1);
        assert_eq!(s.history().line(0).unwrap().text().trim(), "a");
    }

    #[test]
    fn index_mid_screen_just_moves_cursor() {
        let mut s = screen(5, 5);
        s.index();
        assert_eq!(s.cursor().y, 1);
        assert_eq!(s.history().len(), 0);
    }

    #[test]
    fn reverse_index_at_top_margin_scrolls_down() {
        let mut s = screen(3, 5);
        s.draw_text("a");
        s.cursor_position(1, 1);
        s.reverse_index();
        assert_eq!(s.linebuf().line(1).text().trim(), "a");
        assert!(!s.linebuf().line(0).has_content());
    }

    #[test]
    fn insert_then_equal_delete_leaves_region_untouched() {
        let mut s = screen(5, 5);
        s.draw_text("x");
        s.cursor_position(3, 1);
        s.scroll(2);
        s.reverse_scroll(2, false);
        assert_eq!(s.linebuf().line(0).text().trim(), "x");
    }

    #[test]
    fn history_scroll_clamps_at_bounds() {
        let mut s = screen(3, 5);
        for _ in 0..10 {
            s.linefeed();
        }
        assert!(s.history().len() > 0);
        s.history_scroll(ScrollAmount::Full, true);
        assert_eq!(s.scrolled_by_amount(), s.history().len());
        s.history_scroll(ScrollAmount::Full, false);
        assert_eq!(s.scrolled_by_amount(), 0);
    }

    #[test]
    fn scroll_to_prompt_falls_back_to_cursor_row_when_unmarked() {
        let mut s = screen(10, 10);
        s.cursor_position(4, 1);
        s.scroll_to_prompt(1);
        assert_eq!(s.last_visited_prompt(), Some(3));
    }
}
