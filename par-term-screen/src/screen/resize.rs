//! The resize algorithm (spec §4.2 "Resize algorithm"): merges history +
//! the visible main screen into one rewrap source, reflows both to the new
//! geometry, migrates the cursor, and resets per-geometry state
//! (margins/tabstops/selections).

use super::Screen;
use crate::history::HistoryBuffer;
use crate::line::{Line, PromptKind};
use crate::reflow::{rewrap, CursorTracker};

impl Screen {
    /// Resize the whole screen to `new_rows` x `new_columns`. A no-op if
    /// the geometry is unchanged.
    pub fn resize(&mut self, new_rows: usize, new_columns: usize) {
        if new_rows == self.rows() && new_columns == self.columns() {
            return;
        }
        self.blank_below_active_prompt_if_needed();
        let sentinel = self.maybe_insert_output_start_sentinel();

        let old_rows = self.rows();
        let cursor_was_main = self.is_main();
        let old_history_len = self.history().len();

        let main_row_delta =
            self.resize_buffer(true, new_rows, new_columns, cursor_was_main, sentinel, old_rows, old_history_len);
        self.resize_buffer(false, new_rows, new_columns, !cursor_was_main, sentinel, old_rows, old_history_len);

        self.set_geometry(new_rows, new_columns);
        self.reset_margins();
        self.reset_tabstops();
        self.clear_selections();
        self.set_last_visited_prompt(None);
        self.clamp_resize_cursor(new_rows, new_columns);
        self.pull_history_to_fill_freed_rows();

        self.graphics.resize(main_row_delta);
    }

    /// Resize one of the two line buffers. Returns the row delta applied to
    /// cursor tracking (used to reposition non-cell graphics placements),
    /// meaningful only for the main buffer (history only attaches there).
    #[allow(clippy::too_many_arguments)]
    fn resize_buffer(
        &mut self,
        main: bool,
        new_rows: usize,
        new_columns: usize,
        track_cursor: bool,
        _sentinel: Option<(usize, usize)>,
        old_rows: usize,
        old_history_len: usize,
    ) -> i64 {
        let (cursor_x, cursor_y) = (self.cursor().x, self.cursor().y);

        let mut source: Vec<Line> = if main { self.history_lines() } else { Vec::new() };
        let buf_lines = if main {
            Screen::buffer_lines(self.main_linebuf_mut())
        } else {
            Screen::buffer_lines(self.alt_linebuf_mut())
        };
        let base = source.len();
        source.extend(buf_lines);

        let mut trackers = Vec::new();
        let tracker_idx = if track_cursor {
            trackers.push(CursorTracker::new(base + cursor_y, cursor_x));
            Some(0usize)
        } else {
            None
        };

        let mut new_history = HistoryBuffer::new(if main { self.history().capacity() } else { 0 });
        let result = rewrap(
            &source,
            new_columns,
            new_rows,
            if main { Some(&mut new_history) } else { None },
            &mut trackers,
        );

        let row_delta = if main {
            new_history.len() as i64 - old_history_len as i64
        } else {
            0
        };

        if main {
            *self.historybuf_mut() = new_history;
            self.main_linebuf_mut().replace_with(result.lines);
        } else {
            self.alt_linebuf_mut().replace_with(result.lines);
        }

        if let Some(idx) = tracker_idx {
            let t = trackers[idx];
            let beyond_content = t.old_y >= result.content_lines_before;
            if t.overflowed {
                self.set_cursor_pos_raw(0, 0);
            } else if beyond_content {
                let row = result.content_lines_after.min(new_rows.saturating_sub(1));
                self.set_cursor_pos_raw(0, row);
            } else {
                self.set_cursor_pos_raw(t.new_x.min(new_columns.saturating_sub(1)), t.new_y.min(new_rows.saturating_sub(1)));
            }
        }

        let _ = old_rows;
        row_delta
    }

    /// Spec §4.2 "During resize, if the cursor sits on a row whose nearest
    /// prior marker is a prompt-start, rows from the cursor downward are
    /// blanked (to let the shell redraw) rather than reflowed." Only
    /// applies to the main screen; scans upward from the cursor row for
    /// the nearest prompt-kind marker.
    fn blank_below_active_prompt_if_needed(&mut self) {
        if !self.is_main() || !self.redraws_prompts_at_all() {
            return;
        }
        let y = self.cursor().y;
        let mut nearest = None;
        for row in (0..=y).rev() {
            let kind = self.linebuf().line(row).attrs.prompt_kind;
            if kind != PromptKind::None {
                nearest = Some(kind);
                break;
            }
        }
        if matches!(nearest, Some(PromptKind::PromptStart) | Some(PromptKind::SecondaryPrompt)) {
            let rows = self.rows();
            for row in y..rows {
                self.clear_row(row);
            }
        }
    }

    /// Spec §4.2 step 1: "Optionally insert a `<` sentinel if the cursor
    /// sits at x=0 on an empty OUTPUT_START row, so rewrap preserves it."
    /// Returns the row it was written to, if any, so it can be stripped
    /// back out after the geometry change.
    fn maybe_insert_output_start_sentinel(&mut self) -> Option<(usize, usize)> {
        if !self.is_main() || self.cursor().x != 0 {
            return None;
        }
        let y = self.cursor().y;
        let line = self.linebuf().line(y);
        if line.attrs.prompt_kind == PromptKind::OutputStart && !line.has_content() {
            self.linebuf_mut().line_mut(y).cells_mut()[0].set_char('<');
            return Some((y, 0));
        }
        None
    }

    fn clamp_resize_cursor(&mut self, new_rows: usize, new_columns: usize) {
        let x = self.cursor().x.min(new_columns.saturating_sub(1));
        let y = self.cursor().y.min(new_rows.saturating_sub(1));
        self.set_cursor_pos_raw(x, y);
    }

    /// Spec §4.2 step 6: "Optionally pull lines back from history to fill
    /// freed rows below the cursor" — enlarging the window pulls the most
    /// recently scrolled-off rows back onto the top of the visible buffer
    /// rather than leaving a gap of blank rows while scrollback still has
    /// content.
    fn pull_history_to_fill_freed_rows(&mut self) {
        if !self.is_main() {
            return;
        }
        let rows = self.rows();
        let mut blank_bottom = 0usize;
        for y in (0..rows).rev() {
            if self.linebuf().line(y).has_content() {
                break;
            }
            blank_bottom += 1;
        }
        let available = blank_bottom.min(rows.saturating_sub(self.cursor().y + 1));
        for _ in 0..available {
            let Some(line) = self.historybuf_mut().pop_line_to() else { break };
            self.linebuf_mut().reverse_index(0, rows - 1);
            *self.linebuf_mut().line_mut(0) = line;
            let y = self.cursor().y + 1;
            self.set_cursor_pos_raw(self.cursor().x, y.min(rows.saturating_sub(1)));
        }
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
    fn resize_to_same_geometry_is_noop() {
        let mut s = screen(24, 80);
        s.draw_text("hello");
        s.resize(24, 80);
        assert_eq!(s.linebuf().line(0).text().trim_end(), "hello");
    }

    #[test]
    fn narrowing_reflows_a_wrapped_logical_line_and_migrates_cursor() {
        let mut s = screen(24, 80);
        s.draw_text(&"a".repeat(85));
        // cursor now at column 5 of the continuation row (row 1).
        assert_eq!(s.cursor().y, 1);
        assert_eq!(s.cursor().x, 5);
        s.resize(24, 40);
        assert_eq!(s.cursor().y, 2);
        assert_eq!(s.cursor().x, 5);
        assert!(!s.linebuf().line(2).next_char_was_wrapped());
    }

    #[test]
    fn resize_never_deadlocks_at_one_column() {
        let mut s = screen(24, 80);
        s.draw_text("hello world");
        s.resize(24, 1);
        assert!(s.cursor().x < 1);
        assert!(s.cursor().y < 24);
    }

    #[test]
    fn shrinking_rows_pushes_overflow_into_history() {
        let mut s = screen(10, 20);
        for i in 0..10 {
            s.draw_text(&format!("line{i}"));
            s.linefeed();
            s.carriage_return();
        }
        s.resize(3, 20);
        assert!(s.history().len() > 0);
    }

    #[test]
    fn erase_in_display_3_on_alt_does_not_clear_main_history() {
        let mut s = screen(5, 10);
        s.draw_text("a");
        s.linefeed();
        s.linefeed();
        s.linefeed();
        s.linefeed();
        s.linefeed();
        let before = s.history().len();
        assert!(before > 0);
        s.toggle_alt_screen(true, true, true);
        s.erase_in_display(3);
        s.toggle_alt_screen(false, true, true);
        assert_eq!(s.history().len(), before);
    }
}
