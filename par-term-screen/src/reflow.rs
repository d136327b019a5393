//! The reflow engine: rewraps a run of rows to a new column count while
//! preserving logical paragraphs and remapping cursor-like positions
//! (spec §4.1).

use crate::cell::{Cell, Width};
use crate::history::HistoryBuffer;
use crate::line::Line;

/// A position to track through a rewrap (e.g. the screen cursor, an
/// overlay anchor, a selection boundary).
#[derive(Debug, Clone, Copy)]
pub struct CursorTracker {
    pub old_y: usize,
    pub old_x: usize,
    pub new_y: usize,
    pub new_x: usize,
    /// True if the tracked cell ended up evicted into scrollback rather
    /// than surviving in the new visible buffer.
    pub overflowed: bool,
}

impl CursorTracker {
    pub fn new(old_y: usize, old_x: usize) -> Self {
        Self {
            old_y,
            old_x,
            new_y: 0,
            new_x: 0,
            overflowed: false,
        }
    }
}

pub struct RewrapResult {
    /// Exactly `visible_rows` lines, oldest overflow already pushed to the
    /// history sink.
    pub lines: Vec<Line>,
    pub content_lines_before: usize,
    pub content_lines_after: usize,
}

/// Rewrap `source` (oldest row first) to `new_columns`, producing exactly
/// `visible_rows` destination lines. Any destination rows beyond
/// `visible_rows` are pushed, oldest first, to `history_sink` (if given).
/// `trackers` are updated in place with their new `(x, y)`.
pub fn rewrap(
    source: &[Line],
    new_columns: usize,
    visible_rows: usize,
    mut history_sink: Option<&mut HistoryBuffer>,
    trackers: &mut [CursorTracker],
) -> RewrapResult {
    let content_lines_before = source.iter().filter(|l| l.has_content()).count();

    // Destination row dirty-position map per tracker: source (row, col) ->
    // (dest row sequence index, dest col).
    let mut tracker_hits: Vec<Option<(usize, usize)>> = vec![None; trackers.len()];

    let mut dest_rows: Vec<Line> = Vec::new();
    let mut cur = Line::new(new_columns);
    let mut x = 0usize;

    // group source rows into logical lines via the next_char_was_wrapped chain
    let mut i = 0usize;
    while i < source.len() {
        let start = i;
        let mut end = i;
        // A wrap-continued prompt-start/secondary-prompt row is never
        // absorbed into the previous logical line: the shell is expected to
        // redraw it, so the chain stops just before it (spec §4.1 "Tie-breaks").
        while end < source.len() - 1
            && source[end].next_char_was_wrapped()
            && source[end + 1].attrs.prompt_kind == crate::line::PromptKind::None
        {
            end += 1;
        }

        // Flatten cells of rows start..=end, skipping wide-char trailers.
        for row in start..=end {
            let line = &source[row];
            let cols = line.columns();
            let mut col = 0usize;
            while col < cols {
                let cell = &line.cells()[col];
                if cell.is_wide_spacer() {
                    col += 1;
                    continue;
                }
                let w = cell.width.cells().max(1) as usize;

                if x + w > new_columns {
                    // finish current row, wide char (or overflow) pushed to next row
                    cur.set_next_char_was_wrapped(true);
                    dest_rows.push(std::mem::replace(&mut cur, Line::new(new_columns)));
                    x = 0;
                }

                place_cell(&mut cur, x, cell);
                for (ti, t) in trackers.iter().enumerate() {
                    if t.old_y == row && t.old_x == col {
                        tracker_hits[ti] = Some((dest_rows.len(), x));
                    }
                }
                x += w;
                col += 1;
            }
        }
        // end of logical line: close out current row without marking wrapped,
        // unless it exactly filled (still not "wrapped" since no more content
        // follows in this logical line).
        cur.set_next_char_was_wrapped(false);
        dest_rows.push(std::mem::replace(&mut cur, Line::new(new_columns)));
        x = 0;

        i = end + 1;
    }
    // leftover (only possible if source was empty)
    if dest_rows.is_empty() {
        dest_rows.push(cur);
    }

    let content_lines_after = dest_rows.iter().filter(|l| l.has_content()).count();

    let overflow = dest_rows.len().saturating_sub(visible_rows);
    if overflow > 0 {
        let evicted: Vec<Line> = dest_rows.drain(0..overflow).collect();
        if let Some(sink) = history_sink.as_deref_mut() {
            for line in evicted {
                sink.push(line);
            }
        }
    }
    while dest_rows.len() < visible_rows {
        dest_rows.push(Line::new(new_columns));
    }

    for (ti, hit) in tracker_hits.into_iter().enumerate() {
        if let Some((dest_idx, col)) = hit {
            if dest_idx < overflow {
                trackers[ti].overflowed = true;
                trackers[ti].new_y = 0;
                trackers[ti].new_x = 0;
            } else {
                trackers[ti].new_y = dest_idx - overflow;
                trackers[ti].new_x = col;
            }
        }
    }

    RewrapResult {
        lines: dest_rows,
        content_lines_before,
        content_lines_after,
    }
}

fn place_cell(dest: &mut Line, x: usize, src: &Cell) {
    dest.cells_mut()[x] = src.clone();
    if src.width == Width::Wide && x + 1 < dest.columns() {
        let mut trailer = Cell::default();
        trailer.width = Width::Zero;
        dest.cells_mut()[x + 1] = trailer;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::CellFlags;

    fn row_with_text(columns: usize, text: &str, wrapped: bool) -> Line {
        let mut line = Line::new(columns);
        for (i, ch) in text.chars().enumerate() {
            line.cells_mut()[i].set_char(ch);
        }
        if wrapped {
            line.cells_mut()[columns - 1]
                .flags
                .insert(CellFlags::NEXT_CHAR_WAS_WRAPPED);
        }
        line
    }

    #[test]
    fn single_short_line_round_trips() {
        let src = vec![row_with_text(10, "hi", false)];
        let result = rewrap(&src, 10, 1, None, &mut []);
        assert_eq!(result.lines[0].text().trim_end(), "hi");
    }

    #[test]
    fn narrowing_reflows_wrapped_logical_line() {
        // 100-col logical line spanning two 80-col rows, reflowed to 40.
        let mut row0 = Line::new(80);
        for i in 0..80 {
            row0.cells_mut()[i].set_char('a');
        }
        row0.cells_mut()[79].flags.insert(CellFlags::NEXT_CHAR_WAS_WRAPPED);
        let mut row1 = Line::new(80);
        for i in 0..20 {
            row1.cells_mut()[i].set_char('a');
        }
        let src = vec![row0, row1];

        let mut trackers = [CursorTracker::new(1, 5)]; // old row 1, col 5 == logical col 85
        let result = rewrap(&src, 40, 5, None, &mut trackers);

        assert_eq!(trackers[0].new_y, 2);
        assert_eq!(trackers[0].new_x, 5);
        assert_eq!(result.lines.len(), 5);
        assert!(!result.lines[2].next_char_was_wrapped());
    }

    #[test]
    fn wide_char_never_splits_across_destination_rows() {
        let mut row0 = Line::new(3);
        row0.cells_mut()[0].set_char('a');
        row0.cells_mut()[1].set_char('\u{4E2D}'); // wide
        row0.cells_mut()[2].width = Width::Zero;
        let src = vec![row0];
        let result = rewrap(&src, 2, 2, None, &mut []);
        // 'a' fills col 0 of row0; the wide char can't fit in the remaining
        // single column so it moves to row1 entirely.
        assert_eq!(result.lines[0].cell(0).unwrap().base_char(), 'a');
        assert!(result.lines[1].cell(0).unwrap().is_wide());
    }

    #[test]
    fn overflow_rows_are_pushed_to_history_oldest_first() {
        let src: Vec<Line> = (0..5)
            .map(|i| row_with_text(3, &i.to_string(), false))
            .collect();
        let mut history = HistoryBuffer::new(10);
        let result = rewrap(&src, 3, 2, Some(&mut history), &mut []);
        assert_eq!(result.lines.len(), 2);
        assert_eq!(history.len(), 3);
        assert_eq!(history.line(0).unwrap().text().trim(), "0");
        assert_eq!(result.lines[0].text().trim(), "3");
    }

    #[test]
    fn wrap_continued_prompt_start_row_stays_its_own_logical_line() {
        // row0 wraps into row1, but row1 is tagged PROMPT_START: the chain
        // must stop before it rather than merging it into row0's paragraph.
        let row0 = row_with_text(5, "ab", true);
        let mut row1 = row_with_text(5, "cd", false);
        row1.attrs.prompt_kind = crate::line::PromptKind::PromptStart;
        let src = vec![row0, row1];

        let result = rewrap(&src, 5, 2, None, &mut []);

        assert!(!result.lines[0].next_char_was_wrapped());
        assert_eq!(result.lines[0].text().trim(), "ab");
        assert_eq!(result.lines[1].text().trim(), "cd");
    }

    proptest::proptest! {
        /// spec §8 "no cell is lost; no cell is duplicated": a single
        /// logical line's narrow-ASCII content, rewrapped to any column
        /// count with enough visible rows to never spill into history,
        /// reassembles (modulo trailing blanks) to the original text.
        #[test]
        fn rewrap_preserves_single_line_content(
            text in "[a-zA-Z0-9 ]{0,40}",
            old_columns in 10usize..40,
            new_columns in 1usize..40,
        ) {
            let text: String = text.chars().take(old_columns).collect();
            let mut src_row = Line::new(old_columns);
            for (i, ch) in text.chars().enumerate() {
                src_row.cells_mut()[i].set_char(ch);
            }
            let src = vec![src_row];

            // enough rows that a 40-char line can never overflow at columns >= 1
            let result = rewrap(&src, new_columns, 40, None, &mut []);
            let reassembled: String = result
                .lines
                .iter()
                .map(|l| l.text())
                .collect::<Vec<_>>()
                .join("");
            let reassembled_trimmed = reassembled.trim_end();
            let expected_trimmed = text.trim_end();
            proptest::prop_assert_eq!(reassembled_trimmed, expected_trimmed);
        }
    }
}
