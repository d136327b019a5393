//! Flat, render-ready cell extraction with scrollback offset, selection
//! highlight, and cursor blending folded in.
//!
//! The screen engine stores cells in its own compact [`par_term_screen::Cell`]
//! representation (codepoint + combining marks, spec §3); this module
//! flattens a viewport of that grid — main buffer or scrollback, depending
//! on `scroll_offset` — into [`RenderCell`]s with resolved RGBA colors, so a
//! frontend's text renderer never has to understand the grid's internal
//! layout or the selection/cursor overlay rules itself.

use super::TerminalManager;
use par_term_screen::{Cell, CellFlags, CursorShape, UnderlineStyle, Width};

/// One flattened, render-ready grid cell.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderCell {
    pub grapheme: String,
    pub fg_color: [u8; 4],
    pub bg_color: [u8; 4],
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub hyperlink_id: u16,
    pub wide_char: bool,
    pub wide_char_spacer: bool,
}

impl Default for RenderCell {
    fn default() -> Self {
        Self {
            grapheme: " ".to_string(),
            fg_color: [229, 229, 229, 255],
            bg_color: [0, 0, 0, 255],
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
            hyperlink_id: 0,
            wide_char: false,
            wide_char_spacer: false,
        }
    }
}

impl TerminalManager {
    /// Flatten a `rows * columns` viewport into [`RenderCell`]s, `scroll_offset`
    /// lines back into history (0 = bottom of scrollback, i.e. the live
    /// screen). `selection` is `((start_col, start_row), (end_col, end_row))`
    /// in viewport-row coordinates; `cursor` is `((x, y), opacity)` for
    /// blending the cursor glyph into the underlying cell colors.
    pub fn get_cells_with_scrollback(
        &self,
        scroll_offset: usize,
        selection: Option<((usize, usize), (usize, usize))>,
        rectangular: bool,
        cursor: Option<((usize, usize), f32)>,
    ) -> Vec<RenderCell> {
        let screen = self.screen.lock();
        let rows = screen.rows();
        let cols = screen.columns();
        let history_len = screen.history().len();

        let clamped_offset = scroll_offset.min(history_len);
        let total_lines = history_len + rows;
        let end_line = total_lines.saturating_sub(clamped_offset);
        let start_line = end_line.saturating_sub(rows);

        let mut cells = Vec::with_capacity(rows * cols);

        for line_idx in start_line..end_line {
            let screen_row = line_idx - start_line;
            if line_idx < history_len {
                match screen.history().line(line_idx) {
                    Some(line) => Self::push_cells_from_slice(
                        line.cells(),
                        cols,
                        &mut cells,
                        screen_row,
                        selection,
                        rectangular,
                        cursor,
                    ),
                    None => Self::push_empty_cells(cols, &mut cells),
                }
            } else {
                let row = line_idx - history_len;
                let line = screen.visible_line(row);
                Self::push_cells_from_slice(
                    line.cells(),
                    cols,
                    &mut cells,
                    screen_row,
                    selection,
                    rectangular,
                    cursor,
                );
            }
        }

        cells
    }

    #[allow(clippy::too_many_arguments)]
    fn push_cells_from_slice(
        line_cells: &[Cell],
        cols: usize,
        dest: &mut Vec<RenderCell>,
        screen_row: usize,
        selection: Option<((usize, usize), (usize, usize))>,
        rectangular: bool,
        cursor: Option<((usize, usize), f32)>,
    ) {
        let copy_len = cols.min(line_cells.len());
        for (col, cell) in line_cells[..copy_len].iter().enumerate() {
            let is_selected = Self::is_cell_selected(col, screen_row, selection, rectangular);
            let cursor_opacity = cursor.and_then(|((cx, cy), opacity)| {
                if cx == col && cy == screen_row {
                    Some(opacity)
                } else {
                    None
                }
            });
            dest.push(Self::convert_cell(cell, is_selected, cursor_opacity));
        }
        if copy_len < cols {
            Self::push_empty_cells(cols - copy_len, dest);
        }
    }

    fn push_empty_cells(count: usize, dest: &mut Vec<RenderCell>) {
        for _ in 0..count {
            dest.push(RenderCell::default());
        }
    }

    /// Whether `(col, row)` falls inside `selection` (viewport coordinates).
    /// Mirrors [`par_term_screen::selection::SelectionsSet::apply_selection`]
    /// for the single-range case this API accepts.
    fn is_cell_selected(
        col: usize,
        row: usize,
        selection: Option<((usize, usize), (usize, usize))>,
        rectangular: bool,
    ) -> bool {
        let Some(((start_col, start_row), (end_col, end_row))) = selection else {
            return false;
        };
        if rectangular {
            let min_col = start_col.min(end_col);
            let max_col = start_col.max(end_col);
            let min_row = start_row.min(end_row);
            let max_row = start_row.max(end_row);
            return col >= min_col && col <= max_col && row >= min_row && row <= max_row;
        }
        if start_row == end_row {
            return row == start_row && col >= start_col && col <= end_col;
        }
        if row == start_row {
            col >= start_col
        } else if row == end_row {
            col <= end_col
        } else {
            row > start_row && row < end_row
        }
    }

    fn convert_cell(cell: &Cell, is_selected: bool, cursor_opacity: Option<f32>) -> RenderCell {
        let fg = cell.fg.to_rgb();
        let bg = cell.bg.to_rgb();
        let is_reverse = cell.flags.contains(CellFlags::REVERSE);

        let (fg_color, bg_color) = if let Some(opacity) = cursor_opacity {
            let blend = |normal: u8, inverted: u8| -> u8 {
                (normal as f32 * (1.0 - opacity) + inverted as f32 * opacity) as u8
            };
            (
                [blend(fg.0, bg.0), blend(fg.1, bg.1), blend(fg.2, bg.2), 255],
                [blend(bg.0, fg.0), blend(bg.1, fg.1), blend(bg.2, fg.2), 255],
            )
        } else if is_selected || is_reverse {
            ([bg.0, bg.1, bg.2, 255], [fg.0, fg.1, fg.2, 255])
        } else {
            ([fg.0, fg.1, fg.2, 255], [bg.0, bg.1, bg.2, 255])
        };

        let grapheme = if cell.has_combining_chars() {
            cell.get_grapheme()
        } else {
            cell.base_char().to_string()
        };

        RenderCell {
            grapheme,
            fg_color,
            bg_color,
            bold: cell.flags.contains(CellFlags::BOLD),
            italic: cell.flags.contains(CellFlags::ITALIC),
            underline: cell.underline != UnderlineStyle::None,
            strikethrough: cell.flags.contains(CellFlags::STRIKETHROUGH),
            hyperlink_id: cell.hyperlink_id,
            wide_char: cell.width == Width::Wide,
            wide_char_spacer: cell.is_wide_spacer(),
        }
    }

    /// Cursor's current `((x, y), shape)`, for callers that want to draw the
    /// cursor glyph themselves rather than via the opacity-blend path above.
    pub fn cursor_render_info(&self) -> ((usize, usize), CursorShape) {
        let screen = self.screen.lock();
        let cursor = screen.cursor();
        ((cursor.x, cursor.y), cursor.style.shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_screen_rows_come_back_with_no_offset() {
        let term = TerminalManager::new(10, 2);
        term.screen.lock().draw_text("hi");
        let cells = term.get_cells_with_scrollback(0, None, false, None);
        assert_eq!(cells.len(), 20);
        assert_eq!(cells[0].grapheme, "h");
        assert_eq!(cells[1].grapheme, "i");
    }

    #[test]
    fn scrolled_back_view_pulls_from_history() {
        let term = TerminalManager::new(5, 2);
        {
            let mut screen = term.screen.lock();
            screen.draw_text("aaaaa");
            for _ in 0..5 {
                screen.linefeed();
            }
        }
        let history_len = term.screen.lock().history().len();
        assert!(history_len > 0);
        let cells = term.get_cells_with_scrollback(history_len, None, false, None);
        assert_eq!(cells[0].grapheme, "a");
    }

    #[test]
    fn selection_swaps_fg_and_bg() {
        let term = TerminalManager::new(5, 1);
        term.screen.lock().draw_text("x");
        let plain = term.get_cells_with_scrollback(0, None, false, None);
        let selected = term.get_cells_with_scrollback(0, Some(((0, 0), (0, 0))), false, None);
        assert_eq!(selected[0].fg_color, plain[0].bg_color);
        assert_eq!(selected[0].bg_color, plain[0].fg_color);
    }
}
