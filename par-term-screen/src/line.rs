//! `Line`: a fixed-width row of cells plus per-line metadata (spec §3).

use crate::cell::Cell;

/// What kind of shell prompt (if any) starts this line — kitty-style OSC 133
/// prompt marking (spec §4.2 "Prompt marking").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptKind {
    #[default]
    None,
    PromptStart,
    SecondaryPrompt,
    OutputStart,
}

/// Per-line metadata that rides alongside the cell array.
#[derive(Debug, Clone, Default)]
pub struct LineAttrs {
    /// This row is a continuation of the previous row (soft-wrapped).
    pub is_continued: bool,
    pub prompt_kind: PromptKind,
    /// Set when any cell on the line carries the image-placeholder
    /// sentinel; lets the graphics manager skip scanning lines with no
    /// virtual placements (spec §4.4.3).
    pub has_image_placeholders: bool,
    pub dirty: bool,
}

/// One row of the grid: `columns` cells plus [`LineAttrs`].
#[derive(Debug, Clone)]
pub struct Line {
    cells: Vec<Cell>,
    pub attrs: LineAttrs,
}

impl Line {
    pub fn new(columns: usize) -> Self {
        Self {
            cells: (0..columns).map(|_| Cell::default()).collect(),
            attrs: LineAttrs::default(),
        }
    }

    pub fn columns(&self) -> usize {
        self.cells.len()
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    pub fn cell(&self, x: usize) -> Option<&Cell> {
        self.cells.get(x)
    }

    pub fn cell_mut(&mut self, x: usize) -> Option<&mut Cell> {
        self.cells.get_mut(x)
    }

    /// Zero every cell. When `keep_attrs` is false, line-level attrs reset
    /// too (spec §4.1 `clear_line`).
    pub fn clear(&mut self, keep_attrs: bool) {
        for cell in &mut self.cells {
            cell.clear();
        }
        if !keep_attrs {
            self.attrs = LineAttrs::default();
        } else {
            self.attrs.dirty = true;
        }
    }

    /// Resize in place, truncating or padding with blank cells. Used by the
    /// line buffer when the reflow engine needs a scratch row of a new width.
    pub fn resize(&mut self, columns: usize) {
        self.cells.resize_with(columns, Cell::default);
    }

    pub fn mark_dirty(&mut self) {
        self.attrs.dirty = true;
    }

    /// Plain-text rendering of the row: base chars only, combining marks
    /// included, wide-char trailers skipped.
    pub fn text(&self) -> String {
        let mut s = String::with_capacity(self.cells.len());
        for cell in &self.cells {
            if cell.is_wide_spacer() {
                continue;
            }
            if cell.has_combining_chars() {
                s.push_str(&cell.get_grapheme());
            } else {
                s.push(cell.base_char());
            }
        }
        s
    }

    /// True if any cell on the line differs from a freshly cleared one —
    /// drives the "content lines before/after" counters in reflow (spec §4.1).
    pub fn has_content(&self) -> bool {
        self.cells.iter().any(|c| !c.is_empty())
    }

    pub fn next_char_was_wrapped(&self) -> bool {
        self.cells
            .last()
            .map(|c| c.flags.contains(crate::cell::CellFlags::NEXT_CHAR_WAS_WRAPPED))
            .unwrap_or(false)
    }

    pub fn set_next_char_was_wrapped(&mut self, wrapped: bool) {
        if let Some(last) = self.cells.last_mut() {
            last.flags.set(crate::cell::CellFlags::NEXT_CHAR_WAS_WRAPPED, wrapped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_line_has_no_content() {
        let line = Line::new(10);
        assert!(!line.has_content());
        assert_eq!(line.text().trim(), "");
    }

    #[test]
    fn clear_keep_attrs_marks_dirty_but_preserves_attrs() {
        let mut line = Line::new(4);
        line.attrs.prompt_kind = PromptKind::PromptStart;
        line.clear(true);
        assert_eq!(line.attrs.prompt_kind, PromptKind::PromptStart);
        assert!(line.attrs.dirty);
    }
}
