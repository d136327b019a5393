//! Selection tracking layered on top of the grid (spec §4.5).

use unicode_segmentation::UnicodeSegmentation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtendMode {
    #[default]
    Cell,
    Word,
    Line,
    LineFromPoint,
    WordAndLineFromPoint,
}

/// One boundary of a selection: a cell position plus which half of the
/// cell the pointer was in (used for sub-cell-precision CELL mode).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Boundary {
    pub x: usize,
    pub y: usize,
    pub in_left_half: bool,
    pub scrolled_by: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub anchor: Boundary,
    pub start: Boundary,
    pub end: Boundary,
    pub rectangle_select: bool,
    pub is_hyperlink: bool,
}

impl Selection {
    pub fn new(anchor: Boundary, rectangle_select: bool) -> Self {
        Self {
            anchor,
            start: anchor,
            end: anchor,
            rectangle_select,
            is_hyperlink: false,
        }
    }

    /// True when both boundaries resolve to the same half-cell (spec §3
    /// "A selection is empty when both boundaries resolve to the same
    /// half-cell").
    pub fn is_empty(&self) -> bool {
        self.start.x == self.end.x
            && self.start.y == self.end.y
            && self.start.in_left_half == self.end.in_left_half
    }

    /// Ordered `(low, high)` boundary pair, by row then column.
    pub fn ordered(&self) -> (Boundary, Boundary) {
        if (self.start.y, self.start.x) <= (self.end.y, self.end.x) {
            (self.start, self.end)
        } else {
            (self.end, self.start)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateOptions {
    pub ended: bool,
    pub start_extended: bool,
    pub set_as_nearest_extend: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SelectionsSet {
    pub selections: Vec<Selection>,
    pub extend_mode: ExtendMode,
    pub extension_in_progress: bool,
    last_rendered: Vec<Selection>,
    scrolled_by_at_last_render: usize,
}

impl SelectionsSet {
    pub fn start_selection(
        &mut self,
        x: usize,
        y: usize,
        in_left_half: bool,
        rectangle: bool,
        mode: ExtendMode,
    ) {
        self.extend_mode = mode;
        self.extension_in_progress = true;
        let anchor = Boundary {
            x,
            y,
            in_left_half,
            scrolled_by: 0,
        };
        self.selections = vec![Selection::new(anchor, rectangle)];
    }

    /// Move the non-anchor boundary of the most recent selection according
    /// to `extend_mode`. Word/line snapping is intentionally left coarse
    /// here (it needs the owning `Screen`'s lines to find word/line
    /// boundaries); callers pass in pre-snapped `(x, y)` via
    /// [`Self::update_selection_snapped`] when line text is available.
    pub fn update_selection(
        &mut self,
        x: usize,
        y: usize,
        in_left_half: bool,
        opts: UpdateOptions,
    ) {
        let Some(sel) = self.selections.last_mut() else {
            return;
        };
        let moving = if opts.set_as_nearest_extend {
            nearest_boundary_is_start(sel, x, y, self.extend_mode)
        } else {
            false
        };
        let boundary = Boundary {
            x,
            y,
            in_left_half,
            scrolled_by: 0,
        };
        if moving || opts.start_extended {
            sel.start = boundary;
        } else {
            sel.end = boundary;
        }
        if opts.ended {
            self.extension_in_progress = false;
        }
    }

    pub fn clear(&mut self) {
        self.selections.clear();
        self.extension_in_progress = false;
    }

    /// Replace the whole set with a single already-resolved range, used by
    /// `detect_url` to install a URL/hyperlink highlight (spec §4.5
    /// "installed as a single Selection").
    pub fn set_single(&mut self, start: Boundary, end: Boundary, is_hyperlink: bool) {
        let mut sel = Selection::new(start, false);
        sel.end = end;
        sel.is_hyperlink = is_hyperlink;
        self.selections = vec![sel];
        self.extension_in_progress = false;
    }

    /// True iff scroll position, selection count, or any selection's
    /// boundaries differ from what was last rendered (spec §4.5
    /// `is_selection_dirty`).
    pub fn is_dirty(&self, scrolled_by: usize) -> bool {
        scrolled_by != self.scrolled_by_at_last_render || self.selections != self.last_rendered
    }

    pub fn mark_rendered(&mut self, scrolled_by: usize) {
        self.last_rendered = self.selections.clone();
        self.scrolled_by_at_last_render = scrolled_by;
    }

    /// Write selection bits into `mask` (`lines * columns` long): 1 for
    /// primary selection, 2 for URL highlight, OR'd in (spec §4.5
    /// `apply_selection`).
    pub fn apply_selection(&self, mask: &mut [u8], columns: usize, bit: u8) {
        for sel in &self.selections {
            if sel.is_empty() {
                continue;
            }
            if sel.rectangle_select {
                let (lo, hi) = sel.ordered();
                let (x0, x1) = (lo.x.min(hi.x), lo.x.max(hi.x));
                for y in lo.y..=hi.y {
                    for x in x0..=x1 {
                        set_bit(mask, y, x, columns, bit);
                    }
                }
            } else {
                let (lo, hi) = sel.ordered();
                if lo.y == hi.y {
                    for x in lo.x..hi.x {
                        set_bit(mask, lo.y, x, columns, bit);
                    }
                } else {
                    for x in lo.x..columns {
                        set_bit(mask, lo.y, x, columns, bit);
                    }
                    for y in (lo.y + 1)..hi.y {
                        for x in 0..columns {
                            set_bit(mask, y, x, columns, bit);
                        }
                    }
                    for x in 0..hi.x {
                        set_bit(mask, hi.y, x, columns, bit);
                    }
                }
            }
        }
    }
}

fn set_bit(mask: &mut [u8], y: usize, x: usize, columns: usize, bit: u8) {
    if let Some(slot) = mask.get_mut(y * columns + x) {
        *slot |= bit;
    }
}

fn nearest_boundary_is_start(sel: &Selection, x: usize, y: usize, mode: ExtendMode) -> bool {
    let dist = |b: &Boundary| -> usize {
        match mode {
            ExtendMode::Line | ExtendMode::LineFromPoint | ExtendMode::WordAndLineFromPoint => {
                y.abs_diff(b.y)
            }
            _ => y.abs_diff(b.y) * 100_000 + x.abs_diff(b.x),
        }
    };
    dist(&sel.start) <= dist(&sel.end)
}

/// Characters considered part of a "word" for WORD-mode selection
/// extension (spec §4.5). Alphanumeric plus the handful of punctuation
/// marks real shells treat as part of a path/URL token.
pub fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric() || matches!(ch, '_' | '-' | '.' | '/' | '~' | ':')
}

/// Optional extension of the word boundary: lets `scheme://` coalesce with
/// the following path so common URLs are captured as one word (spec §4.5
/// "sequences `...://` are treated as part of the word").
pub fn is_opt_word_char(ch: char, _forward: bool) -> bool {
    matches!(ch, '?' | '#' | '&' | '=' | '%' | '+')
}

/// Find the word-boundary-snapped `(start_x, end_x)` on a single line of
/// text containing `x`, per spec §4.5 WORD mode.
pub fn word_bounds(line_text: &str, x: usize) -> (usize, usize) {
    let chars: Vec<char> = line_text.chars().collect();
    if chars.is_empty() {
        return (0, 0);
    }
    let x = x.min(chars.len() - 1);
    if !is_word_char(chars[x]) {
        return (x, x + 1);
    }
    let mut start = x;
    while start > 0 && (is_word_char(chars[start - 1]) || is_opt_word_char(chars[start - 1], false)) {
        start -= 1;
    }
    let mut end = x + 1;
    while end < chars.len() && (is_word_char(chars[end]) || is_opt_word_char(chars[end], true)) {
        end += 1;
    }
    (start, end)
}

/// Grapheme-aware text extraction for a selection range over a flat string
/// (used once the caller has joined the logical line's cell text).
pub fn extract_text(line_text: &str, start: usize, end: usize) -> String {
    line_text
        .graphemes(true)
        .skip(start)
        .take(end.saturating_sub(start))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_selection_when_boundaries_match() {
        let b = Boundary {
            x: 3,
            y: 1,
            in_left_half: true,
            scrolled_by: 0,
        };
        let sel = Selection::new(b, false);
        assert!(sel.is_empty());
    }

    #[test]
    fn word_bounds_snap_to_alphanumeric_run() {
        let (s, e) = word_bounds("foo bar baz", 5);
        assert_eq!(&"foo bar baz"[s..e], "bar");
    }

    #[test]
    fn word_bounds_include_scheme_separator() {
        let (s, e) = word_bounds("see https://example.com/path here", 8);
        let text: String = "see https://example.com/path here".chars().skip(s).take(e - s).collect();
        assert_eq!(text, "https://example.com/path");
    }

    #[test]
    fn apply_selection_sets_bit_across_multiple_rows() {
        let mut mask = vec![0u8; 3 * 4];
        let mut set = SelectionsSet::default();
        set.start_selection(2, 0, false, false, ExtendMode::Cell);
        set.update_selection(1, 1, false, UpdateOptions::default());
        set.apply_selection(&mut mask, 4, 1);
        assert_eq!(mask[0 * 4 + 2], 1);
        assert_eq!(mask[0 * 4 + 3], 1);
        assert_eq!(mask[1 * 4 + 0], 1);
    }
}
