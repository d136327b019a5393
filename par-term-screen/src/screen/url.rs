//! `detect_url`/`open_url`: hyperlink-id and heuristic-text URL scanning
//! layered on the grid, installing a result into `Screen::url_ranges`
//! (spec §4.5 "URL detection").

use super::Screen;
use crate::selection::Boundary;

/// How many rows to scan outward from the click point when following a
/// hyperlink id or a wrapped bare-text URL (spec §4.5 "scan at most ~5
/// rows each way").
const SCAN_ROWS: usize = 5;

impl Screen {
    /// Resolve the URL/hyperlink range at `(x, y)` and install it into
    /// `self.url_ranges`. Returns `true` if a range was found.
    pub fn detect_url(&mut self, x: usize, y: usize) -> bool {
        let Some(cell) = self.linebuf().line(y).cell(x) else {
            return false;
        };
        if cell.hyperlink_id != 0 {
            let id = cell.hyperlink_id;
            let (start, end) = self.hyperlink_extent(x, y, id);
            self.url_ranges.set_single(start, end, true);
            return true;
        }

        let top = y.saturating_sub(SCAN_ROWS);
        let bottom = (y + SCAN_ROWS).min(self.rows.saturating_sub(1));

        // Walk left across continuation rows to find the logical start of
        // the run containing `x`.
        let mut start_y = y;
        let mut start_x = None;
        loop {
            let text = self.linebuf().line(start_y).text();
            if let Some((sx, _)) = crate::url::line_url_at(&text, if start_y == y { x } else { text.chars().count().saturating_sub(1) }) {
                start_x = Some(sx);
            }
            if start_x.is_some() || start_y == top || !self.linebuf().line(start_y).attrs.is_continued {
                break;
            }
            start_y -= 1;
        }
        let Some(start_x) = start_x else { return false };

        let mut end_y = start_y;
        let mut end_x = start_x;
        let mut row = start_y;
        loop {
            let text = self.linebuf().line(row).text();
            let probe_x = if row == y { x.min(text.chars().count().saturating_sub(1)) } else { 0 };
            if let Some((_, ex)) = crate::url::line_url_at(&text, probe_x) {
                end_y = row;
                end_x = ex;
            }
            let wraps = self.linebuf().line(row).next_char_was_wrapped();
            if !wraps || row >= bottom {
                break;
            }
            row += 1;
        }

        let start = Boundary { x: start_x, y: start_y, in_left_half: true, scrolled_by: 0 };
        let end = Boundary { x: end_x, y: end_y, in_left_half: false, scrolled_by: 0 };
        self.url_ranges.set_single(start, end, false);
        true
    }

    /// Scan contiguous cells sharing hyperlink id `id` outward from
    /// `(x, y)`, up to `SCAN_ROWS` rows each direction (spec §4.5 "mark all
    /// contiguous runs of the same id").
    fn hyperlink_extent(&self, x: usize, y: usize, id: u16) -> (Boundary, Boundary) {
        let columns = self.columns;
        let row_run = |row: usize| -> Option<(usize, usize)> {
            let line = self.linebuf().line(row);
            if line.cell(x).map(|c| c.hyperlink_id) != Some(id) && row != y {
                return None;
            }
            let mut lo = x.min(columns.saturating_sub(1));
            let mut hi = lo;
            if row != y {
                // Entire row is a candidate continuation; find its full run.
                lo = 0;
                hi = columns.saturating_sub(1);
            }
            while lo > 0 && line.cell(lo - 1).map(|c| c.hyperlink_id) == Some(id) {
                lo -= 1;
            }
            while hi + 1 < columns && line.cell(hi + 1).map(|c| c.hyperlink_id) == Some(id) {
                hi += 1;
            }
            Some((lo, hi))
        };

        let (mut start_x, mut end_x) = row_run(y).unwrap_or((x, x));
        let mut start_y = y;
        let mut end_y = y;

        let top = y.saturating_sub(SCAN_ROWS);
        for row in (top..y).rev() {
            let line = self.linebuf().line(row);
            if line.cell(columns.saturating_sub(1)).map(|c| c.hyperlink_id) == Some(id) {
                start_y = row;
                start_x = 0;
                if let Some((lo, _)) = row_run(row) {
                    start_x = lo;
                }
            } else {
                break;
            }
        }
        let bottom = (y + SCAN_ROWS).min(self.rows.saturating_sub(1));
        for row in (y + 1)..=bottom {
            let line = self.linebuf().line(row);
            if line.cell(0).map(|c| c.hyperlink_id) == Some(id) {
                end_y = row;
                end_x = columns.saturating_sub(1);
                if let Some((_, hi)) = row_run(row) {
                    end_x = hi;
                }
            } else {
                break;
            }
        }

        (
            Boundary { x: start_x, y: start_y, in_left_half: true, scrolled_by: 0 },
            Boundary { x: end_x + 1, y: end_y, in_left_half: false, scrolled_by: 0 },
        )
    }

    /// CSI/OSC-driven "open the URL under the installed range": resolves a
    /// hyperlink id through the host's pool lookup, or extracts plain text
    /// from the range and hands it to the host verbatim (spec §4.5
    /// `open_url`).
    pub fn open_url(&mut self) {
        let Some(sel) = self.url_ranges.selections.last().cloned() else { return };
        let (lo, hi) = sel.ordered();
        if sel.is_hyperlink {
            let id = self.linebuf().line(lo.y).cell(lo.x).map(|c| c.hyperlink_id).unwrap_or(0);
            if let Some(url) = self.host.resolve_hyperlink_url(id) {
                self.host.on_open_url(&url);
            }
            return;
        }
        let text = self.extract_range_text(lo, hi);
        if !text.is_empty() {
            self.host.on_open_url(&text);
        }
    }

    fn extract_range_text(&self, lo: Boundary, hi: Boundary) -> String {
        if lo.y == hi.y {
            let text = self.linebuf().line(lo.y).text();
            return crate::selection::extract_text(&text, lo.x, hi.x);
        }
        let mut out = String::new();
        let first = self.linebuf().line(lo.y).text();
        out.push_str(&crate::selection::extract_text(&first, lo.x, first.chars().count()));
        for y in (lo.y + 1)..hi.y {
            out.push_str(self.linebuf().line(y).text().trim_end());
        }
        let last = self.linebuf().line(hi.y).text();
        out.push_str(&crate::selection::extract_text(&last, 0, hi.x));
        out
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
    fn detect_url_finds_bare_https_run() {
        let mut s = screen(5, 40);
        s.draw_text("see https://example.com/path here");
        assert!(s.detect_url(8, 0));
        assert_eq!(s.url_ranges.selections.len(), 1);
        assert!(!s.url_ranges.selections[0].is_hyperlink);
    }

    #[test]
    fn detect_url_returns_false_on_plain_text() {
        let mut s = screen(5, 40);
        s.draw_text("just some text");
        assert!(!s.detect_url(2, 0));
    }

    #[test]
    fn detect_url_follows_hyperlink_id_run() {
        let mut s = screen(5, 40);
        s.set_active_hyperlink(Some(7));
        s.draw_text("click");
        s.set_active_hyperlink(None);
        assert!(s.detect_url(2, 0));
        let sel = &s.url_ranges.selections[0];
        assert!(sel.is_hyperlink);
        let (lo, hi) = sel.ordered();
        assert_eq!((lo.x, hi.x), (0, 5));
    }
}
