//! Scrollback navigation, text extraction, and search.
//!
//! Shell-integration marker tracking (OSC 133 prompt/command lifecycle) is
//! out of this crate's scope; `par_term_screen::Screen` already tracks
//! prompt rows via [`par_term_screen::line::PromptKind`] and exposes
//! `scroll_to_prompt` directly, so this module only wraps the history-view
//! and text-search surface a frontend needs each frame.

use super::TerminalManager;
use crate::SearchMatch;
use par_term_screen::history::ScrollAmount;

impl TerminalManager {
    /// Scroll the viewport `n` lines further into history (or back towards
    /// the live screen if `upwards` is false).
    pub fn scroll_lines(&self, n: usize, upwards: bool) {
        self.screen
            .lock()
            .history_scroll(ScrollAmount::Lines(n), upwards);
    }

    /// Scroll one page (`rows - 1` lines).
    pub fn scroll_page(&self, upwards: bool) {
        self.screen.lock().history_scroll(ScrollAmount::Page, upwards);
    }

    /// Scroll all the way into history, or all the way back to the live screen.
    pub fn scroll_full(&self, upwards: bool) {
        self.screen.lock().history_scroll(ScrollAmount::Full, upwards);
    }

    pub fn scroll_to_bottom(&self) {
        self.screen.lock().scroll_to_bottom();
    }

    /// How many lines the viewport is currently scrolled back into history.
    pub fn scrolled_by(&self) -> usize {
        self.screen.lock().scrolled_by_amount()
    }

    /// Walk to the `n`-th previous (`n > 0`) or next (`n < 0`) marked
    /// prompt row, or back to the last-visited one when `n == 0`.
    pub fn scroll_to_prompt(&self, n: i32) {
        self.screen.lock().scroll_to_prompt(n);
    }

    /// Number of lines currently held in scrollback.
    pub fn scrollback_len(&self) -> usize {
        self.screen.lock().history().len()
    }

    /// Plain text of every scrollback line, oldest first.
    pub fn scrollback(&self) -> Vec<String> {
        self.screen
            .lock()
            .history()
            .iter()
            .map(|line| line.text().trim_end().to_string())
            .collect()
    }

    /// Text of the line at an absolute index (0 = oldest scrollback line,
    /// continuing into the live screen).
    pub fn line_text_at_absolute(&self, absolute_line: usize) -> Option<String> {
        let screen = self.screen.lock();
        let history_len = screen.history().len();
        if absolute_line < history_len {
            screen
                .history()
                .line(absolute_line)
                .map(|line| line.text().trim_end().to_string())
        } else {
            let row = absolute_line - history_len;
            if row < screen.rows() {
                Some(screen.visible_line(row).text().trim_end().to_string())
            } else {
                None
            }
        }
    }

    /// Text of every line in `[start, end)` as `(text, absolute_line)` pairs.
    pub fn lines_text_range(&self, start: usize, end: usize) -> Vec<(String, usize)> {
        let screen = self.screen.lock();
        let history_len = screen.history().len();
        let max_line = history_len + screen.rows();
        let start = start.min(max_line);
        let end = end.min(max_line);

        let mut result = Vec::with_capacity(end.saturating_sub(start));
        for abs_line in start..end {
            let text = if abs_line < history_len {
                match screen.history().line(abs_line) {
                    Some(line) => line.text().trim_end().to_string(),
                    None => break,
                }
            } else {
                let row = abs_line - history_len;
                if row >= screen.rows() {
                    break;
                }
                screen.visible_line(row).text().trim_end().to_string()
            };
            result.push((text, abs_line));
        }
        result
    }

    /// Erase scrollback (CSI 3 J: drop retained history, leave the live
    /// screen untouched).
    pub fn clear_scrollback(&self) {
        self.screen.lock().erase_in_display(3);
    }

    /// Find every occurrence of `query` in the live screen.
    pub fn search(&self, query: &str, case_sensitive: bool) -> Vec<SearchMatch> {
        let screen = self.screen.lock();
        let mut results = Vec::new();
        for row in 0..screen.rows() {
            let text = screen.visible_line(row).text();
            find_matches(&text, query, case_sensitive, row, &mut results);
        }
        results
    }

    /// Find every occurrence of `query` in scrollback, oldest-first, capped
    /// at `max_lines` lines scanned from the most recent end if given.
    pub fn search_scrollback(
        &self,
        query: &str,
        case_sensitive: bool,
        max_lines: Option<usize>,
    ) -> Vec<SearchMatch> {
        let screen = self.screen.lock();
        let history = screen.history();
        let history_len = history.len();
        let skip = max_lines.map(|n| history_len.saturating_sub(n)).unwrap_or(0);
        let mut results = Vec::new();
        for idx in skip..history_len {
            let Some(line) = history.line(idx) else { continue };
            find_matches(&line.text(), query, case_sensitive, idx, &mut results);
        }
        results
    }

    /// Search both scrollback and the live screen, returning matches in
    /// absolute-line order.
    pub fn search_all(&self, query: &str, case_sensitive: bool) -> Vec<SearchMatch> {
        let screen = self.screen.lock();
        let history_len = screen.history().len();
        let mut results = Vec::new();

        for (idx, line) in screen.history().iter().enumerate() {
            find_matches(&line.text(), query, case_sensitive, idx, &mut results);
        }
        for row in 0..screen.rows() {
            let text = screen.visible_line(row).text();
            find_matches(&text, query, case_sensitive, history_len + row, &mut results);
        }

        results.sort_by(|a, b| a.line.cmp(&b.line).then_with(|| a.column.cmp(&b.column)));
        results
    }
}

fn find_matches(
    line_text: &str,
    query: &str,
    case_sensitive: bool,
    absolute_line: usize,
    out: &mut Vec<SearchMatch>,
) {
    if query.is_empty() {
        return;
    }
    let haystack = if case_sensitive {
        line_text.to_string()
    } else {
        line_text.to_lowercase()
    };
    let needle = if case_sensitive {
        query.to_string()
    } else {
        query.to_lowercase()
    };
    let chars: Vec<char> = haystack.chars().collect();
    let needle_chars: Vec<char> = needle.chars().collect();
    if needle_chars.is_empty() || needle_chars.len() > chars.len() {
        return;
    }
    for start in 0..=(chars.len() - needle_chars.len()) {
        if chars[start..start + needle_chars.len()] == needle_chars[..] {
            out.push(SearchMatch::new(absolute_line, start, needle_chars.len()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_finds_match_on_live_screen() {
        let term = TerminalManager::new(20, 2);
        term.screen.lock().draw_text("hello world");
        let matches = term.search("world", true);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].column, 6);
    }

    #[test]
    fn search_is_case_insensitive_when_requested() {
        let term = TerminalManager::new(20, 1);
        term.screen.lock().draw_text("Hello");
        assert!(term.search("hello", false).len() == 1);
        assert!(term.search("hello", true).is_empty());
    }

    #[test]
    fn scroll_to_bottom_resets_scrolled_by() {
        let term = TerminalManager::new(5, 2);
        {
            let mut screen = term.screen.lock();
            for _ in 0..5 {
                screen.linefeed();
            }
        }
        term.scroll_full(true);
        assert!(term.scrolled_by() > 0);
        term.scroll_to_bottom();
        assert_eq!(term.scrolled_by(), 0);
    }

    #[test]
    fn clear_scrollback_empties_history() {
        let term = TerminalManager::new(5, 2);
        {
            let mut screen = term.screen.lock();
            for _ in 0..5 {
                screen.linefeed();
            }
        }
        assert!(term.scrollback_len() > 0);
        term.clear_scrollback();
        assert_eq!(term.scrollback_len(), 0);
    }
}
