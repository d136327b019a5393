//! URL / hyperlink-id detection layered on the grid (spec §4.5
//! `detect_url`).

use regex::Regex;
use std::sync::OnceLock;

/// Schemes recognized for bare-word (non-hyperlink-id) scanning. Kept
/// narrow deliberately: this is a heuristic text scanner, not a full URI
/// grammar (that's `url::Url::parse`'s job once a candidate is found).
fn url_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"(?:https?|ftp|file|ssh|git)://[^\s<>"'\x00-\x1f]+"#).unwrap())
}

/// Result of [`detect_at`]: a character range plus whether it came from an
/// OSC-8 hyperlink id rather than heuristic scanning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlMatch {
    pub start_x: usize,
    pub end_x: usize,
    pub y: usize,
    pub is_hyperlink: bool,
    pub text: String,
}

/// Bracket pairs a scanned URL must not swallow the closing half of,
/// unless it also contains the opening half (spec §4.5 "honoring bracket
/// sentinels").
const BRACKET_PAIRS: &[(char, char)] = &[
    ('"', '"'),
    ('\'', '\''),
    ('*', '*'),
    ('(', ')'),
    ('[', ']'),
    ('{', '}'),
    ('<', '>'),
];

/// Scan a single line of already-joined text for the URL-like run
/// containing `x`. Returns `None` if `x` isn't inside a match.
pub fn line_url_at(text: &str, x: usize) -> Option<(usize, usize)> {
    let chars: Vec<char> = text.chars().collect();
    for m in url_regex().find_iter(text) {
        let (byte_start, byte_end) = (m.start(), m.end());
        let char_start = text[..byte_start].chars().count();
        let char_end = text[..byte_end].chars().count();
        if x >= char_start && x < char_end {
            let (start, end) = trim_trailing_bracket(&chars, char_start, char_end);
            return Some((start, end));
        }
    }
    None
}

fn trim_trailing_bracket(chars: &[char], start: usize, mut end: usize) -> (usize, usize) {
    while end > start {
        let last = chars[end - 1];
        if let Some(&(open, close)) = BRACKET_PAIRS.iter().find(|(_, c)| *c == last) {
            let opens = chars[start..end - 1].iter().filter(|&&c| c == open).count();
            let closes = chars[start..end - 1].iter().filter(|&&c| c == close).count();
            if opens <= closes {
                end -= 1;
                continue;
            }
        }
        break;
    }
    (start, end)
}

/// Validate (not merely pattern-match) a candidate string as a URL,
/// delegating scheme/host parsing to the `url` crate rather than
/// reimplementing RFC 3986.
pub fn parse(candidate: &str) -> Option<url::Url> {
    url::Url::parse(candidate).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_plain_https_url() {
        let text = "see https://example.com/path for more";
        let (s, e) = line_url_at(text, 8).unwrap();
        let found: String = text.chars().skip(s).take(e - s).collect();
        assert_eq!(found, "https://example.com/path");
    }

    #[test]
    fn trims_enclosing_parenthesis() {
        let text = "(https://example.com)";
        let (s, e) = line_url_at(text, 2).unwrap();
        let found: String = text.chars().skip(s).take(e - s).collect();
        assert_eq!(found, "https://example.com");
    }

    #[test]
    fn non_url_position_returns_none() {
        assert!(line_url_at("just some text", 2).is_none());
    }
}
