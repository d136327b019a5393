//! Styled segment extraction from the terminal grid.
//!
//! Converts the visible rows of a [`par_term_screen::Screen`] into a flat
//! list of [`StyledSegment`] values — contiguous runs of text sharing the
//! same visual attributes. This is the entry point for any content
//! pipeline (prettifiers, search-over-styled-text, plain-text export) that
//! wants runs rather than raw cells.

use par_term_screen::{CellFlags, Screen};

/// A contiguous run of characters in the terminal grid that share the same visual style.
///
/// Produced by [`extract_styled_segments`] by scanning the terminal grid and merging
/// adjacent cells with identical foreground color, background color, and text attributes.
#[derive(Debug, Clone)]
pub struct StyledSegment {
    /// The text content of the segment (may contain multi-byte Unicode characters).
    pub text: String,
    /// Foreground (text) color as `(red, green, blue)` with 0–255 components.
    pub fg_color: (u8, u8, u8),
    /// Background color as `(red, green, blue)` with 0–255 components.
    pub bg_color: (u8, u8, u8),
    /// Whether the text is bold.
    pub bold: bool,
    /// Whether the text is italic.
    pub italic: bool,
    /// Whether the text is underlined.
    pub underline: bool,
    /// Row index in the terminal grid (0 = top row).
    pub line: usize,
    /// Column index of the first character of this segment (0 = leftmost column).
    pub start_col: usize,
}

/// Extract styled segments from the active screen buffer.
///
/// Scans every cell of every visible row, merging horizontally adjacent cells
/// that share identical foreground color, background color, bold, italic, and
/// underline attributes into a single [`StyledSegment`]. Wide-character
/// trailer cells are skipped (their glyph was already emitted by the cell
/// that owns them).
///
/// Returns segments in top-to-bottom, left-to-right order. Each segment records
/// its grid row (`line`) and the column of its first character (`start_col`).
pub fn extract_styled_segments(screen: &Screen) -> Vec<StyledSegment> {
    let mut segments = Vec::new();
    let rows = screen.rows();
    let cols = screen.columns();

    for row in 0..rows {
        let line = screen.visible_line(row);
        let mut current_segment: Option<StyledSegment> = None;

        for col in 0..cols {
            let Some(cell) = line.cell(col) else {
                continue;
            };
            if cell.is_wide_spacer() {
                continue;
            }

            let fg = cell.fg.to_rgb();
            let bg = cell.bg.to_rgb();
            let bold = cell.flags.contains(CellFlags::BOLD);
            let italic = cell.flags.contains(CellFlags::ITALIC);
            let underline = cell.underline != par_term_screen::UnderlineStyle::None;
            let text = cell.get_grapheme();

            if let Some(segment) = &mut current_segment {
                let same_style = segment.fg_color == fg
                    && segment.bg_color == bg
                    && segment.bold == bold
                    && segment.italic == italic
                    && segment.underline == underline;

                if same_style {
                    segment.text.push_str(&text);
                    continue;
                }
                segments.push(segment.clone());
            }

            current_segment = Some(StyledSegment {
                text,
                fg_color: fg,
                bg_color: bg,
                bold,
                italic,
                underline,
                line: row,
                start_col: col,
            });
        }

        if let Some(segment) = current_segment {
            segments.push(segment);
        }
    }

    segments
}

/// Convert a slice of styled segments back to plain text, inserting newlines between rows.
///
/// Useful when only the text content is needed and styling can be discarded,
/// for example when passing terminal output to a text-only consumer.
pub fn segments_to_plain_text(segments: &[StyledSegment]) -> String {
    let mut result = String::new();
    let mut current_line = 0;

    for segment in segments {
        while current_line < segment.line {
            result.push('\n');
            current_line += 1;
        }

        result.push_str(&segment.text);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use par_term_screen::host::NullHost;
    use par_term_screen::screen::edit::sgr_param_from_code;
    use par_term_screen::{Color, NamedColor, Screen};

    fn screen(rows: usize, cols: usize) -> Screen {
        Screen::new(rows, cols, 100, Box::new(NullHost))
    }

    #[test]
    fn single_segment_covers_whole_row() {
        let mut s = screen(1, 10);
        s.draw_text("AAAAA");
        let segments = extract_styled_segments(&s);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text.trim_end(), "AAAAA");
    }

    #[test]
    fn style_change_splits_segments() {
        let mut s = screen(1, 10);
        let red = sgr_param_from_code(31, None).unwrap();
        s.draw_text("AAA");
        s.select_graphic_rendition(&[red], None);
        s.draw_text("BBB");
        let segments = extract_styled_segments(&s);
        assert!(segments.len() >= 2);
        assert_eq!(segments[0].text, "AAA");
        assert_eq!(segments[1].text.trim_end(), "BBB");
        assert_eq!(segments[1].fg_color, Color::Named(NamedColor::Red).to_rgb());
    }

    #[test]
    fn plain_text_inserts_newlines_between_rows() {
        let mut s = screen(2, 10);
        s.draw_text("ab\r\ncd");
        let segments = extract_styled_segments(&s);
        let text = segments_to_plain_text(&segments);
        assert!(text.contains('\n'));
        assert!(text.trim().replace('\n', "").contains("ab"));
    }
}
