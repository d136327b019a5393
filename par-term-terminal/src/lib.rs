//! Terminal manager for par-term's screen engine.
//!
//! This crate is the thin management layer that sits directly on top of
//! [`par_term_screen::Screen`]: it owns the screen behind a lock, tracks
//! dirty-row generations for the render loop, flattens the grid into
//! styled runs for consumers that want plain styled text rather than raw
//! cells, and exposes the graphics/scrollback query surfaces a frontend
//! pulls from each frame.
//!
//! PTY spawning, child-process I/O, and shell-integration marker tracking
//! are out of this crate's scope (`par-term-screen`'s spec lists "process/
//! child-I/O plumbing" as an external collaborator) — a host embeds this
//! crate next to its own process/transport layer and feeds parsed escape
//! sequences into the `Screen` it owns.

pub mod host;
pub mod styled_content;
pub mod terminal;

pub use host::{CapturingHost, SharedHost};
pub use styled_content::{StyledSegment, extract_styled_segments, segments_to_plain_text};
pub use terminal::TerminalManager;

// Re-export the screen engine's public types for convenience so downstream
// crates don't need a direct `par-term-screen` dependency for common types.
pub use par_term_screen::{Cell, Color, CursorShape, CursorStyle, NamedColor};

/// A single search match in the terminal scrollback.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchMatch {
    /// Line index in scrollback (0 = oldest line)
    pub line: usize,
    /// Column position in the line (0-indexed)
    pub column: usize,
    /// Length of the match in characters
    pub length: usize,
}

impl SearchMatch {
    /// Create a new search match.
    pub fn new(line: usize, column: usize, length: usize) -> Self {
        Self {
            line,
            column,
            length,
        }
    }
}
