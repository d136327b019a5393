//! `par-term-screen`: the in-memory VT screen engine.
//!
//! This crate owns the cell grid (main/alt screens + scrollback), the
//! screen state machine that control sequences mutate, the image/graphics
//! overlay, and the selection/URL detection layered on top of the grid.
//! Escape-sequence *parsing*, font rasterization, GPU upload, window/input
//! plumbing, and PTY/process I/O are external collaborators — this crate
//! only exposes the operation surface a parser drives and the render-data
//! surface a renderer pulls from.

pub mod cell;
pub mod color;
pub mod cursor;
pub mod error;
pub mod graphics;
pub mod history;
pub mod host;
pub mod line;
pub mod linebuffer;
pub mod modes;
pub mod overlay;
pub mod pause;
pub mod reflow;
pub mod screen;
pub mod selection;
pub mod url;

pub use cell::{Cell, CellFlags, UnderlineStyle, Width};
pub use color::{Color, NamedColor};
pub use cursor::{Cursor, CursorShape, CursorStyle};
pub use error::{GraphicsError, GraphicsResult};
pub use graphics::GraphicsManager;
pub use history::HistoryBuffer;
pub use host::{NullHost, ScreenHost};
pub use line::{Line, LineAttrs, PromptKind};
pub use linebuffer::LineBuffer;
pub use modes::ScreenModes;
pub use screen::Screen;
pub use selection::SelectionsSet;
