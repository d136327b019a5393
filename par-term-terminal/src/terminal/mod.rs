//! `TerminalManager`: owns a [`par_term_screen::Screen`] behind a lock and
//! provides the high-level API a frontend drives each frame — resize,
//! cursor/mode queries, dirty-row polling, and styled-segment extraction.
//!
//! The teacher crate wrapped a PTY session; this crate wraps the screen
//! engine directly. Escape-sequence parsing and child-process I/O are the
//! embedder's concern (spec §1 lists both as external collaborators) — the
//! embedder feeds parsed operations into the `Screen` obtained from
//! [`TerminalManager::screen`] and forwards bytes it reads from its own
//! PTY/transport into a parser that drives that same `Screen`.

use crate::host::{CapturingHost, SharedHost};
use par_term_screen::host::ScreenHost;
use par_term_screen::{CursorStyle, Screen};
use parking_lot::Mutex;
use std::sync::Arc;

pub mod clipboard;
pub mod graphics;
pub mod rendering;
pub mod scrollback;

/// Terminal manager that wraps a [`Screen`].
pub struct TerminalManager {
    pub(crate) screen: Arc<Mutex<Screen>>,
    pub(crate) host: Arc<Mutex<CapturingHost>>,
    pub(crate) dimensions: (usize, usize),
}

impl TerminalManager {
    /// Create a new terminal manager with the specified dimensions and the
    /// default 10,000-line scrollback.
    pub fn new(cols: usize, rows: usize) -> Self {
        Self::new_with_scrollback(cols, rows, 10_000)
    }

    /// Create a new terminal manager with specified dimensions and scrollback size.
    pub fn new_with_scrollback(cols: usize, rows: usize, scrollback_size: usize) -> Self {
        log::info!(
            "Creating terminal with dimensions: {}x{}, scrollback: {}",
            cols,
            rows,
            scrollback_size
        );
        let (shared, host) = SharedHost::new();
        let screen = Screen::new(rows, cols, scrollback_size, Box::new(shared));
        Self {
            screen: Arc::new(Mutex::new(screen)),
            host,
            dimensions: (cols, rows),
        }
    }

    /// Create a terminal manager driven by a caller-supplied host instead
    /// of the built-in [`CapturingHost`], for embedders that want to act on
    /// notifications immediately rather than polling queued state.
    pub fn with_host(
        cols: usize,
        rows: usize,
        scrollback_size: usize,
        host: Box<dyn ScreenHost>,
    ) -> Self {
        let screen = Screen::new(rows, cols, scrollback_size, host);
        Self {
            screen: Arc::new(Mutex::new(screen)),
            host: Arc::new(Mutex::new(CapturingHost::new())),
            dimensions: (cols, rows),
        }
    }

    /// Install the callback that outbound writes (terminal replies, mouse
    /// reports, APC/DCS responses) are forwarded through. Only takes effect
    /// when the manager was built with the default [`CapturingHost`]
    /// (i.e. via [`Self::new`]/[`Self::new_with_scrollback`]).
    pub fn set_output_callback<F>(&self, callback: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.host.lock().set_output_callback(callback);
    }

    /// Shared handle to the underlying screen, for a parser to drive
    /// directly.
    pub fn screen(&self) -> Arc<Mutex<Screen>> {
        self.screen.clone()
    }

    /// Get the current terminal dimensions as `(cols, rows)`.
    pub fn dimensions(&self) -> (usize, usize) {
        self.dimensions
    }

    /// Resize the terminal.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        log::info!("Resizing terminal to: {}x{}", cols, rows);
        self.screen.lock().resize(rows, cols);
        self.dimensions = (cols, rows);
    }

    /// Get the terminal content as a plain-text string (scrollback + visible rows).
    pub fn content(&self) -> String {
        let screen = self.screen.lock();
        let mut out = String::new();
        for line in screen.history().iter() {
            out.push_str(line.text().trim_end());
            out.push('\n');
        }
        for y in 0..screen.rows() {
            out.push_str(screen.visible_line(y).text().trim_end());
            out.push('\n');
        }
        out
    }

    /// Get cursor position as `(x, y)`.
    pub fn cursor_position(&self) -> (usize, usize) {
        let screen = self.screen.lock();
        let cursor = screen.cursor();
        (cursor.x, cursor.y)
    }

    /// Get the cursor's shape/blink style.
    pub fn cursor_style(&self) -> CursorStyle {
        self.screen.lock().cursor().style
    }

    /// Check if the cursor is currently visible (DECTCEM).
    pub fn is_cursor_visible(&self) -> bool {
        self.screen.lock().cursor().visible
    }

    /// Check if the alternate screen buffer is active.
    pub fn is_alt_screen_active(&self) -> bool {
        self.screen.lock().is_alt_screen()
    }

    /// Row indices touched since the last call, cleared by this call.
    pub fn take_dirty_rows(&self) -> Vec<usize> {
        self.screen.lock().take_dirty_rows()
    }

    /// Styled runs for the currently visible rows.
    pub fn get_styled_segments(&self) -> Vec<crate::styled_content::StyledSegment> {
        crate::styled_content::extract_styled_segments(&self.screen.lock())
    }

    /// Current bell event count (queued via the default host).
    pub fn bell_count(&self) -> u64 {
        self.host.lock().bell_count()
    }

    /// Get the terminal title set by OSC 0/1/2.
    pub fn get_title(&self) -> String {
        self.host.lock().title().to_string()
    }

    /// Get the terminal icon name set by OSC 1.
    pub fn get_icon(&self) -> String {
        self.host.lock().icon().to_string()
    }

    /// Check if there are pending desktop notifications (OSC 9/777).
    pub fn has_notifications(&self) -> bool {
        self.host.lock().has_notifications()
    }

    /// Take all pending desktop notifications.
    pub fn take_notifications(&self) -> Vec<crate::host::Notification> {
        self.host.lock().take_notifications()
    }
}

impl Drop for TerminalManager {
    fn drop(&mut self) {
        log::info!("Terminal manager shutdown complete");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_manager_reports_requested_dimensions() {
        let term = TerminalManager::new(80, 24);
        assert_eq!(term.dimensions(), (80, 24));
        assert_eq!(term.screen.lock().rows(), 24);
        assert_eq!(term.screen.lock().columns(), 80);
    }

    #[test]
    fn resize_updates_screen_and_dimensions() {
        let mut term = TerminalManager::new(80, 24);
        term.resize(100, 30);
        assert_eq!(term.dimensions(), (100, 30));
        assert_eq!(term.screen.lock().columns(), 100);
        assert_eq!(term.screen.lock().rows(), 30);
    }

    #[test]
    fn bell_is_observable_through_the_shared_host() {
        let term = TerminalManager::new(80, 24);
        term.screen.lock().bell();
        assert_eq!(term.bell_count(), 1);
    }

    #[test]
    fn output_callback_receives_child_writes() {
        let term = TerminalManager::new(80, 24);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        term.set_output_callback(move |bytes| seen2.lock().push(bytes.to_vec()));
        term.screen.lock().host_mut().write_to_child(b"pong");
        assert_eq!(seen.lock().as_slice(), &[b"pong".to_vec()]);
    }
}
