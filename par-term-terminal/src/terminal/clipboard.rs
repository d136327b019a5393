//! OSC 52 clipboard-control queries.
//!
//! The screen engine never touches an OS clipboard itself (spec §1 treats
//! clipboard I/O as host-side); it only forwards `ClipboardSlot`/payload
//! pairs to [`par_term_screen::host::ScreenHost::on_clipboard_control`].
//! `TerminalManager`'s default host captures the most recent payload per
//! slot so a frontend can apply it to whatever clipboard API it has
//! available.

use super::TerminalManager;
pub use par_term_screen::host::ClipboardSlot;

impl TerminalManager {
    /// Most recent OSC 52 payload set for the given clipboard slot, if any.
    pub fn get_clipboard(&self, slot: ClipboardSlot) -> Option<Vec<u8>> {
        self.host.lock().clipboard(slot).map(|d| d.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clipboard_payload_round_trips_through_the_host() {
        let term = TerminalManager::new(80, 24);
        {
            let mut screen = term.screen.lock();
            screen
                .host_mut()
                .on_clipboard_control(ClipboardSlot::Clipboard, Some(b"copied text"));
        }
        assert_eq!(
            term.get_clipboard(ClipboardSlot::Clipboard),
            Some(b"copied text".to_vec())
        );
        assert_eq!(term.get_clipboard(ClipboardSlot::Primary), None);
    }
}
