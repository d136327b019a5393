//! The host-callback surface.
//!
//! The original source threads Python object pointers through the C engine
//! for every side-effecting notification (title changes, clipboard writes,
//! child-process I/O). Spec §9 calls for re-expressing that as an explicit
//! trait the embedder implements, rather than passing function pointers or
//! a global. `Screen` and [`crate::graphics::GraphicsManager`] hold a
//! `Box<dyn ScreenHost>` and call through it instead of reaching for
//! ambient state.
//!
//! Every method has a default no-op body so an embedder only overrides the
//! notifications it cares about.

/// Identifies a dynamic color slot for OSC 10-19/104-119 style queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynamicColorSlot {
    Foreground,
    Background,
    CursorColor,
    SelectionForeground,
    SelectionBackground,
}

/// Clipboard selection target (OSC 52).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardSlot {
    Primary,
    Selection,
    Clipboard,
}

pub trait ScreenHost {
    fn on_bell(&mut self) {}
    fn on_title_changed(&mut self, _title: &str) {}
    fn on_icon_changed(&mut self, _icon: &str) {}
    fn on_dynamic_color(&mut self, _slot: DynamicColorSlot, _rgb: Option<(u8, u8, u8)>) {}
    fn on_desktop_notify(&mut self, _title: &str, _body: &str) {}
    fn on_clipboard_control(&mut self, _slot: ClipboardSlot, _data: Option<&[u8]>) {}
    fn on_set_color_table_color(&mut self, _index: u8, _rgb: (u8, u8, u8)) {}
    fn on_file_transmission(&mut self, _name: &str, _data: &[u8]) {}
    fn on_open_url(&mut self, _url: &str) {}
    /// Look up a hyperlink id's target URL in the external hyperlink pool
    /// (spec §1 "Hyperlink id pool... (leaf libraries)"; spec §4.5
    /// `open_url` "look its target up in the hyperlink pool").
    fn resolve_hyperlink_url(&mut self, _id: u16) -> Option<String> {
        None
    }
    fn request_capabilities(&mut self, _query: &str) -> Option<String> {
        None
    }
    fn on_cmd_output_marking(&mut self, _kind: crate::line::PromptKind) {}
    fn on_color_profile_popped(&mut self) {}
    fn on_handle_kitty_dcs(&mut self, _payload: &[u8]) -> Option<Vec<u8>> {
        None
    }
    /// Graphics file-mode transmission asks before touching the filesystem
    /// (spec §4.4.2 "Before reading a file path the manager asks an
    /// external permission callback").
    fn is_ok_to_read_image_file(&mut self, _path: &str) -> bool {
        false
    }
    fn safe_delete_temp_file(&mut self, _path: &str) {}
    fn write_to_child(&mut self, _bytes: &[u8]) {}
    fn write_escape_code_to_child(&mut self, _escape: &[u8]) {}
}

/// A host that drops every notification; useful in tests and as the
/// default before an embedder is wired up.
#[derive(Debug, Default)]
pub struct NullHost;

impl ScreenHost for NullHost {}
