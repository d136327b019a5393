//! A [`ScreenHost`] implementation that records host-visible notifications
//! as plain state instead of acting on them immediately.
//!
//! This generalizes the teacher crate's bell-count / OSC-9 notification
//! queue pattern (the original `TerminalManager::bell_count`/
//! `take_notifications`/`has_notifications` accessors) to every
//! notification the screen engine's host trait exposes (`par-term-screen`'s
//! spec §9 "Python callback surface" redesign note). A frontend polls the
//! queued fields once per frame and clears them with the matching `take_*`
//! method; outbound child writes are forwarded through a caller-supplied
//! callback since this crate no longer owns a PTY directly.

use par_term_screen::host::{ClipboardSlot, DynamicColorSlot, ScreenHost};
use par_term_screen::line::PromptKind;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// A desktop notification queued by OSC 9 / OSC 777.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub body: String,
}

type OutputCallback = Arc<dyn Fn(&[u8]) + Send + Sync>;

/// Captures every [`ScreenHost`] callback into queryable state, and
/// forwards child-write requests through an optional callback.
pub struct CapturingHost {
    bell_count: u64,
    title: String,
    icon: String,
    notifications: Vec<Notification>,
    dynamic_fg: Option<(u8, u8, u8)>,
    dynamic_bg: Option<(u8, u8, u8)>,
    dynamic_cursor: Option<(u8, u8, u8)>,
    dynamic_sel_fg: Option<(u8, u8, u8)>,
    dynamic_sel_bg: Option<(u8, u8, u8)>,
    color_table: HashMap<u8, (u8, u8, u8)>,
    clipboard_primary: Option<Vec<u8>>,
    clipboard_selection: Option<Vec<u8>>,
    clipboard_clipboard: Option<Vec<u8>>,
    opened_urls: Vec<String>,
    received_files: Vec<(String, Vec<u8>)>,
    last_cmd_output_marking: Option<PromptKind>,
    /// Whether graphics file-mode transmission is allowed to read from
    /// disk (spec §4.4.2 "Before reading a file path the manager asks an
    /// external permission callback"). Defaults to false: an embedder that
    /// wants `t`/`f`/`s` transmission modes must opt in explicitly.
    pub allow_file_reads: bool,
    output_callback: Option<OutputCallback>,
}

impl Default for CapturingHost {
    fn default() -> Self {
        Self {
            bell_count: 0,
            title: String::new(),
            icon: String::new(),
            notifications: Vec::new(),
            dynamic_fg: None,
            dynamic_bg: None,
            dynamic_cursor: None,
            dynamic_sel_fg: None,
            dynamic_sel_bg: None,
            color_table: HashMap::new(),
            clipboard_primary: None,
            clipboard_selection: None,
            clipboard_clipboard: None,
            opened_urls: Vec::new(),
            received_files: Vec::new(),
            last_cmd_output_marking: None,
            allow_file_reads: false,
            output_callback: None,
        }
    }
}

impl CapturingHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the callback that outbound child-write requests (terminal
    /// replies, mouse reports, APC/DCS responses) are forwarded through.
    pub fn set_output_callback<F>(&mut self, callback: F)
    where
        F: Fn(&[u8]) + Send + Sync + 'static,
    {
        self.output_callback = Some(Arc::new(callback));
    }

    pub fn bell_count(&self) -> u64 {
        self.bell_count
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn has_notifications(&self) -> bool {
        !self.notifications.is_empty()
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn dynamic_color(&self, slot: DynamicColorSlot) -> Option<(u8, u8, u8)> {
        match slot {
            DynamicColorSlot::Foreground => self.dynamic_fg,
            DynamicColorSlot::Background => self.dynamic_bg,
            DynamicColorSlot::CursorColor => self.dynamic_cursor,
            DynamicColorSlot::SelectionForeground => self.dynamic_sel_fg,
            DynamicColorSlot::SelectionBackground => self.dynamic_sel_bg,
        }
    }

    pub fn color_table_entry(&self, index: u8) -> Option<(u8, u8, u8)> {
        self.color_table.get(&index).copied()
    }

    pub fn clipboard(&self, slot: ClipboardSlot) -> Option<&[u8]> {
        match slot {
            ClipboardSlot::Primary => self.clipboard_primary.as_deref(),
            ClipboardSlot::Selection => self.clipboard_selection.as_deref(),
            ClipboardSlot::Clipboard => self.clipboard_clipboard.as_deref(),
        }
    }

    pub fn take_opened_urls(&mut self) -> Vec<String> {
        std::mem::take(&mut self.opened_urls)
    }

    pub fn take_received_files(&mut self) -> Vec<(String, Vec<u8>)> {
        std::mem::take(&mut self.received_files)
    }

    pub fn last_cmd_output_marking(&self) -> Option<PromptKind> {
        self.last_cmd_output_marking
    }
}

impl ScreenHost for CapturingHost {
    fn on_bell(&mut self) {
        self.bell_count += 1;
    }

    fn on_title_changed(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn on_icon_changed(&mut self, icon: &str) {
        self.icon = icon.to_string();
    }

    fn on_dynamic_color(&mut self, slot: DynamicColorSlot, rgb: Option<(u8, u8, u8)>) {
        match slot {
            DynamicColorSlot::Foreground => self.dynamic_fg = rgb,
            DynamicColorSlot::Background => self.dynamic_bg = rgb,
            DynamicColorSlot::CursorColor => self.dynamic_cursor = rgb,
            DynamicColorSlot::SelectionForeground => self.dynamic_sel_fg = rgb,
            DynamicColorSlot::SelectionBackground => self.dynamic_sel_bg = rgb,
        }
    }

    fn on_desktop_notify(&mut self, title: &str, body: &str) {
        self.notifications.push(Notification {
            title: title.to_string(),
            body: body.to_string(),
        });
    }

    fn on_clipboard_control(&mut self, slot: ClipboardSlot, data: Option<&[u8]>) {
        let owned = data.map(|d| d.to_vec());
        match slot {
            ClipboardSlot::Primary => self.clipboard_primary = owned,
            ClipboardSlot::Selection => self.clipboard_selection = owned,
            ClipboardSlot::Clipboard => self.clipboard_clipboard = owned,
        }
    }

    fn on_set_color_table_color(&mut self, index: u8, rgb: (u8, u8, u8)) {
        self.color_table.insert(index, rgb);
    }

    fn on_file_transmission(&mut self, name: &str, data: &[u8]) {
        self.received_files.push((name.to_string(), data.to_vec()));
    }

    fn on_open_url(&mut self, url: &str) {
        self.opened_urls.push(url.to_string());
    }

    fn request_capabilities(&mut self, _query: &str) -> Option<String> {
        None
    }

    fn on_cmd_output_marking(&mut self, kind: PromptKind) {
        self.last_cmd_output_marking = Some(kind);
    }

    fn on_color_profile_popped(&mut self) {}

    fn on_handle_kitty_dcs(&mut self, _payload: &[u8]) -> Option<Vec<u8>> {
        None
    }

    fn is_ok_to_read_image_file(&mut self, _path: &str) -> bool {
        self.allow_file_reads
    }

    fn safe_delete_temp_file(&mut self, path: &str) {
        if path.contains("tty-graphics-protocol") {
            let _ = std::fs::remove_file(path);
        }
    }

    fn write_to_child(&mut self, bytes: &[u8]) {
        if let Some(cb) = &self.output_callback {
            cb(bytes);
        }
    }

    fn write_escape_code_to_child(&mut self, escape: &[u8]) {
        if let Some(cb) = &self.output_callback {
            cb(escape);
        }
    }
}

/// Shares one [`CapturingHost`] between the `Box<dyn ScreenHost>` the
/// `Screen` owns and a handle `TerminalManager` keeps for itself, so the
/// manager can query title/bell/notification state without downcasting
/// through `Screen::host_mut`.
#[derive(Clone)]
pub struct SharedHost(pub Arc<Mutex<CapturingHost>>);

impl SharedHost {
    pub fn new() -> (Self, Arc<Mutex<CapturingHost>>) {
        let inner = Arc::new(Mutex::new(CapturingHost::new()));
        (Self(inner.clone()), inner)
    }
}

impl ScreenHost for SharedHost {
    fn on_bell(&mut self) {
        self.0.lock().on_bell();
    }

    fn on_title_changed(&mut self, title: &str) {
        self.0.lock().on_title_changed(title);
    }

    fn on_icon_changed(&mut self, icon: &str) {
        self.0.lock().on_icon_changed(icon);
    }

    fn on_dynamic_color(&mut self, slot: DynamicColorSlot, rgb: Option<(u8, u8, u8)>) {
        self.0.lock().on_dynamic_color(slot, rgb);
    }

    fn on_desktop_notify(&mut self, title: &str, body: &str) {
        self.0.lock().on_desktop_notify(title, body);
    }

    fn on_clipboard_control(&mut self, slot: ClipboardSlot, data: Option<&[u8]>) {
        self.0.lock().on_clipboard_control(slot, data);
    }

    fn on_set_color_table_color(&mut self, index: u8, rgb: (u8, u8, u8)) {
        self.0.lock().on_set_color_table_color(index, rgb);
    }

    fn on_file_transmission(&mut self, name: &str, data: &[u8]) {
        self.0.lock().on_file_transmission(name, data);
    }

    fn on_open_url(&mut self, url: &str) {
        self.0.lock().on_open_url(url);
    }

    fn request_capabilities(&mut self, query: &str) -> Option<String> {
        self.0.lock().request_capabilities(query)
    }

    fn on_cmd_output_marking(&mut self, kind: PromptKind) {
        self.0.lock().on_cmd_output_marking(kind);
    }

    fn on_color_profile_popped(&mut self) {
        self.0.lock().on_color_profile_popped();
    }

    fn on_handle_kitty_dcs(&mut self, payload: &[u8]) -> Option<Vec<u8>> {
        self.0.lock().on_handle_kitty_dcs(payload)
    }

    fn is_ok_to_read_image_file(&mut self, path: &str) -> bool {
        self.0.lock().is_ok_to_read_image_file(path)
    }

    fn safe_delete_temp_file(&mut self, path: &str) {
        self.0.lock().safe_delete_temp_file(path);
    }

    fn write_to_child(&mut self, bytes: &[u8]) {
        self.0.lock().write_to_child(bytes);
    }

    fn write_escape_code_to_child(&mut self, escape: &[u8]) {
        self.0.lock().write_escape_code_to_child(escape);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bell_increments_count() {
        let mut host = CapturingHost::new();
        host.on_bell();
        host.on_bell();
        assert_eq!(host.bell_count(), 2);
    }

    #[test]
    fn notifications_queue_and_drain() {
        let mut host = CapturingHost::new();
        host.on_desktop_notify("build", "done");
        assert!(host.has_notifications());
        let taken = host.take_notifications();
        assert_eq!(taken.len(), 1);
        assert_eq!(taken[0].title, "build");
        assert!(!host.has_notifications());
    }

    #[test]
    fn output_callback_forwards_writes() {
        let mut host = CapturingHost::new();
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        host.set_output_callback(move |bytes| seen2.lock().push(bytes.to_vec()));
        host.write_to_child(b"hello");
        assert_eq!(seen.lock().as_slice(), &[b"hello".to_vec()]);
    }

    #[test]
    fn file_reads_denied_by_default() {
        let mut host = CapturingHost::new();
        assert!(!host.is_ok_to_read_image_file("/tmp/foo.png"));
    }
}
