//! Terminal mode flags: ANSI modes (`CSI h`/`CSI l`) and DEC private modes
//! (`CSI ? h`/`CSI ? l`), plus the mouse-reporting sub-state they gate
//! (spec §4.2 "set_mode"/"reset_mode").

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseMode {
    #[default]
    Off,
    /// DEC private mode 9: press only.
    X10,
    /// Mode 1000: press and release.
    Normal,
    /// Mode 1002: normal plus motion while a button is held.
    ButtonEvent,
    /// Mode 1003: report all motion, button held or not.
    AnyEvent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseEncoding {
    #[default]
    X10,
    /// Mode 1005 (UTF-8 coordinates).
    Utf8,
    /// Mode 1006 (SGR coordinates) — the one every modern client should use.
    Sgr,
    /// Mode 1015 (urxvt).
    Urxvt,
}

/// Boolean terminal modes. DEC private modes and ANSI modes share a
/// namespace of small integers in the wire protocol but are semantically
/// distinct, so each gets its own field rather than a shared bit-indexed
/// table (matching how real VT state machines expose them to callers).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenModes {
    /// DECOM: cursor addressing relative to the scroll region.
    pub origin_mode: bool,
    /// DECAWM: autowrap at the right margin.
    pub autowrap: bool,
    /// IRM: insert vs. replace mode for `draw_text`.
    pub insert_mode: bool,
    /// LNM: linefeed also does carriage-return.
    pub newline_mode: bool,
    /// DECTCEM: cursor visibility.
    pub cursor_visible: bool,
    /// DECCOLM-adjacent "reverse video" whole-screen flag (mode 5).
    pub reverse_video: bool,
    /// Alternate screen buffer active (mode 1049/47/1047).
    pub alt_screen: bool,
    /// Bracketed paste (mode 2004).
    pub bracketed_paste: bool,
    /// Application cursor keys (mode 1/DECCKM) — no effect on the grid, but
    /// the host needs to read it back to encode arrow keys, so it rides
    /// along on the screen's mode set (spec §9 "host" redesign).
    pub application_cursor_keys: bool,
    pub mouse_mode: MouseMode,
    pub mouse_encoding: MouseEncoding,
    pub focus_events: bool,
}

impl Default for ScreenModes {
    fn default() -> Self {
        Self {
            origin_mode: false,
            autowrap: true,
            insert_mode: false,
            newline_mode: false,
            cursor_visible: true,
            reverse_video: false,
            alt_screen: false,
            bracketed_paste: false,
            application_cursor_keys: false,
            mouse_mode: MouseMode::Off,
            mouse_encoding: MouseEncoding::X10,
            focus_events: false,
        }
    }
}

/// DEC private mode numbers this engine understands, named for readability
/// at call sites (spec §4.2's `set_mode(number, private)` takes raw u16s;
/// `Screen` maps through this enum internally).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecPrivateMode {
    Decolm,                // 3
    ReverseVideo,          // 5
    ApplicationCursorKeys, // 1
    OriginMode,            // 6
    Autowrap,              // 7
    MouseX10,              // 9
    CursorVisible,         // 25
    AltScreen47,           // 47
    MouseNormal,           // 1000
    MouseButtonEvent,      // 1002
    MouseAnyEvent,         // 1003
    MouseUtf8,             // 1005
    MouseSgr,              // 1006
    FocusEvents,           // 1004
    AltScreen1047,         // 1047
    SaveRestoreCursor1048, // 1048
    AltScreen1049,         // 1049
    BracketedPaste,        // 2004
    MouseUrxvt,            // 1015
    /// Paused rendering / "pending mode" (spec §4.7).
    PendingRender, // 2026
}

impl DecPrivateMode {
    pub fn from_number(n: u16) -> Option<Self> {
        Some(match n {
            3 => Self::Decolm,
            5 => Self::ReverseVideo,
            1 => Self::ApplicationCursorKeys,
            6 => Self::OriginMode,
            7 => Self::Autowrap,
            9 => Self::MouseX10,
            25 => Self::CursorVisible,
            47 => Self::AltScreen47,
            1000 => Self::MouseNormal,
            1002 => Self::MouseButtonEvent,
            1003 => Self::MouseAnyEvent,
            1004 => Self::FocusEvents,
            1005 => Self::MouseUtf8,
            1006 => Self::MouseSgr,
            1015 => Self::MouseUrxvt,
            1047 => Self::AltScreen1047,
            1048 => Self::SaveRestoreCursor1048,
            1049 => Self::AltScreen1049,
            2004 => Self::BracketedPaste,
            2026 => Self::PendingRender,
            _ => return None,
        })
    }
}

/// ANSI (non-private) modes, a much shorter list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnsiMode {
    InsertReplace, // 4 (IRM)
    NewlineMode,   // 20 (LNM)
}

impl AnsiMode {
    pub fn from_number(n: u16) -> Option<Self> {
        Some(match n {
            4 => Self::InsertReplace,
            20 => Self::NewlineMode,
            _ => return None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_private_mode_numbers_are_ignored_not_erroring() {
        assert!(DecPrivateMode::from_number(65530).is_none());
    }

    #[test]
    fn defaults_match_real_terminal_power_on_state() {
        let modes = ScreenModes::default();
        assert!(modes.autowrap);
        assert!(modes.cursor_visible);
        assert!(!modes.alt_screen);
        assert_eq!(modes.mouse_mode, MouseMode::Off);
    }
}
