//! `Screen`: owns the main/alt line buffers, scrollback, cursor, modes,
//! margins, tab stops, selections, overlay line, and graphics manager, and
//! exposes the VT operation surface a parser drives (spec §3 "Screen",
//! §4.2 "Cursor and Screen state machine").

pub mod draw;
pub mod edit;
pub mod resize;
pub mod scroll;
pub mod url;

use crate::cell::Cell;
use crate::cursor::{Cursor, CursorSaveStack};
use crate::graphics::GraphicsManager;
use crate::history::HistoryBuffer;
use crate::host::{DynamicColorSlot, ScreenHost};
use crate::line::PromptKind;
use crate::linebuffer::LineBuffer;
use crate::modes::{AnsiMode, DecPrivateMode, MouseEncoding, MouseMode, ScreenModes};
use crate::overlay::OverlayState;
use crate::pause::PauseState;
use crate::selection::SelectionsSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Main,
    Alt,
}

/// The slice of state DECSC/DECRC (and the alt-screen toggle's "save
/// cursor") preserve: cursor position/attrs plus the three modes that
/// travel with it (spec §3 "A savepoint captures cursor + mDECOM +
/// mDECAWM + mDECSCNM").
#[derive(Debug, Clone, Copy)]
pub struct SavePoint {
    pub cursor: Cursor,
    pub origin_mode: bool,
    pub autowrap: bool,
    pub reverse_video: bool,
}

/// DECSACE target for [`edit::Screen::select_graphic_rendition`]'s region
/// form: a rectangular area vs. a simple linear cursor..end-of-selection
/// run (spec §4.2 "SGR").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SgrRegionMode {
    #[default]
    Linear,
    Rectangular,
}

/// A half-open row region, 1-based-inclusive on input, stored 0-based.
#[derive(Debug, Clone, Copy)]
pub struct Region {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

pub struct Screen {
    main_linebuf: LineBuffer,
    alt_linebuf: LineBuffer,
    active: BufferKind,
    historybuf: HistoryBuffer,
    cursor: Cursor,
    main_save: Option<SavePoint>,
    alt_save: Option<SavePoint>,
    /// General-purpose DECSC/DECRC stack, independent of the alt-screen
    /// toggle's single savepoint.
    decsc_stack: CursorSaveStack,
    modes: ScreenModes,
    margin_top: usize,
    margin_bottom: usize,
    tabstops_main: Vec<bool>,
    tabstops_alt: Vec<bool>,
    /// Kitty keyboard-protocol flag stacks; the screen only threads these
    /// through the alt-screen swap, the encoding itself is the parser's
    /// concern (spec §3 "Two key-encoding-flags stacks").
    key_encoding_stack_main: Vec<u8>,
    key_encoding_stack_alt: Vec<u8>,
    mouse_shape_stack_main: Vec<String>,
    mouse_shape_stack_alt: Vec<String>,
    pub selections: SelectionsSet,
    pub url_ranges: SelectionsSet,
    pub overlay: OverlayState,
    pause: PauseState,
    pub graphics: GraphicsManager,
    last_graphic_char: Option<char>,
    host: Box<dyn ScreenHost>,
    rows: usize,
    columns: usize,
    last_visited_prompt: Option<usize>,
    redraws_prompts_at_all: bool,
    sgr_region_mode: SgrRegionMode,
    dirty_rows: Vec<bool>,
    /// Scrollback viewport offset: 0 is the live bottom, increasing values
    /// look further into the past (spec §4.3 `history_scroll`).
    scrolled_by: usize,
    /// Position of the last non-combining char written by `draw_text`,
    /// used to attach combining marks / flag-pair coalescing that follow
    /// it in the same print run (spec §4.2 "draw_text").
    last_write: Option<(usize, usize)>,
}

impl Screen {
    pub fn new(rows: usize, columns: usize, scrollback_lines: usize, host: Box<dyn ScreenHost>) -> Self {
        Self {
            main_linebuf: LineBuffer::new(rows, columns),
            alt_linebuf: LineBuffer::new(rows, columns),
            active: BufferKind::Main,
            historybuf: HistoryBuffer::new(scrollback_lines),
            cursor: Cursor::new(),
            main_save: None,
            alt_save: None,
            decsc_stack: CursorSaveStack::default(),
            modes: ScreenModes::default(),
            margin_top: 0,
            margin_bottom: rows.saturating_sub(1),
            tabstops_main: default_tabstops(columns),
            tabstops_alt: default_tabstops(columns),
            key_encoding_stack_main: Vec::new(),
            key_encoding_stack_alt: Vec::new(),
            mouse_shape_stack_main: Vec::new(),
            mouse_shape_stack_alt: Vec::new(),
            selections: SelectionsSet::default(),
            url_ranges: SelectionsSet::default(),
            overlay: OverlayState::default(),
            pause: PauseState::default(),
            graphics: GraphicsManager::new(),
            last_graphic_char: None,
            host,
            rows,
            columns,
            last_visited_prompt: None,
            redraws_prompts_at_all: false,
            sgr_region_mode: SgrRegionMode::Linear,
            dirty_rows: vec![false; rows],
            scrolled_by: 0,
            last_write: None,
        }
    }

    // ---- accessors -------------------------------------------------

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub(crate) fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    pub fn modes(&self) -> &ScreenModes {
        &self.modes
    }

    pub fn margins(&self) -> (usize, usize) {
        (self.margin_top, self.margin_bottom)
    }

    pub fn is_alt_screen(&self) -> bool {
        self.active == BufferKind::Alt
    }

    pub fn history(&self) -> &HistoryBuffer {
        &self.historybuf
    }

    /// Read-only view of a row of the active buffer, for render pulls
    /// (spec §2 "on next render pull"). Panics on out-of-range `y` same as
    /// the underlying `LineBuffer`.
    pub fn visible_line(&self, y: usize) -> &crate::line::Line {
        self.linebuf().line(y)
    }

    pub fn host_mut(&mut self) -> &mut dyn ScreenHost {
        self.host.as_mut()
    }

    pub(crate) fn linebuf(&self) -> &LineBuffer {
        match self.active {
            BufferKind::Main => &self.main_linebuf,
            BufferKind::Alt => &self.alt_linebuf,
        }
    }

    pub(crate) fn linebuf_mut(&mut self) -> &mut LineBuffer {
        match self.active {
            BufferKind::Main => &mut self.main_linebuf,
            BufferKind::Alt => &mut self.alt_linebuf,
        }
    }

    fn tabstops(&self) -> &[bool] {
        match self.active {
            BufferKind::Main => &self.tabstops_main,
            BufferKind::Alt => &self.tabstops_alt,
        }
    }

    fn tabstops_mut(&mut self) -> &mut Vec<bool> {
        match self.active {
            BufferKind::Main => &mut self.tabstops_main,
            BufferKind::Alt => &mut self.tabstops_alt,
        }
    }

    pub(crate) fn tab_stop_at(&self, x: usize) -> bool {
        self.tabstops().get(x).copied().unwrap_or(false)
    }

    fn mark_row_dirty(&mut self, y: usize) {
        if y < self.rows {
            self.dirty_rows[y] = true;
        }
        self.linebuf_mut().line_mut(y).mark_dirty();
    }

    pub fn take_dirty_rows(&mut self) -> Vec<usize> {
        let rows: Vec<usize> = self
            .dirty_rows
            .iter()
            .enumerate()
            .filter_map(|(y, &d)| d.then_some(y))
            .collect();
        self.dirty_rows.iter_mut().for_each(|d| *d = false);
        rows
    }

    /// Top/bottom bounds the cursor clamps to, honoring DECOM (spec §4.2
    /// "The cursor is always clamped... when origin-mode is set, y is
    /// clamped to [margin_top, margin_bottom]").
    fn y_bounds(&self) -> (usize, usize) {
        if self.modes.origin_mode {
            (self.margin_top, self.margin_bottom)
        } else {
            (0, self.rows.saturating_sub(1))
        }
    }

    fn clamp_cursor(&mut self) {
        let (lo, hi) = self.y_bounds();
        self.cursor.x = self.cursor.x.min(self.columns.saturating_sub(1));
        self.cursor.y = self.cursor.y.clamp(lo, hi);
    }

    // ---- cursor motion (spec §4.2 "Cursor motion") ------------------

    pub fn cursor_up(&mut self, n: usize, carriage_return: bool) {
        let top = if self.modes.origin_mode { self.margin_top } else { 0 };
        self.cursor.y = self.cursor.y.saturating_sub(n).max(top);
        if carriage_return {
            self.cursor.x = 0;
        }
        self.cursor.reset_pending_wrap();
    }

    pub fn cursor_down(&mut self, n: usize) {
        let bottom = if self.modes.origin_mode { self.margin_bottom } else { self.rows - 1 };
        self.cursor.y = (self.cursor.y + n).min(bottom);
        self.cursor.reset_pending_wrap();
    }

    pub fn cursor_back(&mut self, n: usize) {
        self.cursor.x = self.cursor.x.saturating_sub(n);
        self.cursor.reset_pending_wrap();
    }

    pub fn cursor_forward(&mut self, n: usize) {
        self.cursor.x = (self.cursor.x + n).min(self.columns.saturating_sub(1));
        self.cursor.reset_pending_wrap();
    }

    /// DECSTBM-relative 1-based cursor positioning (spec §4.2
    /// `cursor_position`).
    pub fn cursor_position(&mut self, row: usize, col: usize) {
        let row_offset = if self.modes.origin_mode { self.margin_top } else { 0 };
        self.cursor.y = row.saturating_sub(1) + row_offset;
        self.cursor.x = col.saturating_sub(1);
        self.clamp_cursor();
        self.cursor.reset_pending_wrap();
    }

    pub fn cursor_to_line(&mut self, n: usize) {
        self.cursor_position(n, 1);
    }

    pub fn carriage_return(&mut self) {
        self.cursor.x = 0;
        self.cursor.reset_pending_wrap();
    }

    pub fn backspace(&mut self) {
        if self.cursor.x > 0 {
            self.cursor.x -= 1;
        }
        self.cursor.reset_pending_wrap();
    }

    pub fn bell(&mut self) {
        self.host.on_bell();
    }

    // ---- tab stops ---------------------------------------------------

    pub fn set_tab_stop(&mut self) {
        let x = self.cursor.x;
        if let Some(slot) = self.tabstops_mut().get_mut(x) {
            *slot = true;
        }
    }

    /// `mode`: 0 clears the stop at the cursor, 3 clears all (DECTABSR /
    /// CSI 3 g / CSI g semantics, spec §4.2 `clear_tab_stop`).
    pub fn clear_tab_stop(&mut self, mode: u16) {
        match mode {
            3 => {
                let stops = self.tabstops_mut();
                stops.iter_mut().for_each(|s| *s = false);
            }
            _ => {
                let x = self.cursor.x;
                if let Some(slot) = self.tabstops_mut().get_mut(x) {
                    *slot = false;
                }
            }
        }
    }

    pub fn backtab(&mut self, n: usize) {
        for _ in 0..n {
            if self.cursor.x == 0 {
                break;
            }
            let mut x = self.cursor.x - 1;
            while x > 0 && !self.tabstops()[x] {
                x -= 1;
            }
            self.cursor.x = x;
        }
    }

    // ---- margins -------------------------------------------------------

    /// DECSTBM, 1-based inclusive. A no-op when `top == bottom` per spec
    /// §9 open question (kept from source behavior, including under
    /// DECOM).
    pub fn set_margins(&mut self, top: usize, bottom: usize) {
        let top = top.saturating_sub(1);
        let bottom = bottom.saturating_sub(1).min(self.rows.saturating_sub(1));
        if top >= bottom {
            return;
        }
        self.margin_top = top;
        self.margin_bottom = bottom;
        self.cursor_position(1, 1);
    }

    // ---- modes (spec §4.2 "Modes") --------------------------------------

    pub fn set_mode(&mut self, number: u16, private: bool) {
        self.apply_mode(number, private, true);
    }

    pub fn reset_mode(&mut self, number: u16, private: bool) {
        self.apply_mode(number, private, false);
    }

    fn apply_mode(&mut self, number: u16, private: bool, enable: bool) {
        if private {
            let Some(mode) = DecPrivateMode::from_number(number) else { return };
            match mode {
                DecPrivateMode::Decolm => {
                    // DECCOLM: erase + home when set (spec §4.2 "Modes"
                    // "mDECCOLM: erase+home when set").
                    self.erase_in_display(2);
                    self.cursor_position(1, 1);
                }
                DecPrivateMode::ReverseVideo => {
                    self.modes.reverse_video = enable;
                    self.mark_all_dirty();
                }
                DecPrivateMode::PendingRender => {
                    if enable {
                        self.pause_rendering(0, None);
                    } else {
                        self.unpause_rendering();
                    }
                }
                DecPrivateMode::ApplicationCursorKeys => self.modes.application_cursor_keys = enable,
                DecPrivateMode::OriginMode => {
                    self.modes.origin_mode = enable;
                    self.cursor_position(1, 1);
                }
                DecPrivateMode::Autowrap => self.modes.autowrap = enable,
                DecPrivateMode::MouseX10 => {
                    self.modes.mouse_mode = if enable { MouseMode::X10 } else { MouseMode::Off };
                }
                DecPrivateMode::CursorVisible => self.modes.cursor_visible = enable,
                DecPrivateMode::AltScreen47 => self.toggle_alt_screen(enable, false, false),
                DecPrivateMode::MouseNormal => {
                    self.modes.mouse_mode = if enable { MouseMode::Normal } else { MouseMode::Off };
                }
                DecPrivateMode::MouseButtonEvent => {
                    self.modes.mouse_mode = if enable { MouseMode::ButtonEvent } else { MouseMode::Off };
                }
                DecPrivateMode::MouseAnyEvent => {
                    self.modes.mouse_mode = if enable { MouseMode::AnyEvent } else { MouseMode::Off };
                }
                DecPrivateMode::MouseUtf8 => {
                    self.modes.mouse_encoding = if enable { MouseEncoding::Utf8 } else { MouseEncoding::X10 };
                }
                DecPrivateMode::MouseSgr => {
                    self.modes.mouse_encoding = if enable { MouseEncoding::Sgr } else { MouseEncoding::X10 };
                }
                DecPrivateMode::MouseUrxvt => {
                    self.modes.mouse_encoding = if enable { MouseEncoding::Urxvt } else { MouseEncoding::X10 };
                }
                DecPrivateMode::FocusEvents => self.modes.focus_events = enable,
                DecPrivateMode::AltScreen1047 => self.toggle_alt_screen(enable, false, true),
                DecPrivateMode::SaveRestoreCursor1048 => {
                    if enable {
                        self.save_cursor();
                    } else {
                        self.restore_cursor();
                    }
                }
                DecPrivateMode::AltScreen1049 => self.toggle_alt_screen(enable, true, true),
                DecPrivateMode::BracketedPaste => self.modes.bracketed_paste = enable,
            }
        } else {
            let Some(mode) = AnsiMode::from_number(number) else { return };
            match mode {
                AnsiMode::InsertReplace => self.modes.insert_mode = enable,
                AnsiMode::NewlineMode => self.modes.newline_mode = enable,
            }
        }
    }

    fn mark_all_dirty(&mut self) {
        for y in 0..self.rows {
            self.mark_row_dirty(y);
        }
    }

    /// A small save/restore mode stack (`CSI ? Pm s` / `CSI ? Pm r`),
    /// distinct from DECSC/DECRC: it snapshots only the boolean state of
    /// one private mode number.
    pub fn save_mode(&mut self, number: u16) -> bool {
        DecPrivateMode::from_number(number)
            .map(|m| self.dec_mode_enabled(m))
            .unwrap_or(false)
    }

    pub fn restore_mode(&mut self, number: u16, was_enabled: bool) {
        self.apply_mode(number, true, was_enabled);
    }

    fn dec_mode_enabled(&self, mode: DecPrivateMode) -> bool {
        match mode {
            DecPrivateMode::ApplicationCursorKeys => self.modes.application_cursor_keys,
            DecPrivateMode::OriginMode => self.modes.origin_mode,
            DecPrivateMode::Autowrap => self.modes.autowrap,
            DecPrivateMode::MouseX10 => self.modes.mouse_mode == MouseMode::X10,
            DecPrivateMode::CursorVisible => self.modes.cursor_visible,
            DecPrivateMode::AltScreen47 | DecPrivateMode::AltScreen1047 | DecPrivateMode::AltScreen1049 => {
                self.modes.alt_screen
            }
            DecPrivateMode::MouseNormal => self.modes.mouse_mode == MouseMode::Normal,
            DecPrivateMode::MouseButtonEvent => self.modes.mouse_mode == MouseMode::ButtonEvent,
            DecPrivateMode::MouseAnyEvent => self.modes.mouse_mode == MouseMode::AnyEvent,
            DecPrivateMode::MouseUtf8 => self.modes.mouse_encoding == MouseEncoding::Utf8,
            DecPrivateMode::MouseSgr => self.modes.mouse_encoding == MouseEncoding::Sgr,
            DecPrivateMode::MouseUrxvt => self.modes.mouse_encoding == MouseEncoding::Urxvt,
            DecPrivateMode::FocusEvents => self.modes.focus_events,
            DecPrivateMode::SaveRestoreCursor1048 => false,
            DecPrivateMode::BracketedPaste => self.modes.bracketed_paste,
            DecPrivateMode::Decolm => false,
            DecPrivateMode::ReverseVideo => self.modes.reverse_video,
            DecPrivateMode::PendingRender => self.is_paused(),
        }
    }

    // ---- save/restore cursor (DECSC/DECRC) ------------------------------

    pub fn save_cursor(&mut self) {
        self.decsc_stack.push(self.cursor);
    }

    pub fn restore_cursor(&mut self) {
        if let Some(saved) = self.decsc_stack.pop().or_else(|| self.decsc_stack.last().copied()) {
            self.cursor = saved;
            self.clamp_cursor();
        }
    }

    // ---- buffer toggle (spec §4.2 "Buffer toggle") ----------------------

    /// `save_cursor`: whether to snapshot/restore the cursor across the
    /// swap. `clear`: whether entering the alt screen clears it first
    /// (mode 1049 semantics vs. bare 47/1047).
    pub fn toggle_alt_screen(&mut self, enter: bool, save_cursor: bool, clear: bool) {
        if enter == self.modes.alt_screen {
            return;
        }
        if enter {
            if clear {
                self.alt_linebuf.clear_all();
                self.graphics = GraphicsManager::new();
            }
            if save_cursor {
                self.main_save = Some(SavePoint {
                    cursor: self.cursor,
                    origin_mode: self.modes.origin_mode,
                    autowrap: self.modes.autowrap,
                    reverse_video: self.modes.reverse_video,
                });
            }
            self.active = BufferKind::Alt;
            self.cursor = Cursor::new();
        } else {
            if let Some(save) = self.main_save.take() {
                if save_cursor {
                    self.cursor = save.cursor;
                    self.modes.origin_mode = save.origin_mode;
                    self.modes.autowrap = save.autowrap;
                    self.modes.reverse_video = save.reverse_video;
                }
            }
            self.active = BufferKind::Main;
        }
        self.modes.alt_screen = enter;
        std::mem::swap(&mut self.key_encoding_stack_main, &mut self.key_encoding_stack_alt);
        std::mem::swap(&mut self.mouse_shape_stack_main, &mut self.mouse_shape_stack_alt);
        self.selections.clear();
        self.clamp_cursor();
        self.mark_all_dirty();
    }

    // ---- prompt marking (spec §4.2 "Prompt marking") --------------------

    /// OSC 133 kitty-style shell prompt marker. `secondary` corresponds to
    /// the `k=s` option on an `A` marker.
    pub fn shell_prompt_marking(&mut self, kind: PromptKind) {
        self.redraws_prompts_at_all = true;
        let y = self.cursor.y;
        self.linebuf_mut().line_mut(y).attrs.prompt_kind = kind;
        self.mark_row_dirty(y);
        if matches!(kind, PromptKind::PromptStart | PromptKind::SecondaryPrompt) {
            self.last_visited_prompt = Some(y);
        }
        self.host.on_cmd_output_marking(kind);
    }

    // ---- hyperlinks ------------------------------------------------------

    pub fn set_active_hyperlink(&mut self, id: Option<u16>) {
        self.cursor.active_hyperlink_id = id.unwrap_or(0);
    }

    pub fn remap_hyperlink_ids(&mut self, map: &std::collections::HashMap<u16, u16>) {
        for buf in [&mut self.main_linebuf, &mut self.alt_linebuf] {
            for y in 0..buf.rows() {
                let line = buf.line_mut(y);
                for cell in line.cells_mut() {
                    if cell.hyperlink_id != 0 {
                        if let Some(&new_id) = map.get(&cell.hyperlink_id) {
                            cell.hyperlink_id = new_id;
                        }
                    }
                }
            }
        }
    }

    // ---- dynamic colors / OSC passthrough --------------------------------

    pub fn set_dynamic_color(&mut self, slot: DynamicColorSlot, rgb: Option<(u8, u8, u8)>) {
        self.host.on_dynamic_color(slot, rgb);
    }

    // ---- pause rendering (spec §4.7) -------------------------------------

    pub fn pause_rendering(&mut self, now_ms: u64, duration_ms: Option<u64>) -> bool {
        let lines: Vec<_> = self.linebuf().iter().cloned().collect();
        self.pause.pause(
            now_ms,
            duration_ms,
            lines,
            self.cursor,
            self.selections.clone(),
            0,
            self.modes.reverse_video,
        )
    }

    pub fn unpause_rendering(&mut self) {
        self.pause.unpause();
    }

    pub fn check_pause_rendering(&mut self, now_ms: u64) -> bool {
        self.pause.check_expiry(now_ms)
    }

    pub fn is_paused(&self) -> bool {
        self.pause.is_paused()
    }

    pub fn paused_snapshot(&self) -> Option<&crate::pause::PausedSnapshot> {
        self.pause.snapshot()
    }

    // ---- status reports (spec §6 "Responses out") ------------------------
    //
    // These format the reply and hand it to the host's `write_escape_code_to_child`
    // rather than returning it, matching how every other "responds to the
    // child" operation in this file is wired (`set_dynamic_color`, OSC
    // passthrough). Exact wire strings follow common xterm/VT220 convention;
    // the parser is free to translate differently since spec §6 calls these
    // names "illustrative".

    /// `CSI c` / `CSI > c` (DA1): identify as a VT220-class terminal with
    /// sixel and the private-mode extensions this engine understands.
    pub fn report_device_attributes(&mut self) {
        self.host.write_escape_code_to_child(b"\x1b[?62;4;22c");
    }

    /// `CSI 5 n` (DSR): "terminal OK".
    pub fn report_device_status(&mut self) {
        self.host.write_escape_code_to_child(b"\x1b[0n");
    }

    /// `CSI 6 n` (DSR, cursor position report). Reported row/col are
    /// 1-based and margin-relative under DECOM, matching `cursor_position`'s
    /// own addressing (spec §4.2 "cursor_position... with mDECOM, row offset
    /// by margin_top").
    pub fn report_cursor_position(&mut self) {
        let row = if self.modes.origin_mode {
            self.cursor.y.saturating_sub(self.margin_top)
        } else {
            self.cursor.y
        };
        let reply = format!("\x1b[{};{}R", row + 1, self.cursor.x + 1);
        self.host.write_escape_code_to_child(reply.as_bytes());
    }

    /// `CSI Pm $ p` (DECRQM): reports whether the parser has learned this
    /// engine's state for a given mode number. Reply code: 0 not
    /// recognized, 1 set, 2 reset (permanently-set/-reset, 3/4, are never
    /// produced here since every mode this engine tracks is user-toggleable).
    pub fn report_mode(&mut self, number: u16, private: bool) {
        let code = if private {
            match DecPrivateMode::from_number(number) {
                Some(mode) => {
                    if self.dec_mode_enabled(mode) {
                        1
                    } else {
                        2
                    }
                }
                None => 0,
            }
        } else {
            match AnsiMode::from_number(number) {
                Some(AnsiMode::InsertReplace) => {
                    if self.modes.insert_mode {
                        1
                    } else {
                        2
                    }
                }
                Some(AnsiMode::NewlineMode) => {
                    if self.modes.newline_mode {
                        1
                    } else {
                        2
                    }
                }
                None => 0,
            }
        };
        let reply = if private {
            format!("\x1b[?{};{}$y", number, code)
        } else {
            format!("\x1b[{};{}$y", number, code)
        };
        self.host.write_escape_code_to_child(reply.as_bytes());
    }

    /// `CSI 18 t`: report the text-area size in character cells.
    pub fn report_size(&mut self) {
        let reply = format!("\x1b[8;{};{}t", self.rows, self.columns);
        self.host.write_escape_code_to_child(reply.as_bytes());
    }

    /// `DCS > | ... ST` (XTVERSION).
    pub fn xtversion(&mut self, name: &str) {
        let reply = format!("\x1bP>|{}\x1b\\", name);
        self.host.write_escape_code_to_child(reply.as_bytes());
    }

    // ---- misc state used by draw/edit/scroll/resize submodules ----------

    pub(crate) fn last_graphic_char(&self) -> Option<char> {
        self.last_graphic_char
    }

    pub(crate) fn set_last_graphic_char(&mut self, ch: char) {
        self.last_graphic_char = Some(ch);
    }

    pub(crate) fn sgr_region_mode(&self) -> SgrRegionMode {
        self.sgr_region_mode
    }

    pub fn decsace(&mut self, rectangular: bool) {
        self.sgr_region_mode = if rectangular {
            SgrRegionMode::Rectangular
        } else {
            SgrRegionMode::Linear
        };
    }

    pub(crate) fn last_visited_prompt(&self) -> Option<usize> {
        self.last_visited_prompt
    }

    pub(crate) fn set_last_visited_prompt(&mut self, row: Option<usize>) {
        self.last_visited_prompt = row;
    }

    pub(crate) fn redraws_prompts_at_all(&self) -> bool {
        self.redraws_prompts_at_all
    }

    pub(crate) fn is_main(&self) -> bool {
        self.active == BufferKind::Main
    }

    pub(crate) fn historybuf_mut(&mut self) -> &mut HistoryBuffer {
        &mut self.historybuf
    }

    pub(crate) fn scrolled_by(&self) -> usize {
        self.scrolled_by
    }

    pub(crate) fn set_scrolled_by(&mut self, value: usize) {
        self.scrolled_by = value;
    }

    pub(crate) fn last_write(&self) -> Option<(usize, usize)> {
        self.last_write
    }

    pub(crate) fn set_last_write(&mut self, pos: Option<(usize, usize)>) {
        self.last_write = pos;
    }

    /// A blank cell carrying the cursor's current SGR colors, used by the
    /// erase family (spec §4.2 "erasing uses the cursor's current
    /// background").
    pub(crate) fn blank_cell(&self) -> Cell {
        Cell::blank_with(self.cursor.graphics.fg, self.cursor.graphics.bg)
    }

    pub(crate) fn clear_row(&mut self, y: usize) {
        let blank = self.blank_cell();
        let line = self.linebuf_mut().line_mut(y);
        for cell in line.cells_mut() {
            *cell = blank.clone();
        }
        line.attrs.prompt_kind = PromptKind::None;
        line.set_next_char_was_wrapped(false);
        self.mark_row_dirty(y);
    }

    pub(crate) fn mark_region_dirty(&mut self, top: usize, bottom: usize) {
        let bottom = bottom.min(self.rows.saturating_sub(1));
        for y in top..=bottom {
            self.mark_row_dirty(y);
        }
    }

    // ---- used by the resize submodule -----------------------------------

    pub(crate) fn main_linebuf_mut(&mut self) -> &mut LineBuffer {
        &mut self.main_linebuf
    }

    pub(crate) fn alt_linebuf_mut(&mut self) -> &mut LineBuffer {
        &mut self.alt_linebuf
    }

    /// Snapshot of every row currently in `buf` (oldest-visible first),
    /// used to build the merged rewrap source (spec §4.1 `rewrap`).
    pub(crate) fn buffer_lines(buf: &LineBuffer) -> Vec<crate::line::Line> {
        buf.iter().cloned().collect()
    }

    pub(crate) fn history_lines(&self) -> Vec<crate::line::Line> {
        self.historybuf.iter().cloned().collect()
    }

    pub(crate) fn set_geometry(&mut self, rows: usize, columns: usize) {
        self.rows = rows;
        self.columns = columns;
        self.dirty_rows = vec![true; rows];
    }

    pub(crate) fn reset_margins(&mut self) {
        self.margin_top = 0;
        self.margin_bottom = self.rows.saturating_sub(1);
    }

    pub(crate) fn reset_tabstops(&mut self) {
        self.tabstops_main = default_tabstops(self.columns);
        self.tabstops_alt = default_tabstops(self.columns);
    }

    pub(crate) fn clear_selections(&mut self) {
        self.selections.clear();
        self.url_ranges.clear();
    }

    pub(crate) fn set_cursor_pos_raw(&mut self, x: usize, y: usize) {
        self.cursor.x = x;
        self.cursor.y = y;
    }
}

fn default_tabstops(columns: usize) -> Vec<bool> {
    (0..columns).map(|x| x > 0 && x % 8 == 0).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NullHost;

    fn screen(rows: usize, cols: usize) -> Screen {
        Screen::new(rows, cols, 1000, Box::new(NullHost))
    }

    #[test]
    fn cursor_position_is_one_based_and_clamped() {
        let mut s = screen(24, 80);
        s.cursor_position(100, 200);
        assert_eq!((s.cursor().y, s.cursor().x), (23, 79));
    }

    #[test]
    fn origin_mode_clamps_cursor_to_margins() {
        let mut s = screen(24, 80);
        s.set_margins(5, 10);
        s.set_mode(6, true); // DECOM
        s.cursor_position(1, 1);
        assert_eq!(s.cursor().y, 4);
    }

    #[test]
    fn set_margins_with_top_eq_bottom_is_rejected() {
        let mut s = screen(24, 80);
        s.set_margins(5, 5);
        assert_eq!(s.margins(), (0, 23));
    }

    #[test]
    fn toggle_alt_screen_round_trips_cursor_with_save() {
        let mut s = screen(24, 80);
        s.cursor_position(10, 20);
        s.toggle_alt_screen(true, true, true);
        assert!(s.is_alt_screen());
        s.toggle_alt_screen(false, true, true);
        assert!(!s.is_alt_screen());
        assert_eq!((s.cursor().y, s.cursor().x), (9, 19));
    }

    #[derive(Default)]
    struct RecordingHost {
        writes: std::rc::Rc<std::cell::RefCell<Vec<Vec<u8>>>>,
    }

    impl ScreenHost for RecordingHost {
        fn write_escape_code_to_child(&mut self, escape: &[u8]) {
            self.writes.borrow_mut().push(escape.to_vec());
        }
    }

    fn last_reply(writes: &std::rc::Rc<std::cell::RefCell<Vec<Vec<u8>>>>) -> String {
        String::from_utf8(writes.borrow().last().unwrap().clone()).unwrap()
    }

    #[test]
    fn cursor_position_report_is_one_based_and_margin_relative_under_decom() {
        let writes = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let host = RecordingHost { writes: writes.clone() };
        let mut s = Screen::new(24, 80, 100, Box::new(host));
        s.set_margins(5, 20);
        s.set_mode(6, true); // DECOM
        s.cursor_position(3, 4);
        s.report_cursor_position();
        assert_eq!(last_reply(&writes), "\x1b[3;4R");
    }

    #[test]
    fn report_mode_reports_set_and_reset() {
        let writes = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let host = RecordingHost { writes: writes.clone() };
        let mut s = Screen::new(24, 80, 100, Box::new(host));
        s.report_mode(7, true); // DECAWM, on by default
        assert_eq!(last_reply(&writes), "\x1b[?7;1$y");
        s.set_mode(7, false);
        s.report_mode(7, true);
        assert_eq!(last_reply(&writes), "\x1b[?7;2$y");
        s.report_mode(9999, true);
        assert_eq!(last_reply(&writes), "\x1b[?9999;0$y");
    }

    #[test]
    fn report_size_reports_rows_and_columns() {
        let writes = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let host = RecordingHost { writes: writes.clone() };
        let mut s = Screen::new(24, 80, 100, Box::new(host));
        s.report_size();
        assert_eq!(last_reply(&writes), "\x1b[8;24;80t");
    }

    #[test]
    fn xtversion_wraps_name_in_a_dcs_envelope() {
        let writes = std::rc::Rc::new(std::cell::RefCell::new(Vec::new()));
        let host = RecordingHost { writes: writes.clone() };
        let mut s = Screen::new(24, 80, 100, Box::new(host));
        s.xtversion("par-term-screen(0.1.0)");
        assert_eq!(last_reply(&writes), "\x1bP>|par-term-screen(0.1.0)\x1b\\");
    }
}
