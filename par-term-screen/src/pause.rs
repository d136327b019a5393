//! Paused rendering ("pending mode"): DEC private mode 2026 (spec §4.7).

use crate::cursor::Cursor;
use crate::line::Line;
use crate::selection::SelectionsSet;

pub const DEFAULT_PAUSE_MS: u64 = 2000;

/// A detached copy of everything the renderer reads, frozen for the
/// duration of a pause while the live screen keeps mutating underneath it.
#[derive(Debug, Clone)]
pub struct PausedSnapshot {
    pub lines: Vec<Line>,
    pub cursor: Cursor,
    pub selections: SelectionsSet,
    pub scrolled_by: usize,
    pub reverse_video: bool,
    pub expires_at_ms: u64,
}

#[derive(Debug, Clone, Default)]
pub struct PauseState {
    snapshot: Option<PausedSnapshot>,
}

impl PauseState {
    pub fn is_paused(&self) -> bool {
        self.snapshot.is_some()
    }

    pub fn snapshot(&self) -> Option<&PausedSnapshot> {
        self.snapshot.as_ref()
    }

    /// Begin a pause. Repeated requests while already paused are no-ops
    /// (spec §7 "repeated pause requests while already paused are no-ops
    /// reported as such") — returns `false` in that case so the caller can
    /// report it quietly rather than silently resetting the expiry.
    pub fn pause(
        &mut self,
        now_ms: u64,
        duration_ms: Option<u64>,
        lines: Vec<Line>,
        cursor: Cursor,
        selections: SelectionsSet,
        scrolled_by: usize,
        reverse_video: bool,
    ) -> bool {
        if self.snapshot.is_some() {
            return false;
        }
        let expires_at_ms = now_ms + duration_ms.unwrap_or(DEFAULT_PAUSE_MS);
        self.snapshot = Some(PausedSnapshot {
            lines,
            cursor,
            selections,
            scrolled_by,
            reverse_video,
            expires_at_ms,
        });
        true
    }

    pub fn unpause(&mut self) {
        self.snapshot = None;
    }

    /// Unpause once `now_ms` passes the snapshot's expiry (spec §4.7
    /// `check_pause_rendering`). Returns true if this call unpaused.
    pub fn check_expiry(&mut self, now_ms: u64) -> bool {
        let expired = self
            .snapshot
            .as_ref()
            .map(|s| now_ms > s.expires_at_ms)
            .unwrap_or(false);
        if expired {
            self.snapshot = None;
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_pause_while_paused_is_a_no_op() {
        let mut state = PauseState::default();
        assert!(state.pause(0, None, vec![], Cursor::new(), SelectionsSet::default(), 0, false));
        assert!(!state.pause(10, None, vec![], Cursor::new(), SelectionsSet::default(), 0, false));
    }

    #[test]
    fn expiry_unpauses_after_duration() {
        let mut state = PauseState::default();
        state.pause(0, Some(100), vec![], Cursor::new(), SelectionsSet::default(), 0, false);
        assert!(!state.check_expiry(50));
        assert!(state.is_paused());
        assert!(state.check_expiry(150));
        assert!(!state.is_paused());
    }
}
