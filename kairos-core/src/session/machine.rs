//! Session state machine definition
//!
//! All timer and UI behavior is a function of the current session state
//! and an event.

use super::events::SessionEvent;

/// Session states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// Timer not started
    Idle,
    /// Work period running
    Work,
    /// Short break running
    ShortBreak,
    /// Long break running
    LongBreak,
    /// Work period paused
    PausedWork,
    /// Break paused; remembers which break to resume into
    PausedBreak(BreakKind),
}

/// The two break lengths
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BreakKind {
    Short,
    Long,
}

impl BreakKind {
    /// The running session state for this break
    pub const fn session(self) -> SessionState {
        match self {
            BreakKind::Short => SessionState::ShortBreak,
            BreakKind::Long => SessionState::LongBreak,
        }
    }
}

impl SessionState {
    /// Check if a period is actively counting down
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            SessionState::Work | SessionState::ShortBreak | SessionState::LongBreak
        )
    }

    /// Check if this is a paused state
    pub fn is_paused(&self) -> bool {
        matches!(
            self,
            SessionState::PausedWork | SessionState::PausedBreak(_)
        )
    }

    /// Check if this is an actively running break
    pub fn is_break(&self) -> bool {
        matches!(self, SessionState::ShortBreak | SessionState::LongBreak)
    }

    /// Process an event and return the next state
    ///
    /// This is the core session transition logic.
    pub fn transition(self, event: SessionEvent) -> Self {
        use SessionEvent::*;
        use SessionState::*;

        match (self, event) {
            // Idle transitions
            (Idle, Start) => Work,

            // Work transitions
            (Work, Pause) => PausedWork,
            (Work, WorkFinished(kind)) => kind.session(),

            // Break transitions
            (ShortBreak, Pause) => PausedBreak(BreakKind::Short),
            (LongBreak, Pause) => PausedBreak(BreakKind::Long),
            (ShortBreak, BreakFinished) => Work,
            (LongBreak, BreakFinished) => Work,

            // Paused transitions; resume restores exactly what was paused
            (PausedWork, Resume) => Work,
            (PausedBreak(kind), Resume) => kind.session(),

            // Reset works from anywhere
            (_, Reset) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}
