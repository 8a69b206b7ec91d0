//! Events that trigger session transitions

use super::machine::BreakKind;

/// Events that can trigger session transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionEvent {
    // User control events
    /// User started a session from idle
    Start,
    /// User paused the running session
    Pause,
    /// User resumed a paused session
    Resume,
    /// User reset everything back to idle
    Reset,

    // Timer events
    /// The work period ran out; the engine decides which break follows
    WorkFinished(BreakKind),
    /// A break period ran out
    BreakFinished,
}

impl SessionEvent {
    /// Check if this event is user-initiated
    pub fn is_user_event(&self) -> bool {
        matches!(
            self,
            SessionEvent::Start | SessionEvent::Pause | SessionEvent::Resume | SessionEvent::Reset
        )
    }

    /// Check if this event comes from the countdown timer
    pub fn is_timer_event(&self) -> bool {
        matches!(
            self,
            SessionEvent::WorkFinished(_) | SessionEvent::BreakFinished
        )
    }
}
