//! Session state machine
//!
//! Defines the authoritative Pomodoro session behavior. The state machine
//! is explicit, finite, and deterministic.

pub mod events;
pub mod machine;

pub use events::SessionEvent;
pub use machine::{BreakKind, SessionState};
