//! Pomodoro engine
//!
//! Couples the session state machine to the countdown timer and schedules
//! the long break from the completed-cycle count.

pub mod engine;

pub use engine::{Pomodoro, PomodoroConfig};
