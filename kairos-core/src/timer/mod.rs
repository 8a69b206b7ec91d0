//! Countdown timing
//!
//! Pure countdown logic against a caller-supplied millisecond clock; the
//! firmware threads its tick counter through, tests thread arbitrary
//! numbers.

pub mod countdown;

pub use countdown::{CountdownTimer, TimerPoll};
