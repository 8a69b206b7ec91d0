//! Board-agnostic Pomodoro session logic for the Kairos firmware
//!
//! This crate contains the application logic that does not depend on any
//! hardware:
//!
//! - Session state machine (work, breaks, pauses)
//! - Millisecond countdown timer driven by a caller-supplied clock
//! - Pomodoro engine coupling the two, with cycle counting
//!
//! The firmware feeds it a monotonic millisecond tick and user button
//! events; it answers with session transitions and remaining time for the
//! display layer to render.

#![no_std]
#![deny(unsafe_code)]

pub mod pomodoro;
pub mod session;
pub mod timer;
