//! Millisecond countdown timer
//!
//! Holds no clock of its own: every operation takes the current value of a
//! monotonic millisecond counter. Elapsed time is computed from timestamps
//! rather than accumulated per call, so a slow or jittery poll loop cannot
//! drift the deadline. Paused stretches are excluded from elapsed time.

/// Result of polling the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerPoll {
    /// No countdown active
    Idle,
    /// Counting down
    Running { remaining_ms: u32 },
    /// Frozen by pause
    Paused { remaining_ms: u32 },
    /// The countdown just ran out; reported exactly once
    Elapsed,
}

/// Countdown over a caller-supplied monotonic clock
///
/// The clock is a free-running `u32` millisecond counter and may wrap;
/// wrapping subtraction keeps elapsed time correct across the wrap as long
/// as a single countdown stays under 2^32 ms.
#[derive(Debug, Clone, Copy)]
pub struct CountdownTimer {
    running: bool,
    paused: bool,
    duration_ms: u32,
    started_at: u32,
    paused_at: u32,
    paused_total_ms: u32,
    /// Last known remaining time, for reads while paused or stopped
    remaining_ms: u32,
}

impl CountdownTimer {
    pub const fn new() -> Self {
        Self {
            running: false,
            paused: false,
            duration_ms: 0,
            started_at: 0,
            paused_at: 0,
            paused_total_ms: 0,
            remaining_ms: 0,
        }
    }

    /// Begin a countdown of `duration_ms`, replacing any active one
    pub fn start(&mut self, duration_ms: u32, now_ms: u32) {
        self.running = true;
        self.paused = false;
        self.duration_ms = duration_ms;
        self.started_at = now_ms;
        self.paused_total_ms = 0;
        self.remaining_ms = duration_ms;
    }

    /// Cancel the countdown without it elapsing
    pub fn stop(&mut self) {
        self.running = false;
        self.paused = false;
    }

    /// Freeze the countdown; no-op unless running
    pub fn pause(&mut self, now_ms: u32) {
        if self.running && !self.paused {
            self.remaining_ms = self.compute_remaining(now_ms);
            self.paused = true;
            self.paused_at = now_ms;
        }
    }

    /// Continue a paused countdown; the paused stretch does not count
    pub fn resume(&mut self, now_ms: u32) {
        if self.paused {
            self.paused_total_ms = self
                .paused_total_ms
                .wrapping_add(now_ms.wrapping_sub(self.paused_at));
            self.paused = false;
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_paused(&self) -> bool {
        self.running && self.paused
    }

    /// Remaining time without advancing the timer
    pub fn remaining(&self, now_ms: u32) -> u32 {
        if !self.running || self.paused {
            self.remaining_ms
        } else {
            self.compute_remaining(now_ms)
        }
    }

    /// Advance the timer against the clock
    ///
    /// Returns [`TimerPoll::Elapsed`] on the first poll at or past the
    /// deadline; after that the timer is idle until started again.
    pub fn tick(&mut self, now_ms: u32) -> TimerPoll {
        if !self.running {
            return TimerPoll::Idle;
        }
        if self.paused {
            return TimerPoll::Paused {
                remaining_ms: self.remaining_ms,
            };
        }
        let remaining = self.compute_remaining(now_ms);
        self.remaining_ms = remaining;
        if remaining > 0 {
            TimerPoll::Running {
                remaining_ms: remaining,
            }
        } else {
            self.running = false;
            TimerPoll::Elapsed
        }
    }

    fn compute_remaining(&self, now_ms: u32) -> u32 {
        let elapsed = now_ms
            .wrapping_sub(self.started_at)
            .wrapping_sub(self.paused_total_ms);
        self.duration_ms.saturating_sub(elapsed)
    }
}

impl Default for CountdownTimer {
    fn default() -> Self {
        Self::new()
    }
}
