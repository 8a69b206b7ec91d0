//! Pomodoro session engine
//!
//! Owns the session state, the countdown timer, and the cycle count.
//! User controls and the periodic tick come in; session transitions and
//! remaining time come out for the display layer to render. Periods chain
//! automatically: an elapsed work period starts its break, an elapsed
//! break starts the next work period.

use crate::session::{BreakKind, SessionEvent, SessionState};
use crate::timer::{CountdownTimer, TimerPoll};

/// Session durations and the long-break schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PomodoroConfig {
    /// Work period length in minutes
    pub work_min: u32,
    /// Short break length in minutes
    pub short_break_min: u32,
    /// Long break length in minutes
    pub long_break_min: u32,
    /// Every n-th completed work period earns the long break; 0 disables
    /// long breaks entirely
    pub cycles_per_long: u8,
}

impl PomodoroConfig {
    pub const fn work_ms(&self) -> u32 {
        self.work_min * 60_000
    }

    pub const fn short_break_ms(&self) -> u32 {
        self.short_break_min * 60_000
    }

    pub const fn long_break_ms(&self) -> u32 {
        self.long_break_min * 60_000
    }

    /// Which break follows the n-th completed work period
    pub fn break_after(&self, completed_cycles: u8) -> BreakKind {
        if self.cycles_per_long != 0 && completed_cycles % self.cycles_per_long == 0 {
            BreakKind::Long
        } else {
            BreakKind::Short
        }
    }
}

impl Default for PomodoroConfig {
    /// The classic schedule: 25 minute work periods, 5 minute breaks,
    /// a 15 minute long break every fourth cycle
    fn default() -> Self {
        Self {
            work_min: 25,
            short_break_min: 5,
            long_break_min: 15,
            cycles_per_long: 4,
        }
    }
}

/// Pomodoro session engine
///
/// All methods take the current value of a monotonic millisecond counter;
/// the engine holds no clock of its own.
#[derive(Debug)]
pub struct Pomodoro {
    config: PomodoroConfig,
    state: SessionState,
    previous: SessionState,
    timer: CountdownTimer,
    /// Work periods completed since the last reset
    completed_cycles: u8,
}

impl Pomodoro {
    pub fn new(config: PomodoroConfig) -> Self {
        Self {
            config,
            state: SessionState::Idle,
            previous: SessionState::Idle,
            timer: CountdownTimer::new(),
            completed_cycles: 0,
        }
    }

    /// Current session state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// State before the last transition
    pub fn previous_state(&self) -> SessionState {
        self.previous
    }

    /// Work periods completed since the last reset
    pub fn completed_cycles(&self) -> u8 {
        self.completed_cycles
    }

    pub fn config(&self) -> PomodoroConfig {
        self.config
    }

    /// Replace the configuration
    ///
    /// A period already counting down keeps its original duration; the new
    /// durations apply from the next period on.
    pub fn set_config(&mut self, config: PomodoroConfig) {
        self.config = config;
    }

    /// Begin the first work period; returns false unless idle
    pub fn start(&mut self, now_ms: u32) -> bool {
        if self.state != SessionState::Idle {
            return false;
        }
        self.apply(SessionEvent::Start);
        self.timer.start(self.config.work_ms(), now_ms);
        true
    }

    /// Pause the running period; returns false unless one is running
    pub fn pause(&mut self, now_ms: u32) -> bool {
        if !self.state.is_running() {
            return false;
        }
        self.apply(SessionEvent::Pause);
        self.timer.pause(now_ms);
        true
    }

    /// Resume the paused period; returns false unless paused
    pub fn resume(&mut self, now_ms: u32) -> bool {
        if !self.state.is_paused() {
            return false;
        }
        self.apply(SessionEvent::Resume);
        self.timer.resume(now_ms);
        true
    }

    /// Back to idle, cycle count cleared
    pub fn reset(&mut self) {
        self.apply(SessionEvent::Reset);
        self.completed_cycles = 0;
        self.timer.stop();
    }

    /// Advance the engine against the clock
    ///
    /// Call periodically. When the current period runs out the session
    /// moves on, the next period's countdown starts, and the transition
    /// event is returned for the display layer.
    pub fn tick(&mut self, now_ms: u32) -> Option<SessionEvent> {
        match self.timer.tick(now_ms) {
            TimerPoll::Elapsed if self.state.is_running() => {
                let event = if self.state == SessionState::Work {
                    self.completed_cycles = self.completed_cycles.wrapping_add(1);
                    SessionEvent::WorkFinished(self.config.break_after(self.completed_cycles))
                } else {
                    SessionEvent::BreakFinished
                };
                self.apply(event);
                self.timer.start(self.period_ms(self.state), now_ms);
                Some(event)
            }
            _ => None,
        }
    }

    /// Remaining time in the current period
    ///
    /// While idle this reports the configured work duration, which is what
    /// the display shows before the first start.
    pub fn remaining_ms(&self, now_ms: u32) -> u32 {
        if self.state == SessionState::Idle {
            self.config.work_ms()
        } else {
            self.timer.remaining(now_ms)
        }
    }

    /// Remaining time in whole seconds
    pub fn remaining_sec(&self, now_ms: u32) -> u32 {
        self.remaining_ms(now_ms) / 1000
    }

    /// How far the current period has come, 0 to 100
    pub fn progress_percent(&self, now_ms: u32) -> u8 {
        let total = self.period_ms(self.state);
        if total == 0 {
            return 0;
        }
        let done = total.saturating_sub(self.remaining_ms(now_ms));
        ((done as u64 * 100) / total as u64) as u8
    }

    fn apply(&mut self, event: SessionEvent) {
        self.previous = self.state;
        self.state = self.state.transition(event);
    }

    /// Configured duration of the period `state` belongs to
    fn period_ms(&self, state: SessionState) -> u32 {
        match state {
            SessionState::Idle | SessionState::Work | SessionState::PausedWork => {
                self.config.work_ms()
            }
            SessionState::ShortBreak | SessionState::PausedBreak(BreakKind::Short) => {
                self.config.short_break_ms()
            }
            SessionState::LongBreak | SessionState::PausedBreak(BreakKind::Long) => {
                self.config.long_break_ms()
            }
        }
    }
}

impl Default for Pomodoro {
    fn default() -> Self {
        Self::new(PomodoroConfig::default())
    }
}
