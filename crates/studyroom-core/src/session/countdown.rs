//! Per-cycle countdown engine.
//!
//! The countdown is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()`
//! periodically (once per second is the expected cadence).
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running -> (Paused | Completed)
//! Paused -> Running
//! ```
//!
//! No transition leaves `Completed`. The engine is keyed by cycle id:
//! rebinding it to the same cycle never resets remaining time, only a
//! different id does.

use serde::{Deserialize, Serialize};

use super::cycle::Cycle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerState {
    Idle,
    Running,
    Paused,
    Completed,
}

/// Core countdown engine for a single cycle.
///
/// Operates on wall-clock deltas -- no internal thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountdownEngine {
    /// Id of the cycle this engine counts down for.
    cycle_id: String,
    state: TimerState,
    /// Full duration of the bound cycle in seconds.
    duration_secs: u64,
    remaining_secs: u64,
    /// Timestamp (ms since epoch) of the last start/resume/tick.
    /// Used to compute elapsed time between ticks.
    #[serde(default)]
    last_tick_epoch_ms: Option<u64>,
    /// Sub-second remainder carried between ticks so slow tick cadences
    /// don't lose time.
    #[serde(default)]
    carry_ms: u64,
}

impl CountdownEngine {
    /// Create an engine bound to `cycle`, starting in `Idle`.
    pub fn new(cycle: &Cycle) -> Self {
        Self {
            cycle_id: cycle.id.clone(),
            state: TimerState::Idle,
            duration_secs: cycle.duration_secs(),
            remaining_secs: cycle.remaining_secs,
            last_tick_epoch_ms: None,
            carry_ms: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> TimerState {
        self.state
    }

    pub fn cycle_id(&self) -> &str {
        &self.cycle_id
    }

    pub fn remaining_secs(&self) -> u64 {
        self.remaining_secs
    }

    pub fn duration_secs(&self) -> u64 {
        self.duration_secs
    }

    /// Seconds consumed so far (duration minus remaining).
    pub fn elapsed_secs(&self) -> u64 {
        self.duration_secs.saturating_sub(self.remaining_secs)
    }

    /// 0.0 .. 1.0 progress within the cycle.
    pub fn progress(&self) -> f64 {
        if self.duration_secs == 0 {
            return 0.0;
        }
        1.0 - (self.remaining_secs as f64 / self.duration_secs as f64)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Idle/Paused -> Running. Silently ignored when already Running or
    /// Completed. Returns whether a transition happened.
    pub fn start(&mut self) -> bool {
        match self.state {
            TimerState::Idle | TimerState::Paused => {
                self.state = TimerState::Running;
                self.last_tick_epoch_ms = Some(now_ms());
                true
            }
            TimerState::Running | TimerState::Completed => false,
        }
    }

    /// Running -> Paused. Remaining time is flushed first and then frozen.
    pub fn pause(&mut self) -> bool {
        match self.state {
            TimerState::Running => {
                self.flush_elapsed();
                self.state = TimerState::Paused;
                self.last_tick_epoch_ms = None;
                true
            }
            _ => false,
        }
    }

    /// Paused -> Running.
    pub fn resume(&mut self) -> bool {
        match self.state {
            TimerState::Paused => {
                self.state = TimerState::Running;
                self.last_tick_epoch_ms = Some(now_ms());
                true
            }
            _ => false,
        }
    }

    /// Force completion from any non-Completed state, discarding the
    /// remaining time. Returns the elapsed seconds credited to the
    /// cycle, or `None` if the engine was already Completed.
    pub fn skip(&mut self) -> Option<u64> {
        if self.state == TimerState::Completed {
            return None;
        }
        if self.state == TimerState::Running {
            self.flush_elapsed();
        }
        let elapsed = self.elapsed_secs();
        self.state = TimerState::Completed;
        self.remaining_secs = 0;
        self.last_tick_epoch_ms = None;
        Some(elapsed)
    }

    /// Any state -> Idle, remaining time restored to the full duration.
    pub fn reset(&mut self) {
        self.state = TimerState::Idle;
        self.remaining_secs = self.duration_secs;
        self.last_tick_epoch_ms = None;
        self.carry_ms = 0;
    }

    /// Bind the engine to `cycle`, resetting only if the cycle identity
    /// actually changed. Guards against spurious resets when the caller
    /// re-supplies the same cycle object.
    pub fn rebind(&mut self, cycle: &Cycle) {
        if cycle.id != self.cycle_id {
            *self = Self::new(cycle);
        }
    }

    /// Call periodically while a cycle is live. Returns `true` exactly
    /// once, when the countdown reaches zero and transitions to
    /// Completed (natural expiry).
    pub fn tick(&mut self) -> bool {
        if self.state != TimerState::Running {
            return false;
        }
        self.flush_elapsed();
        if self.remaining_secs == 0 {
            self.state = TimerState::Completed;
            self.last_tick_epoch_ms = None;
            return true;
        }
        false
    }

    /// Write the authoritative remaining time back into the cycle.
    pub fn write_back(&self, cycle: &mut Cycle) {
        if cycle.id == self.cycle_id {
            cycle.remaining_secs = self.remaining_secs;
        }
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Shift the last tick into the past so elapsed time accrues
    /// without sleeping in tests.
    #[cfg(test)]
    pub(crate) fn backdate(&mut self, ms: u64) {
        if let Some(last) = self.last_tick_epoch_ms {
            self.last_tick_epoch_ms = Some(last.saturating_sub(ms));
        }
    }

    fn flush_elapsed(&mut self) {
        if let Some(last) = self.last_tick_epoch_ms {
            let now = now_ms();
            let elapsed_ms = now.saturating_sub(last) + self.carry_ms;
            self.remaining_secs = self.remaining_secs.saturating_sub(elapsed_ms / 1000);
            self.carry_ms = elapsed_ms % 1000;
            self.last_tick_epoch_ms = Some(now);
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
