//! Session controller.
//!
//! Owns the active session's cycle list and current position, and
//! orchestrates transitions between cycles by delegating the countdown
//! to [`CountdownEngine`]. Cycle completions are strictly sequential:
//! a new countdown never starts before the previous one reaches a
//! terminal state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::countdown::{CountdownEngine, TimerState};
use super::cycle::{generate_cycles, Cycle};
use super::settings::Settings;
use crate::error::{CoreError, ValidationError};
use crate::events::Event;

pub const SESSION_SCHEMA_VERSION: u32 = 1;

fn session_schema_version() -> u32 {
    SESSION_SCHEMA_VERSION
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Setup,
    Active,
    Paused,
    Completed,
    Cancelled,
}

impl SessionStatus {
    /// Completed and Cancelled are terminal; no transition leaves them.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }
}

/// One user-initiated study run.
///
/// Owned exclusively by the [`SessionController`] while live; handed to
/// the store as an immutable value on terminal status.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(default = "session_schema_version")]
    pub schema_version: u32,
    pub id: Uuid,
    pub subject: String,
    pub total_budget_min: u64,
    pub cycles: Vec<Cycle>,
    pub current_cycle_index: usize,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
    /// Minutes of study time actually elapsed (skips credit partial time).
    pub study_min: u64,
    /// Minutes of break time actually elapsed.
    pub break_min: u64,
    pub completed_cycles: u64,
    pub points: u64,
}

impl Session {
    pub fn current_cycle(&self) -> Option<&Cycle> {
        self.cycles.get(self.current_cycle_index)
    }

    /// `completed_cycles * 10 + study_min / 5`: rewards both cycles
    /// finished and minutes studied; break time earns no bonus.
    pub fn compute_points(&self) -> u64 {
        self.completed_cycles * 10 + self.study_min / 5
    }
}

/// State machine over [`SessionStatus`] driving one session at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionController {
    session: Session,
    countdown: CountdownEngine,
    settings: Settings,
}

impl SessionController {
    /// Create a session for `subject` with the given budget and start
    /// the first cycle's countdown.
    ///
    /// # Errors
    ///
    /// Rejects a zero budget or invalid settings before any session
    /// state is created.
    pub fn start(
        subject: &str,
        total_budget_min: u64,
        settings: &Settings,
    ) -> Result<(Self, Vec<Event>), CoreError> {
        if total_budget_min == 0 {
            return Err(ValidationError::InvalidValue {
                field: "total_budget_minutes".into(),
                message: "must be greater than 0".into(),
            }
            .into());
        }
        settings.validate()?;

        let now = Utc::now();
        let mut cycles = generate_cycles(total_budget_min, settings);
        debug_assert!(!cycles.is_empty());
        cycles[0].active = true;
        cycles[0].started_at = Some(now);

        let mut countdown = CountdownEngine::new(&cycles[0]);
        countdown.start();

        let session = Session {
            schema_version: SESSION_SCHEMA_VERSION,
            id: Uuid::new_v4(),
            subject: subject.to_string(),
            total_budget_min,
            current_cycle_index: 0,
            status: SessionStatus::Active,
            started_at: now,
            ended_at: None,
            study_min: 0,
            break_min: 0,
            completed_cycles: 0,
            points: 0,
            cycles,
        };

        let events = vec![
            Event::SessionStarted {
                session: session.clone(),
                at: now,
            },
            Event::CycleStarted {
                cycle: session.cycles[0].clone(),
                cycle_index: 0,
                at: now,
            },
        ];

        Ok((
            Self {
                session,
                countdown,
                settings: settings.clone(),
            },
            events,
        ))
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn status(&self) -> SessionStatus {
        self.session.status
    }

    pub fn timer_state(&self) -> TimerState {
        self.countdown.state()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.countdown.remaining_secs()
    }

    pub fn is_terminal(&self) -> bool {
        self.session.status.is_terminal()
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Drive the countdown. Returns completion events when the current
    /// cycle expires (and, on the last cycle, session completion).
    pub fn tick(&mut self) -> Vec<Event> {
        if self.is_terminal() {
            return Vec::new();
        }
        if self.countdown.tick() {
            let elapsed = self.countdown.elapsed_secs();
            self.complete_current(elapsed, false)
        } else {
            if let Some(cycle) = self.session.cycles.get_mut(self.session.current_cycle_index) {
                self.countdown.write_back(cycle);
            }
            Vec::new()
        }
    }

    /// Suspend the running countdown. No-op unless Active and running.
    pub fn pause(&mut self) -> Option<Event> {
        if self.is_terminal() || !self.countdown.pause() {
            return None;
        }
        self.session.status = SessionStatus::Paused;
        if let Some(cycle) = self.session.cycles.get_mut(self.session.current_cycle_index) {
            cycle.active = false;
            self.countdown.write_back(cycle);
        }
        Some(Event::TimerPaused {
            remaining_secs: self.countdown.remaining_secs(),
            at: Utc::now(),
        })
    }

    /// Resume a paused countdown, or start the current cycle's countdown
    /// if it is waiting Idle (the non-auto-start case).
    pub fn resume(&mut self) -> Option<Event> {
        if self.is_terminal() {
            return None;
        }
        let now = Utc::now();
        if self.countdown.resume() {
            self.session.status = SessionStatus::Active;
            if let Some(cycle) = self.session.cycles.get_mut(self.session.current_cycle_index) {
                cycle.active = true;
            }
            return Some(Event::TimerResumed {
                remaining_secs: self.countdown.remaining_secs(),
                at: now,
            });
        }
        if self.countdown.state() == TimerState::Idle && self.countdown.start() {
            self.session.status = SessionStatus::Active;
            let index = self.session.current_cycle_index;
            if let Some(cycle) = self.session.cycles.get_mut(index) {
                cycle.active = true;
                cycle.started_at.get_or_insert(now);
                return Some(Event::CycleStarted {
                    cycle: cycle.clone(),
                    cycle_index: index,
                    at: now,
                });
            }
        }
        None
    }

    /// Force-complete the current cycle, crediting only the elapsed
    /// time, and advance.
    pub fn skip(&mut self) -> Vec<Event> {
        if self.is_terminal() {
            return Vec::new();
        }
        match self.countdown.skip() {
            Some(elapsed) => self.complete_current(elapsed, true),
            None => Vec::new(),
        }
    }

    /// Restore the current cycle to Idle with its full duration.
    pub fn reset(&mut self) -> Option<Event> {
        if self.is_terminal() {
            return None;
        }
        self.countdown.reset();
        let index = self.session.current_cycle_index;
        if let Some(cycle) = self.session.cycles.get_mut(index) {
            cycle.active = false;
            cycle.started_at = None;
            self.countdown.write_back(cycle);
        }
        self.session.status = SessionStatus::Active;
        Some(Event::TimerReset {
            cycle_index: index,
            at: Utc::now(),
        })
    }

    /// Abort the session. The in-progress cycle's partial time is
    /// discarded and the session never reaches the store.
    pub fn cancel(&mut self) -> Option<Event> {
        if self.is_terminal() {
            return None;
        }
        let now = Utc::now();
        self.countdown.skip();
        if let Some(cycle) = self.session.cycles.get_mut(self.session.current_cycle_index) {
            cycle.active = false;
        }
        self.session.status = SessionStatus::Cancelled;
        self.session.ended_at = Some(now);
        Some(Event::SessionCancelled {
            session: self.session.clone(),
            at: now,
        })
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// Fold the finished cycle into the session totals and start (or
    /// stage) the next cycle. The previous countdown is terminal by the
    /// time this runs.
    fn complete_current(&mut self, elapsed_secs: u64, skipped: bool) -> Vec<Event> {
        let now = Utc::now();
        let mut events = Vec::new();
        let index = self.session.current_cycle_index;

        let Some(cycle) = self.session.cycles.get_mut(index) else {
            return events;
        };
        cycle.completed = true;
        cycle.active = false;
        cycle.ended_at = Some(now);
        cycle.remaining_secs = 0;

        // Round elapsed seconds to the nearest minute; natural expiry
        // credits exactly the nominal duration.
        let elapsed_min = (elapsed_secs + 30) / 60;
        if cycle.kind.is_study() {
            self.session.study_min += elapsed_min;
        } else {
            self.session.break_min += elapsed_min;
        }
        self.session.completed_cycles += 1;

        events.push(Event::CycleCompleted {
            cycle: cycle.clone(),
            cycle_index: index,
            skipped,
            at: now,
        });

        self.session.current_cycle_index += 1;
        let next_index = self.session.current_cycle_index;

        if next_index < self.session.cycles.len() {
            self.session.status = SessionStatus::Active;
            let auto_start = {
                let next = &self.session.cycles[next_index];
                if next.kind.is_study() {
                    self.settings.auto_start_next
                } else {
                    self.settings.auto_start_breaks
                }
            };
            self.countdown = CountdownEngine::new(&self.session.cycles[next_index]);
            if auto_start {
                self.countdown.start();
                let next = &mut self.session.cycles[next_index];
                next.active = true;
                next.started_at = Some(now);
                events.push(Event::CycleStarted {
                    cycle: next.clone(),
                    cycle_index: next_index,
                    at: now,
                });
            }
        } else {
            self.session.status = SessionStatus::Completed;
            self.session.ended_at = Some(now);
            self.session.points = self.session.compute_points();
            events.push(Event::SessionCompleted {
                session: self.session.clone(),
                at: now,
            });
        }

        events
    }
}
