use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::achievements::Achievement;
use crate::session::{Cycle, Session};

/// Every state change in the engine produces an Event.
/// Collaborators (UI, notification layer) subscribe to these for
/// feedback; payloads are owned values, never mutable references.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session: Session,
        at: DateTime<Utc>,
    },
    CycleStarted {
        cycle: Cycle,
        cycle_index: usize,
        at: DateTime<Utc>,
    },
    TimerPaused {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        remaining_secs: u64,
        at: DateTime<Utc>,
    },
    /// Current cycle returned to Idle with its full duration restored.
    TimerReset {
        cycle_index: usize,
        at: DateTime<Utc>,
    },
    CycleCompleted {
        cycle: Cycle,
        cycle_index: usize,
        /// True when the cycle was force-completed rather than expiring.
        skipped: bool,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        session: Session,
        at: DateTime<Utc>,
    },
    SessionCancelled {
        session: Session,
        at: DateTime<Utc>,
    },
    AchievementUnlocked {
        achievement: Achievement,
        at: DateTime<Utc>,
    },
}
