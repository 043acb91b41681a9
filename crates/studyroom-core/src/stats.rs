//! Aggregate statistics over the session history.
//!
//! A single process-wide [`Stats`] record is folded forward once per
//! completed session; streak and completion rate are recomputed from
//! the full history by the store for correctness against out-of-order
//! or backfilled entries.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::session::Session;

pub const STATS_SCHEMA_VERSION: u32 = 1;

/// Most-recent-first session summary list is bounded to this many.
pub const RECENT_LIMIT: usize = 10;

fn stats_schema_version() -> u32 {
    STATS_SCHEMA_VERSION
}

/// Per-subject rollup.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectStats {
    pub sessions: u64,
    pub total_min: u64,
    pub average_min: u64,
}

/// Compact per-session record kept in `Stats::recent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub date: NaiveDate,
    pub subject: String,
    pub duration_min: u64,
    pub completed: bool,
    pub points: u64,
}

/// Aggregate, process-wide statistics. Mutated only by the store's
/// update routine; monotonic except for the streak counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    #[serde(default = "stats_schema_version")]
    pub schema_version: u32,
    pub total_sessions: u64,
    pub total_study_min: u64,
    pub total_break_min: u64,
    pub average_session_min: u64,
    /// Percentage of budgeted minutes actually spent, over the whole
    /// history.
    pub completion_rate: f64,
    /// Consecutive calendar days (ending today) with a completed session.
    pub current_streak: u64,
    pub longest_streak: u64,
    #[serde(default)]
    pub last_active_date: Option<NaiveDate>,
    pub total_points: u64,
    /// `total_points / 100 + 1`.
    pub level: u64,
    pub subjects: BTreeMap<String, SubjectStats>,
    /// Most-recent-first, at most [`RECENT_LIMIT`] entries.
    pub recent: Vec<SessionSummary>,
}

impl Default for Stats {
    fn default() -> Self {
        Self {
            schema_version: STATS_SCHEMA_VERSION,
            total_sessions: 0,
            total_study_min: 0,
            total_break_min: 0,
            average_session_min: 0,
            completion_rate: 0.0,
            current_streak: 0,
            longest_streak: 0,
            last_active_date: None,
            total_points: 0,
            level: 1,
            subjects: BTreeMap::new(),
            recent: Vec::new(),
        }
    }
}

impl Stats {
    /// Fold one completed session into the running totals. Streak and
    /// completion rate are recomputed separately from the full history.
    pub fn fold_session(&mut self, session: &Session) {
        self.total_sessions += 1;
        self.total_study_min += session.study_min;
        self.total_break_min += session.break_min;
        self.average_session_min = self.total_study_min / self.total_sessions;
        self.total_points += session.points;
        self.level = self.total_points / 100 + 1;

        let subject = self.subjects.entry(session.subject.clone()).or_default();
        subject.sessions += 1;
        subject.total_min += session.total_budget_min;
        subject.average_min = subject.total_min / subject.sessions;

        self.recent.insert(
            0,
            SessionSummary {
                date: session.started_at.date_naive(),
                subject: session.subject.clone(),
                duration_min: session.total_budget_min,
                completed: true,
                points: session.points,
            },
        );
        self.recent.truncate(RECENT_LIMIT);

        self.last_active_date = Some(session.started_at.date_naive());
    }
}

/// Count consecutive calendar days with at least one completed session,
/// walking backwards from `today`. Multiple sessions on one day count
/// once; the first gap day ends the streak.
pub fn compute_streak(days: impl IntoIterator<Item = NaiveDate>, today: NaiveDate) -> u64 {
    let set: BTreeSet<NaiveDate> = days.into_iter().collect();
    let mut streak = 0;
    let mut expected = today;
    while set.contains(&expected) {
        streak += 1;
        match expected.pred_opt() {
            Some(prev) => expected = prev,
            None => break,
        }
    }
    streak
}
