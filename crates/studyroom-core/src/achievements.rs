//! Achievement catalog and evaluator.
//!
//! Evaluation is a pure function of (stats, achievement list): no side
//! effects, no I/O. Unlocks are one-way; an already-unlocked achievement
//! is never re-evaluated. Notifying the user is the caller's job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stats::Stats;

/// Which aggregate statistic an achievement thresholds on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementKind {
    /// Total completed sessions.
    Sessions,
    /// Cumulative study minutes.
    Time,
    /// Current daily streak.
    Streak,
    /// Total points.
    Points,
}

/// A persistent unlockable milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub name: String,
    pub description: String,
    pub kind: AchievementKind,
    pub target: u64,
    pub unlocked: bool,
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
    /// 0.0 to 100.0, clamped at 100 once the target is reached.
    pub progress: f64,
}

impl Achievement {
    fn new(id: &str, name: &str, description: &str, kind: AchievementKind, target: u64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: description.into(),
            kind,
            target,
            unlocked: false,
            unlocked_at: None,
            progress: 0.0,
        }
    }
}

/// The built-in catalog, all locked.
pub fn default_achievements() -> Vec<Achievement> {
    vec![
        Achievement::new(
            "first_session",
            "First Step",
            "Complete your first study session",
            AchievementKind::Sessions,
            1,
        ),
        Achievement::new(
            "streak_3",
            "Consistency",
            "Study 3 days in a row",
            AchievementKind::Streak,
            3,
        ),
        Achievement::new(
            "streak_7",
            "Winning Week",
            "Study 7 days in a row",
            AchievementKind::Streak,
            7,
        ),
        Achievement::new(
            "streak_30",
            "Master of Time",
            "Study 30 days in a row",
            AchievementKind::Streak,
            30,
        ),
        Achievement::new(
            "total_time_10",
            "Dedication",
            "Accumulate 10 hours of study",
            AchievementKind::Time,
            600,
        ),
        Achievement::new(
            "total_time_50",
            "Expert",
            "Accumulate 50 hours of study",
            AchievementKind::Time,
            3000,
        ),
        Achievement::new(
            "sessions_10",
            "Persistent",
            "Complete 10 sessions",
            AchievementKind::Sessions,
            10,
        ),
        Achievement::new(
            "sessions_100",
            "Veteran",
            "Complete 100 sessions",
            AchievementKind::Sessions,
            100,
        ),
        Achievement::new(
            "points_500",
            "Point Collector",
            "Earn 500 points",
            AchievementKind::Points,
            500,
        ),
    ]
}

/// Result of one evaluation pass.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub achievements: Vec<Achievement>,
    /// Achievements that transitioned locked -> unlocked in this pass.
    pub newly_unlocked: Vec<Achievement>,
}

fn observed(kind: AchievementKind, stats: &Stats) -> u64 {
    match kind {
        AchievementKind::Sessions => stats.total_sessions,
        AchievementKind::Time => stats.total_study_min,
        AchievementKind::Streak => stats.current_streak,
        AchievementKind::Points => stats.total_points,
    }
}

/// Re-evaluate every not-yet-unlocked achievement against `stats`.
pub fn evaluate(stats: &Stats, achievements: Vec<Achievement>, now: DateTime<Utc>) -> Evaluation {
    let mut newly_unlocked = Vec::new();
    let achievements = achievements
        .into_iter()
        .map(|mut achievement| {
            if achievement.unlocked {
                return achievement;
            }
            let observed = observed(achievement.kind, stats);
            if observed >= achievement.target {
                achievement.unlocked = true;
                achievement.unlocked_at = Some(now);
                achievement.progress = 100.0;
                newly_unlocked.push(achievement.clone());
            } else {
                achievement.progress =
                    (observed as f64 / achievement.target as f64 * 100.0).min(100.0);
            }
            achievement
        })
        .collect();

    Evaluation {
        achievements,
        newly_unlocked,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats_with(sessions: u64, study_min: u64, streak: u64, points: u64) -> Stats {
        Stats {
            total_sessions: sessions,
            total_study_min: study_min,
            current_streak: streak,
            total_points: points,
            ..Stats::default()
        }
    }

    #[test]
    fn first_session_unlocks() {
        let stats = stats_with(1, 25, 1, 12);
        let result = evaluate(&stats, default_achievements(), Utc::now());
        let first = result
            .achievements
            .iter()
            .find(|a| a.id == "first_session")
            .unwrap();
        assert!(first.unlocked);
        assert!(first.unlocked_at.is_some());
        assert_eq!(first.progress, 100.0);
        assert_eq!(result.newly_unlocked.len(), 1);
    }

    #[test]
    fn progress_tracks_partial_completion() {
        let stats = stats_with(5, 300, 0, 0);
        let result = evaluate(&stats, default_achievements(), Utc::now());
        let persistent = result
            .achievements
            .iter()
            .find(|a| a.id == "sessions_10")
            .unwrap();
        assert!(!persistent.unlocked);
        assert_eq!(persistent.progress, 50.0);
        let dedication = result
            .achievements
            .iter()
            .find(|a| a.id == "total_time_10")
            .unwrap();
        assert_eq!(dedication.progress, 50.0);
    }

    #[test]
    fn unlock_is_monotonic() {
        let unlocked_at = Utc::now();
        let first_pass = evaluate(&stats_with(1, 0, 0, 0), default_achievements(), unlocked_at);

        // Stats that would no longer satisfy the target (streak reset to
        // zero has the same shape) must not re-lock anything.
        let second_pass = evaluate(
            &stats_with(0, 0, 0, 0),
            first_pass.achievements,
            Utc::now(),
        );
        let first = second_pass
            .achievements
            .iter()
            .find(|a| a.id == "first_session")
            .unwrap();
        assert!(first.unlocked);
        assert_eq!(first.unlocked_at, Some(unlocked_at));
        assert!(second_pass.newly_unlocked.is_empty());
    }

    #[test]
    fn streak_and_points_kinds_observed() {
        let stats = stats_with(0, 0, 3, 500);
        let result = evaluate(&stats, default_achievements(), Utc::now());
        assert!(result
            .achievements
            .iter()
            .find(|a| a.id == "streak_3")
            .unwrap()
            .unlocked);
        assert!(result
            .achievements
            .iter()
            .find(|a| a.id == "points_500")
            .unwrap()
            .unlocked);
    }
}
