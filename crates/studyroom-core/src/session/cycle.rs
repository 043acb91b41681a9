//! Cycle types and the cycle generator.
//!
//! A session's time budget is carved into an ordered list of typed
//! cycles (study, short break, long break) up front. Generation is a
//! pure function: no I/O, no clock, and identical inputs always produce
//! an identical list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::settings::Settings;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CycleKind {
    Study,
    ShortBreak,
    LongBreak,
}

impl CycleKind {
    pub fn is_study(&self) -> bool {
        matches!(self, CycleKind::Study)
    }
}

/// One timed interval of a session.
///
/// `remaining_secs` is mutated only by the countdown engine;
/// `completed` transitions false -> true exactly once.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cycle {
    /// Positional identity, e.g. `cycle-2-study`. The countdown engine
    /// is keyed by this id, not by field values.
    pub id: String,
    pub kind: CycleKind,
    /// Nominal duration in minutes.
    pub duration_min: u64,
    /// Seconds left on the countdown.
    pub remaining_secs: u64,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl Cycle {
    fn new(id: String, kind: CycleKind, duration_min: u64) -> Self {
        Self {
            id,
            kind,
            duration_min,
            remaining_secs: duration_min.saturating_mul(60),
            active: false,
            completed: false,
            started_at: None,
            ended_at: None,
        }
    }

    /// Nominal duration in seconds.
    ///
    /// Uses saturating arithmetic to prevent overflow with large values.
    pub fn duration_secs(&self) -> u64 {
        self.duration_min.saturating_mul(60)
    }
}

/// Carve `total_budget_min` into an ordered cycle list.
///
/// Greedily consumes the budget in study + short-break units, inserting
/// a long break after every `long_break_interval`-th study cycle when it
/// still fits. Any positive remainder becomes one final study cycle, so
/// no budgeted time is silently dropped. Never emits a zero-duration
/// cycle.
///
/// The caller is responsible for validating `settings` first; a budget
/// of 0 yields an empty list.
pub fn generate_cycles(total_budget_min: u64, settings: &Settings) -> Vec<Cycle> {
    let mut cycles = Vec::new();
    let mut remaining = total_budget_min;
    let mut study_count: u64 = 0;

    while remaining >= settings.study_minutes + settings.short_break_minutes {
        study_count += 1;
        cycles.push(Cycle::new(
            format!("cycle-{study_count}-study"),
            CycleKind::Study,
            settings.study_minutes,
        ));
        remaining -= settings.study_minutes;

        if remaining >= settings.short_break_minutes {
            cycles.push(Cycle::new(
                format!("cycle-{study_count}-short-break"),
                CycleKind::ShortBreak,
                settings.short_break_minutes,
            ));
            remaining -= settings.short_break_minutes;
        }

        if study_count % settings.long_break_interval == 0
            && remaining >= settings.long_break_minutes
        {
            cycles.push(Cycle::new(
                format!("cycle-{study_count}-long-break"),
                CycleKind::LongBreak,
                settings.long_break_minutes,
            ));
            remaining -= settings.long_break_minutes;
        }
    }

    // Whatever is left is too small for a full unit; emit it as one
    // final study cycle even if below the normal study duration.
    if remaining > 0 {
        cycles.push(Cycle::new(
            format!("cycle-{}-final", study_count + 1),
            CycleKind::Study,
            remaining,
        ));
    }

    cycles
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn settings(study: u64, short: u64, long: u64, interval: u64) -> Settings {
        Settings {
            study_minutes: study,
            short_break_minutes: short,
            long_break_minutes: long,
            long_break_interval: interval,
            ..Settings::default()
        }
    }

    #[test]
    fn ninety_minute_budget_default_settings() {
        let cycles = generate_cycles(90, &settings(25, 5, 15, 4));
        let kinds: Vec<CycleKind> = cycles.iter().map(|c| c.kind).collect();
        // 3 full study + short-break units consume the whole budget; the
        // 5-minute tail after the third study cycle still fits a short
        // break, so no final study remainder appears.
        assert_eq!(
            kinds,
            vec![
                CycleKind::Study,
                CycleKind::ShortBreak,
                CycleKind::Study,
                CycleKind::ShortBreak,
                CycleKind::Study,
                CycleKind::ShortBreak,
            ]
        );
        assert_eq!(cycles.iter().map(|c| c.duration_min).sum::<u64>(), 90);
    }

    #[test]
    fn tiny_budget_yields_single_study_cycle() {
        let cycles = generate_cycles(10, &settings(25, 5, 15, 4));
        assert_eq!(cycles.len(), 1);
        assert_eq!(cycles[0].kind, CycleKind::Study);
        assert_eq!(cycles[0].duration_min, 10);
    }

    #[test]
    fn remainder_too_small_for_break_becomes_final_study() {
        // 63 = 25 + 5 + 25 + 5, remainder 3 < short break.
        let cycles = generate_cycles(63, &settings(25, 5, 15, 4));
        let last = cycles.last().unwrap();
        assert_eq!(last.kind, CycleKind::Study);
        assert_eq!(last.duration_min, 3);
        assert_eq!(last.id, "cycle-3-final");
    }

    #[test]
    fn long_break_every_interval() {
        // interval 1: a long break follows every study cycle that still
        // has budget for one.
        let cycles = generate_cycles(100, &settings(20, 5, 10, 1));
        assert!(cycles
            .windows(2)
            .filter(|w| w[0].kind == CycleKind::ShortBreak)
            .all(|w| w[1].kind == CycleKind::LongBreak || w[1].kind == CycleKind::Study));
        assert!(cycles.iter().any(|c| c.kind == CycleKind::LongBreak));
        assert_eq!(cycles.iter().map(|c| c.duration_min).sum::<u64>(), 100);
    }

    #[test]
    fn zero_budget_yields_no_cycles() {
        assert!(generate_cycles(0, &Settings::default()).is_empty());
    }

    #[test]
    fn cycle_ids_are_unique() {
        let cycles = generate_cycles(240, &Settings::default());
        let mut ids: Vec<&str> = cycles.iter().map(|c| c.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), cycles.len());
    }

    proptest! {
        #[test]
        fn budget_is_conserved(
            budget in 1u64..1000,
            study in 1u64..120,
            short in 1u64..30,
            long in 1u64..60,
            interval in 1u64..8,
        ) {
            let s = settings(study, short, long, interval);
            let cycles = generate_cycles(budget, &s);
            prop_assert_eq!(cycles.iter().map(|c| c.duration_min).sum::<u64>(), budget);
        }

        #[test]
        fn no_zero_duration_cycles(
            budget in 1u64..1000,
            study in 1u64..120,
            short in 1u64..30,
            long in 1u64..60,
            interval in 1u64..8,
        ) {
            let s = settings(study, short, long, interval);
            prop_assert!(generate_cycles(budget, &s).iter().all(|c| c.duration_min > 0));
        }

        #[test]
        fn generation_is_deterministic(
            budget in 1u64..1000,
            study in 1u64..120,
            short in 1u64..30,
            long in 1u64..60,
            interval in 1u64..8,
        ) {
            let s = settings(study, short, long, interval);
            prop_assert_eq!(generate_cycles(budget, &s), generate_cycles(budget, &s));
        }
    }
}
