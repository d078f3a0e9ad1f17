//! Phase calculation: where "today" falls in the user's cycle.
//!
//! The cycle is a pure function of elapsed calendar days since the last
//! known period start:
//! - Cycle day wraps at the average cycle length
//! - Phase comes from fixed thresholds around the ovulation day
//! - A missing period start falls back to "two weeks ago"

use crate::datemath::{add_days, days_between, wrap_cycle_day, PhaseThresholds};
use crate::prediction::predict;
use crate::{CycleInfo, CycleSettings, Phase};
use chrono::NaiveDate;

/// Days assumed since the last period when none has been recorded
pub const ASSUMED_DAYS_SINCE_PERIOD: i64 = 14;

/// Position within the cycle on a given day
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CyclePosition {
    pub day_of_cycle: u32,
    pub phase: Phase,
    pub cycle_length: u32,
    pub thresholds: PhaseThresholds,
}

impl CyclePosition {
    pub fn ovulation_day(&self) -> u32 {
        self.thresholds.ovulation_day
    }
}

/// Anchor date the cycle is counted from
pub fn effective_period_start(settings: &CycleSettings, today: NaiveDate) -> NaiveDate {
    settings
        .last_period_start
        .unwrap_or_else(|| add_days(today, -ASSUMED_DAYS_SINCE_PERIOD))
}

/// Compute the cycle day and phase for `today`
///
/// Never fails: `today` before the period start (backfilled logs, clock skew)
/// still lands on a cycle day in `[1, cycle_length]`.
pub fn compute_cycle_position(settings: &CycleSettings, today: NaiveDate) -> CyclePosition {
    let settings = settings.clone().sanitized();
    let cycle_length = settings.average_cycle_length;
    let thresholds = PhaseThresholds::new(cycle_length, settings.average_period_length);

    let start = effective_period_start(&settings, today);
    let diff_days = days_between(start, today);
    let day_of_cycle = wrap_cycle_day(1, diff_days, cycle_length);

    CyclePosition {
        day_of_cycle,
        phase: thresholds.classify(day_of_cycle),
        cycle_length,
        thresholds,
    }
}

/// Current phase, cycle day and predictions for `today`
///
/// Always recomputed; nothing here is cached between days.
pub fn compute_cycle_info(settings: &CycleSettings, today: NaiveDate) -> CycleInfo {
    let position = compute_cycle_position(settings, today);
    let predictions = predict(&position, today);

    tracing::debug!(
        "Cycle day {} of {} ({}) for {}",
        position.day_of_cycle,
        position.cycle_length,
        position.phase,
        today
    );

    CycleInfo {
        as_of: today,
        current_phase: position.phase,
        day_of_cycle: position.day_of_cycle,
        cycle_length: position.cycle_length,
        next_period_date: predictions.next_period_date,
        ovulation_date: predictions.ovulation_date,
        fertile_window_start: predictions.fertile_window_start,
        fertile_window_end: predictions.fertile_window_end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn settings(cycle: u32, period: u32, start: Option<NaiveDate>) -> CycleSettings {
        let mut s = CycleSettings::new("test");
        s.average_cycle_length = cycle;
        s.average_period_length = period;
        s.last_period_start = start;
        s
    }

    #[test]
    fn test_first_day_of_period() {
        let s = settings(28, 5, Some(date(2024, 1, 1)));
        let info = compute_cycle_info(&s, date(2024, 1, 1));

        assert_eq!(info.day_of_cycle, 1);
        assert_eq!(info.current_phase, Phase::Menstrual);
        assert_eq!(info.next_period_date, date(2024, 1, 29));
    }

    #[test]
    fn test_missing_start_assumes_two_weeks_ago() {
        let s = settings(28, 5, None);
        let info = compute_cycle_info(&s, date(2024, 6, 20));

        assert_eq!(info.day_of_cycle, 15);
        assert_eq!(info.current_phase, Phase::Ovulatory);
    }

    #[test]
    fn test_today_before_period_start_wraps() {
        let s = settings(28, 5, Some(date(2024, 3, 10)));
        let info = compute_cycle_info(&s, date(2024, 3, 9));

        assert_eq!(info.day_of_cycle, 28);
        assert_eq!(info.current_phase, Phase::Luteal);
    }

    #[test]
    fn test_forty_days_before_start_stays_positive() {
        let s = settings(28, 5, Some(date(2024, 3, 10)));
        let today = add_days(date(2024, 3, 10), -40);
        let position = compute_cycle_position(&s, today);

        assert!((1..=28).contains(&position.day_of_cycle));
        assert_eq!(position.day_of_cycle, 17);
    }

    #[test]
    fn test_day_of_cycle_always_in_range() {
        let start = date(2024, 1, 15);
        for cycle in [15, 21, 28, 35, 60] {
            for period in [1, 5, 14] {
                let s = settings(cycle, period, Some(start));
                for offset in -200..200 {
                    let info = compute_cycle_info(&s, add_days(start, offset));
                    assert!(
                        (1..=cycle).contains(&info.day_of_cycle),
                        "cycle {} offset {} gave {}",
                        cycle,
                        offset,
                        info.day_of_cycle
                    );
                }
            }
        }
    }

    #[test]
    fn test_compute_is_idempotent() {
        let s = settings(31, 6, Some(date(2023, 11, 2)));
        let today = date(2024, 2, 14);

        assert_eq!(compute_cycle_info(&s, today), compute_cycle_info(&s, today));
    }

    #[test]
    fn test_wraps_into_next_cycle() {
        let s = settings(28, 5, Some(date(2024, 1, 1)));
        let info = compute_cycle_info(&s, date(2024, 1, 29));

        assert_eq!(info.day_of_cycle, 1);
        assert_eq!(info.next_period_date, date(2024, 2, 26));
    }

    #[test]
    fn test_out_of_domain_settings_are_clamped() {
        let s = settings(5, 9, Some(date(2024, 1, 1)));
        let position = compute_cycle_position(&s, date(2024, 1, 20));

        assert_eq!(position.cycle_length, 15);
        assert!((1..=15).contains(&position.day_of_cycle));
    }
}
