//! Calendar-day arithmetic shared by the phase, prediction and calendar code.
//!
//! All values here are whole local calendar days; no instants or time zones.

use crate::Phase;
use chrono::{Datelike, Duration, NaiveDate};

/// Remainder that is always in `[0, n)`, also for negative `x`
///
/// `n` must be positive.
pub fn positive_mod(x: i64, n: i64) -> i64 {
    ((x % n) + n) % n
}

/// Signed number of calendar days from `from` to `to`
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Shift a date by a signed number of days
///
/// Saturates at the ends of the representable calendar.
pub fn add_days(date: NaiveDate, days: i64) -> NaiveDate {
    Duration::try_days(days)
        .and_then(|delta| date.checked_add_signed(delta))
        .unwrap_or(if days < 0 { NaiveDate::MIN } else { NaiveDate::MAX })
}

/// 1-indexed cycle day reached `offset` days after cycle day `day`
pub fn wrap_cycle_day(day: u32, offset: i64, cycle_length: u32) -> u32 {
    let wrapped = positive_mod(i64::from(day) + offset - 1, i64::from(cycle_length));
    // Result is in [0, cycle_length) so it always fits
    wrapped as u32 + 1
}

/// Predicted ovulation day: half the cycle, halves rounded up
pub fn ovulation_day(cycle_length: u32) -> u32 {
    (cycle_length + 1) / 2
}

/// Inclusive upper cycle days of the first three phases
///
/// Kept monotone: when the period reaches into the ovulation window the
/// follicular range is empty rather than inverted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseThresholds {
    pub menstrual_end: u32,
    pub follicular_end: u32,
    pub ovulatory_end: u32,
    pub ovulation_day: u32,
}

impl PhaseThresholds {
    pub fn new(cycle_length: u32, period_length: u32) -> Self {
        let ovulation_day = ovulation_day(cycle_length);
        let menstrual_end = period_length;
        let follicular_end = ovulation_day.saturating_sub(3).max(menstrual_end);
        let ovulatory_end = (ovulation_day + 2).max(follicular_end);

        if ovulation_day.saturating_sub(3) < menstrual_end {
            tracing::debug!(
                "Period length {} overlaps ovulation window of a {}-day cycle; no follicular days",
                period_length,
                cycle_length
            );
        }

        Self {
            menstrual_end,
            follicular_end,
            ovulatory_end,
            ovulation_day,
        }
    }

    pub fn classify(&self, cycle_day: u32) -> Phase {
        if cycle_day <= self.menstrual_end {
            Phase::Menstrual
        } else if cycle_day <= self.follicular_end {
            Phase::Follicular
        } else if cycle_day <= self.ovulatory_end {
            Phase::Ovulatory
        } else {
            Phase::Luteal
        }
    }

    /// Late-follicular/ovulatory band shown as fertile on the calendar
    pub fn is_fertile(&self, cycle_day: u32) -> bool {
        cycle_day + 2 >= self.ovulation_day && cycle_day <= self.ovulation_day
    }
}

/// First day of the given month, `None` for an invalid month
pub fn first_of_month(year: i32, month: u32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, 1)
}

/// Number of days in the month starting at `first`
pub fn days_in_month(first: NaiveDate) -> u32 {
    let next = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    match next {
        Some(next) => days_between(first, next) as u32,
        // Only unreachable at the very end of chrono's supported range
        None => 31,
    }
}
