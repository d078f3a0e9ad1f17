//! Next-period, ovulation and fertile-window predictions.
//!
//! Fixed-formula model anchored on the current cycle position:
//! - Next period starts the day after the cycle's last day
//! - Ovulation is the cycle's ovulation day (may already be past)
//! - Fertile window runs five days before ovulation to one day after

use crate::datemath::add_days;
use crate::phase::CyclePosition;
use chrono::NaiveDate;

pub const FERTILE_DAYS_BEFORE_OVULATION: i64 = 5;
pub const FERTILE_DAYS_AFTER_OVULATION: i64 = 1;

/// Predicted dates derived from a cycle position
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Predictions {
    pub next_period_date: NaiveDate,
    pub ovulation_date: NaiveDate,
    pub fertile_window_start: NaiveDate,
    pub fertile_window_end: NaiveDate,
}

/// Predict upcoming dates from where `today` sits in the cycle
pub fn predict(position: &CyclePosition, today: NaiveDate) -> Predictions {
    let day = i64::from(position.day_of_cycle);

    let days_until_next_period = i64::from(position.cycle_length) - day + 1;
    let days_until_ovulation = i64::from(position.ovulation_day()) - day;

    let ovulation_date = add_days(today, days_until_ovulation);

    Predictions {
        next_period_date: add_days(today, days_until_next_period),
        ovulation_date,
        fertile_window_start: add_days(ovulation_date, -FERTILE_DAYS_BEFORE_OVULATION),
        fertile_window_end: add_days(ovulation_date, FERTILE_DAYS_AFTER_OVULATION),
    }
}
