//! Month projection of the cycle for calendar display.
//!
//! Every day of the requested month is placed on the cycle by its signed
//! calendar-day distance from "today", so past and future months line up
//! with the current cycle. The cell for today always reproduces the
//! `CycleInfo` it was projected from.

use crate::datemath::{
    add_days, days_between, days_in_month, first_of_month, wrap_cycle_day, PhaseThresholds,
};
use crate::{CalendarCell, CalendarDay, CycleInfo, CycleSettings, DaySource, WeekStart};
use chrono::{Datelike, NaiveDate};

/// Columns in the month grid
pub const DAYS_PER_WEEK: usize = 7;

/// Project a month onto a Sunday-first grid
pub fn project_month(
    settings: &CycleSettings,
    today_info: &CycleInfo,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Vec<CalendarCell> {
    project_month_aligned(settings, today_info, year, month, today, WeekStart::Sunday)
}

/// Project a month onto a grid whose first column is `week_start`
///
/// Returns an empty projection for an invalid `(year, month)`.
pub fn project_month_aligned(
    settings: &CycleSettings,
    today_info: &CycleInfo,
    year: i32,
    month: u32,
    today: NaiveDate,
    week_start: WeekStart,
) -> Vec<CalendarCell> {
    let Some(first) = first_of_month(year, month) else {
        tracing::warn!("Cannot project invalid month {}-{:02}", year, month);
        return Vec::new();
    };

    let settings = settings.clone().sanitized();
    let cycle_length = settings.average_cycle_length;
    let thresholds = PhaseThresholds::new(cycle_length, settings.average_period_length);

    let offset = leading_placeholders(first, week_start);
    let day_count = days_in_month(first);

    let mut cells = Vec::with_capacity(offset + day_count as usize);
    cells.extend(std::iter::repeat(CalendarCell::Placeholder).take(offset));

    for day in 1..=day_count {
        let date = add_days(first, i64::from(day) - 1);
        let date_diff = days_between(today, date);
        let cycle_day = wrap_cycle_day(today_info.day_of_cycle, date_diff, cycle_length);

        cells.push(CalendarCell::Day(CalendarDay {
            day,
            date,
            cycle_day,
            phase: thresholds.classify(cycle_day),
            is_period: cycle_day <= thresholds.menstrual_end,
            is_fertile: thresholds.is_fertile(cycle_day),
            is_today: date == today,
            source: DaySource::Predicted,
            log: None,
        }));
    }

    tracing::debug!(
        "Projected {}-{:02}: {} placeholders, {} days",
        year,
        month,
        offset,
        day_count
    );

    cells
}

/// Number of empty cells before day 1 of the month
pub fn leading_placeholders(first: NaiveDate, week_start: WeekStart) -> usize {
    let weekday = first.weekday();
    let offset = match week_start {
        WeekStart::Sunday => weekday.num_days_from_sunday(),
        WeekStart::Monday => weekday.num_days_from_monday(),
    };
    offset as usize
}

/// Split a projection into display rows of seven cells (last row may be short)
pub fn weeks(cells: &[CalendarCell]) -> impl Iterator<Item = &[CalendarCell]> {
    cells.chunks(DAYS_PER_WEEK)
}

/// Find the cell for a date, if the projection covers it
pub fn find_day(cells: &[CalendarCell], date: NaiveDate) -> Option<&CalendarDay> {
    cells
        .iter()
        .filter_map(CalendarCell::as_day)
        .find(|day| day.date == date)
}
