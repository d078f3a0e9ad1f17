//! Reconciling logged facts with predictions.
//!
//! Projections are predictions; anything the user actually logged for a
//! date replaces the predicted period flag for that date. The write side
//! (`log_period`, `log_cycle_day`) lives here too since it decides how new
//! facts move the cycle anchor.

use crate::catalog::SymptomCatalog;
use crate::store::{validate_user_id, DailyLogStore, PeriodLogStore, SettingsStore, UserLock};
use crate::{
    CalendarCell, CycleSettings, DailyLog, DailyLogUpdate, DaySource, Flow, PeriodEntry,
    PeriodLog, Result,
};
use chrono::{NaiveDate, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// Overlay daily logs onto a projection; logged days always win
pub fn merge_logs(mut cells: Vec<CalendarCell>, daily_logs: &[DailyLog]) -> Vec<CalendarCell> {
    let by_date: HashMap<NaiveDate, &DailyLog> =
        daily_logs.iter().map(|log| (log.date, log)).collect();

    for day in cells.iter_mut().filter_map(CalendarCell::as_day_mut) {
        if let Some(log) = by_date.get(&day.date) {
            day.is_period = log.marks_period();
            day.source = DaySource::Logged;
            day.log = Some((*log).clone());
        }
    }

    cells
}

/// Mark the days covered by logged periods as actual period days
///
/// Apply before `merge_logs`: a daily entry for the same date is more
/// specific and overrides the period range.
pub fn merge_period_logs(mut cells: Vec<CalendarCell>, periods: &[PeriodLog]) -> Vec<CalendarCell> {
    for day in cells.iter_mut().filter_map(CalendarCell::as_day_mut) {
        if periods.iter().any(|p| p.covers(day.date)) {
            day.is_period = true;
            day.source = DaySource::Logged;
        }
    }

    cells
}

/// Settings for a write path: absent means defaults, store errors propagate
pub(crate) fn settings_for_write<S: SettingsStore + ?Sized>(
    store: &S,
    user_id: &str,
    defaults: &CycleSettings,
) -> Result<CycleSettings> {
    Ok(store.fetch_settings(user_id)?.unwrap_or_else(|| CycleSettings {
        user_id: user_id.to_string(),
        ..defaults.clone()
    }))
}

/// Record a period and advance `last_period_start` if it is the latest
///
/// The anchor follows the greatest start date across all logs, so
/// backfilling an older period never moves it backwards. Once the log is
/// stored the call succeeds: a failed anchor update is only warned about,
/// since readers reconcile the anchor against the period log.
pub fn log_period<S>(
    store: &S,
    user_id: &str,
    entry: PeriodEntry,
    defaults: &CycleSettings,
) -> Result<Uuid>
where
    S: SettingsStore + PeriodLogStore + UserLock + ?Sized,
{
    validate_user_id(user_id)?;
    entry.validate()?;

    let _guard = store.lock_user(user_id)?;
    let settings = settings_for_write(store, user_id, defaults)?;

    let log = PeriodLog {
        id: Uuid::new_v4(),
        user_id: user_id.to_string(),
        start_date: entry.start_date,
        end_date: entry.end_date,
        flow: entry.flow,
        notes: entry.notes,
        logged_at: Utc::now(),
    };
    store.append_period(&log)?;

    if let Err(e) = advance_anchor(store, settings, log.start_date) {
        tracing::warn!(
            "Period {} stored but last period start for {} not updated: {}",
            log.id,
            user_id,
            e
        );
    }

    Ok(log.id)
}

fn advance_anchor<S>(store: &S, mut settings: CycleSettings, logged_start: NaiveDate) -> Result<()>
where
    S: SettingsStore + PeriodLogStore + ?Sized,
{
    let latest_start = store
        .fetch_recent_periods(&settings.user_id, 1)?
        .first()
        .map_or(logged_start, |p| p.start_date.max(logged_start));

    let advances = settings
        .last_period_start
        .map_or(true, |current| latest_start > current);

    if !advances {
        tracing::info!(
            "Period starting {} is not the latest (anchor stays {:?})",
            logged_start,
            settings.last_period_start
        );
        return Ok(());
    }

    tracing::info!(
        "Advancing last period start for {} from {:?} to {}",
        settings.user_id,
        settings.last_period_start,
        latest_start
    );
    settings.last_period_start = Some(latest_start);
    settings.updated_at = Some(Utc::now());
    store.save_settings(&settings)
}

/// Record the start of a period with the given flow
pub fn log_period_start<S>(
    store: &S,
    user_id: &str,
    date: NaiveDate,
    flow: Flow,
    defaults: &CycleSettings,
) -> Result<Uuid>
where
    S: SettingsStore + PeriodLogStore + UserLock + ?Sized,
{
    log_period(store, user_id, PeriodEntry::starting(date, flow), defaults)
}

/// Upsert the daily entry for `date`
///
/// Supplied fields replace stored ones; omitted fields keep their stored
/// values. Symptoms are normalized through the catalog.
pub fn log_cycle_day<S>(
    store: &S,
    catalog: &SymptomCatalog,
    user_id: &str,
    date: NaiveDate,
    update: DailyLogUpdate,
) -> Result<DailyLog>
where
    S: DailyLogStore + UserLock + ?Sized,
{
    validate_user_id(user_id)?;

    let _guard = store.lock_user(user_id)?;
    let mut log = store
        .fetch_daily_log(user_id, date)?
        .unwrap_or_else(|| DailyLog::empty(user_id, date));

    if let Some(flow) = update.flow {
        log.flow = Some(flow);
    }
    if let Some(symptoms) = update.symptoms {
        log.symptoms = catalog.normalize_all(&symptoms)?;
    }
    if let Some(notes) = update.notes {
        let trimmed = notes.trim();
        log.notes = (!trimmed.is_empty()).then(|| trimmed.to_string());
    }

    store.upsert_daily_log(&log)?;
    tracing::info!("Logged {} for {}", date, user_id);
    Ok(log)
}
