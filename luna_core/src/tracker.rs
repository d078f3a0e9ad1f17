//! Cycle tracker service.
//!
//! A stateless unit over an injected store: every call fetches what it
//! needs, runs the pure engine and returns values. Read paths never fail
//! for lack of data (missing or unreadable settings become defaults, a
//! month always projects); write paths return the store's errors.

use crate::calendar::project_month_aligned;
use crate::catalog::{default_catalog, SymptomCatalog};
use crate::datemath::{add_days, days_in_month, first_of_month};
use crate::phase::compute_cycle_info;
use crate::reconcile::{self, merge_logs, merge_period_logs, settings_for_write};
use crate::store::{validate_user_id, CycleStore};
use crate::{
    CalendarCell, CycleInfo, CycleSettings, DailyLog, DailyLogUpdate, Flow, PeriodEntry,
    PeriodLog, Result, SettingsUpdate, WeekStart,
};
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

/// Cycle tracking operations for any user, backed by `S`
pub struct CycleTracker<'a, S: CycleStore + ?Sized> {
    store: &'a S,
    defaults: CycleSettings,
    catalog: &'a SymptomCatalog,
    week_start: WeekStart,
}

impl<'a, S: CycleStore + ?Sized> CycleTracker<'a, S> {
    /// Tracker with 28/5 defaults, the built-in symptom catalog and
    /// Sunday-first calendars
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            defaults: CycleSettings::new(""),
            catalog: default_catalog(),
            week_start: WeekStart::Sunday,
        }
    }

    /// Use different lengths for users without stored settings
    pub fn with_default_lengths(mut self, cycle_length: u32, period_length: u32) -> Result<Self> {
        let mut defaults = CycleSettings::new("");
        defaults.average_cycle_length = cycle_length;
        defaults.average_period_length = period_length;
        defaults.validate()?;
        self.defaults = defaults;
        Ok(self)
    }

    pub fn with_week_start(mut self, week_start: WeekStart) -> Self {
        self.week_start = week_start;
        self
    }

    pub fn with_catalog(mut self, catalog: &'a SymptomCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    fn defaults_for(&self, user_id: &str) -> CycleSettings {
        CycleSettings {
            user_id: user_id.to_string(),
            ..self.defaults.clone()
        }
    }

    /// Settings for display; created with defaults on first access
    ///
    /// Store failures are logged and degrade to defaults. The period start
    /// anchor is brought up to the latest logged period if it lags behind.
    pub fn settings(&self, user_id: &str) -> CycleSettings {
        let settings = match self.store.fetch_settings(user_id) {
            Ok(Some(settings)) => settings.sanitized(),
            Ok(None) => self.create_default_settings(user_id),
            Err(e) => {
                tracing::warn!("Failed to load settings for {}: {}. Using defaults.", user_id, e);
                self.defaults_for(user_id)
            }
        };
        self.with_logged_anchor(user_id, settings)
    }

    fn create_default_settings(&self, user_id: &str) -> CycleSettings {
        let defaults = self.defaults_for(user_id);

        let created = self.store.lock_user(user_id).and_then(|_guard| {
            // Another writer may have won the race for the first save
            if let Some(existing) = self.store.fetch_settings(user_id)? {
                return Ok(existing.sanitized());
            }
            tracing::info!("No settings for {}, creating defaults", user_id);
            self.store.save_settings(&defaults)?;
            Ok(defaults.clone())
        });

        created.unwrap_or_else(|e| {
            tracing::warn!("Could not persist default settings for {}: {}", user_id, e);
            defaults
        })
    }

    fn with_logged_anchor(&self, user_id: &str, mut settings: CycleSettings) -> CycleSettings {
        let latest = match self.store.fetch_recent_periods(user_id, 1) {
            Ok(periods) => periods.into_iter().next(),
            Err(e) => {
                tracing::warn!("Failed to load period logs for {}: {}", user_id, e);
                None
            }
        };

        if let Some(latest) = latest {
            if settings
                .last_period_start
                .map_or(true, |current| latest.start_date > current)
            {
                tracing::debug!(
                    "Stored anchor {:?} for {} lags the period log, using {}",
                    settings.last_period_start,
                    user_id,
                    latest.start_date
                );
                settings.last_period_start = Some(latest.start_date);
            }
        }
        settings
    }

    /// Validate and persist a settings change
    pub fn update_settings(&self, user_id: &str, update: SettingsUpdate) -> Result<CycleSettings> {
        validate_user_id(user_id)?;

        let _guard = self.store.lock_user(user_id)?;
        let mut settings = settings_for_write(self.store, user_id, &self.defaults)?;
        update.apply_to(&mut settings);
        settings.validate()?;
        settings.updated_at = Some(Utc::now());

        self.store.save_settings(&settings)?;
        tracing::info!(
            "Updated settings for {}: cycle {}, period {}",
            user_id,
            settings.average_cycle_length,
            settings.average_period_length
        );
        Ok(settings)
    }

    /// Cycle position and predictions as of `today`
    pub fn cycle_info(&self, user_id: &str, today: NaiveDate) -> CycleInfo {
        compute_cycle_info(&self.settings(user_id), today)
    }

    /// Calendar month with predictions overlaid by logged periods and days
    ///
    /// Logs that cannot be read are skipped; the prediction is still shown.
    pub fn month_view(
        &self,
        user_id: &str,
        year: i32,
        month: u32,
        today: NaiveDate,
    ) -> Vec<CalendarCell> {
        let settings = self.settings(user_id);
        let info = compute_cycle_info(&settings, today);
        let cells = project_month_aligned(&settings, &info, year, month, today, self.week_start);

        let Some(first) = first_of_month(year, month) else {
            return cells;
        };
        let last = add_days(first, i64::from(days_in_month(first)) - 1);

        let cells = match self.store.fetch_recent_periods(user_id, usize::MAX) {
            Ok(periods) => {
                let overlapping: Vec<PeriodLog> = periods
                    .into_iter()
                    .filter(|p| p.start_date <= last && p.last_day() >= first)
                    .collect();
                merge_period_logs(cells, &overlapping)
            }
            Err(e) => {
                tracing::warn!("Failed to load period logs for {}: {}", user_id, e);
                cells
            }
        };

        match self.store.fetch_daily_logs(user_id, first, last) {
            Ok(logs) => merge_logs(cells, &logs),
            Err(e) => {
                tracing::warn!("Failed to load daily logs for {}: {}", user_id, e);
                cells
            }
        }
    }

    /// Most recent periods for history display
    pub fn recent_periods(&self, user_id: &str, count: usize) -> Result<Vec<PeriodLog>> {
        self.store.fetch_recent_periods(user_id, count)
    }

    pub fn daily_logs(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyLog>> {
        self.store.fetch_daily_logs(user_id, start, end)
    }

    pub fn log_period_start(&self, user_id: &str, date: NaiveDate, flow: Flow) -> Result<Uuid> {
        reconcile::log_period_start(self.store, user_id, date, flow, &self.defaults)
    }

    pub fn log_period(&self, user_id: &str, entry: PeriodEntry) -> Result<Uuid> {
        reconcile::log_period(self.store, user_id, entry, &self.defaults)
    }

    pub fn log_cycle_day(
        &self,
        user_id: &str,
        date: NaiveDate,
        update: DailyLogUpdate,
    ) -> Result<DailyLog> {
        reconcile::log_cycle_day(self.store, self.catalog, user_id, date, update)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::find_day;
    use crate::store::{DailyLogStore, FileStore, PeriodLogStore, SettingsStore, UserLock};
    use crate::{DaySource, Error, Phase};
    use std::cell::{Cell, RefCell};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    /// In-memory period log whose reads, writes or settings saves fail
    #[derive(Default)]
    struct FailingStore {
        fail_reads: bool,
        fail_writes: bool,
        fail_settings_save: bool,
        write_attempts: Cell<usize>,
        periods: RefCell<Vec<PeriodLog>>,
    }

    impl FailingStore {
        fn read_result<T>(&self, value: T) -> Result<T> {
            if self.fail_reads {
                Err(Error::Persistence("backend unavailable".into()))
            } else {
                Ok(value)
            }
        }

        fn write_result(&self) -> Result<()> {
            self.write_attempts.set(self.write_attempts.get() + 1);
            if self.fail_writes {
                Err(Error::Persistence("write rejected".into()))
            } else {
                Ok(())
            }
        }
    }

    impl SettingsStore for FailingStore {
        fn fetch_settings(&self, _user_id: &str) -> Result<Option<CycleSettings>> {
            self.read_result(None)
        }

        fn save_settings(&self, _settings: &CycleSettings) -> Result<()> {
            self.write_result()?;
            if self.fail_settings_save {
                return Err(Error::Persistence("settings rejected".into()));
            }
            Ok(())
        }
    }

    impl PeriodLogStore for FailingStore {
        fn append_period(&self, log: &PeriodLog) -> Result<()> {
            self.write_result()?;
            self.periods.borrow_mut().push(log.clone());
            Ok(())
        }

        fn fetch_recent_periods(&self, _user_id: &str, count: usize) -> Result<Vec<PeriodLog>> {
            let mut periods = self.periods.borrow().clone();
            periods.sort_by(|a, b| b.start_date.cmp(&a.start_date));
            periods.truncate(count);
            self.read_result(periods)
        }
    }

    impl UserLock for FailingStore {}

    impl DailyLogStore for FailingStore {
        fn fetch_daily_logs(
            &self,
            _user_id: &str,
            _start: NaiveDate,
            _end: NaiveDate,
        ) -> Result<Vec<DailyLog>> {
            self.read_result(Vec::new())
        }

        fn upsert_daily_log(&self, _log: &DailyLog) -> Result<()> {
            self.write_result()
        }
    }

    #[test]
    fn test_first_access_creates_default_settings() {
        crate::logging::init_test();
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        let tracker = CycleTracker::new(&store);

        let settings = tracker.settings("alice");
        assert_eq!(settings.average_cycle_length, 28);
        assert_eq!(store.fetch_settings("alice").unwrap(), Some(settings));
    }

    #[test]
    fn test_configured_default_lengths() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        let tracker = CycleTracker::new(&store).with_default_lengths(30, 4).unwrap();

        let settings = tracker.settings("alice");
        assert_eq!(settings.average_cycle_length, 30);
        assert_eq!(settings.average_period_length, 4);

        assert!(CycleTracker::new(&store).with_default_lengths(20, 20).is_err());
    }

    #[test]
    fn test_unreadable_store_degrades_to_defaults() {
        let store = FailingStore {
            fail_reads: true,
            ..Default::default()
        };
        let tracker = CycleTracker::new(&store);
        let today = date(2024, 5, 20);

        let info = tracker.cycle_info("alice", today);
        assert_eq!(info.day_of_cycle, 15);

        let cells = tracker.month_view("alice", 2024, 5, today);
        assert_eq!(cells.iter().filter_map(CalendarCell::as_day).count(), 31);
    }

    #[test]
    fn test_write_failures_propagate() {
        let store = FailingStore {
            fail_writes: true,
            ..Default::default()
        };
        let tracker = CycleTracker::new(&store);
        let day = date(2024, 5, 20);

        assert!(tracker.log_period_start("alice", day, Flow::Heavy).is_err());
        assert!(tracker
            .log_cycle_day("alice", day, DailyLogUpdate::default())
            .is_err());
        assert!(tracker
            .update_settings(
                "alice",
                SettingsUpdate {
                    average_cycle_length: Some(30),
                    ..Default::default()
                }
            )
            .is_err());
        assert_eq!(store.write_attempts.get(), 3);
    }

    #[test]
    fn test_invalid_settings_update_rejected_before_write() {
        let store = FailingStore::default();
        let tracker = CycleTracker::new(&store);

        let result = tracker.update_settings(
            "alice",
            SettingsUpdate {
                average_period_length: Some(28),
                ..Default::default()
            },
        );

        assert!(result.unwrap_err().is_validation());
        assert_eq!(store.write_attempts.get(), 0);
    }

    #[test]
    fn test_logging_period_resets_cycle() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        let tracker = CycleTracker::new(&store);

        tracker
            .update_settings(
                "alice",
                SettingsUpdate {
                    last_period_start: Some(date(2024, 1, 1)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(tracker.cycle_info("alice", date(2024, 2, 2)).day_of_cycle, 5);

        tracker
            .log_period_start("alice", date(2024, 2, 2), Flow::Medium)
            .unwrap();
        let info = tracker.cycle_info("alice", date(2024, 2, 2));
        assert_eq!(info.day_of_cycle, 1);
        assert_eq!(info.current_phase, Phase::Menstrual);
    }

    #[test]
    fn test_month_view_overlays_logs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        let tracker = CycleTracker::new(&store).with_week_start(WeekStart::Monday);
        let today = date(2024, 1, 10);

        tracker
            .log_period(
                "alice",
                PeriodEntry {
                    start_date: date(2024, 1, 1),
                    end_date: Some(date(2024, 1, 6)),
                    flow: Flow::Medium,
                    notes: None,
                },
            )
            .unwrap();
        tracker
            .log_cycle_day(
                "alice",
                date(2024, 1, 10),
                DailyLogUpdate {
                    symptoms: Some(["headache".to_string()].into()),
                    ..Default::default()
                },
            )
            .unwrap();

        let cells = tracker.month_view("alice", 2024, 1, today);
        // 2024-01-01 is a Monday
        assert_eq!(cells[0].day_number(), 1);

        let jan6 = find_day(&cells, date(2024, 1, 6)).unwrap();
        assert!(jan6.is_period);
        assert_eq!(jan6.source, DaySource::Logged);

        let jan10 = find_day(&cells, today).unwrap();
        assert!(jan10.is_today);
        assert!(jan10.log.as_ref().unwrap().symptoms.contains("headache"));

        let jan15 = find_day(&cells, date(2024, 1, 15)).unwrap();
        assert_eq!(jan15.source, DaySource::Predicted);
    }

    #[test]
    fn test_period_kept_once_when_anchor_save_fails() {
        let store = FailingStore {
            fail_settings_save: true,
            ..Default::default()
        };
        let tracker = CycleTracker::new(&store);
        let start = date(2024, 5, 2);

        let id = tracker.log_period_start("alice", start, Flow::Medium).unwrap();

        let stored = store.periods.borrow().clone();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].id, id);

        // anchor is recovered from the period log on read
        let info = tracker.cycle_info("alice", date(2024, 5, 4));
        assert_eq!(info.day_of_cycle, 3);
        assert_eq!(info.current_phase, Phase::Menstrual);
    }

    #[test]
    fn test_settings_read_failure_writes_no_period() {
        let store = FailingStore {
            fail_reads: true,
            ..Default::default()
        };
        let tracker = CycleTracker::new(&store);

        assert!(tracker
            .log_period_start("alice", date(2024, 5, 2), Flow::Medium)
            .is_err());
        assert!(store.periods.borrow().is_empty());
        assert_eq!(store.write_attempts.get(), 0);
    }

    #[test]
    fn test_lagging_anchor_follows_period_log() {
        let temp_dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp_dir.path());
        let tracker = CycleTracker::new(&store);

        tracker
            .log_period_start("alice", date(2024, 2, 1), Flow::Medium)
            .unwrap();
        let mut stale = store.fetch_settings("alice").unwrap().unwrap();
        stale.last_period_start = Some(date(2024, 1, 1));
        store.save_settings(&stale).unwrap();

        assert_eq!(
            tracker.settings("alice").last_period_start,
            Some(date(2024, 2, 1))
        );
    }
}
