//! Persistence collaborators for settings, period logs and daily logs.
//!
//! The engine only talks to the traits defined here. `FileStore` is the
//! bundled implementation: one directory per user holding
//! - `settings.json` (rewritten atomically)
//! - `periods.jsonl` (append-only, one log per line)
//! - `daily.json` (upserted by date, rewritten atomically)
//! - `.lock` (held exclusively by every write)

mod daily;
mod fsutil;
mod periods;
mod settings;

use crate::{CycleSettings, DailyLog, Error, PeriodLog, Result};
use chrono::NaiveDate;
use std::path::{Path, PathBuf};

/// Per-user cycle configuration storage
pub trait SettingsStore {
    /// Stored settings, `None` when the user has none yet
    fn fetch_settings(&self, user_id: &str) -> Result<Option<CycleSettings>>;

    fn save_settings(&self, settings: &CycleSettings) -> Result<()>;
}

/// Append-only period history
pub trait PeriodLogStore {
    fn append_period(&self, log: &PeriodLog) -> Result<()>;

    /// Up to `count` logs, most recent start date first
    fn fetch_recent_periods(&self, user_id: &str, count: usize) -> Result<Vec<PeriodLog>>;
}

/// Daily flow/symptom entries keyed by calendar date
pub trait DailyLogStore {
    /// Logs with `start <= date <= end`, ordered by date
    fn fetch_daily_logs(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyLog>>;

    /// Insert or replace the entry for `log.date`
    fn upsert_daily_log(&self, log: &DailyLog) -> Result<()>;

    fn fetch_daily_log(&self, user_id: &str, date: NaiveDate) -> Result<Option<DailyLog>> {
        Ok(self.fetch_daily_logs(user_id, date, date)?.into_iter().next())
    }
}

/// Proof of exclusive write access to one user's records
///
/// Released when dropped.
#[derive(Debug)]
pub struct UserGuard {
    _held: Option<fsutil::HeldLock>,
}

impl UserGuard {
    /// Guard for stores that need no cross-process locking
    pub fn unlocked() -> Self {
        Self { _held: None }
    }
}

/// Serializes read-modify-write sequences on one user's records
pub trait UserLock {
    /// Hold exclusive write access to `user_id` until the guard drops
    ///
    /// Must be reentrant on the calling thread.
    fn lock_user(&self, _user_id: &str) -> Result<UserGuard> {
        Ok(UserGuard::unlocked())
    }
}

/// Everything the cycle tracker needs from persistence
pub trait CycleStore: SettingsStore + PeriodLogStore + DailyLogStore + UserLock {}

impl<T: SettingsStore + PeriodLogStore + DailyLogStore + UserLock> CycleStore for T {}

/// Reject user ids that are empty or unsafe as a directory name
pub fn validate_user_id(user_id: &str) -> Result<()> {
    let valid = !user_id.is_empty()
        && user_id.len() <= 64
        && user_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(())
    } else {
        Err(Error::Validation(format!("invalid user id '{}'", user_id)))
    }
}

/// File-backed store rooted at a data directory
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding one user's files
    pub fn user_dir(&self, user_id: &str) -> Result<PathBuf> {
        validate_user_id(user_id)?;
        Ok(self.root.join("users").join(user_id))
    }

    pub fn settings_path(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self.user_dir(user_id)?.join("settings.json"))
    }

    pub fn periods_path(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self.user_dir(user_id)?.join("periods.jsonl"))
    }

    pub fn daily_path(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self.user_dir(user_id)?.join("daily.json"))
    }

    fn lock_path(&self, user_id: &str) -> Result<PathBuf> {
        Ok(self.user_dir(user_id)?.join(".lock"))
    }

    /// Every period ever logged for the user, most recent start first
    pub fn all_periods(&self, user_id: &str) -> Result<Vec<PeriodLog>> {
        let mut logs = periods::read_periods(&self.periods_path(user_id)?)?;
        periods::sort_most_recent_first(&mut logs);
        Ok(logs)
    }
}

impl UserLock for FileStore {
    fn lock_user(&self, user_id: &str) -> Result<UserGuard> {
        let held = fsutil::lock_exclusive(&self.lock_path(user_id)?)?;
        Ok(UserGuard { _held: held })
    }
}

impl SettingsStore for FileStore {
    fn fetch_settings(&self, user_id: &str) -> Result<Option<CycleSettings>> {
        settings::load_settings(&self.settings_path(user_id)?)
    }

    fn save_settings(&self, settings: &CycleSettings) -> Result<()> {
        let _guard = self.lock_user(&settings.user_id)?;
        settings::save_settings(&self.settings_path(&settings.user_id)?, settings)
    }
}

impl PeriodLogStore for FileStore {
    fn append_period(&self, log: &PeriodLog) -> Result<()> {
        let _guard = self.lock_user(&log.user_id)?;
        periods::append_period(&self.periods_path(&log.user_id)?, log)
    }

    fn fetch_recent_periods(&self, user_id: &str, count: usize) -> Result<Vec<PeriodLog>> {
        let mut logs = self.all_periods(user_id)?;
        logs.truncate(count);
        Ok(logs)
    }
}

impl DailyLogStore for FileStore {
    fn fetch_daily_logs(
        &self,
        user_id: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyLog>> {
        let logs = daily::read_daily_logs(&self.daily_path(user_id)?)?;
        Ok(logs
            .into_iter()
            .filter(|log| log.date >= start && log.date <= end)
            .collect())
    }

    fn upsert_daily_log(&self, log: &DailyLog) -> Result<()> {
        let _guard = self.lock_user(&log.user_id)?;
        daily::upsert_daily_log(&self.daily_path(&log.user_id)?, log)
    }
}
