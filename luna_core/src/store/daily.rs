//! Daily log file: one JSON array per user, upserted by date.

use super::fsutil::{read_locked, write_json_atomic};
use crate::{DailyLog, Error, Result};
use std::path::Path;

/// Read all daily logs, ordered by date
///
/// A missing file is an empty history. A corrupted file is an error: it is
/// rewritten on the next upsert, so it must not be silently replaced.
pub(super) fn read_daily_logs(path: &Path) -> Result<Vec<DailyLog>> {
    let Some(contents) = read_locked(path)? else {
        return Ok(Vec::new());
    };
    if contents.trim().is_empty() {
        return Ok(Vec::new());
    }

    let mut logs: Vec<DailyLog> = serde_json::from_str(&contents).map_err(|e| {
        Error::Persistence(format!("daily log file {:?} is unreadable: {}", path, e))
    })?;
    logs.sort_by_key(|log| log.date);
    Ok(logs)
}

/// Insert or replace the entry for the log's date
pub(super) fn upsert_daily_log(path: &Path, log: &DailyLog) -> Result<()> {
    let mut logs = read_daily_logs(path)?;

    match logs.binary_search_by_key(&log.date, |existing| existing.date) {
        Ok(idx) => logs[idx] = log.clone(),
        Err(idx) => logs.insert(idx, log.clone()),
    }

    write_json_atomic(path, &logs)?;
    tracing::debug!("Upserted daily log for {} ({} entries)", log.date, logs.len());
    Ok(())
}
