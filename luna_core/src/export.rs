//! CSV export of period history.

use crate::{Error, PeriodLog, Result};
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    id: String,
    start_date: String,
    end_date: Option<String>,
    length_days: Option<i64>,
    flow: String,
    notes: Option<String>,
    logged_at: String,
}

impl From<&PeriodLog> for CsvRow {
    fn from(log: &PeriodLog) -> Self {
        CsvRow {
            id: log.id.to_string(),
            start_date: log.start_date.to_string(),
            end_date: log.end_date.map(|d| d.to_string()),
            length_days: log
                .end_date
                .map(|end| (end - log.start_date).num_days() + 1),
            flow: log.flow.to_string(),
            notes: log.notes.clone(),
            logged_at: log.logged_at.to_rfc3339(),
        }
    }
}

/// Write period logs to a CSV file, atomically replacing any existing file
///
/// Rows are written in the order given. Returns the number of rows.
pub fn export_periods_csv(logs: &[PeriodLog], csv_path: &Path) -> Result<usize> {
    let parent = match csv_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut temp = NamedTempFile::new_in(parent)?;
    {
        let mut writer = csv::Writer::from_writer(temp.as_file_mut());
        for log in logs {
            writer.serialize(CsvRow::from(log))?;
        }
        writer.flush()?;
    }
    temp.as_file().sync_all()?;
    temp.persist(csv_path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} periods to {:?}", logs.len(), csv_path);
    Ok(logs.len())
}
