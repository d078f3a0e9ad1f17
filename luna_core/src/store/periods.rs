//! Append-only period log in JSON Lines form.
//!
//! Each logged period is one line; appends take an exclusive lock so two
//! writers never interleave partial lines.

use crate::{PeriodLog, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

pub(super) fn append_period(path: &Path, log: &PeriodLog) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file = OpenOptions::new().create(true).append(true).open(path)?;
    file.lock_exclusive()?;

    let mut writer = std::io::BufWriter::new(&file);
    let line = serde_json::to_string(log)?;
    writer.write_all(line.as_bytes())?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    drop(writer);

    file.sync_all()?;
    file.unlock()?;

    tracing::debug!("Appended period {} starting {}", log.id, log.start_date);
    Ok(())
}

/// Read every period log in file order; unparseable lines are skipped
pub(super) fn read_periods(path: &Path) -> Result<Vec<PeriodLog>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut logs = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<PeriodLog>(&line) {
            Ok(log) => logs.push(log),
            Err(e) => {
                tracing::warn!("Failed to parse period log at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} period logs from {:?}", logs.len(), path);
    Ok(logs)
}

/// Most recent start date first; equal starts by most recently logged
pub(super) fn sort_most_recent_first(logs: &mut [PeriodLog]) {
    logs.sort_by(|a, b| {
        b.start_date
            .cmp(&a.start_date)
            .then_with(|| b.logged_at.cmp(&a.logged_at))
    });
}
