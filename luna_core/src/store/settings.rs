//! Cycle settings persistence with file locking.

use super::fsutil::{read_locked, write_json_atomic};
use crate::{CycleSettings, Result};
use std::path::Path;

/// Load settings from a file with shared locking
///
/// Returns `None` if the file doesn't exist. A corrupted file is logged and
/// treated as absent so the caller falls back to defaults.
pub(super) fn load_settings(path: &Path) -> Result<Option<CycleSettings>> {
    let Some(contents) = read_locked(path)? else {
        tracing::debug!("No settings file at {:?}", path);
        return Ok(None);
    };

    match serde_json::from_str::<CycleSettings>(&contents) {
        Ok(settings) => {
            tracing::debug!("Loaded settings from {:?}", path);
            Ok(Some(settings))
        }
        Err(e) => {
            tracing::warn!(
                "Failed to parse settings file {:?}: {}. Using defaults.",
                path,
                e
            );
            Ok(None)
        }
    }
}

/// Save settings atomically
pub(super) fn save_settings(path: &Path, settings: &CycleSettings) -> Result<()> {
    write_json_atomic(path, settings)?;
    tracing::debug!("Saved settings for {} to {:?}", settings.user_id, path);
    Ok(())
}
