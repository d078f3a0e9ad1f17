//! Locked reads and atomic rewrites of whole JSON files.

use crate::{Error, Result};
use fs2::FileExt;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

thread_local! {
    /// Lock files this thread currently holds
    static HELD_LOCKS: RefCell<HashSet<PathBuf>> = RefCell::new(HashSet::new());
}

/// Exclusive advisory lock on a lock file, released on drop
#[derive(Debug)]
pub(crate) struct HeldLock {
    file: File,
    path: PathBuf,
}

impl Drop for HeldLock {
    fn drop(&mut self) {
        HELD_LOCKS.with(|held| held.borrow_mut().remove(&self.path));
        if let Err(e) = self.file.unlock() {
            tracing::warn!("Failed to release lock {:?}: {}", self.path, e);
        }
    }
}

/// Block until `path` is exclusively locked
///
/// Returns `None` when this thread already holds the lock, so nested
/// write operations on the same user do not deadlock.
pub(crate) fn lock_exclusive(path: &Path) -> Result<Option<HeldLock>> {
    if HELD_LOCKS.with(|held| held.borrow().contains(path)) {
        return Ok(None);
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(path)?;
    file.lock_exclusive()?;

    HELD_LOCKS.with(|held| held.borrow_mut().insert(path.to_path_buf()));
    Ok(Some(HeldLock {
        file,
        path: path.to_path_buf(),
    }))
}

/// Read a file under a shared lock, `None` if it does not exist
pub(crate) fn read_locked(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let mut contents = String::new();
    let read = std::io::BufReader::new(&file).read_to_string(&mut contents);
    file.unlock()?;
    read?;

    Ok(Some(contents))
}

/// Atomically replace `path` with the JSON form of `value`
///
/// Writes to a temp file in the same directory, syncs it, then renames it
/// over the original so readers never see a partial file.
pub(crate) fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| Error::Persistence(format!("{:?} has no parent directory", path)))?;
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}
