//! File-backed key-value slot.
//!
//! All keys of one slot live in a single JSON object on disk. Writes go
//! through a uniquely named temporary file and an atomic rename while an
//! exclusive lock on `<name>.lock` is held, so a `put` either fully lands or
//! not at all. The lock file is never removed: deleting it would let a
//! waiter and a newcomer lock two different inodes at once.

use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write as IoWrite;
use std::path::{Path, PathBuf};

use autoreply_core::error::{AutoReplyError, Result};
use autoreply_core::slot::KeyValueSlot;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

type SlotValues = BTreeMap<String, String>;

/// A [`KeyValueSlot`] persisted as `{ "key": "value", ... }` in one file.
#[derive(Debug, Clone)]
pub struct JsonFileSlot {
    path: PathBuf,
}

impl JsonFileSlot {
    /// Creates a slot handle; the file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Loads all values. A missing or blank file is an empty slot.
    fn load(&self) -> Result<SlotValues> {
        if !self.path.exists() {
            return Ok(SlotValues::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(SlotValues::new());
        }

        Ok(serde_json::from_str(&content)?)
    }

    /// Loads all values for a write. An unreadable file is replaced rather
    /// than blocking all writes.
    fn load_for_write(&self) -> SlotValues {
        self.load().unwrap_or_else(|e| {
            warn!("Slot file {:?} is unreadable, rewriting it: {}", self.path, e);
            SlotValues::new()
        })
    }

    /// Writes all values via a temp file in the same directory + rename.
    fn save(&self, values: &SlotValues) -> Result<()> {
        let parent = parent_dir(&self.path);
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(values)?;

        let mut tmp_file = NamedTempFile::new_in(parent)?;
        tmp_file.write_all(json.as_bytes())?;
        tmp_file.as_file().sync_all()?;
        tmp_file
            .persist(&self.path)
            .map_err(|e| AutoReplyError::from(e.error))?;
        Ok(())
    }
}

impl KeyValueSlot for JsonFileSlot {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut values = self.load()?;
        Ok(values.remove(key))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let _lock = FileLock::acquire(&self.path)?;

        let mut values = self.load_for_write();
        values.insert(key.to_string(), value.to_string());
        self.save(&values)?;

        debug!("Wrote slot key '{}' to {:?}", key, self.path);
        Ok(())
    }

    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        let _lock = FileLock::acquire(&self.path)?;

        let mut values = self.load_for_write();
        let next = f(values.remove(key))?;
        values.insert(key.to_string(), next);
        self.save(&values)?;

        debug!("Updated slot key '{}' in {:?}", key, self.path);
        Ok(())
    }
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Exclusive lock on `<path>.lock`, released on drop.
struct FileLock {
    file: File,
}

impl FileLock {
    fn acquire(path: &Path) -> Result<Self> {
        let lock_path = path.with_extension("lock");

        let parent = parent_dir(&lock_path);
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)?;

        fs2::FileExt::lock_exclusive(&file)
            .map_err(|e| AutoReplyError::data_access(format!("Failed to acquire lock: {}", e)))?;

        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}
