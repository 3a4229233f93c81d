//! Key-value slot abstraction.
//!
//! The reply store persists through an opaque, string-keyed value store.
//! All operations are synchronous. Implementations make a single `put`
//! atomic per key; file-backed ones also run `update` under a lock shared
//! with other processes.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::{AutoReplyError, Result};

/// A synchronous string-keyed value store.
pub trait KeyValueSlot: Send + Sync {
    /// Reads the value stored under `key`, `None` if never written.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Writes `value` under `key`, replacing any previous value.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Read-modify-write of one key.
    ///
    /// `f` receives the current value and returns the one to store. The
    /// default is a plain `get` then `put`; implementations shared between
    /// processes override it to hold their lock across both steps.
    fn update(
        &self,
        key: &str,
        f: &mut dyn FnMut(Option<String>) -> Result<String>,
    ) -> Result<()> {
        let next = f(self.get(key)?)?;
        self.put(key, &next)
    }

    /// Returns true if `key` has ever been written.
    fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// Reads `key`, returning `default` when it has never been written.
    fn get_or(&self, key: &str, default: &str) -> Result<String> {
        Ok(self.get(key)?.unwrap_or_else(|| default.to_string()))
    }
}

/// In-process slot, used by tests and as a throwaway store.
#[derive(Debug, Default)]
pub struct InMemorySlot {
    values: RwLock<HashMap<String, String>>,
}

impl InMemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a slot that already holds one raw value.
    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        let slot = Self::new();
        if let Ok(mut values) = slot.values.write() {
            values.insert(key.into(), value.into());
        }
        slot
    }
}

impl KeyValueSlot for InMemorySlot {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self
            .values
            .read()
            .map_err(|e| AutoReplyError::data_access(format!("slot lock poisoned: {}", e)))?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self
            .values
            .write()
            .map_err(|e| AutoReplyError::data_access(format!("slot lock poisoned: {}", e)))?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}
