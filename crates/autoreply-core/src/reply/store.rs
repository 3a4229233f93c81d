//! Persisted reply history.
//!
//! The whole history lives as one JSON array under [`REPLY_HISTORY_KEY`] in a
//! [`KeyValueSlot`]. Every mutation reads, modifies and rewrites the full
//! array through [`KeyValueSlot::update`] while holding the store's write
//! lock.

use std::sync::{Arc, Mutex, PoisonError};

use tracing::{debug, info, warn};

use super::model::{InvalidReply, ReplyEntry, ReplyHistory};
use crate::error::Result;
use crate::slot::KeyValueSlot;

/// Slot key holding the serialized history.
pub const REPLY_HISTORY_KEY: &str = "user_custom_reply_all";

/// Outcome of reading the history from the slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredHistory {
    /// The key has never been written.
    Missing,
    /// A well-formed history, possibly empty.
    Parsed(ReplyHistory),
    /// The stored value was unreadable or malformed and is treated as empty.
    Recovered { reason: String },
}

impl StoredHistory {
    pub fn into_history(self) -> ReplyHistory {
        match self {
            Self::Parsed(history) => history,
            Self::Missing | Self::Recovered { .. } => ReplyHistory::new(),
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, Self::Recovered { .. })
    }
}

/// Bounded, ordered store of user-entered replies.
pub struct ReplyStore {
    slot: Arc<dyn KeyValueSlot>,
    write_lock: Mutex<()>,
}

impl ReplyStore {
    /// Wraps `slot` without seeding it.
    pub fn new(slot: Arc<dyn KeyValueSlot>) -> Self {
        Self {
            slot,
            write_lock: Mutex::new(()),
        }
    }

    /// Opens the store and seeds it with `default_reply` if the slot has
    /// never held a history.
    pub fn open(slot: Arc<dyn KeyValueSlot>, default_reply: &str) -> Result<Self> {
        let store = Self::new(slot);
        if !store.slot.contains(REPLY_HISTORY_KEY)? {
            match store.set_reply(default_reply)? {
                Some(_) => info!("Seeded reply history with the configured default"),
                None => warn!(
                    "Configured default reply is not a valid reply, history left empty"
                ),
            }
        }
        Ok(store)
    }

    /// Checks the reply rules: non-empty and at most 500 characters.
    pub fn is_valid(text: &str) -> bool {
        ReplyEntry::validate(text).is_ok()
    }

    /// Like [`ReplyStore::is_valid`], with the reason for rejection.
    pub fn validate(text: &str) -> std::result::Result<(), InvalidReply> {
        ReplyEntry::validate(text)
    }

    /// Appends `text` as the current reply.
    ///
    /// Returns `Ok(None)` without touching storage when `text` is invalid.
    pub fn set_reply(&self, text: &str) -> Result<Option<String>> {
        let entry = match ReplyEntry::new(text) {
            Ok(entry) => entry,
            Err(reason) => {
                debug!("Rejected reply: {}", reason);
                return Ok(None);
            }
        };

        let _guard = self
            .write_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        self.slot.update(REPLY_HISTORY_KEY, &mut |raw| {
            let mut history = parse_history(raw).into_history();
            if let Some(evicted) = history.push(entry.clone()) {
                debug!("Evicted oldest reply ({} chars)", evicted.as_str().chars().count());
            }
            debug!("Storing reply history with {} entries", history.len());
            Ok(serde_json::to_string(&history)?)
        })?;

        Ok(Some(text.to_string()))
    }

    /// The most recently set reply, if any.
    pub fn current(&self) -> Option<String> {
        self.history()
            .current()
            .map(|entry| entry.as_str().to_string())
    }

    /// The current reply, or `fallback` when the history is empty.
    pub fn current_or(&self, fallback: &str) -> String {
        self.current().unwrap_or_else(|| fallback.to_string())
    }

    /// The full history, oldest first.
    pub fn history(&self) -> ReplyHistory {
        self.load().into_history()
    }

    /// Reads the history, recovering from unreadable or malformed values.
    pub fn load(&self) -> StoredHistory {
        match self.slot.get(REPLY_HISTORY_KEY) {
            Ok(raw) => parse_history(raw),
            Err(e) => {
                warn!("Reply history is unreadable, treating it as empty: {}", e);
                StoredHistory::Recovered {
                    reason: e.to_string(),
                }
            }
        }
    }
}

fn parse_history(raw: Option<String>) -> StoredHistory {
    let Some(raw) = raw else {
        return StoredHistory::Missing;
    };

    match serde_json::from_str::<ReplyHistory>(&raw) {
        Ok(history) => StoredHistory::Parsed(history),
        Err(e) => {
            warn!("Reply history is malformed, treating it as empty: {}", e);
            StoredHistory::Recovered {
                reason: e.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AutoReplyError;
    use crate::reply::model::{MAX_NUM_REPLIES, MAX_REPLY_LENGTH};
    use crate::slot::InMemorySlot;

    fn empty_store() -> ReplyStore {
        ReplyStore::new(Arc::new(InMemorySlot::new()))
    }

    #[test]
    fn test_set_then_current() {
        let store = empty_store();
        let longest = "x".repeat(MAX_REPLY_LENGTH);
        for text in ["a", "hello there", longest.as_str()] {
            assert_eq!(store.set_reply(text).unwrap().as_deref(), Some(text));
            assert_eq!(store.current().as_deref(), Some(text));
        }
    }

    #[test]
    fn test_invalid_input_leaves_current_unchanged() {
        let store = empty_store();
        store.set_reply("keep me").unwrap();

        assert_eq!(store.set_reply("").unwrap(), None);
        assert_eq!(
            store.set_reply(&"x".repeat(MAX_REPLY_LENGTH + 1)).unwrap(),
            None
        );
        assert_eq!(store.current().as_deref(), Some("keep me"));
        assert_eq!(store.history().len(), 1);
    }

    #[test]
    fn test_eleven_inserts_evict_the_first() {
        let store = empty_store();
        let values: Vec<String> = (1..=11).map(|i| format!("reply #{}", i)).collect();
        for value in &values {
            store.set_reply(value).unwrap();
        }

        let history = store.history();
        assert_eq!(history.len(), MAX_NUM_REPLIES);
        assert!(!history.contains(&values[0]));
        assert_eq!(history.to_vec(), values[1..].to_vec());
        assert_eq!(store.current().as_deref(), Some("reply #11"));
    }

    #[test]
    fn test_current_or_falls_back_only_when_empty() {
        let store = empty_store();
        assert_eq!(store.current_or("fallback"), "fallback");

        store.set_reply("set").unwrap();
        assert_eq!(store.current_or("fallback"), "set");
    }

    #[test]
    fn test_open_seeds_fresh_slot() {
        let slot = Arc::new(InMemorySlot::new());
        let store = ReplyStore::open(slot, "http://localhost:5000/").unwrap();
        assert_eq!(store.current().as_deref(), Some("http://localhost:5000/"));
    }

    #[test]
    fn test_open_does_not_reseed_existing_slot() {
        let slot = Arc::new(InMemorySlot::with_value(REPLY_HISTORY_KEY, r#"["mine"]"#));
        let store = ReplyStore::open(slot, "default").unwrap();
        assert_eq!(store.current().as_deref(), Some("mine"));

        // An explicitly emptied history stays empty as well
        let slot = Arc::new(InMemorySlot::with_value(REPLY_HISTORY_KEY, "[]"));
        let store = ReplyStore::open(slot, "default").unwrap();
        assert_eq!(store.current(), None);
    }

    #[test]
    fn test_open_with_invalid_default_leaves_history_empty() {
        let store = ReplyStore::open(Arc::new(InMemorySlot::new()), "").unwrap();
        assert_eq!(store.current(), None);
        assert_eq!(store.load(), StoredHistory::Missing);
    }

    #[test]
    fn test_malformed_value_is_recovered_as_empty() {
        let slot = Arc::new(InMemorySlot::with_value(REPLY_HISTORY_KEY, "{not json"));
        let store = ReplyStore::new(slot);

        assert!(store.load().is_recovered());
        assert_eq!(store.current(), None);

        // Writing replaces the corrupted value
        store.set_reply("fresh").unwrap();
        assert_eq!(
            store.load(),
            StoredHistory::Parsed(ReplyHistory::from(vec![
                ReplyEntry::new("fresh").unwrap()
            ]))
        );
    }

    #[test]
    fn test_empty_array_is_parsed_not_recovered() {
        let slot = Arc::new(InMemorySlot::with_value(REPLY_HISTORY_KEY, "[]"));
        let store = ReplyStore::new(slot);
        assert_eq!(store.load(), StoredHistory::Parsed(ReplyHistory::new()));
    }

    struct BrokenSlot;

    impl KeyValueSlot for BrokenSlot {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(AutoReplyError::io("disk on fire"))
        }

        fn put(&self, _key: &str, _value: &str) -> Result<()> {
            Err(AutoReplyError::io("disk on fire"))
        }
    }

    #[test]
    fn test_unreadable_slot_reads_as_empty_but_write_fails() {
        let store = ReplyStore::new(Arc::new(BrokenSlot));
        assert!(store.load().is_recovered());
        assert_eq!(store.current_or("fallback"), "fallback");
        assert!(store.set_reply("anything").is_err());
    }

    #[test]
    fn test_is_valid() {
        assert!(ReplyStore::is_valid("ok"));
        assert!(!ReplyStore::is_valid(""));
        assert_eq!(
            ReplyStore::validate(&"x".repeat(600)),
            Err(InvalidReply::TooLong { length: 600 })
        );
    }
}
