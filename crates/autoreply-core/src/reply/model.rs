//! Reply domain models.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum number of replies kept in the history.
pub const MAX_NUM_REPLIES: usize = 10;

/// Maximum length of a single reply, in characters.
pub const MAX_REPLY_LENGTH: usize = 500;

/// Why a piece of text cannot be stored as a reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvalidReply {
    #[error("reply text is empty")]
    Empty,

    #[error("reply text is {length} characters long, the limit is {}", MAX_REPLY_LENGTH)]
    TooLong { length: usize },
}

/// A validated reply text: non-empty and at most [`MAX_REPLY_LENGTH`] characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReplyEntry(String);

impl ReplyEntry {
    /// Validates `text` and wraps it.
    pub fn new(text: impl Into<String>) -> Result<Self, InvalidReply> {
        let text = text.into();
        Self::validate(&text)?;
        Ok(Self(text))
    }

    /// Checks the reply rules without allocating.
    pub fn validate(text: &str) -> Result<(), InvalidReply> {
        if text.is_empty() {
            return Err(InvalidReply::Empty);
        }
        let length = text.chars().count();
        if length > MAX_REPLY_LENGTH {
            return Err(InvalidReply::TooLong { length });
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ReplyEntry {
    type Error = InvalidReply;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ReplyEntry> for String {
    fn from(entry: ReplyEntry) -> Self {
        entry.0
    }
}

impl AsRef<str> for ReplyEntry {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReplyEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Insertion-ordered reply history, oldest first, bounded at [`MAX_NUM_REPLIES`].
///
/// Serialized as a plain JSON array of strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ReplyEntry>", into = "Vec<ReplyEntry>")]
pub struct ReplyHistory {
    entries: VecDeque<ReplyEntry>,
}

impl ReplyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `entry`, evicting and returning the oldest one when full.
    pub fn push(&mut self, entry: ReplyEntry) -> Option<ReplyEntry> {
        self.entries.push_back(entry);
        if self.entries.len() > MAX_NUM_REPLIES {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// The most recently pushed entry.
    pub fn current(&self) -> Option<&ReplyEntry> {
        self.entries.back()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, text: &str) -> bool {
        self.entries.iter().any(|entry| entry.as_str() == text)
    }

    /// Iterates oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &ReplyEntry> {
        self.entries.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.as_str().to_string()).collect()
    }
}

impl From<Vec<ReplyEntry>> for ReplyHistory {
    fn from(entries: Vec<ReplyEntry>) -> Self {
        // Keep the newest entries if the stored array exceeds capacity.
        let skip = entries.len().saturating_sub(MAX_NUM_REPLIES);
        Self {
            entries: entries.into_iter().skip(skip).collect(),
        }
    }
}

impl From<ReplyHistory> for Vec<ReplyEntry> {
    fn from(history: ReplyHistory) -> Self {
        history.entries.into_iter().collect()
    }
}
