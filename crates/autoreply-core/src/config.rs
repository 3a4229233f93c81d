//! Application configuration model.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::reply::ModeSelection;
use crate::resolver::FALLBACK_REPLY;

/// Reply seeded into a fresh history, overridable at build time.
pub const DEFAULT_SERVER_URL: &str = match option_env!("AUTOREPLY_DEFAULT_SERVER_URL") {
    Some(url) => url,
    None => "http://localhost:5000/",
};

/// Default HTTP request timeout for remote resolution.
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;

/// What the service does when remote resolution fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Answer with `fallback_reply` as if it were a real reply.
    #[default]
    Apologize,
    /// Return the typed failure to the caller.
    Propagate,
}

/// Root configuration, stored as `config.toml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutoReplyConfig {
    /// Seed for a fresh history and fallback when it is empty.
    pub default_reply: String,

    /// Text answered when remote resolution fails under `Apologize`.
    pub fallback_reply: String,

    /// HTTP timeout for remote resolution; `0` waits indefinitely.
    pub request_timeout_ms: u64,

    pub failure_policy: FailurePolicy,

    pub mode: ModeSelection,

    /// Overrides the platform default location of the reply slot file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_file: Option<PathBuf>,
}

impl Default for AutoReplyConfig {
    fn default() -> Self {
        Self {
            default_reply: DEFAULT_SERVER_URL.to_string(),
            fallback_reply: FALLBACK_REPLY.to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            failure_policy: FailurePolicy::default(),
            mode: ModeSelection::default(),
            storage_file: None,
        }
    }
}

impl AutoReplyConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_ms {
            0 => None,
            ms => Some(Duration::from_millis(ms)),
        }
    }
}
