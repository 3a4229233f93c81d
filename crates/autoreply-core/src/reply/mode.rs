//! Local vs. remote reply resolution.
//!
//! The current reply doubles as either literal reply text or the address of
//! a reply server. [`ReplyMode`] makes that choice explicit.

use serde::{Deserialize, Serialize};
use url::Url;

/// How the current reply should be interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSelection {
    /// http(s) URLs select the remote server, anything else is local text.
    #[default]
    Auto,
    /// Always answer with the stored text.
    Local,
    /// Always treat the stored text as a server URL.
    Remote,
}

/// The resolved interpretation of the current reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyMode {
    LocalDefault { text: String },
    RemoteServer { url: String },
}

impl ReplyMode {
    /// Interprets `current` according to `selection`.
    pub fn classify(current: impl Into<String>, selection: ModeSelection) -> Self {
        let current = current.into();
        match selection {
            ModeSelection::Local => Self::LocalDefault { text: current },
            ModeSelection::Remote => Self::RemoteServer { url: current },
            ModeSelection::Auto if is_server_url(&current) => Self::RemoteServer { url: current },
            ModeSelection::Auto => Self::LocalDefault { text: current },
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Self::RemoteServer { .. })
    }
}

/// True for absolute `http`/`https` URLs with a host.
pub fn is_server_url(text: &str) -> bool {
    match Url::parse(text.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}
