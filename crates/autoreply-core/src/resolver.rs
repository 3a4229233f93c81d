//! Reply resolver abstraction.
//!
//! A resolver turns an incoming message into reply text by asking something
//! outside the process, typically an HTTP server. Implementations live in
//! `autoreply-interaction`; the application layer only sees this trait.

use async_trait::async_trait;
use thiserror::Error;

/// User-facing text shown when a remote reply could not be obtained.
pub const FALLBACK_REPLY: &str = "Sorry, there seems to be a problem with our server";

/// A message received from the host notification integration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Display name of whoever sent the message.
    pub sender: String,
    /// Message body.
    pub message: String,
}

impl IncomingMessage {
    pub fn new(sender: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            message: message.into(),
        }
    }
}

/// Why a remote resolution produced no reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// The configured server address is not a usable URL.
    #[error("invalid server url '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// Connection, TLS or body transfer failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Non-success status whose body could not be used.
    #[error("server responded with status {status}")]
    Status { status: u16 },

    /// The body was not a JSON object.
    #[error("malformed response body: {0}")]
    MalformedBody(String),

    /// The JSON object had no string `reply` field.
    #[error("response has no 'reply' field")]
    MissingReply,
}

/// Resolves reply text for an incoming message against a server endpoint.
#[async_trait]
pub trait ReplyResolver: Send + Sync {
    /// Performs exactly one exchange with `server_url`.
    ///
    /// Implementations must not retry and must report every failure through
    /// [`ResolveError`] rather than panicking.
    async fn resolve(
        &self,
        server_url: &str,
        incoming: &IncomingMessage,
    ) -> Result<String, ResolveError>;
}
