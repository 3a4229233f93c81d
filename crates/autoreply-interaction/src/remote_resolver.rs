//! RemoteReplyResolver - asks a reply server what to answer.
//!
//! Wire protocol:
//! - `POST <server_url>` with a `multipart/form-data` body holding the text
//!   fields `sender` and `message`
//! - header `Bypass-Tunnel-Reminder: 1`, which tunnelling proxies used to
//!   expose local development servers require for non-browser clients
//! - response body: a JSON object whose string field `reply` is the answer

use std::time::Duration;

use async_trait::async_trait;
use autoreply_core::error::{AutoReplyError, Result};
use autoreply_core::resolver::{IncomingMessage, ReplyResolver, ResolveError};
use reqwest::Client;
use reqwest::multipart::Form;
use serde_json::Value;
use tracing::{debug, info};

const BYPASS_TUNNEL_HEADER: &str = "Bypass-Tunnel-Reminder";

/// [`ReplyResolver`] that forwards incoming messages to an HTTP server.
#[derive(Debug, Clone)]
pub struct RemoteReplyResolver {
    client: Client,
}

impl RemoteReplyResolver {
    /// Creates a resolver whose requests give up after `timeout`, or never
    /// when `None`.
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| AutoReplyError::config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ReplyResolver for RemoteReplyResolver {
    async fn resolve(
        &self,
        server_url: &str,
        incoming: &IncomingMessage,
    ) -> std::result::Result<String, ResolveError> {
        let url = reqwest::Url::parse(server_url).map_err(|e| ResolveError::InvalidUrl {
            url: server_url.to_string(),
            message: e.to_string(),
        })?;

        let form = Form::new()
            .text("sender", incoming.sender.clone())
            .text("message", incoming.message.clone());

        debug!("Forwarding message from '{}' to {}", incoming.sender, url);

        let response = self
            .client
            .post(url)
            .header(BYPASS_TUNNEL_HEADER, "1")
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let body = response.text().await.map_err(transport_error)?;

        match extract_reply(&body) {
            Ok(reply) => {
                info!("Resolved reply remotely (status {})", status.as_u16());
                Ok(reply)
            }
            // A failed status with an unusable body is reported as the status.
            Err(_) if !status.is_success() => Err(ResolveError::Status {
                status: status.as_u16(),
            }),
            Err(e) => Err(e),
        }
    }
}

fn transport_error(err: reqwest::Error) -> ResolveError {
    if err.is_timeout() {
        ResolveError::Timeout
    } else {
        ResolveError::Transport(err.to_string())
    }
}

/// Pulls the string `reply` field out of a JSON object body.
fn extract_reply(body: &str) -> std::result::Result<String, ResolveError> {
    let json: Value =
        serde_json::from_str(body).map_err(|e| ResolveError::MalformedBody(e.to_string()))?;

    let object = json
        .as_object()
        .ok_or_else(|| ResolveError::MalformedBody("expected a JSON object".to_string()))?;

    object
        .get("reply")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(ResolveError::MissingReply)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_reply() {
        assert_eq!(extract_reply(r#"{"reply":"OK"}"#).unwrap(), "OK");
        assert_eq!(
            extract_reply(r#"{"reply":"hi","model":"echo"}"#).unwrap(),
            "hi"
        );
    }

    #[test]
    fn test_extract_reply_failures() {
        assert!(matches!(
            extract_reply("<html>502</html>"),
            Err(ResolveError::MalformedBody(_))
        ));
        assert!(matches!(
            extract_reply(r#"["reply"]"#),
            Err(ResolveError::MalformedBody(_))
        ));
        assert_eq!(
            extract_reply(r#"{"answer":"OK"}"#),
            Err(ResolveError::MissingReply)
        );
        assert_eq!(
            extract_reply(r#"{"reply":42}"#),
            Err(ResolveError::MissingReply)
        );
    }

    #[tokio::test]
    async fn test_invalid_url_is_reported() {
        let resolver = RemoteReplyResolver::new(None).unwrap();
        let result = resolver
            .resolve("not a url", &IncomingMessage::new("Alice", "hi"))
            .await;
        assert!(matches!(result, Err(ResolveError::InvalidUrl { .. })));
    }
}
