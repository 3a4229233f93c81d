//! Reply service façade.
//!
//! `ReplyService` owns the reply store and the resolver. Resolution of an
//! incoming message either answers with the stored text or forwards the
//! message to the configured reply server on a dedicated task.

use std::sync::Arc;

use autoreply_core::config::{AutoReplyConfig, FailurePolicy};
use autoreply_core::error::{AutoReplyError, Result};
use autoreply_core::reply::{ModeSelection, ReplyHistory, ReplyMode, ReplyStore};
use autoreply_core::resolver::{IncomingMessage, ReplyResolver, ResolveError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

pub struct ReplyService {
    store: Arc<ReplyStore>,
    resolver: Arc<dyn ReplyResolver>,
    default_reply: String,
    fallback_reply: String,
    failure_policy: FailurePolicy,
    mode: ModeSelection,
}

impl ReplyService {
    pub fn new(
        store: ReplyStore,
        resolver: Arc<dyn ReplyResolver>,
        config: &AutoReplyConfig,
    ) -> Self {
        Self {
            store: Arc::new(store),
            resolver,
            default_reply: config.default_reply.clone(),
            fallback_reply: config.fallback_reply.clone(),
            failure_policy: config.failure_policy,
            mode: config.mode,
        }
    }

    /// Resolves the reply to send for an incoming message.
    ///
    /// Never times out on its own beyond the resolver's HTTP timeout; use
    /// [`ReplyService::resolve_for_incoming_cancellable`] to stop waiting.
    pub async fn resolve_for_incoming(&self, sender: &str, message: &str) -> Result<String> {
        self.resolve_for_incoming_cancellable(sender, message, &CancellationToken::new())
            .await
    }

    /// Resolves the reply to send, failing with
    /// [`AutoReplyError::Interrupted`] if `cancel` fires first.
    ///
    /// Remote failures are turned into the fallback reply under
    /// [`FailurePolicy::Apologize`], or returned as
    /// [`AutoReplyError::Remote`] under [`FailurePolicy::Propagate`].
    pub async fn resolve_for_incoming_cancellable(
        &self,
        sender: &str,
        message: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        if cancel.is_cancelled() {
            return Err(AutoReplyError::Interrupted);
        }

        let url = match self.current_mode().await? {
            ReplyMode::LocalDefault { text } => {
                debug!("Answering '{}' with the local reply", sender);
                return Ok(text);
            }
            ReplyMode::RemoteServer { url } => url,
        };

        let resolver = Arc::clone(&self.resolver);
        let incoming = IncomingMessage::new(sender, message);
        let mut task =
            tokio::spawn(async move { resolver.resolve(&url, &incoming).await });

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                task.abort();
                info!("Resolution for '{}' interrupted", sender);
                Err(AutoReplyError::Interrupted)
            }
            joined = &mut task => match joined {
                Ok(outcome) => self.apply_failure_policy(outcome),
                Err(e) if e.is_cancelled() => Err(AutoReplyError::Interrupted),
                Err(e) => Err(AutoReplyError::internal(format!(
                    "Reply resolution task failed: {}",
                    e
                ))),
            },
        }
    }

    /// [`ReplyService::reply_mode`] with the slot read moved off the
    /// runtime thread.
    async fn current_mode(&self) -> Result<ReplyMode> {
        let store = Arc::clone(&self.store);
        let default_reply = self.default_reply.clone();
        let selection = self.mode;

        tokio::task::spawn_blocking(move || {
            ReplyMode::classify(store.current_or(&default_reply), selection)
        })
        .await
        .map_err(|e| AutoReplyError::internal(format!("Reading the current reply failed: {}", e)))
    }

    fn apply_failure_policy(
        &self,
        outcome: std::result::Result<String, ResolveError>,
    ) -> Result<String> {
        match outcome {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!("Remote reply resolution failed: {}", e);
                match self.failure_policy {
                    FailurePolicy::Apologize => Ok(self.fallback_reply.clone()),
                    FailurePolicy::Propagate => Err(AutoReplyError::Remote(e)),
                }
            }
        }
    }

    /// The current reply interpreted as a server address or local text.
    pub fn reply_mode(&self) -> ReplyMode {
        ReplyMode::classify(self.server_url(), self.mode)
    }

    /// The current reply, or the configured default when none is stored.
    pub fn server_url(&self) -> String {
        self.store.current_or(&self.default_reply)
    }

    /// Stores `text` as the current reply; `Ok(None)` if it is invalid.
    pub fn set_reply(&self, text: &str) -> Result<Option<String>> {
        self.store.set_reply(text)
    }

    pub fn reply(&self) -> Option<String> {
        self.store.current()
    }

    pub fn reply_or(&self, default: &str) -> String {
        self.store.current_or(default)
    }

    pub fn history(&self) -> ReplyHistory {
        self.store.history()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use autoreply_core::resolver::FALLBACK_REPLY;
    use autoreply_core::slot::{InMemorySlot, KeyValueSlot};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Resolver returning a canned outcome and recording its calls.
    struct ScriptedResolver {
        outcome: std::result::Result<String, ResolveError>,
        delay: Option<Duration>,
        calls: Mutex<Vec<(String, IncomingMessage)>>,
    }

    impl ScriptedResolver {
        fn new(outcome: std::result::Result<String, ResolveError>) -> Arc<Self> {
            Arc::new(Self {
                outcome,
                delay: None,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn slow(delay: Duration) -> Arc<Self> {
            Arc::new(Self {
                outcome: Ok("late".to_string()),
                delay: Some(delay),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<(String, IncomingMessage)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReplyResolver for ScriptedResolver {
        async fn resolve(
            &self,
            server_url: &str,
            incoming: &IncomingMessage,
        ) -> std::result::Result<String, ResolveError> {
            self.calls
                .lock()
                .unwrap()
                .push((server_url.to_string(), incoming.clone()));
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            self.outcome.clone()
        }
    }

    fn service_with(
        resolver: Arc<ScriptedResolver>,
        config: AutoReplyConfig,
    ) -> ReplyService {
        let store = ReplyStore::open(Arc::new(InMemorySlot::new()), &config.default_reply).unwrap();
        ReplyService::new(store, resolver, &config)
    }

    fn remote_config() -> AutoReplyConfig {
        AutoReplyConfig {
            default_reply: "http://replies.example/api".to_string(),
            ..AutoReplyConfig::default()
        }
    }

    #[tokio::test]
    async fn test_remote_mode_forwards_to_resolver() {
        let resolver = ScriptedResolver::new(Ok("OK".to_string()));
        let service = service_with(resolver.clone(), remote_config());

        let reply = service.resolve_for_incoming("Alice", "hi").await.unwrap();

        assert_eq!(reply, "OK");
        assert_eq!(
            resolver.calls(),
            vec![(
                "http://replies.example/api".to_string(),
                IncomingMessage::new("Alice", "hi")
            )]
        );
    }

    #[tokio::test]
    async fn test_local_mode_skips_resolver() {
        let resolver = ScriptedResolver::new(Ok("remote".to_string()));
        let service = service_with(resolver.clone(), remote_config());
        service.set_reply("Driving, will call back").unwrap();

        let reply = service.resolve_for_incoming("Bob", "hey").await.unwrap();

        assert_eq!(reply, "Driving, will call back");
        assert!(resolver.calls().is_empty());
    }

    #[tokio::test]
    async fn test_forced_local_mode_returns_url_text() {
        let resolver = ScriptedResolver::new(Ok("remote".to_string()));
        let config = AutoReplyConfig {
            mode: ModeSelection::Local,
            ..remote_config()
        };
        let service = service_with(resolver.clone(), config);

        let reply = service.resolve_for_incoming("Bob", "hey").await.unwrap();
        assert_eq!(reply, "http://replies.example/api");
        assert!(resolver.calls().is_empty());
    }

    #[tokio::test]
    async fn test_failure_apologizes_by_default() {
        let resolver = ScriptedResolver::new(Err(ResolveError::MissingReply));
        let service = service_with(resolver, remote_config());

        let reply = service.resolve_for_incoming("Alice", "hi").await.unwrap();
        assert_eq!(reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn test_failure_uses_configured_fallback_text() {
        let resolver = ScriptedResolver::new(Err(ResolveError::Timeout));
        let config = AutoReplyConfig {
            fallback_reply: "Back soon".to_string(),
            ..remote_config()
        };
        let service = service_with(resolver, config);

        let reply = service.resolve_for_incoming("Alice", "hi").await.unwrap();
        assert_eq!(reply, "Back soon");
    }

    #[tokio::test]
    async fn test_failure_propagates_when_configured() {
        let resolver = ScriptedResolver::new(Err(ResolveError::Status { status: 503 }));
        let config = AutoReplyConfig {
            failure_policy: FailurePolicy::Propagate,
            ..remote_config()
        };
        let service = service_with(resolver, config);

        let err = service.resolve_for_incoming("Alice", "hi").await.unwrap_err();
        assert!(matches!(
            err,
            AutoReplyError::Remote(ResolveError::Status { status: 503 })
        ));
    }

    #[tokio::test]
    async fn test_cancellation_interrupts_pending_resolution() {
        let resolver = ScriptedResolver::slow(Duration::from_secs(30));
        let service = service_with(resolver, remote_config());
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(5),
            service.resolve_for_incoming_cancellable("Alice", "hi", &cancel),
        )
        .await
        .expect("cancellation should end the wait");

        assert!(result.unwrap_err().is_interrupted());
    }

    #[tokio::test]
    async fn test_already_cancelled_token_fails_fast() {
        let resolver = ScriptedResolver::new(Ok("OK".to_string()));
        let service = service_with(resolver.clone(), remote_config());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = service
            .resolve_for_incoming_cancellable("Alice", "hi", &cancel)
            .await;

        assert!(result.unwrap_err().is_interrupted());
        assert!(resolver.calls().is_empty());
    }

    /// Slot recording which threads read from it.
    #[derive(Default)]
    struct ThreadRecordingSlot {
        inner: InMemorySlot,
        readers: Mutex<Vec<std::thread::ThreadId>>,
    }

    impl KeyValueSlot for ThreadRecordingSlot {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.readers.lock().unwrap().push(std::thread::current().id());
            self.inner.get(key)
        }

        fn put(&self, key: &str, value: &str) -> Result<()> {
            self.inner.put(key, value)
        }
    }

    #[tokio::test]
    async fn test_slot_is_read_off_the_runtime_thread() {
        let slot = Arc::new(ThreadRecordingSlot::default());
        let config = remote_config();
        let store = ReplyStore::open(slot.clone(), &config.default_reply).unwrap();
        let service = ReplyService::new(store, ScriptedResolver::new(Ok("OK".to_string())), &config);
        slot.readers.lock().unwrap().clear();

        assert_eq!(service.resolve_for_incoming("Alice", "hi").await.unwrap(), "OK");

        let readers = slot.readers.lock().unwrap().clone();
        assert!(!readers.is_empty());
        assert!(readers.iter().all(|id| *id != std::thread::current().id()));
    }

    #[test]
    fn test_pass_through_operations() {
        let resolver = ScriptedResolver::new(Ok("OK".to_string()));
        let service = service_with(resolver, remote_config());

        assert_eq!(service.server_url(), "http://replies.example/api");
        assert!(service.reply_mode().is_remote());

        assert_eq!(service.set_reply("").unwrap(), None);
        assert_eq!(service.set_reply("Later").unwrap().as_deref(), Some("Later"));
        assert_eq!(service.reply().as_deref(), Some("Later"));
        assert_eq!(service.reply_or("unused"), "Later");
        assert_eq!(service.history().len(), 2);
        assert!(!service.reply_mode().is_remote());
    }
}
