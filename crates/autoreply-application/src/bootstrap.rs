//! Composition root.
//!
//! Builds the one `ReplyService` of a process from configuration. Callers
//! share the returned service (usually behind an `Arc`) instead of reaching
//! for global state.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use autoreply_core::config::AutoReplyConfig;
use autoreply_core::reply::ReplyStore;
use autoreply_core::slot::KeyValueSlot;
use autoreply_infrastructure::{AutoReplyPaths, ConfigService, JsonFileSlot};
use autoreply_interaction::RemoteReplyResolver;
use tracing::info;

use crate::reply_service::ReplyService;

pub struct AppBootstrap {
    pub config: AutoReplyConfig,
    pub service: Arc<ReplyService>,
}

impl AppBootstrap {
    /// Loads the config file (creating it if missing) and wires the service
    /// to a file-backed slot.
    ///
    /// `config_path` overrides the platform default config location.
    pub fn initialize(config_path: Option<PathBuf>) -> Result<Self> {
        let config_service = match config_path {
            Some(path) => ConfigService::with_path(path),
            None => ConfigService::new_default().context("Failed to locate config file")?,
        };
        let config = config_service
            .load_or_create()
            .with_context(|| format!("Failed to load config from {:?}", config_service.path()))?;

        let slot_path = match &config.storage_file {
            Some(path) => path.clone(),
            None => AutoReplyPaths::slot_file().context("Failed to locate reply storage")?,
        };
        info!("[Bootstrap] Using reply storage at {:?}", slot_path);

        Self::with_slot(config, Arc::new(JsonFileSlot::new(slot_path)))
    }

    /// Wires the service to an explicit slot, e.g. an in-memory one.
    pub fn with_slot(config: AutoReplyConfig, slot: Arc<dyn KeyValueSlot>) -> Result<Self> {
        let store = ReplyStore::open(slot, &config.default_reply)
            .context("Failed to open reply store")?;
        let resolver = RemoteReplyResolver::new(config.request_timeout())
            .context("Failed to build remote reply resolver")?;

        let service = Arc::new(ReplyService::new(store, Arc::new(resolver), &config));
        Ok(Self { config, service })
    }
}
