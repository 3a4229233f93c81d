//! Configuration service implementation.
//!
//! Loads [`AutoReplyConfig`] from `config.toml`, writing a default file on
//! first use so users have something to edit.

use std::fs;
use std::path::{Path, PathBuf};

use autoreply_core::config::AutoReplyConfig;
use autoreply_core::error::Result;
use tracing::info;

use crate::paths::AutoReplyPaths;

#[derive(Debug, Clone)]
pub struct ConfigService {
    path: PathBuf,
}

impl ConfigService {
    /// Uses the platform default config file.
    pub fn new_default() -> Result<Self> {
        Ok(Self::with_path(AutoReplyPaths::config_file()?))
    }

    /// Uses an explicit config file.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads the config, or returns defaults when the file is missing.
    pub fn load(&self) -> Result<AutoReplyConfig> {
        if !self.path.exists() {
            return Ok(AutoReplyConfig::default());
        }
        let content = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Reads the config, creating the file with defaults if missing.
    pub fn load_or_create(&self) -> Result<AutoReplyConfig> {
        if self.path.exists() {
            return self.load();
        }

        let config = AutoReplyConfig::default();
        self.save(&config)?;
        info!("Created default config at {:?}", self.path);
        Ok(config)
    }

    pub fn save(&self, config: &AutoReplyConfig) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, toml::to_string_pretty(config)?)?;
        Ok(())
    }
}
