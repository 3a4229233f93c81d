//! Unified path management for autoreply files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/autoreply/         # Config directory
//! └── config.toml              # Application configuration
//!
//! ~/.local/share/autoreply/    # Data directory
//! └── replies.json             # Reply history slot
//! ```

use std::path::PathBuf;

use autoreply_core::error::{AutoReplyError, Result};

const APP_DIR_NAME: &str = "autoreply";

/// Resolves platform-specific locations (XDG on Linux, native elsewhere).
pub struct AutoReplyPaths;

impl AutoReplyPaths {
    /// Returns the autoreply configuration directory.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| AutoReplyError::config("Cannot determine config directory"))
    }

    /// Returns the autoreply data directory.
    pub fn data_dir() -> Result<PathBuf> {
        dirs::data_dir()
            .map(|dir| dir.join(APP_DIR_NAME))
            .ok_or_else(|| AutoReplyError::config("Cannot determine data directory"))
    }

    /// Returns the path to the main configuration file.
    pub fn config_file() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Returns the default path of the reply slot file.
    pub fn slot_file() -> Result<PathBuf> {
        Ok(Self::data_dir()?.join("replies.json"))
    }
}
