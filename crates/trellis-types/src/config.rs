//! Shell configuration.
//!
//! Loaded from a TOML file; every key is optional.
//!
//! ```toml
//! # Entries kept in each session's navigable history
//! history_capacity = 100
//! # Register the `history` command in every session
//! history_command = true
//! # Text around the current menu name in the prompt
//! prompt_prefix = "["
//! prompt_suffix = "]"
//! # Persist history across runs
//! history_file = "/home/user/.trellis_history"
//! history_file_limit = 1000
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, ShellError};

/// Default number of entries in a session's history.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// Default number of entries kept by persistent history stores.
pub const DEFAULT_HISTORY_FILE_LIMIT: usize = 1000;

/// Tunables shared by every session of an engine.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShellConfig {
    /// Maximum entries in a session's navigable history.
    pub history_capacity: usize,
    /// Whether sessions expose the `history` command.
    pub history_command: bool,
    /// Text written before the current menu name in the prompt.
    pub prompt_prefix: String,
    /// Text written after the current menu name in the prompt.
    pub prompt_suffix: String,
    /// File used for persistent history (none = volatile).
    pub history_file: Option<PathBuf>,
    /// Maximum entries kept by the persistent history store.
    pub history_file_limit: usize,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            history_command: true,
            prompt_prefix: String::new(),
            prompt_suffix: String::new(),
            history_file: None,
            history_file_limit: DEFAULT_HISTORY_FILE_LIMIT,
        }
    }
}

impl ShellConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration file from disk.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded shell config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(ShellError::Config(
                "history_capacity must be at least 1".to_string(),
            ));
        }
        if self.history_file_limit == 0 {
            return Err(ShellError::Config(
                "history_file_limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
