//! # Configuration Persistence
//!
//! Manages user configuration stored in `~/.config/macrokey/config.json`.
//!
//! ## Overview
//!
//! The [`Config`] struct is serialized to / deserialized from a JSON file in
//! the user's XDG config directory. Every field has a default, so a partial
//! file only overrides what it names.
//!
//! ```json
//! {
//!   "interpreter": ["lua", "-"],
//!   "host_timeout_ms": 5000,
//!   "status_ms": 3000,
//!   "error_status_ms": 5000
//! }
//! ```
//!
//! The `directories` crate is used to resolve the platform-appropriate config
//! directory.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Persisted user configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Command that receives a script on stdin.
    #[serde(default = "default_interpreter")]
    pub interpreter: Vec<String>,

    /// Upper bound for a single host call. Script runs are not bounded.
    #[serde(default = "default_host_timeout_ms")]
    pub host_timeout_ms: u64,

    /// How long informational status messages stay visible.
    #[serde(default = "default_status_ms")]
    pub status_ms: u64,

    /// How long error status messages stay visible.
    #[serde(default = "default_error_status_ms")]
    pub error_status_ms: u64,
}

fn default_interpreter() -> Vec<String> {
    vec!["lua".to_string(), "-".to_string()]
}

fn default_host_timeout_ms() -> u64 {
    5000
}

fn default_status_ms() -> u64 {
    3000
}

fn default_error_status_ms() -> u64 {
    5000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            interpreter: default_interpreter(),
            host_timeout_ms: default_host_timeout_ms(),
            status_ms: default_status_ms(),
            error_status_ms: default_error_status_ms(),
        }
    }
}

impl Config {
    /// Load configuration from disk. Returns `Config::default()` if the file
    /// does not exist or cannot be parsed.
    pub fn load() -> Self {
        match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(target: "config", error = %format!("{:#}", e), "using_defaults");
                Self::default()
            }
        }
    }

    fn try_load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path. Returns `Config::default()` if
    /// the file does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        Ok(config)
    }

    /// Save the current configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    pub fn host_timeout(&self) -> Duration {
        Duration::from_millis(self.host_timeout_ms)
    }

    pub fn status_duration(&self) -> Duration {
        Duration::from_millis(self.status_ms)
    }

    pub fn error_status_duration(&self) -> Duration {
        Duration::from_millis(self.error_status_ms)
    }

    /// Return the path to the config file.
    fn config_path() -> Result<PathBuf> {
        let dirs = directories::ProjectDirs::from("", "", "macrokey")
            .context("Could not determine config directory")?;
        Ok(dirs.config_dir().join("config.json"))
    }
}
