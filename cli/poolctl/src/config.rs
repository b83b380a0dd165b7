//! Configuration loading.
//!
//! Handles:
//! - Default output format
//! - Default log level
//! - Environment overrides

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Configuration file name.
const CONFIG_FILE: &str = "config.json";

/// Overrides `default_format`.
pub const FORMAT_ENV: &str = "POOLCTL_FORMAT";

/// Overrides `log_level`.
pub const LOG_ENV: &str = "POOLCTL_LOG";

/// Get the config directory path.
fn config_dir() -> Result<PathBuf> {
    ProjectDirs::from("dev", "gkepool", "poolctl")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))
}

/// CLI configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Output format used when `--format` is not given.
    #[serde(default = "default_format")]
    pub default_format: String,

    /// Log filter used when neither `--log-level` nor `RUST_LOG` is set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_format() -> String {
    "table".to_string()
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_format: default_format(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// Load config from disk, or return default, then apply env overrides.
    pub fn load() -> Result<Self> {
        let path = config_dir()?.join(CONFIG_FILE);

        let config = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config from {:?}", path))?;
            Self::from_json_str(&contents)
                .with_context(|| format!("Failed to parse config from {:?}", path))?
        } else {
            Self::default()
        };

        Ok(config.with_overrides(
            std::env::var(FORMAT_ENV).ok(),
            std::env::var(LOG_ENV).ok(),
        ))
    }

    fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Apply overrides, ignoring empty values.
    fn with_overrides(mut self, format: Option<String>, log_level: Option<String>) -> Self {
        if let Some(format) = format.filter(|f| !f.is_empty()) {
            self.default_format = format;
        }
        if let Some(level) = log_level.filter(|l| !l.is_empty()) {
            self.log_level = level;
        }
        self
    }
}
