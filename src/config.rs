//! Configuration management for daylog

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::logging::{
    FileSinkOptions, Severity, DEFAULT_MAX_CONSECUTIVE_WRITE_ERRORS, DEFAULT_RETENTION_FILE_COUNT,
};

const CONFIG_FILE: &str = "daylog.toml";

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory for the daily log files
    #[serde(default = "default_logs_dir")]
    pub log_directory: PathBuf,

    /// How often the file worker wakes, in milliseconds (default: 1000)
    #[serde(default = "default_polling_interval_ms")]
    pub polling_interval_ms: u64,

    /// Consecutive failed writes before file logging is disabled (default: 10)
    #[serde(default = "default_max_consecutive_write_errors")]
    pub max_consecutive_write_errors: u32,

    /// Number of daily files kept after a rollover (default: 7)
    #[serde(default = "default_retention_file_count")]
    pub retention_file_count: usize,

    /// Least severe level that gets logged (default: info)
    #[serde(default = "default_min_severity")]
    pub min_severity: Severity,

    /// Also echo every line to stdout (default: true)
    #[serde(default = "default_console")]
    pub console: bool,
}

fn default_polling_interval_ms() -> u64 {
    1000
}

fn default_max_consecutive_write_errors() -> u32 {
    DEFAULT_MAX_CONSECUTIVE_WRITE_ERRORS
}

fn default_retention_file_count() -> usize {
    DEFAULT_RETENTION_FILE_COUNT
}

fn default_min_severity() -> Severity {
    Severity::Info
}

fn default_console() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            log_directory: default_logs_dir(),
            polling_interval_ms: default_polling_interval_ms(),
            max_consecutive_write_errors: default_max_consecutive_write_errors(),
            retention_file_count: default_retention_file_count(),
            min_severity: default_min_severity(),
            console: default_console(),
        }
    }
}

impl LoggingConfig {
    /// Load configuration from the default location, or defaults if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&config_file_path())
    }

    /// Load configuration from `path`, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }

    /// Reject settings the file sink can't run with
    pub fn validate(&self) -> Result<()> {
        if self.polling_interval_ms == 0 {
            anyhow::bail!("polling_interval_ms must be greater than zero");
        }
        if self.max_consecutive_write_errors == 0 {
            anyhow::bail!("max_consecutive_write_errors must be greater than zero");
        }
        if self.retention_file_count == 0 {
            anyhow::bail!("retention_file_count must be greater than zero");
        }
        Ok(())
    }

    /// Options for the file sink described by this config
    pub fn file_sink_options(&self) -> FileSinkOptions {
        FileSinkOptions {
            log_directory: self.log_directory.clone(),
            polling_interval: Duration::from_millis(self.polling_interval_ms),
            max_consecutive_write_errors: self.max_consecutive_write_errors,
            retention_file_count: self.retention_file_count,
        }
    }
}

/// Get the per-user config directory for daylog
/// Falls back to ./.daylog if the platform config directory cannot be determined
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("daylog"))
        .unwrap_or_else(|| {
            tracing::warn!("Could not determine config directory, using current directory");
            PathBuf::from(".daylog")
        })
}

/// Get the path to the config file
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILE)
}

/// Get the default logs directory (per-user local data directory)
/// Falls back to ./.daylog/logs if it cannot be determined
pub fn default_logs_dir() -> PathBuf {
    try_data_dir()
        .unwrap_or_else(|| {
            tracing::warn!("Could not determine local data directory, using current directory for logs");
            PathBuf::from(".daylog")
        })
        .join("logs")
}

/// Try to get the local data directory, returning None if unavailable
pub fn try_data_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("daylog"))
}
