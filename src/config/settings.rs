//! Configuration settings for punchclock.
//!
//! Settings are loaded from `~/.punchclock/config.yaml`.

use std::path::{Path, PathBuf};

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::cli::args::OutputFormat;
use crate::config::Paths;
use crate::error::PunchError;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// General settings.
    pub general: GeneralConfig,
    /// Session lifecycle settings.
    pub session: SessionConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Storage settings.
    pub storage: StorageConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GeneralConfig {
    /// Default output format.
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
}

/// Session lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Evict sessions without a timer after this many idle minutes.
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_minutes: u32,
    /// How often the reaper looks for idle sessions.
    #[serde(default = "default_reap_interval")]
    pub reap_interval_seconds: u32,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct LoggingConfig {
    /// `tracing` filter directive, e.g. `punchclock=debug`. `RUST_LOG` wins.
    pub filter: Option<String>,
}

/// Storage settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file. Defaults to `punchclock.db` in the data directory.
    pub database: Option<PathBuf>,
}

// Default value functions for serde
const fn default_output_format() -> OutputFormat {
    OutputFormat::Pretty
}

const fn default_idle_timeout() -> u32 {
    60
}

const fn default_reap_interval() -> u32 {
    300
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: default_output_format(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            idle_timeout_minutes: default_idle_timeout(),
            reap_interval_seconds: default_reap_interval(),
        }
    }
}

impl SessionConfig {
    #[must_use]
    pub fn idle_timeout(&self) -> Duration {
        Duration::minutes(i64::from(self.idle_timeout_minutes))
    }

    #[must_use]
    pub fn reap_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(u64::from(self.reap_interval_seconds.max(1)))
    }
}

impl StorageConfig {
    /// The configured database path, or the default under `paths`.
    #[must_use]
    pub fn database_path(&self, paths: &Paths) -> PathBuf {
        self.database
            .clone()
            .unwrap_or_else(|| paths.database.clone())
    }
}

impl Config {
    /// Load `config.yaml` from the data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but is not valid configuration.
    pub fn load(paths: &Paths) -> Result<Self, PunchError> {
        Self::load_from_path(&paths.config_file)
    }

    /// Load configuration from a specific path; a missing file means defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_from_path(path: &Path) -> Result<Self, PunchError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => {
                return Err(PunchError::Config(format!("Cannot read {}: {e}", path.display())));
            }
        };

        serde_yaml::from_str(&contents)
            .map_err(|e| PunchError::Config(format!("Invalid config file {}: {e}", path.display())))
    }
}
