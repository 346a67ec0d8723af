//! Configuration management for punchclock.
//!
//! This module handles loading configuration from `~/.punchclock/`.

mod paths;
mod settings;

pub use paths::Paths;
pub use settings::{Config, GeneralConfig, LoggingConfig, SessionConfig, StorageConfig};
