//! Path resolution for punchclock configuration and data files.
//!
//! All punchclock data is stored in `~/.punchclock/`:
//! - `config.yaml` - Main configuration file
//! - `punchclock.db` - SQLite database with users and time entries

use std::path::{Path, PathBuf};

use crate::error::PunchError;

/// Paths to punchclock configuration and data files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    /// Root directory: `~/.punchclock/`
    pub root: PathBuf,
    /// Config file: `~/.punchclock/config.yaml`
    pub config_file: PathBuf,
    /// Database file: `~/.punchclock/punchclock.db`
    pub database: PathBuf,
}

impl Paths {
    /// Default layout under `$HOME/.punchclock`.
    ///
    /// # Errors
    ///
    /// Returns an error if `HOME` is not set.
    pub fn new() -> Result<Self, PunchError> {
        std::env::var_os("HOME")
            .filter(|home| !home.is_empty())
            .map(|home| Self::with_root(PathBuf::from(home).join(".punchclock")))
            .ok_or_else(|| PunchError::Config("HOME is not set; pass --root".to_string()))
    }

    /// Layout under an explicit data directory.
    #[must_use]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            config_file: root.join("config.yaml"),
            database: root.join("punchclock.db"),
            root,
        }
    }

    /// Create the data directory if it is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn ensure_dirs(&self) -> Result<(), PunchError> {
        Self::create_dir(&self.root)
    }

    pub(crate) fn create_dir(dir: &Path) -> Result<(), PunchError> {
        std::fs::create_dir_all(dir)
            .map_err(|e| PunchError::Config(format!("Cannot create {}: {e}", dir.display())))
    }
}
