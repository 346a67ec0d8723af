//! Command implementations for punchclock.
//!
//! Each command returns the text to print; `serve` prints as it goes and
//! returns an empty string.

mod completions;
mod history;
mod serve;
mod stats;

pub use completions::completions;
pub use history::history;
pub use serve::serve;
pub use stats::stats;

use std::sync::Arc;

use tracing::debug;

use crate::cli::args::OutputFormat;
use crate::config::{Config, Paths};
use crate::error::PunchError;
use crate::features::tracking::SqliteGateway;
use crate::storage::Database;

/// What every command needs: where the data lives and how to print.
pub struct Context {
    pub paths: Paths,
    pub config: Config,
    pub format: OutputFormat,
}

impl Context {
    #[must_use]
    pub const fn new(paths: Paths, config: Config, format: OutputFormat) -> Self {
        Self {
            paths,
            config,
            format,
        }
    }

    /// Open the configured database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open_gateway(&self) -> Result<Arc<SqliteGateway>, PunchError> {
        let path = self.config.storage.database_path(&self.paths);
        debug!(path = %path.display(), "opening database");
        Ok(Arc::new(SqliteGateway::new(Database::open_at(&path)?)))
    }
}
