//! Opening the `SQLite` store.
//!
//! The database is stored at `~/.punchclock/punchclock.db` unless the config
//! file points elsewhere. It contains the `users` and `time_entries` tables.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::config::Paths;
use crate::error::PunchError;

use super::migrations;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Migrated `SQLite` connection.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database file at `path`, creating its directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or the schema cannot be
    /// brought up to date.
    pub fn open_at(path: &Path) -> Result<Self, PunchError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Paths::create_dir(parent)?;
        }

        let conn = Connection::open(path)
            .map_err(|e| PunchError::Database(format!("Cannot open {}: {e}", path.display())))?;
        tracing::debug!(path = %path.display(), "database opened");
        Self::prepare(conn)
    }

    /// Open a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns an error if `SQLite` cannot allocate it or the schema fails.
    pub fn open_in_memory() -> Result<Self, PunchError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| PunchError::Database(format!("Cannot open in-memory database: {e}")))?;
        Self::prepare(conn)
    }

    fn prepare(conn: Connection) -> Result<Self, PunchError> {
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(|e| PunchError::Database(format!("Cannot enable foreign keys: {e}")))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| PunchError::Database(format!("Cannot set busy timeout: {e}")))?;
        migrations::run(&conn)?;
        Ok(Self { conn })
    }

    /// Schema version recorded in the file.
    ///
    /// # Errors
    ///
    /// Returns an error if the version cannot be read.
    pub fn schema_version(&self) -> Result<i32, PunchError> {
        migrations::get_version(&self.conn)
    }

    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}
