//! Database migrations for punchclock.
//!
//! Schema versions are tracked in `PRAGMA user_version` and applied in
//! order whenever a database is opened.

use rusqlite::Connection;

use crate::error::PunchError;

type Migration = fn(&Connection) -> Result<(), PunchError>;

/// Schema steps in order; step `i` brings the schema to version `i + 1`.
const MIGRATIONS: &[Migration] = &[migrate_v1];

/// Schema version once every migration has run.
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
const CURRENT_VERSION: i32 = MIGRATIONS.len() as i32;

/// Read `PRAGMA user_version`; a fresh database reports 0.
pub fn get_version(conn: &Connection) -> Result<i32, PunchError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| PunchError::Database(format!("Cannot read schema version: {e}")))
}

/// Bring the schema up to date, each step in its own transaction.
pub fn run(conn: &Connection) -> Result<(), PunchError> {
    let current = get_version(conn)?;
    if current > CURRENT_VERSION {
        return Err(PunchError::Database(format!(
            "Database schema v{current} is newer than this build (v{CURRENT_VERSION})"
        )));
    }

    let pending = MIGRATIONS.iter().zip(1_i32..).skip(usize::try_from(current).unwrap_or(0));
    for (migrate, version) in pending {
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| PunchError::Database(format!("Cannot start migration v{version}: {e}")))?;
        migrate(&*tx)?;
        tx.pragma_update(None, "user_version", version)
            .map_err(|e| PunchError::Database(format!("Cannot record schema v{version}: {e}")))?;
        tx.commit()
            .map_err(|e| PunchError::Database(format!("Cannot commit migration v{version}: {e}")))?;
        tracing::debug!(version, "schema migrated");
    }

    Ok(())
}

/// v1: users and their time entries.
///
/// Creates tables for:
/// - `users`: messaging identities mapped to internal ids
/// - `time_entries`: one row per recorded interval
fn migrate_v1(conn: &Connection) -> Result<(), PunchError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            identity TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        );

        -- date is the local calendar date of stopped_at, duration is HH:MM
        CREATE TABLE IF NOT EXISTS time_entries (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            project TEXT NOT NULL,
            started_at TEXT NOT NULL,
            stopped_at TEXT NOT NULL,
            duration_ms INTEGER NOT NULL CHECK (duration_ms >= 0),
            duration TEXT NOT NULL,
            date TEXT NOT NULL,
            comment TEXT NOT NULL CHECK (length(trim(comment)) > 0),
            recorded_at TEXT NOT NULL,
            UNIQUE (user_id, project, started_at, stopped_at)
        );

        CREATE INDEX IF NOT EXISTS idx_time_entries_user_date
        ON time_entries(user_id, date);
        ",
    )
    .map_err(|e| PunchError::Database(format!("Migration v1 failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_accepts_an_entry() {
        let conn = Connection::open_in_memory().unwrap();

        run(&conn).unwrap();
        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);

        conn.execute(
            "INSERT INTO users (identity, created_at) VALUES ('alice', '2024-01-01T10:00:00Z')",
            [],
        )
        .unwrap();

        conn.execute(
            "INSERT INTO time_entries
             (user_id, project, started_at, stopped_at, duration_ms, duration, date, comment, recorded_at)
             VALUES (1, 'Design', '2024-01-01T09:00:00Z', '2024-01-01T10:30:00Z', 5400000, '01:30',
                     '2024-01-01', 'drew mockups', '2024-01-01T10:31:00Z')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_blank_comment_rejected_by_schema() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (identity, created_at) VALUES ('alice', '2024-01-01T10:00:00Z')",
            [],
        )
        .unwrap();

        let result = conn.execute(
            "INSERT INTO time_entries
             (user_id, project, started_at, stopped_at, duration_ms, duration, date, comment, recorded_at)
             VALUES (1, 'Design', 'a', 'b', 0, '00:00', '2024-01-01', '   ', 'c')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_rerun_keeps_data() {
        let conn = Connection::open_in_memory().unwrap();
        run(&conn).unwrap();
        conn.execute(
            "INSERT INTO users (identity, created_at) VALUES ('bob', '2024-01-01T10:00:00Z')",
            [],
        )
        .unwrap();

        run(&conn).unwrap();

        let users: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0)).unwrap();
        assert_eq!(users, 1);
        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_newer_schema_is_refused() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", CURRENT_VERSION + 1).unwrap();

        assert!(matches!(run(&conn), Err(PunchError::Database(_))));
    }

    #[test]
    fn test_fresh_database_is_version_zero() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_version(&conn).unwrap(), 0);
    }
}
