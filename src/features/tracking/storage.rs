//! Time entry storage.
//!
//! Persists time entries to the local database and answers the period
//! queries behind `stats`.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode, Row};
use tokio::task;
use tracing::debug;

use super::recorder::{NewTimeEntry, TimeEntry};
use super::report::PeriodRange;
use crate::core::{format_hhmm, PersistenceGateway, UserId};
use crate::error::PersistError;
use crate::storage::Database;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed `PersistenceGateway`.
///
/// Every call runs on the blocking pool so a busy database stalls only the
/// caller. The connection mutex is held for one statement batch at a time.
pub struct SqliteGateway {
    db: Arc<Mutex<Database>>,
}

impl SqliteGateway {
    /// Create a gateway over an open database.
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    async fn blocking<T, F>(&self, work: F) -> Result<T, PersistError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, PersistError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let db = lock(&db)?;
            work(db.connection())
        })
        .await
        .map_err(|e| PersistError::Unavailable(format!("Database task failed: {e}")))?
    }
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    async fn ensure_user(&self, identity: &str) -> Result<UserId, PersistError> {
        let identity = identity.to_string();
        self.blocking(move |conn| ensure_user_on(conn, &identity)).await
    }

    async fn append(&self, entry: &NewTimeEntry) -> Result<TimeEntry, PersistError> {
        let entry = entry.clone();
        self.blocking(move |conn| append_on(conn, entry)).await
    }

    async fn query_by_period(
        &self,
        identity: &str,
        range: PeriodRange,
    ) -> Result<BTreeMap<String, Duration>, PersistError> {
        let identity = identity.to_string();
        self.blocking(move |conn| totals_on(conn, &identity, range)).await
    }

    async fn known_projects(&self, identity: &str) -> Result<Vec<String>, PersistError> {
        let identity = identity.to_string();
        self.blocking(move |conn| projects_on(conn, &identity)).await
    }

    async fn recent_entries(
        &self,
        identity: &str,
        limit: usize,
    ) -> Result<Vec<TimeEntry>, PersistError> {
        let identity = identity.to_string();
        self.blocking(move |conn| recent_on(conn, &identity, limit)).await
    }
}

fn lock(db: &Mutex<Database>) -> Result<MutexGuard<'_, Database>, PersistError> {
    db.lock()
        .map_err(|_| PersistError::Unavailable("database lock poisoned".to_string()))
}

fn ensure_user_on(conn: &Connection, identity: &str) -> Result<UserId, PersistError> {
    conn.execute(
        r"INSERT INTO users (identity, created_at) VALUES (?1, ?2)
          ON CONFLICT (identity) DO NOTHING",
        params![identity, timestamp(Utc::now())],
    )
    .map_err(|e| persist_error("Failed to insert user", &e))?;

    conn.query_row(
        "SELECT id FROM users WHERE identity = ?1",
        [identity],
        |row| row.get(0),
    )
    .map(UserId)
    .map_err(|e| persist_error("Failed to look up user", &e))
}

fn append_on(conn: &Connection, entry: NewTimeEntry) -> Result<TimeEntry, PersistError> {
    let user_id = ensure_user_on(conn, entry.user())?;

    let started_at = timestamp(entry.started_at());
    let stopped_at = timestamp(entry.stopped_at());

    // A retry of an entry that did reach the store must not add a second row.
    let inserted = conn
        .execute(
            r"INSERT INTO time_entries
              (user_id, project, started_at, stopped_at, duration_ms, duration, date, comment, recorded_at)
              VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
              ON CONFLICT (user_id, project, started_at, stopped_at) DO NOTHING",
            params![
                user_id.0,
                entry.project(),
                started_at,
                stopped_at,
                entry.duration().num_milliseconds(),
                format_hhmm(entry.duration()),
                entry.date().format(DATE_FORMAT).to_string(),
                entry.comment(),
                timestamp(Utc::now()),
            ],
        )
        .map_err(|e| persist_error("Failed to insert time entry", &e))?;

    if inserted == 0 {
        debug!(user = entry.user(), project = entry.project(), "entry already stored");
    }

    let (id, recorded_at): (i64, DateTime<Utc>) = conn
        .query_row(
            r"SELECT id, recorded_at FROM time_entries
              WHERE user_id = ?1 AND project = ?2 AND started_at = ?3 AND stopped_at = ?4",
            params![user_id.0, entry.project(), started_at, stopped_at],
            |row| Ok((row.get(0)?, timestamp_column(row, 1)?)),
        )
        .map_err(|e| persist_error("Failed to read back time entry", &e))?;

    Ok(entry.into_recorded(id, recorded_at))
}

fn totals_on(
    conn: &Connection,
    identity: &str,
    range: PeriodRange,
) -> Result<BTreeMap<String, Duration>, PersistError> {
    let mut stmt = conn
        .prepare(
            r"SELECT e.project, SUM(e.duration_ms)
              FROM time_entries e
              JOIN users u ON u.id = e.user_id
              WHERE u.identity = ?1 AND e.date >= ?2 AND e.date < ?3
              GROUP BY e.project",
        )
        .map_err(|e| persist_error("Failed to prepare query", &e))?;

    let rows = stmt
        .query_map(
            params![
                identity,
                range.start.format(DATE_FORMAT).to_string(),
                range.end.format(DATE_FORMAT).to_string(),
            ],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
        )
        .map_err(|e| persist_error("Failed to query totals", &e))?;

    let mut totals = BTreeMap::new();
    for row in rows {
        let (project, ms) = row.map_err(|e| persist_error("Failed to read totals", &e))?;
        totals.insert(project, Duration::milliseconds(ms));
    }

    Ok(totals)
}

fn projects_on(conn: &Connection, identity: &str) -> Result<Vec<String>, PersistError> {
    let mut stmt = conn
        .prepare(
            r"SELECT e.project
              FROM time_entries e
              JOIN users u ON u.id = e.user_id
              WHERE u.identity = ?1
              GROUP BY e.project
              ORDER BY MIN(e.id)",
        )
        .map_err(|e| persist_error("Failed to prepare query", &e))?;

    let rows = stmt
        .query_map([identity], |row| row.get::<_, String>(0))
        .map_err(|e| persist_error("Failed to query projects", &e))?;

    let mut projects = Vec::new();
    for row in rows {
        projects.push(row.map_err(|e| persist_error("Failed to read project", &e))?);
    }

    Ok(projects)
}

fn recent_on(conn: &Connection, identity: &str, limit: usize) -> Result<Vec<TimeEntry>, PersistError> {
    let mut stmt = conn
        .prepare(
            r"SELECT e.id, u.identity, e.project, e.started_at, e.stopped_at,
                     e.date, e.comment, e.recorded_at
              FROM time_entries e
              JOIN users u ON u.id = e.user_id
              WHERE u.identity = ?1
              ORDER BY e.stopped_at DESC, e.id DESC
              LIMIT ?2",
        )
        .map_err(|e| persist_error("Failed to prepare query", &e))?;

    let limit = i64::try_from(limit).unwrap_or(i64::MAX);
    let rows = stmt
        .query_map(params![identity, limit], row_to_entry)
        .map_err(|e| persist_error("Failed to query entries", &e))?;

    let mut entries = Vec::new();
    for row in rows {
        entries.push(row.map_err(|e| persist_error("Failed to read entry", &e))?);
    }

    Ok(entries)
}

/// Convert a database row to a TimeEntry.
fn row_to_entry(row: &Row<'_>) -> Result<TimeEntry, rusqlite::Error> {
    let id: i64 = row.get(0)?;
    let user: String = row.get(1)?;
    let project: String = row.get(2)?;
    let started_at = timestamp_column(row, 3)?;
    let stopped_at = timestamp_column(row, 4)?;
    let date_str: String = row.get(5)?;
    let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| conversion(5, e))?;
    let comment: String = row.get(6)?;
    let recorded_at = timestamp_column(row, 7)?;

    let interval = super::session::Interval::new(project, started_at, stopped_at);
    let entry = NewTimeEntry::new(&user, &interval, &comment, date).map_err(|e| conversion(6, e))?;

    Ok(entry.into_recorded(id, recorded_at))
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn timestamp_column(row: &Row<'_>, idx: usize) -> Result<DateTime<Utc>, rusqlite::Error> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| conversion(idx, e))
}

fn conversion<E>(idx: usize, e: E) -> rusqlite::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
}

fn persist_error(context: &str, e: &rusqlite::Error) -> PersistError {
    match e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            PersistError::Rejected(format!("{context}: {e}"))
        }
        _ => PersistError::Unavailable(format!("{context}: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tracking::{Interval, StatsPeriod};
    use chrono::TimeZone;

    fn create_test_gateway() -> SqliteGateway {
        let db = Database::open_in_memory().unwrap();
        SqliteGateway::new(db)
    }

    fn at(d: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, h, m, 0).unwrap()
    }

    fn entry(user: &str, project: &str, day: u32, minutes: i64, comment: &str) -> NewTimeEntry {
        let start = at(day, 9, 0);
        let interval = Interval::new(project, start, start + Duration::minutes(minutes));
        NewTimeEntry::new(user, &interval, comment, start.date_naive()).unwrap()
    }

    #[tokio::test]
    async fn test_ensure_user_is_idempotent() {
        let gateway = create_test_gateway();

        let first = gateway.ensure_user("alice").await.unwrap();
        let second = gateway.ensure_user("alice").await.unwrap();
        let other = gateway.ensure_user("bob").await.unwrap();

        assert_eq!(first, second);
        assert_ne!(first, other);

        let db = lock(&gateway.db).unwrap();
        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM users WHERE identity = 'alice'", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_append_and_read_back() {
        let gateway = create_test_gateway();

        let stored = gateway
            .append(&entry("alice", "Design", 4, 90, "drew mockups"))
            .await
            .unwrap();
        assert!(stored.id() > 0);

        let recent = gateway.recent_entries("alice", 10).await.unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].project(), "Design");
        assert_eq!(recent[0].comment(), "drew mockups");
        assert_eq!(recent[0].duration(), Duration::minutes(90));
        assert_eq!(recent[0].date(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }

    #[tokio::test]
    async fn test_append_retry_does_not_duplicate() {
        let gateway = create_test_gateway();
        let new_entry = entry("alice", "Design", 4, 90, "drew mockups");

        let first = gateway.append(&new_entry).await.unwrap();
        let second = gateway.append(&new_entry).await.unwrap();

        assert_eq!(first.id(), second.id());
        assert_eq!(gateway.recent_entries("alice", 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_stored_row_has_logical_fields() {
        let gateway = create_test_gateway();
        gateway
            .append(&entry("alice", "Design", 4, 90, "drew mockups"))
            .await
            .unwrap();

        let db = lock(&gateway.db).unwrap();
        let (date, duration): (String, String) = db
            .connection()
            .query_row("SELECT date, duration FROM time_entries", [], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .unwrap();
        assert_eq!(date, "2024-03-04");
        assert_eq!(duration, "01:30");
    }

    #[tokio::test]
    async fn test_query_by_period() {
        let gateway = create_test_gateway();
        // 2024-03-04 is a Monday
        gateway.append(&entry("alice", "Design", 3, 30, "sunday")).await.unwrap();
        gateway.append(&entry("alice", "Design", 4, 90, "monday")).await.unwrap();
        gateway.append(&entry("alice", "Backend", 6, 45, "wednesday")).await.unwrap();
        gateway.append(&entry("alice", "Design", 10, 15, "next sunday")).await.unwrap();
        gateway.append(&entry("alice", "Design", 11, 60, "next monday")).await.unwrap();
        gateway.append(&entry("bob", "Design", 4, 600, "someone else")).await.unwrap();

        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();

        let week = gateway
            .query_by_period("alice", StatsPeriod::Week.range_for(today))
            .await
            .unwrap();
        assert_eq!(week.len(), 2);
        assert_eq!(week["Design"], Duration::minutes(105));
        assert_eq!(week["Backend"], Duration::minutes(45));

        let day = gateway
            .query_by_period("alice", StatsPeriod::Day.range_for(today))
            .await
            .unwrap();
        assert_eq!(day.len(), 1);
        assert_eq!(day["Backend"], Duration::minutes(45));

        let month = gateway
            .query_by_period("alice", StatsPeriod::Month.range_for(today))
            .await
            .unwrap();
        assert_eq!(month["Design"], Duration::minutes(195));
    }

    #[tokio::test]
    async fn test_known_projects_in_first_use_order() {
        let gateway = create_test_gateway();
        gateway.append(&entry("alice", "Design", 4, 10, "a")).await.unwrap();
        gateway.append(&entry("alice", "Backend", 5, 10, "b")).await.unwrap();
        gateway.append(&entry("alice", "Design", 6, 10, "c")).await.unwrap();

        assert_eq!(
            gateway.known_projects("alice").await.unwrap(),
            ["Design", "Backend"]
        );
        assert!(gateway.known_projects("carol").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recent_entries_newest_first_with_limit() {
        let gateway = create_test_gateway();
        for day in 1..=5 {
            gateway
                .append(&entry("alice", "Design", day, 10, &format!("day {day}")))
                .await
                .unwrap();
        }

        let recent = gateway.recent_entries("alice", 3).await.unwrap();
        let comments: Vec<_> = recent.iter().map(TimeEntry::comment).collect();
        assert_eq!(comments, ["day 5", "day 4", "day 3"]);
    }

    #[tokio::test]
    async fn test_corrupt_timestamp_is_an_error() {
        let gateway = create_test_gateway();
        gateway.append(&entry("alice", "Design", 4, 90, "drew mockups")).await.unwrap();
        lock(&gateway.db)
            .unwrap()
            .connection()
            .execute("UPDATE time_entries SET started_at = 'yesterday-ish'", [])
            .unwrap();

        let result = gateway.recent_entries("alice", 10).await;

        assert!(matches!(result, Err(PersistError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_corrupt_date_is_an_error() {
        let gateway = create_test_gateway();
        gateway.append(&entry("alice", "Design", 4, 90, "drew mockups")).await.unwrap();
        lock(&gateway.db)
            .unwrap()
            .connection()
            .execute("UPDATE time_entries SET date = '04/03/2024'", [])
            .unwrap();

        assert!(gateway.recent_entries("alice", 10).await.is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_busy_database_does_not_stall_other_tasks() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("punchclock.db");
        let gateway = Arc::new(SqliteGateway::new(Database::open_at(&path).unwrap()));

        // A second connection holds the write lock for a while
        let holder = Database::open_at(&path).unwrap();
        holder.connection().execute_batch("BEGIN IMMEDIATE;").unwrap();

        let writer = {
            let gateway = Arc::clone(&gateway);
            tokio::spawn(async move {
                gateway.append(&entry("alice", "Design", 4, 90, "drew mockups")).await
            })
        };

        // The runtime thread stays free while alice's insert waits
        let started = std::time::Instant::now();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        assert!(started.elapsed() < std::time::Duration::from_secs(1));

        holder.connection().execute_batch("COMMIT;").unwrap();
        assert!(writer.await.unwrap().is_ok());
    }
}
