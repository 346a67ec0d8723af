//! Turning a stopped interval into a persisted time entry.

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Serialize, Serializer};
use tracing::{debug, info, warn};

use super::session::{Interval, UserSession};
use crate::core::{format_hhmm, Clock, PersistenceGateway};
use crate::error::{RecordError, ValidationError};

/// A validated entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTimeEntry {
    user: String,
    project: String,
    started_at: DateTime<Utc>,
    stopped_at: DateTime<Utc>,
    date: NaiveDate,
    comment: String,
}

impl NewTimeEntry {
    /// Build an entry from a stopped interval.
    ///
    /// `date` is the local calendar date of the stop.
    ///
    /// # Errors
    ///
    /// Returns `EmptyComment` if the comment is blank after trimming.
    pub fn new(
        user: &str,
        interval: &Interval,
        comment: &str,
        date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let comment = comment.trim();
        if comment.is_empty() {
            return Err(ValidationError::EmptyComment);
        }

        Ok(Self {
            user: user.to_string(),
            project: interval.project().to_string(),
            started_at: interval.started_at(),
            stopped_at: interval.stopped_at(),
            date,
            comment: comment.to_string(),
        })
    }

    #[must_use]
    pub fn user(&self) -> &str {
        &self.user
    }

    #[must_use]
    pub fn project(&self) -> &str {
        &self.project
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub const fn stopped_at(&self) -> DateTime<Utc> {
        self.stopped_at
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.date
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.stopped_at.signed_duration_since(self.started_at)
    }

    /// Attach the fields the store assigns.
    #[must_use]
    pub fn into_recorded(self, id: i64, recorded_at: DateTime<Utc>) -> TimeEntry {
        TimeEntry {
            id,
            entry: self,
            recorded_at,
        }
    }
}

/// A stored time entry. Immutable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeEntry {
    id: i64,
    entry: NewTimeEntry,
    recorded_at: DateTime<Utc>,
}

impl TimeEntry {
    #[must_use]
    pub const fn id(&self) -> i64 {
        self.id
    }

    #[must_use]
    pub fn user(&self) -> &str {
        self.entry.user()
    }

    #[must_use]
    pub fn project(&self) -> &str {
        self.entry.project()
    }

    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.entry.started_at
    }

    #[must_use]
    pub const fn stopped_at(&self) -> DateTime<Utc> {
        self.entry.stopped_at
    }

    #[must_use]
    pub const fn date(&self) -> NaiveDate {
        self.entry.date
    }

    #[must_use]
    pub fn comment(&self) -> &str {
        self.entry.comment()
    }

    #[must_use]
    pub fn duration(&self) -> Duration {
        self.entry.duration()
    }

    #[must_use]
    pub const fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    /// One-line summary, e.g. `01:30 on "Design": drew mockups`.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "{} on \"{}\": {}",
            format_hhmm(self.duration()),
            self.project(),
            self.comment()
        )
    }
}

impl Serialize for TimeEntry {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut s = serializer.serialize_struct("TimeEntry", 10)?;
        s.serialize_field("id", &self.id)?;
        s.serialize_field("user", self.user())?;
        s.serialize_field("project", self.project())?;
        s.serialize_field("date", &self.date())?;
        s.serialize_field("started_at", &self.started_at())?;
        s.serialize_field("stopped_at", &self.stopped_at())?;
        s.serialize_field("duration", &format_hhmm(self.duration()))?;
        s.serialize_field("duration_ms", &self.duration().num_milliseconds())?;
        s.serialize_field("comment", self.comment())?;
        s.serialize_field("recorded_at", &self.recorded_at)?;
        s.end()
    }
}

/// Builds entries from sessions and hands them to the gateway.
///
/// The recorder never changes the session; the caller applies the outcome
/// (`complete` on success, `fail` on a persistence error).
#[derive(Clone)]
pub struct TimeEntryRecorder {
    gateway: Arc<dyn PersistenceGateway>,
    clock: Arc<dyn Clock>,
}

impl TimeEntryRecorder {
    pub fn new(gateway: Arc<dyn PersistenceGateway>, clock: Arc<dyn Clock>) -> Self {
        Self { gateway, clock }
    }

    /// Record the session's pending interval with `comment`.
    ///
    /// # Errors
    ///
    /// `Validation` if nothing is pending or the comment is blank (the gateway
    /// is not called); `Persist` if the gateway fails.
    pub async fn record(
        &self,
        user: &str,
        session: &UserSession,
        comment: &str,
    ) -> Result<TimeEntry, RecordError> {
        let interval = session
            .pending_interval()
            .ok_or(ValidationError::InvalidTransition {
                event: "record an entry",
                state: session.status(),
            })?;

        let entry = NewTimeEntry::new(
            user,
            interval,
            comment,
            self.clock.local_date(interval.stopped_at()),
        )?;

        debug!(user, project = entry.project(), "appending time entry");
        match self.gateway.append(&entry).await {
            Ok(stored) => {
                info!(
                    user,
                    project = stored.project(),
                    duration = %format_hhmm(stored.duration()),
                    id = stored.id(),
                    "time entry recorded"
                );
                Ok(stored)
            }
            Err(e) => {
                warn!(user, project = entry.project(), error = %e, "time entry not recorded");
                Err(e.into())
            }
        }
    }

    /// Record again the entry kept after a failed save.
    ///
    /// # Errors
    ///
    /// Same as [`Self::record`]; `Validation` if there is nothing to retry.
    pub async fn retry(&self, user: &str, session: &UserSession) -> Result<TimeEntry, RecordError> {
        let comment = session
            .pending_comment()
            .ok_or(ValidationError::InvalidTransition {
                event: "retry",
                state: session.status(),
            })?;

        self.record(user, session, comment).await
    }
}
