//! Seams to external collaborators.
//!
//! The conversation core only talks to the durable store through
//! `PersistenceGateway`. The SQLite implementation lives in
//! `features::tracking::storage`; tests substitute mocks.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::PersistError;
use crate::features::tracking::{NewTimeEntry, PeriodRange, TimeEntry};

/// Internal identifier the store assigns to an external user identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub i64);

/// Durable, append-only store of time entries.
///
/// Users are addressed by their external identity (the messaging handle).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Insert the user if unknown and return its internal id.
    ///
    /// Calling this again for the same identity returns the same id and never
    /// errors on the duplicate.
    async fn ensure_user(&self, identity: &str) -> Result<UserId, PersistError>;

    /// Durably store one entry and return it with its store-assigned fields.
    ///
    /// Must be safe to call again with an entry whose earlier append failed.
    async fn append(&self, entry: &NewTimeEntry) -> Result<TimeEntry, PersistError>;

    /// Total duration per project for entries whose date falls in `range`.
    async fn query_by_period(
        &self,
        identity: &str,
        range: PeriodRange,
    ) -> Result<BTreeMap<String, Duration>, PersistError>;

    /// Distinct projects the user has recorded time against, in first-use order.
    async fn known_projects(&self, identity: &str) -> Result<Vec<String>, PersistError>;

    /// The user's most recent entries, newest first.
    async fn recent_entries(
        &self,
        identity: &str,
        limit: usize,
    ) -> Result<Vec<TimeEntry>, PersistError>;
}
