//! Error types for punchclock.
//!
//! `PunchError` covers the process-level concerns (configuration, storage,
//! I/O). The conversation core uses the narrower `ValidationError`,
//! `PersistError` and `RoutingError`, none of which is fatal.

use thiserror::Error;

use crate::features::tracking::SessionStatus;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum PunchError {
    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The local database failed.
    #[error("Database error: {0}")]
    Database(String),

    /// I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Input or output could not be parsed or serialized.
    #[error("Parse error: {0}")]
    Parse(String),

    /// A requested item does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The persistence gateway refused an operation.
    #[error(transparent)]
    Persist(#[from] PersistError),
}

impl From<serde_json::Error> for PunchError {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(format!("JSON serialization failed: {e}"))
    }
}

/// Failure reported by a `PersistenceGateway`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// The store could not be reached.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// The store rejected the write.
    #[error("write rejected: {0}")]
    Rejected(String),
}

/// Input that the session cannot accept. Recovered by re-prompting.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("the comment is empty")]
    EmptyComment,

    #[error("the project name is empty")]
    EmptyProjectName,

    #[error("\"{0}\" is a reserved word")]
    ReservedProjectName(String),

    #[error("there is no project called \"{0}\"")]
    UnknownProject(String),

    #[error("cannot {event} while {state}")]
    InvalidTransition {
        event: &'static str,
        state: SessionStatus,
    },
}

/// Why `TimeEntryRecorder::record` did not produce an entry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persist(#[from] PersistError),
}

/// No state rule accepted the text. Always answered with a clarifying reply.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("\"{text}\" is not understood while {state}")]
pub struct RoutingError {
    pub state: SessionStatus,
    pub text: String,
}
