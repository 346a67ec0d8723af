//! Per-project time tracking.
//!
//! Provides the conversation state machine and the time entry lifecycle:
//! - Per-user project lists
//! - Session states from project selection to the comment prompt
//! - Recording stopped intervals as time entries
//! - Period statistics (day, week, month)

pub mod recorder;
pub mod registry;
pub mod report;
pub mod session;
pub mod storage;

pub use recorder::{NewTimeEntry, TimeEntry, TimeEntryRecorder};
pub use registry::ProjectRegistry;
pub use report::{PeriodRange, PeriodReport, ProjectTotal, StatsPeriod};
pub use session::{Interval, SessionState, SessionStatus, UserSession};
pub use storage::SqliteGateway;
