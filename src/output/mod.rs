//! Output formatting for punchclock.
//!
//! This module renders replies, period reports and entry history either for
//! a terminal or as JSON.

mod json;
mod pretty;

use crate::bot::reply::Reply;
use crate::cli::args::OutputFormat;
use crate::error::PunchError;
use crate::features::tracking::{PeriodReport, TimeEntry};

pub use json::*;
pub use pretty::*;

/// Format a bot reply based on output format
///
/// # Errors
///
/// Returns `PunchError::Parse` if JSON serialization fails.
pub fn format_reply(reply: &Reply, format: OutputFormat) -> Result<String, PunchError> {
    match format {
        OutputFormat::Pretty => Ok(format_reply_pretty(reply)),
        OutputFormat::Json => format_reply_json(reply),
    }
}

/// Format a period report based on output format
///
/// # Errors
///
/// Returns `PunchError::Parse` if JSON serialization fails.
pub fn format_report(report: &PeriodReport, format: OutputFormat) -> Result<String, PunchError> {
    match format {
        OutputFormat::Pretty => Ok(format_report_pretty(report)),
        OutputFormat::Json => to_json(report),
    }
}

/// Format recorded entries based on output format
///
/// # Errors
///
/// Returns `PunchError::Parse` if JSON serialization fails.
pub fn format_entries(
    entries: &[TimeEntry],
    user: &str,
    format: OutputFormat,
) -> Result<String, PunchError> {
    match format {
        OutputFormat::Pretty => Ok(format_entries_pretty(entries, user)),
        OutputFormat::Json => format_entries_json(entries, user),
    }
}
