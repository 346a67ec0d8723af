//! JSON output formatting for punchclock.

use serde::Serialize;
use serde_json::json;

use crate::bot::reply::Reply;
use crate::error::PunchError;
use crate::features::tracking::TimeEntry;

/// Format a reply as one line of JSON, so a reply stream is JSON Lines.
///
/// # Errors
///
/// Returns `PunchError::Parse` if JSON serialization fails.
pub fn format_reply_json(reply: &Reply) -> Result<String, PunchError> {
    Ok(serde_json::to_string(reply)?)
}

/// Format recorded entries as JSON
///
/// # Errors
///
/// Returns `PunchError::Parse` if JSON serialization fails.
pub fn format_entries_json(entries: &[TimeEntry], user: &str) -> Result<String, PunchError> {
    let output = json!({
        "user": user,
        "count": entries.len(),
        "items": entries
    });
    Ok(serde_json::to_string_pretty(&output)?)
}

/// Generic JSON formatter for any serializable type
///
/// # Errors
///
/// Returns `PunchError::Parse` if JSON serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, PunchError> {
    Ok(serde_json::to_string_pretty(value)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tracking::{Interval, NewTimeEntry};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_reply_is_single_line() {
        let reply = Reply::new("alice", "Which project?\nPick one.")
            .with_quick_replies(vec!["Design".to_string(), "new project".to_string()]);

        let output = format_reply_json(&reply).unwrap();

        assert!(!output.contains('\n'));
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["user"], "alice");
        assert_eq!(parsed["quick_replies"][1], "new project");
    }

    #[test]
    fn test_entries_json() {
        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let interval = Interval::new("Design", start, start + Duration::minutes(90));
        let entry = NewTimeEntry::new("alice", &interval, "drew mockups", start.date_naive())
            .unwrap()
            .into_recorded(3, start + Duration::minutes(91));

        let output = format_entries_json(&[entry], "alice").unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["count"], 1);
        assert_eq!(parsed["items"][0]["project"], "Design");
        assert_eq!(parsed["items"][0]["duration"], "01:30");
        assert_eq!(parsed["items"][0]["duration_ms"], 5_400_000);
        assert_eq!(parsed["items"][0]["date"], "2024-03-04");
    }
}
