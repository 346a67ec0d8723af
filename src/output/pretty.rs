use colored::Colorize;

use crate::bot::reply::Reply;
use crate::core::format_hhmm;
use crate::features::tracking::{PeriodReport, TimeEntry};

/// Format a reply as the bot's side of a chat transcript
pub fn format_reply_pretty(reply: &Reply) -> String {
    let mut output = String::new();
    for (i, line) in reply.text.lines().enumerate() {
        if i == 0 {
            output.push_str(&format!("{} {}\n", format!("{}>", reply.user).cyan().bold(), line));
        } else {
            output.push_str(&format!("{:width$} {line}\n", "", width = reply.user.len() + 1));
        }
    }

    if !reply.quick_replies.is_empty() {
        let buttons = reply
            .quick_replies
            .iter()
            .map(|label| format!("[{label}]"))
            .collect::<Vec<_>>()
            .join(" ");
        output.push_str(&format!("  {}\n", buttons.dimmed()));
    }

    output
}

/// Format a period report as a table
pub fn format_report_pretty(report: &PeriodReport) -> String {
    let title = format!(
        "{} ({} to {})",
        report.period.display_name(),
        report.range.start,
        report.range.end.pred_opt().unwrap_or(report.range.end)
    );

    if report.is_empty() {
        return format!("{}\n  No time recorded", title.bold());
    }

    let mut output = format!("{}\n", title.bold());
    output.push_str(&"─".repeat(40));
    output.push('\n');

    for row in &report.projects {
        output.push_str(&format!("  {}  {}\n", row.duration.yellow(), row.project));
    }

    output.push_str(&"─".repeat(40));
    output.push('\n');
    output.push_str(&format!("  {}  {}\n", report.total.yellow().bold(), "total".bold()));

    output
}

/// Format recorded entries, newest first
pub fn format_entries_pretty(entries: &[TimeEntry], user: &str) -> String {
    if entries.is_empty() {
        return format!("History for {user} (0 entries)\n  No entries");
    }

    let mut output = format!("History for {user} ({} entries)\n", entries.len());
    output.push_str(&"─".repeat(60));
    output.push('\n');

    for entry in entries {
        output.push_str(&format!(
            "{}  {}  {}  {}\n",
            entry.date().to_string().dimmed(),
            format_hhmm(entry.duration()).yellow(),
            entry.project().bold(),
            entry.comment()
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::tracking::{Interval, NewTimeEntry, StatsPeriod};
    use chrono::{Duration, NaiveDate, TimeZone, Utc};
    use std::collections::BTreeMap;

    #[test]
    fn test_reply_pretty_lists_buttons() {
        colored::control::set_override(false);
        let reply = Reply::new("alice", "Saved.\nWhich project?")
            .with_quick_replies(vec!["Design".to_string(), "new project".to_string()]);

        let output = format_reply_pretty(&reply);

        assert_eq!(output, "alice> Saved.\n       Which project?\n  [Design] [new project]\n");
    }

    #[test]
    fn test_report_pretty() {
        colored::control::set_override(false);
        let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let mut totals = BTreeMap::new();
        totals.insert("Design".to_string(), Duration::minutes(90));
        totals.insert("Ops".to_string(), Duration::minutes(15));
        let report =
            PeriodReport::from_totals(StatsPeriod::Week, StatsPeriod::Week.range_for(today), &totals);

        let output = format_report_pretty(&report);

        assert!(output.starts_with("This week (2024-03-04 to 2024-03-10)"));
        assert!(output.contains("01:30  Design"));
        assert!(output.contains("01:45  total"));
    }

    #[test]
    fn test_entries_pretty() {
        colored::control::set_override(false);
        assert!(format_entries_pretty(&[], "alice").contains("No entries"));

        let start = Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap();
        let interval = Interval::new("Design", start, start + Duration::minutes(90));
        let entry = NewTimeEntry::new("alice", &interval, "drew mockups", start.date_naive())
            .unwrap()
            .into_recorded(1, start);

        let output = format_entries_pretty(&[entry], "alice");
        assert!(output.contains("2024-03-04  01:30  Design  drew mockups"));
    }
}
