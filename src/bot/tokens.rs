//! Command and control tokens understood by the conversation.
//!
//! Matching is case-insensitive and ignores surrounding and repeated
//! whitespace. A leading `/` is accepted on commands so that chat clients
//! with slash-command menus work unchanged.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::features::tracking::StatsPeriod;

/// Quick reply that opens the new-project prompt.
pub const NEW_PROJECT: &str = "new project";
/// Quick reply that stops the running timer.
pub const STOP: &str = "stop";
/// Quick reply alias for cancel.
pub const START_OVER: &str = "start over";
/// Quick reply that retries a failed save.
pub const RETRY: &str = "retry";

static STATS_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/?stats(?:\s+(\S+))?$").unwrap_or_else(|e| panic!("Invalid stats regex: {e}"))
});

/// Explicit commands, checked before any state rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Re-enter project selection.
    Start,
    /// Abort whatever timer is in flight.
    Cancel,
    /// Period statistics. `None` for a bare `stats`.
    Stats(Option<StatsPeriod>),
    /// Show usage.
    Help,
}

/// Lowercase and collapse whitespace.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Does `text` spell `token`?
#[must_use]
pub fn is_token(text: &str, token: &str) -> bool {
    normalize(text) == token
}

/// Parse an explicit command.
#[must_use]
pub fn parse_command(text: &str) -> Option<Command> {
    let normalized = normalize(text);

    match normalized.as_str() {
        "start" | "/start" => return Some(Command::Start),
        "cancel" | "/cancel" | START_OVER => return Some(Command::Cancel),
        "help" | "/help" => return Some(Command::Help),
        _ => {}
    }

    // "stats" followed by anything but a period is ordinary text
    let caps = STATS_PATTERN.captures(&normalized)?;
    match caps.get(1) {
        None => Some(Command::Stats(None)),
        Some(selector) => StatsPeriod::parse(selector.as_str()).map(|p| Command::Stats(Some(p))),
    }
}

/// Words that can never be used as a project name.
#[must_use]
pub fn is_reserved(text: &str) -> bool {
    let normalized = normalize(text);
    parse_command(&normalized).is_some()
        || [NEW_PROJECT, STOP, RETRY].contains(&normalized.as_str())
}
