//! Inbound and outbound messages, and the reply texts the router sends.

use serde::Serialize;

use crate::bot::tokens::{NEW_PROJECT, RETRY, START_OVER, STOP};
use crate::core::Clock;
use crate::features::tracking::{
    Interval, PeriodReport, ProjectRegistry, SessionState, StatsPeriod, TimeEntry, UserSession,
};

/// A text message from one user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub user: String,
    pub text: String,
}

impl InboundEvent {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
        }
    }
}

/// A message back to one user, with the buttons to offer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reply {
    pub user: String,
    pub text: String,
    pub quick_replies: Vec<String>,
}

impl Reply {
    pub fn new(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
            quick_replies: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_quick_replies(mut self, quick_replies: Vec<String>) -> Self {
        self.quick_replies = quick_replies;
        self
    }
}

/// Buttons for the session's current state.
#[must_use]
pub fn quick_replies_for(session: &UserSession, registry: &ProjectRegistry) -> Vec<String> {
    match session.state() {
        SessionState::SelectingProject => registry
            .names()
            .iter()
            .cloned()
            .chain(std::iter::once(NEW_PROJECT.to_string()))
            .collect(),
        SessionState::AwaitingNewProject if registry.is_empty() => Vec::new(),
        SessionState::AwaitingNewProject | SessionState::AwaitingComment(_) => {
            vec![START_OVER.to_string()]
        }
        SessionState::Running { .. } => vec![STOP.to_string(), START_OVER.to_string()],
        SessionState::ErrorRecovery { .. } => vec![RETRY.to_string(), START_OVER.to_string()],
    }
}

/// Buttons for choosing a statistics period.
#[must_use]
pub fn stats_quick_replies() -> Vec<String> {
    StatsPeriod::ALL
        .iter()
        .map(|p| format!("stats {}", p.keyword()))
        .collect()
}

pub fn project_menu() -> String {
    "Which project are you working on?".to_string()
}

pub fn new_project_prompt(has_projects: bool) -> String {
    if has_projects {
        "What is the new project called?".to_string()
    } else {
        "You have no projects yet. What is the first one called?".to_string()
    }
}

/// The prompt that belongs to an idle state.
pub fn idle_prompt(session: &UserSession, registry: &ProjectRegistry) -> String {
    match session.state() {
        SessionState::AwaitingNewProject => new_project_prompt(!registry.is_empty()),
        _ => project_menu(),
    }
}

pub fn started(project: &str, added: bool) -> String {
    if added {
        format!("Added \"{project}\". Timer started. Send \"stop\" when you are done.")
    } else {
        format!("Timer started on \"{project}\". Send \"stop\" when you are done.")
    }
}

pub fn stopped(interval: &Interval) -> String {
    format!(
        "Stopped \"{}\" after {}. What did you work on?",
        interval.project(),
        interval.format_elapsed()
    )
}

pub fn recorded(entry: &TimeEntry) -> String {
    format!("Saved {}.", entry.summary())
}

pub fn persist_failed(interval: &Interval) -> String {
    format!(
        "Could not save {} on \"{}\". Your time is kept: send \"retry\" to try again or \"start over\" to discard it.",
        interval.format_elapsed(),
        interval.project()
    )
}

pub fn cancelled(discarded: bool) -> String {
    if discarded {
        "Timer discarded.".to_string()
    } else {
        "Nothing to cancel.".to_string()
    }
}

/// Reply to `start` while unrecorded work is held.
pub fn timer_in_flight(session: &UserSession) -> String {
    match session.state() {
        SessionState::Running { project, .. } => format!(
            "The timer is running on \"{project}\". Send \"stop\" first, or \"start over\" to discard it."
        ),
        SessionState::AwaitingComment(_) => {
            "Tell me what you worked on first, or send \"start over\" to discard the time."
                .to_string()
        }
        _ => "Your last entry is not saved yet. Send \"retry\" or \"start over\".".to_string(),
    }
}

/// Clarifying reply for text no rule accepted.
pub fn nudge(session: &UserSession, registry: &ProjectRegistry, clock: &dyn Clock) -> String {
    match session.state() {
        SessionState::Running { project, started_at } => {
            format!(
                "The timer is running on \"{project}\" since {}. Send \"stop\" when you are done.",
                clock.local_time(*started_at).format("%H:%M")
            )
        }
        SessionState::AwaitingComment(_) => {
            "Tell me what you worked on, or send \"start over\" to discard the time.".to_string()
        }
        SessionState::ErrorRecovery { .. } => {
            "Your last entry is not saved yet. Send \"retry\" or \"start over\".".to_string()
        }
        SessionState::SelectingProject => {
            "Pick a project from the list, or send \"new project\".".to_string()
        }
        SessionState::AwaitingNewProject => new_project_prompt(!registry.is_empty()),
    }
}

pub fn unknown_project(name: &str) -> String {
    format!("There is no project called \"{name}\". Pick one from the list or send \"new project\".")
}

pub fn stats_menu() -> String {
    "Which period? Send \"stats day\", \"stats week\" or \"stats month\".".to_string()
}

pub fn stats(report: &PeriodReport) -> String {
    report.format_text()
}

pub fn stats_unavailable() -> String {
    "Statistics are unavailable right now. Please try again later.".to_string()
}

pub fn help() -> String {
    [
        "start - pick a project and start the timer",
        "stop - stop the timer",
        "stats day|week|month - time per project",
        "cancel - discard the running timer",
        "retry - save the last entry again after a failure",
    ]
    .join("\n")
}
