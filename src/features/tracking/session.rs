//! Per-user conversation state machine.
//!
//! A session moves through project selection, a running timer, and the
//! comment prompt that turns the stopped interval into a time entry:
//!
//! ```text
//! SelectingProject --project--> Running --stop--> AwaitingComment --saved--> SelectingProject
//!        |                         ^                     |
//!   new project                    |                save failed
//!        v                         |                     v
//! AwaitingNewProject ---name-------+               ErrorRecovery --retry ok--> SelectingProject
//! ```
//!
//! Cancel leaves any state for the idle state, discarding timer data.
//! Timer data lives inside the state variants, so a project without a start
//! time (or an elapsed time outside the comment/recovery states) cannot be
//! represented.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::registry::ProjectRegistry;
use crate::core::format_hhmm;
use crate::error::ValidationError;

/// Name of the state a session is in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    SelectingProject,
    AwaitingNewProject,
    Running,
    AwaitingComment,
    ErrorRecovery,
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelectingProject => write!(f, "selecting a project"),
            Self::AwaitingNewProject => write!(f, "waiting for a project name"),
            Self::Running => write!(f, "the timer is running"),
            Self::AwaitingComment => write!(f, "waiting for a comment"),
            Self::ErrorRecovery => write!(f, "an entry is waiting to be saved"),
        }
    }
}

/// A stopped span of work on one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    project: String,
    started_at: DateTime<Utc>,
    stopped_at: DateTime<Utc>,
}

impl Interval {
    /// Build an interval. A stop earlier than the start is clamped to the start.
    #[must_use]
    pub fn new(project: impl Into<String>, started_at: DateTime<Utc>, stopped_at: DateTime<Utc>) -> Self {
        Self {
            project: project.into(),
            started_at,
            stopped_at: stopped_at.max(started_at),
        }
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

    /// `stopped_at - started_at`, never negative.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.stopped_at.signed_duration_since(self.started_at)
    }

    /// Elapsed time as `HH:MM`.
    #[must_use]
    pub fn format_elapsed(&self) -> String {
        format_hhmm(self.elapsed())
    }
}

/// State plus the timer data that state owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SelectingProject,
    AwaitingNewProject,
    Running {
        project: String,
        started_at: DateTime<Utc>,
    },
    AwaitingComment(Interval),
    ErrorRecovery {
        interval: Interval,
        comment: String,
        failed_at: DateTime<Utc>,
    },
}

/// One user's conversation state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSession {
    state: SessionState,
}

impl UserSession {
    /// Initial session for a user: the project menu if any project is known,
    /// otherwise the new-project prompt.
    #[must_use]
    pub fn first_contact(registry: &ProjectRegistry) -> Self {
        Self {
            state: idle_state(registry),
        }
    }

    #[must_use]
    pub const fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        match self.state {
            SessionState::SelectingProject => SessionStatus::SelectingProject,
            SessionState::AwaitingNewProject => SessionStatus::AwaitingNewProject,
            SessionState::Running { .. } => SessionStatus::Running,
            SessionState::AwaitingComment(_) => SessionStatus::AwaitingComment,
            SessionState::ErrorRecovery { .. } => SessionStatus::ErrorRecovery,
        }
    }

    /// Project the timer data belongs to.
    #[must_use]
    pub fn active_project(&self) -> Option<&str> {
        match &self.state {
            SessionState::Running { project, .. } => Some(project),
            SessionState::AwaitingComment(interval)
            | SessionState::ErrorRecovery { interval, .. } => Some(interval.project()),
            SessionState::SelectingProject | SessionState::AwaitingNewProject => None,
        }
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            SessionState::Running { started_at, .. } => Some(*started_at),
            SessionState::AwaitingComment(interval)
            | SessionState::ErrorRecovery { interval, .. } => Some(interval.started_at()),
            SessionState::SelectingProject | SessionState::AwaitingNewProject => None,
        }
    }

    #[must_use]
    pub fn stopped_at(&self) -> Option<DateTime<Utc>> {
        self.pending_interval().map(Interval::stopped_at)
    }

    /// Elapsed time of the stopped interval.
    #[must_use]
    pub fn elapsed(&self) -> Option<Duration> {
        self.pending_interval().map(Interval::elapsed)
    }

    /// The stopped interval still waiting to be recorded.
    #[must_use]
    pub const fn pending_interval(&self) -> Option<&Interval> {
        match &self.state {
            SessionState::AwaitingComment(interval)
            | SessionState::ErrorRecovery { interval, .. } => Some(interval),
            _ => None,
        }
    }

    /// Comment kept after a failed save.
    #[must_use]
    pub fn pending_comment(&self) -> Option<&str> {
        match &self.state {
            SessionState::ErrorRecovery { comment, .. } => Some(comment),
            _ => None,
        }
    }

    #[must_use]
    pub const fn failed_at(&self) -> Option<DateTime<Utc>> {
        match &self.state {
            SessionState::ErrorRecovery { failed_at, .. } => Some(*failed_at),
            _ => None,
        }
    }

    /// True while unrecorded work is held (running, stopped, or failed).
    #[must_use]
    pub const fn has_timer(&self) -> bool {
        matches!(
            self.state,
            SessionState::Running { .. }
                | SessionState::AwaitingComment(_)
                | SessionState::ErrorRecovery { .. }
        )
    }

    /// Return to the menu or the new-project prompt.
    ///
    /// Refuses (returns `false`) while unrecorded work is held; that needs an
    /// explicit cancel.
    pub fn restart(&mut self, registry: &ProjectRegistry) -> bool {
        if self.has_timer() {
            return false;
        }
        self.state = idle_state(registry);
        true
    }

    /// Start the timer on a known project.
    ///
    /// # Errors
    ///
    /// Fails outside `SelectingProject` or for a name not in the registry.
    pub fn select_project(
        &mut self,
        name: &str,
        registry: &ProjectRegistry,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        self.require(SessionStatus::SelectingProject, "select a project")?;
        let project = registry
            .find(name)
            .ok_or_else(|| ValidationError::UnknownProject(name.trim().to_string()))?;

        self.state = SessionState::Running {
            project: project.to_string(),
            started_at: now,
        };
        Ok(())
    }

    /// Switch from the menu to the new-project prompt.
    ///
    /// # Errors
    ///
    /// Fails outside `SelectingProject`.
    pub fn request_new_project(&mut self) -> Result<(), ValidationError> {
        self.require(SessionStatus::SelectingProject, "add a project")?;
        self.state = SessionState::AwaitingNewProject;
        Ok(())
    }

    /// Register the named project (if new) and start the timer on it.
    ///
    /// Returns `true` if the project was added to the registry.
    ///
    /// # Errors
    ///
    /// Fails outside `AwaitingNewProject`, or for a blank or reserved name.
    pub fn name_new_project(
        &mut self,
        name: &str,
        registry: &mut ProjectRegistry,
        now: DateTime<Utc>,
    ) -> Result<bool, ValidationError> {
        self.require(SessionStatus::AwaitingNewProject, "name a project")?;
        let added = registry.register(name)?;

        self.state = SessionState::Running {
            project: name.trim().to_string(),
            started_at: now,
        };
        Ok(added)
    }

    /// Stop the timer.
    ///
    /// # Errors
    ///
    /// Fails unless the timer is running.
    pub fn stop(&mut self, now: DateTime<Utc>) -> Result<Interval, ValidationError> {
        let SessionState::Running {
            project,
            started_at,
        } = &self.state
        else {
            return Err(self.invalid("stop the timer"));
        };

        let interval = Interval::new(project.clone(), *started_at, now);
        self.state = SessionState::AwaitingComment(interval.clone());
        Ok(interval)
    }

    /// The pending interval was saved: clear timer data and show the menu.
    ///
    /// # Errors
    ///
    /// Fails unless an interval is pending.
    pub fn complete(&mut self, registry: &ProjectRegistry) -> Result<(), ValidationError> {
        if self.pending_interval().is_none() {
            return Err(self.invalid("complete an entry"));
        }
        self.state = idle_state(registry);
        Ok(())
    }

    /// The save failed: keep interval and comment for a retry.
    ///
    /// # Errors
    ///
    /// Fails unless an interval is pending.
    pub fn fail(&mut self, comment: &str, failed_at: DateTime<Utc>) -> Result<(), ValidationError> {
        let Some(interval) = self.pending_interval().cloned() else {
            return Err(self.invalid("keep a failed entry"));
        };
        self.state = SessionState::ErrorRecovery {
            interval,
            comment: comment.trim().to_string(),
            failed_at,
        };
        Ok(())
    }

    /// Abort from any state. Returns `true` if timer data was discarded.
    pub fn cancel(&mut self, registry: &ProjectRegistry) -> bool {
        let discarded = self.has_timer();
        self.state = idle_state(registry);
        discarded
    }

    fn require(&self, status: SessionStatus, event: &'static str) -> Result<(), ValidationError> {
        if self.status() == status {
            Ok(())
        } else {
            Err(self.invalid(event))
        }
    }

    const fn invalid(&self, event: &'static str) -> ValidationError {
        ValidationError::InvalidTransition {
            event,
            state: self.status(),
        }
    }
}

fn idle_state(registry: &ProjectRegistry) -> SessionState {
    if registry.is_empty() {
        SessionState::AwaitingNewProject
    } else {
        SessionState::SelectingProject
    }
}
