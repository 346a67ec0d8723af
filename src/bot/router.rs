//! Event routing.
//!
//! [`classify`] decides what an inbound text means for the session it
//! arrives in; [`EventRouter`] applies that decision. Commands are checked
//! first, then the rule of the current state, then a fallback that always
//! answers.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::bot::directory::{SessionDirectory, UserSlot};
use crate::bot::reply::{self, InboundEvent, Reply};
use crate::bot::tokens::{self, Command, NEW_PROJECT, RETRY, STOP};
use crate::core::{Clock, PersistenceGateway};
use crate::error::{PersistError, RecordError, RoutingError, ValidationError};
use crate::features::tracking::{
    PeriodReport, ProjectRegistry, SessionState, StatsPeriod, TimeEntry, TimeEntryRecorder,
    UserSession,
};

/// What an inbound text asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Start,
    Cancel,
    Stats(StatsPeriod),
    /// `stats` without a usable period.
    StatsMenu,
    Help,
    SelectProject(String),
    UnknownProject(String),
    NewProject,
    NameProject(String),
    Stop,
    Comment(String),
    Retry,
    Unmatched(RoutingError),
}

/// Classify `text` against the session state and the user's projects.
#[must_use]
pub fn classify(session: &UserSession, registry: &ProjectRegistry, text: &str) -> Route {
    if let Some(command) = tokens::parse_command(text) {
        return match command {
            Command::Start => Route::Start,
            Command::Cancel => Route::Cancel,
            Command::Stats(Some(period)) => Route::Stats(period),
            Command::Stats(None) => Route::StatsMenu,
            Command::Help => Route::Help,
        };
    }

    let trimmed = text.trim();
    match session.state() {
        SessionState::SelectingProject if tokens::is_token(text, NEW_PROJECT) => Route::NewProject,
        SessionState::SelectingProject => match registry.find(trimmed) {
            Some(project) => Route::SelectProject(project.to_string()),
            None if !trimmed.is_empty() => Route::UnknownProject(trimmed.to_string()),
            None => unmatched(session, text),
        },
        SessionState::AwaitingNewProject => Route::NameProject(trimmed.to_string()),
        SessionState::Running { .. } if tokens::is_token(text, STOP) => Route::Stop,
        SessionState::AwaitingComment(_) => Route::Comment(text.to_string()),
        SessionState::ErrorRecovery { .. } if tokens::is_token(text, RETRY) => Route::Retry,
        SessionState::Running { .. } | SessionState::ErrorRecovery { .. } => {
            unmatched(session, text)
        }
    }
}

fn unmatched(session: &UserSession, text: &str) -> Route {
    Route::Unmatched(RoutingError {
        state: session.status(),
        text: text.to_string(),
    })
}

/// Applies routes to user sessions and produces replies.
pub struct EventRouter {
    directory: Arc<SessionDirectory>,
    gateway: Arc<dyn PersistenceGateway>,
    recorder: TimeEntryRecorder,
    clock: Arc<dyn Clock>,
}

impl EventRouter {
    pub fn new(
        directory: Arc<SessionDirectory>,
        gateway: Arc<dyn PersistenceGateway>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let recorder = TimeEntryRecorder::new(Arc::clone(&gateway), Arc::clone(&clock));
        Self {
            directory,
            gateway,
            recorder,
            clock,
        }
    }

    #[must_use]
    pub fn directory(&self) -> &Arc<SessionDirectory> {
        &self.directory
    }

    /// Handle one event. The user's slot stays locked until the reply is built.
    pub async fn handle(&self, event: &InboundEvent) -> Reply {
        let user = event.user.as_str();
        let slot = self.directory.slot(user);
        let mut guard = slot.lock().await;

        if !guard.is_seeded() {
            self.seed(user, &mut guard).await;
        }

        let route = classify(&guard.session, &guard.registry, &event.text);
        debug!(user, state = %guard.session.status(), ?route, "routing event");

        let UserSlot {
            session, registry, ..
        } = &mut *guard;

        let text = match route {
            Route::StatsMenu => {
                return Reply::new(user, reply::stats_menu())
                    .with_quick_replies(reply::stats_quick_replies());
            }
            Route::Start => Self::start(session, registry),
            Route::Cancel => Self::cancel(user, session, registry),
            Route::Stats(period) => self.stats(user, period).await,
            Route::Help => reply::help(),
            Route::SelectProject(name) => self.select_project(user, session, registry, &name),
            Route::UnknownProject(name) => reply::unknown_project(&name),
            Route::NewProject => match session.request_new_project() {
                Ok(()) => reply::new_project_prompt(true),
                Err(e) => rejected(&e, &reply::nudge(session, registry, self.clock.as_ref())),
            },
            Route::NameProject(name) => self.name_project(user, session, registry, &name),
            Route::Stop => self.stop(user, session),
            Route::Comment(comment) => {
                let outcome = self.recorder.record(user, session, &comment).await;
                self.apply_outcome(user, session, registry, &comment, outcome)
            }
            Route::Retry => {
                let comment = session.pending_comment().unwrap_or_default().to_string();
                let outcome = self.recorder.retry(user, session).await;
                self.apply_outcome(user, session, registry, &comment, outcome)
            }
            Route::Unmatched(err) => {
                debug!(user, error = %err, "no rule matched");
                reply::nudge(session, registry, self.clock.as_ref())
            }
        };

        Reply::new(user, text).with_quick_replies(reply::quick_replies_for(session, registry))
    }

    async fn seed(&self, user: &str, slot: &mut UserSlot) {
        let projects: Result<Vec<String>, PersistError> = async {
            self.gateway.ensure_user(user).await?;
            self.gateway.known_projects(user).await
        }
        .await;

        match projects {
            Ok(projects) => {
                debug!(user, count = projects.len(), "seeding project registry");
                slot.seed(projects);
            }
            Err(e) => warn!(user, error = %e, "could not load projects, will retry"),
        }
    }

    fn start(session: &mut UserSession, registry: &ProjectRegistry) -> String {
        if session.restart(registry) {
            reply::idle_prompt(session, registry)
        } else {
            reply::timer_in_flight(session)
        }
    }

    fn cancel(user: &str, session: &mut UserSession, registry: &ProjectRegistry) -> String {
        let discarded = session.cancel(registry);
        if discarded {
            info!(user, "timer discarded");
        }
        format!(
            "{}\n{}",
            reply::cancelled(discarded),
            reply::idle_prompt(session, registry)
        )
    }

    async fn stats(&self, user: &str, period: StatsPeriod) -> String {
        let range = period.range_for(self.clock.today());
        match self.gateway.query_by_period(user, range).await {
            Ok(totals) => reply::stats(&PeriodReport::from_totals(period, range, &totals)),
            Err(e) => {
                warn!(user, period = period.keyword(), error = %e, "stats query failed");
                reply::stats_unavailable()
            }
        }
    }

    fn select_project(
        &self,
        user: &str,
        session: &mut UserSession,
        registry: &ProjectRegistry,
        name: &str,
    ) -> String {
        match session.select_project(name, registry, self.clock.now()) {
            Ok(()) => {
                info!(user, project = name, "timer started");
                reply::started(name, false)
            }
            Err(e) => rejected(&e, &reply::project_menu()),
        }
    }

    fn name_project(
        &self,
        user: &str,
        session: &mut UserSession,
        registry: &mut ProjectRegistry,
        name: &str,
    ) -> String {
        match session.name_new_project(name, registry, self.clock.now()) {
            Ok(added) => {
                info!(user, project = name, added, "timer started");
                reply::started(name, added)
            }
            Err(e) => rejected(&e, &reply::new_project_prompt(!registry.is_empty())),
        }
    }

    fn stop(&self, user: &str, session: &mut UserSession) -> String {
        match session.stop(self.clock.now()) {
            Ok(interval) => {
                info!(
                    user,
                    project = interval.project(),
                    elapsed = %interval.format_elapsed(),
                    "timer stopped"
                );
                reply::stopped(&interval)
            }
            Err(e) => rejected(&e, &reply::timer_in_flight(session)),
        }
    }

    fn apply_outcome(
        &self,
        user: &str,
        session: &mut UserSession,
        registry: &ProjectRegistry,
        comment: &str,
        outcome: Result<TimeEntry, RecordError>,
    ) -> String {
        match outcome {
            Ok(entry) => {
                if let Err(e) = session.complete(registry) {
                    warn!(user, error = %e, "session did not complete");
                }
                format!("{}\n{}", reply::recorded(&entry), reply::idle_prompt(session, registry))
            }
            Err(RecordError::Validation(e)) => rejected(&e, "What did you work on?"),
            Err(RecordError::Persist(e)) => {
                let interval = session.pending_interval().cloned();
                if let Err(e) = session.fail(comment, self.clock.now()) {
                    warn!(user, error = %e, "failed entry not kept");
                }
                warn!(user, error = %e, "entry kept for retry");
                interval.map_or_else(
                    || reply::nudge(session, registry, self.clock.as_ref()),
                    |interval| reply::persist_failed(&interval),
                )
            }
        }
    }
}

fn rejected(error: &ValidationError, prompt: &str) -> String {
    format!("Sorry, {error}. {prompt}")
}
