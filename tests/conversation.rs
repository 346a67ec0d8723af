use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use tokio::sync::mpsc;

use punchclock::bot::{Dispatcher, EventRouter, InboundEvent, Reply, SessionDirectory};
use punchclock::core::{ManualClock, PersistenceGateway, UserId};
use punchclock::error::PersistError;
use punchclock::features::tracking::{
    NewTimeEntry, PeriodRange, SessionStatus, SqliteGateway, TimeEntry,
};
use punchclock::storage::Database;

/// SQLite store whose writes can be switched off.
struct FlakyGateway {
    inner: SqliteGateway,
    down: AtomicBool,
}

impl FlakyGateway {
    fn new() -> Self {
        Self {
            inner: SqliteGateway::new(Database::open_in_memory().unwrap()),
            down: AtomicBool::new(false),
        }
    }

    fn set_down(&self, down: bool) {
        self.down.store(down, Ordering::SeqCst);
    }
}

#[async_trait]
impl PersistenceGateway for FlakyGateway {
    async fn ensure_user(&self, identity: &str) -> Result<UserId, PersistError> {
        self.inner.ensure_user(identity).await
    }

    async fn append(&self, entry: &NewTimeEntry) -> Result<TimeEntry, PersistError> {
        if self.down.load(Ordering::SeqCst) {
            return Err(PersistError::Unavailable("connection refused".to_string()));
        }
        self.inner.append(entry).await
    }

    async fn query_by_period(
        &self,
        identity: &str,
        range: PeriodRange,
    ) -> Result<BTreeMap<String, Duration>, PersistError> {
        self.inner.query_by_period(identity, range).await
    }

    async fn known_projects(&self, identity: &str) -> Result<Vec<String>, PersistError> {
        self.inner.known_projects(identity).await
    }

    async fn recent_entries(
        &self,
        identity: &str,
        limit: usize,
    ) -> Result<Vec<TimeEntry>, PersistError> {
        self.inner.recent_entries(identity, limit).await
    }
}

fn nine_am() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 9, 0, 0).unwrap()
}

struct Harness {
    router: Arc<EventRouter>,
    gateway: Arc<FlakyGateway>,
    clock: Arc<ManualClock>,
}

impl Harness {
    fn new() -> Self {
        Self::with_gateway(Arc::new(FlakyGateway::new()))
    }

    fn with_gateway(gateway: Arc<FlakyGateway>) -> Self {
        let clock = Arc::new(ManualClock::new(nine_am()));
        let directory = Arc::new(SessionDirectory::new(clock.clone(), Duration::minutes(60)));
        let router = Arc::new(EventRouter::new(directory, gateway.clone(), clock.clone()));
        Self {
            router,
            gateway,
            clock,
        }
    }

    async fn send(&self, user: &str, text: &str) -> Reply {
        self.router.handle(&InboundEvent::new(user, text)).await
    }

    async fn status(&self, user: &str) -> SessionStatus {
        self.router
            .directory()
            .snapshot(user)
            .await
            .unwrap()
            .0
            .status()
    }
}

#[tokio::test]
async fn test_design_for_ninety_minutes() {
    let h = Harness::new();

    let reply = h.send("alice", "start").await;
    assert!(reply.text.contains("What is the first one called?"));
    assert_eq!(h.status("alice").await, SessionStatus::AwaitingNewProject);

    h.send("alice", "Design").await;
    let (session, _) = h.router.directory().snapshot("alice").await.unwrap();
    assert_eq!(session.status(), SessionStatus::Running);
    assert_eq!(session.active_project(), Some("Design"));
    assert_eq!(session.started_at(), Some(nine_am()));

    h.clock.advance(Duration::minutes(90));
    let reply = h.send("alice", "stop").await;
    assert!(reply.text.contains("01:30"));
    let (session, _) = h.router.directory().snapshot("alice").await.unwrap();
    assert_eq!(session.status(), SessionStatus::AwaitingComment);
    assert_eq!(session.elapsed(), Some(Duration::minutes(90)));

    let reply = h.send("alice", "drew mockups").await;
    assert_eq!(reply.quick_replies, vec!["Design", "new project"]);
    assert_eq!(h.status("alice").await, SessionStatus::SelectingProject);

    let entries = h.gateway.recent_entries("alice", 10).await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].project(), "Design");
    assert_eq!(entries[0].duration(), Duration::minutes(90));
    assert_eq!(entries[0].comment(), "drew mockups");
}

#[tokio::test]
async fn test_failed_save_keeps_everything() {
    let h = Harness::new();
    h.send("alice", "Design").await;
    h.clock.advance(Duration::minutes(90));
    h.send("alice", "stop").await;

    h.gateway.set_down(true);
    let reply = h.send("alice", "drew mockups").await;

    assert!(reply.text.contains("Could not save"));
    let (session, registry) = h.router.directory().snapshot("alice").await.unwrap();
    assert_eq!(session.status(), SessionStatus::ErrorRecovery);
    assert_eq!(session.active_project(), Some("Design"));
    assert_eq!(session.elapsed(), Some(Duration::minutes(90)));
    assert_eq!(session.pending_comment(), Some("drew mockups"));
    assert_eq!(session.failed_at(), Some(nine_am() + Duration::minutes(90)));
    assert!(registry.contains("Design"));
    assert!(h.gateway.recent_entries("alice", 10).await.unwrap().is_empty());

    // A failed retry refreshes the failure time
    h.clock.advance(Duration::minutes(5));
    h.send("alice", "retry").await;
    let (session, _) = h.router.directory().snapshot("alice").await.unwrap();
    assert_eq!(session.failed_at(), Some(nine_am() + Duration::minutes(95)));

    h.gateway.set_down(false);
    let reply = h.send("alice", "retry").await;
    assert!(reply.text.contains("Saved 01:30"));
    assert_eq!(h.status("alice").await, SessionStatus::SelectingProject);
    assert_eq!(h.gateway.recent_entries("alice", 10).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_one_users_failure_does_not_touch_another() {
    let h = Harness::new();
    h.send("alice", "Design").await;
    h.send("bob", "Ops").await;
    h.send("alice", "stop").await;
    h.send("bob", "stop").await;

    h.gateway.set_down(true);
    h.send("alice", "drew mockups").await;
    h.gateway.set_down(false);
    h.send("bob", "paged").await;

    assert_eq!(h.status("alice").await, SessionStatus::ErrorRecovery);
    assert_eq!(h.status("bob").await, SessionStatus::SelectingProject);
    let (_, bob_projects) = h.router.directory().snapshot("bob").await.unwrap();
    assert_eq!(bob_projects.names(), &["Ops"]);
}

#[tokio::test]
async fn test_cancel_from_every_state() {
    let h = Harness::new();
    let reach = [
        vec![],
        vec!["Design"],
        vec!["Design", "stop"],
        vec!["Design", "stop", "notes"],
    ];

    for (i, steps) in reach.iter().enumerate() {
        let user = format!("user{i}");
        if i == 3 {
            h.gateway.set_down(true);
        }
        for step in steps {
            h.send(&user, step).await;
        }
        h.gateway.set_down(false);

        h.send(&user, "cancel").await;

        let (session, registry) = h.router.directory().snapshot(&user).await.unwrap();
        assert!(!session.has_timer());
        let expected = if registry.is_empty() {
            SessionStatus::AwaitingNewProject
        } else {
            SessionStatus::SelectingProject
        };
        assert_eq!(session.status(), expected);
    }
    assert!(h.gateway.recent_entries("user3", 10).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_registry_is_seeded_from_the_store() {
    let gateway = Arc::new(FlakyGateway::new());
    {
        let h = Harness::with_gateway(gateway.clone());
        for text in ["Design", "stop", "drew mockups", "new project", "Ops", "stop", "ran backups"] {
            h.send("alice", text).await;
        }
    }

    let h = Harness::with_gateway(gateway);
    let reply = h.send("alice", "start").await;

    assert_eq!(reply.quick_replies, vec!["Design", "Ops", "new project"]);
    assert_eq!(h.status("alice").await, SessionStatus::SelectingProject);
}

#[tokio::test]
async fn test_replay_is_deterministic() {
    let script = ["start", "Design", "stop", "drew mockups", "Design", "stop", "cancel"];

    let mut outcomes = Vec::new();
    for _ in 0..2 {
        let h = Harness::new();
        let mut texts = Vec::new();
        for text in script {
            h.clock.advance(Duration::minutes(10));
            texts.push(h.send("alice", text).await.text);
        }
        let (session, registry) = h.router.directory().snapshot("alice").await.unwrap();
        outcomes.push((texts, session, registry));
    }

    assert_eq!(outcomes[0], outcomes[1]);
}

#[tokio::test]
async fn test_stop_then_comment_back_to_back() {
    let h = Harness::new();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::new(h.router.clone(), tx);

    dispatcher.submit(InboundEvent::new("alice", "Design"));
    dispatcher.submit(InboundEvent::new("alice", "stop"));
    dispatcher.submit(InboundEvent::new("alice", "drew mockups"));
    dispatcher.shutdown().await;

    let mut texts = Vec::new();
    while let Some(reply) = rx.recv().await {
        texts.push(reply.text);
    }

    assert_eq!(texts.len(), 3);
    assert!(texts[0].contains("Timer started") || texts[0].starts_with("Added"));
    assert!(texts[1].starts_with("Stopped"));
    assert!(texts[2].starts_with("Saved"));
    assert_eq!(h.gateway.recent_entries("alice", 10).await.unwrap().len(), 1);
}
