//! Owner of every user's session and project registry.
//!
//! Each user gets a slot behind its own async mutex, so handlers for one user
//! run one at a time while other users proceed independently. The map itself
//! sits behind a plain mutex that is only held for lookups.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info};

use crate::core::Clock;
use crate::features::tracking::{ProjectRegistry, UserSession};

/// One user's conversation state.
#[derive(Debug)]
pub struct UserSlot {
    pub session: UserSession,
    pub registry: ProjectRegistry,
    seeded: bool,
}

impl UserSlot {
    fn new() -> Self {
        let registry = ProjectRegistry::new();
        Self {
            session: UserSession::first_contact(&registry),
            registry,
            seeded: false,
        }
    }

    /// Has the registry been loaded from the store yet?
    #[must_use]
    pub const fn is_seeded(&self) -> bool {
        self.seeded
    }

    /// Load previously recorded project names into the registry.
    ///
    /// A user who has only seen the first-project prompt is moved to the menu
    /// once names are known.
    pub fn seed<I, S>(&mut self, projects: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let was_empty = self.registry.is_empty();
        for name in projects {
            // Names recorded before a word became reserved are skipped
            let _ = self.registry.register(name.as_ref());
        }
        if was_empty && !self.registry.is_empty() {
            self.session.restart(&self.registry);
        }
        self.seeded = true;
    }
}

pub type SharedSlot = Arc<tokio::sync::Mutex<UserSlot>>;

struct DirectoryEntry {
    slot: SharedSlot,
    last_seen: DateTime<Utc>,
}

/// Identity-keyed map of user slots.
pub struct SessionDirectory {
    entries: Mutex<HashMap<String, DirectoryEntry>>,
    clock: Arc<dyn Clock>,
    idle_timeout: Duration,
}

impl SessionDirectory {
    pub fn new(clock: Arc<dyn Clock>, idle_timeout: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
            idle_timeout,
        }
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<String, DirectoryEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The user's slot, created on first contact.
    pub fn slot(&self, user: &str) -> SharedSlot {
        let now = self.clock.now();
        let mut entries = self.entries();
        let entry = entries.entry(user.to_string()).or_insert_with(|| {
            debug!(user, "creating session");
            DirectoryEntry {
                slot: Arc::new(tokio::sync::Mutex::new(UserSlot::new())),
                last_seen: now,
            }
        });
        entry.last_seen = now;
        Arc::clone(&entry.slot)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    #[must_use]
    pub fn contains(&self, user: &str) -> bool {
        self.entries().contains_key(user)
    }

    /// Evict sessions idle for longer than the timeout.
    ///
    /// A session is kept while it holds unrecorded work, while a handler has
    /// it locked, or while anyone else holds its slot. Returns the evicted
    /// identities.
    pub fn reap_idle(&self) -> Vec<String> {
        let cutoff = self.clock.now() - self.idle_timeout;
        let mut evicted = Vec::new();

        self.entries().retain(|user, entry| {
            if entry.last_seen > cutoff || Arc::strong_count(&entry.slot) > 1 {
                return true;
            }
            let keep = entry
                .slot
                .try_lock()
                .map_or(true, |slot| slot.session.has_timer());
            if !keep {
                evicted.push(user.clone());
            }
            keep
        });

        if !evicted.is_empty() {
            info!(count = evicted.len(), "evicted idle sessions");
        }
        evicted
    }

    /// Copy of a user's session and registry, if the user is known.
    pub async fn snapshot(&self, user: &str) -> Option<(UserSession, ProjectRegistry)> {
        let slot = {
            let entries = self.entries();
            Arc::clone(&entries.get(user)?.slot)
        };
        let slot = slot.lock().await;
        Some((slot.session.clone(), slot.registry.clone()))
    }
}
