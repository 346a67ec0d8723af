//! Per-user event queues.
//!
//! Every user gets an unbounded FIFO queue drained by its own worker task,
//! so one user's events are handled in arrival order while different users
//! proceed concurrently. Replies from all workers funnel into one channel.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedSender};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::bot::reply::{InboundEvent, Reply};
use crate::bot::router::EventRouter;

pub struct Dispatcher {
    router: Arc<EventRouter>,
    replies: UnboundedSender<Reply>,
    queues: HashMap<String, UnboundedSender<InboundEvent>>,
    workers: JoinSet<()>,
}

impl Dispatcher {
    pub fn new(router: Arc<EventRouter>, replies: UnboundedSender<Reply>) -> Self {
        Self {
            router,
            replies,
            queues: HashMap::new(),
            workers: JoinSet::new(),
        }
    }

    /// Queue an event behind the user's earlier events.
    pub fn submit(&mut self, event: InboundEvent) {
        let event = match self.queues.get(&event.user) {
            Some(queue) => match queue.send(event) {
                Ok(()) => return,
                // The worker is gone; start a fresh one below.
                Err(mpsc::error::SendError(event)) => event,
            },
            None => event,
        };

        let user = event.user.clone();
        let queue = self.spawn_worker(&user);
        if queue.send(event).is_err() {
            warn!(user, "worker closed before its first event");
        }
        self.queues.insert(user, queue);
    }

    fn spawn_worker(&mut self, user: &str) -> UnboundedSender<InboundEvent> {
        let (tx, mut rx) = mpsc::unbounded_channel::<InboundEvent>();
        let router = Arc::clone(&self.router);
        let replies = self.replies.clone();
        let user = user.to_string();

        debug!(user, "starting worker");
        self.workers.spawn(async move {
            while let Some(event) = rx.recv().await {
                let reply = router.handle(&event).await;
                if replies.send(reply).is_err() {
                    debug!(user, "reply channel closed");
                    break;
                }
            }
        });
        tx
    }

    /// Drop the queues of evicted users and collect finished workers.
    pub fn forget(&mut self, users: &[String]) {
        for user in users {
            self.queues.remove(user);
        }
        while let Some(result) = self.workers.try_join_next() {
            if let Err(e) = result {
                warn!(error = %e, "worker failed");
            }
        }
    }

    #[must_use]
    pub fn active_queues(&self) -> usize {
        self.queues.len()
    }

    /// Close every queue and wait until all queued events are handled.
    pub async fn shutdown(mut self) {
        self.queues.clear();
        while let Some(result) = self.workers.join_next().await {
            if let Err(e) = result {
                warn!(error = %e, "worker failed");
            }
        }
    }
}
