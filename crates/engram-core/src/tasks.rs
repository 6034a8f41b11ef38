//! Background task tracking for fire-and-forget work.
//!
//! Post-retrieval access reinforcement runs detached from the request that
//! triggered it — the caller gets its search results without waiting on
//! store writes that only update access bookkeeping. [`TaskTracker`] gives
//! `engram-server` a handle to drain those tasks on graceful shutdown, so a
//! process exit never races a half-applied reinforcement.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::warn;

/// A shared, clonable handle onto one `JoinSet` of detached unit tasks.
#[derive(Clone)]
pub struct TaskTracker {
    tasks: Arc<Mutex<JoinSet<()>>>,
}

impl TaskTracker {
    pub fn new() -> Self {
        Self { tasks: Arc::new(Mutex::new(JoinSet::new())) }
    }

    /// Spawns `fut` detached, tracking its `JoinHandle` for [`Self::drain`].
    pub async fn spawn(&self, fut: impl Future<Output = ()> + Send + 'static) {
        self.tasks.lock().await.spawn(fut);
    }

    /// Awaits every currently-tracked task to completion. Intended for use
    /// on graceful shutdown, after the listener has stopped accepting new
    /// requests but before the process exits.
    pub async fn drain(&self) {
        let mut tasks = self.tasks.lock().await;
        while let Some(result) = tasks.join_next().await {
            if let Err(err) = result {
                warn!(error = %err, "background task panicked during drain");
            }
        }
    }
}

impl Default for TaskTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn drain_waits_for_all_spawned_tasks() {
        let tracker = TaskTracker::new();
        let counter = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let counter = counter.clone();
            tracker
                .spawn(async move {
                    tokio::task::yield_now().await;
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .await;
        }
        tracker.drain().await;
        assert_eq!(counter.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn drain_on_empty_tracker_returns_immediately() {
        let tracker = TaskTracker::new();
        tracker.drain().await;
    }
}
