//! Bounded background run scheduler.
//!
//! Each submitted run is one spawned tokio task gated by a shared
//! semaphore, so at most `max_workers` runs execute at once. Completion is
//! published on a per-run `watch` channel that `wait` observes with a
//! timeout. A timed-out wait never cancels the run.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::{Semaphore, watch};

/// Default number of concurrently executing runs.
pub const DEFAULT_MAX_WORKERS: usize = 4;

pub struct RunScheduler {
    permits: Arc<Semaphore>,
    /// Completion flag per run id. The sender is dropped without sending
    /// when the task dies, which also ends a wait. Entries are never
    /// evicted, so the map grows for the process lifetime like the run and
    /// idempotency stores.
    done: DashMap<String, watch::Receiver<bool>>,
}

impl RunScheduler {
    pub fn new(max_workers: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(max_workers.max(1))),
            done: DashMap::new(),
        }
    }

    /// Spawn `task` for `run_id`. It starts once a worker permit is free.
    pub fn submit<F>(&self, run_id: &str, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let (tx, rx) = watch::channel(false);
        self.done.insert(run_id.to_string(), rx);

        let permits = Arc::clone(&self.permits);
        let run_id = run_id.to_string();
        tokio::spawn(async move {
            let _permit = permits.acquire_owned().await;
            task.await;
            if tx.send(true).is_err() {
                tracing::debug!(run_id = %run_id, "no waiters left for finished run");
            }
        });
    }

    /// Wait up to `timeout` for `run_id` to finish.
    ///
    /// Returns `true` when the run finished (or its task died), `false` on
    /// timeout or for an unknown run.
    pub async fn wait(&self, run_id: &str, timeout: Duration) -> bool {
        let rx = self.done.get(run_id).map(|entry| entry.value().clone());
        let Some(mut rx) = rx else {
            return false;
        };
        // Err from wait_for means the sender is gone: the task ended.
        let finished = tokio::time::timeout(timeout, rx.wait_for(|finished| *finished))
            .await
            .is_ok();
        finished
    }
}

impl Default for RunScheduler {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_WORKERS)
    }
}
