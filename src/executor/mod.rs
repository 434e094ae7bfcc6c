//! The per-runner push executor: a bounded worker pool that runs concurrent
//! sink calls without the Push Worker ever blocking on them.

// Layer 1: Standard library imports
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::warn;

// Layer 3: Internal module imports
// (none)

/// A bounded pool of concurrent tasks backing one runner's push stage.
///
/// `workers` limits how many sink calls run at once (a semaphore gate);
/// `queue_capacity` bounds how many more can be waiting for a free worker
/// before [`submit`](Self::submit) starts rejecting — the "implicit
/// backpressure" the Push Worker treats as an error batch.
pub struct PushExecutor {
    semaphore: Arc<Semaphore>,
    workers: usize,
    queue_capacity: usize,
    queued: Arc<AtomicUsize>,
    tasks: Mutex<JoinSet<()>>,
}

impl PushExecutor {
    /// Create an executor allowing `workers` concurrent tasks and up to
    /// `queue_capacity` more waiting for a free slot.
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(workers.max(1))),
            workers: workers.max(1),
            queue_capacity,
            queued: Arc::new(AtomicUsize::new(0)),
            tasks: Mutex::new(JoinSet::new()),
        }
    }

    /// Total capacity across both the running-worker gate and the pending
    /// queue, used to turn [`remaining_capacity`](Self::remaining_capacity)
    /// into a fraction for the Rate Estimator's queue-pressure signal.
    pub fn total_capacity(&self) -> usize {
        self.workers + self.queue_capacity
    }

    /// Free slots across both the running-worker gate and the pending
    /// queue, used by the Rate Estimator's queue-pressure signal.
    pub fn remaining_capacity(&self) -> usize {
        let queued = self.queued.load(Ordering::SeqCst);
        self.semaphore
            .available_permits()
            .saturating_add(self.queue_capacity.saturating_sub(queued))
    }

    /// Submit a task without waiting for it to run or complete. Returns
    /// `Err(())` immediately if the pending queue is already at capacity —
    /// the caller should treat this as an `ExecutorRejection`.
    pub async fn submit<F>(&self, task: F) -> Result<(), ()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let queued_now = self.queued.fetch_add(1, Ordering::SeqCst);
        if queued_now >= self.queue_capacity {
            self.queued.fetch_sub(1, Ordering::SeqCst);
            return Err(());
        }

        let semaphore = Arc::clone(&self.semaphore);
        let queued_counter = Arc::clone(&self.queued);
        let mut tasks = self.tasks.lock().await;
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await;
            queued_counter.fetch_sub(1, Ordering::SeqCst);
            task.await;
        });
        Ok(())
    }

    /// Wait up to `timeout` for every in-flight task to finish. Returns
    /// `true` if all tasks drained, `false` if the timeout elapsed first —
    /// in which case the remaining tasks are abandoned (they keep running
    /// to completion; this executor simply stops waiting on them).
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        let mut tasks = self.tasks.lock().await;
        let drained = tokio::time::timeout(timeout, async {
            while tasks.join_next().await.is_some() {}
        })
        .await
        .is_ok();
        if !drained {
            warn!("push executor did not drain within the shutdown timeout; abandoning in-flight tasks");
        }
        drained
    }
}
