// Layer 1: Standard library imports
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use tokio::sync::Notify;

// Layer 3: Internal module imports
// (none)

/// Cooperative shutdown signal shared between a worker loop and whoever
/// owns it (the Lifecycle Manager).
///
/// Workers check [`is_stopped`](Self::is_stopped) at every loop boundary
/// and use [`wait`](Self::wait) instead of a bare `sleep` so a shutdown
/// request wakes them immediately instead of after the full interval.
#[derive(Clone)]
pub struct ShutdownHandle {
    stopped: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    /// Create a fresh, not-yet-stopped handle.
    pub fn new() -> Self {
        Self {
            stopped: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Whether shutdown has been requested.
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    /// Request shutdown and wake anyone currently waiting.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    /// Sleep for `duration`, or return early the moment [`stop`](Self::stop)
    /// is called.
    pub async fn wait(&self, duration: Duration) {
        tokio::select! {
            _ = tokio::time::sleep(duration) => {}
            _ = self.notify.notified() => {}
        }
    }
}

impl Default for ShutdownHandle {
    fn default() -> Self {
        Self::new()
    }
}
