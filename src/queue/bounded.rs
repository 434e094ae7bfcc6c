// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use tokio::sync::{mpsc, Mutex};

// Layer 3: Internal module imports
use crate::record::ConnectRecord;

/// A bounded, multi-producer/single-consumer queue of [`ConnectRecord`]s.
///
/// Used for both halves of a runner's resource bundle: the inbound
/// `eventQueue` and the transform-to-push `targetQueue`. The receiving
/// half lives behind a `tokio::sync::Mutex` so the queue can be reached
/// through a shared reference — the Circulator Context hands out `&self`,
/// never ownership, to keep bundle replacement observable on the next
/// worker iteration.
///
/// # Example
///
/// ```rust
/// use circulator::queue::BoundedRecordQueue;
/// use circulator::record::ConnectRecord;
/// use circulator::util::RunnerName;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let queue = BoundedRecordQueue::new(4);
/// let record = ConnectRecord::new(RunnerName::new("r1"), 0, serde_json::json!(null));
/// let dropped = queue.offer(vec![record], Duration::from_millis(10)).await;
/// assert!(dropped.is_empty());
///
/// let taken = queue.take(10).await;
/// assert_eq!(taken.len(), 1);
/// # }
/// ```
pub struct BoundedRecordQueue {
    sender: mpsc::Sender<ConnectRecord>,
    receiver: Mutex<mpsc::Receiver<ConnectRecord>>,
    capacity: usize,
}

impl BoundedRecordQueue {
    /// Create a queue bounded at `capacity` records.
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            sender,
            receiver: Mutex::new(receiver),
            capacity,
        }
    }

    /// The queue's configured capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Free slots remaining, used by the Rate Estimator's queue-pressure
    /// signal.
    pub fn remaining_capacity(&self) -> usize {
        self.sender.capacity()
    }

    /// Remove up to `max` records via a non-blocking probe. Returns an
    /// empty vector (never an error) if nothing is currently available.
    /// Order is preserved.
    pub async fn take(&self, max: usize) -> Vec<ConnectRecord> {
        if max == 0 {
            return Vec::new();
        }
        let mut receiver = self.receiver.lock().await;
        let mut out = Vec::with_capacity(max.min(self.capacity));
        while out.len() < max {
            match receiver.try_recv() {
                Ok(record) => out.push(record),
                Err(_) => break,
            }
        }
        out
    }

    /// Append `records`. Each record that does not fit immediately is
    /// retried for up to `timeout`; any still unplaced after that is
    /// returned to the caller as overflow, to be routed to the
    /// `ErrorHandler` with `BackpressureDrop`.
    pub async fn offer(&self, records: Vec<ConnectRecord>, timeout: Duration) -> Vec<ConnectRecord> {
        let mut dropped = Vec::new();
        for record in records {
            match self.sender.try_send(record) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Closed(record)) => dropped.push(record),
                Err(mpsc::error::TrySendError::Full(record)) => {
                    let retry = record.clone();
                    match tokio::time::timeout(timeout, self.sender.send(retry)).await {
                        Ok(Ok(())) => {}
                        Ok(Err(_)) | Err(_) => dropped.push(record),
                    }
                }
            }
        }
        dropped
    }
}
