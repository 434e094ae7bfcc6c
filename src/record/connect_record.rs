// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Layer 3: Internal module imports
use crate::util::RunnerName;

/// An inbound event record moving through the transform/push pipeline.
///
/// The core never inspects `payload` — it is an opaque value transported
/// from the (out-of-scope) source adapter to the (out-of-scope) sink. What
/// the core cares about is enough identity to route the record to the
/// right runner's queues and to let the `OffsetManager` ack it.
///
/// # Example
///
/// ```rust
/// use circulator::record::ConnectRecord;
/// use circulator::util::RunnerName;
/// use serde_json::json;
///
/// let record = ConnectRecord::new(RunnerName::new("r1"), 42, json!({"k": "v"}));
/// assert_eq!(record.offset, 42);
/// assert_eq!(record.attempt, 0);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectRecord {
    /// Which runner this record belongs to; used to route into the
    /// correct per-runner queue regardless of which worker is holding it.
    pub runner: RunnerName,

    /// Monotonically assigned identity within the source, used only for
    /// idempotent-commit bookkeeping by the `OffsetManager` collaborator.
    pub offset: u64,

    /// Opaque event payload.
    pub payload: Value,

    /// When the record entered the event queue.
    pub enqueued_at: DateTime<Utc>,

    /// Number of times this record has been handed to a failure path
    /// (sink error, transform error, backpressure drop). Retry/DLQ
    /// decisions based on this counter belong to the `ErrorHandler`.
    pub attempt: u32,
}

impl ConnectRecord {
    /// Create a new record for `runner` with the given offset and payload.
    pub fn new(runner: RunnerName, offset: u64, payload: Value) -> Self {
        Self {
            runner,
            offset,
            payload,
            enqueued_at: Utc::now(),
            attempt: 0,
        }
    }

    /// Return a copy with `attempt` incremented, used by `ErrorHandler`
    /// implementations that choose to retry rather than drop or DLQ.
    pub fn with_incremented_attempt(mut self) -> Self {
        self.attempt = self.attempt.saturating_add(1);
        self
    }
}

impl fmt::Display for ConnectRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConnectRecord(runner={}, offset={})", self.runner, self.offset)
    }
}
