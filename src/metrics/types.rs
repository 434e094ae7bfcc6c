// Layer 1: Standard library imports
use std::fmt;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::RunnerName;

/// Which half of the pipeline a metrics snapshot describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stage {
    /// Transform stage (inbound → transform chain → target queue).
    Trans,
    /// Push stage (target queue → sink).
    Pusher,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trans => write!(f, "TRANS"),
            Self::Pusher => write!(f, "PUSHER"),
        }
    }
}

/// The congestion-window state published by a stage after each batch and
/// read by the opposite stage (and, for the push stage, read back as
/// `rwnd` by the transform stage) on its next iteration.
///
/// # Invariants
///
/// `cwnd >= CWND_MIN`, `ssthresh >= CWND_MIN`, both clamped to
/// `[CWND_MIN, CWND_MAX]` by the estimator that produces them (spec.md §3).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunnerMetrics {
    /// Which stage published this snapshot.
    pub stage: Stage,
    /// Maximum batch size the stage may take on its next iteration.
    pub cwnd: u32,
    /// Slow-start threshold.
    pub ssthresh: u32,
    /// Receiver window estimate of the downstream stage, observed by the
    /// transform stage reading push metrics. `None` for push metrics
    /// themselves (the push stage has no downstream to observe).
    pub rwnd: Option<u32>,
}

impl RunnerMetrics {
    /// The metrics a freshly registered runner starts with, per spec.md
    /// §4.1: `cwnd = 1`, `ssthresh = configured initial ssthresh`.
    pub fn initial(stage: Stage, cwnd_initial: u32, ssthresh_initial: u32) -> Self {
        Self {
            stage,
            cwnd: cwnd_initial,
            ssthresh: ssthresh_initial,
            rwnd: None,
        }
    }
}

/// Snapshot handed to the [`RateEstimator`](crate::estimator) after a batch
/// completes; the sole input to its pure `compute` function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EstimateMetrics {
    /// Which runner this batch belonged to (carried through for routing;
    /// the estimator itself is runner-agnostic).
    pub runner: RunnerName,
    /// Which stage produced this batch.
    pub stage: Stage,
    /// Number of records actually processed in the batch (0 on most error
    /// paths, since the batch may have failed before completion).
    pub batch_size: u32,
    /// `cwnd` in effect when the batch was taken.
    pub prior_cwnd: u32,
    /// `ssthresh` in effect when the batch was taken.
    pub prior_ssthresh: u32,
    /// Downstream `cwnd` as observed by the transform stage; `None` for
    /// the push stage (no downstream to observe).
    pub rwnd: Option<u32>,
    /// When the batch started.
    pub start_timestamp: DateTime<Utc>,
    /// When the batch finished (success or error).
    pub end_timestamp: DateTime<Utc>,
    /// Free slots in the stage's worker/executor queue at completion time;
    /// used to apply downward pressure under queue pressure.
    pub worker_queue_remaining_capacity: Option<u32>,
    /// Configured total capacity of that same queue, so the estimator can
    /// turn `worker_queue_remaining_capacity` into a fraction. `None`
    /// whenever `worker_queue_remaining_capacity` is `None`.
    pub worker_queue_total_capacity: Option<u32>,
    /// Whether this batch ended in an error (sink/transform/executor
    /// failure) — triggers the multiplicative-decrease branch.
    pub error: bool,
}
