//! The Rate Estimator (C1): a pure, TCP-Reno-inspired congestion controller
//! shared by both pipeline stages.
//!
//! `compute` takes the metrics from one completed batch and derives the
//! `cwnd`/`ssthresh` the stage should use for its *next* batch. It holds no
//! state of its own — every input it needs travels in on [`EstimateMetrics`]
//! — so a single [`RateEstimator`] instance is shared, lock-free, across
//! every runner and both stages.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::metrics::{EstimateMetrics, RunnerMetrics};

/// Lower bound for `cwnd` and `ssthresh`, and the value `cwnd` collapses to
/// on a congestion event.
pub const CWND_MIN: u32 = 1;

/// Upper bound for `cwnd`, guarding against a misbehaving transform engine
/// driving the window to an unbounded size via its fan-out multiplier.
pub const CWND_MAX: u32 = 1024;

/// Queue-occupancy threshold below which the estimator applies downward
/// pressure on the proposed `cwnd`, expressed as remaining-capacity-over-total.
const QUEUE_PRESSURE_FRACTION: f64 = 0.25;

/// Stateless TCP-Reno-style estimator shared by all runners and both stages.
///
/// The `[cwnd_min, cwnd_max]` bounds are configurable (spec.md §6,
/// `cwnd.min`/`cwnd.max`) but default to [`CWND_MIN`]/[`CWND_MAX`].
///
/// # Example
///
/// ```rust
/// use circulator::estimator::RateEstimator;
/// use circulator::metrics::{EstimateMetrics, Stage};
/// use circulator::util::RunnerName;
/// use chrono::Utc;
///
/// let estimator = RateEstimator::new();
/// let now = Utc::now();
/// let metrics = EstimateMetrics {
///     runner: RunnerName::new("r1"),
///     stage: Stage::Trans,
///     batch_size: 1,
///     prior_cwnd: 1,
///     prior_ssthresh: 64,
///     rwnd: None,
///     start_timestamp: now,
///     end_timestamp: now,
///     worker_queue_remaining_capacity: None,
///     worker_queue_total_capacity: None,
///     error: false,
/// };
/// let next = estimator.compute(&metrics);
/// assert_eq!(next.cwnd, 2); // slow start: 1 -> 2
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RateEstimator {
    cwnd_min: u32,
    cwnd_max: u32,
}

impl Default for RateEstimator {
    fn default() -> Self {
        Self {
            cwnd_min: CWND_MIN,
            cwnd_max: CWND_MAX,
        }
    }
}

impl RateEstimator {
    /// Construct the estimator with the default `[CWND_MIN, CWND_MAX]`
    /// bounds.
    pub fn new() -> Self {
        Self::default()
    }

    /// Construct the estimator with bounds taken from a
    /// [`CirculatorConfig`](crate::config::CirculatorConfig)'s
    /// `cwnd_min`/`cwnd_max`, so a deployment that narrows or widens the
    /// window actually changes what the estimator produces.
    pub fn with_bounds(cwnd_min: u32, cwnd_max: u32) -> Self {
        Self { cwnd_min, cwnd_max }
    }

    /// Derive the next `RunnerMetrics` from one completed batch.
    ///
    /// This function is pure: the same `metrics` value always yields the
    /// same result, and nothing outside its arguments (and the bounds
    /// fixed at construction) is consulted.
    pub fn compute(&self, metrics: &EstimateMetrics) -> RunnerMetrics {
        if metrics.error {
            return RunnerMetrics {
                stage: metrics.stage,
                cwnd: self.cwnd_min,
                ssthresh: (metrics.prior_cwnd / 2).max(self.cwnd_min),
                rwnd: None,
            };
        }

        let mut cwnd = if metrics.prior_cwnd < metrics.prior_ssthresh {
            // Slow start: double, but never past ssthresh.
            metrics.prior_cwnd.saturating_mul(2).min(metrics.prior_ssthresh)
        } else {
            // Congestion avoidance: grow linearly.
            metrics.prior_cwnd.saturating_add(1)
        };

        if let (Some(remaining), Some(total)) = (
            metrics.worker_queue_remaining_capacity,
            metrics.worker_queue_total_capacity,
        ) {
            if total > 0 && (remaining as f64) / (total as f64) <= QUEUE_PRESSURE_FRACTION {
                cwnd = (cwnd / 2).max(self.cwnd_min);
            }
        }

        if let Some(rwnd) = metrics.rwnd {
            if rwnd < cwnd {
                cwnd = rwnd;
            }
        }

        RunnerMetrics {
            stage: metrics.stage,
            cwnd: cwnd.clamp(self.cwnd_min, self.cwnd_max),
            ssthresh: metrics.prior_ssthresh.max(self.cwnd_min),
            rwnd: None,
        }
    }
}
