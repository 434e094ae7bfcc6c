//! Per-stage, per-runner throughput metrics: the data the Rate Estimator
//! consumes and produces.

mod types;

pub use types::{EstimateMetrics, RunnerMetrics, Stage};
