// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use parking_lot::RwLock;

// Layer 3: Internal module imports
use crate::config::{CirculatorConfig, RunnerConfig};
use crate::executor::PushExecutor;
use crate::metrics::{RunnerMetrics, Stage};
use crate::queue::BoundedRecordQueue;
use crate::sink::SinkTask;
use crate::transform::TransformEngine;

/// Everything the Transform and Push Workers for one runner need, owned
/// exclusively by the [`CirculatorContext`](super::CirculatorContext).
///
/// Workers never hold a bundle directly — they hold a [`RunnerName`]
/// (`crate::util::RunnerName`) and look the bundle up through the context
/// each iteration, so an `onUpdate` replacement of this bundle is observed
/// on the very next iteration without any coordination from the worker
/// side.
pub struct RunnerBundle {
    pub event_queue: BoundedRecordQueue,
    pub target_queue: BoundedRecordQueue,
    pub transform_engine: Arc<dyn TransformEngine>,
    pub sink: Arc<dyn SinkTask>,
    pub executor: PushExecutor,
    transform_metrics: RwLock<Option<RunnerMetrics>>,
    push_metrics: RwLock<Option<RunnerMetrics>>,
}

impl RunnerBundle {
    /// Construct a fresh bundle for a runner, seeding both metrics cells
    /// eagerly with the configured initial `cwnd`/`ssthresh` (spec.md
    /// §4.1) rather than leaving them empty until the first batch.
    pub fn new(
        runner_config: &RunnerConfig,
        circulator_config: &CirculatorConfig,
        transform_engine: Arc<dyn TransformEngine>,
        sink: Arc<dyn SinkTask>,
    ) -> Self {
        let initial = |stage| {
            RunnerMetrics::initial(
                stage,
                circulator_config.cwnd_initial,
                circulator_config.ssthresh_initial,
            )
        };
        Self {
            event_queue: BoundedRecordQueue::new(runner_config.event_queue_capacity),
            target_queue: BoundedRecordQueue::new(runner_config.target_queue_capacity),
            transform_engine,
            sink,
            executor: PushExecutor::new(
                runner_config.executor_workers,
                runner_config.executor_queue_capacity,
            ),
            transform_metrics: RwLock::new(Some(initial(Stage::Trans))),
            push_metrics: RwLock::new(Some(initial(Stage::Pusher))),
        }
    }

    /// Read the latest published transform-stage metrics.
    pub fn transform_metrics(&self) -> Option<RunnerMetrics> {
        *self.transform_metrics.read()
    }

    /// Read the latest published push-stage metrics.
    pub fn push_metrics(&self) -> Option<RunnerMetrics> {
        *self.push_metrics.read()
    }

    /// Atomically replace the transform-stage metrics cell.
    pub fn publish_transform_metrics(&self, metrics: RunnerMetrics) {
        *self.transform_metrics.write() = Some(metrics);
    }

    /// Atomically replace the push-stage metrics cell.
    pub fn publish_push_metrics(&self, metrics: RunnerMetrics) {
        *self.push_metrics.write() = Some(metrics);
    }
}
