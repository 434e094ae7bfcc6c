// Layer 1: Standard library imports
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use dashmap::DashMap;

// Layer 3: Internal module imports
use super::bundle::RunnerBundle;
use crate::config::{CirculatorConfig, RunnerConfig};
use crate::error::{ErrorHandler, RunnerError};
use crate::record::ConnectRecord;
use crate::sink::SinkTask;
use crate::transform::TransformEngine;
use crate::util::RunnerName;

/// Lock-free broker of per-runner resource bundles.
///
/// `CirculatorContext` is the single mutator of the runner→bundle mapping;
/// every other collaborator (workers, the Lifecycle Manager) only ever
/// reads snapshots or calls through to the bundle it hands back. This
/// keeps the concurrency story simple: a bundle replacement is visible to
/// a worker the moment it next calls [`bundle`](Self::bundle), and no lock
/// is ever held across a sink or transform call.
///
/// # Example
///
/// ```rust
/// use circulator::context::CirculatorContext;
/// use circulator::config::{CirculatorConfig, RunnerConfig};
/// use circulator::transform::IdentityTransform;
/// use circulator::util::RunnerName;
/// use std::sync::Arc;
///
/// # #[derive(Default)]
/// # struct NoopSink;
/// # #[async_trait::async_trait]
/// # impl circulator::sink::SinkTask for NoopSink {
/// #     async fn put(&self, _records: &[circulator::record::ConnectRecord]) -> Result<(), circulator::error::BoxError> {
/// #         Ok(())
/// #     }
/// # }
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let context = CirculatorContext::new();
/// let runner = RunnerName::new("r1");
/// context.register_runner(
///     RunnerConfig::with_defaults(runner.clone()),
///     &CirculatorConfig::default(),
///     Arc::new(IdentityTransform),
///     Arc::new(NoopSink),
/// ).await;
/// assert!(context.bundle(&runner).is_some());
/// # }
/// ```
#[derive(Default)]
pub struct CirculatorContext {
    bundles: DashMap<RunnerName, Arc<RunnerBundle>>,
}

impl CirculatorContext {
    /// Create an empty context with no registered runners.
    pub fn new() -> Self {
        Self {
            bundles: DashMap::new(),
        }
    }

    /// Create or replace the bundle for `runner_config.runner`, seeding
    /// fresh metrics cells. Used by the Lifecycle Manager for both
    /// `onAdd` and `onUpdate` — this core does not distinguish the two at
    /// the context layer, since both resolve to "install this bundle".
    ///
    /// On `onUpdate` (a bundle for this runner already exists), any
    /// records still sitting in the old bundle's `eventQueue`/
    /// `targetQueue` — queued but not yet taken by the worker the
    /// Lifecycle Manager just stopped — are drained and carried over into
    /// the new bundle's queues before it is installed. Without this, a
    /// config update would silently lose whatever the in-flight worker
    /// had not yet pulled (spec.md §8 scenario 4, "no record is lost").
    pub async fn register_runner(
        &self,
        runner_config: RunnerConfig,
        circulator_config: &CirculatorConfig,
        transform_engine: Arc<dyn TransformEngine>,
        sink: Arc<dyn SinkTask>,
    ) {
        let runner = runner_config.runner.clone();
        let previous = self.bundles.get(&runner).map(|entry| Arc::clone(entry.value()));

        let bundle = RunnerBundle::new(&runner_config, circulator_config, transform_engine, sink);

        if let Some(previous) = previous {
            let carried_events = previous.event_queue.take(previous.event_queue.capacity()).await;
            let carried_targets = previous.target_queue.take(previous.target_queue.capacity()).await;
            // Best-effort: the new queues are sized by the incoming config,
            // which is almost always >= what was just drained. Anything
            // that still doesn't fit is dropped silently rather than
            // blocking the update indefinitely; the old bundle offered no
            // stronger guarantee either, since it was itself bounded.
            bundle.event_queue.offer(carried_events, Duration::from_millis(0)).await;
            bundle.target_queue.offer(carried_targets, Duration::from_millis(0)).await;
        }

        self.bundles.insert(runner, Arc::new(bundle));
    }

    /// Remove and return a runner's bundle, e.g. on `onDelete`. Workers
    /// holding a clone of the old `Arc<RunnerBundle>` may still be mid
    /// batch; the context's responsibility ends at removing it from the
    /// map so no *new* iteration can observe it.
    pub fn remove_runner(&self, runner: &RunnerName) -> Option<Arc<RunnerBundle>> {
        self.bundles.remove(runner).map(|(_, bundle)| bundle)
    }

    /// Snapshot-read a runner's bundle. Returns `None` once the runner has
    /// been removed — workers treat this as the signal to exit their
    /// iteration early rather than an error.
    pub fn bundle(&self, runner: &RunnerName) -> Option<Arc<RunnerBundle>> {
        self.bundles.get(runner).map(|entry| Arc::clone(entry.value()))
    }

    /// All runner names currently registered.
    pub fn runner_names(&self) -> Vec<RunnerName> {
        self.bundles.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Snapshot mapping of every registered runner to its current
    /// transform engine.
    pub fn task_transform_map(&self) -> HashMap<RunnerName, Arc<dyn TransformEngine>> {
        self.bundles
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(&entry.value().transform_engine)))
            .collect()
    }

    /// Snapshot mapping of every registered runner to its current sink.
    pub fn pusher_task_map(&self) -> HashMap<RunnerName, Arc<dyn SinkTask>> {
        self.bundles
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(&entry.value().sink)))
            .collect()
    }

    /// Remove up to `max` records from `runner`'s event queue. Returns an
    /// empty vector, not an error, if the runner is unknown or the queue
    /// is empty.
    pub async fn take_event_record(&self, runner: &RunnerName, max: u32) -> Vec<ConnectRecord> {
        match self.bundle(runner) {
            Some(bundle) => bundle.event_queue.take(max as usize).await,
            None => Vec::new(),
        }
    }

    /// Remove up to `max` records from `runner`'s target queue.
    pub async fn take_target_map(&self, runner: &RunnerName, max: u32) -> Vec<ConnectRecord> {
        match self.bundle(runner) {
            Some(bundle) => bundle.target_queue.take(max as usize).await,
            None => Vec::new(),
        }
    }

    /// Append transformed records to their owning runner's target queue,
    /// grouped by each record's carried `RunnerName`. Records that do not
    /// fit within `timeout` — including every record whose runner has
    /// since been removed — are routed to `error_handler` with
    /// `BackpressureDrop`.
    pub async fn offer_target_task_queue(
        &self,
        records: Vec<ConnectRecord>,
        timeout: Duration,
        error_handler: &dyn ErrorHandler,
    ) {
        let mut by_runner: HashMap<RunnerName, Vec<ConnectRecord>> = HashMap::new();
        for record in records {
            by_runner.entry(record.runner.clone()).or_default().push(record);
        }

        for (runner, batch) in by_runner {
            let dropped = match self.bundle(&runner) {
                Some(bundle) => bundle.target_queue.offer(batch, timeout).await,
                None => batch,
            };
            for record in dropped {
                error_handler
                    .handle(record, RunnerError::BackpressureDrop { runner: runner.clone() })
                    .await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use crate::transform::IdentityTransform;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct NoopSink;

    #[async_trait]
    impl SinkTask for NoopSink {
        async fn put(&self, _records: &[ConnectRecord]) -> Result<(), BoxError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct CountingErrorHandler(AtomicUsize);

    #[async_trait]
    impl ErrorHandler for CountingErrorHandler {
        async fn handle(&self, _record: ConnectRecord, _error: RunnerError) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    async fn register(context: &CirculatorContext, runner: &RunnerName) {
        context
            .register_runner(
                RunnerConfig::with_defaults(runner.clone()),
                &CirculatorConfig::default(),
                Arc::new(IdentityTransform),
                Arc::new(NoopSink),
            )
            .await;
    }

    #[tokio::test]
    async fn unknown_runner_take_returns_empty() {
        let context = CirculatorContext::new();
        let runner = RunnerName::new("ghost");
        assert!(context.take_event_record(&runner, 10).await.is_empty());
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn register_then_take_round_trips_through_event_queue() {
        let context = CirculatorContext::new();
        let runner = RunnerName::new("r1");
        register(&context, &runner).await;
        let bundle = context.bundle(&runner).expect("bundle registered");
        bundle
            .event_queue
            .offer(
                vec![ConnectRecord::new(runner.clone(), 1, json!(null))],
                Duration::from_millis(10),
            )
            .await;

        let taken = context.take_event_record(&runner, 10).await;
        assert_eq!(taken.len(), 1);
    }

    #[tokio::test]
    async fn offer_target_task_queue_routes_by_runner() {
        let context = CirculatorContext::new();
        let r1 = RunnerName::new("r1");
        let r2 = RunnerName::new("r2");
        register(&context, &r1).await;
        register(&context, &r2).await;

        let records = vec![
            ConnectRecord::new(r1.clone(), 1, json!(null)),
            ConnectRecord::new(r2.clone(), 1, json!(null)),
        ];
        let handler = CountingErrorHandler::default();
        context
            .offer_target_task_queue(records, Duration::from_millis(50), &handler)
            .await;

        assert_eq!(context.take_target_map(&r1, 10).await.len(), 1);
        assert_eq!(context.take_target_map(&r2, 10).await.len(), 1);
        assert_eq!(handler.0.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn offer_target_task_queue_drops_records_for_removed_runner() {
        let context = CirculatorContext::new();
        let runner = RunnerName::new("r1");
        register(&context, &runner).await;
        context.remove_runner(&runner);

        let handler = CountingErrorHandler::default();
        let records = vec![ConnectRecord::new(runner, 1, json!(null))];
        context
            .offer_target_task_queue(records, Duration::from_millis(10), &handler)
            .await;

        assert_eq!(handler.0.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn register_runner_seeds_fresh_metrics() {
        let context = CirculatorContext::new();
        let runner = RunnerName::new("r1");
        register(&context, &runner).await;
        let bundle = context.bundle(&runner).expect("bundle registered");
        assert_eq!(bundle.transform_metrics().expect("seeded").cwnd, 1);
    }

    #[tokio::test]
    async fn runner_names_reflects_registrations() {
        let context = CirculatorContext::new();
        register(&context, &RunnerName::new("r1")).await;
        register(&context, &RunnerName::new("r2")).await;
        let mut names: Vec<String> = context
            .runner_names()
            .into_iter()
            .map(|n| n.as_str().to_string())
            .collect();
        names.sort();
        assert_eq!(names, vec!["r1".to_string(), "r2".to_string()]);
    }

    #[tokio::test]
    #[allow(clippy::expect_used)]
    async fn update_carries_over_unconsumed_event_queue_records() {
        let context = CirculatorContext::new();
        let runner = RunnerName::new("r1");
        register(&context, &runner).await;
        let old_bundle = context.bundle(&runner).expect("bundle registered");
        old_bundle
            .event_queue
            .offer(
                vec![
                    ConnectRecord::new(runner.clone(), 1, json!(null)),
                    ConnectRecord::new(runner.clone(), 2, json!(null)),
                ],
                Duration::from_millis(10),
            )
            .await;

        // Simulate onUpdate: register again for the same runner without
        // draining the old bundle's queue first.
        register(&context, &runner).await;

        let taken = context.take_event_record(&runner, 10).await;
        let mut offsets: Vec<u64> = taken.iter().map(|r| r.offset).collect();
        offsets.sort_unstable();
        assert_eq!(offsets, vec![1, 2], "records queued before the update must survive it");
    }
}
