//! End-to-end scenarios exercising `CirculatorRuntime` through its public
//! surface only: register a runner, feed records onto its event queue,
//! drive update/delete notifications, and observe what the fake
//! `OffsetManager`/`ErrorHandler`/`SinkTask` collaborators saw.
//!
//! These cover the six scenarios from spec.md §8. Scenario 6 (the
//! slow-start-to-congestion-avoidance cwnd trajectory) is a pure function
//! of `RateEstimator::compute` and is exercised precisely in
//! `estimator::tests` instead of here; a real runtime drains its queue
//! across however many batches the scheduler happens to interleave, so
//! these tests assert the record-level invariants (I1, I6) and the
//! *direction* of cwnd movement rather than pinning an exact trajectory.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use circulator::config::{CirculatorConfig, RunnerConfig};
use circulator::error::{BoxError, DropErrorHandler, ErrorHandler, RunnerError};
use circulator::lifecycle::RunnerResourceFactory;
use circulator::offset::OffsetManager;
use circulator::record::ConnectRecord;
use circulator::runtime::CirculatorRuntime;
use circulator::sink::SinkTask;
use circulator::transform::{IdentityTransform, TransformEngine, TransformOutcome};
use circulator::util::RunnerName;

/// `OffsetManager` that records every committed offset.
#[derive(Default)]
struct RecordingOffsetManager {
    committed: Mutex<Vec<u64>>,
}

#[async_trait]
impl OffsetManager for RecordingOffsetManager {
    async fn commit(&self, record: &ConnectRecord) {
        self.committed.lock().expect("mutex poisoned").push(record.offset);
    }
}

impl RecordingOffsetManager {
    fn committed_offsets(&self) -> Vec<u64> {
        self.committed.lock().expect("mutex poisoned").clone()
    }
}

/// `ErrorHandler` that records every failed record, then drops it.
#[derive(Default)]
struct RecordingErrorHandler {
    handled: Mutex<Vec<u64>>,
}

#[async_trait]
impl ErrorHandler for RecordingErrorHandler {
    async fn handle(&self, record: ConnectRecord, _error: RunnerError) {
        self.handled.lock().expect("mutex poisoned").push(record.offset);
    }
}

/// `SinkTask` that always succeeds and records delivered offsets.
#[derive(Default)]
struct RecordingSink {
    delivered: Mutex<Vec<u64>>,
}

#[async_trait]
impl SinkTask for RecordingSink {
    async fn put(&self, records: &[ConnectRecord]) -> Result<(), BoxError> {
        let mut delivered = self.delivered.lock().expect("mutex poisoned");
        delivered.extend(records.iter().map(|r| r.offset));
        Ok(())
    }
}

impl RecordingSink {
    fn delivered_offsets(&self) -> Vec<u64> {
        self.delivered.lock().expect("mutex poisoned").clone()
    }
}

/// `SinkTask` whose first `put` call fails; every later call succeeds.
#[derive(Default)]
struct FailFirstSink {
    calls: AtomicUsize,
    delivered: Mutex<Vec<u64>>,
}

#[async_trait]
impl SinkTask for FailFirstSink {
    async fn put(&self, records: &[ConnectRecord]) -> Result<(), BoxError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
            return Err("simulated sink outage".into());
        }
        self.delivered
            .lock()
            .expect("mutex poisoned")
            .extend(records.iter().map(|r| r.offset));
        Ok(())
    }
}

impl FailFirstSink {
    fn delivered_offsets(&self) -> Vec<u64> {
        self.delivered.lock().expect("mutex poisoned").clone()
    }
}

/// A transform chain that drops every record with an odd offset and
/// forwards the rest unchanged.
#[derive(Default, Clone, Copy)]
struct EveryOtherDropTransform;

#[async_trait]
impl TransformEngine for EveryOtherDropTransform {
    async fn do_transform(&self, record: ConnectRecord) -> TransformOutcome {
        if record.offset % 2 == 1 {
            TransformOutcome::Dropped(record)
        } else {
            TransformOutcome::Produced(record)
        }
    }
}

/// A fixed transform/sink pair handed out to every runner the runtime asks
/// for — sufficient for these single-runner scenarios.
struct FixedResources {
    transform: Arc<dyn TransformEngine>,
    sink: Arc<dyn SinkTask>,
}

impl RunnerResourceFactory for FixedResources {
    fn transform_engine(&self, _runner: &RunnerName) -> Arc<dyn TransformEngine> {
        Arc::clone(&self.transform)
    }
    fn sink(&self, _runner: &RunnerName) -> Arc<dyn SinkTask> {
        Arc::clone(&self.sink)
    }
}

/// Configuration with short wait intervals so these tests converge in
/// well under a second instead of spec.md's production defaults
/// (1000/3000/1000 ms).
fn fast_config() -> CirculatorConfig {
    CirculatorConfig::builder()
        .with_transform_empty_wait(Duration::from_millis(15))
        .with_transform_no_engine_wait(Duration::from_millis(15))
        .with_push_empty_wait(Duration::from_millis(15))
        .with_shutdown_worker_join_timeout(Duration::from_millis(500))
        .build()
        .expect("valid config")
}

fn records(runner: &RunnerName, count: u64) -> Vec<ConnectRecord> {
    (0..count)
        .map(|offset| ConnectRecord::new(runner.clone(), offset, json!({"offset": offset})))
        .collect()
}

/// Poll `predicate` until it returns `true` or `timeout` elapses, panicking
/// on timeout. Workers run on their own background tasks; this is the
/// black-box equivalent of waiting for "eventually consistent" state.
async fn wait_until(timeout: Duration, mut predicate: impl FnMut() -> bool) {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if predicate() {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("condition not met within {timeout:?}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

/// Scenario 1: happy path, single runner, identity transform.
///
/// I1: every one of the 10 records is committed because it was
/// sink-delivered (none are dropped by the transform here).
#[tokio::test]
async fn happy_path_single_runner_delivers_and_commits_everything() {
    let offset_manager = Arc::new(RecordingOffsetManager::default());
    let sink = Arc::new(RecordingSink::default());
    let runtime = CirculatorRuntime::new(
        fast_config(),
        Arc::new(FixedResources {
            transform: Arc::new(IdentityTransform),
            sink: Arc::clone(&sink) as Arc<dyn SinkTask>,
        }),
        offset_manager.clone(),
        Arc::new(DropErrorHandler),
    );

    let runner = RunnerName::new("r1");
    runtime.add_runner(RunnerConfig::with_defaults(runner.clone())).await;

    let bundle = runtime.context().bundle(&runner).expect("bundle registered");
    bundle
        .event_queue
        .offer(records(&runner, 10), Duration::from_millis(50))
        .await;

    wait_until(Duration::from_secs(5), || sink.delivered_offsets().len() == 10).await;
    wait_until(Duration::from_secs(5), || offset_manager.committed_offsets().len() == 10).await;

    let mut delivered = sink.delivered_offsets();
    delivered.sort_unstable();
    assert_eq!(delivered, (0..10).collect::<Vec<_>>());

    let mut committed = offset_manager.committed_offsets();
    committed.sort_unstable();
    assert_eq!(committed, (0..10).collect::<Vec<_>>());

    // Slow start must have grown cwnd past its initial value of 1 at
    // least once on both stages (exact trajectory: estimator::tests).
    let bundle = runtime.context().bundle(&runner).expect("bundle still registered");
    assert!(bundle.transform_metrics().expect("published").cwnd >= 2);
    assert!(bundle.push_metrics().expect("published").cwnd >= 2);

    runtime.delete_runner(runner).await;
}

/// Scenario 2: sink failure on the first batch.
///
/// With the default `DropErrorHandler`, the batch that hit the failing
/// sink call is lost; every later batch succeeds. No record is ever
/// committed without being sink-delivered (I1), and `ssthresh` collapses
/// on the error batch (I3 is exercised precisely in estimator::tests).
#[tokio::test]
async fn sink_failure_on_first_batch_drops_only_that_batch() {
    let offset_manager = Arc::new(RecordingOffsetManager::default());
    let sink = Arc::new(FailFirstSink::default());
    let runtime = CirculatorRuntime::new(
        fast_config(),
        Arc::new(FixedResources {
            transform: Arc::new(IdentityTransform),
            sink: Arc::clone(&sink) as Arc<dyn SinkTask>,
        }),
        offset_manager.clone(),
        Arc::new(DropErrorHandler),
    );

    let runner = RunnerName::new("r1");
    runtime.add_runner(RunnerConfig::with_defaults(runner.clone())).await;

    let bundle = runtime.context().bundle(&runner).expect("bundle registered");
    bundle
        .event_queue
        .offer(records(&runner, 10), Duration::from_millis(50))
        .await;

    // cwnd starts at 1, so the first push batch is exactly one record;
    // that is the batch the sink fails. The remaining 9 must still land.
    wait_until(Duration::from_secs(5), || sink.delivered_offsets().len() == 9).await;

    let mut delivered = sink.delivered_offsets();
    delivered.sort_unstable();
    assert_eq!(delivered.len(), 9);

    // Every delivered record, and only delivered records, were committed —
    // the one record whose batch failed is not among them.
    wait_until(Duration::from_secs(2), || {
        offset_manager.committed_offsets().len() == 9
    })
    .await;
    let mut committed = offset_manager.committed_offsets();
    committed.sort_unstable();
    assert_eq!(committed, delivered);

    runtime.delete_runner(runner).await;
}

/// Scenario 3: transform drop. Half the records are filtered by the
/// transform chain; spec.md requires ALL 10 to be committed regardless —
/// 5 via the push stage's post-delivery commit, 5 via the transform
/// stage's drop-commit (I1).
#[tokio::test]
async fn transform_drop_commits_dropped_records_without_delivering_them() {
    let offset_manager = Arc::new(RecordingOffsetManager::default());
    let sink = Arc::new(RecordingSink::default());
    let runtime = CirculatorRuntime::new(
        fast_config(),
        Arc::new(FixedResources {
            transform: Arc::new(EveryOtherDropTransform),
            sink: Arc::clone(&sink) as Arc<dyn SinkTask>,
        }),
        offset_manager.clone(),
        Arc::new(DropErrorHandler),
    );

    let runner = RunnerName::new("r1");
    runtime.add_runner(RunnerConfig::with_defaults(runner.clone())).await;

    let bundle = runtime.context().bundle(&runner).expect("bundle registered");
    bundle
        .event_queue
        .offer(records(&runner, 10), Duration::from_millis(50))
        .await;

    wait_until(Duration::from_secs(5), || offset_manager.committed_offsets().len() == 10).await;

    let mut committed = offset_manager.committed_offsets();
    committed.sort_unstable();
    assert_eq!(committed, (0..10).collect::<Vec<_>>());

    // Only the even offsets (not dropped) ever reached the sink.
    let mut delivered = sink.delivered_offsets();
    delivered.sort_unstable();
    assert_eq!(delivered, vec![0, 2, 4, 6, 8]);

    runtime.delete_runner(runner).await;
}

/// Scenario 4: a dynamic `onUpdate` mid-stream must not lose or duplicate
/// any record, and must leave the runner with exactly one live worker per
/// stage afterwards (I7).
#[tokio::test]
async fn dynamic_update_replaces_workers_without_losing_or_duplicating_records() {
    let offset_manager = Arc::new(RecordingOffsetManager::default());
    let sink = Arc::new(RecordingSink::default());
    let runtime = CirculatorRuntime::new(
        fast_config(),
        Arc::new(FixedResources {
            transform: Arc::new(IdentityTransform),
            sink: Arc::clone(&sink) as Arc<dyn SinkTask>,
        }),
        offset_manager.clone(),
        Arc::new(DropErrorHandler),
    );

    let runner = RunnerName::new("r1");
    runtime.add_runner(RunnerConfig::with_defaults(runner.clone())).await;

    let bundle = runtime.context().bundle(&runner).expect("bundle registered");
    bundle
        .event_queue
        .offer(records(&runner, 50), Duration::from_millis(50))
        .await;

    // Let a few batches drain, then replace the runner's workers mid-flight.
    tokio::time::sleep(Duration::from_millis(30)).await;
    runtime.update_runner(RunnerConfig::with_defaults(runner.clone())).await;

    let bundle = runtime.context().bundle(&runner).expect("bundle re-registered after update");
    bundle
        .event_queue
        .offer(records(&runner, 50).into_iter().map(|mut r| {
            r.offset += 50;
            r
        }).collect(), Duration::from_millis(50))
        .await;

    wait_until(Duration::from_secs(10), || sink.delivered_offsets().len() == 100).await;

    let delivered = sink.delivered_offsets();
    let unique: HashSet<u64> = delivered.iter().copied().collect();
    assert_eq!(unique.len(), delivered.len(), "no record delivered twice");
    assert_eq!(unique.len(), 100, "no record lost across the update");

    runtime.delete_runner(runner).await;
}

/// Scenario 5: `onDelete` releases the runner's bundle. Queued-but-untaken
/// records are abandoned along with it (this implementation's chosen
/// drain policy — see DESIGN.md and SPEC_FULL.md §12.8) rather than routed
/// individually through the `ErrorHandler`, so deletion latency never
/// depends on handler throughput.
#[tokio::test]
async fn deletion_releases_the_bundle_within_the_join_timeout() {
    let offset_manager = Arc::new(RecordingOffsetManager::default());
    let sink = Arc::new(RecordingSink::default());
    let runtime = CirculatorRuntime::new(
        fast_config(),
        Arc::new(FixedResources {
            transform: Arc::new(IdentityTransform),
            sink: Arc::clone(&sink) as Arc<dyn SinkTask>,
        }),
        offset_manager,
        Arc::new(DropErrorHandler),
    );

    let runner = RunnerName::new("r1");
    runtime.add_runner(RunnerConfig::with_defaults(runner.clone())).await;

    let bundle = runtime.context().bundle(&runner).expect("bundle registered");
    bundle
        .event_queue
        .offer(records(&runner, 20), Duration::from_millis(50))
        .await;

    runtime.delete_runner(runner.clone()).await;

    // `delete_runner` only returns once both Lifecycle Managers have
    // stopped (or abandoned within the timeout) the old workers, so the
    // bundle must already be gone — no polling required (I8).
    assert!(runtime.context().bundle(&runner).is_none());
}

/// I6: runner isolation — records for one runner never reach another
/// runner's sink.
#[tokio::test]
async fn runner_isolation_keeps_batches_separate() {
    let offset_manager = Arc::new(RecordingOffsetManager::default());
    let sink_a = Arc::new(RecordingSink::default());
    let sink_b = Arc::new(RecordingSink::default());

    struct PerRunnerResources {
        a: Arc<dyn SinkTask>,
        b: Arc<dyn SinkTask>,
    }
    impl RunnerResourceFactory for PerRunnerResources {
        fn transform_engine(&self, _runner: &RunnerName) -> Arc<dyn TransformEngine> {
            Arc::new(IdentityTransform)
        }
        fn sink(&self, runner: &RunnerName) -> Arc<dyn SinkTask> {
            if runner.as_str() == "a" {
                Arc::clone(&self.a)
            } else {
                Arc::clone(&self.b)
            }
        }
    }

    let runtime = CirculatorRuntime::new(
        fast_config(),
        Arc::new(PerRunnerResources {
            a: Arc::clone(&sink_a) as Arc<dyn SinkTask>,
            b: Arc::clone(&sink_b) as Arc<dyn SinkTask>,
        }),
        offset_manager,
        Arc::new(DropErrorHandler),
    );

    let runner_a = RunnerName::new("a");
    let runner_b = RunnerName::new("b");
    runtime.add_runner(RunnerConfig::with_defaults(runner_a.clone())).await;
    runtime.add_runner(RunnerConfig::with_defaults(runner_b.clone())).await;

    runtime
        .context()
        .bundle(&runner_a)
        .expect("bundle registered")
        .event_queue
        .offer(records(&runner_a, 5), Duration::from_millis(50))
        .await;
    runtime
        .context()
        .bundle(&runner_b)
        .expect("bundle registered")
        .event_queue
        .offer(records(&runner_b, 5), Duration::from_millis(50))
        .await;

    wait_until(Duration::from_secs(5), || {
        sink_a.delivered_offsets().len() == 5 && sink_b.delivered_offsets().len() == 5
    })
    .await;

    assert_eq!(sink_a.delivered_offsets().len(), 5);
    assert_eq!(sink_b.delivered_offsets().len(), 5);

    runtime.delete_runner(runner_a).await;
    runtime.delete_runner(runner_b).await;
}

/// A record-level transform error must neither be forwarded nor
/// committed; it is routed to the `ErrorHandler` exactly once.
#[tokio::test]
async fn transform_error_is_neither_forwarded_nor_committed() {
    struct FailOddTransform;
    #[async_trait]
    impl TransformEngine for FailOddTransform {
        async fn do_transform(&self, record: ConnectRecord) -> TransformOutcome {
            if record.offset % 2 == 1 {
                TransformOutcome::Failed(record, RunnerError::TransformError {
                    runner: RunnerName::new("r1"),
                    source: "simulated transform failure".into(),
                })
            } else {
                TransformOutcome::Produced(record)
            }
        }
    }

    let offset_manager = Arc::new(RecordingOffsetManager::default());
    let sink = Arc::new(RecordingSink::default());
    let error_handler = Arc::new(RecordingErrorHandler::default());
    let runtime = CirculatorRuntime::new(
        fast_config(),
        Arc::new(FixedResources {
            transform: Arc::new(FailOddTransform),
            sink: Arc::clone(&sink) as Arc<dyn SinkTask>,
        }),
        offset_manager.clone(),
        error_handler.clone(),
    );

    let runner = RunnerName::new("r1");
    runtime.add_runner(RunnerConfig::with_defaults(runner.clone())).await;

    let bundle = runtime.context().bundle(&runner).expect("bundle registered");
    bundle
        .event_queue
        .offer(records(&runner, 10), Duration::from_millis(50))
        .await;

    wait_until(Duration::from_secs(5), || sink.delivered_offsets().len() == 5).await;
    wait_until(Duration::from_secs(2), || {
        error_handler.handled.lock().expect("mutex poisoned").len() == 5
    })
    .await;

    let mut delivered = sink.delivered_offsets();
    delivered.sort_unstable();
    assert_eq!(delivered, vec![0, 2, 4, 6, 8]);

    // Failed (odd) offsets were never committed.
    wait_until(Duration::from_millis(300), || {
        offset_manager.committed_offsets().len() == 5
    })
    .await;
    let mut committed = offset_manager.committed_offsets();
    committed.sort_unstable();
    assert_eq!(committed, vec![0, 2, 4, 6, 8]);

    runtime.delete_runner(runner).await;
}
