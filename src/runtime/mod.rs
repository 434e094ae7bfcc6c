//! Top-level wiring: constructs the Circulator Context and both stage
//! Lifecycle Managers into one handle applications drive.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::info;

// Layer 3: Internal module imports
use crate::config::{CirculatorConfig, RunnerConfig};
use crate::context::CirculatorContext;
use crate::error::ErrorHandler;
use crate::lifecycle::{LifecycleManager, PushWorkerSpawner, RunnerResourceFactory, TransformWorkerSpawner};
use crate::offset::OffsetManager;
use crate::util::RunnerName;

/// The assembled runtime: one [`CirculatorContext`] shared by two
/// independent Lifecycle Managers, one per stage, as spec.md §4.5
/// requires.
///
/// # Example
///
/// ```rust
/// use circulator::config::{CirculatorConfig, RunnerConfig};
/// use circulator::error::DropErrorHandler;
/// use circulator::lifecycle::RunnerResourceFactory;
/// use circulator::runtime::CirculatorRuntime;
/// use circulator::sink::SinkTask;
/// use circulator::transform::{IdentityTransform, TransformEngine};
/// use circulator::util::RunnerName;
/// use std::sync::Arc;
///
/// # #[derive(Default)]
/// # struct NoopSink;
/// # #[async_trait::async_trait]
/// # impl SinkTask for NoopSink {
/// #     async fn put(&self, _records: &[circulator::record::ConnectRecord]) -> Result<(), circulator::error::BoxError> {
/// #         Ok(())
/// #     }
/// # }
/// # #[derive(Default)]
/// # struct NoopOffsetManager;
/// # #[async_trait::async_trait]
/// # impl circulator::offset::OffsetManager for NoopOffsetManager {
/// #     async fn commit(&self, _record: &circulator::record::ConnectRecord) {}
/// # }
/// struct Factory;
/// impl RunnerResourceFactory for Factory {
///     fn transform_engine(&self, _runner: &RunnerName) -> Arc<dyn TransformEngine> {
///         Arc::new(IdentityTransform)
///     }
///     fn sink(&self, _runner: &RunnerName) -> Arc<dyn SinkTask> {
///         Arc::new(NoopSink)
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let runtime = CirculatorRuntime::new(
///     CirculatorConfig::default(),
///     Arc::new(Factory),
///     Arc::new(NoopOffsetManager),
///     Arc::new(DropErrorHandler),
/// );
/// runtime.add_runner(RunnerConfig::with_defaults(RunnerName::new("r1"))).await;
/// # }
/// ```
pub struct CirculatorRuntime {
    context: Arc<CirculatorContext>,
    resources: Arc<dyn RunnerResourceFactory>,
    circulator_config: Arc<CirculatorConfig>,
    transform_lifecycle: LifecycleManager<TransformWorkerSpawner>,
    push_lifecycle: LifecycleManager<PushWorkerSpawner>,
    /// Serializes a runner's add/update/delete against its own bundle
    /// registration, across both stage managers at once.
    runner_locks: DashMap<RunnerName, Arc<Mutex<()>>>,
}

impl CirculatorRuntime {
    /// Assemble a runtime. `resources` resolves the transform chain and
    /// sink for each runner; `offset_manager` and `error_handler` are
    /// shared by every runner and both stages.
    pub fn new(
        circulator_config: CirculatorConfig,
        resources: Arc<dyn RunnerResourceFactory>,
        offset_manager: Arc<dyn OffsetManager>,
        error_handler: Arc<dyn ErrorHandler>,
    ) -> Self {
        let config = Arc::new(circulator_config);
        let context = Arc::new(CirculatorContext::new());

        let transform_spawner = TransformWorkerSpawner::new(
            Arc::clone(&context),
            Arc::clone(&offset_manager),
            Arc::clone(&error_handler),
            Arc::clone(&config),
            config.backpressure_timeout,
        );
        let push_spawner = PushWorkerSpawner::new(
            Arc::clone(&context),
            offset_manager,
            error_handler,
            Arc::clone(&config),
        );

        Self {
            transform_lifecycle: LifecycleManager::new(
                transform_spawner,
                Arc::clone(&context),
                Arc::clone(&resources),
                Arc::clone(&config),
            ),
            push_lifecycle: LifecycleManager::new(
                push_spawner,
                Arc::clone(&context),
                Arc::clone(&resources),
                Arc::clone(&config),
            ),
            context,
            resources,
            circulator_config: config,
            runner_locks: DashMap::new(),
        }
    }

    /// Access the underlying broker, e.g. to enqueue inbound records via a
    /// source-adapter collaborator.
    pub fn context(&self) -> &Arc<CirculatorContext> {
        &self.context
    }

    /// Apply an `onAdd` notification: register the runner's bundle once,
    /// then start a Transform Worker and a Push Worker against it.
    pub async fn add_runner(&self, config: RunnerConfig) {
        info!(runner = %config.runner, "adding runner");
        self.put_runner(config).await;
    }

    /// Apply an `onUpdate` notification: re-register the runner's bundle
    /// once (carrying over unconsumed records, spec.md §3) and replace
    /// both stages' workers against it.
    pub async fn update_runner(&self, config: RunnerConfig) {
        info!(runner = %config.runner, "updating runner");
        self.put_runner(config).await;
    }

    /// `onAdd`/`onUpdate` share this sequence: the Circulator Context owns
    /// the bundle (spec.md §4.1), so it is registered exactly once here
    /// rather than once per stage manager, before either stage's worker is
    /// restarted against it.
    async fn put_runner(&self, config: RunnerConfig) {
        let runner = config.runner.clone();
        let lock = self.runner_lock(&runner);
        let _guard = lock.lock().await;

        let transform_engine = self.resources.transform_engine(&runner);
        let sink = self.resources.sink(&runner);
        self.context
            .register_runner(config, &self.circulator_config, transform_engine, sink)
            .await;

        self.transform_lifecycle.restart_worker(runner.clone()).await;
        self.push_lifecycle.restart_worker(runner).await;
    }

    /// Apply an `onDelete` notification: stop both stages' workers, then
    /// release the shared bundle.
    pub async fn delete_runner(&self, runner: RunnerName) {
        info!(%runner, "deleting runner");
        let lock = self.runner_lock(&runner);
        let _guard = lock.lock().await;

        self.transform_lifecycle.stop_worker_for(&runner).await;
        self.push_lifecycle.stop_worker_for(&runner).await;
        self.context.remove_runner(&runner);
        self.runner_locks.remove(&runner);
    }

    fn runner_lock(&self, runner: &RunnerName) -> Arc<Mutex<()>> {
        Arc::clone(
            self.runner_locks
                .entry(runner.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .value(),
        )
    }
}
