// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use tokio::task::JoinHandle;

// Layer 3: Internal module imports
use crate::config::CirculatorConfig;
use crate::context::CirculatorContext;
use crate::error::ErrorHandler;
use crate::offset::OffsetManager;
use crate::util::RunnerName;
use crate::worker::{PushWorker, ShutdownHandle, TransformWorker};

/// Starts the concrete worker a [`LifecycleManager`](super::LifecycleManager)
/// is responsible for. Implemented once per stage so the same manager
/// logic drives both the Transform and Push worker sets.
pub trait WorkerSpawner: Send + Sync {
    /// Spawn a worker for `runner`, wired to `shutdown`.
    fn spawn(&self, runner: RunnerName, shutdown: ShutdownHandle) -> JoinHandle<()>;
}

/// Spawns [`TransformWorker`]s.
pub struct TransformWorkerSpawner {
    context: Arc<CirculatorContext>,
    offset_manager: Arc<dyn OffsetManager>,
    error_handler: Arc<dyn ErrorHandler>,
    config: Arc<CirculatorConfig>,
    backpressure_timeout: Duration,
}

impl TransformWorkerSpawner {
    /// Construct a spawner sharing the given collaborators with every
    /// Transform Worker it starts.
    pub fn new(
        context: Arc<CirculatorContext>,
        offset_manager: Arc<dyn OffsetManager>,
        error_handler: Arc<dyn ErrorHandler>,
        config: Arc<CirculatorConfig>,
        backpressure_timeout: Duration,
    ) -> Self {
        Self {
            context,
            offset_manager,
            error_handler,
            config,
            backpressure_timeout,
        }
    }
}

impl WorkerSpawner for TransformWorkerSpawner {
    fn spawn(&self, runner: RunnerName, shutdown: ShutdownHandle) -> JoinHandle<()> {
        let worker = TransformWorker::new(
            runner,
            Arc::clone(&self.context),
            Arc::clone(&self.offset_manager),
            Arc::clone(&self.error_handler),
            Arc::clone(&self.config),
            self.backpressure_timeout,
            shutdown,
        );
        tokio::spawn(worker.run())
    }
}

/// Spawns [`PushWorker`]s.
pub struct PushWorkerSpawner {
    context: Arc<CirculatorContext>,
    offset_manager: Arc<dyn OffsetManager>,
    error_handler: Arc<dyn ErrorHandler>,
    config: Arc<CirculatorConfig>,
}

impl PushWorkerSpawner {
    /// Construct a spawner sharing the given collaborators with every
    /// Push Worker it starts.
    pub fn new(
        context: Arc<CirculatorContext>,
        offset_manager: Arc<dyn OffsetManager>,
        error_handler: Arc<dyn ErrorHandler>,
        config: Arc<CirculatorConfig>,
    ) -> Self {
        Self {
            context,
            offset_manager,
            error_handler,
            config,
        }
    }
}

impl WorkerSpawner for PushWorkerSpawner {
    fn spawn(&self, runner: RunnerName, shutdown: ShutdownHandle) -> JoinHandle<()> {
        let worker = PushWorker::new(
            runner,
            Arc::clone(&self.context),
            Arc::clone(&self.offset_manager),
            Arc::clone(&self.error_handler),
            Arc::clone(&self.config),
            shutdown,
        );
        tokio::spawn(worker.run())
    }
}
