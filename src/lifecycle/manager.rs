// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use dashmap::DashMap;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{info, warn};

// Layer 3: Internal module imports
use super::event::RunnerEvent;
use super::resources::RunnerResourceFactory;
use super::spawner::WorkerSpawner;
use crate::config::{CirculatorConfig, RunnerConfig};
use crate::context::CirculatorContext;
use crate::util::RunnerName;
use crate::worker::ShutdownHandle;

struct WorkerHandle {
    shutdown: ShutdownHandle,
    join: JoinHandle<()>,
}

/// Applies add/update/delete runner notifications atomically.
///
/// `onAdd`/`onUpdate` both resolve to the same "install this bundle, start
/// a worker" sequence (spec.md §4.5); `onDelete` removes the mapping and
/// abandons in-flight records per the configured drain policy. Operations
/// for a single runner are serialized through a per-runner lock so a
/// racing `onUpdate`/`onDelete` pair can never interleave.
pub struct LifecycleManager<S: WorkerSpawner> {
    spawner: S,
    context: Arc<CirculatorContext>,
    resources: Arc<dyn RunnerResourceFactory>,
    circulator_config: Arc<CirculatorConfig>,
    workers: DashMap<RunnerName, WorkerHandle>,
    runner_locks: DashMap<RunnerName, Arc<Mutex<()>>>,
    shutdown_join_timeout: Duration,
}

impl<S: WorkerSpawner> LifecycleManager<S> {
    /// Construct a manager for one stage. `spawner` determines whether
    /// this manager drives Transform Workers or Push Workers.
    pub fn new(
        spawner: S,
        context: Arc<CirculatorContext>,
        resources: Arc<dyn RunnerResourceFactory>,
        circulator_config: Arc<CirculatorConfig>,
    ) -> Self {
        let shutdown_join_timeout = circulator_config.shutdown_worker_join_timeout;
        Self {
            spawner,
            context,
            resources,
            circulator_config,
            workers: DashMap::new(),
            runner_locks: DashMap::new(),
            shutdown_join_timeout,
        }
    }

    /// Dispatch a single notification.
    pub async fn apply(&self, event: RunnerEvent) {
        match event {
            RunnerEvent::Add(config) | RunnerEvent::Update(config) => self.put_worker(config).await,
            RunnerEvent::Delete(runner) => self.on_delete(runner).await,
        }
    }

    /// `onAdd(cfg)` / `onUpdate(cfg)`: replace the runner's bundle and
    /// worker atomically with respect to other operations on the same
    /// runner.
    async fn put_worker(&self, config: RunnerConfig) {
        let runner = config.runner.clone();
        let lock = self.runner_lock(&runner);
        let _guard = lock.lock().await;

        self.stop_worker(&runner).await;

        let transform_engine = self.resources.transform_engine(&runner);
        let sink = self.resources.sink(&runner);
        self.context
            .register_runner(config, &self.circulator_config, transform_engine, sink)
            .await;

        self.spawn_worker(runner).await;
    }

    /// `onDelete(cfg)`: remove the mapping atomically, signal shutdown,
    /// and release the bundle without replacing it.
    async fn on_delete(&self, runner: RunnerName) {
        let lock = self.runner_lock(&runner);
        let _guard = lock.lock().await;

        self.stop_worker(&runner).await;
        self.context.remove_runner(&runner);
        self.runner_locks.remove(&runner);
        info!(%runner, "runner deleted; bundle released and queued records abandoned");
    }

    /// Replace this stage's worker for `runner` without touching its
    /// resource bundle. Used by a caller (e.g.
    /// [`CirculatorRuntime`](crate::runtime::CirculatorRuntime)) that
    /// coordinates both stage managers against one shared runner and has
    /// already called [`CirculatorContext::register_runner`] itself —
    /// calling [`apply`](Self::apply) from both managers would otherwise
    /// register the bundle, and therefore construct the transform engine
    /// and sink, once per stage instead of once per event.
    pub async fn restart_worker(&self, runner: RunnerName) {
        let lock = self.runner_lock(&runner);
        let _guard = lock.lock().await;
        self.stop_worker(&runner).await;
        self.spawn_worker(runner).await;
    }

    /// Stop this stage's worker for `runner` without touching its
    /// resource bundle. Pairs with [`restart_worker`](Self::restart_worker)
    /// for a caller coordinating both stage managers' removal.
    pub async fn stop_worker_for(&self, runner: &RunnerName) {
        let lock = self.runner_lock(runner);
        let _guard = lock.lock().await;
        self.stop_worker(runner).await;
        self.runner_locks.remove(runner);
    }

    async fn spawn_worker(&self, runner: RunnerName) {
        let shutdown = ShutdownHandle::new();
        let join = self.spawner.spawn(runner.clone(), shutdown.clone());
        self.workers.insert(runner, WorkerHandle { shutdown, join });
    }

    /// Signal the existing worker (if any) to stop and wait for it within
    /// the configured timeout; on timeout, log and abandon it rather than
    /// block the lifecycle operation indefinitely (spec.md §7,
    /// `WorkerShutdownTimeout`).
    async fn stop_worker(&self, runner: &RunnerName) {
        let Some((_, handle)) = self.workers.remove(runner) else {
            return;
        };
        handle.shutdown.stop();
        if tokio::time::timeout(self.shutdown_join_timeout, handle.join).await.is_err() {
            warn!(
                %runner,
                "worker did not shut down within the configured timeout; abandoning it"
            );
        }
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
