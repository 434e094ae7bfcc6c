// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::util::RunnerName;

/// Default number of concurrent push-executor workers for a runner.
pub const DEFAULT_EXECUTOR_WORKERS: usize = 4;

/// Default bound on the push executor's pending-task queue.
pub const DEFAULT_EXECUTOR_QUEUE_CAPACITY: usize = 64;

/// Default bound on a runner's inbound event queue.
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 1000;

/// Default bound on a runner's transform-to-push target queue.
pub const DEFAULT_TARGET_QUEUE_CAPACITY: usize = 1000;

/// Per-runner resource sizing: the knobs the Lifecycle Manager uses when it
/// constructs a fresh bundle for a `RunnerName` (see
/// [`CirculatorConfig`](crate::config::CirculatorConfig) for the knobs
/// shared across every runner).
///
/// # Example
///
/// ```rust
/// use circulator::config::RunnerConfig;
/// use circulator::util::RunnerName;
///
/// let config = RunnerConfig::builder(RunnerName::new("r1"))
///     .with_executor_workers(8)
///     .build();
/// assert_eq!(config.executor_workers, 8);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    /// The runner this configuration belongs to.
    pub runner: RunnerName,
    /// `executor.workers[runner]` — concurrent push-executor workers.
    pub executor_workers: usize,
    /// `executor.queueCapacity[runner]` — bound on pending push tasks.
    pub executor_queue_capacity: usize,
    /// `eventQueue.capacity[runner]` — bound on the inbound event queue.
    pub event_queue_capacity: usize,
    /// `targetQueue.capacity[runner]` — bound on the transform-to-push
    /// target queue.
    pub target_queue_capacity: usize,
}

impl RunnerConfig {
    /// Construct a configuration for `runner` using every default.
    pub fn with_defaults(runner: RunnerName) -> Self {
        Self {
            runner,
            executor_workers: DEFAULT_EXECUTOR_WORKERS,
            executor_queue_capacity: DEFAULT_EXECUTOR_QUEUE_CAPACITY,
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
            target_queue_capacity: DEFAULT_TARGET_QUEUE_CAPACITY,
        }
    }

    /// Start building a configuration for `runner` from defaults.
    pub fn builder(runner: RunnerName) -> RunnerConfigBuilder {
        RunnerConfigBuilder {
            config: Self::with_defaults(runner),
        }
    }
}

/// Fluent builder for [`RunnerConfig`].
#[derive(Debug)]
pub struct RunnerConfigBuilder {
    config: RunnerConfig,
}

impl RunnerConfigBuilder {
    /// Set the number of concurrent push-executor workers.
    pub fn with_executor_workers(mut self, workers: usize) -> Self {
        self.config.executor_workers = workers;
        self
    }

    /// Set the bound on the push executor's pending-task queue.
    pub fn with_executor_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.executor_queue_capacity = capacity;
        self
    }

    /// Set the bound on the inbound event queue.
    pub fn with_event_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.event_queue_capacity = capacity;
        self
    }

    /// Set the bound on the transform-to-push target queue.
    pub fn with_target_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.target_queue_capacity = capacity;
        self
    }

    /// Produce the final configuration. Unlike [`CirculatorConfig`]'s
    /// builder, every field here has a sane positive default, so
    /// construction cannot fail.
    pub fn build(self) -> RunnerConfig {
        self.config
    }
}
