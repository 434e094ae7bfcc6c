// Layer 1: Standard library imports
use std::time::Duration;

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
use crate::estimator::{CWND_MAX, CWND_MIN};

/// Initial congestion window for a freshly registered runner.
pub const DEFAULT_CWND_INITIAL: u32 = 1;

/// Initial slow-start threshold for a freshly registered runner.
pub const DEFAULT_SSTHRESH_INITIAL: u32 = 64;

/// How long the Transform Worker waits after finding an empty event queue.
pub const DEFAULT_TRANSFORM_EMPTY_WAIT: Duration = Duration::from_millis(1000);

/// How long the Transform Worker waits when no transform engine is
/// registered for the runner yet.
pub const DEFAULT_TRANSFORM_NO_ENGINE_WAIT: Duration = Duration::from_millis(3000);

/// How long the Push Worker waits after finding an empty target queue.
pub const DEFAULT_PUSH_EMPTY_WAIT: Duration = Duration::from_millis(1000);

/// How long the Lifecycle Manager waits for an old worker to terminate
/// before abandoning it.
pub const DEFAULT_SHUTDOWN_WORKER_JOIN_TIMEOUT: Duration = Duration::from_millis(5000);

/// How long `offerTargetTaskQueue` retries a record against a full target
/// queue before dropping it to the Error Handler as a `BackpressureDrop`.
pub const DEFAULT_BACKPRESSURE_TIMEOUT: Duration = Duration::from_millis(2000);

/// Circulator-wide configuration: the knobs shared by every runner rather
/// than tuned per runner (see [`RunnerConfig`](crate::config::RunnerConfig)
/// for the per-runner resource sizing).
///
/// # Example
///
/// ```rust
/// use circulator::config::CirculatorConfig;
/// use std::time::Duration;
///
/// let config = CirculatorConfig::builder()
///     .with_ssthresh_initial(32)
///     .with_push_empty_wait(Duration::from_millis(500))
///     .build()
///     .unwrap();
/// assert_eq!(config.ssthresh_initial, 32);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CirculatorConfig {
    /// `cwnd.initial` — starting congestion window for every new runner.
    pub cwnd_initial: u32,
    /// `ssthresh.initial` — starting slow-start threshold.
    pub ssthresh_initial: u32,
    /// `cwnd.min` — lower clamp applied by the Rate Estimator.
    pub cwnd_min: u32,
    /// `cwnd.max` — upper clamp applied by the Rate Estimator.
    pub cwnd_max: u32,
    /// `transform.emptyWaitMs` — wait after an empty event-queue probe.
    pub transform_empty_wait: Duration,
    /// `transform.noEngineWaitMs` — wait when no transform engine is
    /// registered yet.
    pub transform_no_engine_wait: Duration,
    /// `push.emptyWaitMs` — wait after an empty target-queue probe.
    pub push_empty_wait: Duration,
    /// `shutdown.workerJoinTimeoutMs` — bound on how long the Lifecycle
    /// Manager waits for a worker to terminate before abandoning it.
    pub shutdown_worker_join_timeout: Duration,
    /// Bound on how long `offerTargetTaskQueue` retries a record against a
    /// full target queue before dropping it to the Error Handler.
    pub backpressure_timeout: Duration,
}

impl Default for CirculatorConfig {
    fn default() -> Self {
        Self {
            cwnd_initial: DEFAULT_CWND_INITIAL,
            ssthresh_initial: DEFAULT_SSTHRESH_INITIAL,
            cwnd_min: CWND_MIN,
            cwnd_max: CWND_MAX,
            transform_empty_wait: DEFAULT_TRANSFORM_EMPTY_WAIT,
            transform_no_engine_wait: DEFAULT_TRANSFORM_NO_ENGINE_WAIT,
            push_empty_wait: DEFAULT_PUSH_EMPTY_WAIT,
            shutdown_worker_join_timeout: DEFAULT_SHUTDOWN_WORKER_JOIN_TIMEOUT,
            backpressure_timeout: DEFAULT_BACKPRESSURE_TIMEOUT,
        }
    }
}

impl CirculatorConfig {
    /// Start building a configuration from defaults.
    pub fn builder() -> CirculatorConfigBuilder {
        CirculatorConfigBuilder::default()
    }

    /// Validate invariants this configuration must uphold (spec.md's `cwnd
    /// >= 1`, `ssthresh >= 1`, `cwnd_min <= cwnd_max`).
    pub fn validate(&self) -> Result<(), String> {
        if self.cwnd_initial == 0 {
            return Err("cwnd_initial must be >= 1".to_string());
        }
        if self.ssthresh_initial == 0 {
            return Err("ssthresh_initial must be >= 1".to_string());
        }
        if self.cwnd_min == 0 {
            return Err("cwnd_min must be >= 1".to_string());
        }
        if self.cwnd_min > self.cwnd_max {
            return Err("cwnd_min must be <= cwnd_max".to_string());
        }
        if self.cwnd_initial < self.cwnd_min || self.cwnd_initial > self.cwnd_max {
            return Err("cwnd_initial must lie within [cwnd_min, cwnd_max]".to_string());
        }
        Ok(())
    }
}

/// Fluent builder for [`CirculatorConfig`].
#[derive(Debug, Default)]
pub struct CirculatorConfigBuilder {
    config: CirculatorConfig,
}

impl CirculatorConfigBuilder {
    /// Set the initial congestion window for new runners.
    pub fn with_cwnd_initial(mut self, cwnd_initial: u32) -> Self {
        self.config.cwnd_initial = cwnd_initial;
        self
    }

    /// Set the initial slow-start threshold for new runners.
    pub fn with_ssthresh_initial(mut self, ssthresh_initial: u32) -> Self {
        self.config.ssthresh_initial = ssthresh_initial;
        self
    }

    /// Set the estimator's lower `cwnd` clamp.
    pub fn with_cwnd_min(mut self, cwnd_min: u32) -> Self {
        self.config.cwnd_min = cwnd_min;
        self
    }

    /// Set the estimator's upper `cwnd` clamp.
    pub fn with_cwnd_max(mut self, cwnd_max: u32) -> Self {
        self.config.cwnd_max = cwnd_max;
        self
    }

    /// Set the Transform Worker's empty-queue wait interval.
    pub fn with_transform_empty_wait(mut self, wait: Duration) -> Self {
        self.config.transform_empty_wait = wait;
        self
    }

    /// Set the Transform Worker's no-engine wait interval.
    pub fn with_transform_no_engine_wait(mut self, wait: Duration) -> Self {
        self.config.transform_no_engine_wait = wait;
        self
    }

    /// Set the Push Worker's empty-queue wait interval.
    pub fn with_push_empty_wait(mut self, wait: Duration) -> Self {
        self.config.push_empty_wait = wait;
        self
    }

    /// Set the bound on worker shutdown joins.
    pub fn with_shutdown_worker_join_timeout(mut self, timeout: Duration) -> Self {
        self.config.shutdown_worker_join_timeout = timeout;
        self
    }

    /// Set the bound on target-queue backpressure retries.
    pub fn with_backpressure_timeout(mut self, timeout: Duration) -> Self {
        self.config.backpressure_timeout = timeout;
        self
    }

    /// Validate and produce the final configuration.
    pub fn build(self) -> Result<CirculatorConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}
