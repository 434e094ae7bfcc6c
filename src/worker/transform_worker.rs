// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::Utc;
use tokio::task::JoinSet;
use tracing::{debug, trace, warn};

// Layer 3: Internal module imports
use super::shutdown::ShutdownHandle;
use crate::config::CirculatorConfig;
use crate::context::CirculatorContext;
use crate::error::{ErrorHandler, RunnerError};
use crate::estimator::RateEstimator;
use crate::metrics::{EstimateMetrics, Stage};
use crate::offset::OffsetManager;
use crate::record::ConnectRecord;
use crate::transform::TransformOutcome;
use crate::util::RunnerName;

/// One long-running worker per runner, driving the Transform stage
/// (inbound event queue → transform chain → target queue).
pub struct TransformWorker {
    runner: RunnerName,
    context: Arc<CirculatorContext>,
    estimator: RateEstimator,
    offset_manager: Arc<dyn OffsetManager>,
    error_handler: Arc<dyn ErrorHandler>,
    config: Arc<CirculatorConfig>,
    backpressure_timeout: Duration,
    shutdown: ShutdownHandle,
}

impl TransformWorker {
    /// Construct a worker for `runner`. `run` must be called (typically
    /// spawned) to actually drive the loop.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        runner: RunnerName,
        context: Arc<CirculatorContext>,
        offset_manager: Arc<dyn OffsetManager>,
        error_handler: Arc<dyn ErrorHandler>,
        config: Arc<CirculatorConfig>,
        backpressure_timeout: Duration,
        shutdown: ShutdownHandle,
    ) -> Self {
        let estimator = RateEstimator::with_bounds(config.cwnd_min, config.cwnd_max);
        Self {
            runner,
            context,
            estimator,
            offset_manager,
            error_handler,
            config,
            backpressure_timeout,
            shutdown,
        }
    }

    /// Drive the loop until shutdown is requested.
    pub async fn run(self) {
        loop {
            if self.shutdown.is_stopped() {
                break;
            }
            self.iterate().await;
        }
        debug!(runner = %self.runner, "transform worker exiting");
    }

    async fn iterate(&self) {
        let bundle = match self.context.bundle(&self.runner) {
            Some(bundle) => bundle,
            None => {
                trace!(runner = %self.runner, "no bundle yet; backing off");
                self.shutdown.wait(self.config.transform_empty_wait).await;
                return;
            }
        };

        let transform_metrics = match bundle.transform_metrics() {
            Some(metrics) => metrics,
            None => {
                trace!(runner = %self.runner, "runner removed; backing off");
                self.shutdown.wait(self.config.transform_empty_wait).await;
                return;
            }
        };

        let records = bundle.event_queue.take(transform_metrics.cwnd as usize).await;
        if records.is_empty() {
            self.shutdown.wait(self.config.transform_empty_wait).await;
            return;
        }

        let engines = self.context.task_transform_map();
        if engines.is_empty() {
            self.shutdown.wait(self.config.transform_no_engine_wait).await;
            return;
        }
        let engine = match engines.get(&self.runner) {
            Some(engine) => Arc::clone(engine),
            None => {
                self.shutdown.wait(self.config.transform_no_engine_wait).await;
                return;
            }
        };

        let start_timestamp = Utc::now();
        let mut join_set: JoinSet<TransformOutcome> = JoinSet::new();
        for record in records {
            let engine = Arc::clone(&engine);
            join_set.spawn(async move { engine.do_transform(record).await });
        }

        let mut after_transform: Vec<ConnectRecord> = Vec::new();
        let mut batch_error = false;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok(TransformOutcome::Produced(record)) => after_transform.push(record),
                Ok(TransformOutcome::Dropped(record)) => self.offset_manager.commit(&record).await,
                Ok(TransformOutcome::Failed(record, error)) => {
                    self.error_handler.handle(record, error).await
                }
                Err(join_error) => {
                    warn!(runner = %self.runner, %join_error, "transform task panicked; treating batch as failed");
                    batch_error = true;
                }
            }
        }
        let end_timestamp = Utc::now();

        if batch_error {
            let estimate = EstimateMetrics {
                runner: self.runner.clone(),
                stage: Stage::Trans,
                batch_size: 0,
                prior_cwnd: transform_metrics.cwnd,
                prior_ssthresh: transform_metrics.ssthresh,
                rwnd: None,
                start_timestamp,
                end_timestamp,
                worker_queue_remaining_capacity: None,
                worker_queue_total_capacity: None,
                error: true,
            };
            bundle.publish_transform_metrics(self.estimator.compute(&estimate));
            for record in after_transform {
                self.error_handler
                    .handle(
                        record,
                        RunnerError::ExecutorRejection {
                            runner: self.runner.clone(),
                        },
                    )
                    .await;
            }
            return;
        }

        let batch_size = after_transform.len() as u32;
        let fan_out = engine.transform_size().max(1);
        let final_cwnd = transform_metrics.cwnd.saturating_mul(fan_out);
        let rwnd = bundle.push_metrics().map(|push| push.cwnd);

        self.context
            .offer_target_task_queue(after_transform, self.backpressure_timeout, self.error_handler.as_ref())
            .await;

        let estimate = EstimateMetrics {
            runner: self.runner.clone(),
            stage: Stage::Trans,
            batch_size,
            prior_cwnd: final_cwnd,
            prior_ssthresh: transform_metrics.ssthresh,
            rwnd,
            start_timestamp,
            end_timestamp,
            worker_queue_remaining_capacity: Some(bundle.target_queue.remaining_capacity() as u32),
            worker_queue_total_capacity: Some(bundle.target_queue.capacity() as u32),
            error: false,
        };
        bundle.publish_transform_metrics(self.estimator.compute(&estimate));
    }
}
