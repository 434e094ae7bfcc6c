// Layer 1: Standard library imports
use std::sync::Arc;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::Utc;
use tracing::{debug, trace, warn};

// Layer 3: Internal module imports
use super::shutdown::ShutdownHandle;
use crate::config::CirculatorConfig;
use crate::context::CirculatorContext;
use crate::error::{ErrorHandler, RunnerError};
use crate::estimator::RateEstimator;
use crate::metrics::{EstimateMetrics, Stage};
use crate::offset::OffsetManager;
use crate::util::RunnerName;

/// One long-running worker per runner, driving the Push stage (target
/// queue → sink delivery → commit).
pub struct PushWorker {
    runner: RunnerName,
    context: Arc<CirculatorContext>,
    estimator: RateEstimator,
    offset_manager: Arc<dyn OffsetManager>,
    error_handler: Arc<dyn ErrorHandler>,
    config: Arc<CirculatorConfig>,
    shutdown: ShutdownHandle,
}

impl PushWorker {
    /// Construct a worker for `runner`.
    pub fn new(
        runner: RunnerName,
        context: Arc<CirculatorContext>,
        offset_manager: Arc<dyn OffsetManager>,
        error_handler: Arc<dyn ErrorHandler>,
        config: Arc<CirculatorConfig>,
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
        debug!(runner = %self.runner, "push worker exiting");
    }

    async fn iterate(&self) {
        let bundle = match self.context.bundle(&self.runner) {
            Some(bundle) => bundle,
            None => {
                trace!(runner = %self.runner, "no bundle yet; backing off");
                self.shutdown.wait(self.config.push_empty_wait).await;
                return;
            }
        };

        let push_metrics = match bundle.push_metrics() {
            Some(metrics) => metrics,
            None => {
                trace!(runner = %self.runner, "runner removed; backing off");
                self.shutdown.wait(self.config.push_empty_wait).await;
                return;
            }
        };

        let records = bundle.target_queue.take(push_metrics.cwnd as usize).await;
        if records.is_empty() {
            self.shutdown.wait(self.config.push_empty_wait).await;
            return;
        }

        let start_timestamp = Utc::now();
        let runner = self.runner.clone();
        let sink = Arc::clone(&bundle.sink);
        let offset_manager = Arc::clone(&self.offset_manager);
        let error_handler = Arc::clone(&self.error_handler);
        let estimator = self.estimator;
        let prior_cwnd = push_metrics.cwnd;
        let prior_ssthresh = push_metrics.ssthresh;
        let bundle_for_task = Arc::clone(&bundle);
        // Kept alongside the batch moved into the submitted task so a
        // rejection (the task never ran) still has a batch to route to the
        // error handler — `submit` drops the future, and the `records` it
        // owns, without executing it.
        let records_for_rejection = records.clone();

        let submission = bundle.executor.submit(async move {
            let outcome = sink.put(&records).await;
            let end_timestamp = Utc::now();
            let remaining = bundle_for_task.executor.remaining_capacity() as u32;
            let total = bundle_for_task.executor.total_capacity() as u32;

            match outcome {
                Ok(()) => {
                    offset_manager.commit_batch(&records).await;
                    let estimate = EstimateMetrics {
                        runner: runner.clone(),
                        stage: Stage::Pusher,
                        batch_size: records.len() as u32,
                        prior_cwnd,
                        prior_ssthresh,
                        rwnd: None,
                        start_timestamp,
                        end_timestamp,
                        worker_queue_remaining_capacity: Some(remaining),
                        worker_queue_total_capacity: Some(total),
                        error: false,
                    };
                    bundle_for_task.publish_push_metrics(estimator.compute(&estimate));
                }
                Err(source) => {
                    let estimate = EstimateMetrics {
                        runner: runner.clone(),
                        stage: Stage::Pusher,
                        batch_size: 0,
                        prior_cwnd,
                        prior_ssthresh,
                        rwnd: None,
                        start_timestamp,
                        end_timestamp,
                        worker_queue_remaining_capacity: Some(remaining),
                        worker_queue_total_capacity: Some(total),
                        error: true,
                    };
                    bundle_for_task.publish_push_metrics(estimator.compute(&estimate));
                    warn!(runner = %runner, %source, "sink delivery failed");
                    for record in records {
                        error_handler
                            .handle(
                                record,
                                RunnerError::SinkError {
                                    runner: runner.clone(),
                                    source,
                                },
                            )
                            .await;
                    }
                }
            }
        });

        if submission.await.is_err() {
            warn!(runner = %self.runner, "push executor rejected batch; treating as error batch");
            let estimate = EstimateMetrics {
                runner: self.runner.clone(),
                stage: Stage::Pusher,
                batch_size: 0,
                prior_cwnd,
                prior_ssthresh,
                rwnd: None,
                start_timestamp,
                end_timestamp: Utc::now(),
                worker_queue_remaining_capacity: None,
                worker_queue_total_capacity: None,
                error: true,
            };
            bundle.publish_push_metrics(self.estimator.compute(&estimate));
            for record in records_for_rejection {
                self.error_handler
                    .handle(
                        record,
                        RunnerError::ExecutorRejection {
                            runner: self.runner.clone(),
                        },
                    )
                    .await;
            }
        }
    }
}
