//! The failure taxonomy and the `ErrorHandler` collaborator interface.
//!
//! Record-level failures never unwind a worker loop: every failure path
//! ends in a call to [`ErrorHandler::handle`], and the loop moves on to its
//! next iteration regardless of outcome.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;
use thiserror::Error;

// Layer 3: Internal module imports
use crate::record::ConnectRecord;
use crate::util::RunnerName;

/// Per-record or per-batch failure reasons routed to an [`ErrorHandler`].
///
/// Mirrors the taxonomy a worker loop can actually produce: a record never
/// carries more context than the stage that failed it had available.
#[derive(Debug, Error)]
pub enum RunnerError {
    /// `TransformEngine::do_transform` returned an error for a record.
    #[error("transform failed for runner {runner}: {source}")]
    TransformError {
        runner: RunnerName,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// `SinkTask::put` returned an error for an entire batch.
    #[error("sink delivery failed for runner {runner}: {source}")]
    SinkError {
        runner: RunnerName,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The target queue stayed full past the configured backpressure
    /// timeout; the record was dropped rather than delivered.
    #[error("backpressure drop for runner {runner}")]
    BackpressureDrop { runner: RunnerName },

    /// The transform or push executor refused to accept a task (its
    /// bounded queue was full). Treated like a transform/sink error batch.
    #[error("executor rejected task for runner {runner}")]
    ExecutorRejection { runner: RunnerName },

    /// The Lifecycle Manager could not join a worker within
    /// `shutdown.workerJoinTimeoutMs`; the worker was abandoned.
    #[error("worker for runner {runner} did not shut down within the configured timeout")]
    WorkerShutdownTimeout { runner: RunnerName },

    /// `onUpdate`/`onDelete` raced an in-flight batch on the old worker;
    /// the old worker's commit was accepted after the new worker had
    /// already started (spec.md §7, `ConfigurationRace`). Not routed to
    /// `ErrorHandler` — surfaced for observability only, since the
    /// `OffsetManager` is required to tolerate it.
    #[error("configuration changed for runner {runner} while a batch was in flight")]
    ConfigurationRace { runner: RunnerName },
}

impl RunnerError {
    /// The runner this failure belongs to, for routing and logging.
    pub fn runner(&self) -> &RunnerName {
        match self {
            Self::TransformError { runner, .. }
            | Self::SinkError { runner, .. }
            | Self::BackpressureDrop { runner }
            | Self::ExecutorRejection { runner }
            | Self::WorkerShutdownTimeout { runner }
            | Self::ConfigurationRace { runner } => runner,
        }
    }
}

/// A boxed, thread-safe transform/sink failure, produced by collaborator
/// implementations and carried into [`RunnerError`] variants.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Per-record failure sink.
///
/// Implementations decide DLQ vs retry vs drop; this core only guarantees
/// that every failure reaches `handle` exactly once and that the call does
/// not block the worker loop for long.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
    /// Hand a failed record to the collaborator, along with the reason it
    /// failed.
    async fn handle(&self, record: ConnectRecord, error: RunnerError);
}

/// An [`ErrorHandler`] that silently discards every record.
///
/// This is the default policy referenced by scenario 2 in end-to-end
/// testing: a sink failure costs exactly the records in the failed batch.
#[derive(Debug, Default, Clone, Copy)]
pub struct DropErrorHandler;

#[async_trait]
impl ErrorHandler for DropErrorHandler {
    async fn handle(&self, _record: ConnectRecord, _error: RunnerError) {}
}
