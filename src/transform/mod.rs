//! The `TransformEngine` collaborator interface and the per-record outcome
//! type that replaces the ambiguous exception-then-null collapse of the
//! source pattern this core re-architects.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use crate::error::RunnerError;
use crate::record::ConnectRecord;

/// The result of running one record through a [`TransformEngine`].
///
/// A null return and a caught exception are historically easy to conflate
/// (both end up "nothing to forward"), but only one of the two is safe to
/// commit. This type keeps them distinct all the way through the worker's
/// join step.
#[derive(Debug)]
pub enum TransformOutcome {
    /// The transform produced an outbound record to forward.
    Produced(ConnectRecord),
    /// The transform intentionally filtered the record; it is acked but
    /// not forwarded.
    Dropped(ConnectRecord),
    /// The transform raised an error; routed to the `ErrorHandler` and
    /// neither forwarded nor committed.
    Failed(ConnectRecord, RunnerError),
}

/// Per-runner transform chain.
///
/// `transform_size` is the fan-out multiplier the Rate Estimator uses to
/// scale the transform stage's proposed `cwnd`: a chain that turns one
/// inbound record into several outbound ones needs a proportionally larger
/// allowance on its next pull.
#[async_trait]
pub trait TransformEngine: Send + Sync {
    /// Apply this runner's transform chain to one record.
    async fn do_transform(&self, record: ConnectRecord) -> TransformOutcome;

    /// The fan-out multiplier used to scale `cwnd`. Implementations that do
    /// not fan out should return `1`.
    fn transform_size(&self) -> u32 {
        1
    }
}

/// A [`TransformEngine`] that forwards every record unchanged.
///
/// Used as the transform chain in tests exercising only queue/estimator
/// behavior.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityTransform;

#[async_trait]
impl TransformEngine for IdentityTransform {
    async fn do_transform(&self, record: ConnectRecord) -> TransformOutcome {
        TransformOutcome::Produced(record)
    }
}
