//! The `OffsetManager` collaborator interface: idempotent commit/ack of
//! records back to the inbound source.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use crate::record::ConnectRecord;

/// Acknowledges records as definitively handled — either delivered to the
/// sink or intentionally dropped by the transform chain.
///
/// Implementations must be idempotent: the core does not guarantee a
/// record is committed exactly once (see `WorkerShutdownTimeout` and
/// `ConfigurationRace` in the error taxonomy), and ordering across
/// concurrent callers is not required.
#[async_trait]
pub trait OffsetManager: Send + Sync {
    /// Commit a single record, used by the transform stage's drop path.
    async fn commit(&self, record: &ConnectRecord);

    /// Commit a batch of records, used by the push stage after a
    /// successful sink delivery. The default implementation commits each
    /// record independently; implementations with a cheaper batch
    /// primitive should override it.
    async fn commit_batch(&self, records: &[ConnectRecord]) {
        for record in records {
            self.commit(record).await;
        }
    }
}
