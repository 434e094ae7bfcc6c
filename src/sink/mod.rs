//! The `SinkTask` collaborator interface: delivery of a whole batch to an
//! external target.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use crate::error::BoxError;
use crate::record::ConnectRecord;

/// External delivery target for the push stage.
///
/// `put` receives the whole batch in one call; the push stage treats any
/// error as a failure of every record in the batch (no partial success).
#[async_trait]
pub trait SinkTask: Send + Sync {
    /// Deliver `records` to the target. An error fails the entire batch.
    async fn put(&self, records: &[ConnectRecord]) -> Result<(), BoxError>;
}
