// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
// (none)

// Layer 3: Internal module imports
use crate::sink::SinkTask;
use crate::transform::TransformEngine;
use crate::util::RunnerName;

/// Resolves the transform chain and sink a runner should use.
///
/// Configuration discovery and persistence are out of scope for this
/// core (spec.md §1); this trait is the seam through which the bootstrap
/// layer supplies the collaborators the Lifecycle Manager needs to build
/// a fresh resource bundle on `onAdd`/`onUpdate`.
pub trait RunnerResourceFactory: Send + Sync {
    /// The transform chain to install for `runner`.
    fn transform_engine(&self, runner: &RunnerName) -> Arc<dyn TransformEngine>;
    /// The sink to install for `runner`.
    fn sink(&self, runner: &RunnerName) -> Arc<dyn SinkTask>;
}
