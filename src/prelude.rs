//! Prelude module for convenient imports.
//!
//! This module re-exports the most commonly used types and traits for
//! wiring a circulator runtime:
//!
//! ```rust
//! use circulator::prelude::*;
//! ```

// Core pipeline
pub use crate::record::ConnectRecord;
pub use crate::metrics::{EstimateMetrics, RunnerMetrics, Stage};
pub use crate::estimator::RateEstimator;

// Collaborator interfaces
pub use crate::transform::{IdentityTransform, TransformEngine, TransformOutcome};
pub use crate::sink::SinkTask;
pub use crate::offset::OffsetManager;
pub use crate::error::{DropErrorHandler, ErrorHandler, RunnerError};

// Orchestration
pub use crate::context::CirculatorContext;
pub use crate::lifecycle::{LifecycleManager, RunnerEvent, RunnerResourceFactory};
pub use crate::runtime::CirculatorRuntime;

// Configuration
pub use crate::config::{CirculatorConfig, RunnerConfig};

// Utilities
pub use crate::util::RunnerName;
