//! # circulator — per-runner execution core of an event-bridge runtime
//!
//! A two-stage pipeline that, for each configured "runner" (a
//! subscription-to-target binding), pulls inbound event records from an
//! in-memory staging area, transforms them through a per-runner transform
//! chain, hands them to a downstream push stage, and delivers them to a
//! sink. Between stages the core continuously self-regulates throughput
//! with a TCP-Reno-inspired congestion-window estimator so that neither
//! stage overruns the other or the downstream sink.
//!
//! # Quick Start
//!
//! ```rust
//! use circulator::config::{CirculatorConfig, RunnerConfig};
//! use circulator::error::DropErrorHandler;
//! use circulator::lifecycle::RunnerResourceFactory;
//! use circulator::runtime::CirculatorRuntime;
//! use circulator::sink::SinkTask;
//! use circulator::transform::{IdentityTransform, TransformEngine};
//! use circulator::util::RunnerName;
//! use std::sync::Arc;
//!
//! # #[derive(Default)]
//! # struct NoopSink;
//! # #[async_trait::async_trait]
//! # impl SinkTask for NoopSink {
//! #     async fn put(&self, _records: &[circulator::record::ConnectRecord]) -> Result<(), circulator::error::BoxError> {
//! #         Ok(())
//! #     }
//! # }
//! # #[derive(Default)]
//! # struct NoopOffsetManager;
//! # #[async_trait::async_trait]
//! # impl circulator::offset::OffsetManager for NoopOffsetManager {
//! #     async fn commit(&self, _record: &circulator::record::ConnectRecord) {}
//! # }
//! struct Factory;
//! impl RunnerResourceFactory for Factory {
//!     fn transform_engine(&self, _runner: &RunnerName) -> Arc<dyn TransformEngine> {
//!         Arc::new(IdentityTransform)
//!     }
//!     fn sink(&self, _runner: &RunnerName) -> Arc<dyn SinkTask> {
//!         Arc::new(NoopSink)
//!     }
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let runtime = CirculatorRuntime::new(
//!     CirculatorConfig::default(),
//!     Arc::new(Factory),
//!     Arc::new(NoopOffsetManager),
//!     Arc::new(DropErrorHandler),
//! );
//! runtime.add_runner(RunnerConfig::with_defaults(RunnerName::new("r1"))).await;
//! # }
//! ```
//!
//! # Module Organization
//!
//! ## Core pipeline
//! - [`record`] — `ConnectRecord`, the value transported end to end
//! - [`metrics`] — `RunnerMetrics`, `EstimateMetrics`, `Stage`
//! - [`estimator`] — the Rate Estimator (C1): pure congestion-window math
//! - [`queue`] — bounded per-runner event/target queues
//! - [`transform`] — `TransformEngine`, `TransformOutcome`
//! - [`sink`] — `SinkTask`
//! - [`offset`] — `OffsetManager`
//! - [`error`] — the failure taxonomy and `ErrorHandler`
//!
//! ## Orchestration
//! - [`context`] — the Circulator Context (C2): the per-runner broker
//! - [`executor`] — the bounded push-stage task pool
//! - [`worker`] — the Transform Worker (C5) and Push Worker (C6) loops
//! - [`lifecycle`] — the Lifecycle Manager (C7)
//! - [`config`] — `CirculatorConfig`, `RunnerConfig`
//! - [`runtime`] — `CirculatorRuntime`, the top-level assembly
//!
//! ## Infrastructure
//! - [`util`] — `RunnerName`
//!
//! # Non-goals
//!
//! Exactly-once delivery; cross-runner fairness beyond what the estimator
//! provides; durable queues (staging is process-local); dynamic reloading
//! of transform logic inside a running batch.
//!
//! This crate does not configure a global `tracing` subscriber — install
//! one (e.g. `tracing-subscriber`) in the binary that embeds it.

pub mod config;
pub mod context;
pub mod error;
pub mod estimator;
pub mod executor;
pub mod lifecycle;
pub mod metrics;
pub mod offset;
pub mod queue;
pub mod record;
pub mod runtime;
pub mod sink;
pub mod transform;
pub mod util;
pub mod worker;

pub mod prelude;

pub use config::{CirculatorConfig, RunnerConfig};
pub use context::CirculatorContext;
pub use error::{DropErrorHandler, ErrorHandler, RunnerError};
pub use estimator::RateEstimator;
pub use lifecycle::{LifecycleManager, RunnerEvent, RunnerResourceFactory};
pub use metrics::{EstimateMetrics, RunnerMetrics, Stage};
pub use offset::OffsetManager;
pub use record::ConnectRecord;
pub use runtime::CirculatorRuntime;
pub use sink::SinkTask;
pub use transform::{IdentityTransform, TransformEngine, TransformOutcome};
pub use util::RunnerName;
