//! The Transform Worker (C5) and Push Worker (C6): the two long-running,
//! per-runner loops that actually move records through the pipeline.

mod push_worker;
mod shutdown;
mod transform_worker;

pub use push_worker::PushWorker;
pub use shutdown::ShutdownHandle;
pub use transform_worker::TransformWorker;
