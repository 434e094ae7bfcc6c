//! The Runner Lifecycle Manager (C7): reacts to add/update/delete runner
//! notifications by spawning, replacing, and stopping per-runner workers.
//!
//! Two independent managers exist in a running system, one per stage —
//! see [`crate::runtime::CirculatorRuntime`] for how they are wired
//! together — but they share this same implementation, parameterized by a
//! [`WorkerSpawner`] that knows which kind of worker to start.

mod event;
mod manager;
mod resources;
mod spawner;

pub use event::RunnerEvent;
pub use manager::LifecycleManager;
pub use resources::RunnerResourceFactory;
pub use spawner::{PushWorkerSpawner, TransformWorkerSpawner, WorkerSpawner};
