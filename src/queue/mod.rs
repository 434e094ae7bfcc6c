//! Bounded, single-consumer per-runner queues: the `eventQueue` and
//! `targetQueue` halves of each runner's resource bundle.

mod bounded;

pub use bounded::BoundedRecordQueue;
