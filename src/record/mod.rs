//! The event record transported through the transform/push pipeline.

mod connect_record;

pub use connect_record::ConnectRecord;
