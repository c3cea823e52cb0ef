//! Adapter implementations for the task lifecycle ports.
//!
//! - [`memory`] holds deterministic in-process adapters for every port.
//! - [`BroadcastEventSink`] fans event batches out to async subscribers.
//! - [`ChannelPersistQueue`] and [`PersistWorker`] move record writes off the
//!   mutation path.
//! - [`FsTaskRecordStore`] keeps one JSON record per task in a directory.

pub mod memory;

mod broadcast;
mod fs;
mod persister;

pub use broadcast::BroadcastEventSink;
pub use fs::FsTaskRecordStore;
pub use persister::{ChannelPersistQueue, PersistWorker, PersistWorkerReport, persist_channel};
