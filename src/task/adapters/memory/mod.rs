//! In-memory adapters for lifecycle tests and local orchestration.

mod environment;
mod events;
mod queue;
mod resolver;
mod store;

pub use environment::{RecordingVoiceInteraction, StaticDisplayEnvironment, StaticRecentsPolicy};
pub use events::RecordingEventSink;
pub use queue::RecordingPersistQueue;
pub use resolver::StaticPackageResolver;
pub use store::InMemoryTaskRecordStore;
