//! Port contracts for the task lifecycle manager.
//!
//! Ports describe the collaborators the lifecycle service talks to without
//! naming any concrete implementation: the rendering side that consumes
//! events and reports display state, the recents and package services, the
//! voice session owner and durable storage.

pub mod environment;
pub mod events;
pub mod persistence;
pub mod resolver;

pub use environment::{DisplayEnvironment, RecentsPolicy, VoiceInteraction, VoiceSessionError};
pub use events::{EventDeliveryError, TaskEventSink};
pub use persistence::{
    PersistQueueError, PersistRequest, TaskPersistQueue, TaskRecordStore, TaskRecordStoreError,
    TaskRecordStoreResult,
};
pub use resolver::PackageResolver;
