//! Event sink that keeps every published batch.

use crate::task::{
    domain::TaskEvent,
    ports::{EventDeliveryError, TaskEventSink},
};
use std::sync::{Arc, RwLock};

/// Thread-safe event sink recording batches in delivery order.
#[derive(Debug, Clone, Default)]
pub struct RecordingEventSink {
    batches: Arc<RwLock<Vec<Vec<TaskEvent>>>>,
}

impl RecordingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every batch received so far.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<TaskEvent>> {
        self.batches
            .read()
            .map(|batches| batches.clone())
            .unwrap_or_default()
    }

    /// Every event received so far, flattened across batches.
    #[must_use]
    pub fn events(&self) -> Vec<TaskEvent> {
        self.batches().into_iter().flatten().collect()
    }

    /// Drops everything recorded so far.
    pub fn clear(&self) {
        if let Ok(mut batches) = self.batches.write() {
            batches.clear();
        }
    }
}

impl TaskEventSink for RecordingEventSink {
    fn publish(&self, events: &[TaskEvent]) -> Result<(), EventDeliveryError> {
        let mut batches = self
            .batches
            .write()
            .map_err(|err| EventDeliveryError(err.to_string()))?;
        batches.push(events.to_vec());
        Ok(())
    }
}
