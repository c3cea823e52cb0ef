//! Persistence queue that records requests instead of writing them.

use crate::task::{
    domain::TaskId,
    ports::{PersistQueueError, PersistRequest, TaskPersistQueue},
};
use std::sync::{Arc, RwLock};

/// Thread-safe queue keeping every request in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingPersistQueue {
    requests: Arc<RwLock<Vec<PersistRequest>>>,
}

impl RecordingPersistQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests queued so far.
    #[must_use]
    pub fn requests(&self) -> Vec<PersistRequest> {
        self.requests
            .read()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Identifiers of tasks with a queued save, in order.
    #[must_use]
    pub fn saved_tasks(&self) -> Vec<TaskId> {
        self.requests()
            .iter()
            .filter(|request| matches!(request, PersistRequest::Save { .. }))
            .map(PersistRequest::task)
            .collect()
    }
}

impl TaskPersistQueue for RecordingPersistQueue {
    fn enqueue(&self, request: PersistRequest) -> Result<(), PersistQueueError> {
        let task = request.task();
        let mut requests = self.requests.write().map_err(|_| PersistQueueError(task))?;
        requests.push(request);
        Ok(())
    }
}
