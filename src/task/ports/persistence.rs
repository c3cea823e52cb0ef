//! Persistence ports: the non-blocking queue used on the mutation path and
//! the asynchronous record store it drains into.

use crate::task::domain::TaskId;
use crate::task::persistence::RecordElement;
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Work item for the persistence queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersistRequest {
    /// Write the record for a task, replacing any previous one.
    Save {
        /// Task the record belongs to.
        task: TaskId,
        /// Snapshot taken when the request was queued.
        record: RecordElement,
    },
    /// Delete the record for a task.
    Remove {
        /// Task whose record should go.
        task: TaskId,
    },
}

impl PersistRequest {
    /// Task the request concerns.
    #[must_use]
    pub const fn task(&self) -> TaskId {
        match self {
            Self::Save { task, .. } | Self::Remove { task } => *task,
        }
    }
}

/// Non-blocking persistence queue.
///
/// Enqueuing must return without waiting for storage; the mutation path
/// calls it while holding the hierarchy lock.
pub trait TaskPersistQueue: Send + Sync {
    /// Queues a request.
    ///
    /// # Errors
    ///
    /// Returns [`PersistQueueError`] when the queue no longer accepts work.
    fn enqueue(&self, request: PersistRequest) -> Result<(), PersistQueueError>;
}

/// Error returned when a persistence request could not be queued.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("persistence queue closed; dropped request for task {0}")]
pub struct PersistQueueError(pub TaskId);

/// Result type for record store operations.
pub type TaskRecordStoreResult<T> = Result<T, TaskRecordStoreError>;

/// Durable storage of task records, one record per task.
#[async_trait]
pub trait TaskRecordStore: Send + Sync {
    /// Writes the record for `task`, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRecordStoreError::Persistence`] when the write fails.
    async fn save(&self, task: TaskId, record: &RecordElement) -> TaskRecordStoreResult<()>;

    /// Reads the record for `task`.
    ///
    /// Returns `None` when no record exists.
    async fn load(&self, task: TaskId) -> TaskRecordStoreResult<Option<RecordElement>>;

    /// Reads every stored record, ordered by task identifier.
    async fn load_all(&self) -> TaskRecordStoreResult<Vec<(TaskId, RecordElement)>>;

    /// Deletes the record for `task`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRecordStoreError::NotFound`] when there is no record.
    async fn remove(&self, task: TaskId) -> TaskRecordStoreResult<()>;
}

/// Errors returned by record store implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRecordStoreError {
    /// No record exists for the task.
    #[error("task record not found: {0}")]
    NotFound(TaskId),

    /// A stored record could not be read back.
    #[error("corrupt task record {task}: {reason}")]
    Corrupt {
        /// Task the record belongs to.
        task: TaskId,
        /// Decoder message.
        reason: String,
    },

    /// Storage-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRecordStoreError {
    /// Wraps a storage error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
