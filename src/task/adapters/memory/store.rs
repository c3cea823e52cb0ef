//! In-memory record store for lifecycle and persister tests.

use crate::task::{
    domain::TaskId,
    persistence::RecordElement,
    ports::{TaskRecordStore, TaskRecordStoreError, TaskRecordStoreResult},
};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

/// Thread-safe in-memory record store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRecordStore {
    records: Arc<RwLock<BTreeMap<TaskId, RecordElement>>>,
}

impl InMemoryTaskRecordStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskRecordStore for InMemoryTaskRecordStore {
    async fn save(&self, task: TaskId, record: &RecordElement) -> TaskRecordStoreResult<()> {
        let mut records = self.records.write().map_err(|err| {
            TaskRecordStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        records.insert(task, record.clone());
        Ok(())
    }

    async fn load(&self, task: TaskId) -> TaskRecordStoreResult<Option<RecordElement>> {
        let records = self.records.read().map_err(|err| {
            TaskRecordStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(records.get(&task).cloned())
    }

    async fn load_all(&self) -> TaskRecordStoreResult<Vec<(TaskId, RecordElement)>> {
        let records = self.records.read().map_err(|err| {
            TaskRecordStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        Ok(records
            .iter()
            .map(|(task, record)| (*task, record.clone()))
            .collect())
    }

    async fn remove(&self, task: TaskId) -> TaskRecordStoreResult<()> {
        let mut records = self.records.write().map_err(|err| {
            TaskRecordStoreError::persistence(std::io::Error::other(err.to_string()))
        })?;
        records
            .remove(&task)
            .map(|_| ())
            .ok_or(TaskRecordStoreError::NotFound(task))
    }
}
