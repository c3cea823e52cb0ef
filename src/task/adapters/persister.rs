//! Asynchronous persistence: a channel-backed queue and the worker that
//! drains it into a record store.

use crate::task::{
    domain::TaskId,
    ports::{
        PersistQueueError, PersistRequest, TaskPersistQueue, TaskRecordStore,
        TaskRecordStoreError,
    },
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Creates a connected queue and worker.
#[must_use]
pub fn persist_channel() -> (ChannelPersistQueue, PersistWorker) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (ChannelPersistQueue { sender }, PersistWorker { receiver })
}

/// Queue half: enqueuing never waits.
#[derive(Debug, Clone)]
pub struct ChannelPersistQueue {
    sender: mpsc::UnboundedSender<PersistRequest>,
}

impl TaskPersistQueue for ChannelPersistQueue {
    fn enqueue(&self, request: PersistRequest) -> Result<(), PersistQueueError> {
        let task = request.task();
        self.sender
            .send(request)
            .map_err(|_| PersistQueueError(task))
    }
}

/// Counters reported when the worker stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistWorkerReport {
    /// Records written.
    pub saved: usize,
    /// Records deleted.
    pub removed: usize,
    /// Requests superseded by a later request for the same task.
    pub coalesced: usize,
    /// Requests the store rejected.
    pub failed: usize,
}

/// Worker half: applies requests until every queue handle is dropped.
#[derive(Debug)]
pub struct PersistWorker {
    receiver: mpsc::UnboundedReceiver<PersistRequest>,
}

impl PersistWorker {
    /// Drains the queue into `store`.
    ///
    /// Requests that are already waiting when a batch starts are coalesced so
    /// only the newest request per task reaches the store.
    pub async fn run<S>(mut self, store: &S) -> PersistWorkerReport
    where
        S: TaskRecordStore + ?Sized,
    {
        let mut report = PersistWorkerReport::default();
        while let Some(first) = self.receiver.recv().await {
            let mut batch: BTreeMap<TaskId, PersistRequest> = BTreeMap::new();
            batch.insert(first.task(), first);
            while let Ok(next) = self.receiver.try_recv() {
                if batch.insert(next.task(), next).is_some() {
                    report.coalesced += 1;
                }
            }
            for request in batch.into_values() {
                apply(store, request, &mut report).await;
            }
        }
        debug!(?report, "persistence worker stopped");
        report
    }

    /// Runs the worker on the tokio runtime.
    pub fn spawn<S>(self, store: Arc<S>) -> JoinHandle<PersistWorkerReport>
    where
        S: TaskRecordStore + 'static,
    {
        tokio::spawn(async move { self.run(store.as_ref()).await })
    }
}

async fn apply<S>(store: &S, request: PersistRequest, report: &mut PersistWorkerReport)
where
    S: TaskRecordStore + ?Sized,
{
    match request {
        PersistRequest::Save { task, record } => match store.save(task, &record).await {
            Ok(()) => report.saved += 1,
            Err(err) => {
                warn!(%task, error = %err, "failed to write task record");
                report.failed += 1;
            }
        },
        PersistRequest::Remove { task } => match store.remove(task).await {
            Ok(()) => report.removed += 1,
            Err(TaskRecordStoreError::NotFound(_)) => {
                debug!(%task, "task record already gone");
                report.removed += 1;
            }
            Err(err) => {
                warn!(%task, error = %err, "failed to delete task record");
                report.failed += 1;
            }
        },
    }
}
