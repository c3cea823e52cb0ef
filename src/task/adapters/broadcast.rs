//! Event sink fanning batches out over a tokio broadcast channel.

use crate::task::{
    domain::TaskEvent,
    ports::{EventDeliveryError, TaskEventSink},
};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Publishes each batch to every current subscriber.
///
/// Slow subscribers lag and lose the oldest batches; the lifecycle service is
/// never blocked by them.
#[derive(Debug, Clone)]
pub struct BroadcastEventSink {
    sender: broadcast::Sender<Arc<[TaskEvent]>>,
}

impl BroadcastEventSink {
    /// Creates a sink retaining up to `capacity` undelivered batches.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Subscribes to batches published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<[TaskEvent]>> {
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl TaskEventSink for BroadcastEventSink {
    fn publish(&self, events: &[TaskEvent]) -> Result<(), EventDeliveryError> {
        self.sender
            .send(Arc::from(events))
            .map(|_| ())
            .map_err(|_| EventDeliveryError("no subscribers".to_owned()))
    }
}
