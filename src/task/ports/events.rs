//! Outbound event port consumed by the rendering and recents collaborators.

use crate::task::domain::TaskEvent;
use thiserror::Error;

/// Receives batches of task events once a layout scope closes.
///
/// A batch is delivered in emission order. Delivery failures are reported to
/// the caller, which logs them; they never undo the mutation that produced
/// the events.
pub trait TaskEventSink: Send + Sync {
    /// Delivers one batch.
    ///
    /// # Errors
    ///
    /// Returns [`EventDeliveryError`] when no subscriber could take the batch.
    fn publish(&self, events: &[TaskEvent]) -> Result<(), EventDeliveryError>;
}

/// Error returned when an event batch could not be delivered.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("event delivery failed: {0}")]
pub struct EventDeliveryError(pub String);
