//! Persistence codec for tasks.
//!
//! A task is written as one [`RecordElement`]: flat string attributes for
//! every primitive field plus nested elements for the root and affinity
//! intents and each retained activity. Records carry a schema version;
//! [`upgrader`] migrates older records before they are decoded.

mod codec;
mod error;
mod record;
pub mod upgrader;

pub use codec::{TASK_TAG, TaskRecordCodec};
pub use error::{RecordCodecError, RecordUpgradeError};
pub use record::RecordElement;
pub use upgrader::{RecordUpgrader, TaskRecordUpgrader, UpgraderRegistry};
