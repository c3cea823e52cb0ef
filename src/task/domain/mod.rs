//! Domain model for tasks and the window hierarchy around them.
//!
//! The domain covers task identity and intent-derived metadata, the ordered
//! activity history, geometry bookkeeping, the affiliation chain and the
//! lifecycle state machine. Collaborators such as the compositor, the
//! recents supervisor and durable storage stay outside this boundary.

mod activity;
pub mod affiliation;
mod error;
mod event;
mod hierarchy;
mod ids;
mod intent;
mod policy;
mod stack;
mod state;
mod task;

pub use activity::{
    ActivityInfo, ActivityLaunch, ActivityRecord, ActivityState, PersistedActivityData,
    TaskDescription,
};
pub use affiliation::{AffiliationLink, AffiliationRepair};
pub use error::{ParsePolicyValueError, ParseTaskLifecycleStateError, TaskDomainError};
pub use event::TaskEvent;
pub use hierarchy::WindowHierarchy;
pub use ids::{ActivityId, DisplayId, ProcessId, StackId, TaskId, Uid, UserId};
pub use intent::{ComponentName, Intent, IntentFlags};
pub use policy::{
    ActivityType, DocumentLaunchMode, LaunchMode, LockTaskAuth, LockTaskLaunchMode,
    PersistableMode, ResizeMode,
};
pub use stack::{ActivityRef, DisplayNode, NodeKey, Stack};
pub use state::TaskLifecycleState;
pub use task::{
    ChildRemoval, ClearOutcome, PersistedTaskData, RunningActivityReport, Task, TaskLaunch,
};
