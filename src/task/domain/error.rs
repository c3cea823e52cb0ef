//! Error types for task domain validation and parsing.

use super::{DisplayId, NodeKey, ResizeMode, StackId, TaskId, TaskLifecycleState};
use crate::container::ContainerError;
use crate::geometry::Rect;
use thiserror::Error;

/// Errors returned while constructing or mutating domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task identifier is not positive.
    #[error("invalid task id {0}, expected a positive integer")]
    InvalidTaskId(i32),

    /// The component name is not `package/class`.
    #[error("invalid component name '{0}', expected package/class")]
    InvalidComponentName(String),

    /// The requested bounds contradict the task's orientation lock.
    #[error("task {task} cannot be resized to {bounds} in resize mode {resize_mode}")]
    BoundsViolateOrientationLock {
        /// Task being resized.
        task: TaskId,
        /// Rejected bounds.
        bounds: Rect,
        /// Resize mode that rejected them.
        resize_mode: ResizeMode,
    },

    /// A non-resizeable task cannot be placed in a freeform stack.
    #[error("task {0} is not resizeable and cannot be placed in a freeform stack")]
    NotResizeable(TaskId),

    /// The lifecycle state machine does not permit the transition.
    #[error("task {task} cannot move from {from} to {to}")]
    InvalidTransition {
        /// Task whose state was changing.
        task: TaskId,
        /// Current state.
        from: TaskLifecycleState,
        /// Requested state.
        to: TaskLifecycleState,
    },

    /// A task cannot be destroyed while it holds activities.
    #[error("task {0} still holds activities")]
    TaskNotEmpty(TaskId),

    /// The task is not in the hierarchy.
    #[error("unknown task {0}")]
    UnknownTask(TaskId),

    /// The stack is not in the hierarchy.
    #[error("unknown {0}")]
    UnknownStack(StackId),

    /// The display is not in the hierarchy.
    #[error("unknown {0}")]
    UnknownDisplay(DisplayId),

    /// The hierarchy topology rejected the change.
    #[error(transparent)]
    Hierarchy(#[from] ContainerError<NodeKey>),
}

/// Error returned while parsing task lifecycle states.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task lifecycle state: {0}")]
pub struct ParseTaskLifecycleStateError(pub String);

/// Error returned while parsing a policy enumeration from persisted text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown {kind}: {value}")]
pub struct ParsePolicyValueError {
    /// Which enumeration was being parsed.
    pub kind: &'static str,
    /// The rejected text.
    pub value: String,
}

impl ParsePolicyValueError {
    /// Creates a parse error for `kind`.
    #[must_use]
    pub fn new(kind: &'static str, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }
}
