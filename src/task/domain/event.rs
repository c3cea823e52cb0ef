//! Events emitted to the rendering and recents collaborators.

use super::{ActivityId, ComponentName, StackId, TaskId};
use crate::geometry::Rect;
use serde::Serialize;

/// A change in the window hierarchy that collaborators may react to.
///
/// Events are buffered while layout is deferred and published as one batch
/// when the outermost deferral closes; a batch corresponds to one surface
/// transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TaskEvent {
    /// A task was created.
    TaskCreated {
        /// The new task.
        task: TaskId,
        /// Component at its root.
        real_activity: Option<ComponentName>,
    },
    /// A task was removed from the hierarchy.
    TaskRemoved {
        /// The removed task.
        task: TaskId,
    },
    /// A task's resolved bounds changed.
    TaskBoundsChanged {
        /// The task.
        task: TaskId,
        /// New bounds; empty means the task fills its parent.
        bounds: Rect,
    },
    /// A task moved between stacks.
    TaskMovedToStack {
        /// The task.
        task: TaskId,
        /// Previous stack.
        from: Option<StackId>,
        /// New stack.
        to: StackId,
    },
    /// A stack became the front-most stack of its display.
    StackMovedToFront {
        /// The stack.
        stack: StackId,
    },
    /// An activity was asked to pause.
    ActivityPauseRequested {
        /// Owning task.
        task: TaskId,
        /// The activity.
        activity: ActivityId,
    },
    /// An activity was asked to finish.
    ActivityFinishRequested {
        /// Owning task.
        task: TaskId,
        /// The activity.
        activity: ActivityId,
    },
    /// An activity was recreated to apply a configuration change.
    ActivityRelaunched {
        /// Owning task.
        task: TaskId,
        /// The activity.
        activity: ActivityId,
    },
    /// A task entered or left a multi-window mode.
    MultiWindowModeChanged {
        /// The task.
        task: TaskId,
        /// Whether the task is now in a multi-window mode.
        multi_window: bool,
    },
    /// A task left the pinned stack.
    PictureInPictureUnpinned {
        /// The task.
        task: TaskId,
    },
    /// The set of tasks or their order changed.
    TaskStackChanged,
    /// A task's snapshot should be refreshed.
    TaskSnapshotChanged {
        /// The task.
        task: TaskId,
    },
    /// A task's snapshot should be discarded.
    TaskSnapshotRemoved {
        /// The task.
        task: TaskId,
    },
    /// The supervisor should remove the task.
    RemoveTaskRequested {
        /// The task.
        task: TaskId,
    },
    /// A layout pass is needed.
    LayoutRequested,
}

impl TaskEvent {
    /// Task the event concerns, if any.
    #[must_use]
    pub const fn task(&self) -> Option<TaskId> {
        match self {
            Self::TaskCreated { task, .. }
            | Self::TaskRemoved { task }
            | Self::TaskBoundsChanged { task, .. }
            | Self::TaskMovedToStack { task, .. }
            | Self::ActivityPauseRequested { task, .. }
            | Self::ActivityFinishRequested { task, .. }
            | Self::ActivityRelaunched { task, .. }
            | Self::MultiWindowModeChanged { task, .. }
            | Self::PictureInPictureUnpinned { task }
            | Self::TaskSnapshotChanged { task }
            | Self::TaskSnapshotRemoved { task }
            | Self::RemoveTaskRequested { task } => Some(*task),
            Self::StackMovedToFront { .. } | Self::TaskStackChanged | Self::LayoutRequested => None,
        }
    }
}
