//! Read-only views of the display, recents and voice collaborators.

use crate::geometry::DisplayFrames;
use crate::task::domain::{DisplayId, Task, TaskId, UserId};
use thiserror::Error;

/// Display state owned by the rendering collaborator.
pub trait DisplayEnvironment: Send + Sync {
    /// Current frames of `display`, or `None` when it is not attached.
    fn frames(&self, display: DisplayId) -> Option<DisplayFrames>;

    /// Whether a window transition involving `task` is still running.
    fn is_animating(&self, task: TaskId) -> bool;

    /// Whether `display` accepts `task`.
    fn can_host_task(&self, display: DisplayId, task: &Task) -> bool;
}

/// Recents and lock-task policy owned by the supervisor.
pub trait RecentsPolicy: Send + Sync {
    /// Whether the profile of `user` is currently locked.
    fn is_profile_locked(&self, user: UserId) -> bool;

    /// Whether `package` may be locked to without user confirmation.
    fn is_lock_task_allowlisted(&self, user: UserId, package: &str) -> bool;
}

/// Voice interaction sessions that started tasks.
pub trait VoiceInteraction: Send + Sync {
    /// Tells the session owner that its task is gone.
    ///
    /// # Errors
    ///
    /// Returns [`VoiceSessionError`] when the session owner is unreachable.
    fn finish_session(&self, session: &str) -> Result<(), VoiceSessionError>;
}

/// Error returned by the voice session owner.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("voice session '{session}' unreachable: {reason}")]
pub struct VoiceSessionError {
    /// Session token.
    pub session: String,
    /// Failure description.
    pub reason: String,
}
