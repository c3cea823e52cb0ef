//! Task lifecycle state machine.

use super::ParseTaskLifecycleStateError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of a task within the window hierarchy.
///
/// ```text
/// Unattached -> Attached -> (Resizing | Reparenting)* -> PendingRemoval -> Removed
/// ```
///
/// `PendingRemoval` returns to `Attached` when a child is added back or the
/// task is moved before its surfaces are gone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskLifecycleState {
    /// Created or restored but not placed in a stack.
    #[default]
    Unattached,
    /// Owned by a stack.
    Attached,
    /// A resize is being applied.
    Resizing,
    /// The task is moving between stacks.
    Reparenting,
    /// Emptied, waiting for surfaces and transitions to finish.
    PendingRemoval,
    /// Gone from the hierarchy.
    Removed,
}

impl TaskLifecycleState {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unattached => "unattached",
            Self::Attached => "attached",
            Self::Resizing => "resizing",
            Self::Reparenting => "reparenting",
            Self::PendingRemoval => "pending_removal",
            Self::Removed => "removed",
        }
    }

    /// Returns `true` once the task has left the hierarchy for good.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Removed)
    }

    /// Returns `true` while the task is placed in a stack.
    #[must_use]
    pub const fn is_attached(self) -> bool {
        matches!(
            self,
            Self::Attached | Self::Resizing | Self::Reparenting | Self::PendingRemoval
        )
    }

    /// Whether the state machine permits moving to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::Unattached, Self::Attached | Self::Removed)
                | (
                    Self::Attached,
                    Self::Resizing | Self::Reparenting | Self::PendingRemoval | Self::Removed
                )
                | (Self::Resizing | Self::Reparenting, Self::Attached)
                | (Self::PendingRemoval, Self::Attached | Self::Removed)
        )
    }
}

impl fmt::Display for TaskLifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskLifecycleState {
    type Error = ParseTaskLifecycleStateError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "unattached" => Ok(Self::Unattached),
            "attached" => Ok(Self::Attached),
            "resizing" => Ok(Self::Resizing),
            "reparenting" => Ok(Self::Reparenting),
            "pending_removal" => Ok(Self::PendingRemoval),
            "removed" => Ok(Self::Removed),
            _ => Err(ParseTaskLifecycleStateError(value.to_owned())),
        }
    }
}
