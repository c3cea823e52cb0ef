//! Stacks and displays: the containers above tasks.

use super::{ActivityId, ActivityType, DisplayId, StackId, TaskId};
use crate::container::ConfigurationContainer;
use crate::geometry::{Configuration, Rect, Rotation, WindowingMode};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key of any node in the window hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum NodeKey {
    /// A display.
    Display(DisplayId),
    /// A stack.
    Stack(StackId),
    /// A task.
    Task(TaskId),
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Display(id) => write!(f, "{id}"),
            Self::Stack(id) => write!(f, "{id}"),
            Self::Task(id) => write!(f, "task#{id}"),
        }
    }
}

/// An activity inside a specific task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ActivityRef {
    /// Owning task.
    pub task: TaskId,
    /// The activity.
    pub activity: ActivityId,
}

/// A grouping of tasks sharing a windowing mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stack {
    id: StackId,
    display: DisplayId,
    activity_type: ActivityType,
    config: ConfigurationContainer,
    resumed: Option<ActivityRef>,
}

impl Stack {
    /// Creates a stack on `display`.
    #[must_use]
    pub fn new(
        id: StackId,
        display: DisplayId,
        windowing_mode: WindowingMode,
        activity_type: ActivityType,
    ) -> Self {
        let mut config = ConfigurationContainer::new();
        config.set_requested_windowing_mode(windowing_mode);
        Self {
            id,
            display,
            activity_type,
            config,
            resumed: None,
        }
    }

    /// Returns the stack identifier.
    #[must_use]
    pub const fn id(&self) -> StackId {
        self.id
    }

    /// Returns the display hosting the stack.
    #[must_use]
    pub const fn display(&self) -> DisplayId {
        self.display
    }

    /// Returns the activity type the stack hosts.
    #[must_use]
    pub const fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    /// Configuration layers of the stack.
    #[must_use]
    pub const fn configuration(&self) -> &ConfigurationContainer {
        &self.config
    }

    /// Configuration layers of the stack, for mutation.
    pub const fn configuration_mut(&mut self) -> &mut ConfigurationContainer {
        &mut self.config
    }

    /// Effective windowing mode.
    #[must_use]
    pub const fn windowing_mode(&self) -> WindowingMode {
        self.config.windowing_mode()
    }

    /// Resolved bounds.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.config.bounds()
    }

    /// Requested bounds.
    #[must_use]
    pub const fn requested_bounds(&self) -> Rect {
        self.config.requested_bounds()
    }

    /// The resumed activity, if any.
    #[must_use]
    pub const fn resumed(&self) -> Option<ActivityRef> {
        self.resumed
    }

    /// Records the resumed activity.
    pub const fn set_resumed(&mut self, resumed: Option<ActivityRef>) {
        self.resumed = resumed;
    }
}

/// A physical or virtual display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayNode {
    id: DisplayId,
    rotation: Rotation,
    config: ConfigurationContainer,
}

impl DisplayNode {
    /// Creates a display whose full configuration is `config`.
    #[must_use]
    pub fn new(id: DisplayId, config: Configuration) -> Self {
        let mut container = ConfigurationContainer::new();
        container.set_requested_override(config);
        let _change = container.apply_resolved(&Configuration::EMPTY, config);
        Self {
            id,
            rotation: config.rotation.unwrap_or_default(),
            config: container,
        }
    }

    /// Returns the display identifier.
    #[must_use]
    pub const fn id(&self) -> DisplayId {
        self.id
    }

    /// Current rotation.
    #[must_use]
    pub const fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Full configuration of the display.
    #[must_use]
    pub const fn configuration(&self) -> &Configuration {
        self.config.full_configuration()
    }

    /// Replaces the display configuration, returning the previous rotation.
    pub fn update(&mut self, config: Configuration) -> Rotation {
        let previous = self.rotation;
        self.config.set_requested_override(config);
        let _change = self.config.apply_resolved(&Configuration::EMPTY, config);
        self.rotation = config.rotation.unwrap_or(previous);
        previous
    }
}
