//! Activity entries held by a task.
//!
//! The task core only looks at a handful of activity properties: whether the
//! entry is finishing, whether it is a task overlay, the orientation it
//! requests and whether it may be persisted. Everything else is carried so
//! that the task can derive its own identity from its root.

use super::{
    ActivityId, ActivityType, ComponentName, DocumentLaunchMode, Intent, IntentFlags, LaunchMode,
    LockTaskLaunchMode, PersistableMode, ResizeMode, Uid, UserId,
};
use crate::container::ConfigurationChange;
use crate::geometry::Orientation;
use serde::{Deserialize, Serialize};

/// Static metadata declared by an activity's package.
#[expect(
    clippy::struct_excessive_bools,
    reason = "manifest flags are independent switches"
)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityInfo {
    /// The declared component.
    pub component: ComponentName,
    /// Uid of the owning application.
    pub uid: Uid,
    /// Class this alias forwards to, when the activity is an alias.
    pub target_activity: Option<String>,
    /// Declared task affinity.
    pub task_affinity: Option<String>,
    /// Lets the next activity up supply the task identity.
    pub relinquish_task_identity: bool,
    /// Removes the task from recents once its last activity finishes.
    pub auto_remove_from_recents: bool,
    /// Visible to every user on the device.
    pub show_for_all_users: bool,
    /// Declared resize policy.
    pub resize_mode: ResizeMode,
    /// Whether the activity can enter picture-in-picture.
    pub supports_picture_in_picture: bool,
    /// Declared persistence policy.
    pub persistable_mode: PersistableMode,
    /// Declared document behaviour.
    pub document_launch_mode: DocumentLaunchMode,
    /// Declared launch mode.
    pub launch_mode: LaunchMode,
    /// Declared lock-task behaviour.
    pub lock_task_launch_mode: LockTaskLaunchMode,
    /// Declared recents limit for the task. Clamped by the task.
    pub max_recents: u32,
    /// Declared minimum width in pixels.
    pub min_width: Option<i32>,
    /// Declared minimum height in pixels.
    pub min_height: Option<i32>,
    /// Declared screen orientation.
    pub screen_orientation: Orientation,
}

impl ActivityInfo {
    /// Creates metadata with platform defaults for `component`.
    #[must_use]
    pub const fn new(component: ComponentName, uid: Uid) -> Self {
        Self {
            component,
            uid,
            target_activity: None,
            task_affinity: None,
            relinquish_task_identity: false,
            auto_remove_from_recents: false,
            show_for_all_users: false,
            resize_mode: ResizeMode::Resizeable,
            supports_picture_in_picture: false,
            persistable_mode: PersistableMode::RootOnly,
            document_launch_mode: DocumentLaunchMode::None,
            launch_mode: LaunchMode::Multiple,
            lock_task_launch_mode: LockTaskLaunchMode::Default,
            max_recents: 16,
            min_width: None,
            min_height: None,
            screen_orientation: Orientation::Undefined,
        }
    }

    /// Component an alias resolves to, or `None` for a regular activity.
    #[must_use]
    pub fn target_component(&self) -> Option<ComponentName> {
        let target = self.target_activity.as_deref()?;
        ComponentName::new(self.component.package(), target).ok()
    }
}

/// Lifecycle state of an activity as reported by its host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityState {
    /// Created but never started.
    #[default]
    Initializing,
    /// In the foreground and interactive.
    Resumed,
    /// Pause requested.
    Pausing,
    /// Paused.
    Paused,
    /// Stopped.
    Stopped,
    /// Being destroyed by its process.
    Destroying,
    /// Destroyed.
    Destroyed,
}

/// Presentation metadata an activity publishes for its task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskDescription {
    /// Label shown in recents.
    pub label: Option<String>,
    /// File name of the saved icon.
    pub icon_filename: Option<String>,
    /// Primary colour, zero when unset.
    pub primary_color: u32,
    /// Background colour, zero when unset.
    pub background_color: u32,
}

impl TaskDescription {
    /// Returns `true` when nothing is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.label.is_none()
            && self.icon_filename.is_none()
            && self.primary_color == 0
            && self.background_color == 0
    }
}

/// One activity in a task's history.
#[expect(
    clippy::struct_excessive_bools,
    reason = "host-reported activity flags are independent"
)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityRecord {
    id: ActivityId,
    info: ActivityInfo,
    intent: Intent,
    activity_type: ActivityType,
    launched_from_uid: Uid,
    launched_from_package: Option<String>,
    user_id: UserId,
    component_specified: bool,
    state: ActivityState,
    finishing: bool,
    task_overlay: bool,
    requested_orientation: Orientation,
    has_process: bool,
    windows_alive: bool,
    visible: bool,
    handles_size_changes: bool,
    relaunch_count: u32,
    task_description: Option<TaskDescription>,
}

/// Parameter object for a freshly launched activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityLaunch {
    /// Resolved metadata.
    pub info: ActivityInfo,
    /// Launch intent.
    pub intent: Intent,
    /// Uid of the caller.
    pub launched_from_uid: Uid,
    /// Package of the caller.
    pub launched_from_package: Option<String>,
    /// User the activity runs as.
    pub user_id: UserId,
    /// Activity type requested by the launcher.
    pub activity_type: ActivityType,
}

impl ActivityLaunch {
    /// Launch of `info` with `intent` on behalf of the system user.
    #[must_use]
    pub const fn new(info: ActivityInfo, intent: Intent) -> Self {
        Self {
            info,
            intent,
            launched_from_uid: Uid::UNKNOWN,
            launched_from_package: None,
            user_id: UserId::SYSTEM,
            activity_type: ActivityType::Undefined,
        }
    }
}

/// Parameter object for reconstructing a persisted activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedActivityData {
    /// Persisted identifier.
    pub id: ActivityId,
    /// Persisted launch intent.
    pub intent: Intent,
    /// Persisted caller uid.
    pub launched_from_uid: Uid,
    /// Persisted caller package.
    pub launched_from_package: Option<String>,
    /// Persisted user.
    pub user_id: UserId,
    /// Whether the launch named its component explicitly.
    pub component_specified: bool,
    /// Persisted task description.
    pub task_description: Option<TaskDescription>,
}

impl ActivityRecord {
    /// Creates a newly launched activity.
    #[must_use]
    pub fn launch(launch: ActivityLaunch) -> Self {
        let component_specified = launch.intent.component().is_some();
        let requested_orientation = launch.info.screen_orientation;
        Self {
            id: ActivityId::new(),
            info: launch.info,
            intent: launch.intent,
            activity_type: launch.activity_type,
            launched_from_uid: launch.launched_from_uid,
            launched_from_package: launch.launched_from_package,
            user_id: launch.user_id,
            component_specified,
            state: ActivityState::Initializing,
            finishing: false,
            task_overlay: false,
            requested_orientation,
            has_process: false,
            windows_alive: false,
            visible: false,
            handles_size_changes: false,
            relaunch_count: 0,
            task_description: None,
        }
    }

    /// Reconstructs an activity from persisted storage. `info` is resolved
    /// from the persisted intent by the caller.
    #[must_use]
    pub fn from_persisted(data: PersistedActivityData, info: ActivityInfo) -> Self {
        let requested_orientation = info.screen_orientation;
        Self {
            id: data.id,
            info,
            intent: data.intent,
            activity_type: ActivityType::Undefined,
            launched_from_uid: data.launched_from_uid,
            launched_from_package: data.launched_from_package,
            user_id: data.user_id,
            component_specified: data.component_specified,
            state: ActivityState::Initializing,
            finishing: false,
            task_overlay: false,
            requested_orientation,
            has_process: false,
            windows_alive: false,
            visible: false,
            handles_size_changes: false,
            relaunch_count: 0,
            task_description: data.task_description,
        }
    }

    /// Captures the persisted form of this activity.
    #[must_use]
    pub fn to_persisted(&self) -> PersistedActivityData {
        PersistedActivityData {
            id: self.id,
            intent: self.intent.clone(),
            launched_from_uid: self.launched_from_uid,
            launched_from_package: self.launched_from_package.clone(),
            user_id: self.user_id,
            component_specified: self.component_specified,
            task_description: self.task_description.clone(),
        }
    }

    /// Returns the activity identifier.
    #[must_use]
    pub const fn id(&self) -> ActivityId {
        self.id
    }

    /// Returns the declared metadata.
    #[must_use]
    pub const fn info(&self) -> &ActivityInfo {
        &self.info
    }

    /// Returns the component that was launched.
    #[must_use]
    pub const fn component(&self) -> &ComponentName {
        &self.info.component
    }

    /// Returns the launch intent.
    #[must_use]
    pub const fn intent(&self) -> &Intent {
        &self.intent
    }

    /// Returns the activity type.
    #[must_use]
    pub const fn activity_type(&self) -> ActivityType {
        self.activity_type
    }

    /// Coerces the activity type.
    pub const fn set_activity_type(&mut self, activity_type: ActivityType) {
        self.activity_type = activity_type;
    }

    /// Returns the caller uid.
    #[must_use]
    pub const fn launched_from_uid(&self) -> Uid {
        self.launched_from_uid
    }

    /// Returns the caller package.
    #[must_use]
    pub fn launched_from_package(&self) -> Option<&str> {
        self.launched_from_package.as_deref()
    }

    /// Returns the user the activity runs as.
    #[must_use]
    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    /// Returns the host-reported lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ActivityState {
        self.state
    }

    /// Records a host-reported lifecycle state.
    pub const fn set_state(&mut self, state: ActivityState) {
        self.state = state;
    }

    /// Returns `true` once the activity has been asked to finish.
    #[must_use]
    pub const fn is_finishing(&self) -> bool {
        self.finishing
    }

    /// Marks the activity as finishing.
    pub const fn finish(&mut self) {
        self.finishing = true;
    }

    /// Returns `true` when the activity always sits above regular activities.
    #[must_use]
    pub const fn is_task_overlay(&self) -> bool {
        self.task_overlay
    }

    /// Marks the activity as a task overlay.
    #[must_use]
    pub const fn as_task_overlay(mut self) -> Self {
        self.task_overlay = true;
        self
    }

    /// Orientation the activity currently asks for.
    #[must_use]
    pub const fn requested_orientation(&self) -> Orientation {
        self.requested_orientation
    }

    /// Updates the requested orientation.
    pub const fn set_requested_orientation(&mut self, orientation: Orientation) {
        self.requested_orientation = orientation;
    }

    /// Whether the activity's process is running.
    #[must_use]
    pub const fn has_process(&self) -> bool {
        self.has_process
    }

    /// Records whether the activity's process is running.
    pub const fn set_has_process(&mut self, has_process: bool) {
        self.has_process = has_process;
    }

    /// Whether the activity still has window surfaces on screen.
    #[must_use]
    pub const fn has_windows_alive(&self) -> bool {
        self.windows_alive
    }

    /// Records whether window surfaces remain.
    pub const fn set_windows_alive(&mut self, alive: bool) {
        self.windows_alive = alive;
    }

    /// Whether the activity is visible.
    #[must_use]
    pub const fn is_visible(&self) -> bool {
        self.visible
    }

    /// Records visibility.
    pub const fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Declares that the activity handles size changes itself.
    #[must_use]
    pub const fn handling_size_changes(mut self) -> Self {
        self.handles_size_changes = true;
        self
    }

    /// Number of destructive reconfigurations so far.
    #[must_use]
    pub const fn relaunch_count(&self) -> u32 {
        self.relaunch_count
    }

    /// Presentation metadata published by the activity.
    #[must_use]
    pub const fn task_description(&self) -> Option<&TaskDescription> {
        self.task_description.as_ref()
    }

    /// Publishes presentation metadata.
    pub fn set_task_description(&mut self, description: Option<TaskDescription>) {
        self.task_description = description;
    }

    /// Whether this activity may be written to persisted recents.
    #[must_use]
    pub const fn is_persistable(&self) -> bool {
        matches!(
            self.info.persistable_mode,
            PersistableMode::RootOnly | PersistableMode::AcrossReboots
        ) && !self
            .intent
            .flags()
            .contains(IntentFlags::EXCLUDE_FROM_RECENTS)
    }

    /// Applies a configuration change.
    ///
    /// Returns `false` when the activity had to be relaunched because it
    /// does not handle the size change itself. Invisible activities pick up
    /// the change when they next become visible.
    pub const fn ensure_configuration(&mut self, change: ConfigurationChange) -> bool {
        if !change.changed || !self.visible || self.finishing {
            return true;
        }
        if change.size_changed && !self.handles_size_changes {
            self.relaunch_count = self.relaunch_count.saturating_add(1);
            return false;
        }
        true
    }
}
