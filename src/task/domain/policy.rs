//! Policy enumerations attached to tasks and activities.

use super::ParsePolicyValueError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a task may be resized.
///
/// Each mode has a stable ordinal used by persisted records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResizeMode {
    /// Never resized.
    Unresizeable,
    /// Resizeable depending on the platform version the app targets.
    ResizeableViaSdkVersion,
    /// Freely resizeable.
    #[default]
    Resizeable,
    /// Legacy combined "resizeable and picture-in-picture" mode. Only appears
    /// in old records and is split on restore.
    ResizeableAndPipableDeprecated,
    /// Forced to be resizeable by the system.
    ForceResizeable,
    /// Forced resizeable, landscape bounds only.
    ForceResizableLandscapeOnly,
    /// Forced resizeable, portrait bounds only.
    ForceResizablePortraitOnly,
    /// Forced resizeable, keeping the current orientation.
    ForceResizablePreserveOrientation,
}

impl ResizeMode {
    /// Stable ordinal written to persisted records.
    #[must_use]
    pub const fn ordinal(self) -> i32 {
        match self {
            Self::Unresizeable => 0,
            Self::ResizeableViaSdkVersion => 1,
            Self::Resizeable => 2,
            Self::ResizeableAndPipableDeprecated => 3,
            Self::ForceResizeable => 4,
            Self::ForceResizableLandscapeOnly => 5,
            Self::ForceResizablePortraitOnly => 6,
            Self::ForceResizablePreserveOrientation => 7,
        }
    }

    /// Looks up a mode by its persisted ordinal.
    #[must_use]
    pub const fn from_ordinal(ordinal: i32) -> Option<Self> {
        match ordinal {
            0 => Some(Self::Unresizeable),
            1 => Some(Self::ResizeableViaSdkVersion),
            2 => Some(Self::Resizeable),
            3 => Some(Self::ResizeableAndPipableDeprecated),
            4 => Some(Self::ForceResizeable),
            5 => Some(Self::ForceResizableLandscapeOnly),
            6 => Some(Self::ForceResizablePortraitOnly),
            7 => Some(Self::ForceResizablePreserveOrientation),
            _ => None,
        }
    }

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unresizeable => "unresizeable",
            Self::ResizeableViaSdkVersion => "resizeable_via_sdk_version",
            Self::Resizeable => "resizeable",
            Self::ResizeableAndPipableDeprecated => "resizeable_and_pipable_deprecated",
            Self::ForceResizeable => "force_resizeable",
            Self::ForceResizableLandscapeOnly => "force_resizable_landscape_only",
            Self::ForceResizablePortraitOnly => "force_resizable_portrait_only",
            Self::ForceResizablePreserveOrientation => "force_resizable_preserve_orientation",
        }
    }

    /// Whether the mode on its own allows resizing.
    #[must_use]
    pub const fn is_resizeable_mode(self) -> bool {
        !matches!(self, Self::Unresizeable)
    }

    /// Whether interactive resizing must keep the current orientation.
    #[must_use]
    pub const fn is_preserve_orientation_mode(self) -> bool {
        matches!(
            self,
            Self::ForceResizableLandscapeOnly
                | Self::ForceResizablePortraitOnly
                | Self::ForceResizablePreserveOrientation
        )
    }
}

impl fmt::Display for ResizeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ResizeMode {
    type Error = ParsePolicyValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        [
            Self::Unresizeable,
            Self::ResizeableViaSdkVersion,
            Self::Resizeable,
            Self::ResizeableAndPipableDeprecated,
            Self::ForceResizeable,
            Self::ForceResizableLandscapeOnly,
            Self::ForceResizablePortraitOnly,
            Self::ForceResizablePreserveOrientation,
        ]
        .into_iter()
        .find(|mode| mode.as_str() == normalized)
        .ok_or_else(|| ParsePolicyValueError::new("resize mode", value))
    }
}

/// Lock-task authorisation granted to a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockTaskAuth {
    /// The task may never be locked.
    DontLock,
    /// The user may pin the task.
    #[default]
    Pinnable,
    /// The task may start lock-task mode itself.
    Launchable,
    /// The task's package is on the allowlist.
    Whitelisted,
    /// The task always launches into lock-task mode (privileged apps).
    LaunchablePriv,
}

impl LockTaskAuth {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DontLock => "dont_lock",
            Self::Pinnable => "pinnable",
            Self::Launchable => "launchable",
            Self::Whitelisted => "whitelisted",
            Self::LaunchablePriv => "launchable_priv",
        }
    }

    /// Derives the authorisation from the root activity's launch mode.
    ///
    /// `root` is `None` when the task has no live root activity.
    /// `allowlisted` reports whether the task's package is on the lock-task
    /// allowlist for the task's user.
    #[must_use]
    pub const fn derive(root: Option<LockTaskLaunchMode>, allowlisted: bool) -> Self {
        match root {
            None => Self::Pinnable,
            Some(LockTaskLaunchMode::Default) => {
                if allowlisted {
                    Self::Whitelisted
                } else {
                    Self::Pinnable
                }
            }
            Some(LockTaskLaunchMode::Never) => Self::DontLock,
            Some(LockTaskLaunchMode::Always) => Self::LaunchablePriv,
            Some(LockTaskLaunchMode::IfWhitelisted) => {
                if allowlisted {
                    Self::Launchable
                } else {
                    Self::Pinnable
                }
            }
        }
    }
}

/// Lock-task behaviour declared by an activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockTaskLaunchMode {
    /// Pinnable, or allowlisted when the package is on the allowlist.
    #[default]
    Default,
    /// Never locks.
    Never,
    /// Always launches locked.
    Always,
    /// Launchable only when allowlisted.
    IfWhitelisted,
}

/// The kind of content a task or activity hosts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    /// Not decided yet.
    #[default]
    Undefined,
    /// A regular application.
    Standard,
    /// The home screen.
    Home,
    /// The recents screen.
    Recents,
    /// The assistant.
    Assistant,
}

impl ActivityType {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Standard => "standard",
            Self::Home => "home",
            Self::Recents => "recents",
            Self::Assistant => "assistant",
        }
    }

    /// Returns `true` for standard or undecided content.
    #[must_use]
    pub const fn is_standard_or_undefined(self) -> bool {
        matches!(self, Self::Standard | Self::Undefined)
    }
}

impl TryFrom<&str> for ActivityType {
    type Error = ParsePolicyValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "undefined" => Ok(Self::Undefined),
            "standard" => Ok(Self::Standard),
            "home" => Ok(Self::Home),
            "recents" => Ok(Self::Recents),
            "assistant" => Ok(Self::Assistant),
            _ => Err(ParsePolicyValueError::new("activity type", value)),
        }
    }
}

/// How a new launch of an activity relates to existing instances.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchMode {
    /// A new instance per launch.
    #[default]
    Multiple,
    /// Reuse the instance when it is already on top.
    SingleTop,
    /// At most one instance, at the root of its task.
    SingleTask,
    /// At most one instance, alone in its task.
    SingleInstance,
}

impl LaunchMode {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Multiple => "multiple",
            Self::SingleTop => "single_top",
            Self::SingleTask => "single_task",
            Self::SingleInstance => "single_instance",
        }
    }
}

impl TryFrom<&str> for LaunchMode {
    type Error = ParsePolicyValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "multiple" => Ok(Self::Multiple),
            "single_top" => Ok(Self::SingleTop),
            "single_task" => Ok(Self::SingleTask),
            "single_instance" => Ok(Self::SingleInstance),
            _ => Err(ParsePolicyValueError::new("launch mode", value)),
        }
    }
}

/// Whether an activity survives in persisted recents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistableMode {
    /// Only the task root is persisted; persistence stops at this activity.
    #[default]
    RootOnly,
    /// Never persisted.
    Never,
    /// Persisted across reboots.
    AcrossReboots,
}

impl PersistableMode {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RootOnly => "root_only",
            Self::Never => "never",
            Self::AcrossReboots => "across_reboots",
        }
    }
}

impl TryFrom<&str> for PersistableMode {
    type Error = ParsePolicyValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "root_only" => Ok(Self::RootOnly),
            "never" => Ok(Self::Never),
            "across_reboots" => Ok(Self::AcrossReboots),
            _ => Err(ParsePolicyValueError::new("persistable mode", value)),
        }
    }
}

/// How an activity behaves when launched as a document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentLaunchMode {
    /// No document behaviour.
    #[default]
    None,
    /// Reuse an existing document task when one matches.
    IntoExisting,
    /// Always create a new document task.
    Always,
    /// Never create a document task.
    Never,
}


impl DocumentLaunchMode {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::IntoExisting => "into_existing",
            Self::Always => "always",
            Self::Never => "never",
        }
    }
}

impl TryFrom<&str> for DocumentLaunchMode {
    type Error = ParsePolicyValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "into_existing" => Ok(Self::IntoExisting),
            "always" => Ok(Self::Always),
            "never" => Ok(Self::Never),
            _ => Err(ParsePolicyValueError::new("document launch mode", value)),
        }
    }
}

impl LockTaskLaunchMode {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Never => "never",
            Self::Always => "always",
            Self::IfWhitelisted => "if_whitelisted",
        }
    }
}

impl TryFrom<&str> for LockTaskLaunchMode {
    type Error = ParsePolicyValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "default" => Ok(Self::Default),
            "never" => Ok(Self::Never),
            "always" => Ok(Self::Always),
            "if_whitelisted" => Ok(Self::IfWhitelisted),
            _ => Err(ParsePolicyValueError::new("lock task launch mode", value)),
        }
    }
}
