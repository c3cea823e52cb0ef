//! Device-wide policy knobs for the task lifecycle service.

use crate::geometry::ResolverPolicy;
use serde::{Deserialize, Serialize};

/// Policy applied by [`super::TaskLifecycleService`].
///
/// # Examples
///
/// ```
/// use atelier::task::services::TaskPolicyConfig;
///
/// let desktop = TaskPolicyConfig::desktop();
/// assert!(desktop.force_resizable_activities);
/// assert_eq!(desktop.max_recents_limit, TaskPolicyConfig::default().max_recents_limit);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskPolicyConfig {
    /// Minimum size of a resizeable task without its own minimum, in dp.
    pub default_min_size_dp: u32,
    /// Horizontal part of a freeform task that must stay on screen, in dp.
    pub min_visible_width_dp: u32,
    /// Vertical part of a freeform task that must stay on screen, in dp.
    pub min_visible_height_dp: u32,
    /// Upper bound for the recents limit an activity may declare.
    pub max_recents_limit: u32,
    /// Treat every activity as resizeable.
    pub force_resizable_activities: bool,
    /// Whether the device offers split screen at all.
    pub supports_split_screen: bool,
    /// Letterbox fullscreen tasks whose orientation disagrees with the
    /// display instead of rotating the display.
    pub letterbox_fullscreen: bool,
}

impl Default for TaskPolicyConfig {
    fn default() -> Self {
        Self {
            default_min_size_dp: 220,
            min_visible_width_dp: 48,
            min_visible_height_dp: 32,
            max_recents_limit: 24,
            force_resizable_activities: false,
            supports_split_screen: true,
            letterbox_fullscreen: true,
        }
    }
}

impl TaskPolicyConfig {
    /// Configuration for large-screen devices where every task may float.
    #[must_use]
    pub fn desktop() -> Self {
        Self {
            force_resizable_activities: true,
            ..Default::default()
        }
    }

    /// Configuration for small devices without multi-window support.
    #[must_use]
    pub fn handheld() -> Self {
        Self {
            supports_split_screen: false,
            max_recents_limit: 12,
            ..Default::default()
        }
    }

    /// Geometry limits handed to the resolver.
    #[must_use]
    pub const fn resolver_policy(&self) -> ResolverPolicy {
        ResolverPolicy {
            default_min_size_dp: self.default_min_size_dp,
            min_visible_width_dp: self.min_visible_width_dp,
            min_visible_height_dp: self.min_visible_height_dp,
        }
    }
}
