//! Configuration inheritance for a single container.

use crate::geometry::{Configuration, Rect, WindowingMode};
use serde::{Deserialize, Serialize};

/// What changed when a container's full configuration was recomputed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConfigurationChange {
    /// Any value of the full configuration changed.
    pub changed: bool,
    /// A size-related value changed (screen dp, smallest width, orientation
    /// or screen layout). Content that does not handle size changes must be
    /// recreated.
    pub size_changed: bool,
    /// The windowing mode changed.
    pub windowing_mode_changed: bool,
}

/// The three configuration layers of a container.
///
/// - the *requested override* is what the container asked for,
/// - the *resolved override* is that request after policy resolution,
/// - the *full* configuration is the parent's full configuration with the
///   resolved override layered on top.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigurationContainer {
    requested_override: Configuration,
    resolved_override: Configuration,
    full: Configuration,
}

impl ConfigurationContainer {
    /// Creates a container with nothing overridden.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            requested_override: Configuration::EMPTY,
            resolved_override: Configuration::EMPTY,
            full: Configuration::EMPTY,
        }
    }

    /// The configuration this container asked for.
    #[must_use]
    pub const fn requested_override(&self) -> &Configuration {
        &self.requested_override
    }

    /// The request after policy resolution.
    #[must_use]
    pub const fn resolved_override(&self) -> &Configuration {
        &self.resolved_override
    }

    /// Parent configuration merged with the resolved override.
    #[must_use]
    pub const fn full_configuration(&self) -> &Configuration {
        &self.full
    }

    /// Requested override bounds; empty means "fill the parent".
    #[must_use]
    pub const fn requested_bounds(&self) -> Rect {
        self.requested_override.bounds
    }

    /// Resolved bounds of this container.
    #[must_use]
    pub const fn bounds(&self) -> Rect {
        self.full.bounds
    }

    /// Effective windowing mode.
    #[must_use]
    pub const fn windowing_mode(&self) -> WindowingMode {
        self.full.windowing_mode
    }

    /// Replaces the requested override.
    pub const fn set_requested_override(&mut self, requested: Configuration) {
        self.requested_override = requested;
    }

    /// Sets the requested bounds. `None` and empty rectangles both mean "fill
    /// the parent". Returns `true` when the request changed.
    pub fn set_requested_bounds(&mut self, bounds: Option<Rect>) -> bool {
        let next = bounds.unwrap_or(Rect::EMPTY);
        let previous = self.requested_override.bounds;
        self.requested_override.bounds = next;
        !same_bounds(previous, next)
    }

    /// Sets the requested windowing mode.
    pub const fn set_requested_windowing_mode(&mut self, mode: WindowingMode) {
        self.requested_override.windowing_mode = mode;
    }

    /// Returns `true` when `bounds` would not change the requested bounds.
    #[must_use]
    pub fn equivalent_requested_bounds(&self, bounds: Option<Rect>) -> bool {
        same_bounds(self.requested_override.bounds, bounds.unwrap_or(Rect::EMPTY))
    }

    /// Stores a freshly resolved override and recomputes the full
    /// configuration against `parent_full`.
    pub fn apply_resolved(
        &mut self,
        parent_full: &Configuration,
        resolved: Configuration,
    ) -> ConfigurationChange {
        let previous = self.full;
        self.resolved_override = resolved;
        self.full = parent_full.merged_with(&resolved);
        diff(&previous, &self.full)
    }
}

fn same_bounds(left: Rect, right: Rect) -> bool {
    (left.is_empty() && right.is_empty()) || left == right
}

fn diff(previous: &Configuration, next: &Configuration) -> ConfigurationChange {
    let size_changed = previous.screen_width_dp != next.screen_width_dp
        || previous.screen_height_dp != next.screen_height_dp
        || previous.smallest_screen_width_dp != next.smallest_screen_width_dp
        || previous.orientation != next.orientation
        || previous.screen_layout != next.screen_layout;
    ConfigurationChange {
        changed: previous != next,
        size_changed,
        windowing_mode_changed: previous.windowing_mode != next.windowing_mode,
    }
}
