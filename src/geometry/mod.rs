//! Geometry value types and the bounds resolver.
//!
//! The resolver turns a parent configuration, a container's requested
//! override and the active windowing-mode policy into a resolved override
//! configuration. It has no knowledge of tasks or stacks; the task services
//! gather its inputs and store its outputs.

mod configuration;
mod rect;
mod resolver;

pub use configuration::{
    Configuration, DENSITY_DEFAULT, Orientation, Rotation, ScreenLayout, ScreenSize,
    WindowingMode,
};
pub use rect::{Insets, ParseRectError, Rect};
pub use resolver::{
    DisplayFrames, InsetFrames, MinimumDimensions, ResolveRequest, ResolverPolicy,
    adjust_for_minimal_dimensions, calculate_inset_frames, compute_config_resource_overrides,
    compute_fullscreen_bounds, dp_to_px, fit_within_bounds, intersect_with_insets_if_fits,
    px_to_dp, resolve_override_configuration, rotate_bounds,
};

use thiserror::Error;

/// Error returned while parsing geometry enums from persisted text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseGeometryValueError {
    /// The windowing mode name is unknown.
    #[error("unknown windowing mode: {0}")]
    WindowingMode(String),
}

#[cfg(test)]
mod tests;
