//! Bounds and configuration resolution against parent configuration and
//! windowing-mode policy.
//!
//! Everything here is a pure function of its inputs. Callers gather the parent
//! configuration, the container's requested override and the display frames,
//! and receive a fully resolved override configuration back.

use super::{
    Configuration, DENSITY_DEFAULT, Insets, Orientation, Rect, Rotation, ScreenLayout,
    WindowingMode,
};

/// Display geometry used to derive inset frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayFrames {
    /// Logical display size in the current rotation.
    pub logical_width: i32,
    /// Logical display height in the current rotation.
    pub logical_height: i32,
    /// Current display rotation.
    pub rotation: Rotation,
    /// Insets that can never be hidden (navigation bar, cutout).
    pub non_decor_insets: Insets,
    /// Insets for system bars in their stable state.
    pub stable_insets: Insets,
}

impl DisplayFrames {
    /// Display rectangle anchored at the origin.
    #[must_use]
    pub const fn logical_bounds(&self) -> Rect {
        Rect::from_size(self.logical_width, self.logical_height)
    }

    /// The display area left after stable insets are removed.
    #[must_use]
    pub const fn stable_bounds(&self) -> Rect {
        self.logical_bounds().inset(&self.stable_insets)
    }
}

/// Tunables applied while resolving bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverPolicy {
    /// Minimum size enforced on resizeable tasks without their own minimum.
    pub default_min_size_dp: u32,
    /// Horizontal amount of a freeform task that must remain on screen.
    pub min_visible_width_dp: u32,
    /// Vertical amount of a freeform task that must remain on screen.
    pub min_visible_height_dp: u32,
}

impl Default for ResolverPolicy {
    fn default() -> Self {
        Self {
            default_min_size_dp: 220,
            min_visible_width_dp: 48,
            min_visible_height_dp: 32,
        }
    }
}

/// Minimum width and height requested by a task, in pixels.
///
/// `None` means "use the device default" when defaults are enforced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MinimumDimensions {
    /// Requested minimum width.
    pub width: Option<i32>,
    /// Requested minimum height.
    pub height: Option<i32>,
}

/// Inputs for [`resolve_override_configuration`].
#[derive(Debug, Clone, Copy)]
pub struct ResolveRequest<'a> {
    /// Fully resolved configuration of the parent container.
    pub parent: &'a Configuration,
    /// Configuration the container asked for.
    pub requested: &'a Configuration,
    /// Override bounds produced by the previous resolution.
    pub previous_bounds: Rect,
    /// Minimum dimensions declared by the container.
    pub min_dimensions: MinimumDimensions,
    /// Whether the device default minimum applies to unset dimensions.
    pub enforce_default_min_size: bool,
    /// Orientation requested by the reference child, if any.
    pub child_orientation: Orientation,
    /// Whether an ancestor rotates the display itself instead of letterboxing.
    pub parent_handles_orientation: bool,
    /// Display geometry, when the container is attached to a display.
    pub display: Option<DisplayFrames>,
}

/// Converts density-independent pixels to pixels at `density_dpi`.
#[must_use]
pub fn dp_to_px(dp: u32, density_dpi: u32) -> i32 {
    let px = u64::from(dp)
        .saturating_mul(u64::from(density_dpi))
        .div_euclid(u64::from(DENSITY_DEFAULT));
    i32::try_from(px).unwrap_or(i32::MAX)
}

/// Converts pixels to density-independent pixels at `density_dpi`, truncating.
#[must_use]
pub fn px_to_dp(px: i32, density_dpi: u32) -> u32 {
    let clamped = u64::try_from(px.max(0)).unwrap_or_default();
    let density = u64::from(density_dpi.max(1));
    let dp = clamped
        .saturating_mul(u64::from(DENSITY_DEFAULT))
        .div_euclid(density);
    u32::try_from(dp).unwrap_or(u32::MAX)
}

/// Computes letterbox or pillarbox bounds for a fullscreen container.
///
/// Returns [`Rect::EMPTY`] (fill the parent) unless `forced` names an
/// orientation that differs from `parent_orientation`. Otherwise the parent
/// is shrunk along one axis so the result has the parent's aspect ratio
/// turned sideways, centred in the parent.
#[must_use]
pub fn compute_fullscreen_bounds(
    parent_bounds: Rect,
    parent_orientation: Orientation,
    forced: Orientation,
) -> Rect {
    if !forced.is_defined() || forced == parent_orientation || parent_bounds.is_empty() {
        return Rect::EMPTY;
    }
    let parent_width = i64::from(parent_bounds.width());
    let parent_height = i64::from(parent_bounds.height());
    if forced == Orientation::Landscape {
        let height = clamp_i32((parent_width * parent_width).div_euclid(parent_height));
        let top = parent_bounds.center_y() - (height >> 1);
        Rect::new(parent_bounds.left, top, parent_bounds.right, top + height)
    } else {
        let width = clamp_i32((parent_height * parent_height).div_euclid(parent_width));
        let left = parent_bounds.center_x() - (width >> 1);
        Rect::new(left, parent_bounds.top, left + width, parent_bounds.bottom)
    }
}

/// Grows `bounds` so it is at least `min_width` by `min_height`.
///
/// Empty `bounds` inherit `parent_bounds`; when the parent already satisfies
/// the minimum the result stays empty. When growing, the edge that matches
/// `previous` stays anchored so a task being dragged from that edge does not
/// jump.
#[must_use]
pub fn adjust_for_minimal_dimensions(
    bounds: Rect,
    previous: Rect,
    parent_bounds: Option<Rect>,
    min_width: Option<i32>,
    min_height: Option<i32>,
) -> Rect {
    let parent = parent_bounds.filter(|parent| !parent.is_empty());
    let mut adjusted = bounds;
    if adjusted.is_empty() {
        let Some(parent_rect) = parent else {
            return bounds;
        };
        let fits_width = min_width.is_none_or(|width| parent_rect.width() >= width);
        let fits_height = min_height.is_none_or(|height| parent_rect.height() >= height);
        if fits_width && fits_height {
            return bounds;
        }
        adjusted = parent_rect;
    }

    if let Some(width) = min_width.filter(|width| *width > adjusted.width()) {
        if !previous.is_empty() && adjusted.right == previous.right {
            adjusted.left = adjusted.right - width;
        } else {
            adjusted.right = adjusted.left + width;
        }
    }
    if let Some(height) = min_height.filter(|height| *height > adjusted.height()) {
        if !previous.is_empty() && adjusted.bottom == previous.bottom {
            adjusted.top = adjusted.bottom - height;
        } else {
            adjusted.bottom = adjusted.top + height;
        }
    }
    adjusted
}

/// Moves `bounds` so at least `overlap_x` by `overlap_y` pixels of it remain
/// inside `container`.
///
/// The overlap shrinks to the task's own size for tasks smaller than the
/// overlap. Bounds already inside the container are returned unchanged.
#[must_use]
pub fn fit_within_bounds(bounds: Rect, container: Rect, overlap_x: i32, overlap_y: i32) -> Rect {
    if container.is_empty() || container.contains(&bounds) {
        return bounds;
    }
    let overlap_horizontal = overlap_x.min(bounds.width());
    let dx = if bounds.right < container.left + overlap_horizontal {
        overlap_horizontal - (bounds.right - container.left)
    } else if bounds.left > container.right - overlap_horizontal {
        -(overlap_horizontal - (container.right - bounds.left))
    } else {
        0
    };
    let overlap_vertical = overlap_y.min(bounds.height());
    let dy = if bounds.bottom < container.top + overlap_vertical {
        overlap_vertical - (bounds.bottom - container.top)
    } else if bounds.top > container.bottom - overlap_vertical {
        -(overlap_vertical - (container.bottom - bounds.top))
    } else {
        0
    };
    bounds.offset(dx, dy)
}

/// Intersects `bounds` with `reference` shrunk by `insets`, side by side.
///
/// A side of `bounds` that already lies outside `reference` is left alone: an
/// intentionally oversized task (for example one held at its minimum size on
/// a small display) keeps its overhang instead of being clipped.
#[must_use]
pub const fn intersect_with_insets_if_fits(bounds: Rect, reference: Rect, insets: Insets) -> Rect {
    let mut out = bounds;
    if out.right <= reference.right {
        let limit = reference.right - insets.right;
        if limit < out.right {
            out.right = limit;
        }
    }
    if out.bottom <= reference.bottom {
        let limit = reference.bottom - insets.bottom;
        if limit < out.bottom {
            out.bottom = limit;
        }
    }
    if out.left >= reference.left {
        let limit = reference.left + insets.left;
        if limit > out.left {
            out.left = limit;
        }
    }
    if out.top >= reference.top {
        let limit = reference.top + insets.top;
        if limit > out.top {
            out.top = limit;
        }
    }
    out
}

/// Frames of `bounds` with non-decor and stable insets applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsetFrames {
    /// Bounds minus non-decor insets.
    pub non_decor: Rect,
    /// Bounds minus stable insets.
    pub stable: Rect,
}

/// Computes the non-decor and stable inset frames for `bounds`.
#[must_use]
pub const fn calculate_inset_frames(bounds: Rect, display: &DisplayFrames) -> InsetFrames {
    let reference = display.logical_bounds();
    InsetFrames {
        non_decor: intersect_with_insets_if_fits(bounds, reference, display.non_decor_insets),
        stable: intersect_with_insets_if_fits(bounds, reference, display.stable_insets),
    }
}

/// Fills in the resource-facing values of `config`: app bounds, screen size in
/// dp, smallest width, orientation and screen layout.
///
/// Values already set in `config` are kept.
#[must_use]
pub fn compute_config_resource_overrides(
    config: &Configuration,
    parent: &Configuration,
    display: Option<&DisplayFrames>,
) -> Configuration {
    let mut out = *config;
    let windowing_mode = out.windowing_mode.or_inherit(parent.windowing_mode);
    let density = out.density_dpi.unwrap_or_else(|| parent.density_or_default());

    let full_bounds = if out.bounds.is_empty() {
        parent.bounds
    } else {
        out.bounds
    };
    if out.app_bounds.is_empty() {
        out.app_bounds = full_bounds;
    }
    if windowing_mode != WindowingMode::Freeform && !parent.app_bounds.is_empty() {
        if let Some(clipped) = out.app_bounds.intersection(&parent.app_bounds) {
            out.app_bounds = clipped;
        }
    }

    let frames = display.map_or(
        InsetFrames {
            non_decor: out.app_bounds,
            stable: out.app_bounds,
        },
        |frames| calculate_inset_frames(full_bounds, frames),
    );

    if out.screen_width_dp.is_none() || out.screen_height_dp.is_none() {
        if out.screen_width_dp.is_none() {
            let width = px_to_dp(frames.stable.width(), density);
            out.screen_width_dp = Some(parent.screen_width_dp.map_or(width, |p| width.min(p)));
        }
        if out.screen_height_dp.is_none() {
            let height = px_to_dp(frames.stable.height(), density);
            out.screen_height_dp = Some(parent.screen_height_dp.map_or(height, |p| height.min(p)));
        }
        if out.smallest_screen_width_dp.is_none() {
            if windowing_mode.is_floating() {
                let shortest = full_bounds.width().min(full_bounds.height());
                out.smallest_screen_width_dp = Some(px_to_dp(shortest, density));
            } else if windowing_mode.is_split_screen() {
                let stable_shortest = frames.stable.width().min(frames.stable.height());
                out.smallest_screen_width_dp = Some(px_to_dp(stable_shortest, density));
            }
        }
    }

    if !out.orientation.is_defined() {
        let width = out.screen_width_dp.unwrap_or_default();
        let height = out.screen_height_dp.unwrap_or_default();
        out.orientation = Orientation::from_dimensions(width, height);
    }
    if out.screen_layout.is_none() {
        let compat_width = px_to_dp(frames.non_decor.width(), density);
        let compat_height = px_to_dp(frames.non_decor.height(), density);
        let base = parent.screen_layout.unwrap_or_default();
        out.screen_layout = Some(ScreenLayout::reduce(
            ScreenLayout {
                compat_needed: false,
                ..base
            },
            compat_width.max(compat_height),
            compat_width.min(compat_height),
        ));
    }
    out
}

/// Resolves a task's override configuration.
///
/// Applies fullscreen letterboxing, minimum-size clamping and freeform
/// containment in that order, then derives the resource-facing values.
#[must_use]
pub fn resolve_override_configuration(
    request: &ResolveRequest<'_>,
    policy: &ResolverPolicy,
) -> Configuration {
    let parent = request.parent;
    let mut resolved = *request.requested;
    let windowing_mode = resolved.windowing_mode.or_inherit(parent.windowing_mode);
    let density = parent.density_or_default();

    if windowing_mode == WindowingMode::Fullscreen {
        resolved.bounds = if request.parent_handles_orientation {
            Rect::EMPTY
        } else {
            let forced = if request.requested.orientation.is_defined() {
                request.requested.orientation
            } else {
                request.child_orientation
            };
            compute_fullscreen_bounds(parent.bounds, parent.orientation, forced)
        };
    }

    let default_min = request
        .enforce_default_min_size
        .then(|| dp_to_px(policy.default_min_size_dp, density));
    resolved.bounds = adjust_for_minimal_dimensions(
        resolved.bounds,
        request.previous_bounds,
        Some(parent.bounds),
        request.min_dimensions.width.or(default_min),
        request.min_dimensions.height.or(default_min),
    );

    if windowing_mode == WindowingMode::Freeform && !resolved.bounds.is_empty() {
        let container = request
            .display
            .and_then(|frames| parent.bounds.intersection(&frames.stable_bounds()))
            .unwrap_or(parent.bounds);
        let fitted = fit_within_bounds(
            resolved.bounds,
            container,
            dp_to_px(policy.min_visible_width_dp, density),
            dp_to_px(policy.min_visible_height_dp, density),
        );
        let offset_top = container.top - fitted.top;
        resolved.bounds = if offset_top > 0 {
            fitted.offset(0, offset_top)
        } else {
            fitted
        };
    }

    compute_config_resource_overrides(&resolved, parent, request.display.as_ref())
}

/// Rotates `bounds` by the turn between `from` and `to`.
///
/// `display_width` and `display_height` describe the display in the `to`
/// rotation, so a rectangle keeps its physical position on the panel while
/// the logical coordinate system turns underneath it.
#[must_use]
pub const fn rotate_bounds(
    bounds: Rect,
    from: Rotation,
    to: Rotation,
    display_width: i32,
    display_height: i32,
) -> Rect {
    match Rotation::delta(from, to) {
        Rotation::Deg0 => bounds,
        Rotation::Deg90 => Rect::new(
            display_width - bounds.bottom,
            bounds.left,
            display_width - bounds.top,
            bounds.right,
        ),
        Rotation::Deg180 => Rect::new(
            display_width - bounds.right,
            display_height - bounds.bottom,
            display_width - bounds.left,
            display_height - bounds.top,
        ),
        Rotation::Deg270 => Rect::new(
            bounds.top,
            display_height - bounds.right,
            bounds.bottom,
            display_height - bounds.left,
        ),
    }
}

fn clamp_i32(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}
