//! Configuration values resolved down the container hierarchy.

use super::{ParseGeometryValueError, Rect};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Baseline density at which one density-independent pixel equals one pixel.
pub const DENSITY_DEFAULT: u32 = 160;

/// Policy governing how a container's bounds are resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowingMode {
    /// Not set; the parent's mode applies.
    #[default]
    Undefined,
    /// Fills the parent, letterboxed when orientation disagrees.
    Fullscreen,
    /// Small always-on-top picture-in-picture window.
    Pinned,
    /// Primary side of a split screen.
    SplitScreenPrimary,
    /// Secondary side of a split screen.
    SplitScreenSecondary,
    /// Free-floating, user-positioned window.
    Freeform,
}

impl WindowingMode {
    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Fullscreen => "fullscreen",
            Self::Pinned => "pinned",
            Self::SplitScreenPrimary => "split_screen_primary",
            Self::SplitScreenSecondary => "split_screen_secondary",
            Self::Freeform => "freeform",
        }
    }

    /// Returns `self`, or `parent` when this mode is undefined.
    #[must_use]
    pub const fn or_inherit(self, parent: Self) -> Self {
        match self {
            Self::Undefined => parent,
            _ => self,
        }
    }

    /// Whether bounds chosen in this mode should be remembered and persisted.
    #[must_use]
    pub const fn persists_bounds(self) -> bool {
        matches!(self, Self::Freeform)
    }

    /// Whether containers in this mode float above the regular layout.
    #[must_use]
    pub const fn is_floating(self) -> bool {
        matches!(self, Self::Freeform | Self::Pinned)
    }

    /// Whether this mode is one side of a split screen.
    #[must_use]
    pub const fn is_split_screen(self) -> bool {
        matches!(self, Self::SplitScreenPrimary | Self::SplitScreenSecondary)
    }

    /// Whether a task may be resized independently of its parent.
    #[must_use]
    pub const fn can_resize_task(self) -> bool {
        matches!(self, Self::Freeform)
    }

    /// Whether this mode shares the screen with other containers.
    #[must_use]
    pub const fn is_multi_window(self) -> bool {
        !matches!(self, Self::Undefined | Self::Fullscreen)
    }
}

impl fmt::Display for WindowingMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl TryFrom<&str> for WindowingMode {
    type Error = ParseGeometryValueError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_lowercase().as_str() {
            "undefined" => Ok(Self::Undefined),
            "fullscreen" => Ok(Self::Fullscreen),
            "pinned" => Ok(Self::Pinned),
            "split_screen_primary" => Ok(Self::SplitScreenPrimary),
            "split_screen_secondary" => Ok(Self::SplitScreenSecondary),
            "freeform" => Ok(Self::Freeform),
            _ => Err(ParseGeometryValueError::WindowingMode(value.to_owned())),
        }
    }
}

/// Screen orientation as seen by a container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// No preference or not yet resolved.
    #[default]
    Undefined,
    /// Taller than wide (or square).
    Portrait,
    /// Wider than tall.
    Landscape,
}

impl Orientation {
    /// Derives the orientation from a width and height; squares are portrait.
    #[must_use]
    pub const fn from_dimensions(width: u32, height: u32) -> Self {
        if width <= height {
            Self::Portrait
        } else {
            Self::Landscape
        }
    }

    /// Returns `true` when the orientation is set.
    #[must_use]
    pub const fn is_defined(self) -> bool {
        !matches!(self, Self::Undefined)
    }
}

/// Physical display rotation in quarter turns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rotation {
    /// Natural orientation.
    #[default]
    Deg0,
    /// Rotated a quarter turn.
    Deg90,
    /// Upside down.
    Deg180,
    /// Rotated three quarter turns.
    Deg270,
}

impl Rotation {
    /// Number of quarter turns from the natural orientation.
    #[must_use]
    pub const fn quarter_turns(self) -> u8 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 1,
            Self::Deg180 => 2,
            Self::Deg270 => 3,
        }
    }

    /// Builds a rotation from a quarter-turn count, wrapping at four.
    #[must_use]
    pub const fn from_quarter_turns(turns: u8) -> Self {
        match turns.rem_euclid(4) {
            1 => Self::Deg90,
            2 => Self::Deg180,
            3 => Self::Deg270,
            _ => Self::Deg0,
        }
    }

    /// Rotation that takes `from` to `to`.
    #[must_use]
    pub const fn delta(from: Self, to: Self) -> Self {
        Self::from_quarter_turns(to.quarter_turns() + 4 - from.quarter_turns())
    }
}

/// Coarse screen size class.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum ScreenSize {
    /// Not set.
    #[default]
    Undefined,
    /// Long side under 470dp.
    Small,
    /// Typical phone.
    Normal,
    /// At least 640x480dp.
    Large,
    /// At least 960x720dp.
    Xlarge,
}

/// Screen layout classification derived from available dp.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScreenLayout {
    /// Size class.
    pub size: ScreenSize,
    /// Whether the screen is significantly longer than it is wide.
    pub long: bool,
    /// Whether legacy apps need compatibility scaling.
    pub compat_needed: bool,
}

impl ScreenLayout {
    /// Creates a layout class.
    #[must_use]
    pub const fn new(size: ScreenSize, long: bool) -> Self {
        Self {
            size,
            long,
            compat_needed: false,
        }
    }

    /// Reduces a parent layout to fit an area of `long_dp` by `short_dp`.
    ///
    /// The result never reports a larger size class than the parent and only
    /// keeps the parent's `long` flag when the smaller area is long too.
    #[must_use]
    pub const fn reduce(self, long_dp: u32, short_dp: u32) -> Self {
        let (size, long, compat_needed) = if long_dp < 470 {
            (ScreenSize::Small, false, false)
        } else {
            let size = if long_dp >= 960 && short_dp >= 720 {
                ScreenSize::Xlarge
            } else if long_dp >= 640 && short_dp >= 480 {
                ScreenSize::Large
            } else {
                ScreenSize::Normal
            };
            let compat_needed = short_dp > 321 || long_dp > 570;
            let long = long_dp.saturating_mul(3).div_euclid(5) >= short_dp.saturating_sub(1);
            (size, long, compat_needed)
        };
        let reduced_size = if (size as u8) < (self.size as u8) {
            size
        } else {
            self.size
        };
        Self {
            size: reduced_size,
            long: self.long && long,
            compat_needed: self.compat_needed || compat_needed,
        }
    }
}

/// Per-container configuration. Unset values inherit from the parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Configuration {
    /// Windowing mode.
    pub windowing_mode: WindowingMode,
    /// Container bounds; empty means "fill the parent".
    pub bounds: Rect,
    /// Area available to application content; empty means unset.
    pub app_bounds: Rect,
    /// Display rotation the bounds were computed in.
    pub rotation: Option<Rotation>,
    /// Screen density in dots per inch.
    pub density_dpi: Option<u32>,
    /// Usable width in density-independent pixels.
    pub screen_width_dp: Option<u32>,
    /// Usable height in density-independent pixels.
    pub screen_height_dp: Option<u32>,
    /// Smallest usable width across orientations.
    pub smallest_screen_width_dp: Option<u32>,
    /// Orientation.
    pub orientation: Orientation,
    /// Screen layout class.
    pub screen_layout: Option<ScreenLayout>,
}

impl Configuration {
    /// A configuration where nothing is overridden.
    pub const EMPTY: Self = Self {
        windowing_mode: WindowingMode::Undefined,
        bounds: Rect::EMPTY,
        app_bounds: Rect::EMPTY,
        rotation: None,
        density_dpi: None,
        screen_width_dp: None,
        screen_height_dp: None,
        smallest_screen_width_dp: None,
        orientation: Orientation::Undefined,
        screen_layout: None,
    };

    /// Returns a copy with the given windowing mode.
    #[must_use]
    pub const fn with_windowing_mode(mut self, windowing_mode: WindowingMode) -> Self {
        self.windowing_mode = windowing_mode;
        self
    }

    /// Returns a copy with the given bounds.
    #[must_use]
    pub const fn with_bounds(mut self, bounds: Rect) -> Self {
        self.bounds = bounds;
        self
    }

    /// Returns a copy with the given requested orientation.
    #[must_use]
    pub const fn with_orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Layers `overrides` on top of this configuration.
    ///
    /// Every value set in `overrides` replaces the corresponding value here.
    #[must_use]
    pub fn merged_with(&self, overrides: &Self) -> Self {
        Self {
            windowing_mode: overrides.windowing_mode.or_inherit(self.windowing_mode),
            bounds: if overrides.bounds.is_empty() {
                self.bounds
            } else {
                overrides.bounds
            },
            app_bounds: if overrides.app_bounds.is_empty() {
                self.app_bounds
            } else {
                overrides.app_bounds
            },
            rotation: overrides.rotation.or(self.rotation),
            density_dpi: overrides.density_dpi.or(self.density_dpi),
            screen_width_dp: overrides.screen_width_dp.or(self.screen_width_dp),
            screen_height_dp: overrides.screen_height_dp.or(self.screen_height_dp),
            smallest_screen_width_dp: overrides
                .smallest_screen_width_dp
                .or(self.smallest_screen_width_dp),
            orientation: if overrides.orientation.is_defined() {
                overrides.orientation
            } else {
                self.orientation
            },
            screen_layout: overrides.screen_layout.or(self.screen_layout),
        }
    }

    /// Density in dpi, falling back to [`DENSITY_DEFAULT`].
    #[must_use]
    pub fn density_or_default(&self) -> u32 {
        self.density_dpi.unwrap_or(DENSITY_DEFAULT)
    }
}
