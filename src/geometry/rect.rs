//! Integer rectangles and inset values in display pixels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Axis-aligned rectangle in pixel coordinates.
///
/// Edges are half-open: a rectangle covers `left..right` horizontally and
/// `top..bottom` vertically. A rectangle whose right edge does not exceed its
/// left edge (or bottom its top) is empty; empty override bounds mean
/// "inherit the parent bounds".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge (exclusive).
    pub right: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
}

impl Rect {
    /// The canonical empty rectangle.
    pub const EMPTY: Self = Self::new(0, 0, 0, 0);

    /// Creates a rectangle from its four edges.
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Creates a rectangle anchored at the origin with the given size.
    #[must_use]
    pub const fn from_size(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Returns the horizontal extent.
    #[must_use]
    pub const fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    /// Returns the vertical extent.
    #[must_use]
    pub const fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }

    /// Returns `true` when the rectangle covers no area.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.left >= self.right || self.top >= self.bottom
    }

    /// Returns `true` when the rectangle is wider than it is tall.
    #[must_use]
    pub const fn is_landscape(&self) -> bool {
        self.width() > self.height()
    }

    /// Horizontal centre, rounded towards negative infinity.
    #[must_use]
    pub const fn center_x(&self) -> i32 {
        (self.left + self.right) >> 1
    }

    /// Vertical centre, rounded towards negative infinity.
    #[must_use]
    pub const fn center_y(&self) -> i32 {
        (self.top + self.bottom) >> 1
    }

    /// Returns `true` when `other` lies entirely inside this rectangle.
    ///
    /// An empty rectangle contains nothing.
    #[must_use]
    pub const fn contains(&self, other: &Self) -> bool {
        !self.is_empty()
            && self.left <= other.left
            && self.top <= other.top
            && self.right >= other.right
            && self.bottom >= other.bottom
    }

    /// Returns the overlap of two rectangles, or `None` when they do not
    /// intersect.
    #[must_use]
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        let candidate = Self::new(
            self.left.max(other.left),
            self.top.max(other.top),
            self.right.min(other.right),
            self.bottom.min(other.bottom),
        );
        (!candidate.is_empty()).then_some(candidate)
    }

    /// Returns a copy translated by `(dx, dy)`.
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32) -> Self {
        Self::new(
            self.left + dx,
            self.top + dy,
            self.right + dx,
            self.bottom + dy,
        )
    }

    /// Returns a copy moved so its top-left corner sits at `(left, top)`.
    #[must_use]
    pub const fn offset_to(&self, left: i32, top: i32) -> Self {
        Self::new(left, top, left + self.width(), top + self.height())
    }

    /// Returns this rectangle with each edge pulled inwards by `insets`.
    #[must_use]
    pub const fn inset(&self, insets: &Insets) -> Self {
        Self::new(
            self.left + insets.left,
            self.top + insets.top,
            self.right - insets.right,
            self.bottom - insets.bottom,
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            formatter,
            "{},{},{},{}",
            self.left, self.top, self.right, self.bottom
        )
    }
}

/// Error returned when a flattened rectangle cannot be parsed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid rectangle '{0}', expected left,top,right,bottom")]
pub struct ParseRectError(pub String);

impl FromStr for Rect {
    type Err = ParseRectError;

    /// Parses `left,top,right,bottom`. Whitespace-separated values written by
    /// older records are accepted too.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let edges = value
            .split(|ch: char| ch == ',' || ch.is_whitespace())
            .filter(|part| !part.is_empty())
            .map(str::parse::<i32>)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| ParseRectError(value.to_owned()))?;
        match edges.as_slice() {
            [left, top, right, bottom] => Ok(Self::new(*left, *top, *right, *bottom)),
            _ => Err(ParseRectError(value.to_owned())),
        }
    }
}

/// Per-edge reductions applied to a rectangle, such as system bar insets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Insets {
    /// Left reduction.
    pub left: i32,
    /// Top reduction.
    pub top: i32,
    /// Right reduction.
    pub right: i32,
    /// Bottom reduction.
    pub bottom: i32,
}

impl Insets {
    /// Insets that leave a rectangle unchanged.
    pub const NONE: Self = Self::new(0, 0, 0, 0);

    /// Creates insets from the four edge reductions.
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }
}
