//! Capability traits implemented by containers that support the operation.
//!
//! Instead of overriding a base class, each container kind opts into the
//! behaviours it supports by implementing the matching trait.

use crate::geometry::Rect;

/// Where to place a child inside its new parent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ChildPosition {
    /// Above every existing child.
    #[default]
    Top,
    /// Below every existing child.
    Bottom,
    /// At an explicit index, clamped to the child count.
    Index(usize),
}

impl ChildPosition {
    /// Resolves the position against a parent holding `len` children.
    #[must_use]
    pub fn resolve(self, len: usize) -> usize {
        match self {
            Self::Top => len,
            Self::Bottom => 0,
            Self::Index(index) => index.min(len),
        }
    }
}

/// What happens to the destination parent's z-order after a reparent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FrontPolicy {
    /// Always bring the destination to the front.
    MoveToFront,
    /// Bring the destination to the front only if the moved child was focused
    /// or in front before the move.
    KeepAtFront,
    /// Leave the destination where it is.
    #[default]
    LeaveInPlace,
}

/// Arguments for [`Resizable::resize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeRequest {
    /// New bounds; `None` reverts to filling the parent.
    pub bounds: Option<Rect>,
    /// Apply even when the bounds are unchanged.
    pub forced: bool,
    /// Keep the existing surfaces while content is recreated.
    pub preserve_window: bool,
    /// Skip visibility and resume updates.
    pub defer_resume: bool,
}

impl ResizeRequest {
    /// A request for `bounds` with default flags.
    #[must_use]
    pub const fn to(bounds: Option<Rect>) -> Self {
        Self {
            bounds,
            forced: false,
            preserve_window: false,
            defer_resume: false,
        }
    }
}

/// Arguments for [`Reparentable::reparent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReparentRequest<P> {
    /// Destination parent.
    pub target: P,
    /// Where to land inside the destination.
    pub position: ChildPosition,
    /// Z-order handling for the destination.
    pub front_policy: FrontPolicy,
    /// Whether the move should animate.
    pub animate: bool,
    /// Skip visibility and resume updates.
    pub defer_resume: bool,
}

impl<P> ReparentRequest<P> {
    /// A request that moves to the top of `target` without changing focus.
    #[must_use]
    pub const fn to(target: P) -> Self {
        Self {
            target,
            position: ChildPosition::Top,
            front_policy: FrontPolicy::LeaveInPlace,
            animate: true,
            defer_resume: false,
        }
    }
}

/// Containers whose bounds can be changed on request.
pub trait Resizable<K> {
    /// Error returned when the request is rejected.
    type Error;

    /// Resizes `node`. Returns `false` when content had to be recreated to
    /// apply the change.
    ///
    /// # Errors
    ///
    /// Implementations reject bounds that violate their policy without
    /// mutating anything.
    fn resize(&self, node: K, request: ResizeRequest) -> Result<bool, Self::Error>;
}

/// Containers that can move between parents.
pub trait Reparentable<K> {
    /// Key of the destination parent.
    type Parent;
    /// Error returned when the move fails.
    type Error;

    /// Moves `node` under `request.target`. Returns `false` when the move was
    /// not performed.
    ///
    /// # Errors
    ///
    /// Implementations return an error when either container is unknown.
    fn reparent(&self, node: K, request: ReparentRequest<Self::Parent>)
    -> Result<bool, Self::Error>;
}

/// Containers that can be written to durable storage.
pub trait Persistable {
    /// Durable representation.
    type Record;

    /// Whether this container should be persisted at all.
    fn is_persistable(&self) -> bool;

    /// Produces the durable representation.
    fn to_record(&self) -> Self::Record;
}
