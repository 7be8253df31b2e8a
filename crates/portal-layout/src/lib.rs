//! Declarative window positioning.
//!
//! Turns a [`WindowPositionProps`] (anchor per axis, ordered offsets and
//! bounds-correction strategies) plus the current window/display geometry
//! into an absolute screen position. Everything here is pure: the same
//! inputs always give the same output.

pub mod bounds;
pub mod resolver;
pub mod types;

pub use bounds::{fit_window_in_bounds, BoundsExcess, OutOfBounds};
pub use resolver::{resolve_position, ClientRect, FrameState, PositionState, ReferenceElement};
pub use types::{
    Anchor, AxisAnchor, AxisRestriction, BoundsCondition, BoundsCorrectionStrategy,
    CorrectionKind, Offset, OffsetPatch, OffsetSpec, PositionSpec, ReplacedParameters, Unit,
    WindowPositionProps,
};
