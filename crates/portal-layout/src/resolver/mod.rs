//! Position resolution and iterative bounds correction.

mod measure;

#[cfg(test)]
mod tests;

use portal_common::{DisplayInfo, FrameId, LayoutError, Point, Size, WindowState};
use tracing::trace;

use crate::bounds::BoundsExcess;
use crate::types::{AxisRestriction, CorrectionKind, WindowPositionProps};

use measure::{anchor_position, offset_values, Xy};

/// Fractional rectangle of an element in its window's client space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ClientRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// An element inside some window that a portal can be positioned against.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceElement {
    /// Window whose content contains the element.
    pub owner: FrameId,
    pub client_rect: ClientRect,
}

/// A window's id together with its last known state.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameState {
    pub frame_id: FrameId,
    pub state: WindowState,
}

/// Geometry a position is resolved against.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionState {
    /// Size of the window being positioned (possibly just measured).
    pub own_size: Size,
    /// The window performing the calculation.
    pub parent: FrameState,
    pub parent_display: DisplayInfo,
    pub reference: Option<ReferenceElement>,
}

impl PositionState {
    pub fn new(own_size: Size, parent: FrameState) -> Self {
        let parent_display = parent.state.display;
        Self {
            own_size,
            parent,
            parent_display,
            reference: None,
        }
    }

    pub fn with_reference(mut self, reference: ReferenceElement) -> Self {
        self.reference = Some(reference);
        self
    }
}

/// Resolve `props` to an absolute, integer screen position.
///
/// Strategies run in list order while the window is out of bounds; the
/// first one that brings it fully inside ends the loop. When the list is
/// exhausted the last candidate is returned even if it still protrudes.
pub fn resolve_position(
    props: &WindowPositionProps,
    state: &PositionState,
) -> Result<Point, LayoutError> {
    let outer = props
        .correct_bounds_relative_to
        .unwrap_or(state.parent_display.bounds);

    let mut offsets = props.offsets.clone();
    let initial_offset = offset_values(&offsets, state)?;
    let anchor = anchor_position(&props.position, state)?;

    let mut position = anchor + initial_offset;
    let mut excess = BoundsExcess::check(position.x, position.y, state.own_size, outer);

    for (index, strategy) in props.bounds_correction_strategies.iter().enumerate() {
        if !excess.is_out_of_bounds() {
            break;
        }

        if let Some(condition) = strategy.apply_only_if {
            if !condition.holds(excess.out_of_bounds()) {
                trace!(index, ?condition, "bounds strategy skipped");
                continue;
            }
        }

        let previous = position;
        position = match &strategy.kind {
            CorrectionKind::SubtractExcess => {
                let (x, y) = excess.subtract_from(position.x, position.y);
                Xy { x, y }
            }
            CorrectionKind::ReplaceParameters(params) => {
                let base = match &params.position {
                    Some(spec) => anchor_position(spec, state)?,
                    None => anchor,
                };
                let offset = match &params.offsets {
                    Some(patch) => {
                        offsets = offsets.merged(patch);
                        offset_values(&offsets, state)?
                    }
                    None => initial_offset,
                };
                base + offset
            }
        };

        match strategy.apply_to_only {
            Some(AxisRestriction::HorizontalBounds) => position.y = previous.y,
            Some(AxisRestriction::VerticalBounds) => position.x = previous.x,
            None => {}
        }

        excess = BoundsExcess::check(position.x, position.y, state.own_size, outer);
        trace!(
            index,
            x = position.x,
            y = position.y,
            out_of_bounds = excess.is_out_of_bounds(),
            "bounds strategy applied"
        );
    }

    Ok(Point {
        x: position.x.round() as i32,
        y: position.y.round() as i32,
    })
}
