//! Anchor and offset measurement for a single resolution pass.

use std::ops::Add;

use portal_common::LayoutError;

use crate::types::{Anchor, AxisAnchor, Offset, OffsetSpec, PositionSpec, Unit};

use super::{ClientRect, PositionState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Xy {
    pub x: f64,
    pub y: f64,
}

impl Add for Xy {
    type Output = Xy;

    fn add(self, rhs: Xy) -> Xy {
        Xy {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

/// Width/height pair an offset is a multiple of.
#[derive(Debug, Clone, Copy)]
struct Extent {
    width: f64,
    height: f64,
}

pub(super) fn anchor_position(
    spec: &PositionSpec,
    state: &PositionState,
) -> Result<Xy, LayoutError> {
    Ok(Xy {
        x: axis_origin(&spec.horizontal, state)?.x,
        y: axis_origin(&spec.vertical, state)?.y,
    })
}

pub(super) fn offset_values(
    spec: &OffsetSpec,
    state: &PositionState,
) -> Result<Xy, LayoutError> {
    let mut x = 0.0;
    for offset in &spec.horizontal {
        x += (extent_of(offset, state)?.width * offset.value).floor();
    }
    let mut y = 0.0;
    for offset in &spec.vertical {
        y += (extent_of(offset, state)?.height * offset.value).floor();
    }
    Ok(Xy { x, y })
}

fn axis_origin(axis: &AxisAnchor, state: &PositionState) -> Result<Xy, LayoutError> {
    match axis.anchor {
        Anchor::Display => {
            let bounds = axis
                .custom_display
                .map(|d| d.bounds)
                .unwrap_or(state.parent_display.bounds);
            Ok(Xy {
                x: f64::from(bounds.x),
                y: f64::from(bounds.y),
            })
        }
        Anchor::ParentWindow => {
            let bounds = state.parent.state.bounds;
            Ok(Xy {
                x: f64::from(bounds.x),
                y: f64::from(bounds.y),
            })
        }
        Anchor::ReferenceElement => {
            let rect = reference_rect(state, "anchor")?;
            let parent = state.parent.state.bounds;
            Ok(Xy {
                x: f64::from(parent.x) + rect.x,
                y: f64::from(parent.y) + rect.y,
            })
        }
    }
}

fn extent_of(offset: &Offset, state: &PositionState) -> Result<Extent, LayoutError> {
    let extent = match offset.unit {
        Unit::DisplaySize => {
            let bounds = offset
                .relative_to_custom_display
                .map(|d| d.bounds)
                .unwrap_or(state.parent_display.bounds);
            Extent {
                width: f64::from(bounds.width),
                height: f64::from(bounds.height),
            }
        }
        Unit::ReferenceElementSize => {
            let rect = reference_rect(state, "offset")?;
            Extent {
                width: rect.width,
                height: rect.height,
            }
        }
        Unit::ParentWindowSize => {
            let bounds = state.parent.state.bounds;
            Extent {
                width: f64::from(bounds.width),
                height: f64::from(bounds.height),
            }
        }
        Unit::OwnWindowSize => Extent {
            width: f64::from(state.own_size.width),
            height: f64::from(state.own_size.height),
        },
        Unit::Pixels => Extent {
            width: 1.0,
            height: 1.0,
        },
    };
    Ok(extent)
}

/// The reference element's rect scaled into host pixels by the parent's
/// zoom factor.
fn reference_rect(
    state: &PositionState,
    context: &'static str,
) -> Result<ClientRect, LayoutError> {
    let element = state
        .reference
        .as_ref()
        .ok_or(LayoutError::MissingReferenceElement { context })?;

    if element.owner != state.parent.frame_id {
        return Err(LayoutError::ForeignReferenceElement {
            owner: element.owner.clone(),
            calculating: state.parent.frame_id.clone(),
        });
    }

    let zoom = state.parent.state.zoom_factor;
    let rect = element.client_rect;
    if zoom != 0.0 && zoom != 1.0 {
        Ok(ClientRect {
            x: rect.x * zoom,
            y: rect.y * zoom,
            width: rect.width * zoom,
            height: rect.height * zoom,
        })
    } else {
        Ok(rect)
    }
}
