//! Declarative positioning parameters.

use portal_common::{DisplayInfo, Rect};
use serde::{Deserialize, Serialize};

use crate::bounds::OutOfBounds;

// =============================================================================
// POSITION
// =============================================================================

/// What an axis position starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Anchor {
    Display,
    ParentWindow,
    ReferenceElement,
}

/// Anchor choice for one axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AxisAnchor {
    pub anchor: Anchor,
    /// Use this display instead of the parent's when `anchor` is `Display`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_display: Option<DisplayInfo>,
}

impl AxisAnchor {
    pub fn new(anchor: Anchor) -> Self {
        Self {
            anchor,
            custom_display: None,
        }
    }

    pub fn on_display(display: DisplayInfo) -> Self {
        Self {
            anchor: Anchor::Display,
            custom_display: Some(display),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSpec {
    pub horizontal: AxisAnchor,
    pub vertical: AxisAnchor,
}

impl PositionSpec {
    /// Both axes anchored to the same reference.
    pub fn uniform(anchor: Anchor) -> Self {
        Self {
            horizontal: AxisAnchor::new(anchor),
            vertical: AxisAnchor::new(anchor),
        }
    }
}

// =============================================================================
// OFFSETS
// =============================================================================

/// What an offset value is a multiple of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Unit {
    DisplaySize,
    ReferenceElementSize,
    ParentWindowSize,
    OwnWindowSize,
    Pixels,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offset {
    pub unit: Unit,
    pub value: f64,
    /// Measure `DisplaySize` against this display instead of the parent's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_to_custom_display: Option<DisplayInfo>,
}

impl Offset {
    pub fn new(unit: Unit, value: f64) -> Self {
        Self {
            unit,
            value,
            relative_to_custom_display: None,
        }
    }

    pub fn pixels(value: f64) -> Self {
        Self::new(Unit::Pixels, value)
    }
}

/// Ordered offsets per axis; each axis sums its own list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffsetSpec {
    #[serde(default)]
    pub horizontal: Vec<Offset>,
    #[serde(default)]
    pub vertical: Vec<Offset>,
}

/// Per-axis replacement lists; an absent axis keeps its current list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OffsetPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub horizontal: Option<Vec<Offset>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertical: Option<Vec<Offset>>,
}

impl OffsetSpec {
    /// Shallow merge of `patch` over `self`.
    pub fn merged(&self, patch: &OffsetPatch) -> OffsetSpec {
        OffsetSpec {
            horizontal: patch
                .horizontal
                .clone()
                .unwrap_or_else(|| self.horizontal.clone()),
            vertical: patch
                .vertical
                .clone()
                .unwrap_or_else(|| self.vertical.clone()),
        }
    }
}

// =============================================================================
// BOUNDS CORRECTION
// =============================================================================

/// Limits a strategy's effect to a single axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AxisRestriction {
    HorizontalBounds,
    VerticalBounds,
}

/// Gate evaluated against which axes are currently out of bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BoundsCondition {
    HorizontalOutOfBounds,
    VerticalOutOfBounds,
    BothOutOfBounds,
    OnlyHorizontalOutOfBounds,
    OnlyVerticalOutOfBounds,
}

impl BoundsCondition {
    pub fn holds(self, out: OutOfBounds) -> bool {
        match self {
            Self::HorizontalOutOfBounds => out.horizontal,
            Self::VerticalOutOfBounds => out.vertical,
            Self::BothOutOfBounds => out.horizontal && out.vertical,
            Self::OnlyHorizontalOutOfBounds => out.horizontal && !out.vertical,
            Self::OnlyVerticalOutOfBounds => out.vertical && !out.horizontal,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplacedParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offsets: Option<OffsetPatch>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategyType", rename_all = "camelCase")]
pub enum CorrectionKind {
    /// Pull each protruding edge back by exactly its excess.
    SubtractExcess,
    /// Recompute with a substituted position and/or merged offsets.
    ReplaceParameters(ReplacedParameters),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundsCorrectionStrategy {
    pub kind: CorrectionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_to_only: Option<AxisRestriction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub apply_only_if: Option<BoundsCondition>,
}

impl BoundsCorrectionStrategy {
    pub fn subtract_excess() -> Self {
        Self {
            kind: CorrectionKind::SubtractExcess,
            apply_to_only: None,
            apply_only_if: None,
        }
    }

    pub fn replace(params: ReplacedParameters) -> Self {
        Self {
            kind: CorrectionKind::ReplaceParameters(params),
            apply_to_only: None,
            apply_only_if: None,
        }
    }

    pub fn only(mut self, restriction: AxisRestriction) -> Self {
        self.apply_to_only = Some(restriction);
        self
    }

    pub fn when(mut self, condition: BoundsCondition) -> Self {
        self.apply_only_if = Some(condition);
        self
    }
}

/// Full input to [`crate::resolve_position`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowPositionProps {
    pub position: PositionSpec,
    #[serde(default)]
    pub offsets: OffsetSpec,
    /// Outer rectangle for bounds checks; defaults to the parent's display.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_bounds_relative_to: Option<Rect>,
    /// Tried in order until the window fits.
    #[serde(default)]
    pub bounds_correction_strategies: Vec<BoundsCorrectionStrategy>,
}

impl WindowPositionProps {
    pub fn new(position: PositionSpec, offsets: OffsetSpec) -> Self {
        Self {
            position,
            offsets,
            correct_bounds_relative_to: None,
            bounds_correction_strategies: Vec::new(),
        }
    }

    pub fn with_strategy(mut self, strategy: BoundsCorrectionStrategy) -> Self {
        self.bounds_correction_strategies.push(strategy);
        self
    }
}
