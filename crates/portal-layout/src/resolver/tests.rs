use portal_common::{DisplayInfo, FrameId, LayoutError, Point, Rect, Size, WindowState};

use super::*;
use crate::types::{
    Anchor, AxisAnchor, AxisRestriction, BoundsCondition, BoundsCorrectionStrategy, Offset,
    OffsetPatch, OffsetSpec, PositionSpec, ReplacedParameters, Unit, WindowPositionProps,
};

const DISPLAY: DisplayInfo = DisplayInfo {
    id: 1,
    bounds: Rect::new(0, 0, 1920, 1080),
};

fn parent_at(bounds: Rect) -> FrameState {
    FrameState {
        frame_id: FrameId::from("main_window"),
        state: WindowState {
            bounds,
            display: DISPLAY,
            zoom_factor: 1.0,
            focused: true,
            media_source_id: "window:1:0".into(),
        },
    }
}

fn state(own: Size, parent_bounds: Rect) -> PositionState {
    PositionState::new(own, parent_at(parent_bounds))
}

fn size(width: i32, height: i32) -> Size {
    Size { width, height }
}

fn at_parent() -> WindowPositionProps {
    WindowPositionProps::new(
        PositionSpec::uniform(Anchor::ParentWindow),
        OffsetSpec::default(),
    )
}

#[test]
fn resolution_is_deterministic() {
    let props = WindowPositionProps::new(
        PositionSpec::uniform(Anchor::ParentWindow),
        OffsetSpec {
            horizontal: vec![Offset::new(Unit::ParentWindowSize, 0.5)],
            vertical: vec![Offset::new(Unit::DisplaySize, 0.1), Offset::pixels(3.0)],
        },
    );
    let st = state(size(200, 100), Rect::new(100, 100, 250, 350));
    let first = resolve_position(&props, &st).unwrap();
    let second = resolve_position(&props, &st).unwrap();
    assert_eq!(first, second);
    assert_eq!(first, Point { x: 225, y: 211 });
}

#[test]
fn left_of_parent_scenario() {
    let props = WindowPositionProps::new(
        PositionSpec::uniform(Anchor::ParentWindow),
        OffsetSpec {
            horizontal: vec![
                Offset::new(Unit::OwnWindowSize, -1.0),
                Offset::new(Unit::Pixels, -5.0),
            ],
            vertical: vec![],
        },
    );
    let st = state(size(200, 120), Rect::new(100, 100, 250, 350));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: -105, y: 100 });
}

#[test]
fn overflow_without_strategies_is_returned_unchanged() {
    let props = at_parent();
    let st = state(size(250, 100), Rect::new(1700, 100, 300, 300));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: 1700, y: 100 });
}

#[test]
fn subtract_excess_shifts_by_exact_overflow() {
    let props = at_parent().with_strategy(BoundsCorrectionStrategy::subtract_excess());
    // right edge at 1950, 30px past the display
    let st = state(size(250, 100), Rect::new(1700, 100, 300, 300));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: 1670, y: 100 });
}

#[test]
fn subtract_excess_corrects_near_edges() {
    let props = WindowPositionProps::new(
        PositionSpec::uniform(Anchor::ParentWindow),
        OffsetSpec {
            horizontal: vec![Offset::pixels(-150.0)],
            vertical: vec![Offset::pixels(-120.0)],
        },
    )
    .with_strategy(BoundsCorrectionStrategy::subtract_excess());
    let st = state(size(100, 100), Rect::new(100, 100, 300, 300));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: 0, y: 0 });
}

#[test]
fn replace_parameters_restricted_to_horizontal_keeps_vertical() {
    let replace = ReplacedParameters {
        position: Some(PositionSpec::uniform(Anchor::Display)),
        offsets: None,
    };
    let st = state(size(250, 100), Rect::new(1700, 400, 300, 300));

    let unrestricted =
        at_parent().with_strategy(BoundsCorrectionStrategy::replace(replace.clone()));
    assert_eq!(
        resolve_position(&unrestricted, &st).unwrap(),
        Point { x: 0, y: 0 }
    );

    let restricted = at_parent().with_strategy(
        BoundsCorrectionStrategy::replace(replace).only(AxisRestriction::HorizontalBounds),
    );
    assert_eq!(
        resolve_position(&restricted, &st).unwrap(),
        Point { x: 0, y: 400 }
    );
}

#[test]
fn vertical_restriction_keeps_horizontal() {
    let props = at_parent().with_strategy(
        BoundsCorrectionStrategy::subtract_excess().only(AxisRestriction::VerticalBounds),
    );
    // overflows right by 30 and bottom by 20
    let st = state(size(250, 100), Rect::new(1700, 1000, 300, 300));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: 1700, y: 980 });
}

#[test]
fn gated_strategy_is_skipped_when_condition_fails() {
    let props = at_parent().with_strategy(
        BoundsCorrectionStrategy::subtract_excess().when(BoundsCondition::VerticalOutOfBounds),
    );
    let st = state(size(250, 100), Rect::new(1700, 100, 300, 300));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: 1700, y: 100 });
}

#[test]
fn gated_strategy_applies_when_condition_holds() {
    let props = at_parent().with_strategy(
        BoundsCorrectionStrategy::subtract_excess().when(BoundsCondition::HorizontalOutOfBounds),
    );
    let st = state(size(250, 100), Rect::new(1700, 100, 300, 300));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: 1670, y: 100 });
}

#[test]
fn first_strategy_that_fits_wins() {
    let to_display = ReplacedParameters {
        position: Some(PositionSpec::uniform(Anchor::Display)),
        offsets: None,
    };
    let props = at_parent()
        .with_strategy(BoundsCorrectionStrategy::replace(to_display))
        .with_strategy(BoundsCorrectionStrategy::subtract_excess());
    let st = state(size(250, 100), Rect::new(1700, 100, 300, 300));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: 0, y: 0 });
}

#[test]
fn later_strategy_runs_when_earlier_one_still_overflows() {
    let still_out = ReplacedParameters {
        position: None,
        offsets: Some(OffsetPatch {
            horizontal: Some(vec![Offset::pixels(10.0)]),
            vertical: None,
        }),
    };
    let fits = ReplacedParameters {
        position: None,
        offsets: Some(OffsetPatch {
            horizontal: Some(vec![Offset::new(Unit::OwnWindowSize, -1.0)]),
            vertical: None,
        }),
    };
    let props = at_parent()
        .with_strategy(BoundsCorrectionStrategy::replace(still_out))
        .with_strategy(BoundsCorrectionStrategy::replace(fits));
    let st = state(size(250, 100), Rect::new(1700, 100, 300, 300));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: 1450, y: 100 });
}

#[test]
fn replaced_offsets_merge_shallowly() {
    let props = WindowPositionProps::new(
        PositionSpec::uniform(Anchor::ParentWindow),
        OffsetSpec {
            horizontal: vec![Offset::pixels(5000.0)],
            vertical: vec![Offset::pixels(10.0)],
        },
    )
    .with_strategy(BoundsCorrectionStrategy::replace(ReplacedParameters {
        position: None,
        offsets: Some(OffsetPatch {
            horizontal: Some(vec![Offset::pixels(20.0)]),
            vertical: None,
        }),
    }));
    let st = state(size(100, 100), Rect::new(100, 100, 300, 300));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: 120, y: 110 });
}

#[test]
fn explicit_outer_bounds_override_display() {
    let mut props = at_parent().with_strategy(BoundsCorrectionStrategy::subtract_excess());
    props.correct_bounds_relative_to = Some(Rect::new(0, 0, 500, 500));
    let st = state(size(100, 100), Rect::new(450, 100, 300, 300));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: 400, y: 100 });
}

#[test]
fn outer_bounds_past_i32_max_are_checked_without_overflow() {
    let mut props = at_parent().with_strategy(BoundsCorrectionStrategy::subtract_excess());
    props.correct_bounds_relative_to = Some(Rect::new(i32::MAX - 200, 0, 1000, 500));
    let st = state(size(100, 100), Rect::new(i32::MAX - 150, 100, 100, 100));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: i32::MAX - 150, y: 100 });
}

#[test]
fn custom_display_anchor_and_offset() {
    let second = DisplayInfo {
        id: 2,
        bounds: Rect::new(1920, 0, 2560, 1440),
    };
    let props = WindowPositionProps::new(
        PositionSpec {
            horizontal: AxisAnchor::on_display(second),
            vertical: AxisAnchor::new(Anchor::Display),
        },
        OffsetSpec {
            horizontal: vec![Offset {
                unit: Unit::DisplaySize,
                value: 0.5,
                relative_to_custom_display: Some(second),
            }],
            vertical: vec![Offset::new(Unit::DisplaySize, 0.5)],
        },
    );
    let st = state(size(100, 100), Rect::new(100, 100, 300, 300));
    let pos = resolve_position(&props, &st).unwrap();
    assert_eq!(pos, Point { x: 1920 + 1280, y: 540 });
}

#[test]
fn reference_element_is_scaled_by_parent_zoom() {
    let mut parent = parent_at(Rect::new(100, 100, 800, 600));
    parent.state.zoom_factor = 2.0;
    let st = PositionState::new(size(100, 50), parent).with_reference(ReferenceElement {
        owner: FrameId::from("main_window"),
        client_rect: ClientRect {
            x: 10.25,
            y: 20.0,
            width: 50.0,
            height: 30.0,
        },
    });
    let props = WindowPositionProps::new(
        PositionSpec::uniform(Anchor::ReferenceElement),
        OffsetSpec {
            horizontal: vec![],
            vertical: vec![Offset::new(Unit::ReferenceElementSize, 1.0)],
        },
    );
    let pos = resolve_position(&props, &st).unwrap();
    // x = 100 + 10.25 * 2 = 120.5, rounded
    assert_eq!(pos, Point { x: 121, y: 100 + 40 + 60 });
}

#[test]
fn reference_anchor_without_element_is_a_usage_error() {
    let props = WindowPositionProps::new(
        PositionSpec::uniform(Anchor::ReferenceElement),
        OffsetSpec::default(),
    );
    let st = state(size(100, 100), Rect::new(100, 100, 300, 300));
    let err = resolve_position(&props, &st).unwrap_err();
    assert_eq!(
        err,
        LayoutError::MissingReferenceElement { context: "anchor" }
    );
}

#[test]
fn reference_offset_without_element_is_a_usage_error() {
    let props = WindowPositionProps::new(
        PositionSpec::uniform(Anchor::ParentWindow),
        OffsetSpec {
            horizontal: vec![Offset::new(Unit::ReferenceElementSize, 1.0)],
            vertical: vec![],
        },
    );
    let st = state(size(100, 100), Rect::new(100, 100, 300, 300));
    let err = resolve_position(&props, &st).unwrap_err();
    assert_eq!(
        err,
        LayoutError::MissingReferenceElement { context: "offset" }
    );
}

#[test]
fn element_from_another_window_is_rejected() {
    let st = state(size(100, 100), Rect::new(100, 100, 300, 300)).with_reference(
        ReferenceElement {
            owner: FrameId::from("tooltip_window"),
            client_rect: ClientRect::default(),
        },
    );
    let props = WindowPositionProps::new(
        PositionSpec::uniform(Anchor::ReferenceElement),
        OffsetSpec::default(),
    );
    let err = resolve_position(&props, &st).unwrap_err();
    assert!(matches!(err, LayoutError::ForeignReferenceElement { .. }));
}

#[test]
fn unused_reference_element_is_not_checked() {
    let st = state(size(100, 100), Rect::new(100, 100, 300, 300)).with_reference(
        ReferenceElement {
            owner: FrameId::from("tooltip_window"),
            client_rect: ClientRect::default(),
        },
    );
    assert!(resolve_position(&at_parent(), &st).is_ok());
}
