//! Bounds checking against an outer rectangle.

use portal_common::{Rect, RectPatch, Size};

/// Which axes currently protrude past the outer rectangle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutOfBounds {
    pub horizontal: bool,
    pub vertical: bool,
}

impl OutOfBounds {
    pub fn any(&self) -> bool {
        self.horizontal || self.vertical
    }
}

/// How far each edge of a window sticks out of the outer rectangle.
///
/// Positive values are protrusions; zero or negative means the edge is
/// inside.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundsExcess {
    pub near_x: f64,
    pub far_x: f64,
    pub near_y: f64,
    pub far_y: f64,
}

impl BoundsExcess {
    pub fn check(x: f64, y: f64, size: Size, outer: Rect) -> Self {
        Self {
            far_x: x + f64::from(size.width) - (f64::from(outer.x) + f64::from(outer.width)),
            near_x: f64::from(outer.x) - x,
            far_y: y + f64::from(size.height) - (f64::from(outer.y) + f64::from(outer.height)),
            near_y: f64::from(outer.y) - y,
        }
    }

    pub fn out_of_bounds(&self) -> OutOfBounds {
        OutOfBounds {
            horizontal: self.near_x > 0.0 || self.far_x > 0.0,
            vertical: self.near_y > 0.0 || self.far_y > 0.0,
        }
    }

    pub fn is_out_of_bounds(&self) -> bool {
        self.out_of_bounds().any()
    }

    /// Shift `(x, y)` so every protruding edge moves back by its excess.
    /// Axes are corrected independently.
    pub fn subtract_from(&self, x: f64, y: f64) -> (f64, f64) {
        let mut x = x;
        let mut y = y;
        if self.far_x > 0.0 {
            x -= self.far_x;
        }
        if self.near_x > 0.0 {
            x += self.near_x;
        }
        if self.far_y > 0.0 {
            y -= self.far_y;
        }
        if self.near_y > 0.0 {
            y += self.near_y;
        }
        (x, y)
    }
}

/// Shrink a window that is larger than the display and push its origin
/// onto the display. Returns `None` when nothing needs to change.
pub fn fit_window_in_bounds(window: Rect, display: Rect) -> Option<RectPatch> {
    let mut patch = RectPatch::default();
    if window.width > display.width {
        patch.width = Some(display.width);
    }
    if window.height > display.height {
        patch.height = Some(display.height);
    }
    if window.x < display.x {
        patch.x = Some(display.x);
    }
    if window.y < display.y {
        patch.y = Some(display.y);
    }
    (!patch.is_empty()).then_some(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DISPLAY: Rect = Rect::new(0, 0, 1920, 1080);

    fn size(width: i32, height: i32) -> Size {
        Size { width, height }
    }

    #[test]
    fn inside_is_not_out_of_bounds() {
        let excess = BoundsExcess::check(100.0, 100.0, size(200, 200), DISPLAY);
        assert!(!excess.is_out_of_bounds());
        assert_eq!(excess.near_x, -100.0);
        assert_eq!(excess.far_x, 100.0 + 200.0 - 1920.0);
    }

    #[test]
    fn touching_the_edge_is_in_bounds() {
        let excess = BoundsExcess::check(1720.0, 880.0, size(200, 200), DISPLAY);
        assert_eq!(excess.far_x, 0.0);
        assert_eq!(excess.far_y, 0.0);
        assert!(!excess.is_out_of_bounds());
    }

    #[test]
    fn far_edge_overflow_is_horizontal_only() {
        let excess = BoundsExcess::check(1750.0, 100.0, size(200, 200), DISPLAY);
        assert_eq!(excess.far_x, 30.0);
        assert_eq!(
            excess.out_of_bounds(),
            OutOfBounds {
                horizontal: true,
                vertical: false
            }
        );
    }

    #[test]
    fn display_reaching_past_i32_max_is_measured_in_f64() {
        let outer = Rect::new(i32::MAX - 100, i32::MAX - 100, 1000, 1000);
        let x = f64::from(i32::MAX) - 50.0;
        let excess = BoundsExcess::check(x, x, size(200, 200), outer);
        assert_eq!(excess.far_x, -750.0);
        assert_eq!(excess.far_y, -750.0);
        assert_eq!(excess.near_x, -50.0);
        assert!(!excess.is_out_of_bounds());
    }

    #[test]
    fn subtract_pulls_each_edge_back() {
        let excess = BoundsExcess::check(-40.0, 1000.0, size(200, 200), DISPLAY);
        let (x, y) = excess.subtract_from(-40.0, 1000.0);
        assert_eq!(x, 0.0);
        assert_eq!(y, 880.0);
    }

    #[test]
    fn fit_window_shrinks_and_moves() {
        let patch = fit_window_in_bounds(Rect::new(-10, 20, 2500, 500), DISPLAY).unwrap();
        assert_eq!(patch.width, Some(1920));
        assert_eq!(patch.height, None);
        assert_eq!(patch.x, Some(0));
        assert_eq!(patch.y, None);
    }

    #[test]
    fn fit_window_noop_when_inside() {
        assert!(fit_window_in_bounds(Rect::new(10, 10, 300, 300), DISPLAY).is_none());
    }
}
