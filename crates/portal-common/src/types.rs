use serde::{Deserialize, Serialize};
use std::fmt;

/// Screen-space rectangle in host display coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Far edges are widened to `i64`; `x + width` may not fit an `i32`.
    pub fn right(&self) -> i64 {
        i64::from(self.x) + i64::from(self.width)
    }

    pub fn bottom(&self) -> i64 {
        i64::from(self.y) + i64::from(self.height)
    }

    pub fn size(&self) -> Size {
        Size {
            width: self.width,
            height: self.height,
        }
    }

    /// Saturates at the `i32` range for rectangles reaching past it.
    pub fn center(&self) -> Point {
        Point {
            x: saturate(i64::from(self.x) + i64::from(self.width / 2)),
            y: saturate(i64::from(self.y) + i64::from(self.height / 2)),
        }
    }

    pub fn contains(&self, point: Point) -> bool {
        let (px, py) = (i64::from(point.x), i64::from(point.y));
        point.x >= self.x && px < self.right() && point.y >= self.y && py < self.bottom()
    }
}

fn saturate(value: i64) -> i32 {
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

/// Rectangle with any subset of its fields set, e.g. a resize that
/// leaves the position alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<i32>,
}

impl RectPatch {
    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none() && self.width.is_none() && self.height.is_none()
    }

    /// Fills absent fields from `base`.
    pub fn resolve(&self, base: Rect) -> Rect {
        Rect {
            x: self.x.unwrap_or(base.x),
            y: self.y.unwrap_or(base.y),
            width: self.width.unwrap_or(base.width),
            height: self.height.unwrap_or(base.height),
        }
    }
}

impl From<Rect> for RectPatch {
    fn from(r: Rect) -> Self {
        Self {
            x: Some(r.x),
            y: Some(r.y),
            width: Some(r.width),
            height: Some(r.height),
        }
    }
}

/// One physical display as reported by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DisplayInfo {
    pub id: u32,
    pub bounds: Rect,
}

/// Stable logical identifier of one window instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(String);

impl FrameId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FrameId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FrameId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Last known state of a tracked window.
///
/// Fields are only ever written together, either from a complete host
/// report or by merging a [`WindowInfoPatch`] into an existing record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    pub bounds: Rect,
    pub display: DisplayInfo,
    pub zoom_factor: f64,
    pub focused: bool,
    pub media_source_id: String,
}

/// Partial view of a [`WindowState`]; `None` means "not reported".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfoPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Rect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<DisplayInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focused: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_source_id: Option<String>,
}

impl WindowInfoPatch {
    /// True when every field present in the patch already equals the
    /// corresponding field of `state`.
    pub fn is_contained_in(&self, state: &WindowState) -> bool {
        self.bounds.map_or(true, |b| b == state.bounds)
            && self.display.map_or(true, |d| d == state.display)
            && self.zoom_factor.map_or(true, |z| z == state.zoom_factor)
            && self.focused.map_or(true, |f| f == state.focused)
            && self
                .media_source_id
                .as_ref()
                .map_or(true, |m| *m == state.media_source_id)
    }

    /// Shallow merge: every present field overwrites the state's field.
    pub fn apply_to(&self, state: &mut WindowState) {
        if let Some(bounds) = self.bounds {
            state.bounds = bounds;
        }
        if let Some(display) = self.display {
            state.display = display;
        }
        if let Some(zoom) = self.zoom_factor {
            state.zoom_factor = zoom;
        }
        if let Some(focused) = self.focused {
            state.focused = focused;
        }
        if let Some(media) = &self.media_source_id {
            state.media_source_id = media.clone();
        }
    }

    /// Builds a full state when every field is present.
    pub fn to_state(&self) -> Option<WindowState> {
        Some(WindowState {
            bounds: self.bounds?,
            display: self.display?,
            zoom_factor: self.zoom_factor?,
            focused: self.focused?,
            media_source_id: self.media_source_id.clone()?,
        })
    }
}

impl From<WindowState> for WindowInfoPatch {
    fn from(state: WindowState) -> Self {
        Self {
            bounds: Some(state.bounds),
            display: Some(state.display),
            zoom_factor: Some(state.zoom_factor),
            focused: Some(state.focused),
            media_source_id: Some(state.media_source_id),
        }
    }
}
