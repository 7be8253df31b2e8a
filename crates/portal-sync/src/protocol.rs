//! Wire protocol between the render process and the window host.
//!
//! Every message rides on a [`Topic`]. Requests flow render -> host,
//! updates flow host -> render, and `SetWindowInfo` carries property
//! changes from the render side to a single native window. On the wire a
//! message is `{"topic": "<snake_case>", "payload": {...}}`; topics
//! without a payload omit the key.

use std::fmt;

use portal_common::{DisplayInfo, FrameId, Point, RectPatch, Size, SyncError, WindowState};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Topics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Render side asks for a window's current state.
    RequestWindowInfo,
    /// Host reports a window's state, usually because the user moved it.
    UpdateWindowInfo,
    /// Render side changes window properties.
    SetWindowInfo,
    UpdateDisplayInfo,
    RequestDisplayInfo,
    UpdateMouseInfo,
    RequestMouseInfo,
    UpdateSystemInfo,
    RequestSystemInfo,
    /// The window was hidden to allow overlaying and may be shown again.
    FinishedOverlaying,
}

impl Topic {
    pub const ALL: [Topic; 10] = [
        Topic::RequestWindowInfo,
        Topic::UpdateWindowInfo,
        Topic::SetWindowInfo,
        Topic::UpdateDisplayInfo,
        Topic::RequestDisplayInfo,
        Topic::UpdateMouseInfo,
        Topic::RequestMouseInfo,
        Topic::UpdateSystemInfo,
        Topic::RequestSystemInfo,
        Topic::FinishedOverlaying,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::RequestWindowInfo => "request_window_info",
            Topic::UpdateWindowInfo => "update_window_info",
            Topic::SetWindowInfo => "set_window_info",
            Topic::UpdateDisplayInfo => "update_display_info",
            Topic::RequestDisplayInfo => "request_display_info",
            Topic::UpdateMouseInfo => "update_mouse_info",
            Topic::RequestMouseInfo => "request_mouse_info",
            Topic::UpdateSystemInfo => "update_system_info",
            Topic::RequestSystemInfo => "request_system_info",
            Topic::FinishedOverlaying => "finished_overlaying",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfoRequest {
    pub frame_id: FrameId,
}

/// Complete state of one window as measured by the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfoUpdate {
    pub frame_id: FrameId,
    #[serde(flatten)]
    pub state: WindowState,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Visibility {
    pub show: bool,
    /// Take focus when showing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<bool>,
    /// Show, then give focus back.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blur: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverlayLevel {
    Normal,
    Floating,
    TornOffMenu,
    ModalPanel,
    MainMenu,
    Status,
    PopUpMenu,
    ScreenSaver,
}

/// Lets a window float above fullscreen applications.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<OverlayLevel>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative_level: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreenable: Option<bool>,
}

/// Property changes for one window. Only the keys that are present are
/// applied; absent keys are left alone and omitted on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowInfoSet {
    pub frame_id: FrameId,
    /// Evaluated at most once per host window lifetime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub once_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounds: Option<RectPatch>,
    /// Animate the `bounds` change where the platform supports it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animate: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size: Option<Size>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay: Option<OverlayProps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shadow: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_mouse_events: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resizable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focusable: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub always_on_top: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_throttling: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skip_taskbar: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fullscreen: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
}

impl WindowInfoSet {
    pub fn bounds(bounds: RectPatch) -> Self {
        Self {
            bounds: Some(bounds),
            ..Default::default()
        }
    }

    pub fn visibility(show: bool) -> Self {
        Self {
            visibility: Some(Visibility {
                show,
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayInfoUpdate {
    pub displays: Vec<DisplayInfo>,
    pub primary_display_id: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MouseInfoUpdate {
    pub position: Point,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemInfoUpdate {
    pub do_not_disturb_enabled: bool,
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload", rename_all = "snake_case")]
pub enum Message {
    RequestWindowInfo(WindowInfoRequest),
    UpdateWindowInfo(WindowInfoUpdate),
    SetWindowInfo(WindowInfoSet),
    UpdateDisplayInfo(DisplayInfoUpdate),
    RequestDisplayInfo,
    UpdateMouseInfo(MouseInfoUpdate),
    RequestMouseInfo,
    UpdateSystemInfo(SystemInfoUpdate),
    RequestSystemInfo,
    FinishedOverlaying,
}

impl Message {
    pub fn topic(&self) -> Topic {
        match self {
            Message::RequestWindowInfo(_) => Topic::RequestWindowInfo,
            Message::UpdateWindowInfo(_) => Topic::UpdateWindowInfo,
            Message::SetWindowInfo(_) => Topic::SetWindowInfo,
            Message::UpdateDisplayInfo(_) => Topic::UpdateDisplayInfo,
            Message::RequestDisplayInfo => Topic::RequestDisplayInfo,
            Message::UpdateMouseInfo(_) => Topic::UpdateMouseInfo,
            Message::RequestMouseInfo => Topic::RequestMouseInfo,
            Message::UpdateSystemInfo(_) => Topic::UpdateSystemInfo,
            Message::RequestSystemInfo => Topic::RequestSystemInfo,
            Message::FinishedOverlaying => Topic::FinishedOverlaying,
        }
    }

    /// The window a per-window message is addressed to.
    pub fn frame_id(&self) -> Option<&FrameId> {
        match self {
            Message::RequestWindowInfo(m) => Some(&m.frame_id),
            Message::UpdateWindowInfo(m) => Some(&m.frame_id),
            Message::SetWindowInfo(m) => Some(&m.frame_id),
            _ => None,
        }
    }

    pub fn request_window_info(frame_id: FrameId) -> Self {
        Message::RequestWindowInfo(WindowInfoRequest { frame_id })
    }

    pub fn to_json(&self) -> Result<String, SyncError> {
        serde_json::to_string(self).map_err(|e| SyncError::Decode(e.to_string()))
    }

    pub fn from_json(raw: &str) -> Result<Self, SyncError> {
        serde_json::from_str(raw).map_err(|e| SyncError::Decode(e.to_string()))
    }
}
