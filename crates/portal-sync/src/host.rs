//! Host-side counterparts of the render store.
//!
//! A host adapter implements [`WindowController`] for its native window
//! type and [`SystemProbe`] for screen/cursor queries, then feeds every
//! message drained from a window's endpoint to that window's
//! [`HostWindowListener`] and to the shared [`HostInfoResponder`].

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use portal_common::{DisplayInfo, FrameId, Point, Rect, RectPatch, Size, WindowState};
use tracing::{debug, trace};

use crate::debounce::{DebouncePolicy, Debouncer};
use crate::local::HostEmitter;
use crate::lock;
use crate::protocol::{
    DisplayInfoUpdate, Message, MouseInfoUpdate, OverlayProps, SystemInfoUpdate, Visibility,
    WindowInfoSet, WindowInfoUpdate,
};

const FINISHED_OVERLAYING_ID: &str = "finished-overlaying";

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// A native window the host can measure and change.
///
/// Only the getters are required; every setter defaults to doing nothing
/// so adapters implement what their platform supports.
#[allow(unused_variables)]
pub trait WindowController: Send {
    fn bounds(&self) -> Rect;
    fn zoom_factor(&self) -> f64;
    fn is_focused(&self) -> bool;
    fn media_source_id(&self) -> String;

    fn set_bounds(&mut self, bounds: RectPatch, animate: bool) {}
    fn set_min_size(&mut self, size: Size) {}
    fn set_max_size(&mut self, size: Size) {}
    /// Show and take focus.
    fn show(&mut self) {}
    fn show_inactive(&mut self) {}
    fn hide(&mut self) {}
    fn blur(&mut self) {}
    fn set_overlay(&mut self, props: &OverlayProps) {}
    fn set_shadow(&mut self, shadow: bool) {}
    fn set_ignore_mouse_events(&mut self, ignore: bool) {}
    fn set_resizable(&mut self, resizable: bool) {}
    fn set_focusable(&mut self, focusable: bool) {}
    fn set_always_on_top(&mut self, on_top: bool) {}
    fn set_background_throttling(&mut self, allowed: bool) {}
    fn set_opacity(&mut self, opacity: f64) {}
    fn set_title(&mut self, title: &str) {}
    fn set_skip_taskbar(&mut self, skip: bool) {}
    fn set_fullscreen(&mut self, fullscreen: bool) {}
    fn set_zoom(&mut self, zoom: f64) {}
}

/// Screen and system queries.
pub trait SystemProbe: Send + Sync {
    fn displays(&self) -> Vec<DisplayInfo>;
    fn primary_display_id(&self) -> u32;
    fn cursor_position(&self) -> Point;

    fn do_not_disturb(&self) -> bool {
        false
    }

    /// The display containing `point`, or the one whose bounds are closest
    /// to it.
    fn display_nearest(&self, point: Point) -> Option<DisplayInfo> {
        nearest_display(&self.displays(), point)
    }
}

pub fn nearest_display(displays: &[DisplayInfo], point: Point) -> Option<DisplayInfo> {
    if let Some(d) = displays.iter().find(|d| d.bounds.contains(point)) {
        return Some(*d);
    }
    displays
        .iter()
        .min_by_key(|d| {
            let dx = axis_distance(point.x.into(), d.bounds.x.into(), d.bounds.right());
            let dy = axis_distance(point.y.into(), d.bounds.y.into(), d.bounds.bottom());
            i128::from(dx) * i128::from(dx) + i128::from(dy) * i128::from(dy)
        })
        .copied()
}

fn axis_distance(value: i64, start: i64, end: i64) -> i64 {
    if value < start {
        start - value
    } else if value >= end {
        value - end + 1
    } else {
        0
    }
}

// ---------------------------------------------------------------------------
// Per-window listener
// ---------------------------------------------------------------------------

/// Services the render store for one native window.
pub struct HostWindowListener<C, P> {
    frame_id: FrameId,
    controller: C,
    probe: Arc<P>,
    receiver: HostEmitter,
    /// Tracker plus the emitter of the tracked window itself.
    overlay: Option<(OverlayTracker, HostEmitter)>,
    evaluated_once: HashSet<String>,
    shown: bool,
}

impl<C: WindowController, P: SystemProbe> HostWindowListener<C, P> {
    /// `receiver` is the window whose render side holds the store; it is
    /// often, but not necessarily, the tracked window itself.
    pub fn new(frame_id: FrameId, controller: C, probe: Arc<P>, receiver: HostEmitter) -> Self {
        Self {
            frame_id,
            controller,
            probe,
            receiver,
            overlay: None,
            evaluated_once: HashSet::new(),
            shown: false,
        }
    }

    /// Report overlay requests to `tracker`. `window` reaches the tracked
    /// window's own render side, which is told when overlaying is over.
    pub fn with_overlay_tracker(mut self, tracker: OverlayTracker, window: HostEmitter) -> Self {
        self.overlay = Some((tracker, window));
        self
    }

    pub fn frame_id(&self) -> &FrameId {
        &self.frame_id
    }

    pub fn controller(&self) -> &C {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut C {
        &mut self.controller
    }

    /// Whether the last visibility request asked for the window to be
    /// shown.
    pub fn is_shown(&self) -> bool {
        self.shown
    }

    /// Current state of the tracked window.
    pub fn snapshot(&self) -> WindowInfoUpdate {
        let bounds = self.controller.bounds();
        let display = self
            .probe
            .display_nearest(bounds.center())
            .unwrap_or(DisplayInfo { id: 0, bounds });
        WindowInfoUpdate {
            frame_id: self.frame_id.clone(),
            state: WindowState {
                bounds,
                display,
                zoom_factor: self.controller.zoom_factor(),
                focused: self.controller.is_focused(),
                media_source_id: self.controller.media_source_id(),
            },
        }
    }

    /// Handle one message from the receiving window. Messages for other
    /// frames are ignored; returns whether this listener acted on it.
    pub fn handle(&mut self, message: &Message) -> bool {
        if message.frame_id() != Some(&self.frame_id) {
            return false;
        }
        match message {
            Message::RequestWindowInfo(_) => {
                self.send_info();
                true
            }
            Message::SetWindowInfo(set) => self.apply(set),
            _ => false,
        }
    }

    /// Report a change the host caused on its own (move, resize, focus,
    /// blur, zoom, content ready).
    pub fn notify_changed(&self) {
        self.send_info();
    }

    fn send_info(&self) {
        if self.receiver.is_closed() {
            debug!(frame_id = %self.frame_id, "receiving window destroyed, info not sent");
            return;
        }
        self.receiver.emit(Message::UpdateWindowInfo(self.snapshot()));
        trace!(frame_id = %self.frame_id, "sent window info");
    }

    fn apply(&mut self, set: &WindowInfoSet) -> bool {
        if let Some(once_id) = &set.once_id {
            if !self.evaluated_once.insert(once_id.clone()) {
                debug!(frame_id = %self.frame_id, once_id = %once_id, "skipping once message");
                return false;
            }
            debug!(frame_id = %self.frame_id, once_id = %once_id, "evaluating once message");
        }

        let c = &mut self.controller;
        if let Some(bounds) = set.bounds {
            c.set_bounds(bounds, set.animate.unwrap_or(false));
        }
        if let Some(size) = set.min_size {
            c.set_min_size(size);
        }
        if let Some(size) = set.max_size {
            c.set_max_size(size);
        }
        if let Some(visibility) = set.visibility {
            self.shown = visibility.show;
            apply_visibility(c, visibility);
        }
        if let Some(props) = &set.overlay {
            c.set_overlay(props);
            if let Some((tracker, window)) = &self.overlay {
                tracker.allow_overlaying(window.clone());
            }
            c.show_inactive();
            c.hide();
        }
        if let Some(shadow) = set.shadow {
            c.set_shadow(shadow);
        }
        if let Some(ignore) = set.ignore_mouse_events {
            c.set_ignore_mouse_events(ignore);
        }
        if let Some(resizable) = set.resizable {
            c.set_resizable(resizable);
        }
        if let Some(focusable) = set.focusable {
            c.set_focusable(focusable);
        }
        if let Some(on_top) = set.always_on_top {
            c.set_always_on_top(on_top);
        }
        if let Some(allowed) = set.background_throttling {
            c.set_background_throttling(allowed);
        }
        if let Some(opacity) = set.opacity {
            c.set_opacity(opacity);
        }
        if let Some(title) = &set.title {
            c.set_title(title);
        }
        if let Some(skip) = set.skip_taskbar {
            c.set_skip_taskbar(skip);
        }
        if let Some(fullscreen) = set.fullscreen {
            c.set_fullscreen(fullscreen);
        }
        if let Some(zoom) = set.zoom {
            c.set_zoom(zoom);
        }
        true
    }
}

fn apply_visibility<C: WindowController>(c: &mut C, visibility: Visibility) {
    if !visibility.show {
        c.hide();
    } else if visibility.focus.unwrap_or(false) {
        c.show();
    } else if visibility.blur.unwrap_or(false) {
        c.blur();
    } else {
        c.show_inactive();
    }
}

// ---------------------------------------------------------------------------
// Display / mouse / system responder
// ---------------------------------------------------------------------------

/// Answers the window-independent requests of one store window.
pub struct HostInfoResponder<P> {
    probe: Arc<P>,
    receiver: HostEmitter,
}

impl<P: SystemProbe> HostInfoResponder<P> {
    pub fn new(probe: Arc<P>, receiver: HostEmitter) -> Self {
        Self { probe, receiver }
    }

    /// Returns whether `message` was a request this responder serves.
    pub fn handle(&self, message: &Message) -> bool {
        match message {
            Message::RequestDisplayInfo => self.push_display_info(),
            Message::RequestMouseInfo => self.push_mouse_info(),
            Message::RequestSystemInfo => self.push_system_info(),
            _ => return false,
        }
        true
    }

    /// Send the current display layout, e.g. after a display was added,
    /// removed or rescaled.
    pub fn push_display_info(&self) {
        self.send(Message::UpdateDisplayInfo(DisplayInfoUpdate {
            displays: self.probe.displays(),
            primary_display_id: self.probe.primary_display_id(),
        }));
    }

    pub fn push_mouse_info(&self) {
        self.send(Message::UpdateMouseInfo(MouseInfoUpdate {
            position: self.probe.cursor_position(),
        }));
    }

    /// Send the system state, e.g. after do-not-disturb was toggled.
    pub fn push_system_info(&self) {
        self.send(Message::UpdateSystemInfo(SystemInfoUpdate {
            do_not_disturb_enabled: self.probe.do_not_disturb(),
        }));
    }

    fn send(&self, message: Message) {
        if self.receiver.is_closed() {
            debug!(topic = %message.topic(), "store window destroyed, info not sent");
            return;
        }
        trace!(topic = %message.topic(), "sent host info");
        self.receiver.emit(message);
    }
}

// ---------------------------------------------------------------------------
// Overlaying
// ---------------------------------------------------------------------------

/// Tracks windows that were hidden to become overlay-capable and tells
/// them once overlaying has been quiet for a while.
#[derive(Clone)]
pub struct OverlayTracker {
    debouncer: Debouncer,
    quiet: Duration,
    pending: Arc<Mutex<Vec<HostEmitter>>>,
}

impl OverlayTracker {
    pub fn new(debouncer: Debouncer, quiet: Duration) -> Self {
        Self {
            debouncer,
            quiet,
            pending: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add `window` to the batch and restart the quiet period.
    pub fn allow_overlaying(&self, window: HostEmitter) {
        lock(&self.pending).push(window);
        let pending = Arc::clone(&self.pending);
        self.debouncer.debounce(
            FINISHED_OVERLAYING_ID,
            self.quiet,
            DebouncePolicy::ResetOnNew,
            move || {
                let windows = std::mem::take(&mut *lock(&pending));
                let mut notified = 0;
                for window in windows.iter().filter(|w| !w.is_closed()) {
                    window.emit(Message::FinishedOverlaying);
                    notified += 1;
                }
                debug!(notified, "finished overlaying");
            },
        );
    }

    pub fn pending(&self) -> usize {
        lock(&self.pending).len()
    }
}
