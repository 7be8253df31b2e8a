//! Render-side driver that keeps one portal window sized and positioned.
//!
//! Changes that may move the window (content re-render, parent moved,
//! reference changed) are recorded as [`UpdateReasons`] and coalesced
//! through a `QueueLast` debounce. Each pass measures the content,
//! resolves the declared position against the store's latest geometry
//! and sends the rounded bounds to the host.

use std::sync::{Arc, Mutex, Weak};

use portal_common::{once_id_for, FrameId, RectPatch, Size, SyncError};
use portal_layout::{
    fit_window_in_bounds, resolve_position, FrameState, PositionState, ReferenceElement,
    WindowPositionProps,
};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use crate::bridge::{ListenerId, SharedBridge};
use crate::debounce::{DebouncePolicy, Debouncer};
use crate::lock;
use crate::protocol::{Message, Topic, Visibility, WindowInfoSet};
use crate::store::WindowStore;

/// Where the window's content comes from.
pub trait ContentSource: Send + Sync {
    /// Rendered size of the content in unzoomed client pixels, or `None`
    /// while nothing is mounted.
    fn content_size(&self) -> Option<Size>;

    /// The element the window is positioned against, if any.
    fn reference_element(&self) -> Option<ReferenceElement> {
        None
    }
}

/// Why a reposition pass was requested. Flags accumulate until a pass
/// handles them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReasons {
    pub dom: bool,
    pub parent_window: bool,
    pub manual_reference: bool,
}

impl UpdateReasons {
    fn merge(&mut self, other: UpdateReasons) {
        self.dom |= other.dom;
        self.parent_window |= other.parent_window;
        self.manual_reference |= other.manual_reference;
    }

    fn clear(&mut self, handled: UpdateReasons) {
        self.dom &= !handled.dom;
        self.parent_window &= !handled.parent_window;
        self.manual_reference &= !handled.manual_reference;
    }
}

/// Static description of a portal window.
#[derive(Debug, Clone)]
pub struct PortalSpec {
    pub frame_id: FrameId,
    pub parent_frame_id: FrameId,
    pub position: WindowPositionProps,
    /// Resize the window to its content whenever the content changes.
    pub auto_resize: bool,
    /// Reposition whenever the parent moves or the window is resized.
    pub auto_reposition: bool,
    /// Reposition once, right after the first content update.
    pub initially_reposition: bool,
    pub take_focus: bool,
    /// Sent once per host window lifetime when the window opens.
    pub initial_message: WindowInfoSet,
}

impl PortalSpec {
    pub fn new(frame_id: FrameId, parent_frame_id: FrameId, position: WindowPositionProps) -> Self {
        Self {
            frame_id,
            parent_frame_id,
            position,
            auto_resize: true,
            auto_reposition: true,
            initially_reposition: true,
            take_focus: false,
            initial_message: WindowInfoSet::default(),
        }
    }
}

struct PortalInner {
    spec: PortalSpec,
    position: Mutex<WindowPositionProps>,
    store: WindowStore,
    bridge: SharedBridge,
    debouncer: Debouncer,
    content: Arc<dyn ContentSource>,
    queued: Mutex<UpdateReasons>,
    first_dom_update: Mutex<Option<Instant>>,
    overlay_listener: Mutex<Option<ListenerId>>,
    tasks: Mutex<Vec<JoinHandle<()>>>,
    update_id: String,
    first_show_id: String,
}

#[derive(Clone)]
pub struct PortalWindow {
    inner: Arc<PortalInner>,
}

impl PortalWindow {
    /// Start driving the window behind `bridge`.
    ///
    /// Subscribes the window in the store, pings it, then sends the
    /// initial message (whether or not the ping succeeded). The first
    /// show is scheduled after a short delay so content can mount.
    pub fn open(
        store: &WindowStore,
        debouncer: &Debouncer,
        bridge: SharedBridge,
        spec: PortalSpec,
        content: Arc<dyn ContentSource>,
    ) -> Result<Self, SyncError> {
        if bridge.is_closed() {
            warn!(frame_id = %spec.frame_id, "portal window is already closed");
            return Err(SyncError::WindowClosed(spec.frame_id));
        }

        info!(frame_id = %spec.frame_id, parent = %spec.parent_frame_id, "opening portal window");
        let inner = Arc::new(PortalInner {
            position: Mutex::new(spec.position.clone()),
            update_id: format!("portal-update:{}", spec.frame_id),
            first_show_id: format!("portal-first-show:{}", spec.frame_id),
            spec,
            store: store.clone(),
            bridge,
            debouncer: debouncer.clone(),
            content,
            queued: Mutex::new(UpdateReasons::default()),
            first_dom_update: Mutex::new(None),
            overlay_listener: Mutex::new(None),
            tasks: Mutex::new(Vec::new()),
        });
        let portal = PortalWindow { inner };

        drop(store.subscribe_window(
            portal.frame_id().clone(),
            Arc::clone(&portal.inner.bridge),
            false,
        ));
        portal.spawn(handshake(Arc::clone(&portal.inner)));
        portal.spawn(watch_geometry(Arc::downgrade(&portal.inner)));
        portal.listen_for_overlay_end();
        portal.schedule_first_show();
        Ok(portal)
    }

    pub fn frame_id(&self) -> &FrameId {
        &self.inner.spec.frame_id
    }

    /// Content re-rendered or resized.
    pub fn notify_content_changed(&self) {
        self.request_update(UpdateReasons {
            dom: true,
            ..Default::default()
        });
    }

    /// The reference element or display changed outside the store's view.
    pub fn notify_reference_changed(&self) {
        self.request_update(UpdateReasons {
            manual_reference: true,
            ..Default::default()
        });
    }

    /// Replace the declared position and reposition.
    pub fn set_position(&self, position: WindowPositionProps) {
        *lock(&self.inner.position) = position;
        self.notify_reference_changed();
    }

    pub fn request_update(&self, reasons: UpdateReasons) {
        request_update(&self.inner, reasons);
    }

    pub fn show(&self, reason: &str) {
        show(&self.inner, reason);
    }

    /// Shrink the window to its display and move its origin onto it.
    /// Returns `true` when corrected bounds were sent.
    pub fn fit_to_display(&self) -> bool {
        let inner = &self.inner;
        let Some(window) = inner.store.window_info(&inner.spec.frame_id) else {
            trace!(frame_id = %inner.spec.frame_id, "window geometry not known yet");
            return false;
        };
        let Some(patch) = fit_window_in_bounds(window.bounds, window.display.bounds) else {
            return false;
        };
        debug!(frame_id = %inner.spec.frame_id, ?patch, "fitting window to its display");
        inner
            .store
            .set_window_info(inner.spec.frame_id.clone(), WindowInfoSet::bounds(patch))
    }

    /// Cancel a pending first show and hide the window.
    pub fn hide(&self) {
        let inner = &self.inner;
        inner.debouncer.clear_debounce(&inner.first_show_id);
        debug!(frame_id = %inner.spec.frame_id, "hiding portal window");
        inner
            .store
            .set_window_info(inner.spec.frame_id.clone(), WindowInfoSet::visibility(false));
    }

    /// Hide the window and stop every background activity for it.
    pub fn close(&self) {
        self.hide();
        let inner = &self.inner;
        inner.debouncer.clear_debounce(&inner.update_id);
        if let Some(id) = lock(&inner.overlay_listener).take() {
            inner.bridge.unsubscribe(Topic::FinishedOverlaying, Some(id));
        }
        for task in lock(&inner.tasks).drain(..) {
            task.abort();
        }
    }

    fn spawn<F>(&self, future: F)
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        lock(&self.inner.tasks).push(tokio::spawn(future));
    }

    fn listen_for_overlay_end(&self) {
        let weak = Arc::downgrade(&self.inner);
        let id = self.inner.bridge.subscribe(
            Topic::FinishedOverlaying,
            Arc::new(move |_: &Message| {
                if let Some(inner) = weak.upgrade() {
                    show(&inner, "after overlaying hid this window");
                }
            }),
        );
        *lock(&self.inner.overlay_listener) = Some(id);
    }

    fn schedule_first_show(&self) {
        let weak = Arc::downgrade(&self.inner);
        self.inner.debouncer.debounce(
            &self.inner.first_show_id,
            self.inner.store.timings().first_show_wait,
            DebouncePolicy::ResetOnNew,
            move || {
                if let Some(inner) = weak.upgrade() {
                    show(&inner, "after initial delay");
                }
            },
        );
    }
}

// ---------------------------------------------------------------------------
// Background tasks
// ---------------------------------------------------------------------------

async fn handshake(inner: Arc<PortalInner>) {
    let frame_id = inner.spec.frame_id.clone();
    if let Err(e) = inner.store.ping_window(&frame_id).await {
        debug!(frame_id = %frame_id, error = %e, "ping failed, sending initial message anyway");
    }

    let mut message = WindowInfoSet {
        frame_id: frame_id.clone(),
        zoom: Some(1.0),
        ..inner.spec.initial_message.clone()
    };
    message.once_id = None;
    message.once_id = Some(once_id_for(&message));
    inner.store.set_window_info(frame_id, message);
}

/// Turn store changes into update requests: the parent's state changing
/// repositions, the window's own zoom changing re-measures.
async fn watch_geometry(portal: Weak<PortalInner>) {
    let (mut rx, frame_id, parent_id) = match portal.upgrade() {
        Some(inner) => (
            inner.store.subscribe(),
            inner.spec.frame_id.clone(),
            inner.spec.parent_frame_id.clone(),
        ),
        None => return,
    };
    let observe = |snapshot: &crate::store::StoreSnapshot| {
        (
            snapshot.windows.get(&parent_id).cloned(),
            snapshot.windows.get(&frame_id).map(|w| w.zoom_factor),
        )
    };
    let (mut last_parent, mut last_zoom) = observe(&*rx.borrow_and_update());

    while rx.changed().await.is_ok() {
        let (parent, zoom) = observe(&*rx.borrow_and_update());
        let reasons = UpdateReasons {
            dom: zoom != last_zoom,
            parent_window: parent != last_parent,
            manual_reference: false,
        };
        last_parent = parent;
        last_zoom = zoom;
        if reasons == UpdateReasons::default() {
            continue;
        }

        let Some(inner) = portal.upgrade() else {
            return;
        };
        trace!(frame_id = %inner.spec.frame_id, ?reasons, "geometry changed");
        request_update(&inner, reasons);
    }
}

// ---------------------------------------------------------------------------
// Update pass
// ---------------------------------------------------------------------------

fn request_update(inner: &Arc<PortalInner>, reasons: UpdateReasons) {
    lock(&inner.queued).merge(reasons);
    let weak = Arc::downgrade(inner);
    inner.debouncer.debounce(
        &inner.update_id,
        inner.store.timings().reposition_wait,
        DebouncePolicy::QueueLast,
        move || {
            if let Some(inner) = weak.upgrade() {
                run_update(&inner);
            }
        },
    );
}

fn run_update(inner: &Arc<PortalInner>) {
    let spec = &inner.spec;
    let update = *lock(&inner.queued);
    let snapshot = inner.store.snapshot();
    let window = snapshot.windows.get(&spec.frame_id);
    let parent = snapshot.windows.get(&spec.parent_frame_id);

    let mut update_size = spec.auto_resize && update.dom;
    let mut update_position =
        (spec.auto_reposition && (update.parent_window || update_size)) || update.manual_reference;

    let first_dom_update = *lock(&inner.first_dom_update);
    let mut mark_first_dom_update = false;
    let recent = match first_dom_update {
        None if update.dom => {
            mark_first_dom_update = true;
            true
        }
        None => false,
        Some(at) => at.elapsed() < inner.store.timings().first_dom_settle,
    };
    if recent && window.is_some() && parent.is_some() {
        update_size |= spec.auto_resize;
        update_position |= spec.initially_reposition || spec.auto_reposition;
    }

    if !update_size && !update_position {
        return;
    }
    let (Some(window), Some(parent)) = (window, parent) else {
        trace!(frame_id = %spec.frame_id, "window or parent geometry not known yet");
        return;
    };

    lock(&inner.queued).clear(update);
    debug!(frame_id = %spec.frame_id, ?update, update_size, update_position, "handling updates");

    let mut bounds = RectPatch::default();
    if update_size {
        let Some(content) = inner.content.content_size() else {
            return;
        };
        let zoom = window.zoom_factor;
        let scale = if zoom != 0.0 && zoom != 1.0 { zoom } else { 1.0 };
        bounds.width = Some((f64::from(content.width) * scale).round() as i32);
        bounds.height = Some((f64::from(content.height) * scale).round() as i32);
    }

    if update_position {
        let own_size = Size {
            width: bounds.width.unwrap_or(window.bounds.width),
            height: bounds.height.unwrap_or(window.bounds.height),
        };
        let parent = FrameState {
            frame_id: spec.parent_frame_id.clone(),
            state: parent.clone(),
        };
        let mut state = PositionState::new(own_size, parent);
        if let Some(reference) = inner.content.reference_element() {
            state = state.with_reference(reference);
        }
        let position = lock(&inner.position).clone();
        match resolve_position(&position, &state) {
            Ok(point) => {
                bounds.x = Some(point.x);
                bounds.y = Some(point.y);
            }
            Err(e) => {
                warn!(frame_id = %spec.frame_id, error = %e, "could not resolve position");
                return;
            }
        }
    }

    debug!(frame_id = %spec.frame_id, ?bounds, "setting bounds");
    inner
        .store
        .set_window_info(spec.frame_id.clone(), WindowInfoSet::bounds(bounds));

    if mark_first_dom_update {
        *lock(&inner.first_dom_update) = Some(Instant::now());
        inner.debouncer.clear_debounce(&inner.first_show_id);
        show(inner, "first dom update");
    }
}

fn show(inner: &PortalInner, reason: &str) {
    debug!(frame_id = %inner.spec.frame_id, reason, "showing portal window");
    let message = WindowInfoSet {
        visibility: Some(Visibility {
            show: true,
            focus: Some(inner.spec.take_focus),
            blur: None,
        }),
        ..Default::default()
    };
    inner.store.set_window_info(inner.spec.frame_id.clone(), message);
}

#[cfg(test)]
mod tests;
