//! Render-side registry of window handles and their last known state.
//!
//! The store owns the frame -> bridge map and a [`StoreSnapshot`] that is
//! published through a `tokio::sync::watch` channel. Every mutation that
//! changes the snapshot notifies subscribers; a mutation that leaves it
//! equal does not.

mod ping;


use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, Weak};

use portal_common::{DisplayInfo, FrameId, Point, SyncError, WindowInfoPatch, WindowState};
use portal_config::SyncTimings;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, trace, warn};

use crate::bridge::{Listener, SharedBridge, WindowBridge};
use crate::lock;
use crate::protocol::{
    DisplayInfoUpdate, Message, MouseInfoUpdate, SystemInfoUpdate, Topic, WindowInfoSet,
};

/// Everything the render side currently knows about windows, displays,
/// the cursor and the system.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreSnapshot {
    pub windows: BTreeMap<FrameId, WindowState>,
    pub displays: BTreeMap<u32, DisplayInfo>,
    pub primary_display_id: Option<u32>,
    pub mouse: Option<Point>,
    pub system: Option<SystemInfoUpdate>,
}

/// Addressee of a [`WindowStore::set_window_info`] call.
#[derive(Clone)]
pub enum WindowTarget {
    Frame(FrameId),
    /// A handle; an unnamed handle stands for the root frame.
    Handle(SharedBridge),
}

impl From<FrameId> for WindowTarget {
    fn from(frame_id: FrameId) -> Self {
        WindowTarget::Frame(frame_id)
    }
}

#[derive(Default)]
struct Registry {
    bridges: HashMap<FrameId, SharedBridge>,
    root: Option<FrameId>,
}

struct StoreInner {
    registry: Mutex<Registry>,
    snapshot: watch::Sender<StoreSnapshot>,
    timings: SyncTimings,
}

/// Cheaply cloneable handle to one store.
#[derive(Clone)]
pub struct WindowStore {
    inner: Arc<StoreInner>,
}

impl WindowStore {
    pub fn new(timings: SyncTimings) -> Self {
        let (snapshot, _) = watch::channel(StoreSnapshot::default());
        Self {
            inner: Arc::new(StoreInner {
                registry: Mutex::new(Registry::default()),
                snapshot,
                timings,
            }),
        }
    }

    fn from_inner(inner: Arc<StoreInner>) -> Self {
        Self { inner }
    }

    fn downgrade(&self) -> Weak<StoreInner> {
        Arc::downgrade(&self.inner)
    }

    pub fn timings(&self) -> SyncTimings {
        self.inner.timings
    }

    // -----------------------------------------------------------------------
    // Reactive surface
    // -----------------------------------------------------------------------

    /// Receiver that observes every snapshot change.
    pub fn subscribe(&self) -> watch::Receiver<StoreSnapshot> {
        self.inner.snapshot.subscribe()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.snapshot.borrow().clone()
    }

    pub fn window_info(&self, frame_id: &FrameId) -> Option<WindowState> {
        self.inner.snapshot.borrow().windows.get(frame_id).cloned()
    }

    pub fn display(&self, id: u32) -> Option<DisplayInfo> {
        self.inner.snapshot.borrow().displays.get(&id).copied()
    }

    pub fn primary_display(&self) -> Option<DisplayInfo> {
        let snapshot = self.inner.snapshot.borrow();
        snapshot
            .primary_display_id
            .and_then(|id| snapshot.displays.get(&id).copied())
    }

    pub fn mouse(&self) -> Option<Point> {
        self.inner.snapshot.borrow().mouse
    }

    pub fn system(&self) -> Option<SystemInfoUpdate> {
        self.inner.snapshot.borrow().system
    }

    pub fn root_frame(&self) -> Option<FrameId> {
        lock(&self.inner.registry).root.clone()
    }

    pub fn bridge(&self, frame_id: &FrameId) -> Option<SharedBridge> {
        lock(&self.inner.registry).bridges.get(frame_id).cloned()
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Register the root window and start listening for display, mouse
    /// and system updates on it.
    ///
    /// The returned task completes once the listeners are attached and the
    /// initial requests have been published.
    pub fn init(&self, root: FrameId, bridge: SharedBridge) -> JoinHandle<()> {
        info!(frame_id = %root, "initializing window store");
        lock(&self.inner.registry).root = Some(root.clone());
        drop(self.subscribe_window(root.clone(), Arc::clone(&bridge), false));

        bridge.unsubscribe(Topic::UpdateDisplayInfo, None);
        bridge.unsubscribe(Topic::UpdateMouseInfo, None);
        bridge.unsubscribe(Topic::UpdateSystemInfo, None);

        let store = self.downgrade();
        let grace = self.inner.timings.grace_delay;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if bridge.is_closed() {
                warn!(frame_id = %root, "root window closed before init finished");
                return;
            }

            bridge.subscribe(Topic::UpdateDisplayInfo, store_listener(&store, |s, m| {
                if let Message::UpdateDisplayInfo(update) = m {
                    s.apply_display_info(update);
                }
            }));
            debug!(frame_id = %root, "requesting display info");
            bridge.publish(Message::RequestDisplayInfo);

            bridge.subscribe(Topic::UpdateMouseInfo, store_listener(&store, |s, m| {
                if let Message::UpdateMouseInfo(update) = m {
                    s.apply_mouse_info(update);
                }
            }));
            debug!(frame_id = %root, "requesting mouse info");
            bridge.publish(Message::RequestMouseInfo);

            bridge.subscribe(Topic::UpdateSystemInfo, store_listener(&store, |s, m| {
                if let Message::UpdateSystemInfo(update) = m {
                    s.apply_system_info(update);
                }
            }));
            debug!(frame_id = %root, "requesting system info");
            bridge.publish(Message::RequestSystemInfo);
        })
    }

    /// Track `frame_id` through `bridge`.
    ///
    /// Unless `proxied`, the bridge is registered under `frame_id` and any
    /// stale update listeners on it are dropped right away. After the
    /// grace delay the update listener is attached (again unless
    /// `proxied`) and the current window info is requested. A window that
    /// closed during the delay resolves the task to
    /// [`SyncError::WindowClosed`].
    pub fn subscribe_window(
        &self,
        frame_id: FrameId,
        bridge: SharedBridge,
        proxied: bool,
    ) -> JoinHandle<Result<(), SyncError>> {
        debug!(frame_id = %frame_id, proxied, closed = bridge.is_closed(), "subscribing window");

        if !proxied {
            lock(&self.inner.registry)
                .bridges
                .insert(frame_id.clone(), Arc::clone(&bridge));
            bridge.unsubscribe(Topic::UpdateWindowInfo, None);
        }

        let store = self.downgrade();
        let grace = self.inner.timings.grace_delay;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if bridge.is_closed() {
                warn!(frame_id = %frame_id, "window closed during subscribe");
                return Err(SyncError::WindowClosed(frame_id));
            }

            if !proxied {
                bridge.subscribe(Topic::UpdateWindowInfo, store_listener(&store, |s, m| {
                    if let Message::UpdateWindowInfo(update) = m {
                        let patch = WindowInfoPatch::from(update.state.clone());
                        if s.update_window_info(&update.frame_id, patch) {
                            trace!(frame_id = %update.frame_id, "applied window update");
                        }
                    }
                }));
            }

            debug!(frame_id = %frame_id, "requesting window info");
            bridge.publish(Message::request_window_info(frame_id));
            Ok(())
        })
    }

    /// Forget a window whose handle went away. Returns whether it was
    /// registered.
    pub fn unregister_window(&self, frame_id: &FrameId) -> bool {
        let removed = lock(&self.inner.registry).bridges.remove(frame_id);
        if let Some(bridge) = &removed {
            bridge.unsubscribe(Topic::UpdateWindowInfo, None);
        }
        self.inner
            .snapshot
            .send_if_modified(|snapshot| snapshot.windows.remove(frame_id).is_some());
        debug!(frame_id = %frame_id, registered = removed.is_some(), "window unregistered");
        removed.is_some()
    }

    // -----------------------------------------------------------------------
    // Outbound
    // -----------------------------------------------------------------------

    /// Publish a property change to one window. The message's `frame_id`
    /// is overwritten with the resolved target.
    ///
    /// Returns `false` (and logs) when the window is unknown or already
    /// closed.
    pub fn set_window_info(&self, target: impl Into<WindowTarget>, info: WindowInfoSet) -> bool {
        let (frame_id, bridge) = match target.into() {
            WindowTarget::Frame(frame_id) => {
                let bridge = self.bridge(&frame_id);
                (Some(frame_id), bridge)
            }
            WindowTarget::Handle(bridge) => {
                let frame_id = bridge.name().or_else(|| self.root_frame());
                (frame_id, Some(bridge))
            }
        };

        let Some(frame_id) = frame_id else {
            warn!("set_window_info on an unnamed window before init");
            return false;
        };
        let Some(bridge) = bridge.filter(|b| !b.is_closed()) else {
            warn!(frame_id = %frame_id, "window deallocated early");
            return false;
        };

        trace!(frame_id = %frame_id, "sending window info");
        bridge.publish(Message::SetWindowInfo(WindowInfoSet { frame_id, ..info }));
        true
    }

    pub fn request_mouse_position(&self, bridge: &dyn WindowBridge) {
        bridge.publish(Message::RequestMouseInfo);
    }

    // -----------------------------------------------------------------------
    // Inbound
    // -----------------------------------------------------------------------

    /// Merge `patch` into the cached state of `frame_id`.
    ///
    /// Nothing changes (and no one is notified) when every field present
    /// in the patch already equals the cached value. The first patch for a
    /// frame must be complete; a partial one is ignored.
    pub fn update_window_info(&self, frame_id: &FrameId, patch: WindowInfoPatch) -> bool {
        self.inner.snapshot.send_if_modified(|snapshot| {
            match snapshot.windows.get_mut(frame_id) {
                Some(existing) => {
                    if patch.is_contained_in(existing) {
                        return false;
                    }
                    patch.apply_to(existing);
                    true
                }
                None => match patch.to_state() {
                    Some(state) => {
                        snapshot.windows.insert(frame_id.clone(), state);
                        true
                    }
                    None => {
                        warn!(frame_id = %frame_id, "partial update for untracked window ignored");
                        false
                    }
                },
            }
        })
    }

    pub fn apply_display_info(&self, update: &DisplayInfoUpdate) -> bool {
        let displays: BTreeMap<u32, DisplayInfo> =
            update.displays.iter().map(|d| (d.id, *d)).collect();
        let primary = Some(update.primary_display_id);
        self.inner.snapshot.send_if_modified(|snapshot| {
            if snapshot.displays == displays && snapshot.primary_display_id == primary {
                return false;
            }
            snapshot.displays = displays;
            snapshot.primary_display_id = primary;
            true
        })
    }

    pub fn apply_mouse_info(&self, update: &MouseInfoUpdate) -> bool {
        self.inner.snapshot.send_if_modified(|snapshot| {
            let changed = snapshot.mouse != Some(update.position);
            snapshot.mouse = Some(update.position);
            changed
        })
    }

    pub fn apply_system_info(&self, update: &SystemInfoUpdate) -> bool {
        self.inner.snapshot.send_if_modified(|snapshot| {
            let changed = snapshot.system != Some(*update);
            snapshot.system = Some(*update);
            changed
        })
    }
}

/// Wrap `handler` in a bridge listener that holds the store weakly.
fn store_listener<F>(store: &Weak<StoreInner>, handler: F) -> Listener
where
    F: Fn(&WindowStore, &Message) + Send + Sync + 'static,
{
    let store = Weak::clone(store);
    Arc::new(move |message: &Message| {
        if let Some(inner) = store.upgrade() {
            handler(&WindowStore::from_inner(inner), message);
        }
    })
}
