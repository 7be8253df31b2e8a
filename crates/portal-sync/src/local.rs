//! In-process [`WindowBridge`] backed by a tokio channel.
//!
//! [`LocalBridge::pair`] returns the render-side bridge and the
//! [`HostEndpoint`] a host adapter drains. Used by the demo binary and the
//! tests; a real host would put an IPC channel behind the same trait.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use portal_common::FrameId;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::bridge::{Listener, ListenerId, SharedBridge, WindowBridge};
use crate::lock;
use crate::protocol::{Message, Topic};

struct Shared {
    name: Option<FrameId>,
    listeners: Mutex<HashMap<Topic, Vec<(ListenerId, Listener)>>>,
    next_listener: AtomicU64,
    closed: AtomicBool,
}

impl Shared {
    fn label(&self) -> &str {
        self.name.as_ref().map_or("<root>", |n| n.as_str())
    }
}

pub struct LocalBridge {
    shared: Arc<Shared>,
    outbox: mpsc::UnboundedSender<Message>,
}

impl LocalBridge {
    /// Create a connected bridge/endpoint pair for one window.
    pub fn pair(name: Option<FrameId>) -> (Arc<LocalBridge>, HostEndpoint) {
        let (tx, rx) = mpsc::unbounded_channel();
        let shared = Arc::new(Shared {
            name,
            listeners: Mutex::new(HashMap::new()),
            next_listener: AtomicU64::new(1),
            closed: AtomicBool::new(false),
        });
        let bridge = Arc::new(LocalBridge {
            shared: Arc::clone(&shared),
            outbox: tx,
        });
        let endpoint = HostEndpoint {
            emitter: HostEmitter { shared },
            inbox: rx,
        };
        (bridge, endpoint)
    }

    pub fn shared(self: &Arc<Self>) -> SharedBridge {
        Arc::clone(self) as SharedBridge
    }

    /// Number of listeners currently attached to `topic`.
    pub fn listener_count(&self, topic: Topic) -> usize {
        lock(&self.shared.listeners)
            .get(&topic)
            .map_or(0, |l| l.len())
    }
}

impl WindowBridge for LocalBridge {
    fn name(&self) -> Option<FrameId> {
        self.shared.name.clone()
    }

    fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    fn publish(&self, message: Message) {
        if self.is_closed() {
            debug!(
                window = %self.shared.label(),
                topic = %message.topic(),
                "publish on closed window dropped"
            );
            return;
        }
        trace!(window = %self.shared.label(), topic = %message.topic(), "publish");
        if self.outbox.send(message).is_err() {
            debug!(window = %self.shared.label(), "host endpoint gone");
        }
    }

    fn subscribe(&self, topic: Topic, listener: Listener) -> ListenerId {
        let id = ListenerId(self.shared.next_listener.fetch_add(1, Ordering::Relaxed));
        lock(&self.shared.listeners)
            .entry(topic)
            .or_default()
            .push((id, listener));
        id
    }

    fn unsubscribe(&self, topic: Topic, id: Option<ListenerId>) {
        let mut listeners = lock(&self.shared.listeners);
        match id {
            Some(id) => {
                if let Some(list) = listeners.get_mut(&topic) {
                    list.retain(|(existing, _)| *existing != id);
                }
            }
            None => {
                listeners.remove(&topic);
            }
        }
    }
}

/// Cloneable host-side sender into one window's render listeners.
#[derive(Clone)]
pub struct HostEmitter {
    shared: Arc<Shared>,
}

impl HostEmitter {
    /// Deliver `message` to every render listener on its topic.
    ///
    /// Listeners are cloned out of the registry first, so they may
    /// subscribe or unsubscribe while being called.
    pub fn emit(&self, message: Message) {
        if self.is_closed() {
            debug!(
                window = %self.shared.label(),
                topic = %message.topic(),
                "emit to closed window dropped"
            );
            return;
        }
        let targets: Vec<Listener> = lock(&self.shared.listeners)
            .get(&message.topic())
            .map(|list| list.iter().map(|(_, l)| Arc::clone(l)).collect())
            .unwrap_or_default();
        trace!(
            window = %self.shared.label(),
            topic = %message.topic(),
            listeners = targets.len(),
            "emit"
        );
        for listener in targets {
            listener(&message);
        }
    }

    /// Mark the window closed and drop its render listeners.
    pub fn close(&self) {
        if !self.shared.closed.swap(true, Ordering::AcqRel) {
            debug!(window = %self.shared.label(), "window closed");
        }
        lock(&self.shared.listeners).clear();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }

    pub fn name(&self) -> Option<FrameId> {
        self.shared.name.clone()
    }
}

/// Host side of a [`LocalBridge`].
pub struct HostEndpoint {
    emitter: HostEmitter,
    inbox: mpsc::UnboundedReceiver<Message>,
}

impl HostEndpoint {
    /// Next message published by the render side, or `None` once the
    /// bridge has been dropped.
    pub async fn recv(&mut self) -> Option<Message> {
        self.inbox.recv().await
    }

    pub fn try_recv(&mut self) -> Option<Message> {
        self.inbox.try_recv().ok()
    }

    pub fn emit(&self, message: Message) {
        self.emitter.emit(message);
    }

    pub fn close(&self) {
        self.emitter.close();
    }

    pub fn emitter(&self) -> HostEmitter {
        self.emitter.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;
    use crate::protocol::{MouseInfoUpdate, WindowInfoRequest};
    use portal_common::Point;

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let listener: Listener = Arc::new(move |_: &Message| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, listener)
    }

    fn mouse() -> Message {
        Message::UpdateMouseInfo(MouseInfoUpdate {
            position: Point { x: 3, y: 4 },
        })
    }

    #[test]
    fn publish_reaches_host_in_order() {
        let (bridge, mut host) = LocalBridge::pair(Some("main_window".into()));
        bridge.publish(Message::RequestDisplayInfo);
        bridge.publish(Message::RequestMouseInfo);
        assert_eq!(host.try_recv(), Some(Message::RequestDisplayInfo));
        assert_eq!(host.try_recv(), Some(Message::RequestMouseInfo));
        assert_eq!(host.try_recv(), None);
    }

    #[test]
    fn emit_only_reaches_matching_topic() {
        let (bridge, host) = LocalBridge::pair(None);
        let (mouse_count, on_mouse) = counter();
        let (system_count, on_system) = counter();
        bridge.subscribe(Topic::UpdateMouseInfo, on_mouse);
        bridge.subscribe(Topic::UpdateSystemInfo, on_system);

        host.emit(mouse());
        assert_eq!(mouse_count.load(Ordering::SeqCst), 1);
        assert_eq!(system_count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn unsubscribe_one_or_all() {
        let (bridge, host) = LocalBridge::pair(None);
        let (first, l1) = counter();
        let (second, l2) = counter();
        let id = bridge.subscribe(Topic::UpdateMouseInfo, l1);
        bridge.subscribe(Topic::UpdateMouseInfo, l2);

        bridge.unsubscribe(Topic::UpdateMouseInfo, Some(id));
        host.emit(mouse());
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);

        bridge.unsubscribe(Topic::UpdateMouseInfo, None);
        assert_eq!(bridge.listener_count(Topic::UpdateMouseInfo), 0);
    }

    #[test]
    fn listener_may_unsubscribe_itself() {
        let (bridge, host) = LocalBridge::pair(None);
        let weak = Arc::downgrade(&bridge);
        let id = Arc::new(Mutex::new(None));
        let own_id = Arc::clone(&id);
        let listener: Listener = Arc::new(move |_: &Message| {
            if let (Some(b), Some(id)) = (weak.upgrade(), *lock(&own_id)) {
                b.unsubscribe(Topic::UpdateMouseInfo, Some(id));
            }
        });
        *lock(&id) = Some(bridge.subscribe(Topic::UpdateMouseInfo, listener));

        host.emit(mouse());
        assert_eq!(bridge.listener_count(Topic::UpdateMouseInfo), 0);
    }

    #[test]
    fn closed_window_drops_traffic() {
        let (bridge, mut host) = LocalBridge::pair(Some("tooltip_window".into()));
        let (count, listener) = counter();
        bridge.subscribe(Topic::UpdateMouseInfo, listener);

        host.close();
        assert!(bridge.is_closed());
        host.emit(mouse());
        bridge.publish(Message::RequestWindowInfo(WindowInfoRequest {
            frame_id: "tooltip_window".into(),
        }));
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert_eq!(host.try_recv(), None);
    }
}
