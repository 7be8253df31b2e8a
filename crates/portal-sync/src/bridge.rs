//! Transport seam between the render process and one native window.

use std::fmt;
use std::sync::Arc;

use portal_common::FrameId;

use crate::protocol::{Message, Topic};

/// Callback invoked for every message received on a subscribed topic.
pub type Listener = Arc<dyn Fn(&Message) + Send + Sync>;

/// Handle returned by [`WindowBridge::subscribe`], used to remove one
/// listener without touching the others on the same topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Render-side handle to a window.
///
/// `publish` sends toward the host; listeners receive what the host emits
/// for this window. Listeners are called synchronously on the emitting
/// task and must not block.
pub trait WindowBridge: Send + Sync {
    /// Frame name the window was opened with; `None` for the root window.
    fn name(&self) -> Option<FrameId>;

    fn is_closed(&self) -> bool;

    fn publish(&self, message: Message);

    fn subscribe(&self, topic: Topic, listener: Listener) -> ListenerId;

    /// Remove one listener, or every listener on `topic` when `id` is `None`.
    fn unsubscribe(&self, topic: Topic, id: Option<ListenerId>);
}

pub type SharedBridge = Arc<dyn WindowBridge>;
