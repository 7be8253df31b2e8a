use std::sync::{Arc, Mutex};

use portal_common::{FrameId, SyncError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::debug;

use super::WindowStore;
use crate::bridge::{ListenerId, SharedBridge};
use crate::lock;
use crate::protocol::{Message, Topic};

type PongSlot = Arc<Mutex<Option<oneshot::Sender<Result<(), SyncError>>>>>;

fn settle(slot: &PongSlot, result: Result<(), SyncError>) {
    if let Some(tx) = lock(slot).take() {
        let _ = tx.send(result);
    }
}

/// Removes the pong listener and stops the pending request however the
/// ping ends, including when its future is dropped.
struct PingGuard {
    bridge: SharedBridge,
    listener: ListenerId,
    request: JoinHandle<()>,
}

impl Drop for PingGuard {
    fn drop(&mut self) {
        self.request.abort();
        self.bridge.unsubscribe(Topic::UpdateWindowInfo, Some(self.listener));
    }
}

impl WindowStore {
    /// Wait until the host answers for `frame_id`.
    ///
    /// Resolves on the first window update for the frame. The request is
    /// published after the grace delay; the whole exchange is bounded by
    /// the ping timeout. Proxied windows are not supported: a frame with
    /// no registered handle fails immediately.
    pub async fn ping_window(&self, frame_id: &FrameId) -> Result<(), SyncError> {
        let bridge = self
            .bridge(frame_id)
            .ok_or_else(|| SyncError::NoValidWindow(frame_id.clone()))?;

        let (tx, rx) = oneshot::channel();
        let slot: PongSlot = Arc::new(Mutex::new(Some(tx)));

        let pong_slot = Arc::clone(&slot);
        let expected = frame_id.clone();
        let listener_id = bridge.subscribe(
            Topic::UpdateWindowInfo,
            Arc::new(move |message: &Message| {
                if message.frame_id() == Some(&expected) {
                    settle(&pong_slot, Ok(()));
                }
            }),
        );

        let grace = self.inner.timings.grace_delay;
        let request_slot = Arc::clone(&slot);
        let request_bridge = Arc::clone(&bridge);
        let target = frame_id.clone();
        let request = tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            if request_bridge.is_closed() {
                settle(&request_slot, Err(SyncError::WindowClosed(target)));
                return;
            }
            request_bridge.publish(Message::request_window_info(target));
        });

        let _guard = PingGuard {
            bridge,
            listener: listener_id,
            request,
        };

        let result = match tokio::time::timeout(self.inner.timings.ping_timeout, rx).await {
            Ok(Ok(result)) => result,
            Ok(Err(_)) | Err(_) => Err(SyncError::PingTimeout(frame_id.clone())),
        };
        debug!(frame_id = %frame_id, ok = result.is_ok(), "ping finished");
        result
    }
}
