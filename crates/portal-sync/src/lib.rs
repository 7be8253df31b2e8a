//! Cross-process window-state synchronization.
//!
//! The render side keeps a [`WindowStore`] of every window it drives and
//! talks to the host through [`WindowBridge`] handles. The host side runs a
//! [`HostWindowListener`] per native window plus a [`HostInfoResponder`]
//! for display, mouse and system queries. [`PortalWindow`] ties the store,
//! the [`Debouncer`] and `portal-layout` together to keep one window
//! positioned.

pub mod bridge;
pub mod debounce;
pub mod host;
pub mod local;
pub mod portal;
pub mod protocol;
pub mod store;

pub use bridge::{Listener, ListenerId, SharedBridge, WindowBridge};
pub use debounce::{DebounceOutcome, DebouncePolicy, Debouncer, JobState};
pub use host::{
    nearest_display, HostInfoResponder, HostWindowListener, OverlayTracker, SystemProbe,
    WindowController,
};
pub use local::{HostEmitter, HostEndpoint, LocalBridge};
pub use portal::{ContentSource, PortalSpec, PortalWindow, UpdateReasons};
pub use protocol::{
    DisplayInfoUpdate, Message, MouseInfoUpdate, OverlayLevel, OverlayProps, SystemInfoUpdate,
    Topic, Visibility, WindowInfoRequest, WindowInfoSet, WindowInfoUpdate,
};
pub use store::{StoreSnapshot, WindowStore, WindowTarget};

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock a std mutex, recovering the data if a previous holder panicked.
pub fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
