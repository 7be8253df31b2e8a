//! Configuration schema.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Cross-process handshake timings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Delay before the first request to a freshly opened window, giving
    /// its message bridge time to come up.
    pub grace_delay_ms: u64,
    /// Hard deadline for a ping round trip.
    pub ping_timeout_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            grace_delay_ms: 1000,
            ping_timeout_ms: 2000,
        }
    }
}

/// Coalescing windows for bursty updates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DebounceConfig {
    /// Wait between repositioning passes of a portal window.
    pub reposition_ms: u64,
    /// How long to wait for the first content update before showing.
    pub first_show_ms: u64,
    /// After the first content update, other triggers keep resizing and
    /// repositioning for this long.
    pub first_dom_settle_ms: u64,
    /// Quiet period after the last overlay request before overlaying
    /// windows are told they may show again.
    pub overlay_quiet_ms: u64,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            reposition_ms: 50,
            first_show_ms: 200,
            first_dom_settle_ms: 500,
            overlay_quiet_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level for the `portal` crates (trace, debug, info, warn, error).
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
        }
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalConfig {
    pub sync: SyncConfig,
    pub debounce: DebounceConfig,
    pub logging: LoggingConfig,
}

/// Resolved durations handed to the runtime components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncTimings {
    pub grace_delay: Duration,
    pub ping_timeout: Duration,
    pub reposition_wait: Duration,
    pub first_show_wait: Duration,
    pub first_dom_settle: Duration,
    pub overlay_quiet: Duration,
}

impl Default for SyncTimings {
    fn default() -> Self {
        PortalConfig::default().sync_timings()
    }
}

impl PortalConfig {
    pub fn sync_timings(&self) -> SyncTimings {
        SyncTimings {
            grace_delay: Duration::from_millis(self.sync.grace_delay_ms),
            ping_timeout: Duration::from_millis(self.sync.ping_timeout_ms),
            reposition_wait: Duration::from_millis(self.debounce.reposition_ms),
            first_show_wait: Duration::from_millis(self.debounce.first_show_ms),
            first_dom_settle: Duration::from_millis(self.debounce.first_dom_settle_ms),
            overlay_quiet: Duration::from_millis(self.debounce.overlay_quiet_ms),
        }
    }

    /// `EnvFilter` directive for the configured level.
    pub fn log_directive(&self) -> String {
        format!("portal={}", self.logging.level)
    }
}
