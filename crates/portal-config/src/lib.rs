//! Portal window configuration.
//!
//! TOML-based settings for the synchronization timings, debounce windows
//! and logging. Every section has defaults so partial files work.
//!
//! ```rust,no_run
//! use portal_config::load_config;
//!
//! let config = load_config().expect("failed to load config");
//! println!("ping timeout: {:?}", config.sync_timings().ping_timeout);
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{DebounceConfig, LoggingConfig, PortalConfig, SyncConfig, SyncTimings};
pub use toml_loader::{load_default, load_from_path};

use portal_common::ConfigError;

/// Load config from the platform default path and validate it.
pub fn load_config() -> Result<PortalConfig, ConfigError> {
    let config = toml_loader::load_default()?;
    validation::validate(&config)?;
    Ok(config)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &PortalConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}
