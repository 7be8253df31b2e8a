//! Range validation for loaded configs.
//!
//! Collects every problem into a single `ConfigError` instead of stopping
//! at the first one.

use crate::schema::PortalConfig;
use portal_common::ConfigError;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

pub fn validate(config: &PortalConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    validate_range(
        &mut errors,
        "sync.grace_delay_ms",
        config.sync.grace_delay_ms,
        0,
        10_000,
    );
    validate_range(
        &mut errors,
        "sync.ping_timeout_ms",
        config.sync.ping_timeout_ms,
        1,
        60_000,
    );
    if config.sync.ping_timeout_ms <= config.sync.grace_delay_ms {
        errors.push(format!(
            "sync.ping_timeout_ms = {} must exceed sync.grace_delay_ms = {}",
            config.sync.ping_timeout_ms, config.sync.grace_delay_ms
        ));
    }

    validate_range(
        &mut errors,
        "debounce.reposition_ms",
        config.debounce.reposition_ms,
        0,
        5_000,
    );
    validate_range(
        &mut errors,
        "debounce.first_show_ms",
        config.debounce.first_show_ms,
        0,
        10_000,
    );
    validate_range(
        &mut errors,
        "debounce.first_dom_settle_ms",
        config.debounce.first_dom_settle_ms,
        0,
        10_000,
    );
    validate_range(
        &mut errors,
        "debounce.overlay_quiet_ms",
        config.debounce.overlay_quiet_ms,
        0,
        60_000,
    );

    if !LOG_LEVELS.contains(&config.logging.level.as_str()) {
        errors.push(format!(
            "logging.level = {:?} is not one of {}",
            config.logging.level,
            LOG_LEVELS.join(", ")
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}

fn validate_range(errors: &mut Vec<String>, name: &str, value: u64, min: u64, max: u64) {
    if value < min || value > max {
        errors.push(format!("{name} = {value} is out of range [{min}, {max}]"));
    }
}
