//! portal-demo: runs the render-side store and a portal window against a
//! simulated host and reports where the window ended up.

mod cli;
mod sim;

use std::path::Path;

use portal_common::{ConfigError, PortalError};
use portal_config::PortalConfig;
use tracing_subscriber::filter::{Directive, LevelFilter};
use tracing_subscriber::EnvFilter;

fn load_config(path: Option<&str>) -> Result<PortalConfig, ConfigError> {
    match path {
        Some(path) => {
            let config = portal_config::load_from_path(Path::new(path))?;
            portal_config::validation::validate(&config)?;
            Ok(config)
        }
        None => portal_config::load_config(),
    }
}

/// A config passed with `--config` must load; the default one falls back
/// to built-in defaults.
fn effective_config(
    explicit: bool,
    loaded: Result<PortalConfig, ConfigError>,
) -> portal_common::Result<PortalConfig> {
    match loaded {
        Ok(config) => Ok(config),
        Err(e) if explicit => Err(PortalError::from(e)),
        Err(e) => {
            tracing::warn!("Config load failed, using defaults: {e}");
            Ok(PortalConfig::default())
        }
    }
}

#[tokio::main]
async fn main() -> portal_common::Result<()> {
    let args = cli::parse();

    // Config first: its log level seeds the filter.
    let loaded = load_config(args.config.as_deref());

    let log_directive = match (&args.log_level, &loaded) {
        (Some(level), _) => format!("portal={level}"),
        (None, Ok(config)) => config.log_directive(),
        (None, Err(_)) => "portal=info".to_string(),
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                log_directive
                    .parse()
                    .unwrap_or_else(|_| Directive::from(LevelFilter::INFO)),
            ),
        )
        .init();

    tracing::info!("portal-demo v{} starting...", env!("CARGO_PKG_VERSION"));

    if let Some(ref path) = args.config {
        tracing::info!("Using config override: {path}");
    }
    let config = effective_config(args.config.is_some(), loaded).inspect_err(|e| {
        tracing::error!("Config load failed: {e}");
    })?;
    tracing::debug!("Effective config: {}", portal_config::config_to_json(&config));

    let outcome = sim::run(&config, args.drag_by).await.inspect_err(|e| {
        tracing::error!("Simulation failed: {e}");
    })?;
    tracing::info!(
        settled = ?outcome.settled,
        after_drag = ?outcome.after_drag,
        visible = outcome.visible,
        "Simulation finished"
    );
    tracing::info!("Shutdown complete");
    Ok(())
}
