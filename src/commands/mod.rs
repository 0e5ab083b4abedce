//! Top-level subcommand orchestration.
pub mod run;
pub mod version;
pub mod wait;

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::SignalConfig;
use crate::error::ConfigError;
use crate::logging::STAGE_TARGET;
use crate::shutdown::ShutdownSignal;

/// Build the effective configuration: defaults, then the `--config` file,
/// then individual command-line overrides.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or parsed, or if the
/// final bounds are invalid.
pub fn resolve_config(global: &GlobalOpts) -> Result<SignalConfig, ConfigError> {
    let mut config = match &global.config {
        Some(path) => SignalConfig::load(path)?,
        None => SignalConfig::default(),
    };
    if let Some(min) = global.min_cycle_millis {
        config.min_cycle_millis = min;
    }
    if let Some(max) = global.max_cycle_millis {
        config.max_cycle_millis = max;
    }
    if global.seed.is_some() {
        config.seed = global.seed;
    }
    config.validate()?;
    Ok(config)
}

/// Load and log the configuration for a command.
fn load_config(global: &GlobalOpts) -> Result<SignalConfig> {
    tracing::info!(target: STAGE_TARGET, "Loading configuration");
    let config = resolve_config(global)?;
    tracing::info!(
        "cycle {}..={}ms{}",
        config.min_cycle_millis,
        config.max_cycle_millis,
        config
            .seed
            .map_or_else(String::new, |s| format!(", seed {s}"))
    );
    Ok(config)
}

/// Cancel `shutdown` when the process receives Ctrl-C.
///
/// # Errors
///
/// Returns an error if a handler is already installed or the platform
/// handler cannot be registered.
fn stop_on_interrupt(shutdown: ShutdownSignal) -> Result<()> {
    ctrlc::set_handler(move || {
        tracing::warn!("interrupted, stopping signal");
        shutdown.cancel();
    })
    .context("Failed to install Ctrl-C handler")
}
