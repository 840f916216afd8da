//! Logging bootstrap.
//!
//! The library only emits `tracing` events; hosts that have no subscriber of
//! their own call [`init_logging`] once at startup.

use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;

static LOGGING_FILTER: OnceLock<String> = OnceLock::new();

/// Install a global fmt subscriber.
///
/// `RUST_LOG` wins over `default_filter` when set. Repeated calls with the same
/// filter are no-ops; a different filter after initialization is rejected.
/// Never panics.
pub fn init_logging(default_filter: &str) -> Result<(), String> {
    let filter = default_filter.trim();
    if filter.is_empty() {
        return Err("log filter must not be empty".to_string());
    }

    if let Some(active) = LOGGING_FILTER.get() {
        if active == filter {
            return Ok(());
        }
        return Err(format!(
            "logging already initialized with `{}`; refusing to switch to `{}`",
            active, filter
        ));
    }

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .map_err(|e| format!("invalid log filter `{}`: {}", filter, e))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init()
        .map_err(|e| format!("failed to install subscriber: {}", e))?;

    let _ = LOGGING_FILTER.set(filter.to_string());
    tracing::info!(filter, "Logging initialized");
    Ok(())
}
