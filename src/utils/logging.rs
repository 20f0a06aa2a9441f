//! Tracing subscriber setup

use crate::config::LoggingConfig;
use crate::utils::error::{Result, SyncError};
use tracing_subscriber::EnvFilter;

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level. Fails if a subscriber is
/// already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(std::env::var("RUST_LOG").ok().as_deref(), &config.level)?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| SyncError::config(format!("Failed to install logger: {}", e)))
}

fn build_filter(env: Option<&str>, level: &str) -> Result<EnvFilter> {
    let directives = env.filter(|d| !d.trim().is_empty()).unwrap_or(level);
    EnvFilter::try_new(directives)
        .map_err(|e| SyncError::config(format!("Invalid log filter '{}': {}", directives, e)))
}
