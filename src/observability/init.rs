//! Tracing initialization and subscriber setup.
//!
//! This module configures the global `tracing` subscriber: an [`EnvFilter`]
//! built from the configured trace level feeding a formatted output layer.

use crate::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global tracing subscriber.
///
/// # Trace Level Resolution
///
/// The filter directive is determined by:
/// 1. `config.trace_level` if set
/// 2. Default: `"info"`
///
/// An invalid directive falls back to `"info"`.
///
/// # Initialization Behavior
///
/// Idempotent: safe to call multiple times. Only the first call installs a
/// subscriber; later calls, or calls after the host installed its own, are
/// ignored.
///
/// # Example
///
/// ```rust
/// use layerkit::observability::init_tracing;
/// use layerkit::Config;
///
/// let config = Config {
///     trace_level: Some("debug".to_string()),
///     ..Default::default()
/// };
///
/// init_tracing(&config);
/// init_tracing(&config);
///
/// tracing::debug!("tracing is now active");
/// ```
pub fn init_tracing(config: &Config) {
    let level = config.trace_level.as_deref().unwrap_or("info");
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true));

    if subscriber.try_init().is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}
