//! Diagnostic logging setup.
//!
//! `RUST_LOG` wins when set; otherwise the configured level applies to this crate and
//! `tower_http`. Traffic records do not go through here, see `traffic.rs`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Directive used when `RUST_LOG` is not set.
pub fn default_directive(config: &LoggingConfig) -> String {
    format!("httpmole={level},tower_http={level}", level = config.level)
}

/// Install the global tracing subscriber. Diagnostics go to stderr so stdout stays
/// reserved for traffic records.
pub fn init(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_directive(config).into());

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}
