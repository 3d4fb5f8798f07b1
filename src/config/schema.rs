//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from a TOML file, and every field
//! has a default so an empty file (or no file) is a valid configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::observability::format::BodyFormatChoice;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct MoleConfig {
    /// Listener configuration.
    pub listener: ListenerConfig,

    /// Which responder answers requests.
    pub response: ResponseConfig,

    /// Per-request dispatch behavior.
    pub dispatch: DispatchConfig,

    /// Traffic log and diagnostics.
    pub logging: LoggingConfig,

    /// Metrics exporter.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:10080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:10080".to_string(),
        }
    }
}

/// Response source. `file` and `from` are mutually exclusive; with neither set the
/// static `status` and `headers` are served.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ResponseConfig {
    /// Status code of the static response.
    pub status: u16,

    /// Static response headers as `key:value` lines.
    pub headers: Vec<String>,

    /// JSON response file, hot reloaded on change.
    pub file: Option<PathBuf>,

    /// `host:port` to forward every request to.
    pub from: Option<String>,
}

impl Default for ResponseConfig {
    fn default() -> Self {
        Self {
            status: 200,
            headers: Vec::new(),
            file: None,
            from: None,
        }
    }
}

/// Dispatch configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Artificial delay before answering, in milliseconds (0 disables it).
    pub delay_ms: u64,

    /// Longest request or response body shown in the traffic log; the rest is summarized.
    /// Traffic itself is never cut.
    pub max_body_bytes: usize,
}

impl DispatchConfig {
    pub fn delay(&self) -> Option<Duration> {
        (self.delay_ms > 0).then(|| Duration::from_millis(self.delay_ms))
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            delay_ms: 0,
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Diagnostic log level (trace, debug, info, warn, error).
    pub level: String,

    /// Mirror responses to the traffic log.
    pub log_response: bool,

    /// Only log requests whose method matches this regex.
    pub filter_method: Option<String>,

    /// Only log requests whose path matches this regex.
    pub filter_path: Option<String>,

    /// How JSON bodies are displayed.
    pub body_format: BodyFormatChoice,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_response: false,
            filter_method: None,
            filter_path: None,
            body_format: BodyFormatChoice::Auto,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

/// Split a `key:value` header line at its first colon.
pub fn parse_header_line(line: &str) -> Option<(&str, &str)> {
    let (name, value) = line.split_once(':')?;
    let name = name.trim();
    if name.is_empty() {
        return None;
    }
    Some((name, value.trim()))
}
