//! Body rendering for the traffic log.
//!
//! JSON bodies are pretty-printed for a console and minified for persisted logs. Anything
//! else, including JSON that fails to parse, is shown unchanged.

use axum::http::header::{HeaderValue, CONTENT_TYPE};
use axum::http::HeaderMap;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::io::IsTerminal;

/// Display style for bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    /// Compact, one line. Suited for persisted logs.
    Minified,
    /// Indented. Suited for a console.
    Expanded,
}

/// Configured body style, resolved once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BodyFormatChoice {
    /// Pretty on a terminal, compact otherwise.
    #[default]
    Auto,
    Pretty,
    Compact,
}

impl BodyFormatChoice {
    pub fn resolve(self) -> BodyFormat {
        match self {
            BodyFormatChoice::Pretty => BodyFormat::Expanded,
            BodyFormatChoice::Compact => BodyFormat::Minified,
            BodyFormatChoice::Auto => {
                if std::io::stdout().is_terminal() {
                    BodyFormat::Expanded
                } else {
                    BodyFormat::Minified
                }
            }
        }
    }
}

/// Renders a body according to its content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormatter {
    Json,
    Passthrough,
}

impl BodyFormatter {
    /// Pick a formatter from a `Content-Type` value.
    pub fn for_content_type(content_type: Option<&HeaderValue>) -> Self {
        let essence = content_type
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(|v| v.trim().to_ascii_lowercase());

        match essence.as_deref() {
            Some("application/json") => BodyFormatter::Json,
            Some(other) if other.starts_with("application/") && other.ends_with("+json") => {
                BodyFormatter::Json
            }
            _ => BodyFormatter::Passthrough,
        }
    }

    /// Pick a formatter from response headers.
    pub fn for_headers(headers: &HeaderMap) -> Self {
        Self::for_content_type(headers.get(CONTENT_TYPE))
    }

    pub fn format<'a>(&self, body: &'a [u8], format: BodyFormat) -> Cow<'a, [u8]> {
        match self {
            BodyFormatter::Passthrough => Cow::Borrowed(body),
            BodyFormatter::Json => {
                let value: serde_json::Value = match serde_json::from_slice(body) {
                    Ok(value) => value,
                    Err(_) => return Cow::Borrowed(body),
                };
                let rendered = match format {
                    BodyFormat::Minified => serde_json::to_vec(&value),
                    BodyFormat::Expanded => serde_json::to_vec_pretty(&value),
                };
                match rendered {
                    Ok(bytes) => Cow::Owned(bytes),
                    Err(_) => Cow::Borrowed(body),
                }
            }
        }
    }
}
