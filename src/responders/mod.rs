//! Response resolution subsystem.
//!
//! # Data Flow
//! ```text
//! inbound request
//!     → Responder (chosen once at startup)
//!         Static  → fixed status + headers, empty body
//!         File    → cached ResponseSpec, reloaded when the watched file changes
//!         Forward → request retargeted to another host:port, upstream response streamed back
//!     → Response<Body>
//! ```
//!
//! # Design Decisions
//! - Closed set of variants, no runtime plugins
//! - `close()` is idempotent and safe before any `respond()`
//! - Errors are per-request; only the file watcher has a fatal path

pub mod file;
pub mod fixed;
pub mod forward;
pub mod spec;
pub mod watcher;

use axum::body::Body;
use axum::http::{Request, Response};
use thiserror::Error;

pub use file::FileResponder;
pub use fixed::StaticResponder;
pub use forward::{upstream_client, ForwardResponder, UpstreamClient};
pub use spec::ResponseSpec;

/// Errors surfaced by a single `respond` call.
#[derive(Debug, Error)]
pub enum ResponderError {
    /// The response file path could not be resolved to an absolute path.
    #[error("failed to resolve response file path {path}: {source}")]
    Resolve {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The response file could not be read.
    #[error("failed to read response file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The response file is not valid JSON for the schema.
    #[error("failed to parse response file: {0}")]
    Parse(#[from] serde_json::Error),

    /// The status code is outside `[100, 599)`.
    #[error("invalid status code {0}")]
    InvalidStatusCode(i64),

    /// A header name or value cannot be sent over HTTP.
    #[error("invalid header {0:?}")]
    InvalidHeader(String),

    /// The watch subscription for the response file could not be registered.
    #[error("failed to add the file watcher for {path}: {source}")]
    Watch {
        path: String,
        #[source]
        source: notify::Error,
    },

    /// The retargeted URI could not be built.
    #[error("invalid forward target {target:?}: {reason}")]
    InvalidTarget { target: String, reason: String },

    /// The upstream request failed at the transport level.
    #[error("upstream request to {target} failed: {source}")]
    Upstream {
        target: String,
        #[source]
        source: hyper_util::client::legacy::Error,
    },
}

/// A strategy producing the response for an inbound request.
pub enum Responder {
    Static(StaticResponder),
    File(FileResponder),
    Forward(ForwardResponder),
}

impl Responder {
    /// Produce the response for a request.
    pub async fn respond(&self, request: Request<Body>) -> Result<Response<Body>, ResponderError> {
        match self {
            Responder::Static(r) => Ok(r.respond()),
            Responder::File(r) => r.respond().await,
            Responder::Forward(r) => r.respond(request).await,
        }
    }

    /// Release held resources such as the watch subscription.
    pub fn close(&self) {
        match self {
            Responder::Static(_) => {}
            Responder::File(r) => r.close(),
            Responder::Forward(r) => r.close(),
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Responder::Static(_) => "static",
            Responder::File(_) => "file",
            Responder::Forward(_) => "forward",
        }
    }
}

impl std::fmt::Debug for Responder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Responder::Static(r) => f.debug_tuple("Static").field(&r.spec().status).finish(),
            Responder::File(r) => f.debug_tuple("File").field(&r.path()).finish(),
            Responder::Forward(r) => f.debug_tuple("Forward").field(&r.hostport()).finish(),
        }
    }
}
