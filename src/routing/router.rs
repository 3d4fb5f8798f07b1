//! Route decision: proxy hop or configured responder.
//!
//! # Responsibilities
//! - Recognize `/proxy/<hostport>/...` requests
//! - Rewrite the path and forward through a throwaway `ForwardResponder`
//! - Time the hop
//! - Fall through to the configured responder otherwise
//!
//! # Design Decisions
//! - One hop per instance, never recursive
//! - Hop responders are created per request and share the process-wide client

use axum::body::Body;
use axum::http::{Request, Response, Uri};
use std::time::{Duration, Instant};

use crate::observability::metrics;
use crate::responders::{ForwardResponder, Responder, ResponderError, UpstreamClient};
use crate::routing::proxy_path::{parse_proxy_path, ProxyHop};

/// Timing of a forwarded hop.
#[derive(Debug, Clone)]
pub struct HopTiming {
    pub target: String,
    pub elapsed: Duration,
}

/// Outcome of routing one request.
pub struct Routed {
    pub result: Result<Response<Body>, ResponderError>,
    pub hop: Option<HopTiming>,
}

impl Routed {
    /// Label used in logs and metrics.
    pub fn route_label(&self) -> &'static str {
        if self.hop.is_some() {
            "proxy"
        } else {
            "direct"
        }
    }
}

#[derive(Clone)]
pub struct ProxyRouter {
    client: UpstreamClient,
}

impl ProxyRouter {
    pub fn new(client: UpstreamClient) -> Self {
        Self { client }
    }

    /// Route a request to a proxy hop or to `fallback`.
    pub async fn route(&self, request: Request<Body>, fallback: &Responder) -> Routed {
        match parse_proxy_path(request.uri().path()) {
            Some(hop) => self.forward_hop(hop, request).await,
            None => Routed {
                result: fallback.respond(request).await,
                hop: None,
            },
        }
    }

    async fn forward_hop(&self, hop: ProxyHop, request: Request<Body>) -> Routed {
        let (mut parts, body) = request.into_parts();
        parts.uri = match rewrite_uri(&parts.uri, &hop.remaining_path) {
            Ok(uri) => uri,
            Err(e) => {
                return Routed {
                    result: Err(ResponderError::InvalidTarget {
                        target: hop.target_host_port,
                        reason: e.to_string(),
                    }),
                    hop: None,
                }
            }
        };

        let responder = ForwardResponder::new(hop.target_host_port.clone(), self.client.clone());
        let start = Instant::now();
        let result = responder.respond(Request::from_parts(parts, body)).await;
        let elapsed = start.elapsed();
        responder.close();

        metrics::record_hop(elapsed);
        tracing::debug!(
            target_host = %hop.target_host_port,
            path = %hop.remaining_path,
            elapsed_ms = elapsed.as_millis() as u64,
            "Proxy hop finished"
        );

        Routed {
            result,
            hop: Some(HopTiming {
                target: hop.target_host_port,
                elapsed,
            }),
        }
    }
}

/// Replace the path of `uri`, keeping its query string.
fn rewrite_uri(uri: &Uri, path: &str) -> Result<Uri, axum::http::Error> {
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path.to_string(),
    };
    Uri::builder().path_and_query(path_and_query).build()
}
