//! Per-request entry point.
//!
//! # Pipeline
//! ```text
//! request
//!     → traffic log (if the filter selects it; non-GET bodies buffered)
//!     → delay
//!     → ProxyRouter (hop) or configured Responder
//!     → hop timing header
//!     → traffic log (if response logging is on)
//!     → caller
//! ```
//!
//! A responder failure becomes `502 Bad Gateway`. While logging, a request body that cannot
//! be read becomes `400 Bad Request` and a response body that cannot be read becomes
//! `502 Bad Gateway`. Body size never changes the answer.

use axum::body::Body;
use axum::http::{HeaderName, HeaderValue, Request, Response, StatusCode};
use axum::response::IntoResponse;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::MoleConfig;
use crate::http::request::log_request;
use crate::http::response::log_response;
use crate::observability::{metrics, BodyFormat, LogFilter, TrafficLog};
use crate::responders::Responder;
use crate::routing::ProxyRouter;

/// Response header carrying the measured duration of a proxy hop.
pub const HOP_ELAPSED_HEADER: HeaderName = HeaderName::from_static("x-mole-hop-elapsed-ms");

/// Dispatcher knobs that do not depend on the responder.
#[derive(Debug, Clone)]
pub struct DispatchOptions {
    pub delay: Option<Duration>,
    pub max_body_bytes: usize,
    pub log_response: bool,
    pub body_format: BodyFormat,
}

impl DispatchOptions {
    pub fn from_config(config: &MoleConfig) -> Self {
        Self {
            delay: config.dispatch.delay(),
            max_body_bytes: config.dispatch.max_body_bytes,
            log_response: config.logging.log_response,
            body_format: config.logging.body_format.resolve(),
        }
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            delay: None,
            max_body_bytes: 2 * 1024 * 1024,
            log_response: false,
            body_format: BodyFormat::Minified,
        }
    }
}

/// Shared handler state; cloned into every request.
#[derive(Clone)]
pub struct Dispatcher {
    responder: Arc<Responder>,
    router: ProxyRouter,
    filter: Arc<LogFilter>,
    traffic: TrafficLog,
    options: DispatchOptions,
}

impl Dispatcher {
    pub fn new(
        responder: Arc<Responder>,
        router: ProxyRouter,
        filter: LogFilter,
        traffic: TrafficLog,
        options: DispatchOptions,
    ) -> Self {
        Self {
            responder,
            router,
            filter: Arc::new(filter),
            traffic,
            options,
        }
    }

    pub fn responder(&self) -> &Arc<Responder> {
        &self.responder
    }

    /// Handle one request end to end.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let span = tracing::info_span!(
            "dispatch",
            request_id = %Uuid::new_v4(),
            method = %request.method(),
            path = %request.uri().path(),
        );
        self.dispatch(request).instrument(span).await
    }

    async fn dispatch(&self, request: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let method = request.method().clone();
        let logged = self.filter.matches(&request);

        let request = if logged {
            match log_request(request, &self.traffic, self.options.max_body_bytes).await {
                Ok(request) => request,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read request body");
                    metrics::record_request(method.as_str(), 400, "direct", start);
                    return StatusCode::BAD_REQUEST.into_response();
                }
            }
        } else {
            request
        };

        if let Some(delay) = self.options.delay {
            tokio::time::sleep(delay).await;
        }

        let routed = self.router.route(request, &self.responder).await;
        let route = routed.route_label();

        let mut response = match routed.result {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    route,
                    responder = self.responder.kind(),
                    "Responder failed"
                );
                StatusCode::BAD_GATEWAY.into_response()
            }
        };

        if let (Some(hop), Some(_)) = (&routed.hop, self.options.delay) {
            let elapsed_ms = hop.elapsed.as_millis().to_string();
            if let Ok(value) = HeaderValue::from_str(&elapsed_ms) {
                response.headers_mut().insert(HOP_ELAPSED_HEADER, value);
            }
        }

        if logged && self.options.log_response {
            response = match log_response(
                response,
                &self.traffic,
                self.options.body_format,
                self.options.max_body_bytes,
            )
            .await
            {
                Ok(response) => response,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to read response body");
                    StatusCode::BAD_GATEWAY.into_response()
                }
            };
        }

        metrics::record_request(method.as_str(), response.status().as_u16(), route, start);
        tracing::debug!(status = response.status().as_u16(), route, "Request dispatched");
        response
    }
}
