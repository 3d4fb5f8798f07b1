//! Outbound response logging.
//!
//! # Responsibilities
//! - Buffer the response body once so it can be both logged and returned
//! - Write status, headers and the formatted body to the traffic log
//!
//! # Design Decisions
//! - The caller always receives the body exactly as produced; formatting and the
//!   `dispatch.max_body_bytes` cut are display only
//! - Only called when response logging is on, so unlogged responses keep streaming

use axum::body::Body;
use axum::http::Response;

use crate::observability::{BodyFormat, LoggedBody, ResponseRecord, TrafficLog};

/// Mirror `response` to the traffic log and hand back an equivalent response.
pub async fn log_response(
    response: Response<Body>,
    traffic: &TrafficLog,
    format: BodyFormat,
    max_body_bytes: usize,
) -> Result<Response<Body>, axum::Error> {
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await?;

    traffic.write(&ResponseRecord {
        status: parts.status,
        headers: parts.headers.clone(),
        body: LoggedBody::clip(&bytes, max_body_bytes),
        format,
    });

    Ok(Response::from_parts(parts, Body::from(bytes)))
}
