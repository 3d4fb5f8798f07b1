//! Inbound request logging.
//!
//! # Responsibilities
//! - Build the traffic record for an inbound request
//! - Buffer non-GET bodies so they can be logged, then reinstall them
//!
//! # Design Decisions
//! - GET bodies are never read
//! - Bodies are buffered whole; `dispatch.max_body_bytes` only limits what the log shows
//! - A failed read is still logged, request line and headers first, then the error

use axum::body::Body;
use axum::http::{Method, Request};
use chrono::Local;

use crate::observability::{LoggedBody, RequestRecord, TrafficLog};

/// Write `request` to the traffic log and hand back an equivalent request.
pub async fn log_request(
    request: Request<Body>,
    traffic: &TrafficLog,
    max_body_bytes: usize,
) -> Result<Request<Body>, axum::Error> {
    let (parts, body) = request.into_parts();
    let mut record = RequestRecord {
        timestamp: Local::now(),
        method: parts.method.clone(),
        uri: parts.uri.clone(),
        headers: parts.headers.clone(),
        body: None,
    };

    let body = if parts.method == Method::GET {
        body
    } else {
        match axum::body::to_bytes(body, usize::MAX).await {
            Ok(bytes) => {
                record.body = Some(LoggedBody::clip(&bytes, max_body_bytes));
                Body::from(bytes)
            }
            Err(e) => {
                traffic.write(&format!("{}error reading request body: {}\n\n", record, e));
                return Err(e);
            }
        }
    };

    traffic.write(&record);
    Ok(Request::from_parts(parts, body))
}
