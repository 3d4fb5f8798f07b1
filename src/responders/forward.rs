//! Forward responder: relays the request to another host and streams the answer back.
//!
//! # Responsibilities
//! - Retarget the request URI to the configured `host:port`
//! - Preserve method, headers and body (streamed, not buffered)
//! - Return the upstream status, headers and body unmodified
//!
//! # Design Decisions
//! - One shared client per process; responders are cheap to create per hop
//! - The `Host` header is regenerated by the client for the new authority
//! - No timeout beyond the client defaults

use axum::body::Body;
use axum::http::header::HOST;
use axum::http::uri::{Authority, PathAndQuery, Scheme};
use axum::http::{Request, Response, Uri};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use std::str::FromStr;

use crate::responders::ResponderError;

/// HTTP client shared by every forwarding responder.
pub type UpstreamClient = Client<HttpConnector, Body>;

/// Build the process-wide upstream client.
pub fn upstream_client() -> UpstreamClient {
    Client::builder(TokioExecutor::new()).build(HttpConnector::new())
}

#[derive(Clone)]
pub struct ForwardResponder {
    hostport: String,
    client: UpstreamClient,
}

impl ForwardResponder {
    pub fn new(hostport: impl Into<String>, client: UpstreamClient) -> Self {
        Self {
            hostport: hostport.into(),
            client,
        }
    }

    pub fn hostport(&self) -> &str {
        &self.hostport
    }

    /// Relay the request to the configured host.
    pub async fn respond(&self, request: Request<Body>) -> Result<Response<Body>, ResponderError> {
        let (parts, body) = request.into_parts();
        let uri = retarget_uri(&parts.uri, &self.hostport)?;

        let mut forwarded = Request::builder().method(parts.method).uri(uri);
        if let Some(headers) = forwarded.headers_mut() {
            for (name, value) in parts.headers.iter() {
                if name != HOST {
                    headers.append(name.clone(), value.clone());
                }
            }
        }
        let forwarded = forwarded
            .body(body)
            .map_err(|e| ResponderError::InvalidTarget {
                target: self.hostport.clone(),
                reason: e.to_string(),
            })?;

        tracing::debug!(target_uri = %forwarded.uri(), method = %forwarded.method(), "Forwarding request");

        let response = self
            .client
            .request(forwarded)
            .await
            .map_err(|source| ResponderError::Upstream {
                target: self.hostport.clone(),
                source,
            })?;

        let (parts, body) = response.into_parts();
        Ok(Response::from_parts(parts, Body::new(body)))
    }

    /// Nothing to release; the client is shared.
    pub fn close(&self) {}
}

/// Point `uri` at `hostport`, keeping its path and query.
///
/// A relative URI (no authority) becomes `http://<hostport><path>`; an absolute one keeps its
/// scheme and only swaps the authority.
pub fn retarget_uri(uri: &Uri, hostport: &str) -> Result<Uri, ResponderError> {
    let invalid = |reason: String| ResponderError::InvalidTarget {
        target: hostport.to_string(),
        reason,
    };

    let authority = Authority::from_str(hostport).map_err(|e| invalid(e.to_string()))?;
    let mut parts = uri.clone().into_parts();
    if parts.authority.is_none() || parts.scheme.is_none() {
        parts.scheme = Some(Scheme::HTTP);
    }
    parts.authority = Some(authority);
    if parts.path_and_query.is_none() {
        parts.path_and_query = Some(PathAndQuery::from_static("/"));
    }

    Uri::from_parts(parts).map_err(|e| invalid(e.to_string()))
}
