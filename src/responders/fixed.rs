//! Static responder: the same status and headers for every request.

use axum::body::Body;
use axum::http::{HeaderMap, Response, StatusCode};

use crate::responders::ResponseSpec;

#[derive(Debug, Clone)]
pub struct StaticResponder {
    spec: ResponseSpec,
}

impl StaticResponder {
    pub fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            spec: ResponseSpec::new(status, headers),
        }
    }

    /// Respond with the configured status and headers and an empty body.
    pub fn respond(&self) -> Response<Body> {
        self.spec.to_response()
    }

    pub fn spec(&self) -> &ResponseSpec {
        &self.spec
    }
}
