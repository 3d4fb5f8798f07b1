//! Response specification and the on-disk response file schema.
//!
//! # Schema
//! ```json
//! {
//!     "status_code": 201,
//!     "headers": { "x-request-id": "abc123" },
//!     "body": "{\"success\": true}"
//! }
//! ```
//!
//! A string body is unescaped into raw bytes, which allows an escaped JSON payload to be
//! embedded as text. An object or array body is served verbatim and gets
//! `Content-Type: application/json` unless a content type was given.

use axum::body::Body;
use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::{HeaderMap, Response, StatusCode};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::value::RawValue;
use serde_json::Map;

use crate::responders::ResponderError;

/// Lowest accepted status code.
pub const MIN_STATUS_CODE: i64 = 100;
/// First rejected status code above the accepted range.
pub const MAX_STATUS_CODE: i64 = 599;

/// Status code, headers and body produced by a responder.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseSpec {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl ResponseSpec {
    /// Create a spec with an empty body.
    pub fn new(status: StatusCode, headers: HeaderMap) -> Self {
        Self {
            status,
            headers,
            body: Bytes::new(),
        }
    }

    /// Parse and classify the content of a response file.
    pub fn from_file_content(content: &[u8]) -> Result<Self, ResponderError> {
        let file: ResponseFile = serde_json::from_slice(content)?;
        let status = validate_status_code(file.status_code)?;

        let mut headers = HeaderMap::new();
        for (name, value) in file.headers {
            let value = value
                .as_str()
                .and_then(|v| HeaderValue::from_str(v).ok())
                .ok_or_else(|| ResponderError::InvalidHeader(name.clone()))?;
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|_| ResponderError::InvalidHeader(name.clone()))?;
            headers.append(name, value);
        }

        let raw = file.body.as_ref().map(|b| b.get().as_bytes()).unwrap_or_default();
        let body = if is_raw_json(raw) {
            if !headers.contains_key(CONTENT_TYPE) {
                headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            Bytes::copy_from_slice(raw)
        } else {
            Bytes::from(unescape_body(raw))
        };

        Ok(Self {
            status,
            headers,
            body,
        })
    }

    /// Render the spec in the response file schema.
    ///
    /// Multi-valued headers collapse to their first value since the schema is single-valued.
    pub fn to_file_content(&self) -> Result<String, ResponderError> {
        let mut headers = Map::new();
        for name in self.headers.keys() {
            if let Some(value) = self.headers.get(name).and_then(|v| v.to_str().ok()) {
                headers.insert(name.to_string(), value.into());
            }
        }

        let body = if is_raw_json(&self.body) {
            serde_json::from_slice::<serde_json::Value>(&self.body)?
        } else {
            serde_json::Value::String(String::from_utf8_lossy(&self.body).into_owned())
        };

        let content = serde_json::json!({
            "status_code": self.status.as_u16(),
            "headers": headers,
            "body": body,
        });
        Ok(serde_json::to_string_pretty(&content)?)
    }

    /// Build an HTTP response carrying a copy of this spec.
    pub fn to_response(&self) -> Response<Body> {
        let mut response = Response::new(Body::from(self.body.clone()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers.clone();
        response
    }
}

/// Raw shape of a response file before validation.
#[derive(Debug, Deserialize)]
struct ResponseFile {
    status_code: i64,
    #[serde(default)]
    headers: Map<String, serde_json::Value>,
    #[serde(default)]
    body: Option<Box<RawValue>>,
}

/// Accept status codes in `[100, 599)`.
pub fn validate_status_code(code: i64) -> Result<StatusCode, ResponderError> {
    if !(MIN_STATUS_CODE..MAX_STATUS_CODE).contains(&code) {
        return Err(ResponderError::InvalidStatusCode(code));
    }
    StatusCode::from_u16(code as u16).map_err(|_| ResponderError::InvalidStatusCode(code))
}

/// A body is raw JSON when it starts with an object or array.
pub fn is_raw_json(body: &[u8]) -> bool {
    matches!(body.first(), Some(b'{') | Some(b'['))
}

/// Strip wrapping quotes and undo `\"` escaping.
///
/// Other escapes such as `\n` are passed through untouched, as is a trailing backslash.
pub fn unescape_body(body: &[u8]) -> Vec<u8> {
    let mut body = body;
    if let Some(rest) = body.strip_prefix(b"\"") {
        body = rest;
    }
    if let Some(rest) = body.strip_suffix(b"\"") {
        body = rest;
    }

    let mut unescaped = Vec::with_capacity(body.len());
    for (i, byte) in body.iter().enumerate() {
        if *byte == b'\\' && body.get(i + 1) == Some(&b'"') {
            continue;
        }
        unescaped.push(*byte);
    }
    unescaped
}
