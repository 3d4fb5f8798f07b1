//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Value ranges (status code, addresses)
//! - Header line syntax and HTTP validity
//! - Regex compilation for log filters
//! - Mutually exclusive response sources
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Pure function: MoleConfig → Result<(), Vec<ValidationError>>
//! - Runs before any responder is built

use axum::http::header::{HeaderName, HeaderValue};
use axum::http::uri::Authority;
use std::net::SocketAddr;
use std::str::FromStr;
use thiserror::Error;

use crate::config::schema::{parse_header_line, MoleConfig};
use crate::responders::spec::validate_status_code;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address {0:?}")]
    BindAddress(String),

    #[error("response status {0} is outside [100, 599)")]
    StatusCode(u16),

    #[error("invalid response header {0:?}, expected key:value")]
    HeaderLine(String),

    #[error("response file and response source are mutually exclusive")]
    ConflictingSources,

    #[error("invalid response source {0:?}, expected host:port")]
    ResponseFrom(String),

    #[error("invalid {field} regex: {reason}")]
    Regex { field: &'static str, reason: String },

    #[error("invalid metrics address {0:?}")]
    MetricsAddress(String),
}

pub fn validate_config(config: &MoleConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if SocketAddr::from_str(&config.listener.bind_address).is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    let response = &config.response;
    if validate_status_code(i64::from(response.status)).is_err() {
        errors.push(ValidationError::StatusCode(response.status));
    }
    for line in &response.headers {
        let valid = parse_header_line(line).is_some_and(|(name, value)| {
            HeaderName::from_str(name).is_ok() && HeaderValue::from_str(value).is_ok()
        });
        if !valid {
            errors.push(ValidationError::HeaderLine(line.clone()));
        }
    }
    if response.file.is_some() && response.from.is_some() {
        errors.push(ValidationError::ConflictingSources);
    }
    if let Some(from) = &response.from {
        if Authority::from_str(from).is_err() {
            errors.push(ValidationError::ResponseFrom(from.clone()));
        }
    }

    let logging = &config.logging;
    for (field, pattern) in [
        ("log-filter-method", &logging.filter_method),
        ("log-filter-path", &logging.filter_path),
    ] {
        if let Some(Err(e)) = pattern.as_deref().map(regex::Regex::new) {
            errors.push(ValidationError::Regex {
                field,
                reason: e.to_string(),
            });
        }
    }

    if config.observability.metrics_enabled
        && SocketAddr::from_str(&config.observability.metrics_address).is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
