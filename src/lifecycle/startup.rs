//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the configured responder
//! - Build the dispatcher around it
//! - Bind the listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Expects a validated `MoleConfig`, but re-checks what it converts

use axum::http::{HeaderMap, HeaderName, HeaderValue};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::schema::parse_header_line;
use crate::config::{ListenerConfig, MoleConfig, ResponseConfig};
use crate::http::{DispatchOptions, Dispatcher};
use crate::observability::{LogFilter, TrafficLog};
use crate::responders::spec::validate_status_code;
use crate::responders::{
    FileResponder, ForwardResponder, Responder, ResponderError, StaticResponder, UpstreamClient,
};
use crate::routing::ProxyRouter;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid response header {0:?}, expected key:value")]
    Header(String),

    #[error("failed to load response file {path}: {source}")]
    ResponseFile {
        path: PathBuf,
        #[source]
        source: ResponderError,
    },

    #[error(transparent)]
    Responder(#[from] ResponderError),

    #[error("invalid log filter: {0}")]
    Filter(#[from] regex::Error),

    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

/// Parse `key:value` lines into a header multimap, keeping repeated keys.
pub fn header_map(lines: &[String]) -> Result<HeaderMap, StartupError> {
    let mut headers = HeaderMap::new();
    for line in lines {
        let (name, value) =
            parse_header_line(line).ok_or_else(|| StartupError::Header(line.clone()))?;
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| StartupError::Header(line.clone()))?;
        let value = HeaderValue::from_str(value).map_err(|_| StartupError::Header(line.clone()))?;
        headers.append(name, value);
    }
    Ok(headers)
}

/// Choose the responder: response file, then forward target, then static.
pub fn build_responder(
    config: &ResponseConfig,
    client: UpstreamClient,
) -> Result<Responder, StartupError> {
    if let Some(path) = &config.file {
        let responder = FileResponder::new(path).map_err(|source| StartupError::ResponseFile {
            path: path.clone(),
            source,
        })?;
        tracing::info!(path = %responder.path().display(), "Serving response file");
        return Ok(Responder::File(responder));
    }

    if let Some(from) = &config.from {
        tracing::info!(target_host = %from, "Forwarding every request");
        return Ok(Responder::Forward(ForwardResponder::new(from.clone(), client)));
    }

    let status = validate_status_code(i64::from(config.status))?;
    let headers = header_map(&config.headers)?;
    tracing::info!(status = status.as_u16(), headers = headers.len(), "Serving static response");
    Ok(Responder::Static(StaticResponder::new(status, headers)))
}

/// Assemble the dispatcher from the config and an already built responder.
pub fn build_dispatcher(
    config: &MoleConfig,
    responder: Arc<Responder>,
    client: UpstreamClient,
    traffic: TrafficLog,
) -> Result<Dispatcher, StartupError> {
    let filter = LogFilter::from_patterns(
        config.logging.filter_method.as_deref(),
        config.logging.filter_path.as_deref(),
    )?;

    Ok(Dispatcher::new(
        responder,
        ProxyRouter::new(client),
        filter,
        traffic,
        DispatchOptions::from_config(config),
    ))
}

pub async fn bind(config: &ListenerConfig) -> Result<TcpListener, StartupError> {
    let listener = TcpListener::bind(&config.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.bind_address.clone(),
            source,
        })?;

    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, "Listening for connections");
    }
    Ok(listener)
}
