//! Command line flags.

use clap::Parser;
use std::path::PathBuf;

use crate::config::schema::MoleConfig;
use crate::observability::format::BodyFormatChoice;

#[derive(Debug, Parser)]
#[command(name = "httpmole")]
#[command(
    about = "Logs incoming HTTP requests and answers them with a fixed, file-backed or forwarded response",
    long_about = None
)]
pub struct Cli {
    /// TOML configuration file. Flags override its values.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Full bind address, e.g. 127.0.0.1:10080
    #[arg(long)]
    pub bind: Option<String>,

    /// JSON response file, reloaded whenever it changes
    #[arg(long)]
    pub response_file: Option<PathBuf>,

    /// Status code of the fixed response
    #[arg(long)]
    pub response_status: Option<u16>,

    /// Header of the fixed response as key:value (repeatable)
    #[arg(long = "response-header")]
    pub response_headers: Vec<String>,

    /// Forward every request to this host:port
    #[arg(long)]
    pub response_from: Option<String>,

    /// Wait this many milliseconds before answering
    #[arg(long)]
    pub delay_ms: Option<u64>,

    /// Also log responses
    #[arg(long)]
    pub log_response: bool,

    /// Only log requests whose method matches this regex
    #[arg(long)]
    pub log_filter_method: Option<String>,

    /// Only log requests whose path matches this regex
    #[arg(long)]
    pub log_filter_path: Option<String>,

    /// How JSON bodies are displayed in the traffic log
    #[arg(long, value_enum)]
    pub log_body_format: Option<BodyFormatChoice>,

    /// Diagnostic log level
    #[arg(long)]
    pub log_level: Option<String>,

    /// Serve Prometheus metrics on this address
    #[arg(long)]
    pub metrics_address: Option<String>,
}

impl Cli {
    /// Overlay the flags that were given onto `config`.
    pub fn apply(&self, config: &mut MoleConfig) {
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(port) = self.port {
            let host = config
                .listener
                .bind_address
                .rsplit_once(':')
                .map(|(host, _)| host)
                .unwrap_or("0.0.0.0");
            config.listener.bind_address = format!("{}:{}", host, port);
        }

        let response = &mut config.response;
        if let Some(file) = &self.response_file {
            response.file = Some(file.clone());
        }
        if let Some(status) = self.response_status {
            response.status = status;
        }
        if !self.response_headers.is_empty() {
            response.headers = self.response_headers.clone();
        }
        if let Some(from) = &self.response_from {
            response.from = Some(from.clone());
        }

        if let Some(delay_ms) = self.delay_ms {
            config.dispatch.delay_ms = delay_ms;
        }

        let logging = &mut config.logging;
        if self.log_response {
            logging.log_response = true;
        }
        if let Some(pattern) = &self.log_filter_method {
            logging.filter_method = Some(pattern.clone());
        }
        if let Some(pattern) = &self.log_filter_path {
            logging.filter_path = Some(pattern.clone());
        }
        if let Some(format) = self.log_body_format {
            logging.body_format = format;
        }
        if let Some(level) = &self.log_level {
            logging.level = level.clone();
        }

        if let Some(address) = &self.metrics_address {
            config.observability.metrics_enabled = true;
            config.observability.metrics_address = address.clone();
        }
    }
}
