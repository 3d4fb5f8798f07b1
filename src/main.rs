//! httpmole
//!
//! ```text
//!                 ┌──────────────────────────────────────────────┐
//!                 │                   httpmole                   │
//!   request       │  ┌────────┐   ┌────────────┐   ┌──────────┐  │
//!   ──────────────┼─▶│ server │──▶│ dispatcher │──▶│  router  │──┼──▶ /proxy/<hostport>/...
//!                 │  └────────┘   └─────┬──────┘   └────┬─────┘  │     next hop
//!                 │                     │               │        │
//!                 │              traffic log            ▼        │
//!   response      │                (stdout)      ┌───────────┐   │
//!   ◀─────────────┼──────────────────────────────│ responder │   │
//!                 │                              │static/file│   │
//!                 │                              │ /forward  │   │
//!                 │                              └───────────┘   │
//!                 └──────────────────────────────────────────────┘
//! ```

use clap::Parser;
use std::sync::Arc;

use httpmole::config::{self, Cli};
use httpmole::http::HttpServer;
use httpmole::lifecycle::{startup, Shutdown};
use httpmole::observability::{logging, metrics, TrafficLog};
use httpmole::responders::upstream_client;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = config::resolve(&cli)?;

    logging::init(&config.logging);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "httpmole starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let client = upstream_client();
    let responder = Arc::new(startup::build_responder(&config.response, client.clone())?);
    let traffic = TrafficLog::stdout();
    let dispatcher = startup::build_dispatcher(&config, responder.clone(), client, traffic.clone())?;
    let listener = startup::bind(&config.listener).await?;

    let shutdown = Shutdown::new();
    let result = HttpServer::new(dispatcher).run(listener, shutdown.subscribe()).await;
    responder.close();
    traffic.flush().await;
    result?;

    tracing::info!("Shutdown complete");
    Ok(())
}
