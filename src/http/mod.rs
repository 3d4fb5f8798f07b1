//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, catch-all route)
//!     → dispatcher.rs (delay, route, error mapping)
//!         → request.rs (request record, body buffering)
//!         → response.rs (response record, body buffering)
//!     → Send to client
//! ```

pub mod dispatcher;
pub mod request;
pub mod response;
pub mod server;

pub use dispatcher::{DispatchOptions, Dispatcher, HOP_ELAPSED_HEADER};
pub use server::HttpServer;
