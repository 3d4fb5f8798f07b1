//! httpmole: an HTTP intermediary for development and debugging.
//!
//! Every request is logged and answered by one of three responders: a fixed status and
//! headers, a hot-reloaded JSON response file, or a forward to another host. Paths of the
//! form `/proxy/<hostport>/...` are relayed one hop onward, so instances can be chained.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod responders;
pub mod routing;

pub use config::schema::MoleConfig;
pub use http::{Dispatcher, HttpServer};
pub use lifecycle::Shutdown;
pub use responders::{Responder, ResponderError};
