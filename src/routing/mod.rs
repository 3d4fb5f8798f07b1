//! Request routing subsystem.
//!
//! # Data Flow
//! ```text
//! request path
//!     → proxy_path.rs (is this `/proxy/<hostport>/...`?)
//!     → router.rs
//!         hop    → throwaway ForwardResponder → upstream
//!         direct → configured Responder
//! ```

pub mod proxy_path;
pub mod router;

pub use proxy_path::{parse_proxy_path, ProxyHop, PROXY_PREFIX};
pub use router::{HopTiming, ProxyRouter, Routed};
