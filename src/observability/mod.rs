//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! dispatcher
//!     → filter.rs (should this request be shown?)
//!     → traffic.rs (request/response records → stdout)
//!         → format.rs (JSON pretty/minify for display)
//!     → metrics.rs (counters, histograms)
//!
//! everything else
//!     → logging.rs (tracing diagnostics → stderr)
//! ```

pub mod filter;
pub mod format;
pub mod logging;
pub mod metrics;
pub mod traffic;

pub use filter::LogFilter;
pub use format::{BodyFormat, BodyFormatChoice, BodyFormatter};
pub use traffic::{LoggedBody, RequestRecord, ResponseRecord, SharedBuffer, TrafficLog};
