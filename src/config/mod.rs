//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! command line (cli.rs)
//!     → optional TOML file (loader.rs)
//!     → flags applied over file values
//!     → validation.rs (semantic checks)
//!     → MoleConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; only the response file is reloaded at runtime
//! - All fields have defaults so running with no flags serves a bare 200
//! - Validation separates syntactic (serde) from semantic checks

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{load_config, resolve, ConfigError};
pub use schema::{
    DispatchConfig, ListenerConfig, LoggingConfig, MoleConfig, ObservabilityConfig,
    ResponseConfig,
};
