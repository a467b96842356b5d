//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), or the built-in table
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → DevConfig (validated, immutable)
//!     → shared by reference / Arc with the router and the chunk planner
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; there is no hot reload
//! - All fields have defaults, and the defaults are the frontend's own table
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_or_default, parse_config, ConfigError};
pub use schema::{
    BuildOptions, DevConfig, HostOption, Minify, MinifyEngine, ObservabilityConfig, ProxyRule,
    ServerOptions, TimeoutConfig,
};
pub use validation::{validate_config, ValidationError};
