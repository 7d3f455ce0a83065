//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional TOML file (--config)
//!     → loader.rs (parse & deserialize, defaults for missing fields)
//!     → environment overlay (PROVIDER_URI, PRIVATE_KEY, ...)
//!     → QueryConfig (immutable, passed by reference)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults; a missing endpoint falls back silently
//! - The private key is never logged or serialized

pub mod loader;
pub mod schema;

pub use loader::{load_config, load_from_env, ConfigError};
pub use schema::QueryConfig;
