//! Layered configuration for pakt.
//!
//! Values are resolved from, lowest priority first: built-in defaults,
//! `pakt.toml` (or the `pakt` field of `package.json`), and `PAKT_*`
//! environment variables.

pub mod config;
pub mod error;
pub mod loading;
pub mod types;
pub mod validation;

pub use config::PaktConfig;
pub use error::{ConfigError, Result};
pub use loading::{CONFIG_FILE, ConfigSource, PACKAGE_JSON_FIELD};
pub use types::{Format, LogLevel};
pub use validation::validate_chunk_name;
