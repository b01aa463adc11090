//! Typed configuration for the routegen generator.
//!
//! - TOML and JSON configuration files
//! - Environment variable overrides
//! - Strict validation (fails on unknown fields)
//! - Layered configuration (defaults → file → env)
//!
//! # Example
//!
//! ```no_run
//! use routegen_config::ConfigLoader;
//!
//! # fn main() -> Result<(), routegen_config::ConfigError> {
//! let config = ConfigLoader::new()
//!     .with_file("routegen.toml")?
//!     .with_env_prefix("ROUTEGEN")
//!     .load()?;
//!
//! println!("writing {}", config.output.unit_name);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration File Format
//!
//! ```toml
//! [output]
//! unit_name = "generated_endpoints.rs"
//! runtime_crate = "::routegen_runtime"
//!
//! [emit]
//! invalid_endpoints = "stub"   # or "omit"
//! parallel = true
//! emit_hints = true
//!
//! [cache]
//! enabled = true
//!
//! [logging]
//! enabled = true
//! level = "warn"
//! format = "pretty"            # or "json"
//! ```

#![doc(html_root_url = "https://docs.rs/routegen-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod config;
mod error;
mod loader;
mod schema;

pub use config::GeneratorConfig;
pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{CacheConfig, EmitConfig, InvalidEndpointPolicy, LoggingConfig, OutputConfig};

pub use routegen_telemetry::LogFormat;
