//! Observability for routegen.
//!
//! - **Logging**: `tracing-subscriber` with env-filter directives and JSON or
//!   pretty output
//! - **Metrics**: counters recorded through the `metrics` facade
//!
//! The library crates only emit `tracing` events and `metrics` counters;
//! installing a subscriber or recorder is left to the binary or build script
//! driving generation.

#![doc(html_root_url = "https://docs.rs/routegen-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::TelemetryError;
pub use logging::{init_logging, LogConfig, LogFormat};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
