//! # Routegen
//!
//! **Compile-time endpoint binding resolution and dispatch code generation**
//!
//! Routegen reads route handler signatures, decides where every parameter
//! is bound from, and generates the dispatch code that binds them at run
//! time:
//!
//! - **Binding resolution** - explicit attributes, special framework types,
//!   services, single-value parsers, custom binders and JSON bodies
//! - **Diagnostics** - ambiguous or unbindable parameters are reported with
//!   their source location instead of failing at run time
//! - **Shared thunks** - endpoints with the same binding shape share one
//!   generated dispatch function
//! - **Incremental passes** - unchanged endpoints and thunks come from cache
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use routegen::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ConfigLoader::new()
//!         .with_dotenv(".env")?
//!         .with_optional_file("routegen.toml")?
//!         .with_env_prefix("ROUTEGEN")
//!         .load()?;
//!     routegen::init_logging(&config)?;
//!
//!     let provider = SourceProvider::from_files(["src/handlers.rs"])?;
//!     let mut generator = Generator::new(config)?;
//!     let output = generator.generate(&provider)?;
//!
//!     for diagnostic in &output.diagnostics {
//!         eprintln!("{diagnostic}");
//!     }
//!     output.write_units(std::env::var("OUT_DIR")?.as_ref())?;
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! SignatureProvider → EndpointBuilder → stable order → partition → Emitter
//!   (source/manifest)   (resolve)                        (dedup)    (codegen)
//! ```

#![doc(html_root_url = "https://docs.rs/routegen/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod cache;
mod generator;
mod manifest;
mod output;

pub use cache::{CacheStats, GenerationCache};
pub use generator::Generator;
pub use manifest::ManifestProvider;
pub use output::GenerationOutput;

// Re-export core types
pub use routegen_core as core;

// Re-export binding resolution
pub use routegen_resolve as resolve;

// Re-export code generation
pub use routegen_codegen as codegen;

// Re-export the source front end
pub use routegen_syntax as syntax;
pub use routegen_syntax::SourceProvider;

// Re-export configuration
pub use routegen_config as config;
pub use routegen_config::{ConfigLoader, GeneratorConfig};

// Re-export telemetry
pub use routegen_telemetry as telemetry;

/// Installs the global log subscriber described by `config.logging`.
///
/// # Errors
///
/// Returns an error for an invalid filter directive or when a subscriber
/// is already installed.
pub fn init_logging(config: &GeneratorConfig) -> Result<(), telemetry::TelemetryError> {
    telemetry::init_logging(&telemetry::LogConfig::from(&config.logging))
}

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use routegen::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        CacheStats, ConfigLoader, GenerationOutput, Generator, GeneratorConfig, ManifestProvider,
        SourceProvider,
    };

    pub use routegen_core::{
        Diagnostic, DiagnosticKind, Endpoint, MetadataProvider, MetadataSink, RawRegistration,
        RoutegenError, RoutegenResult, Severity, SignatureProvider, SourceLocation, TypeCatalog,
    };

    pub use routegen_codegen::SourceUnit;
}
