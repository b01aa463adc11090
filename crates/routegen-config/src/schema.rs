//! Configuration schema types.
//!
//! This module defines the structure of all configuration sections.

use routegen_telemetry::{LogConfig, LogFormat};
use serde::{Deserialize, Serialize};

/// Output section: where generated code goes and what it refers to.
///
/// # Example
///
/// ```
/// use routegen_config::OutputConfig;
///
/// let config = OutputConfig::default();
/// assert_eq!(config.unit_name, "generated_endpoints.rs");
/// assert_eq!(config.runtime_crate, "::routegen_runtime");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    /// File name of the generated source unit.
    #[serde(default = "default_unit_name")]
    pub unit_name: String,

    /// Path generated code uses to reach the runtime crate.
    #[serde(default = "default_runtime_crate")]
    pub runtime_crate: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            unit_name: default_unit_name(),
            runtime_crate: default_runtime_crate(),
        }
    }
}

fn default_unit_name() -> String {
    "generated_endpoints.rs".to_string()
}

fn default_runtime_crate() -> String {
    "::routegen_runtime".to_string()
}

/// What to emit for an endpoint that has error diagnostics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum InvalidEndpointPolicy {
    /// Emit a registration whose delegate fails every request with the
    /// diagnostics that blocked generation.
    #[default]
    Stub,
    /// Emit nothing for the endpoint.
    Omit,
}

/// Emit section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EmitConfig {
    /// Handling of endpoints with errors.
    #[serde(default)]
    pub invalid_endpoints: InvalidEndpointPolicy,

    /// Build endpoints and render thunks on the rayon pool.
    #[serde(default = "default_true")]
    pub parallel: bool,

    /// Report informational hints (e.g. unreachable binders).
    #[serde(default = "default_true")]
    pub emit_hints: bool,
}

impl Default for EmitConfig {
    fn default() -> Self {
        Self {
            invalid_endpoints: InvalidEndpointPolicy::Stub,
            parallel: true,
            emit_hints: true,
        }
    }
}

/// Incremental cache section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct CacheConfig {
    /// Reuse endpoints and thunks across generation passes.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Logging section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Install a subscriber when the generator starts.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Filter directive (e.g. "info", "routegen_resolve=debug").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            enabled: config.enabled,
            level: config.level.clone(),
            format: config.format,
            ..LogConfig::default()
        }
    }
}

fn default_true() -> bool {
    true
}
