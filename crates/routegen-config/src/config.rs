//! Root configuration type.

use serde::{Deserialize, Serialize};

use crate::{CacheConfig, ConfigError, EmitConfig, LoggingConfig, OutputConfig};

/// Complete generator configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to load it from files and
/// environment variables.
///
/// # Example
///
/// ```
/// use routegen_config::GeneratorConfig;
///
/// let config = GeneratorConfig::default();
/// assert!(config.validate().is_ok());
/// assert_eq!(config.output.runtime_crate, "::routegen_runtime");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Generated unit settings.
    #[serde(default)]
    pub output: OutputConfig,

    /// Emission settings.
    #[serde(default)]
    pub emit: EmitConfig,

    /// Incremental cache settings.
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl GeneratorConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if:
    /// - The unit name is empty, contains a path separator or lacks `.rs`
    /// - The runtime crate is not a Rust path
    /// - The log level is not a valid filter directive
    pub fn validate(&self) -> Result<(), ConfigError> {
        let unit = &self.output.unit_name;
        if unit.len() <= 3 || !unit.ends_with(".rs") || unit.contains(['/', '\\']) {
            return Err(ConfigError::invalid_value(
                "output.unit_name",
                format!("expected a plain `.rs` file name, got `{unit}`"),
            ));
        }

        if !is_rust_path(&self.output.runtime_crate) {
            return Err(ConfigError::invalid_value(
                "output.runtime_crate",
                format!("not a Rust path: `{}`", self.output.runtime_crate),
            ));
        }

        if let Err(e) = routegen_telemetry::logging::create_env_filter(&self.logging.level) {
            return Err(ConfigError::invalid_value("logging.level", e.to_string()));
        }

        Ok(())
    }

    /// Verbose logging, hints on, cache off so every pass is a full rebuild.
    #[must_use]
    pub fn development() -> Self {
        let mut config = Self::default();
        config.logging.level = "debug".to_string();
        config.cache.enabled = false;
        config
    }

    /// JSON logs for CI. Invalid endpoints are omitted so that a broken
    /// handler cannot ship as a failing stub.
    #[must_use]
    pub fn ci() -> Self {
        let mut config = Self::default();
        config.logging.level = "info".to_string();
        config.logging.format = routegen_telemetry::LogFormat::Json;
        config.emit.invalid_endpoints = crate::InvalidEndpointPolicy::Omit;
        config
    }
}

/// `::a::b`, `a::b` or `crate::a`, each segment an identifier.
fn is_rust_path(path: &str) -> bool {
    let trimmed = path.strip_prefix("::").unwrap_or(path);
    !trimmed.is_empty()
        && trimmed.split("::").all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c == '_' || c.is_ascii_alphabetic())
                && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::InvalidEndpointPolicy;

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.output.unit_name, "generated_endpoints.rs");
        assert_eq!(config.emit.invalid_endpoints, InvalidEndpointPolicy::Stub);
        assert!(config.cache.enabled);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_validate_bad_unit_name() {
        let mut config = GeneratorConfig::default();
        config.output.unit_name = "out/endpoints.rs".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "output.unit_name"));

        config.output.unit_name = "endpoints.txt".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_runtime_crate() {
        let mut config = GeneratorConfig::default();
        config.output.runtime_crate = "crate::runtime".to_string();
        assert!(config.validate().is_ok());

        config.output.runtime_crate = "::".to_string();
        assert!(config.validate().is_err());

        config.output.runtime_crate = "my-runtime".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = GeneratorConfig::default();
        config.logging.level = "routegen=loud".to_string();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "logging.level"));
    }

    #[test]
    fn test_presets() {
        let dev = GeneratorConfig::development();
        assert_eq!(dev.logging.level, "debug");
        assert!(!dev.cache.enabled);

        let ci = GeneratorConfig::ci();
        assert_eq!(ci.logging.format, routegen_telemetry::LogFormat::Json);
        assert_eq!(ci.emit.invalid_endpoints, InvalidEndpointPolicy::Omit);
        assert!(ci.validate().is_ok());
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = GeneratorConfig::ci();
        let text = toml::to_string(&config).unwrap();
        let parsed: GeneratorConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_field_rejected() {
        let result: Result<GeneratorConfig, _> = toml::from_str("[server]\nport = 1");
        assert!(result.is_err());
    }
}
