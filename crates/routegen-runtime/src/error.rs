//! Extraction error types.
//!
//! Generated thunks turn every failed extraction into a client-error
//! dispatch result; the error carries where the value was looked up and why
//! it could not be produced.

use http::StatusCode;
use std::fmt;

/// Where a parameter value was being extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExtractionSource {
    /// Route values (e.g., `/todos/{id}`)
    Path,
    /// Query string parameters
    Query,
    /// HTTP headers
    Header,
    /// Form fields in the request body
    Form,
    /// Route values, falling back to the query string
    RouteOrQuery,
    /// JSON request body
    Body,
    /// Content-Type header specifically
    ContentType,
    /// The service container
    Services,
    /// A custom binder
    Binder,
}

impl fmt::Display for ExtractionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path => write!(f, "route"),
            Self::Query => write!(f, "query"),
            Self::Header => write!(f, "header"),
            Self::Form => write!(f, "form"),
            Self::RouteOrQuery => write!(f, "route or query"),
            Self::Body => write!(f, "body"),
            Self::ContentType => write!(f, "content-type"),
            Self::Services => write!(f, "service"),
            Self::Binder => write!(f, "binder"),
        }
    }
}

/// Error that occurs while extracting a handler argument.
///
/// # Example
///
/// ```rust
/// use routegen_runtime::{ExtractionError, ExtractionSource};
/// use http::StatusCode;
///
/// let err = ExtractionError::missing(ExtractionSource::Path, "id");
/// assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
/// assert_eq!(err.extraction_source(), ExtractionSource::Path);
/// assert!(err.to_string().contains("id"));
/// ```
#[derive(Debug, Clone)]
pub struct ExtractionError {
    extraction_source: ExtractionSource,
    kind: ExtractionErrorKind,
    field: Option<String>,
    message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExtractionErrorKind {
    /// Required value is missing
    Missing,
    /// Value could not be parsed
    InvalidValue,
    /// Deserialization failed
    DeserializationFailed,
    /// Content-Type is unsupported
    UnsupportedMediaType,
    /// A required service is not registered
    ServiceUnavailable,
}

impl ExtractionError {
    /// Creates an error for a missing value.
    #[must_use]
    pub fn missing(source: ExtractionSource, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::Missing,
            message: format!("missing required {source} value: {field}"),
            field: Some(field),
        }
    }

    /// Creates an error for a value that does not parse.
    #[must_use]
    pub fn invalid_value(
        source: ExtractionSource,
        field: impl Into<String>,
        raw: impl AsRef<str>,
    ) -> Self {
        let field = field.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::InvalidValue,
            message: format!("invalid {source} value '{}' for {field}", raw.as_ref()),
            field: Some(field),
        }
    }

    /// Creates an error for deserialization failure.
    #[must_use]
    pub fn deserialization_failed(source: ExtractionSource, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            extraction_source: source,
            kind: ExtractionErrorKind::DeserializationFailed,
            message: format!("failed to deserialize {source}: {error}"),
            field: None,
        }
    }

    /// Creates an error for unsupported content type.
    #[must_use]
    pub fn unsupported_media_type(expected: &str, actual: Option<&str>) -> Self {
        let actual_str = actual.unwrap_or("none");
        Self {
            extraction_source: ExtractionSource::ContentType,
            kind: ExtractionErrorKind::UnsupportedMediaType,
            message: format!(
                "unsupported content type: expected '{expected}', got '{actual_str}'"
            ),
            field: None,
        }
    }

    /// Creates an error for a service that is not registered.
    #[must_use]
    pub fn service_unavailable(type_name: &str) -> Self {
        Self {
            extraction_source: ExtractionSource::Services,
            kind: ExtractionErrorKind::ServiceUnavailable,
            message: format!("no service of type {type_name} is registered"),
            field: Some(type_name.to_string()),
        }
    }

    /// Returns the extraction source.
    #[must_use]
    pub fn extraction_source(&self) -> ExtractionSource {
        self.extraction_source
    }

    /// Returns the field name if applicable.
    #[must_use]
    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    /// Returns the HTTP status code for this error.
    ///
    /// Everything the client controls maps to a 4xx; a missing service is a
    /// server misconfiguration.
    #[must_use]
    pub fn status_code(&self) -> StatusCode {
        match self.kind {
            ExtractionErrorKind::Missing
            | ExtractionErrorKind::InvalidValue
            | ExtractionErrorKind::DeserializationFailed => StatusCode::BAD_REQUEST,
            ExtractionErrorKind::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ExtractionErrorKind::ServiceUnavailable => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code used in error envelopes.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self.kind {
            ExtractionErrorKind::Missing => "MISSING_PARAMETER",
            ExtractionErrorKind::InvalidValue => "INVALID_PARAMETER",
            ExtractionErrorKind::DeserializationFailed => "DESERIALIZATION_FAILED",
            ExtractionErrorKind::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            ExtractionErrorKind::ServiceUnavailable => "SERVICE_UNAVAILABLE",
        }
    }
}

impl fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExtractionError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_error() {
        let err = ExtractionError::missing(ExtractionSource::Query, "page");

        assert_eq!(err.extraction_source(), ExtractionSource::Query);
        assert_eq!(err.field(), Some("page"));
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), "MISSING_PARAMETER");
        assert_eq!(err.to_string(), "missing required query value: page");
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ExtractionError::invalid_value(ExtractionSource::Path, "id", "abc");

        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("'abc'"));
        assert!(err.to_string().contains("route"));
    }

    #[test]
    fn test_unsupported_media_type() {
        let err = ExtractionError::unsupported_media_type("application/json", Some("text/plain"));

        assert_eq!(err.extraction_source(), ExtractionSource::ContentType);
        assert_eq!(err.status_code(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
        assert!(err.to_string().contains("text/plain"));
    }

    #[test]
    fn test_service_unavailable_is_server_error() {
        let err = ExtractionError::service_unavailable("app::Database");

        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.error_code(), "SERVICE_UNAVAILABLE");
    }

    #[test]
    fn test_source_display() {
        assert_eq!(ExtractionSource::RouteOrQuery.to_string(), "route or query");
        assert_eq!(ExtractionSource::Form.to_string(), "form");
    }
}
