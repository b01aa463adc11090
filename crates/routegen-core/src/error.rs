//! Error types for routegen.
//!
//! [`RoutegenError`] covers API-level failures that are not diagnostics:
//! invalid input documents, unparsable type text, and rendering failures.
//! Problems with an individual registration are always reported as
//! [`Diagnostic`](crate::Diagnostic)s instead.

use thiserror::Error;

/// Result type alias using [`RoutegenError`].
pub type RoutegenResult<T> = Result<T, RoutegenError>;

/// Errors raised by the routegen pipeline and its providers.
#[derive(Debug, Error)]
pub enum RoutegenError {
    /// Type text that does not parse as a Rust type.
    #[error("invalid type `{text}`: {reason}")]
    InvalidType {
        /// The offending text.
        text: String,
        /// Parser message.
        reason: String,
    },

    /// A manifest or catalog document could not be decoded.
    #[error("invalid manifest: {0}")]
    Manifest(#[from] serde_json::Error),

    /// A type was declared twice in the catalog.
    #[error("type `{0}` is declared more than once")]
    DuplicateType(String),

    /// Generated code could not be assembled.
    #[error("code generation failed: {0}")]
    Codegen(String),

    /// A signature provider failed.
    #[error("signature provider failed: {0}")]
    Provider(String),
}

impl RoutegenError {
    /// Creates an invalid type error.
    pub fn invalid_type(text: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidType {
            text: text.into(),
            reason: reason.into(),
        }
    }

    /// Creates a code generation error.
    pub fn codegen(message: impl Into<String>) -> Self {
        Self::Codegen(message.into())
    }

    /// Creates a provider error.
    pub fn provider(message: impl Into<String>) -> Self {
        Self::Provider(message.into())
    }
}
