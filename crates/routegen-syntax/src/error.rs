//! Errors raised while reading Rust source.

use routegen_core::SourceLocation;
use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn Rust source into registrations and a catalog.
#[derive(Debug, Error)]
pub enum SyntaxError {
    /// The file is not valid Rust.
    #[error("{location}: {message}")]
    Parse {
        /// Where the parser stopped.
        location: SourceLocation,
        /// Parser message.
        message: String,
    },

    /// A routegen attribute has arguments it does not understand.
    #[error("{location}: invalid `#[{attribute}]`: {message}")]
    Attribute {
        /// The attribute name.
        attribute: String,
        /// Where the attribute is.
        location: SourceLocation,
        /// What is wrong with it.
        message: String,
    },

    /// A source file could not be read.
    #[error("failed to read {path}")]
    Read {
        /// Path to the file.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}

impl SyntaxError {
    pub(crate) fn parse(file: &str, error: &syn::Error) -> Self {
        Self::Parse {
            location: crate::location(file, error.span()),
            message: error.to_string(),
        }
    }

    pub(crate) fn attribute(attribute: &str, file: &str, error: &syn::Error) -> Self {
        Self::Attribute {
            attribute: attribute.to_string(),
            location: crate::location(file, error.span()),
            message: error.to_string(),
        }
    }
}
