//! Dispatch results.
//!
//! Thunks convert whatever the handler returns into a [`DispatchResult`]:
//! nothing becomes an empty 200, strings become `text/plain`, other values
//! are serialized as JSON, and types implementing [`IntoDispatchResult`]
//! decide for themselves.

use crate::error::ExtractionError;
use bytes::Bytes;
use futures_core::Stream;
use futures_util::StreamExt;
use http::{header, HeaderValue, Response, StatusCode};
use serde::Serialize;
use std::fmt;

const JSON: &str = "application/json";
const TEXT: &str = "text/plain; charset=utf-8";

/// The outcome of dispatching one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResult {
    status: StatusCode,
    content_type: Option<&'static str>,
    body: Bytes,
}

impl DispatchResult {
    /// An empty 200 response.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            status: StatusCode::OK,
            content_type: None,
            body: Bytes::new(),
        }
    }

    /// A `text/plain` 200 response.
    #[must_use]
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            content_type: Some(TEXT),
            body: Bytes::from(body.into()),
        }
    }

    /// A JSON 200 response, or a 500 if `value` does not serialize.
    #[must_use]
    pub fn json<T: Serialize + ?Sized>(value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self {
                status: StatusCode::OK,
                content_type: Some(JSON),
                body: Bytes::from(body),
            },
            Err(e) => {
                tracing::error!(error = %e, "response serialization failed");
                Self::error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SERIALIZATION_FAILED",
                    e.to_string(),
                )
            }
        }
    }

    /// Drains `stream` into a JSON array.
    pub async fn json_stream<S, T>(stream: S) -> Self
    where
        S: Stream<Item = T> + Send,
        T: Serialize + Send,
    {
        let items: Vec<T> = stream.collect().await;
        Self::json(&items)
    }

    /// A JSON error envelope.
    #[must_use]
    pub fn error(status: StatusCode, code: &str, message: impl Into<String>) -> Self {
        #[derive(Serialize)]
        struct ErrorEnvelope<'a> {
            code: &'a str,
            message: String,
        }

        let envelope = ErrorEnvelope {
            code,
            message: message.into(),
        };
        let body = serde_json::to_vec(&envelope).unwrap_or_default();
        Self {
            status,
            content_type: Some(JSON),
            body: Bytes::from(body),
        }
    }

    /// The response for a failed extraction.
    #[must_use]
    pub fn from_extraction_error(error: &ExtractionError) -> Self {
        tracing::debug!(
            source = %error.extraction_source(),
            field = error.field(),
            "argument extraction failed"
        );
        Self::error(error.status_code(), error.error_code(), error.to_string())
    }

    /// Replaces the status code.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Status code.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Content type, `None` for an empty body.
    #[must_use]
    pub fn content_type(&self) -> Option<&'static str> {
        self.content_type
    }

    /// Body bytes.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Body as UTF-8 text, lossy.
    #[must_use]
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Builds the HTTP response.
    #[must_use]
    pub fn into_response(self) -> Response<Bytes> {
        let mut response = Response::new(self.body);
        *response.status_mut() = self.status;
        if let Some(content_type) = self.content_type {
            response
                .headers_mut()
                .insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        response
    }
}

/// Types that know how to become a dispatch result.
pub trait IntoDispatchResult {
    /// Performs the conversion.
    fn into_dispatch_result(self) -> DispatchResult;
}

impl IntoDispatchResult for DispatchResult {
    fn into_dispatch_result(self) -> DispatchResult {
        self
    }
}

impl IntoDispatchResult for StatusCode {
    fn into_dispatch_result(self) -> DispatchResult {
        DispatchResult::empty().with_status(self)
    }
}

impl<T: Serialize, E: fmt::Display> IntoDispatchResult for Result<T, E> {
    fn into_dispatch_result(self) -> DispatchResult {
        match self {
            Ok(value) => DispatchResult::json(&value),
            Err(error) => DispatchResult::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                error.to_string(),
            ),
        }
    }
}
