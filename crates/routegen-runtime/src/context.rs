//! Request context handed to generated thunks.
//!
//! A [`RequestContext`] is cheap to clone; every part of the request is
//! shared behind one `Arc`.

use crate::binder::FormatProvider;
use crate::services::Services;
use bytes::Bytes;
use http::{HeaderMap, Method, Uri};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// The authenticated caller, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Principal {
    name: Option<String>,
    roles: Vec<String>,
}

impl Principal {
    /// An unauthenticated caller.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated caller.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            roles: Vec::new(),
        }
    }

    /// Adds a role.
    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.roles.push(role.into());
        self
    }

    /// Caller name.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns `true` for an authenticated caller.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.name.is_some()
    }

    /// Returns `true` if the caller has `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Debug)]
struct Inner {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
    route_values: HashMap<String, String>,
    services: Arc<Services>,
    principal: Principal,
    cancellation: CancellationToken,
    format_provider: FormatProvider,
}

/// Everything a thunk can bind parameters from.
///
/// # Example
///
/// ```rust
/// use routegen_runtime::RequestContext;
/// use http::Method;
///
/// let ctx = RequestContext::builder()
///     .method(Method::GET)
///     .uri("/todos/7?verbose=true")
///     .route_value("id", "7")
///     .build();
///
/// assert_eq!(ctx.route_value("id"), Some("7"));
/// assert_eq!(ctx.query_string(), Some("verbose=true"));
/// ```
#[derive(Debug, Clone)]
pub struct RequestContext {
    inner: Arc<Inner>,
}

impl RequestContext {
    /// Starts building a context.
    #[must_use]
    pub fn builder() -> RequestContextBuilder {
        RequestContextBuilder::new()
    }

    /// Returns the HTTP method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.inner.method
    }

    /// Returns the request URI.
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.inner.uri
    }

    /// Returns the query string if present.
    #[must_use]
    pub fn query_string(&self) -> Option<&str> {
        self.inner.uri.query()
    }

    /// Returns the request headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.inner.headers
    }

    /// Returns a header value as a string.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.inner.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Returns the Content-Type header value.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    /// Returns the raw request body.
    #[must_use]
    pub fn body(&self) -> &Bytes {
        &self.inner.body
    }

    /// Returns a route value captured by the route pattern.
    #[must_use]
    pub fn route_value(&self, name: &str) -> Option<&str> {
        self.inner.route_values.get(name).map(String::as_str)
    }

    /// Returns all route values.
    #[must_use]
    pub fn route_values(&self) -> &HashMap<String, String> {
        &self.inner.route_values
    }

    /// Returns the service container.
    #[must_use]
    pub fn services(&self) -> &Services {
        &self.inner.services
    }

    /// Returns the caller.
    #[must_use]
    pub fn principal(&self) -> &Principal {
        &self.inner.principal
    }

    /// Returns the token cancelled when the request is aborted.
    #[must_use]
    pub fn cancellation(&self) -> &CancellationToken {
        &self.inner.cancellation
    }

    /// Returns the format provider used by format-aware parsers.
    #[must_use]
    pub fn format_provider(&self) -> &FormatProvider {
        &self.inner.format_provider
    }
}

/// Builder for [`RequestContext`].
#[derive(Debug, Default)]
pub struct RequestContextBuilder {
    method: Option<Method>,
    uri: Option<Uri>,
    headers: HeaderMap,
    body: Bytes,
    route_values: HashMap<String, String>,
    services: Option<Arc<Services>>,
    principal: Principal,
    cancellation: Option<CancellationToken>,
    format_provider: Option<FormatProvider>,
}

impl RequestContextBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the HTTP method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Sets the URI; an unparsable URI is ignored.
    #[must_use]
    pub fn uri(mut self, uri: &str) -> Self {
        if let Ok(uri) = uri.parse() {
            self.uri = Some(uri);
        }
        self
    }

    /// Sets the headers.
    #[must_use]
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Adds a single header; invalid values are ignored.
    #[must_use]
    pub fn header(mut self, name: &'static str, value: &str) -> Self {
        if let Ok(value) = value.parse() {
            self.headers.append(name, value);
        }
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// Sets a JSON body together with its content type.
    #[must_use]
    pub fn json_body(self, body: impl Into<Bytes>) -> Self {
        self.header("content-type", "application/json").body(body)
    }

    /// Adds a route value.
    #[must_use]
    pub fn route_value(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.route_values.insert(name.into(), value.into());
        self
    }

    /// Replaces all route values.
    #[must_use]
    pub fn route_values(mut self, values: HashMap<String, String>) -> Self {
        self.route_values = values;
        self
    }

    /// Sets the service container.
    #[must_use]
    pub fn services(mut self, services: Arc<Services>) -> Self {
        self.services = Some(services);
        self
    }

    /// Sets the caller.
    #[must_use]
    pub fn principal(mut self, principal: Principal) -> Self {
        self.principal = principal;
        self
    }

    /// Sets the cancellation token.
    #[must_use]
    pub fn cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// Sets the format provider.
    #[must_use]
    pub fn format_provider(mut self, provider: FormatProvider) -> Self {
        self.format_provider = Some(provider);
        self
    }

    /// Builds the context.
    #[must_use]
    pub fn build(self) -> RequestContext {
        RequestContext {
            inner: Arc::new(Inner {
                method: self.method.unwrap_or(Method::GET),
                uri: self.uri.unwrap_or_else(|| Uri::from_static("/")),
                headers: self.headers,
                body: self.body,
                route_values: self.route_values,
                services: self.services.unwrap_or_default(),
                principal: self.principal,
                cancellation: self.cancellation.unwrap_or_default(),
                format_provider: self.format_provider.unwrap_or_default(),
            }),
        }
    }
}
