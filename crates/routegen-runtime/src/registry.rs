//! Endpoint registry.
//!
//! Generated registration functions call [`EndpointRegistry::map`] with the
//! thunk of the endpoint's dispatch shape and then attach metadata to the
//! returned [`RouteEndpoint`].

use crate::context::RequestContext;
use crate::result::DispatchResult;
use http::StatusCode;
use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// The future a delegate returns.
pub type DispatchFuture = Pin<Box<dyn Future<Output = DispatchResult> + Send>>;

/// A type-erased request handler.
pub type RequestDelegate = Arc<dyn Fn(RequestContext) -> DispatchFuture + Send + Sync>;

/// HTTP verbs endpoints can be mapped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpVerb {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// DELETE
    Delete,
    /// PATCH
    Patch,
}

impl HttpVerb {
    /// Upper-case verb name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpVerb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key/value metadata attached to an endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointMetadata {
    entries: Vec<(String, String)>,
}

impl EndpointMetadata {
    /// Appends an entry.
    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// First value of `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value of `key`, in insertion order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.entries
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// All entries.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there are no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Types that contribute metadata to every endpoint using them as a
/// parameter or return type.
pub trait EndpointMetadataProvider {
    /// Appends metadata.
    fn populate_metadata(metadata: &mut EndpointMetadata);
}

/// One mapped endpoint.
pub struct RouteEndpoint {
    verb: HttpVerb,
    route: String,
    segments: Vec<Segment>,
    delegate: RequestDelegate,
    metadata: EndpointMetadata,
}

impl RouteEndpoint {
    /// HTTP verb.
    #[must_use]
    pub fn verb(&self) -> HttpVerb {
        self.verb
    }

    /// Route pattern.
    #[must_use]
    pub fn route(&self) -> &str {
        &self.route
    }

    /// Metadata.
    #[must_use]
    pub fn metadata(&self) -> &EndpointMetadata {
        &self.metadata
    }

    /// Mutable metadata.
    pub fn metadata_mut(&mut self) -> &mut EndpointMetadata {
        &mut self.metadata
    }

    /// Invokes the delegate.
    pub fn dispatch(&self, ctx: RequestContext) -> DispatchFuture {
        (self.delegate)(ctx)
    }

    fn matches(&self, path: &str) -> Option<HashMap<String, String>> {
        let mut values = HashMap::new();
        let mut parts = path.trim_matches('/').split('/').filter(|p| !p.is_empty());
        for segment in &self.segments {
            match segment {
                Segment::Literal(literal) => {
                    if parts.next()? != literal.as_str() {
                        return None;
                    }
                }
                Segment::Param(name) => {
                    values.insert(name.clone(), parts.next()?.to_string());
                }
                Segment::CatchAll(name) => {
                    let rest: Vec<&str> = parts.by_ref().collect();
                    values.insert(name.clone(), rest.join("/"));
                }
            }
        }
        parts.next().is_none().then_some(values)
    }
}

impl fmt::Debug for RouteEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEndpoint")
            .field("verb", &self.verb)
            .field("route", &self.route)
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param(String),
    CatchAll(String),
}

/// Parses `/todos/{id}/{*rest}`; constraints after `:` are ignored.
fn segments(route: &str) -> Vec<Segment> {
    route
        .trim_matches('/')
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|s| match s.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(inner) => {
                let name = inner.split(':').next().unwrap_or(inner);
                match name.strip_prefix('*') {
                    Some(rest) => Segment::CatchAll(rest.to_string()),
                    None => Segment::Param(name.trim_end_matches('?').to_string()),
                }
            }
            None => Segment::Literal(s.to_string()),
        })
        .collect()
}

/// A matched endpoint with its route values.
#[derive(Debug)]
pub struct RouteMatch<'a> {
    /// The endpoint.
    pub endpoint: &'a RouteEndpoint,
    /// Values captured by route parameters.
    pub route_values: HashMap<String, String>,
}

/// All mapped endpoints, in mapping order.
#[derive(Debug, Default)]
pub struct EndpointRegistry {
    endpoints: Vec<RouteEndpoint>,
}

impl EndpointRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Maps `route` for `verb` to `delegate`.
    pub fn map(
        &mut self,
        verb: HttpVerb,
        route: &str,
        delegate: RequestDelegate,
    ) -> &mut RouteEndpoint {
        tracing::debug!(%verb, route, "mapping endpoint");
        let index = self.endpoints.len();
        self.endpoints.push(RouteEndpoint {
            verb,
            route: route.to_string(),
            segments: segments(route),
            delegate,
            metadata: EndpointMetadata::default(),
        });
        &mut self.endpoints[index]
    }

    /// Mapped endpoints.
    #[must_use]
    pub fn endpoints(&self) -> &[RouteEndpoint] {
        &self.endpoints
    }

    /// Number of mapped endpoints.
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Returns `true` if nothing is mapped.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// First endpoint in mapping order matching `verb` and `path`.
    #[must_use]
    pub fn route(&self, verb: HttpVerb, path: &str) -> Option<RouteMatch<'_>> {
        self.endpoints
            .iter()
            .filter(|endpoint| endpoint.verb == verb)
            .find_map(|endpoint| {
                endpoint.matches(path).map(|route_values| RouteMatch {
                    endpoint,
                    route_values,
                })
            })
    }
}

/// A delegate answering every request with a 500 and `message`.
///
/// Mapped in place of endpoints that could not be generated.
#[must_use]
pub fn failing_delegate(message: impl Into<String>) -> RequestDelegate {
    let message: Arc<str> = Arc::from(message.into());
    Arc::new(move |_ctx: RequestContext| -> DispatchFuture {
        let message = Arc::clone(&message);
        Box::pin(async move {
            DispatchResult::error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "ENDPOINT_NOT_GENERATED",
                message.as_ref(),
            )
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ok_delegate() -> RequestDelegate {
        Arc::new(|ctx: RequestContext| -> DispatchFuture {
            Box::pin(async move { DispatchResult::text(ctx.route_value("id").unwrap_or("none")) })
        })
    }

    struct Tagged;

    impl EndpointMetadataProvider for Tagged {
        fn populate_metadata(metadata: &mut EndpointMetadata) {
            metadata.push("tag", "tagged");
        }
    }

    #[test]
    fn test_segments() {
        assert_eq!(
            segments("/todos/{id:int}/files/{*path}"),
            vec![
                Segment::Literal("todos".to_string()),
                Segment::Param("id".to_string()),
                Segment::Literal("files".to_string()),
                Segment::CatchAll("path".to_string()),
            ]
        );
    }

    #[test]
    fn test_route_matching() {
        let mut registry = EndpointRegistry::new();
        registry.map(HttpVerb::Get, "/todos", ok_delegate());
        registry.map(HttpVerb::Get, "/todos/{id}", ok_delegate());
        registry.map(HttpVerb::Get, "/files/{*path}", ok_delegate());

        let m = registry.route(HttpVerb::Get, "/todos/42").unwrap();
        assert_eq!(m.endpoint.route(), "/todos/{id}");
        assert_eq!(m.route_values.get("id").map(String::as_str), Some("42"));

        assert_eq!(registry.route(HttpVerb::Get, "/todos").unwrap().endpoint.route(), "/todos");
        assert!(registry.route(HttpVerb::Post, "/todos").is_none());
        assert!(registry.route(HttpVerb::Get, "/todos/1/2").is_none());

        let m = registry.route(HttpVerb::Get, "/files/a/b.txt").unwrap();
        assert_eq!(m.route_values.get("path").map(String::as_str), Some("a/b.txt"));
    }

    #[test]
    fn test_metadata() {
        let mut registry = EndpointRegistry::new();
        let endpoint = registry.map(HttpVerb::Post, "/todos", ok_delegate());
        endpoint.metadata_mut().push("tag", "todos");
        Tagged::populate_metadata(endpoint.metadata_mut());

        let endpoint = &registry.endpoints()[0];
        assert_eq!(endpoint.metadata().len(), 2);
        assert_eq!(endpoint.metadata().get("tag"), Some("todos"));
        assert_eq!(endpoint.metadata().get_all("tag").collect::<Vec<_>>(), vec!["todos", "tagged"]);
    }

    #[tokio::test]
    async fn test_dispatch() {
        let mut registry = EndpointRegistry::new();
        registry.map(HttpVerb::Get, "/todos/{id}", ok_delegate());

        let m = registry.route(HttpVerb::Get, "/todos/5").unwrap();
        let ctx = RequestContext::builder().route_values(m.route_values).build();
        let result = m.endpoint.dispatch(ctx).await;
        assert_eq!(result.body_text(), "5");
    }

    #[tokio::test]
    async fn test_failing_delegate() {
        let delegate = failing_delegate("RG0002: two bodies");
        let result = delegate(RequestContext::builder().build()).await;

        assert_eq!(result.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(result.body_text().contains("RG0002: two bodies"));
    }
}
