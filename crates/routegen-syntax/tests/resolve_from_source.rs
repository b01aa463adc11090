//! Endpoints resolved from handlers written as Rust source.

use routegen_core::{
    BindingSource, DiagnosticKind, Endpoint, FrameworkType, SignatureProvider, ValueParser,
};
use routegen_resolve::{CapabilityCache, EndpointBuilder};
use routegen_syntax::SourceProvider;
use std::io::Write;

const HANDLERS: &str = r#"
use routegen_runtime::{BindFromContext, CancellationToken, FormatProvider, RequestContext, TryParse};

struct Todo { id: i32, title: String }

enum Status { Open, Done }
impl FromStr for Status {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, String> { todo!() }
}

struct Celsius(f64);
impl Celsius {
    fn try_parse_with_format(raw: &str, format: &FormatProvider) -> Option<Self> { None }
}

struct Tenant(String);
#[async_trait]
impl BindFromContext for Tenant {
    async fn bind(ctx: &RequestContext) -> Option<Self> { None }
}

struct Filters {
    #[from_query(name = "s")]
    status: Option<Status>,
    #[from_header(name = "x-page")]
    page: u32,
}

#[route(get, "/todos/{id}")]
async fn get_todo(id: i32, status: Status, tenant: Tenant, temp: Celsius, token: CancellationToken) -> Todo {
    todo!()
}

#[route(post, "/todos")]
async fn create(#[from_body] todo: Todo, #[from_services] store: Arc<Store>) -> Todo {
    todo!()
}

#[route(get, "/todos")]
async fn list(#[as_parameters] filters: Filters) -> Vec<Todo> {
    todo!()
}

#[route(put, "/todos/{id}")]
async fn replace(#[from_body] a: Todo, #[from_body] b: Todo) {}
"#;

fn endpoints(provider: &SourceProvider) -> Vec<Endpoint> {
    let cache = CapabilityCache::new(provider.catalog());
    let builder = EndpointBuilder::new(&cache, &[]);
    provider
        .registrations()
        .iter()
        .map(|r| builder.build(r).unwrap())
        .collect()
}

fn bindings(endpoint: &Endpoint) -> Vec<BindingSource> {
    endpoint.bindings().map(|b| b.unwrap().clone()).collect()
}

#[test]
fn test_implicit_bindings_follow_declared_capabilities() {
    let provider = SourceProvider::parse(HANDLERS, "todos.rs").unwrap();
    let endpoints = endpoints(&provider);

    assert_eq!(
        bindings(&endpoints[0]),
        vec![
            BindingSource::ImplicitRouteOrQuery {
                key: "id".to_string(),
                parser: ValueParser::FromStr
            },
            BindingSource::ImplicitRouteOrQuery {
                key: "status".to_string(),
                parser: ValueParser::FromStr
            },
            BindingSource::AsyncBinderContextOnly,
            BindingSource::ParseWithFormatProvider {
                key: "temp".to_string()
            },
            BindingSource::SpecialFrameworkType {
                framework: FrameworkType::CancellationToken
            },
        ]
    );
    assert!(!endpoints[0].has_errors());
}

#[test]
fn test_explicit_bindings() {
    let provider = SourceProvider::parse(HANDLERS, "todos.rs").unwrap();
    let endpoints = endpoints(&provider);

    assert_eq!(
        bindings(&endpoints[1]),
        vec![
            BindingSource::ExplicitBody { allow_empty: false },
            BindingSource::ExplicitServices,
        ]
    );

    let BindingSource::AsParameters { fields } = &bindings(&endpoints[2])[0] else {
        panic!("expected as-parameters binding");
    };
    assert_eq!(fields.len(), 2);
    assert_eq!(
        fields[0].source,
        BindingSource::ExplicitQuery {
            key: "s".to_string(),
            parser: ValueParser::FromStr
        }
    );
    assert_eq!(
        fields[1].source,
        BindingSource::ExplicitHeader {
            key: "x-page".to_string(),
            parser: ValueParser::FromStr
        }
    );
}

#[test]
fn test_two_bodies_reported_at_each_parameter() {
    let provider = SourceProvider::parse(HANDLERS, "todos.rs").unwrap();
    let endpoints = endpoints(&provider);
    let replace = &endpoints[3];

    let body_errors: Vec<_> = replace
        .diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::AtMostOneFromBodyAttribute)
        .collect();
    assert_eq!(body_errors.len(), 2);
    assert_ne!(body_errors[0].location, body_errors[1].location);
    assert_eq!(body_errors[0].location.file, "todos.rs");
}

#[test]
fn test_files_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let models = dir.path().join("models.rs");
    let handlers = dir.path().join("handlers.rs");
    std::fs::File::create(&models)
        .unwrap()
        .write_all(b"struct Celsius(f64);\nimpl Celsius { fn try_parse(raw: &str) -> Option<Self> { None } }\n")
        .unwrap();
    std::fs::File::create(&handlers)
        .unwrap()
        .write_all(b"#[route(get, \"/t\")]\nfn t(#[from_query] c: Celsius) {}\n")
        .unwrap();

    let provider = SourceProvider::from_files([&models, &handlers]).unwrap();
    let endpoints = endpoints(&provider);

    assert_eq!(
        bindings(&endpoints[0]),
        vec![BindingSource::ExplicitQuery {
            key: "c".to_string(),
            parser: ValueParser::TryParse
        }]
    );
    assert!(endpoints[0].location.file.ends_with("handlers.rs"));
}
