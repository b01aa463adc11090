//! [`SourceProvider`]: registrations and catalog read from Rust files.

use crate::collect::Collector;
use crate::error::SyntaxError;
use routegen_core::{RawRegistration, SignatureProvider, TypeCatalog};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Signature provider backed by Rust source.
///
/// Files are added one at a time; registrations keep the order in which
/// files were added and, within a file, source order. Declarations of the
/// same type across files and `impl` blocks are merged.
///
/// # Example
///
/// ```
/// use routegen_core::SignatureProvider;
/// use routegen_syntax::SourceProvider;
///
/// let source = r#"
///     #[route(get, "/todos/{id}")]
///     async fn get_todo(#[from_route] id: i32) -> String {
///         format!("todo {id}")
///     }
/// "#;
///
/// let provider = SourceProvider::parse(source, "src/todos.rs").unwrap();
/// assert_eq!(provider.registrations().len(), 1);
/// assert_eq!(provider.registrations()[0].handler, "get_todo");
/// ```
#[derive(Debug, Default)]
pub struct SourceProvider {
    registrations: Vec<RawRegistration>,
    catalog: TypeCatalog,
}

impl SourceProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a single source text.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError`] if the text is not valid Rust or a routegen
    /// attribute is malformed.
    pub fn parse(source: &str, file: &str) -> Result<Self, SyntaxError> {
        let mut provider = Self::new();
        provider.add_source(source, file)?;
        Ok(provider)
    }

    /// Parses every file in `paths`, in order.
    ///
    /// # Errors
    ///
    /// Returns the first read or parse failure.
    pub fn from_files<I, P>(paths: I) -> Result<Self, SyntaxError>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        let mut provider = Self::new();
        for path in paths {
            provider.add_file(path)?;
        }
        Ok(provider)
    }

    /// Adds a source text, reported under the name `file`.
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse). On error nothing from this text is kept.
    pub fn add_source(&mut self, source: &str, file: &str) -> Result<(), SyntaxError> {
        let parsed = syn::parse_file(source).map_err(|e| SyntaxError::parse(file, &e))?;

        let mut collector = Collector::new(file);
        collector.items(&parsed.items, &[])?;

        debug!(
            file,
            registrations = collector.registrations.len(),
            types = collector.types.len(),
            "collected source"
        );

        self.registrations.extend(collector.registrations);
        for decl in collector.types {
            self.catalog.upsert(decl);
        }
        Ok(())
    }

    /// Reads and adds a file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`SyntaxError::Read`] if the file cannot be read, otherwise
    /// see [`parse`](Self::parse).
    pub fn add_file(&mut self, path: impl AsRef<Path>) -> Result<(), SyntaxError> {
        let path = path.as_ref();
        let source = fs::read_to_string(path).map_err(|source| SyntaxError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.add_source(&source, &path.display().to_string())
    }
}

impl SignatureProvider for SourceProvider {
    fn registrations(&self) -> &[RawRegistration] {
        &self.registrations
    }

    fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use routegen_core::{BindTarget, BindingAttribute, MemberKind, TypeKind, TypeRef};

    fn ty(text: &str) -> TypeRef {
        TypeRef::parse(text).unwrap()
    }

    #[test]
    fn test_handler_registration() {
        let source = r#"
            #[route(put, "/todos/{id}")]
            #[route(patch, "/todos/{id}")]
            async fn update(
                #[from_route(name = "id")] todo_id: i32,
                #[from_body(allow_empty)] todo: Option<Todo>,
                store: Arc<Store>,
            ) -> impl Future<Output = Todo> {
                todo!()
            }

            fn helper() {}
        "#;
        let provider = SourceProvider::parse(source, "todos.rs").unwrap();
        let registrations = provider.registrations();

        assert_eq!(registrations.len(), 2);
        assert_eq!(registrations[0].verb, "put");
        assert_eq!(registrations[1].verb, "patch");
        assert_eq!(registrations[0].route, "/todos/{id}");

        let signature = &registrations[0].signature;
        assert!(signature.is_async);
        assert_eq!(signature.parameters.len(), 3);
        assert_eq!(signature.parameters[0].name, "todo_id");
        assert_eq!(
            signature.parameters[0].attributes,
            vec![BindingAttribute::Route {
                name: Some("id".to_string())
            }]
        );
        assert_eq!(ty(&signature.parameters[1].ty), ty("Option<Todo>"));
        assert!(signature.parameters[2].attributes.is_empty());
        assert!(signature.return_type.is_some());
    }

    #[test]
    fn test_locations() {
        let source = "\n#[route(get, \"/a\")]\nfn a(#[from_query] q: String) {}\n";
        let provider = SourceProvider::parse(source, "a.rs").unwrap();
        let registration = &provider.registrations()[0];

        assert_eq!(registration.location.file, "a.rs");
        assert_eq!(registration.location.line, 2);
        assert_eq!(registration.location.column, 1);
        assert_eq!(registration.signature.parameters[0].location.line, 3);
        assert_eq!(registration.signature.return_type, None);
    }

    #[test]
    fn test_handlers_in_modules_and_impls() {
        let source = r#"
            mod api {
                #[route(get, "/health")]
                fn health() -> &'static str { "ok" }

                struct Admin;
                impl Admin {
                    #[route(delete, "/cache")]
                    async fn clear() {}
                }
            }
        "#;
        let provider = SourceProvider::parse(source, "api.rs").unwrap();
        let handlers: Vec<_> = provider.registrations().iter().map(|r| r.handler.as_str()).collect();
        assert_eq!(handlers, vec!["api::health", "api::Admin::clear"]);
    }

    #[test]
    fn test_catalog_members_and_interfaces() {
        let source = r#"
            struct Celsius(f64);
            impl Celsius {
                fn try_parse(raw: &str) -> Option<Self> { None }
                fn try_parse_with_format(raw: &str, format: &FormatProvider) -> Option<Kelvin> { None }
                fn new() -> Self { Celsius(0.0) }
            }
            impl FromStr for Celsius {
                type Err = ();
                fn from_str(s: &str) -> Result<Self, ()> { Err(()) }
            }
        "#;
        let provider = SourceProvider::parse(source, "units.rs").unwrap();
        let decl = provider.catalog().get(&ty("Celsius")).unwrap();

        assert_eq!(decl.members.len(), 2);
        assert_eq!(decl.members[0].kind, MemberKind::TryParse);
        assert_eq!(decl.members[0].binds, BindTarget::SelfType);
        assert_eq!(decl.members[1].binds, BindTarget::Concrete(ty("Kelvin")));
        assert_eq!(decl.interfaces.len(), 1);
        assert_eq!(decl.interfaces[0].name, ty("FromStr"));
        assert!(decl.location.is_some());
    }

    #[test]
    fn test_trait_with_binder_default() {
        let source = r#"
            trait FromTenant: Sized + Send {
                async fn bind(ctx: &RequestContext) -> Option<Self> { None }
            }
            struct Tenant;
            impl FromTenant for Tenant {}
        "#;
        let provider = SourceProvider::parse(source, "tenant.rs").unwrap();
        let catalog = provider.catalog();

        let interface = catalog.get(&ty("FromTenant")).unwrap();
        assert_eq!(interface.kind, TypeKind::Interface);
        assert_eq!(interface.members[0].kind, MemberKind::Bind);
        assert_eq!(interface.interfaces.len(), 2);

        let tenant = catalog.get(&ty("Tenant")).unwrap();
        assert_eq!(tenant.interfaces[0].name, ty("FromTenant"));
    }

    #[test]
    fn test_deref_is_base() {
        let source = r#"
            struct Paged<T> { page: u32, items: Vec<T> }
            struct TodoPage(Paged<Todo>);
            impl Deref for TodoPage {
                type Target = Paged<Todo>;
                fn deref(&self) -> &Self::Target { &self.0 }
            }
        "#;
        let provider = SourceProvider::parse(source, "paging.rs").unwrap();
        let decl = provider.catalog().get(&ty("TodoPage")).unwrap();
        let base = decl.base.as_ref().unwrap();

        assert_eq!(base.name, ty("Paged"));
        assert_eq!(base.args, vec![ty("Todo")]);
        assert!(decl.interfaces.is_empty());
    }

    #[test]
    fn test_struct_fields_for_as_parameters() {
        let source = r#"
            struct ListArgs {
                #[from_query(name = "p")]
                page: Option<u32>,
                #[from_header]
                tenant: String,
            }
            struct Point(i32, i32);
        "#;
        let provider = SourceProvider::parse(source, "args.rs").unwrap();
        let decl = provider.catalog().get(&ty("ListArgs")).unwrap();

        assert_eq!(decl.fields.len(), 2);
        assert_eq!(decl.fields[0].name, "page");
        assert_eq!(decl.fields[0].attributes[0].key(), Some("p"));
        assert!(provider.catalog().get(&ty("Point")).unwrap().fields.is_empty());
    }

    #[test]
    fn test_merge_across_sources() {
        let mut provider = SourceProvider::new();
        provider.add_source("struct Todo { id: i32 }", "model.rs").unwrap();
        provider
            .add_source(
                "impl EndpointMetadataProvider for Todo { fn populate_metadata(m: &mut EndpointMetadata) {} }",
                "meta.rs",
            )
            .unwrap();

        let decl = provider.catalog().get(&ty("Todo")).unwrap();
        assert_eq!(decl.fields.len(), 1);
        assert_eq!(decl.interfaces[0].name, ty("EndpointMetadataProvider"));
        assert_eq!(decl.location.as_ref().unwrap().file, "model.rs");
    }

    #[test]
    fn test_errors() {
        let err = SourceProvider::parse("fn (", "bad.rs").unwrap_err();
        assert!(matches!(err, SyntaxError::Parse { .. }));

        let err = SourceProvider::parse("#[route(\"/x\")] fn x() {}", "bad.rs").unwrap_err();
        assert!(matches!(err, SyntaxError::Attribute { ref attribute, .. } if attribute == "route"));

        let source = "#[route(get, \"/x\")] fn x(#[from_services(name = \"db\")] db: Db) {}";
        let err = SourceProvider::parse(source, "bad.rs").unwrap_err();
        assert!(matches!(err, SyntaxError::Attribute { ref attribute, .. } if attribute == "from_services"));

        let err = SourceProvider::new().add_file("/nonexistent/handlers.rs").unwrap_err();
        assert!(matches!(err, SyntaxError::Read { .. }));
    }

    #[test]
    fn test_unknown_verb_is_kept_for_diagnostics() {
        let provider = SourceProvider::parse("#[route(head, \"/x\")] fn x() {}", "x.rs").unwrap();
        assert_eq!(provider.registrations()[0].verb, "head");
    }
}
