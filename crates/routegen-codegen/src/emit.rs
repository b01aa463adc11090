//! Source emission.
//!
//! A generated unit holds one thunk per dispatch shape followed by one
//! registration function per endpoint. Thunks adapt a typed handler to the
//! runtime's `RequestDelegate`; registration functions map the route and
//! attach endpoint metadata.

use crate::dedup::{GroupKey, ThunkGroup};
use crate::extraction::bind_statement;
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use routegen_core::{
    well_known, AwaitedOutput, Endpoint, HttpVerb, ReturnShape, RoutegenError, TypeRef,
};
use std::collections::{HashMap, HashSet};

const HEADER: &str = "// @generated by routegen. Do not edit.\n";

/// Emission options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmitOptions {
    /// Path of the runtime crate in generated code.
    pub runtime_path: String,
    /// Emit a failing stub for endpoints with errors instead of omitting
    /// them.
    pub stub_invalid: bool,
}

impl Default for EmitOptions {
    fn default() -> Self {
        Self {
            runtime_path: "::routegen_runtime".to_string(),
            stub_invalid: true,
        }
    }
}

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUnit {
    /// File name.
    pub name: String,
    /// Rust source text.
    pub content: String,
}

/// Renders thunks and units.
///
/// The emitter keeps only plain strings so it can be shared across worker
/// threads; token trees are built per call.
#[derive(Debug, Clone)]
pub struct Emitter {
    runtime: String,
    stub_invalid: bool,
}

impl Emitter {
    /// Creates an emitter.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime path is not a Rust path.
    pub fn new(options: &EmitOptions) -> Result<Self, RoutegenError> {
        syn::parse_str::<syn::Path>(&options.runtime_path).map_err(|e| {
            RoutegenError::codegen(format!(
                "invalid runtime path `{}`: {e}",
                options.runtime_path
            ))
        })?;
        Ok(Self {
            runtime: options.runtime_path.clone(),
            stub_invalid: options.stub_invalid,
        })
    }

    fn runtime(&self) -> Result<syn::Path, RoutegenError> {
        syn::parse_str(&self.runtime)
            .map_err(|e| RoutegenError::codegen(format!("invalid runtime path: {e}")))
    }

    /// Renders the thunk of one dispatch shape.
    ///
    /// `endpoint` is any member of the group; all members produce the same
    /// text.
    ///
    /// # Errors
    ///
    /// Returns an error if the endpoint has an unresolved parameter or a
    /// type that does not render.
    pub fn render_thunk(&self, key: &GroupKey, endpoint: &Endpoint) -> Result<String, RoutegenError> {
        let rt = self.runtime()?;
        let name = thunk_ident(key);
        let HandlerBounds { generics, bounds } = handler_bounds(&rt, endpoint)?;

        let mut statements = Vec::with_capacity(endpoint.parameters.len());
        let mut args = Vec::with_capacity(endpoint.parameters.len());
        for (index, parameter) in endpoint.parameters.iter().enumerate() {
            let binding = parameter.binding.as_ref().ok_or_else(|| {
                RoutegenError::codegen(format!(
                    "parameter `{}` of `{}` is unresolved",
                    parameter.descriptor.name, endpoint.handler
                ))
            })?;
            let arg = format_ident!("arg{}", index);
            statements.push(bind_statement(
                &rt,
                &arg,
                &parameter.descriptor.name,
                &parameter.descriptor.ty,
                &parameter.descriptor.shape,
                binding,
            )?);
            args.push(arg);
        }
        let respond = respond(&rt, &endpoint.return_shape, quote!((*handler)(#(#args),*)));

        let item = quote! {
            #[allow(unused_variables, clippy::all)]
            pub fn #name #generics(handler: F) -> #rt::RequestDelegate
            where
                #bounds
            {
                let handler = ::std::sync::Arc::new(handler);
                ::std::sync::Arc::new(move |ctx: #rt::RequestContext| -> #rt::DispatchFuture {
                    let handler = ::std::sync::Arc::clone(&handler);
                    ::std::boxed::Box::pin(async move {
                        #(#statements)*
                        #respond
                    })
                })
            }
        };
        unparse(vec![item])
    }

    /// Renders a complete unit.
    ///
    /// `endpoints` must be in stable order, `groups` must come from
    /// partitioning them and `thunks[i]` must be the rendered thunk of
    /// `groups[i]`.
    ///
    /// # Errors
    ///
    /// Returns an error if a registration does not render.
    pub fn render_unit(
        &self,
        name: &str,
        endpoints: &[Endpoint],
        groups: &[ThunkGroup],
        thunks: &[String],
    ) -> Result<SourceUnit, RoutegenError> {
        if groups.len() != thunks.len() {
            return Err(RoutegenError::codegen(format!(
                "{} thunk groups but {} rendered thunks",
                groups.len(),
                thunks.len()
            )));
        }
        let rt = self.runtime()?;
        let keys: HashMap<usize, &GroupKey> = groups
            .iter()
            .flat_map(|group| group.members.iter().map(move |member| (*member, &group.key)))
            .collect();

        let mut names = RegistrationNames::default();
        let mut registrations = Vec::new();
        for (index, endpoint) in endpoints.iter().enumerate() {
            match keys.get(&index) {
                Some(key) => {
                    let name = names.next(endpoint);
                    registrations.push(registration(&rt, &name, key, endpoint)?);
                }
                None if self.stub_invalid => {
                    let name = names.next(endpoint);
                    registrations.push(stub(&rt, &name, endpoint));
                }
                None => {}
            }
        }

        let prelude = quote! {
            #[allow(unused_imports)]
            use #rt::{
                BindFromContext as _, BindWithParameter as _, TryParse as _,
                TryParseWithFormat as _,
            };
        };

        let mut content = String::from(HEADER);
        content.push('\n');
        content.push_str(&unparse(vec![prelude])?);
        for thunk in thunks {
            content.push('\n');
            content.push_str(thunk);
        }
        if !registrations.is_empty() {
            content.push('\n');
            content.push_str(&unparse(registrations)?);
        }

        tracing::debug!(
            unit = name,
            thunks = thunks.len(),
            endpoints = endpoints.len(),
            bytes = content.len(),
            "rendered unit"
        );
        Ok(SourceUnit {
            name: name.to_string(),
            content,
        })
    }
}

fn thunk_ident(key: &GroupKey) -> syn::Ident {
    format_ident!("thunk_{}", key.as_str())
}

fn unparse(items: Vec<TokenStream>) -> Result<String, RoutegenError> {
    let items = items
        .into_iter()
        .map(syn::parse2::<syn::Item>)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| RoutegenError::codegen(format!("generated item does not parse: {e}")))?;
    Ok(prettyplease::unparse(&syn::File {
        shebang: None,
        attrs: Vec::new(),
        items,
    }))
}

struct HandlerBounds {
    generics: TokenStream,
    bounds: TokenStream,
}

/// Generic parameters and where-clause constraining the handler to the
/// endpoint's signature.
fn handler_bounds(rt: &syn::Path, endpoint: &Endpoint) -> Result<HandlerBounds, RoutegenError> {
    let arg_types = endpoint
        .parameters
        .iter()
        .map(|p| p.descriptor.ty.to_syn())
        .collect::<Result<Vec<_>, _>>()?;
    let callable = quote! {
        ::core::ops::Fn(#(#arg_types),*)
    };
    let thread_safe = quote!(::core::marker::Send + ::core::marker::Sync + 'static);

    let bounds = match &endpoint.return_shape {
        ReturnShape::Void => HandlerBounds {
            generics: quote!(<F>),
            bounds: quote!(F: #callable + #thread_safe,),
        },
        ReturnShape::Value(ty) | ReturnShape::ResultCapability(ty) => {
            let ty = ty.to_syn()?;
            HandlerBounds {
                generics: quote!(<F>),
                bounds: quote!(F: #callable -> #ty + #thread_safe,),
            }
        }
        ReturnShape::Awaitable(output) => {
            let output = match output {
                AwaitedOutput::Unit => quote!(()),
                AwaitedOutput::Value(ty) | AwaitedOutput::ResultCapability(ty) => {
                    let ty = ty.to_syn()?;
                    quote!(#ty)
                }
            };
            HandlerBounds {
                generics: quote!(<F, Fut>),
                bounds: quote! {
                    F: #callable -> Fut + #thread_safe,
                    Fut: ::core::future::Future<Output = #output> + ::core::marker::Send + 'static,
                },
            }
        }
        ReturnShape::Stream(item) => {
            let item = item.to_syn()?;
            HandlerBounds {
                generics: quote!(<F, S>),
                bounds: quote! {
                    F: #callable -> S + #thread_safe,
                    S: #rt::Stream<Item = #item> + ::core::marker::Send + 'static,
                },
            }
        }
    };
    Ok(bounds)
}

/// Invokes the handler and converts its output to a dispatch result.
fn respond(rt: &syn::Path, shape: &ReturnShape, call: TokenStream) -> TokenStream {
    match shape {
        ReturnShape::Void => quote! {
            #call;
            #rt::DispatchResult::empty()
        },
        ReturnShape::Value(ty) => value(rt, ty, call),
        ReturnShape::ResultCapability(_) => quote! {
            #rt::IntoDispatchResult::into_dispatch_result(#call)
        },
        ReturnShape::Awaitable(AwaitedOutput::Unit) => quote! {
            #call.await;
            #rt::DispatchResult::empty()
        },
        ReturnShape::Awaitable(AwaitedOutput::Value(ty)) => value(rt, ty, quote!(#call.await)),
        ReturnShape::Awaitable(AwaitedOutput::ResultCapability(_)) => quote! {
            #rt::IntoDispatchResult::into_dispatch_result(#call.await)
        },
        ReturnShape::Stream(_) => quote! {
            #rt::DispatchResult::json_stream(#call).await
        },
    }
}

fn value(rt: &syn::Path, ty: &TypeRef, call: TokenStream) -> TokenStream {
    if is_text(ty) {
        quote!(#rt::DispatchResult::text(#call))
    } else {
        quote! {
            let output = #call;
            #rt::DispatchResult::json(&output)
        }
    }
}

fn is_text(ty: &TypeRef) -> bool {
    well_known::is_string(ty) || matches!(ty.as_str(), "&str" | "&'static str")
}

fn verb_variant(verb: HttpVerb) -> syn::Ident {
    match verb {
        HttpVerb::Get => format_ident!("Get"),
        HttpVerb::Post => format_ident!("Post"),
        HttpVerb::Put => format_ident!("Put"),
        HttpVerb::Delete => format_ident!("Delete"),
        HttpVerb::Patch => format_ident!("Patch"),
    }
}

fn registration(
    rt: &syn::Path,
    name: &syn::Ident,
    key: &GroupKey,
    endpoint: &Endpoint,
) -> Result<TokenStream, RoutegenError> {
    let HandlerBounds { generics, bounds } = handler_bounds(rt, endpoint)?;
    let thunk = thunk_ident(key);
    let verb = verb_variant(endpoint.verb);
    let route = &endpoint.route;
    let doc = format!(" `{} {}` handled by `{}`.", endpoint.verb, route, endpoint.handler);

    let entries = endpoint.metadata.iter().map(|entry| {
        let (k, v) = (&entry.key, &entry.value);
        quote!(endpoint.metadata_mut().push(#k, #v);)
    });
    let populate = endpoint
        .metadata_types
        .iter()
        .map(|ty| {
            let ty = ty.to_syn()?;
            Ok(quote! {
                <#ty as #rt::EndpointMetadataProvider>::populate_metadata(endpoint.metadata_mut());
            })
        })
        .collect::<Result<Vec<_>, RoutegenError>>()?;

    Ok(quote! {
        #[doc = #doc]
        pub fn #name #generics(
            endpoints: &mut #rt::EndpointRegistry,
            handler: F,
        ) -> &mut #rt::RouteEndpoint
        where
            #bounds
        {
            let endpoint = endpoints.map(#rt::HttpVerb::#verb, #route, #thunk(handler));
            #(#entries)*
            #(#populate)*
            endpoint
        }
    })
}

/// Registration that answers every request with the endpoint's errors.
fn stub(rt: &syn::Path, name: &syn::Ident, endpoint: &Endpoint) -> TokenStream {
    let verb = verb_variant(endpoint.verb);
    let route = &endpoint.route;
    let message = endpoint
        .diagnostics
        .iter()
        .filter(|d| d.is_error())
        .map(|d| format!("{}: {}", d.kind.code(), d.message))
        .collect::<Vec<_>>()
        .join("; ");
    let doc = format!(
        " `{} {}` could not be generated for `{}`.",
        endpoint.verb, route, endpoint.handler
    );
    quote! {
        #[doc = #doc]
        pub fn #name<H>(
            endpoints: &mut #rt::EndpointRegistry,
            _handler: H,
        ) -> &mut #rt::RouteEndpoint {
            endpoints.map(#rt::HttpVerb::#verb, #route, #rt::failing_delegate(#message))
        }
    }
}

/// Hands out unique `map_<verb>_<handler>` names.
#[derive(Default)]
struct RegistrationNames {
    taken: HashSet<String>,
}

impl RegistrationNames {
    fn next(&mut self, endpoint: &Endpoint) -> syn::Ident {
        let base = format!(
            "map_{}_{}",
            endpoint.verb.as_str().to_ascii_lowercase(),
            sanitize(&endpoint.handler)
        );
        let mut name = base.clone();
        let mut suffix = 2;
        while !self.taken.insert(name.clone()) {
            name = format!("{base}_{suffix}");
            suffix += 1;
        }
        format_ident!("{}", name)
    }
}

/// Lowercase, non-alphanumeric runs collapsed to one underscore.
fn sanitize(handler: &str) -> String {
    let mut out = String::with_capacity(handler.len());
    for c in handler.chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    let trimmed = out.trim_matches('_');
    if trimmed.is_empty() {
        "handler".to_string()
    } else {
        trimmed.to_string()
    }
}
