//! Argument extraction code.
//!
//! Each binding source becomes one `let` statement in the thunk body. Sources
//! that can fail short-circuit the thunk with the client-error result of the
//! extraction error.

use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use routegen_core::{
    BindingSource, FrameworkType, RoutegenError, TypeRef, ValueParser, ValueShape,
};

enum Extraction {
    /// Always yields a value.
    Infallible(TokenStream),
    /// Yields `Result<T, ExtractionError>`.
    Fallible(TokenStream),
}

/// Where a keyed value is looked up.
#[derive(Clone, Copy)]
enum Lookup {
    Route,
    Query,
    Header,
    Form,
    RouteOrQuery,
}

impl Lookup {
    fn source(self, rt: &syn::Path) -> TokenStream {
        match self {
            Self::Route => quote!(#rt::ExtractionSource::Path),
            Self::Query => quote!(#rt::ExtractionSource::Query),
            Self::Header => quote!(#rt::ExtractionSource::Header),
            Self::Form => quote!(#rt::ExtractionSource::Form),
            Self::RouteOrQuery => quote!(#rt::ExtractionSource::RouteOrQuery),
        }
    }
}

/// Generates `let #binding: #declared = ...;` for one argument.
pub(crate) fn bind_statement(
    rt: &syn::Path,
    binding: &syn::Ident,
    name: &str,
    declared: &TypeRef,
    shape: &ValueShape,
    source: &BindingSource,
) -> Result<TokenStream, RoutegenError> {
    let declared_ty = declared.to_syn()?;
    let statement = match extraction(rt, name, declared, shape, source)? {
        Extraction::Infallible(expr) => quote! {
            let #binding: #declared_ty = #expr;
        },
        Extraction::Fallible(expr) => quote! {
            let #binding: #declared_ty = match #expr {
                ::core::result::Result::Ok(value) => value,
                ::core::result::Result::Err(error) => {
                    return #rt::DispatchResult::from_extraction_error(&error);
                }
            };
        },
    };
    Ok(statement)
}

/// Whether the extraction of `source` mentions the parameter's own name
/// rather than only data carried by the binding.
pub(crate) const fn names_parameter(source: &BindingSource) -> bool {
    matches!(
        source,
        BindingSource::AsyncBinderWithParameterInfo { .. } | BindingSource::AsyncBinderContextOnly
    )
}

fn extraction(
    rt: &syn::Path,
    name: &str,
    declared: &TypeRef,
    shape: &ValueShape,
    source: &BindingSource,
) -> Result<Extraction, RoutegenError> {
    let inner = shape.inner.to_syn()?;
    let extraction = match source {
        BindingSource::ExplicitRoute { key, parser } => {
            keyed(rt, Lookup::Route, key, *parser, declared, shape)?
        }
        BindingSource::ExplicitQuery { key, parser } => {
            keyed(rt, Lookup::Query, key, *parser, declared, shape)?
        }
        BindingSource::ExplicitHeader { key, parser } => {
            keyed(rt, Lookup::Header, key, *parser, declared, shape)?
        }
        BindingSource::ExplicitForm { key, parser } => {
            keyed(rt, Lookup::Form, key, *parser, declared, shape)?
        }
        BindingSource::ImplicitRouteOrQuery { key, parser } => {
            keyed(rt, Lookup::RouteOrQuery, key, *parser, declared, shape)?
        }
        BindingSource::ParseWithFormatProvider { key } => keyed(
            rt,
            Lookup::RouteOrQuery,
            key,
            ValueParser::TryParseWithFormat,
            declared,
            shape,
        )?,
        BindingSource::ParseSimple { key } => keyed(
            rt,
            Lookup::RouteOrQuery,
            key,
            ValueParser::TryParse,
            declared,
            shape,
        )?,
        BindingSource::ExplicitBody { allow_empty } => body(rt, declared, *allow_empty)?,
        BindingSource::ImplicitBody => body(rt, declared, shape.optional)?,
        BindingSource::ExplicitServices => {
            if shape.optional {
                Extraction::Infallible(quote!(ctx.services().get::<#inner>()))
            } else {
                Extraction::Fallible(quote!(ctx.services().require::<#inner>()))
            }
        }
        BindingSource::AsyncBinderWithParameterInfo { parameter_name } => {
            let type_name = declared.as_str();
            let call = quote! {
                <#inner>::bind_with_parameter(
                    &ctx,
                    &#rt::ParameterInfo::new(#parameter_name, #type_name),
                )
                .await
            };
            bound(rt, name, shape, call)
        }
        BindingSource::AsyncBinderContextOnly => {
            bound(rt, name, shape, quote!(<#inner>::bind(&ctx).await))
        }
        BindingSource::SpecialFrameworkType { framework } => {
            Extraction::Infallible(framework_value(*framework))
        }
        BindingSource::AsParameters { fields } => {
            let declared_ty = declared.to_syn()?;
            let mut statements = Vec::with_capacity(fields.len());
            let mut initializers = Vec::with_capacity(fields.len());
            for (index, field) in fields.iter().enumerate() {
                let local = format_ident!("field_{}", index);
                let member: syn::Ident = syn::parse_str(&field.name).map_err(|e| {
                    RoutegenError::codegen(format!("invalid field name `{}`: {e}", field.name))
                })?;
                statements.push(bind_statement(
                    rt,
                    &local,
                    &field.name,
                    &field.ty,
                    &field.shape,
                    &field.source,
                )?);
                initializers.push(quote!(#member: #local));
            }
            Extraction::Infallible(quote! {
                {
                    #(#statements)*
                    #declared_ty { #(#initializers),* }
                }
            })
        }
    };
    Ok(extraction)
}

fn keyed(
    rt: &syn::Path,
    lookup: Lookup,
    key: &str,
    parser: ValueParser,
    declared: &TypeRef,
    shape: &ValueShape,
) -> Result<Extraction, RoutegenError> {
    let source = lookup.source(rt);
    let inner = shape.inner.to_syn()?;
    let parse = match parser {
        ValueParser::Deserialize => {
            let declared_ty = declared.to_syn()?;
            return Ok(Extraction::Fallible(quote! {
                #rt::bind::deserialize::<#declared_ty>(&ctx, #source)
            }));
        }
        ValueParser::Identity => quote! {
            |raw: &str| ::core::option::Option::Some(<#inner>::from(raw))
        },
        ValueParser::FromStr => quote! {
            |raw: &str| <#inner as ::core::str::FromStr>::from_str(raw).ok()
        },
        ValueParser::TryParse => quote! {
            |raw: &str| <#inner>::try_parse(raw)
        },
        ValueParser::TryParseWithFormat => quote! {
            |raw: &str| <#inner>::try_parse_with_format(raw, ctx.format_provider())
        },
    };
    let helper = match (shape.optional, shape.sequence) {
        (false, false) => format_ident!("single"),
        (true, false) => format_ident!("optional"),
        (false, true) => format_ident!("sequence"),
        (true, true) => format_ident!("optional_sequence"),
    };
    Ok(Extraction::Fallible(quote! {
        #rt::bind::#helper(#source, #key, #rt::bind::values(&ctx, #source, #key), #parse)
    }))
}

fn body(rt: &syn::Path, declared: &TypeRef, allow_empty: bool) -> Result<Extraction, RoutegenError> {
    let declared_ty = declared.to_syn()?;
    Ok(Extraction::Fallible(quote! {
        #rt::bind::json_body::<#declared_ty>(&ctx, #allow_empty)
    }))
}

/// Binders yield `Option<T>`; `None` is a missing value unless the
/// parameter itself is optional.
fn bound(rt: &syn::Path, name: &str, shape: &ValueShape, call: TokenStream) -> Extraction {
    if shape.optional {
        Extraction::Infallible(call)
    } else {
        Extraction::Fallible(quote!(#rt::bind::bound(#name, #call)))
    }
}

fn framework_value(framework: FrameworkType) -> TokenStream {
    match framework {
        FrameworkType::RequestContext => quote!(ctx.clone()),
        FrameworkType::CancellationToken => quote!(ctx.cancellation().clone()),
        FrameworkType::Principal => quote!(ctx.principal().clone()),
        FrameworkType::HeaderMap => quote!(ctx.headers().clone()),
        FrameworkType::RawBody => quote!(ctx.body().clone()),
    }
}
