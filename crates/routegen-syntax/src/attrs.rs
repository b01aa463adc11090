//! Parsing of routegen attributes.
//!
//! Handlers carry `#[route(verb, "/pattern")]`; their parameters (and the
//! fields of `#[as_parameters]` structs) carry one of the binding attributes
//! below. Attributes are recognised by the last segment of their path, so
//! `#[routegen::route(..)]` works as well.

use routegen_core::BindingAttribute;
use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Ident, LitBool, LitStr, Meta, Token};

pub(crate) const ROUTE: &str = "route";

/// `#[route(get, "/todos/{id}")]`
#[derive(Debug)]
pub(crate) struct RouteAttr {
    pub verb: Ident,
    pub pattern: LitStr,
}

impl Parse for RouteAttr {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let verb: Ident = input.parse()?;
        input.parse::<Token![,]>()?;
        let pattern: LitStr = input.parse()?;
        if input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
        }
        if !input.is_empty() {
            return Err(input.error("expected `#[route(verb, \"/pattern\")]`"));
        }
        Ok(Self { verb, pattern })
    }
}

/// Last path segment of an attribute.
pub(crate) fn attribute_name(attr: &Attribute) -> Option<String> {
    attr.path().segments.last().map(|s| s.ident.to_string())
}

pub(crate) fn is_route(attr: &Attribute) -> bool {
    attribute_name(attr).as_deref() == Some(ROUTE)
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Options {
    None,
    Key,
    AllowEmpty,
}

/// Parses a binding attribute. Attributes that are not routegen's return
/// `Ok(None)`.
pub(crate) fn binding_attribute(attr: &Attribute) -> syn::Result<Option<BindingAttribute>> {
    let Some(name) = attribute_name(attr) else {
        return Ok(None);
    };
    let options = match name.as_str() {
        "from_route" | "from_query" | "from_header" | "from_form" => Options::Key,
        "from_body" => Options::AllowEmpty,
        "from_services" | "as_parameters" => Options::None,
        _ => return Ok(None),
    };

    let mut key = None;
    let mut allow_empty = None;
    match &attr.meta {
        Meta::Path(_) => {}
        Meta::List(_) => attr.parse_nested_meta(|meta| {
            if options == Options::Key && meta.path.is_ident("name") {
                let value: LitStr = meta.value()?.parse()?;
                key = Some(value.value());
                Ok(())
            } else if options == Options::AllowEmpty && meta.path.is_ident("allow_empty") {
                allow_empty = Some(if meta.input.peek(Token![=]) {
                    meta.value()?.parse::<LitBool>()?.value
                } else {
                    true
                });
                Ok(())
            } else {
                Err(meta.error(format!("unsupported argument for `{name}`")))
            }
        })?,
        Meta::NameValue(nv) => {
            return Err(syn::Error::new_spanned(
                nv,
                format!("expected `#[{name}]` or `#[{name}(...)]`"),
            ))
        }
    }

    Ok(Some(match name.as_str() {
        "from_route" => BindingAttribute::Route { name: key },
        "from_query" => BindingAttribute::Query { name: key },
        "from_header" => BindingAttribute::Header { name: key },
        "from_form" => BindingAttribute::Form { name: key },
        "from_body" => BindingAttribute::Body { allow_empty },
        "from_services" => BindingAttribute::Services,
        _ => BindingAttribute::AsParameters,
    }))
}
