//! Extraction helpers called by generated thunks.
//!
//! Lookups return every raw value found for a key, or the error from
//! decoding the query string or form body; the arity helpers ([`single`],
//! [`optional`], [`sequence`], [`optional_sequence`]) then apply the parser
//! chosen at generation time.

use crate::context::RequestContext;
use crate::error::{ExtractionError, ExtractionSource};
use serde::de::DeserializeOwned;

const JSON: &str = "application/json";
const FORM: &str = "application/x-www-form-urlencoded";

/// Raw values of `key` in `source`.
///
/// Route-or-query lookups prefer the route value and fall back to the query
/// string.
///
/// # Errors
///
/// Deserialization failure if the query string or form body does not
/// decode.
pub fn values(
    ctx: &RequestContext,
    source: ExtractionSource,
    key: &str,
) -> Result<Vec<String>, ExtractionError> {
    let values = match source {
        ExtractionSource::Path => ctx.route_value(key).map(str::to_string).into_iter().collect(),
        ExtractionSource::Query => matching(query_pairs(ctx)?, key),
        ExtractionSource::Header => ctx
            .headers()
            .get_all(key)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect(),
        ExtractionSource::Form => matching(form_pairs(ctx)?, key),
        ExtractionSource::RouteOrQuery => match ctx.route_value(key) {
            Some(value) => vec![value.to_string()],
            None => matching(query_pairs(ctx)?, key),
        },
        ExtractionSource::Body
        | ExtractionSource::ContentType
        | ExtractionSource::Services
        | ExtractionSource::Binder => Vec::new(),
    };
    Ok(values)
}

fn matching(pairs: Vec<(String, String)>, key: &str) -> Vec<String> {
    pairs
        .into_iter()
        .filter(|(k, _)| k == key)
        .map(|(_, v)| v)
        .collect()
}

type Pairs = Result<Vec<(String, String)>, ExtractionError>;

fn query_pairs(ctx: &RequestContext) -> Pairs {
    let Some(query) = ctx.query_string() else {
        return Ok(Vec::new());
    };
    serde_urlencoded::from_str(query)
        .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Query, e.to_string()))
}

fn form_pairs(ctx: &RequestContext) -> Pairs {
    if !ctx.content_type().is_some_and(|ct| media_type(ct) == FORM) {
        return Ok(Vec::new());
    }
    serde_urlencoded::from_bytes(ctx.body())
        .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Form, e.to_string()))
}

fn media_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

fn is_json(content_type: &str) -> bool {
    let media = media_type(content_type);
    media == JSON || media.ends_with("+json")
}

/// Exactly one value, parsed.
///
/// # Errors
///
/// The lookup error, missing if there is no value, invalid if the first
/// value does not parse.
pub fn single<T>(
    source: ExtractionSource,
    key: &str,
    values: Result<Vec<String>, ExtractionError>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, ExtractionError> {
    let values = values?;
    let Some(raw) = values.first() else {
        return Err(ExtractionError::missing(source, key));
    };
    parse(raw).ok_or_else(|| ExtractionError::invalid_value(source, key, raw))
}

/// At most one value, parsed; absent and empty values are `None`.
///
/// # Errors
///
/// The lookup error, or invalid if a non-empty value does not parse.
pub fn optional<T>(
    source: ExtractionSource,
    key: &str,
    values: Result<Vec<String>, ExtractionError>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<T>, ExtractionError> {
    match values?.first() {
        None => Ok(None),
        Some(raw) if raw.is_empty() => Ok(None),
        Some(raw) => parse(raw)
            .map(Some)
            .ok_or_else(|| ExtractionError::invalid_value(source, key, raw)),
    }
}

/// Every value, parsed; no values is an empty sequence.
///
/// # Errors
///
/// The lookup error, or invalid if any value does not parse.
pub fn sequence<T>(
    source: ExtractionSource,
    key: &str,
    values: Result<Vec<String>, ExtractionError>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Vec<T>, ExtractionError> {
    values?
        .iter()
        .map(|raw| parse(raw).ok_or_else(|| ExtractionError::invalid_value(source, key, raw)))
        .collect()
}

/// Like [`sequence`], but no values is `None`.
///
/// # Errors
///
/// The lookup error, or invalid if any value does not parse.
pub fn optional_sequence<T>(
    source: ExtractionSource,
    key: &str,
    values: Result<Vec<String>, ExtractionError>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<Option<Vec<T>>, ExtractionError> {
    let values = values?;
    if values.is_empty() {
        return Ok(None);
    }
    sequence(source, key, Ok(values), parse).map(Some)
}

/// A value produced by a binder that must not decline.
///
/// # Errors
///
/// Missing if the binder returned `None`.
pub fn bound<T>(name: &str, value: Option<T>) -> Result<T, ExtractionError> {
    value.ok_or_else(|| ExtractionError::missing(ExtractionSource::Binder, name))
}

/// Decodes the JSON request body.
///
/// An empty body decodes as `null` when `allow_empty` is set, so optional
/// targets become `None`.
///
/// # Errors
///
/// Missing for a disallowed empty body, unsupported media type for a
/// non-JSON content type, deserialization failure for bad JSON.
pub fn json_body<T: DeserializeOwned>(
    ctx: &RequestContext,
    allow_empty: bool,
) -> Result<T, ExtractionError> {
    let body = ctx.body();
    if body.is_empty() {
        if allow_empty {
            return serde_json::from_slice(b"null")
                .map_err(|_| ExtractionError::missing(ExtractionSource::Body, "body"));
        }
        return Err(ExtractionError::missing(ExtractionSource::Body, "body"));
    }

    let content_type = ctx.content_type();
    if !content_type.is_some_and(is_json) {
        return Err(ExtractionError::unsupported_media_type(JSON, content_type));
    }

    serde_json::from_slice(body)
        .map_err(|e| ExtractionError::deserialization_failed(ExtractionSource::Body, e.to_string()))
}

/// Deserializes the whole source as a flat key/value map.
///
/// Used for parameters whose type has no single-value parser but
/// implements `Deserialize`.
///
/// # Errors
///
/// Deserialization failure if the values do not fit `T`.
pub fn deserialize<T: DeserializeOwned>(
    ctx: &RequestContext,
    source: ExtractionSource,
) -> Result<T, ExtractionError> {
    let pairs = match source {
        ExtractionSource::Path => sorted_route_values(ctx),
        ExtractionSource::Query => query_pairs(ctx)?,
        ExtractionSource::Form => form_pairs(ctx)?,
        ExtractionSource::Header => ctx
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect(),
        ExtractionSource::RouteOrQuery => {
            let mut pairs = sorted_route_values(ctx);
            pairs.extend(
                query_pairs(ctx)?
                    .into_iter()
                    .filter(|(k, _)| ctx.route_value(k).is_none()),
            );
            pairs
        }
        ExtractionSource::Body
        | ExtractionSource::ContentType
        | ExtractionSource::Services
        | ExtractionSource::Binder => Vec::new(),
    };
    let encoded = serde_urlencoded::to_string(&pairs)
        .map_err(|e| ExtractionError::deserialization_failed(source, e.to_string()))?;
    serde_urlencoded::from_str(&encoded)
        .map_err(|e| ExtractionError::deserialization_failed(source, e.to_string()))
}

fn sorted_route_values(ctx: &RequestContext) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = ctx
        .route_values()
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();
    pairs.sort();
    pairs
}
