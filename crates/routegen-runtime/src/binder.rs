//! Binding and parsing capabilities.
//!
//! A type opts into a binding strategy by implementing one of these traits
//! (or by declaring an inherent function with the same name and shape).
//! Generated code calls them through fully qualified paths, so an inherent
//! function takes precedence over a trait implementation.

use crate::context::RequestContext;
use async_trait::async_trait;

/// Culture-like information used by format-aware parsers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatProvider {
    locale: String,
    decimal_separator: char,
    group_separator: Option<char>,
}

impl Default for FormatProvider {
    fn default() -> Self {
        Self::invariant()
    }
}

impl FormatProvider {
    /// The invariant format: `.` as decimal separator, no grouping.
    #[must_use]
    pub fn invariant() -> Self {
        Self {
            locale: "invariant".to_string(),
            decimal_separator: '.',
            group_separator: None,
        }
    }

    /// A named format.
    #[must_use]
    pub fn new(locale: impl Into<String>, decimal_separator: char) -> Self {
        Self {
            locale: locale.into(),
            decimal_separator,
            group_separator: None,
        }
    }

    /// Sets the digit group separator.
    #[must_use]
    pub fn with_group_separator(mut self, separator: char) -> Self {
        self.group_separator = Some(separator);
        self
    }

    /// Locale name.
    #[must_use]
    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Decimal separator.
    #[must_use]
    pub fn decimal_separator(&self) -> char {
        self.decimal_separator
    }

    /// Rewrites a localized number into the invariant form understood by
    /// `str::parse`.
    ///
    /// ```rust
    /// use routegen_runtime::FormatProvider;
    ///
    /// let de = FormatProvider::new("de-DE", ',').with_group_separator('.');
    /// assert_eq!(de.normalize_number("1.234,5"), "1234.5");
    /// ```
    #[must_use]
    pub fn normalize_number(&self, raw: &str) -> String {
        raw.trim()
            .chars()
            .filter(|c| Some(*c) != self.group_separator)
            .map(|c| if c == self.decimal_separator { '.' } else { c })
            .collect()
    }
}

/// Name and declared type of the parameter being bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterInfo {
    name: &'static str,
    type_name: &'static str,
}

impl ParameterInfo {
    /// Creates the parameter info.
    #[must_use]
    pub const fn new(name: &'static str, type_name: &'static str) -> Self {
        Self { name, type_name }
    }

    /// Parameter name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Declared parameter type.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        self.type_name
    }
}

/// Parses a value from a single string.
pub trait TryParse: Sized {
    /// Returns `None` if `raw` is not a valid value.
    fn try_parse(raw: &str) -> Option<Self>;
}

/// Parses a value from a single string using a format provider.
pub trait TryParseWithFormat: Sized {
    /// Returns `None` if `raw` is not a valid value.
    fn try_parse_with_format(raw: &str, format: &FormatProvider) -> Option<Self>;
}

/// Binds a value from the whole request.
#[async_trait]
pub trait BindFromContext: Sized + Send {
    /// Returns `None` if no value can be bound.
    async fn bind(ctx: &RequestContext) -> Option<Self>;
}

/// Binds a value from the whole request, knowing which parameter it is for.
#[async_trait]
pub trait BindWithParameter: Sized + Send {
    /// Returns `None` if no value can be bound.
    async fn bind_with_parameter(ctx: &RequestContext, parameter: &ParameterInfo) -> Option<Self>;
}
