//! Field resolution
//!
//! Operation descriptors name fields symbolically ("value", "y", the
//! chart's own measure name, ...). Each name resolves to one of the four
//! addressable Datum attributes.

use crate::datum::{format_number, parse_number, Datum};

use super::temporal::parse_temporal;

/// Addressable Datum attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccessor {
    Target,
    Value,
    Group,
    Id,
}

impl FieldAccessor {
    /// Resolve a symbolic field name against a datum's axis names.
    ///
    /// Unknown names fall back to `Target`. Axis-name matches ignore case.
    pub fn resolve(field: &str, datum: &Datum) -> Self {
        match field {
            "target" | "x" | "category" => return FieldAccessor::Target,
            "value" | "y" | "measure" => return FieldAccessor::Value,
            "group" | "series" => return FieldAccessor::Group,
            "id" => return FieldAccessor::Id,
            _ => {}
        }

        if field.eq_ignore_ascii_case(&datum.category) {
            FieldAccessor::Target
        } else if field.eq_ignore_ascii_case(&datum.measure) {
            FieldAccessor::Value
        } else {
            FieldAccessor::Target
        }
    }

    /// Returns true if this accessor reads the numeric measure
    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldAccessor::Value)
    }

    /// Read the attribute from a datum
    pub fn read<'a>(&self, datum: &'a Datum) -> FieldValue<'a> {
        match self {
            FieldAccessor::Target => FieldValue::Text(&datum.target),
            FieldAccessor::Value => FieldValue::Number(datum.value),
            FieldAccessor::Group => datum
                .group
                .as_deref()
                .map(FieldValue::Text)
                .unwrap_or(FieldValue::Missing),
            FieldAccessor::Id => datum
                .id
                .as_deref()
                .map(FieldValue::Text)
                .unwrap_or(FieldValue::Missing),
        }
    }
}

/// A borrowed attribute value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    Number(f64),
    Missing,
}

impl FieldValue<'_> {
    /// Finite numeric interpretation, if any
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Text(s) => parse_number(s),
            FieldValue::Number(n) if n.is_finite() => Some(*n),
            _ => None,
        }
    }

    /// String interpretation. Missing reads as the empty string.
    pub fn as_label(&self) -> String {
        match self {
            FieldValue::Text(s) => (*s).to_string(),
            FieldValue::Number(n) => format_number(*n),
            FieldValue::Missing => String::new(),
        }
    }

    /// Timestamp interpretation in milliseconds. Numbers are never dates.
    pub fn as_timestamp(&self) -> Option<i64> {
        match self {
            FieldValue::Text(s) => parse_temporal(s),
            _ => None,
        }
    }
}
