//! Header and query coercion.
//!
//! Both functions fold over `(key, raw value)` pairs with a per-value total
//! coercion. Unexpected shapes are dropped, never reported.

use serde_json::Value;

use crate::http::{HttpHeaders, HttpQueryParams};

/// A header value as the host server exposes it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawHeaderValue {
    Absent,
    Single(String),
    /// Repeated header lines, in arrival order.
    Multiple(Vec<String>),
    /// Present but not representable as a string (e.g. non-UTF-8 bytes).
    Opaque,
}

/// A query value as an extended (bracket-notation) parser produces it:
/// strings, arrays, and nested objects.
pub type RawQueryValue = Value;

/// Coerce a single header value. The last of several values wins.
pub fn coerce_header(value: RawHeaderValue) -> Option<String> {
    match value {
        RawHeaderValue::Single(v) => Some(v),
        RawHeaderValue::Multiple(mut values) => values.pop(),
        RawHeaderValue::Absent | RawHeaderValue::Opaque => None,
    }
}

/// Coerce a single query value.
///
/// Arrays keep their last element (JSON text if it is not a string); objects
/// become JSON text; null, booleans and numbers are dropped.
pub fn coerce_query(value: &RawQueryValue) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => match items.last()? {
            Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        },
        Value::Object(_) => Some(value.to_string()),
        Value::Null | Value::Bool(_) | Value::Number(_) => None,
    }
}

/// Build [`HttpHeaders`] from raw entries. Names are lowercased; a later
/// entry for the same name replaces an earlier one.
pub fn normalize_headers<I, K>(entries: I) -> HttpHeaders
where
    I: IntoIterator<Item = (K, RawHeaderValue)>,
    K: AsRef<str>,
{
    entries
        .into_iter()
        .filter_map(|(name, raw)| {
            coerce_header(raw).map(|value| (name.as_ref().to_ascii_lowercase(), value))
        })
        .collect()
}

/// Build [`HttpQueryParams`] from raw entries.
pub fn normalize_query<I, K>(entries: I) -> HttpQueryParams
where
    I: IntoIterator<Item = (K, RawQueryValue)>,
    K: Into<String>,
{
    entries
        .into_iter()
        .filter_map(|(name, raw)| coerce_query(&raw).map(|value| (name.into(), value)))
        .collect()
}
