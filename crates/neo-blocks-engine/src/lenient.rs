//! Forgiving reads of posted form values.
//!
//! Browsers post everything as strings and stale clients post whatever they
//! like, so these never fail: anything unusable reads as the type's empty value.

use serde_json::Value;

/// Form-style emptiness: null, false, 0, "", "0" and empty arrays/objects
pub(crate) fn is_empty(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::Bool(b)) => !b,
        Some(Value::Number(n)) => n.as_f64() == Some(0.0),
        Some(Value::String(s)) => s.is_empty() || s == "0",
        Some(Value::Array(a)) => a.is_empty(),
        Some(Value::Object(o)) => o.is_empty(),
    }
}

pub(crate) fn as_bool(value: Option<&Value>) -> Option<bool> {
    match value? {
        Value::Null => None,
        other => Some(!is_empty(Some(other))),
    }
}

pub(crate) fn as_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub(crate) fn as_u32(value: Option<&Value>) -> u32 {
    as_i64(value)
        .and_then(|n| u32::try_from(n).ok())
        .unwrap_or(0)
}

pub(crate) fn as_i32(value: Option<&Value>) -> i32 {
    as_i64(value)
        .and_then(|n| i32::try_from(n).ok())
        .unwrap_or(0)
}

pub(crate) fn as_string(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// A list of strings; a lone non-empty string counts as a one-item list
pub(crate) fn as_string_list(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| as_string(Some(item)))
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Parses an id-like key. Zero and anything non-numeric is `None`.
pub(crate) fn as_id(key: &str) -> Option<u64> {
    key.parse::<u64>().ok().filter(|&id| id != 0)
}
