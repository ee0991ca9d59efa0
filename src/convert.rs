//! Argument extraction helpers for tool calls.
//!
//! Tool arguments arrive as a JSON object. These helpers pull out typed
//! values with light coercion: integers may be sent as numeric strings and
//! booleans as `"true"`/`"false"`. `null` is treated as absent.

use serde_json::{Map, Value as JsonValue};

use crate::error::{McpError, Result};

fn present<'a>(args: &'a Map<String, JsonValue>, name: &str) -> Option<&'a JsonValue> {
    args.get(name).filter(|v| !v.is_null())
}

fn invalid(name: &str, reason: &str) -> McpError {
    McpError::InvalidArg {
        name: name.to_string(),
        reason: reason.to_string(),
    }
}

/// Helper to get a required string argument. Integers are accepted and
/// rendered as decimal strings.
pub fn get_string_arg(args: &Map<String, JsonValue>, name: &str) -> Result<String> {
    match present(args, name) {
        None => Err(McpError::MissingArg(name.to_string())),
        Some(JsonValue::String(s)) => Ok(s.clone()),
        Some(JsonValue::Number(n)) if n.is_u64() || n.is_i64() => Ok(n.to_string()),
        Some(_) => Err(invalid(name, "Expected string")),
    }
}

/// Helper to get an optional string argument.
pub fn get_optional_string(args: &Map<String, JsonValue>, name: &str) -> Result<Option<String>> {
    match present(args, name) {
        None => Ok(None),
        Some(JsonValue::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(invalid(name, "Expected string")),
    }
}

/// Helper to get an optional integer argument.
///
/// Accepts JSON integers, floats without a fractional part and numeric
/// strings. Range is left for the upstream API to judge.
pub fn get_optional_i64(args: &Map<String, JsonValue>, name: &str) -> Result<Option<i64>> {
    match present(args, name) {
        None => Ok(None),
        Some(JsonValue::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(Some(i)),
            (None, Some(f)) => integral(f)
                .map(Some)
                .ok_or_else(|| invalid(name, "Expected integer")),
            (None, None) => Err(invalid(name, "Expected integer")),
        },
        Some(JsonValue::String(s)) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
                .map(Some)
                .ok_or_else(|| invalid(name, "Expected integer"))
        }
        Some(_) => Err(invalid(name, "Expected integer")),
    }
}

fn integral(f: f64) -> Option<i64> {
    if f.is_finite() && f.fract() == 0.0 && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f as i64)
    } else {
        None
    }
}

/// Helper to get an optional boolean argument.
pub fn get_optional_bool(args: &Map<String, JsonValue>, name: &str) -> Result<Option<bool>> {
    match present(args, name) {
        None => Ok(None),
        Some(JsonValue::Bool(b)) => Ok(Some(*b)),
        Some(JsonValue::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            _ => Err(invalid(name, "Expected boolean")),
        },
        Some(_) => Err(invalid(name, "Expected boolean")),
    }
}
