//! Recursive key lookup over nested JSON documents.
//!
//! Rules:
//! - A key present at the top level of an object wins over any nested match.
//! - Otherwise children are visited in enumeration order (object insertion
//!   order, then array index order) and the first hit wins.
//! - Scalars, `null` hits and documents nested deeper than [`MAX_DEPTH`] are
//!   reported as absent. Nothing here can fail or panic.

use serde_json::Value;

/// Maximum nesting depth visited before giving up.
pub const MAX_DEPTH: usize = 128;

/// Find the first value stored under `key` anywhere in `doc`.
pub fn search<'a>(key: &str, doc: &'a Value) -> Option<&'a Value> {
    search_at(key, doc, 0)
}

fn search_at<'a>(key: &str, doc: &'a Value, depth: usize) -> Option<&'a Value> {
    if depth > MAX_DEPTH {
        return None;
    }
    match doc {
        Value::Object(map) => {
            if let Some(v) = map.get(key) {
                return (!v.is_null()).then_some(v);
            }
            map.values().find_map(|child| search_at(key, child, depth + 1))
        }
        Value::Array(items) => items.iter().find_map(|child| search_at(key, child, depth + 1)),
        _ => None,
    }
}

/// Coerce a JSON scalar into a metric value.
///
/// Query and form parameters arrive as strings, so numeric strings are
/// accepted. Booleans map to 1/0.
pub fn numeric(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Text form of a scalar (`"red"` → `red`, `2` → `2`). Containers and `null` have none.
pub fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Equality used to match request fields against enumerated values.
///
/// `2` matches `"2"` because form-style hosts deliver every parameter as text,
/// and `2` matches `2.0` because typed `f64` fields serialize as floats.
pub fn loosely_equal(expected: &Value, actual: &Value) -> bool {
    if expected == actual {
        return true;
    }
    if let (Value::Number(_), Value::Number(_) | Value::String(_)) | (Value::String(_), Value::Number(_)) =
        (expected, actual)
    {
        if let (Some(a), Some(b)) = (numeric(expected), numeric(actual)) {
            return a == b;
        }
    }
    match (scalar_text(expected), scalar_text(actual)) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}
