//! Flattening of nested JSON into single-level string maps.
//!
//! Broker credentials arrive as arbitrary JSON documents while the attribute
//! store only holds `string -> string` maps, so nested keys are joined with a
//! delimiter: `{"u":{"p":"x"}}` becomes `{"u_p": "x"}`.

use std::collections::BTreeMap;

use serde_json::{Number, Value};

/// Flattens `value` into a fresh map using `delim` between path segments.
pub fn flatten(value: &Value, delim: &str) -> BTreeMap<String, String> {
    let mut out = BTreeMap::new();
    normalize_into(value, &mut out, "", delim);
    out
}

/// Recursively writes `value` into `out` under `prefix`.
///
/// Scalars are stringified, `null` becomes the empty string, arrays recurse
/// with the element index and objects with the member key. The delimiter is
/// omitted when the prefix is empty.
pub fn normalize_into(value: &Value, out: &mut BTreeMap<String, String>, prefix: &str, delim: &str) {
    match value {
        Value::Null => {
            out.insert(prefix.to_string(), String::new());
        }
        Value::Bool(b) => {
            out.insert(prefix.to_string(), b.to_string());
        }
        Value::Number(n) => {
            out.insert(prefix.to_string(), number_to_string(n));
        }
        Value::String(s) => {
            out.insert(prefix.to_string(), s.clone());
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                normalize_into(item, out, &format!("{prefix}{delim}{index}"), delim);
            }
        }
        Value::Object(members) => {
            for (key, item) in members {
                let path = if prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{prefix}{delim}{key}")
                };
                normalize_into(item, out, &path, delim);
            }
        }
    }
}

// Integer first, then float, otherwise the raw text.
fn number_to_string(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else if let Some(f) = n.as_f64() {
        shortest_float(f)
    } else {
        n.to_string()
    }
}

/// Shortest round-trip rendering of a float, switching to exponent form when
/// the decimal exponent is below -4 or at least 6 (`1.2345675e+06`, `1e-05`).
/// The exponent always carries a sign and at least two digits.
fn shortest_float(f: f64) -> String {
    if !f.is_finite() {
        return f.to_string();
    }
    let sci = format!("{f:e}");
    let Some((mantissa, exp)) = sci.split_once('e') else {
        return f.to_string();
    };
    let Ok(exp) = exp.parse::<i32>() else {
        return f.to_string();
    };
    if (-4..6).contains(&exp) {
        return f.to_string();
    }
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}e{sign}{:02}", exp.abs())
}

/// Stringifies a scalar attribute value the way the attribute store expects.
/// Nested values are rendered as compact JSON.
pub fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_to_string(n),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
