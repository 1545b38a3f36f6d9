//! Structural fingerprints of JSON bodies.

use serde_json::Value;
use std::collections::BTreeSet;

/// Map a JSON value to a canonical description of its shape.
///
/// Scalars become their type name, arrays `array<...>` over the sorted,
/// deduplicated member shapes joined by `|`, and objects
/// `object{"key":shape,...}` with keys in byte order.
pub fn body_schema(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(_) => "boolean".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Array(items) => {
            let members: BTreeSet<String> = items.iter().map(body_schema).collect();
            let members: Vec<String> = members.into_iter().collect();
            format!("array<{}>", members.join("|"))
        }
        Value::Object(object) => {
            // serde_json maps iterate in key order.
            let members: Vec<String> = object
                .iter()
                .map(|(key, value)| format!("{}:{}", quote(key), body_schema(value)))
                .collect();
            format!("object{{{}}}", members.join(","))
        }
    }
}

fn quote(key: &str) -> String {
    Value::String(key.to_string()).to_string()
}
