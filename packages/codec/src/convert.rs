//! Conversions between Value and serde_json::Value.

use apicache_core::{EncodingError, Value};

/// Convert a Value to JSON.
///
/// JSON has no binary type and no NaN/infinity, so both are rejected with
/// the flattened path of the offending leaf.
pub fn value_to_json(value: &Value) -> Result<serde_json::Value, EncodingError> {
    to_json_at(value, "")
}

fn to_json_at(value: &Value, path: &str) -> Result<serde_json::Value, EncodingError> {
    Ok(match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Integer(i) => serde_json::Value::Number((*i).into()),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .ok_or_else(|| EncodingError::NonFiniteFloat {
                path: path.to_string(),
            })?,
        Value::String(s) => serde_json::Value::String(s.clone()),
        Value::Bytes(_) => {
            return Err(EncodingError::BinaryNotRepresentable {
                path: path.to_string(),
            })
        }
        Value::Array(items) => serde_json::Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(i, item)| to_json_at(item, &child(path, &i.to_string())))
                .collect::<Result<_, _>>()?,
        ),
        Value::Map(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| Ok((k.clone(), to_json_at(v, &child(path, k))?)))
                .collect::<Result<_, EncodingError>>()?,
        ),
    })
}

fn child(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}[{}]", parent, key)
    }
}

/// Convert JSON to our Value.
pub fn json_to_value(json: serde_json::Value) -> Value {
    match json {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Integer(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                // Fallback for very large numbers
                Value::String(n.to_string())
            }
        }
        serde_json::Value::String(s) => Value::String(s),
        serde_json::Value::Array(arr) => Value::Array(arr.into_iter().map(json_to_value).collect()),
        serde_json::Value::Object(map) => Value::Map(
            map.into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        ),
    }
}
