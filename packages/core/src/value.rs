//! The Value type - a tree of request parameters or response payloads.
//!
//! Every encoder, the flattener and the cache work on this one tree, so a
//! parameter dictionary never has to be type-cast at runtime.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Map type used by [`Value::Map`]. Keys are unique and keep insertion order.
pub type Map = IndexMap<String, Value>;

/// A dynamically-typed parameter or payload tree.
///
/// # Design Notes
///
/// - Uses `IndexMap` so traversal follows insertion order. Equality of two
///   maps ignores order, so structurally equal trees compare equal.
/// - Includes `Bytes` for binary blobs (file uploads, images). JSON cannot
///   carry them; see the encoders for the policy.
/// - Numbers are split into `Integer` and `Float` so integers survive a JSON
///   round trip exactly.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    /// Absence of a value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// Signed 64-bit integer.
    Integer(i64),
    /// 64-bit floating point.
    Float(f64),
    /// UTF-8 string.
    String(String),
    /// Opaque binary blob.
    Bytes(#[serde(with = "base64_bytes")] Vec<u8>),
    /// Ordered sequence of values.
    Array(Vec<Value>),
    /// String-keyed map in insertion order.
    Map(Map),
}

impl Value {
    /// Create a null value.
    pub fn null() -> Self {
        Value::Null
    }

    /// Create an empty map.
    pub fn map() -> Self {
        Value::Map(Map::new())
    }

    /// Create an empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_map(&self) -> bool {
        matches!(self, Value::Map(_))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    /// Borrow the inner map, if this is a map.
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow the inner string, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key on a map. Returns `None` for non-maps.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map()?.get(key)
    }

    /// Insert a key into a map, returning the previous value for that key.
    ///
    /// A non-map value is replaced by a fresh map first. The key keeps its
    /// original position when it already existed.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        if !self.is_map() {
            *self = Value::map();
        }
        match self {
            Value::Map(map) => map.insert(key.into(), value.into()),
            _ => None,
        }
    }

    /// Builder-style [`Value::insert`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Whether a binary blob appears anywhere in this tree.
    pub fn contains_binary(&self) -> bool {
        match self {
            Value::Bytes(_) => true,
            Value::Array(items) => items.iter().any(Value::contains_binary),
            Value::Map(map) => map.values().any(Value::contains_binary),
            _ => false,
        }
    }

    /// Approximate in-memory size used for cache budgeting.
    ///
    /// Strings and blobs count their length, numbers 8 bytes, booleans 1,
    /// null 0. Map keys count their length. Nested blobs count in full.
    pub fn size_bytes(&self) -> u64 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Integer(_) | Value::Float(_) => 8,
            Value::String(s) => s.len() as u64,
            Value::Bytes(b) => b.len() as u64,
            Value::Array(items) => items.iter().map(Value::size_bytes).sum(),
            Value::Map(map) => map
                .iter()
                .map(|(k, v)| k.len() as u64 + v.size_bytes())
                .sum(),
        }
    }
}

mod base64_bytes {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

// Conversion from common types

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v as i64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Map(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Map(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_keeps_first_position() {
        let mut value = Value::map().with("a", 1).with("b", 2);
        let previous = value.insert("a", 3);

        assert_eq!(previous, Some(Value::Integer(1)));
        let keys: Vec<_> = value.as_map().unwrap().keys().cloned().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(value.get("a"), Some(&Value::Integer(3)));
    }

    #[test]
    fn insert_on_scalar_replaces_with_map() {
        let mut value = Value::from("not a map");
        value.insert("k", "v");
        assert_eq!(value, Value::map().with("k", "v"));
    }

    #[test]
    fn map_equality_ignores_order() {
        let a = Value::map().with("x", 1).with("y", 2);
        let b = Value::map().with("y", 2).with("x", 1);
        assert_eq!(a, b);
    }

    #[test]
    fn contains_binary_searches_nested() {
        let nested = Value::map().with(
            "ddd",
            Value::map().with("c", Value::map().with("c", Vec::<u8>::new())),
        );
        assert!(nested.contains_binary());

        let plain = Value::map().with("a", vec![1i64, 2, 3]);
        assert!(!plain.contains_binary());
    }

    #[test]
    fn size_bytes_counts_keys_and_blobs() {
        let value = Value::map()
            .with("ab", "xyz")
            .with("n", 7)
            .with("blob", vec![0u8; 100]);
        // 2 + 3, 1 + 8, 4 + 100
        assert_eq!(value.size_bytes(), 118);
        assert_eq!(Value::Null.size_bytes(), 0);
    }

    #[test]
    fn serde_roundtrip_keeps_bytes() {
        let value = Value::map()
            .with("blob", vec![0u8, 1, 2, 255])
            .with("list", Value::from(vec![Value::from(1.5), Value::Null]));

        let json = serde_json::to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn from_iterator_builds_map() {
        let value: Value = [("a", "1"), ("b", "2")].into_iter().collect();
        assert_eq!(value.get("b"), Some(&Value::from("2")));
    }
}
