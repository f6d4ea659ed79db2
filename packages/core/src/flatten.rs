//! Flattening of nested parameter trees into bracketed path keys.
//!
//! `{"abc": [{"c": [1, {"x": "y"}]}]}` flattens to
//!
//! ```text
//! abc[0][c][0] = 1
//! abc[0][c][1][x] = y
//! ```
//!
//! Query strings and cache keys are both built from this flat form.

use crate::Value;

/// A scalar leaf of a flattened tree.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Bytes(Vec<u8>),
}

impl Scalar {
    /// Text form used in query strings. `None` for binary blobs.
    pub fn to_text(&self) -> Option<String> {
        match self {
            Scalar::Bool(b) => Some(b.to_string()),
            Scalar::Integer(i) => Some(i.to_string()),
            Scalar::Float(f) => Some(f.to_string()),
            Scalar::String(s) => Some(s.clone()),
            Scalar::Bytes(_) => None,
        }
    }
}

/// One `(path, scalar)` pair produced by [`flatten`].
#[derive(Clone, Debug, PartialEq)]
pub struct FlatEntry {
    pub path: String,
    pub value: Scalar,
}

/// Flatten a tree into path-keyed scalars.
///
/// Maps are walked in insertion order and lists in index order, so the same
/// tree always yields the same sequence. A root map key `k` becomes `k`, a
/// nested key becomes `parent[k]` and a list index becomes `parent[i]`.
/// Empty maps, empty lists and nulls yield no entries. A scalar root yields
/// a single entry with an empty path.
pub fn flatten(tree: &Value) -> Vec<FlatEntry> {
    let mut entries = Vec::new();
    flatten_into(tree, String::new(), &mut entries);
    entries
}

fn flatten_into(value: &Value, path: String, out: &mut Vec<FlatEntry>) {
    let scalar = match value {
        Value::Null => return,
        Value::Bool(b) => Scalar::Bool(*b),
        Value::Integer(i) => Scalar::Integer(*i),
        Value::Float(f) => Scalar::Float(*f),
        Value::String(s) => Scalar::String(s.clone()),
        Value::Bytes(b) => Scalar::Bytes(b.clone()),
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(item, child_path(&path, &index.to_string()), out);
            }
            return;
        }
        Value::Map(map) => {
            for (key, item) in map {
                flatten_into(item, child_path(&path, key), out);
            }
            return;
        }
    };
    out.push(FlatEntry {
        path,
        value: scalar,
    });
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}[{}]", parent, key)
    }
}
