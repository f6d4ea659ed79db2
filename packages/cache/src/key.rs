//! Cache key derivation.
//!
//! A key is the lowercase hex SHA-256 of the request identity: method, path
//! and the parameter tree. The tree is hashed structurally: every node
//! carries a type tag, containers carry their length, and map entries are
//! hashed sorted by key so insertion order never changes the key. A list
//! index and a map key therefore never collide (`{"a":[5]}` and
//! `{"a":{"0":5}}` differ), and neither do `{}`, `{"a":{}}` and
//! `{"a":null}`. Every field is length-prefixed, and `"12"` and `12` derive
//! different keys. Binary blobs contribute their own SHA-256 instead of
//! their bytes.
//!
//! Keys are always 64 characters from `[0-9a-f]`, so they can be used as
//! file names without escaping.

use apicache_core::Value;
use sha2::{Digest, Sha256};

/// Length of every derived key.
pub const KEY_LENGTH: usize = 64;

/// Derive the cache key of a request.
pub fn derive_key(method: &str, path: &str, parameters: Option<&Value>) -> String {
    let mut hasher = Sha256::new();
    write_field(&mut hasher, method.as_bytes());
    write_field(&mut hasher, path.as_bytes());
    match parameters {
        Some(tree) => {
            hasher.update(b"p");
            write_value(&mut hasher, tree);
        }
        None => hasher.update(b"-"),
    }

    hex(&hasher.finalize())
}

fn write_value(hasher: &mut Sha256, value: &Value) {
    match value {
        Value::Null => hasher.update(b"n"),
        Value::Bool(b) => {
            hasher.update(b"b");
            write_field(hasher, &[u8::from(*b)]);
        }
        Value::Integer(i) => {
            hasher.update(b"i");
            write_field(hasher, &i.to_be_bytes());
        }
        Value::Float(f) => {
            hasher.update(b"f");
            write_field(hasher, &f.to_bits().to_be_bytes());
        }
        Value::String(s) => {
            hasher.update(b"s");
            write_field(hasher, s.as_bytes());
        }
        Value::Bytes(blob) => {
            hasher.update(b"x");
            write_field(hasher, &Sha256::digest(blob));
        }
        Value::Array(items) => {
            hasher.update(b"a");
            hasher.update((items.len() as u64).to_be_bytes());
            for item in items {
                write_value(hasher, item);
            }
        }
        Value::Map(map) => {
            let mut entries: Vec<_> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            hasher.update(b"m");
            hasher.update((entries.len() as u64).to_be_bytes());
            for (key, item) in entries {
                write_field(hasher, key.as_bytes());
                write_value(hasher, item);
            }
        }
    }
}

/// Whether `key` is safe to use as a record file name.
pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key != "."
        && key != ".."
        && key
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

fn write_field(hasher: &mut Sha256, bytes: &[u8]) {
    hasher.update((bytes.len() as u64).to_be_bytes());
    hasher.update(bytes);
}

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PATH: &str = "randomness/123echo123";

    #[test]
    fn keys_are_filesystem_safe() {
        let keys = [
            derive_key("GET", PATH, None),
            derive_key("POST", PATH, Some(&Value::map().with("a", Value::map().with("b", "c")))),
            derive_key("POST", PATH, Some(&Value::map().with("a", Value::map().with("b", Vec::<u8>::new())))),
        ];
        for key in &keys {
            assert_eq!(key.len(), KEY_LENGTH);
            assert!(is_valid_key(key));
            assert!(key.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        }
    }

    #[test]
    fn equal_inputs_derive_equal_keys() {
        let image = vec![0x89u8; 2 * 1024 * 1024];
        let params = Value::map().with("a", Value::map().with("b", image.clone()));
        let again = Value::map().with("a", Value::map().with("b", image));

        assert_eq!(
            derive_key("PUT", PATH, Some(&params)),
            derive_key("PUT", PATH, Some(&again))
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = Value::map().with("x", 1).with("y", 2);
        let b = Value::map().with("y", 2).with("x", 1);
        assert_eq!(derive_key("GET", PATH, Some(&a)), derive_key("GET", PATH, Some(&b)));
    }

    #[test]
    fn any_difference_changes_the_key() {
        let params = Value::map().with("id", "12");
        let base = derive_key("GET", PATH, Some(&params));

        assert_ne!(base, derive_key("POST", PATH, Some(&params)));
        assert_ne!(base, derive_key("GET", "other/path", Some(&params)));
        assert_ne!(base, derive_key("GET", PATH, Some(&Value::map().with("id", "13"))));
        assert_ne!(base, derive_key("GET", PATH, Some(&Value::map().with("id", 12))));
        assert_ne!(base, derive_key("GET", PATH, Some(&Value::map().with("di", "12"))));
        assert_ne!(base, derive_key("GET", PATH, None));
    }

    #[test]
    fn different_blobs_derive_different_keys() {
        let a = Value::map().with("file", vec![1u8, 2, 3]);
        let b = Value::map().with("file", vec![1u8, 2, 4]);
        assert_ne!(derive_key("PUT", PATH, Some(&a)), derive_key("PUT", PATH, Some(&b)));
    }

    #[test]
    fn list_indices_and_map_keys_differ() {
        let key = |params: Value| derive_key("POST", PATH, Some(&params));

        let list = key(Value::map().with("a", Value::Array(vec![Value::from(5)])));
        let indexed_map = key(Value::map().with("a", Value::map().with("0", 5)));
        assert_ne!(list, indexed_map);

        let bracketed = key(Value::map().with("a[b]", 1));
        let nested = key(Value::map().with("a", Value::map().with("b", 1)));
        assert_ne!(bracketed, nested);
    }

    #[test]
    fn empty_containers_and_null_are_distinct() {
        let key = |params: Value| derive_key("POST", PATH, Some(&params));
        let keys = [
            key(Value::map()),
            key(Value::map().with("a", Value::map())),
            key(Value::map().with("a", Value::Array(Vec::new()))),
            key(Value::map().with("a", Value::Null)),
            derive_key("POST", PATH, None),
        ];
        for (i, a) in keys.iter().enumerate() {
            for b in &keys[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn nested_insertion_order_does_not_matter() {
        let a = Value::map().with("outer", Value::map().with("x", 1).with("y", 2));
        let b = Value::map().with("outer", Value::map().with("y", 2).with("x", 1));
        assert_eq!(derive_key("POST", PATH, Some(&a)), derive_key("POST", PATH, Some(&b)));
    }

    #[test]
    fn field_boundaries_are_unambiguous() {
        assert_ne!(derive_key("GE", "Tx", None), derive_key("GET", "x", None));
    }

    #[test]
    fn key_validation() {
        assert!(is_valid_key("abc-123_x.y"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key(".."));
        assert!(!is_valid_key("a/b"));
        assert!(!is_valid_key("a\\b"));
    }
}
