//! URL query-string encoder.

use apicache_core::{flatten, Bytes, EncodingError, Map, ParameterEncoder, Scalar, Value};
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything except the RFC 3986 unreserved characters gets escaped.
const QUERY_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Encodes parameters as `key=value&key=value`.
///
/// The tree is flattened first, so nested values use bracketed keys
/// (`user[name]=Ana`). Decoding loses type information: every value comes
/// back as a string, so `{"age": 12}` decodes as `{"age": "12"}`.
///
/// # Example
///
/// ```rust
/// use apicache_codec::UrlEncoder;
/// use apicache_core::Value;
///
/// let value = Value::map().with("id", "123").with("age", 12);
/// let query = UrlEncoder::encode_query(&value).unwrap();
/// assert_eq!(query, "id=123&age=12");
///
/// let decoded = UrlEncoder::decode_query(&query).unwrap();
/// assert_eq!(decoded, Value::map().with("id", "123").with("age", "12"));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlEncoder;

impl UrlEncoder {
    /// Render a tree as a query string (without the leading `?`).
    pub fn encode_query(value: &Value) -> Result<String, EncodingError> {
        let mut pairs = Vec::new();
        for entry in flatten(value) {
            let text = match &entry.value {
                Scalar::Bytes(_) => {
                    return Err(EncodingError::BinaryNotRepresentable { path: entry.path })
                }
                Scalar::Float(f) if !f.is_finite() => {
                    return Err(EncodingError::NonFiniteFloat { path: entry.path })
                }
                scalar => scalar.to_text().unwrap_or_default(),
            };
            pairs.push(format!(
                "{}={}",
                utf8_percent_encode(&entry.path, QUERY_COMPONENT),
                utf8_percent_encode(&text, QUERY_COMPONENT)
            ));
        }
        Ok(pairs.join("&"))
    }

    /// Parse a query string into a flat map of strings.
    ///
    /// Returns `None` when a pair has no `=`, when a key is empty, or when a
    /// component is not valid UTF-8 after percent-decoding. Empty pairs are
    /// skipped and a repeated key keeps its last value.
    pub fn decode_query(query: &str) -> Option<Value> {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut map = Map::new();
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let (key, value) = pair.split_once('=')?;
            let key = decode_component(key)?;
            if key.is_empty() {
                return None;
            }
            map.insert(key, Value::String(decode_component(value)?));
        }
        Some(Value::Map(map))
    }
}

fn decode_component(raw: &str) -> Option<String> {
    let spaced = raw.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .ok()
        .map(|s| s.into_owned())
}

impl ParameterEncoder for UrlEncoder {
    fn content_type(&self) -> &'static str {
        "application/x-www-form-urlencoded"
    }

    fn encode(&self, value: &Value) -> Result<Bytes, EncodingError> {
        Ok(Bytes::from(Self::encode_query(value)?))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, EncodingError> {
        let text = std::str::from_utf8(bytes).map_err(|_| EncodingError::InvalidUtf8)?;
        Self::decode_query(text).ok_or(EncodingError::MalformedQuery)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_encodes_reserved_characters() {
        let value = Value::map()
            .with("phone", "313131331")
            .with("name", "João Pedro (Jota) Melo")
            .with("age", 12)
            .with("id", "123");

        assert_eq!(
            UrlEncoder::encode_query(&value).unwrap(),
            "phone=313131331&name=Jo%C3%A3o%20Pedro%20%28Jota%29%20Melo&age=12&id=123"
        );
    }

    #[test]
    fn decode_loses_types() {
        let value = Value::map()
            .with("phone", "313131331")
            .with("name", "João Pedro (Jota) Melo")
            .with("age", 12)
            .with("id", "123");
        let query = UrlEncoder::encode_query(&value).unwrap();

        let expected = Value::map()
            .with("phone", "313131331")
            .with("name", "João Pedro (Jota) Melo")
            .with("age", "12")
            .with("id", "123");
        assert_eq!(UrlEncoder::decode_query(&query), Some(expected));
    }

    #[test]
    fn nested_keys_are_bracketed() {
        let value = Value::map().with("user", Value::map().with("tags", vec!["a", "b"]));
        assert_eq!(
            UrlEncoder::encode_query(&value).unwrap(),
            "user%5Btags%5D%5B0%5D=a&user%5Btags%5D%5B1%5D=b"
        );

        let decoded = UrlEncoder::decode_query("user%5Btags%5D%5B0%5D=a").unwrap();
        assert_eq!(decoded.get("user[tags][0]"), Some(&Value::from("a")));
    }

    #[test]
    fn malformed_queries_decode_to_none() {
        assert_eq!(UrlEncoder::decode_query("abc"), None);
        assert_eq!(UrlEncoder::decode_query("a=1&b"), None);
        assert_eq!(UrlEncoder::decode_query("=value"), None);
        assert_eq!(UrlEncoder::decode_query("a=%FF"), None);
    }

    #[test]
    fn lenient_forms_decode() {
        assert_eq!(UrlEncoder::decode_query(""), Some(Value::map()));
        assert_eq!(
            UrlEncoder::decode_query("?a=1&&a=2&b=x+y&c="),
            Some(Value::map().with("a", "2").with("b", "x y").with("c", ""))
        );
    }

    #[test]
    fn binary_is_rejected() {
        let value = Value::map().with("blob", vec![1u8]);
        assert!(matches!(
            UrlEncoder.encode(&value),
            Err(EncodingError::BinaryNotRepresentable { path }) if path == "blob"
        ));
    }

    #[test]
    fn trait_decode_reports_malformed() {
        assert_eq!(UrlEncoder.decode(b"novalue"), Err(EncodingError::MalformedQuery));
        assert_eq!(
            UrlEncoder.decode(b"a=b").unwrap(),
            Value::map().with("a", "b")
        );
    }
}
