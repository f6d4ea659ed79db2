//! JSON body encoder.

use apicache_core::{Bytes, EncodingError, ParameterEncoder, Value};

use crate::convert::{json_to_value, value_to_json};

/// Encodes parameters as a JSON document.
///
/// Binary blobs are rejected rather than silently base64-encoded: callers
/// that need to ship binary in JSON must encode it themselves. Map keys are
/// written in insertion order.
///
/// # Example
///
/// ```rust
/// use apicache_codec::JsonEncoder;
/// use apicache_core::{ParameterEncoder, Value};
///
/// let value = Value::map().with("id", "123").with("age", 12);
/// let bytes = JsonEncoder.encode(&value).unwrap();
/// assert_eq!(&bytes[..], br#"{"id":"123","age":12}"#);
/// assert_eq!(JsonEncoder.decode(&bytes).unwrap(), value);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonEncoder;

impl ParameterEncoder for JsonEncoder {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn encode(&self, value: &Value) -> Result<Bytes, EncodingError> {
        let json = value_to_json(value)?;
        let bytes =
            serde_json::to_vec(&json).map_err(|e| EncodingError::InvalidJson(e.to_string()))?;
        Ok(Bytes::from(bytes))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, EncodingError> {
        let json: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| EncodingError::InvalidJson(e.to_string()))?;
        Ok(json_to_value(json))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Value {
        Value::map()
            .with("id", "123")
            .with("name", "João Pedro (Jota) Melo")
            .with("phone", "313131331")
            .with("age", 12)
    }

    #[test]
    fn json_roundtrip() {
        let value = sample()
            .with("nested", Value::map().with("list", vec![1.5, -2.0]))
            .with("flag", false)
            .with("none", Value::Null);

        let bytes = JsonEncoder.encode(&value).unwrap();
        assert_eq!(JsonEncoder.decode(&bytes).unwrap(), value);
    }

    #[test]
    fn encoding_is_deterministic() {
        let value = sample();
        assert_eq!(
            JsonEncoder.encode(&value).unwrap(),
            JsonEncoder.encode(&value).unwrap()
        );
    }

    #[test]
    fn output_follows_insertion_order() {
        let bytes = JsonEncoder.encode(&sample()).unwrap();
        assert_eq!(
            std::str::from_utf8(&bytes).unwrap(),
            r#"{"id":"123","name":"João Pedro (Jota) Melo","phone":"313131331","age":12}"#
        );
    }

    #[test]
    fn rejects_binary() {
        let value = Value::map().with("file", vec![0u8, 1, 2]);
        assert!(matches!(
            JsonEncoder.encode(&value),
            Err(EncodingError::BinaryNotRepresentable { .. })
        ));
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(matches!(
            JsonEncoder.decode(b"{not json"),
            Err(EncodingError::InvalidJson(_))
        ));
    }
}
