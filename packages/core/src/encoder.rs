//! The parameter encoder capability.

use bytes::Bytes;

use crate::{EncodingError, Value};

/// Converts a parameter tree to wire bytes and back.
///
/// Encoders must be deterministic: encoding the same tree twice yields
/// byte-identical output, because cache keys and tests depend on it.
///
/// # Object Safety
///
/// This trait is object-safe: requests hold a `&'static dyn ParameterEncoder`.
pub trait ParameterEncoder: Send + Sync {
    /// MIME type sent as `Content-Type` when this encoder renders a body.
    fn content_type(&self) -> &'static str;

    /// Encode a tree into wire bytes.
    fn encode(&self, value: &Value) -> Result<Bytes, EncodingError>;

    /// Decode wire bytes back into a tree.
    fn decode(&self, bytes: &[u8]) -> Result<Value, EncodingError>;
}

impl<T: ParameterEncoder + ?Sized> ParameterEncoder for Box<T> {
    fn content_type(&self) -> &'static str {
        self.as_ref().content_type()
    }

    fn encode(&self, value: &Value) -> Result<Bytes, EncodingError> {
        self.as_ref().encode(value)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, EncodingError> {
        self.as_ref().decode(bytes)
    }
}
