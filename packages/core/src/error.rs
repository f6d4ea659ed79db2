//! Errors raised while encoding or decoding parameters.

/// Malformed input to an encoder.
///
/// These are raised before any network I/O starts.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum EncodingError {
    #[error("binary value at '{path}' cannot be represented by this encoder")]
    BinaryNotRepresentable { path: String },

    #[error("non-finite float at '{path}' cannot be represented by this encoder")]
    NonFiniteFloat { path: String },

    #[error("{what} must be a map")]
    NotAMap { what: String },

    #[error("malformed query string")]
    MalformedQuery,

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("payload is not valid UTF-8")]
    InvalidUtf8,
}
