use apicache_cache::CacheError;
use apicache_core::{Bytes, EncodingError, Value};

/// Errors raised synchronously while building or sending a request.
///
/// Network and HTTP failures are not reported here; they arrive through the
/// completion callback as an [`Outcome`](crate::Outcome).
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("Invalid header value: {0}")]
    InvalidHeaderValue(#[from] http::header::InvalidHeaderValue),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("a tokio runtime must be running to send requests")]
    NoRuntime,

    #[error("request task failed: {0}")]
    TaskFailed(String),
}

/// No usable response was received.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out")]
    Timeout,

    #[error("response body could not be decoded: {0}")]
    Decode(EncodingError),
}

/// The error channel of a completion.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum RequestError {
    /// The server answered with a non-2xx status.
    #[error("HTTP status {status}")]
    Http {
        status: u16,
        body: Bytes,
        /// The body decoded with the request's encoder, when it decodes.
        payload: Option<Value>,
    },

    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl RequestError {
    /// Status code for HTTP errors, `None` for transport errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            RequestError::Http { status, .. } => Some(*status),
            RequestError::Transport(_) => None,
        }
    }

    /// Decoded error body, e.g. to read an `error_message` field.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            RequestError::Http { payload, .. } => payload.as_ref(),
            RequestError::Transport(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_error_accessors() {
        let e = RequestError::Http {
            status: 401,
            body: Bytes::from_static(br#"{"error_message":"expired"}"#),
            payload: Some(Value::map().with("error_message", "expired")),
        };
        assert_eq!(e.status(), Some(401));
        assert_eq!(
            e.payload().and_then(|p| p.get("error_message")),
            Some(&Value::from("expired"))
        );
        assert_eq!(e.to_string(), "HTTP status 401");

        let e = RequestError::from(TransportError::Timeout);
        assert_eq!(e.status(), None);
        assert_eq!(e.to_string(), "request timed out");
    }

    #[test]
    fn encoding_error_converts() {
        let e: Error = EncodingError::MalformedQuery.into();
        assert!(matches!(e, Error::Encoding(_)));
    }
}
