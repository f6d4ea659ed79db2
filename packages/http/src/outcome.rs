//! What a request attempt produced, as seen by the completion callback.

use apicache_core::{Bytes, ParameterEncoder, Value};

use crate::error::{RequestError, TransportError};
use crate::types::WireResponse;

/// Classified result of one network attempt (or one cache hit).
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Value),
    HttpError {
        status: u16,
        body: Bytes,
        payload: Option<Value>,
    },
    TransportError(TransportError),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }

    pub fn into_result(self) -> Result<Value, RequestError> {
        match self {
            Outcome::Success(value) => Ok(value),
            Outcome::HttpError {
                status,
                body,
                payload,
            } => Err(RequestError::Http {
                status,
                body,
                payload,
            }),
            Outcome::TransportError(e) => Err(RequestError::Transport(e)),
        }
    }
}

/// Sort a transport result into success, HTTP error or transport error.
///
/// 2xx bodies are decoded with `encoder`; an empty body is `Null`. Error
/// bodies are decoded on a best-effort basis.
pub(crate) fn classify(
    result: Result<WireResponse, TransportError>,
    encoder: &dyn ParameterEncoder,
) -> Outcome {
    let response = match result {
        Ok(response) => response,
        Err(e) => return Outcome::TransportError(e),
    };

    if response.is_success() {
        if response.body.is_empty() {
            return Outcome::Success(Value::Null);
        }
        return match encoder.decode(&response.body) {
            Ok(value) => Outcome::Success(value),
            Err(e) => Outcome::TransportError(TransportError::Decode(e)),
        };
    }

    let payload = if response.body.is_empty() {
        None
    } else {
        encoder.decode(&response.body).ok()
    };
    Outcome::HttpError {
        status: response.status,
        body: response.body,
        payload,
    }
}

/// One delivery to a completion callback.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub outcome: Outcome,
    /// Whether the payload came from the cache rather than the network.
    pub from_cache: bool,
}

impl Completion {
    pub fn result(&self) -> Option<&Value> {
        match &self.outcome {
            Outcome::Success(value) => Some(value),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<RequestError> {
        match &self.outcome {
            Outcome::Success(_) => None,
            other => other.clone().into_result().err(),
        }
    }

    pub fn into_result(self) -> Result<Value, RequestError> {
        self.outcome.into_result()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apicache_codec::{JsonEncoder, UrlEncoder};
    use apicache_core::EncodingError;

    fn ok(status: u16, body: &'static str) -> Result<WireResponse, TransportError> {
        Ok(WireResponse::new(status, body))
    }

    #[test]
    fn success_decodes_body() {
        let outcome = classify(ok(200, r#"{"id":"123"}"#), &JsonEncoder);
        assert_eq!(outcome, Outcome::Success(Value::map().with("id", "123")));
    }

    #[test]
    fn empty_success_body_is_null() {
        assert_eq!(classify(ok(204, ""), &JsonEncoder), Outcome::Success(Value::Null));
    }

    #[test]
    fn undecodable_success_is_transport_error() {
        let outcome = classify(ok(200, "<html>"), &JsonEncoder);
        assert!(matches!(
            outcome,
            Outcome::TransportError(TransportError::Decode(EncodingError::InvalidJson(_)))
        ));
    }

    #[test]
    fn unauthorized_is_http_error_with_payload() {
        let outcome = classify(ok(401, r#"{"error_message":"token expired"}"#), &JsonEncoder);
        let Outcome::HttpError {
            status, payload, ..
        } = &outcome
        else {
            panic!("expected HttpError, got {:?}", outcome);
        };
        assert_eq!(*status, 401);
        assert_eq!(
            payload.as_ref().and_then(|p| p.get("error_message")),
            Some(&Value::from("token expired"))
        );
    }

    #[test]
    fn undecodable_error_body_keeps_raw_bytes() {
        let outcome = classify(ok(500, "oops"), &JsonEncoder);
        assert_eq!(
            outcome,
            Outcome::HttpError {
                status: 500,
                body: Bytes::from_static(b"oops"),
                payload: None,
            }
        );
    }

    #[test]
    fn transport_failure_passes_through() {
        let outcome = classify(Err(TransportError::Timeout), &JsonEncoder);
        assert_eq!(outcome, Outcome::TransportError(TransportError::Timeout));
    }

    #[test]
    fn url_encoded_response() {
        let outcome = classify(ok(200, "id=123&age=12"), &UrlEncoder);
        assert_eq!(
            outcome,
            Outcome::Success(Value::map().with("id", "123").with("age", "12"))
        );
    }

    #[test]
    fn completion_accessors() {
        let done = Completion {
            outcome: Outcome::Success(Value::from(1)),
            from_cache: true,
        };
        assert_eq!(done.result(), Some(&Value::from(1)));
        assert!(done.error().is_none());

        let failed = Completion {
            outcome: Outcome::HttpError {
                status: 401,
                body: Bytes::new(),
                payload: None,
            },
            from_cache: false,
        };
        assert!(failed.result().is_none());
        assert_eq!(failed.error().and_then(|e| e.status()), Some(401));
        assert!(failed.into_result().is_err());
    }
}
