//! HTTP execution abstraction for testing.
//!
//! The client only ever talks to the network through [`HttpExecutor`], so
//! tests can swap in canned responses without a server.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

use crate::config::DEFAULT_TIMEOUT;
use crate::error::{Error, TransportError};
use crate::types::{WireRequest, WireResponse};

/// Trait for executing HTTP requests.
///
/// Implementations can use real HTTP clients or mock responses for testing.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Execute a request and return whatever the server answered, whatever
    /// its status. `Err` means no response arrived.
    async fn execute(&self, request: &WireRequest) -> Result<WireResponse, TransportError>;
}

/// Production HTTP executor using reqwest.
pub struct ReqwestExecutor {
    client: Client,
}

impl ReqwestExecutor {
    /// Create a new executor with the given timeout.
    pub fn new(timeout: Duration) -> Result<Self, Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    /// Create with default timeout of 30 seconds.
    pub fn with_default_timeout() -> Result<Self, Error> {
        Self::new(DEFAULT_TIMEOUT)
    }
}

fn transport_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(error.to_string())
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: &WireRequest) -> Result<WireResponse, TransportError> {
        let method: http::Method = request.method.into();

        let mut req_builder = self
            .client
            .request(method, request.url.clone())
            .headers(request.headers.clone());

        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        let response = req_builder.send().await.map_err(transport_error)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(transport_error)?;

        Ok(WireResponse { status, body })
    }
}
