use std::fmt;

use bytes::Bytes;
use http::HeaderMap;
use serde::{Deserialize, Serialize};
use url::Url;

/// HTTP method for requests
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    #[default]
    GET,
    POST,
    PUT,
    PATCH,
    DELETE,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::PUT => "PUT",
            Method::PATCH => "PATCH",
            Method::DELETE => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for http::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::GET => http::Method::GET,
            Method::POST => http::Method::POST,
            Method::PUT => http::Method::PUT,
            Method::PATCH => http::Method::PATCH,
            Method::DELETE => http::Method::DELETE,
        }
    }
}

/// Where a request looks for its answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum CachePolicy {
    /// Always go to the network; never read the cache.
    #[default]
    NetworkOnly,
    /// Only read the cache; never go to the network. A miss delivers nothing.
    CacheOnly,
    /// Deliver the cached payload (if any), then the network result.
    CacheThenNetwork,
    /// Go to the network; fall back to the cache when no response arrives.
    NetworkThenCache,
}

impl CachePolicy {
    pub fn uses_network(&self) -> bool {
        !matches!(self, CachePolicy::CacheOnly)
    }

    pub fn reads_cache(&self) -> bool {
        !matches!(self, CachePolicy::NetworkOnly)
    }
}

/// A fully rendered request, ready for an [`HttpExecutor`](crate::HttpExecutor).
#[derive(Debug, Clone)]
pub struct WireRequest {
    pub method: Method,
    /// Absolute URL including the query string.
    pub url: Url,
    pub headers: HeaderMap,
    /// Encoded parameters. Always `None` for GET.
    pub body: Option<Bytes>,
}

impl WireRequest {
    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

/// HTTP response as received from the transport.
#[derive(Debug, Clone)]
pub struct WireResponse {
    /// HTTP status code
    pub status: u16,

    /// Raw body
    pub body: Bytes,
}

impl WireResponse {
    pub fn new(status: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check if the response status indicates success (2xx)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Check if the response status indicates a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status)
    }

    /// Check if the response status indicates a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_names() {
        assert_eq!(Method::PATCH.as_str(), "PATCH");
        assert_eq!(Method::DELETE.to_string(), "DELETE");
        assert_eq!(http::Method::from(Method::PUT), http::Method::PUT);
    }

    #[test]
    fn method_serde_is_uppercase() {
        assert_eq!(serde_json::to_string(&Method::POST).unwrap(), "\"POST\"");
        let method: Method = serde_json::from_str("\"GET\"").unwrap();
        assert_eq!(method, Method::GET);
    }

    #[test]
    fn cache_policy_legs() {
        assert!(!CachePolicy::NetworkOnly.reads_cache());
        assert!(CachePolicy::NetworkOnly.uses_network());
        assert!(CachePolicy::CacheOnly.reads_cache());
        assert!(!CachePolicy::CacheOnly.uses_network());
        assert!(CachePolicy::CacheThenNetwork.reads_cache());
        assert!(CachePolicy::NetworkThenCache.uses_network());
    }

    #[test]
    fn status_classes() {
        assert!(WireResponse::new(204, "").is_success());
        assert!(WireResponse::new(401, "").is_client_error());
        assert!(WireResponse::new(503, "").is_server_error());
        assert!(!WireResponse::new(302, "").is_success());
    }
}
