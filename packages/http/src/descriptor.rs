//! Immutable description of one API request.

use apicache_cache::derive_key;
use apicache_codec::Encoding;
use apicache_core::Value;
use url::Url;

use crate::error::Error;
use crate::types::{CachePolicy, Method};
use crate::wire;

/// Everything needed to execute a request and to find its cached answer.
///
/// Built through [`RequestDescriptor::builder`]; there are no setters. To
/// change the policy for a second attempt use [`with_cache_policy`], which
/// returns a new descriptor.
///
/// [`with_cache_policy`]: RequestDescriptor::with_cache_policy
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDescriptor {
    method: Method,
    base_url: Url,
    path: String,
    parameters: Option<Value>,
    url_parameters: Option<Value>,
    encoding: Encoding,
    cache_policy: CachePolicy,
    persist_to_cache: bool,
    headers: Vec<(String, String)>,
}

impl RequestDescriptor {
    pub fn builder(
        method: Method,
        base_url: impl Into<String>,
        path: impl Into<String>,
    ) -> RequestBuilder {
        RequestBuilder {
            method,
            base_url: base_url.into(),
            path: path.into(),
            parameters: None,
            url_parameters: None,
            encoding: Encoding::default(),
            cache_policy: CachePolicy::default(),
            persist_to_cache: true,
            headers: Vec::new(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn parameters(&self) -> Option<&Value> {
        self.parameters.as_ref()
    }

    pub fn url_parameters(&self) -> Option<&Value> {
        self.url_parameters.as_ref()
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn cache_policy(&self) -> CachePolicy {
        self.cache_policy
    }

    pub fn persist_to_cache(&self) -> bool {
        self.persist_to_cache
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// A copy of this descriptor with a different cache policy.
    pub fn with_cache_policy(&self, policy: CachePolicy) -> Self {
        Self {
            cache_policy: policy,
            ..self.clone()
        }
    }

    /// Base URL joined with the path, without any query parameters.
    ///
    /// Absolute `http(s)://` paths are used as-is.
    pub fn url(&self) -> Result<Url, Error> {
        if self.path.starts_with("http://") || self.path.starts_with("https://") {
            return Ok(Url::parse(&self.path)?);
        }

        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(self.path.trim_start_matches('/'))?)
    }

    /// Cache key for this request's response.
    ///
    /// Independent of the cache policy, so reissuing with another policy
    /// finds the same entry.
    pub fn cache_key(&self) -> Result<String, Error> {
        let url = self.url()?;
        let parameters = match self.method {
            Method::GET => wire::merge_query(self.parameters(), self.url_parameters())?,
            _ => {
                let mut parts = Value::map();
                if let Some(body) = self.parameters() {
                    parts.insert("body", body.clone());
                }
                if let Some(query) = self.url_parameters() {
                    parts.insert("query", query.clone());
                }
                Some(parts)
            }
        };
        Ok(derive_key(self.method.as_str(), url.as_str(), parameters.as_ref()))
    }
}

/// Builder for [`RequestDescriptor`].
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    method: Method,
    base_url: String,
    path: String,
    parameters: Option<Value>,
    url_parameters: Option<Value>,
    encoding: Encoding,
    cache_policy: CachePolicy,
    persist_to_cache: bool,
    headers: Vec<(String, String)>,
}

impl RequestBuilder {
    /// Body parameters (query parameters for GET).
    pub fn parameters(mut self, parameters: impl Into<Value>) -> Self {
        self.parameters = Some(parameters.into());
        self
    }

    /// Parameters that always go into the query string.
    pub fn url_parameters(mut self, parameters: impl Into<Value>) -> Self {
        self.url_parameters = Some(parameters.into());
        self
    }

    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn cache_policy(mut self, policy: CachePolicy) -> Self {
        self.cache_policy = policy;
        self
    }

    /// Whether a successful response is written to the cache. Defaults to true.
    pub fn persist_to_cache(mut self, persist: bool) -> Self {
        self.persist_to_cache = persist;
        self
    }

    /// Add a header. A later header with the same name replaces an earlier one.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn build(self) -> Result<RequestDescriptor, Error> {
        Ok(RequestDescriptor {
            method: self.method,
            base_url: Url::parse(&self.base_url)?,
            path: self.path,
            parameters: self.parameters,
            url_parameters: self.url_parameters,
            encoding: self.encoding,
            cache_policy: self.cache_policy,
            persist_to_cache: self.persist_to_cache,
            headers: self.headers,
        })
    }
}

/// A fixed base URL with headers shared by every request to it.
///
/// ```
/// use apicache_http::{Endpoint, Method};
///
/// let api = Endpoint::new("https://api.example.com/v1")
///     .unwrap()
///     .with_header("Accept", "application/json");
/// let request = api.request(Method::GET, "users").build().unwrap();
/// assert_eq!(request.url().unwrap().as_str(), "https://api.example.com/v1/users");
/// ```
#[derive(Debug, Clone)]
pub struct Endpoint {
    base_url: Url,
    headers: Vec<(String, String)>,
}

impl Endpoint {
    pub fn new(base_url: &str) -> Result<Self, Error> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            headers: Vec::new(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Start a request against this endpoint, pre-filled with its headers.
    pub fn request(&self, method: Method, path: impl Into<String>) -> RequestBuilder {
        let mut builder = RequestDescriptor::builder(method, self.base_url.as_str(), path);
        builder.headers = self.headers.clone();
        builder
    }
}
