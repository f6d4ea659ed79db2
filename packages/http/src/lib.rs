//! # apicache-http
//!
//! Cache-aware HTTP request execution.
//!
//! A [`RequestDescriptor`] names a request: method, base URL and path,
//! parameters, encoding, cache policy. [`ApiClient::send`] renders it, runs it
//! through the [`CachePolicy`] against a [`CacheStore`](apicache_cache::CacheStore)
//! and the network, and hands each result to a completion callback together
//! with a `from_cache` flag.
//!
//! ## Cache policies
//!
//! | Policy             | Deliveries                                        |
//! |--------------------|---------------------------------------------------|
//! | `NetworkOnly`      | network result                                    |
//! | `CacheOnly`        | cached payload, or nothing on a miss              |
//! | `CacheThenNetwork` | cached payload (if any), then network result      |
//! | `NetworkThenCache` | network result; cached payload if no response came |
//!
//! Successful responses are written to the cache unless the descriptor was
//! built with `persist_to_cache(false)`.
//!
//! ## Endpoints
//!
//! ```
//! use apicache_http::{Endpoint, Method, RequestDescriptor};
//! use apicache_core::Value;
//!
//! fn login(api: &Endpoint, user: &str, password: &str) -> Result<RequestDescriptor, apicache_http::Error> {
//!     api.request(Method::POST, "login")
//!         .parameters(Value::map().with("user", user).with("password", password))
//!         .persist_to_cache(false)
//!         .build()
//! }
//!
//! let api = Endpoint::new("https://api.example.com").unwrap();
//! assert!(!login(&api, "jo", "secret").unwrap().persist_to_cache());
//! ```

pub mod config;
pub mod descriptor;
pub mod error;
pub mod executor;
pub mod handle;
pub mod outcome;
pub mod types;

mod client;
mod dispatch;
mod wire;

// Re-export main types
pub use client::ApiClient;
pub use config::{ClientConfig, DEFAULT_TIMEOUT};
pub use descriptor::{Endpoint, RequestBuilder, RequestDescriptor};
pub use error::{Error, RequestError, TransportError};
pub use executor::{HttpExecutor, ReqwestExecutor};
pub use handle::PendingRequest;
pub use outcome::{Completion, Outcome};
pub use types::{CachePolicy, Method, WireRequest, WireResponse};

pub use apicache_codec::Encoding;
