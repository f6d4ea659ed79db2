//! apicache: a client-side HTTP request layer.
//!
//! Requests are described by parameter trees, encoded as JSON or URL query
//! strings, executed against the network and/or a two-tier cache according to
//! a per-request policy, and answered through completion callbacks.
//!
//! - [`core`]: the `Value` tree, flattening, the encoder trait
//! - [`codec`]: JSON and URL-query encoders
//! - [`cache`]: cache keys and the memory + disk `CacheStore`
//! - [`http`]: request descriptors and the `ApiClient`

pub use apicache_cache as cache;
pub use apicache_codec as codec;
pub use apicache_core as core;
pub use apicache_http as http;

pub use apicache_cache::{CacheConfig, CacheStore};
pub use apicache_core::{Map, Value};
pub use apicache_http::{
    ApiClient, CachePolicy, ClientConfig, Completion, Encoding, Endpoint, Method, Outcome,
    PendingRequest, RequestDescriptor, RequestError,
};
