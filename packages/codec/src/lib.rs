//! Parameter encoders for apicache.
//!
//! - `JsonEncoder`: JSON request/response bodies
//! - `UrlEncoder`: `key=value&...` query strings and form bodies
//! - `Encoding`: per-request selector between the two
//!
//! # Example
//!
//! ```rust
//! use apicache_codec::Encoding;
//! use apicache_core::Value;
//!
//! let params = Value::map().with("q", "rust");
//! let body = Encoding::UrlQuery.encoder().encode(&params).unwrap();
//! assert_eq!(&body[..], b"q=rust");
//! ```

mod convert;
mod json;
mod url;

use apicache_core::ParameterEncoder;
use serde::{Deserialize, Serialize};

pub use convert::{json_to_value, value_to_json};
pub use json::JsonEncoder;
pub use url::UrlEncoder;

/// Which encoder renders a request body and parses its response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    #[default]
    Json,
    UrlQuery,
}

impl Encoding {
    pub fn encoder(&self) -> &'static dyn ParameterEncoder {
        match self {
            Encoding::Json => &JsonEncoder,
            Encoding::UrlQuery => &UrlEncoder,
        }
    }
}
