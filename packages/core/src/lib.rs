//! Core apicache types.
//!
//! - `Value`: the parameter / payload tree
//! - `flatten`: tree to bracketed path keys (`a[b][0]`)
//! - `ParameterEncoder`: the capability every wire encoder implements
//!
//! # Example
//!
//! ```rust
//! use apicache_core::{flatten, Value};
//!
//! let params = Value::map().with("user", Value::map().with("name", "Ana"));
//! let flat = flatten(&params);
//! assert_eq!(flat[0].path, "user[name]");
//! ```

pub use bytes::Bytes;

mod encoder;
mod error;
mod flatten;
mod value;

pub use encoder::ParameterEncoder;
pub use error::EncodingError;
pub use flatten::{flatten, FlatEntry, Scalar};
pub use value::{Map, Value};
