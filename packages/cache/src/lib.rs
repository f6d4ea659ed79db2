//! Two-tier response cache.
//!
//! - `derive_key`: stable, filesystem-safe fingerprint of a request
//! - `CacheStore`: bounded LRU memory tier over an unbounded disk tier
//! - `CacheConfig`: directory and memory budget
//!
//! The store is an ordinary value: construct one per application (or per
//! test, over a temp directory) and hand clones to whoever needs it.

mod config;
mod disk;
mod error;
mod key;
mod memory;
mod record;
mod store;

pub use config::{CacheConfig, DEFAULT_MEMORY_LIMIT_BYTES};
pub use disk::DiskTier;
pub use error::CacheError;
pub use key::{derive_key, KEY_LENGTH};
pub use memory::MemoryTier;
pub use record::CacheRecord;
pub use store::{CacheStore, PendingWrite};
