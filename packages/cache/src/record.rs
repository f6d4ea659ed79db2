use std::time::{SystemTime, UNIX_EPOCH};

use apicache_core::Value;
use serde::{Deserialize, Serialize};

/// One cached response as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub key: String,
    pub payload: Value,
    pub size_bytes: u64,
    /// Milliseconds since the Unix epoch.
    pub last_access: u64,
}

impl CacheRecord {
    pub fn new(key: impl Into<String>, payload: Value) -> Self {
        let size_bytes = payload.size_bytes();
        Self {
            key: key.into(),
            payload,
            size_bytes,
            last_access: now_millis(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
