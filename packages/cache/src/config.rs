use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default memory-tier budget: 1 MiB.
pub const DEFAULT_MEMORY_LIMIT_BYTES: u64 = 1024 * 1024;

/// Cache settings.
///
/// Deserializable so it can sit in an application config file; missing
/// fields fall back to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding one JSON file per cached record.
    pub directory: PathBuf,

    /// Upper bound on the summed `size_bytes` of memory-tier payloads.
    pub memory_limit_bytes: u64,
}

impl CacheConfig {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            memory_limit_bytes: DEFAULT_MEMORY_LIMIT_BYTES,
        }
    }

    pub fn with_memory_limit(mut self, bytes: u64) -> Self {
        self.memory_limit_bytes = bytes;
        self
    }

    /// `<user cache dir>/apicache`, or `<tmp>/apicache` when the platform
    /// has no cache directory.
    pub fn default_directory() -> PathBuf {
        dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("apicache")
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(Self::default_directory())
    }
}
