use std::io;
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    #[error("cache directory {} is unusable: {source}", .path.display())]
    DirectoryInvalid { path: PathBuf, source: io::Error },

    #[error("cache I/O failed at {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("cache record serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("invalid cache key '{key}': keys may only contain [A-Za-z0-9._-]")]
    InvalidKey { key: String },

    #[error("a tokio runtime must be running to use the cache")]
    NoRuntime,

    #[error("cache task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for CacheError {
    fn from(error: tokio::task::JoinError) -> Self {
        CacheError::TaskFailed(error.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_shows_path() {
        let e = CacheError::Io {
            path: PathBuf::from("/tmp/cache/abc.json"),
            source: io::Error::other("disk full"),
        };
        let display = e.to_string();
        assert!(display.contains("/tmp/cache/abc.json"));
        assert!(display.contains("disk full"));
    }

    #[test]
    fn invalid_key_display() {
        let e = CacheError::InvalidKey {
            key: "../etc".to_string(),
        };
        assert!(e.to_string().contains("../etc"));
    }
}
