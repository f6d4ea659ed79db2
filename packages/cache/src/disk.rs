//! Persistent tier: one JSON file per record.

use std::fs;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::{CacheError, CacheRecord};

const RECORD_EXTENSION: &str = "json";

/// Records stored as `<root>/<key>.json`.
///
/// Writes go to a temp file in the same directory and are renamed over the
/// target, so a reader sees either the old record or the new one, never a
/// partial file. Blocking; call it from the blocking pool.
pub struct DiskTier {
    root: PathBuf,
}

impl DiskTier {
    /// Open (creating if needed) the cache directory.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, CacheError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|source| CacheError::DirectoryInvalid {
            path: root.clone(),
            source,
        })?;

        let attr = fs::metadata(&root).map_err(|source| CacheError::DirectoryInvalid {
            path: root.clone(),
            source,
        })?;
        if !attr.is_dir() {
            return Err(CacheError::DirectoryInvalid {
                path: root,
                source: io::Error::other("cache path must be a directory"),
            });
        }
        if attr.permissions().readonly() {
            return Err(CacheError::DirectoryInvalid {
                path: root,
                source: io::Error::other("cache directory must be writable"),
            });
        }

        match root.canonicalize() {
            Ok(root) => Ok(Self { root }),
            Err(source) => Err(CacheError::DirectoryInvalid { path: root, source }),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, RECORD_EXTENSION))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.record_path(key).is_file()
    }

    /// Read a record. A missing file is `Ok(None)`; so is an unreadable
    /// record, which is logged and left for the next write to replace.
    pub fn read(&self, key: &str) -> Result<Option<CacheRecord>, CacheError> {
        let path = self.record_path(key);
        tracing::trace!(path = %path.display(), "reading cache record");

        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        match serde_json::from_reader::<_, CacheRecord>(BufReader::new(file)) {
            Ok(record) if record.key == key => Ok(Some(record)),
            Ok(record) => {
                tracing::warn!(
                    path = %path.display(),
                    stored_key = %record.key,
                    "cache record key mismatch, treating as miss"
                );
                Ok(None)
            }
            Err(error) => {
                tracing::warn!(path = %path.display(), %error, "corrupt cache record, treating as miss");
                Ok(None)
            }
        }
    }

    /// Atomically replace the record for `record.key`.
    pub fn write(&self, record: &CacheRecord) -> Result<(), CacheError> {
        let path = self.record_path(&record.key);
        tracing::debug!(path = %path.display(), size = record.size_bytes, "writing cache record");

        let io_err = |source: io::Error| CacheError::Io {
            path: path.clone(),
            source,
        };

        let temp = NamedTempFile::new_in(&self.root).map_err(io_err)?;
        {
            let mut writer = BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, record)?;
            writer.flush().map_err(io_err)?;
        }
        temp.as_file().sync_all().map_err(io_err)?;
        temp.persist(&path).map_err(|e| io_err(e.error))?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<bool, CacheError> {
        let path = self.record_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(CacheError::Io { path, source }),
        }
    }

    /// Delete every record file in the directory.
    pub fn clear(&self) -> Result<(), CacheError> {
        let entries = fs::read_dir(&self.root).map_err(|source| CacheError::Io {
            path: self.root.clone(),
            source,
        })?;

        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            let is_record = path.extension().is_some_and(|ext| ext == RECORD_EXTENSION);
            if is_record && path.is_file() {
                match fs::remove_file(&path) {
                    Ok(()) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(source) => return Err(CacheError::Io { path, source }),
                }
            }
        }
        Ok(())
    }
}
