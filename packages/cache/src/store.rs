//! The two-tier cache store.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use apicache_core::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::disk::DiskTier;
use crate::key::is_valid_key;
use crate::memory::MemoryTier;
use crate::{CacheConfig, CacheError, CacheRecord};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn check_key(key: &str) -> Result<(), CacheError> {
    if is_valid_key(key) {
        Ok(())
    } else {
        Err(CacheError::InvalidKey {
            key: key.to_string(),
        })
    }
}

struct Tiers {
    memory: MemoryTier,
    // bumped by every write and clear; doubles as the write generation
    epoch: u64,
}

struct Inner {
    tiers: Mutex<Tiers>,
    disk: DiskTier,
    runtime: Handle,
    // key -> generation of the record on disk, while a write is in flight
    persisted: Mutex<HashMap<String, Arc<Mutex<u64>>>>,
}

impl Inner {
    fn slot(&self, key: &str) -> Arc<Mutex<u64>> {
        Arc::clone(lock(&self.persisted).entry(key.to_string()).or_default())
    }

    /// Write `record` unless a newer write for the same key already landed.
    fn persist(&self, slot: Arc<Mutex<u64>>, generation: u64, record: &CacheRecord) -> Result<(), CacheError> {
        let result = {
            let mut on_disk = lock(&slot);
            if *on_disk > generation {
                tracing::trace!(key = %record.key, generation, "superseded cache write skipped");
                Ok(())
            } else {
                match self.disk.write(record) {
                    Ok(()) => {
                        *on_disk = generation;
                        Ok(())
                    }
                    Err(error) => {
                        tracing::warn!(key = %record.key, %error, "persisting cache record failed");
                        Err(error)
                    }
                }
            }
        };
        self.release(&record.key, slot);
        result
    }

    /// Forget the slot of `key` once no other write holds it.
    fn release(&self, key: &str, slot: Arc<Mutex<u64>>) {
        let mut persisted = lock(&self.persisted);
        let idle = matches!(persisted.get(key), Some(current) if Arc::ptr_eq(current, &slot))
            && Arc::strong_count(&slot) == 2;
        if idle {
            persisted.remove(key);
        }
        // dropped under the lock so a concurrent release counts it correctly
        drop(slot);
    }

    /// Put a disk hit into memory unless any write or clear happened since
    /// `epoch` was observed.
    fn promote(&self, key: &str, epoch: u64, payload: Value) -> bool {
        let mut tiers = lock(&self.tiers);
        if tiers.epoch != epoch {
            tracing::trace!(key, "promotion skipped after a newer write");
            return false;
        }
        tiers.memory.insert(key, payload)
    }
}

/// Completion signal of a [`CacheStore::write`].
///
/// Dropping it does not cancel the write; it only discards the result.
#[must_use = "await `wait()` to know when the record is durable"]
pub struct PendingWrite {
    handle: JoinHandle<Result<(), CacheError>>,
}

impl PendingWrite {
    /// Resolve once the record is on disk (or the write failed).
    pub async fn wait(self) -> Result<(), CacheError> {
        self.handle.await?
    }
}

/// Memory + disk response cache.
///
/// The memory tier is bounded by [`CacheConfig::memory_limit_bytes`] with
/// least-recently-used eviction; the disk tier is unbounded and survives
/// restarts. Cloning is cheap and clones share both tiers.
///
/// Writes mirror into memory immediately (when the payload fits) and persist
/// on the blocking pool. Until [`PendingWrite::wait`] resolves, a read may
/// observe the previous value or none at all.
///
/// # Example
///
/// ```rust,no_run
/// use apicache_cache::{CacheConfig, CacheStore};
/// use apicache_core::Value;
///
/// # async fn example() -> Result<(), apicache_cache::CacheError> {
/// let cache = CacheStore::new(CacheConfig::new("/tmp/apicache"))?;
///
/// cache.write("greeting", Value::from("hello"))?.wait().await?;
/// assert_eq!(cache.read("greeting").await?, Some(Value::from("hello")));
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct CacheStore {
    inner: Arc<Inner>,
}

impl CacheStore {
    /// Open a store. Must be called from within a tokio runtime.
    pub fn new(config: CacheConfig) -> Result<Self, CacheError> {
        let runtime = Handle::try_current().map_err(|_| CacheError::NoRuntime)?;
        let disk = DiskTier::new(config.directory.clone())?;
        tracing::debug!(
            directory = %disk.root().display(),
            memory_limit = config.memory_limit_bytes,
            "opened cache store"
        );

        Ok(Self {
            inner: Arc::new(Inner {
                tiers: Mutex::new(Tiers {
                    memory: MemoryTier::new(config.memory_limit_bytes),
                    epoch: 0,
                }),
                disk,
                runtime,
                persisted: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Directory holding the persistent tier.
    pub fn directory(&self) -> &Path {
        self.inner.disk.root()
    }

    pub fn memory_used_bytes(&self) -> u64 {
        lock(&self.inner.tiers).memory.used_bytes()
    }

    /// Store `payload` under `key`.
    ///
    /// The memory copy is updated before this returns; the disk copy is
    /// written in the background. When several writes to one key overlap,
    /// the one issued last wins.
    pub fn write(&self, key: impl Into<String>, payload: Value) -> Result<PendingWrite, CacheError> {
        let key = key.into();
        check_key(&key)?;

        // the slot is claimed under the tiers lock so generations reach it in order
        let (generation, slot, mirrored) = {
            let mut tiers = lock(&self.inner.tiers);
            tiers.epoch += 1;
            let slot = self.inner.slot(&key);
            (tiers.epoch, slot, tiers.memory.insert(&key, payload.clone()))
        };
        tracing::debug!(%key, mirrored, size = payload.size_bytes(), "cache write");

        let record = CacheRecord::new(key, payload);
        let inner = Arc::clone(&self.inner);
        let handle = self
            .inner
            .runtime
            .spawn_blocking(move || inner.persist(slot, generation, &record));

        Ok(PendingWrite { handle })
    }

    /// Look up `key`: memory first, then disk.
    ///
    /// A disk hit is promoted into memory when it fits, unless a write was
    /// issued while the disk read was in flight.
    pub async fn read(&self, key: &str) -> Result<Option<Value>, CacheError> {
        check_key(key)?;

        let (cached, epoch) = {
            let mut tiers = lock(&self.inner.tiers);
            (tiers.memory.get(key), tiers.epoch)
        };
        if let Some(payload) = cached {
            tracing::debug!(key, "memory tier hit");
            return Ok(Some(payload));
        }

        let inner = Arc::clone(&self.inner);
        let owned_key = key.to_string();
        let record = self
            .inner
            .runtime
            .spawn_blocking(move || inner.disk.read(&owned_key))
            .await??;

        let Some(record) = record else {
            tracing::debug!(key, "cache miss");
            return Ok(None);
        };

        let promoted = self.inner.promote(key, epoch, record.payload.clone());
        tracing::debug!(key, promoted, "disk tier hit");
        Ok(Some(record.payload))
    }

    /// Whether either tier holds `key`.
    pub async fn exists(&self, key: &str) -> Result<bool, CacheError> {
        check_key(key)?;
        if lock(&self.inner.tiers).memory.contains(key) {
            return Ok(true);
        }

        let inner = Arc::clone(&self.inner);
        let owned_key = key.to_string();
        Ok(self
            .inner
            .runtime
            .spawn_blocking(move || inner.disk.exists(&owned_key))
            .await?)
    }

    /// Whether the memory tier currently holds `key`.
    pub fn is_in_memory_tier(&self, key: &str) -> bool {
        lock(&self.inner.tiers).memory.contains(key)
    }

    /// Invoke `callback(payload, true)` if `key` is cached; otherwise do
    /// nothing. Returns whether the callback ran.
    pub async fn call_if_exists<F>(&self, key: &str, callback: F) -> Result<bool, CacheError>
    where
        F: FnOnce(Value, bool),
    {
        match self.read(key).await? {
            Some(payload) => {
                callback(payload, true);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Empty both tiers.
    pub async fn clear(&self) -> Result<(), CacheError> {
        {
            let mut tiers = lock(&self.inner.tiers);
            tiers.epoch += 1;
            tiers.memory.clear();
        }
        let inner = Arc::clone(&self.inner);
        self.inner
            .runtime
            .spawn_blocking(move || inner.disk.clear())
            .await?
    }
}
