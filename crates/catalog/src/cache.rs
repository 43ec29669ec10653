//! At-most-one-build caching of parsed artifacts.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Snapshot of cache counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub builds: u64,
    pub failures: u64,
}

/// A bounded, least-recently-used cache from system-id to a shared artifact.
///
/// `get_or_build` checks the cache, then takes the build lock and checks
/// again before building, so concurrent first requests for a key wait for
/// one builder instead of each parsing their own copy. A failed build leaves
/// no entry behind and the next request tries again.
pub struct CachingLoadStrategy<T> {
    entries: Mutex<LruCache<String, Arc<T>>>,
    build_lock: Mutex<()>,
    hits: AtomicU64,
    builds: AtomicU64,
    failures: AtomicU64,
}

impl<T> std::fmt::Debug for CachingLoadStrategy<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachingLoadStrategy")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .field("stats", &self.stats())
            .finish()
    }
}

impl<T> CachingLoadStrategy<T> {
    /// A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            build_lock: Mutex::new(()),
            hits: AtomicU64::new(0),
            builds: AtomicU64::new(0),
            failures: AtomicU64::new(0),
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<T>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn get_or_build<E, F>(&self, key: &str, build: F) -> Result<Arc<T>, E>
    where
        F: FnOnce(&str) -> Result<T, E>,
    {
        if let Some(hit) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::debug!("Cache hit for '{}'", key);
            return Ok(hit);
        }

        let _guard = self.build_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(hit) = self.get(key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(hit);
        }

        log::debug!("Building '{}'", key);
        self.builds.fetch_add(1, Ordering::Relaxed);
        match build(key) {
            Ok(value) => {
                let value = Arc::new(value);
                let evicted = self
                    .entries
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(key.to_string(), value.clone());
                if let Some((evicted_key, _)) = evicted.filter(|(k, _)| k != key) {
                    log::debug!("Evicted '{}'", evicted_key);
                }
                Ok(value)
            }
            Err(err) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                log::debug!("Build of '{}' failed, nothing cached", key);
                Err(err)
            }
        }
    }

    pub fn invalidate(&self, key: &str) -> Option<Arc<T>> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop(key)
    }

    pub fn clear(&self) {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cap()
            .get()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            builds: self.builds.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}
