//! Resource Pool
//!
//! Generic content-addressable cache mapping a [`ContentHash`] to one owned
//! native object. Every descriptor family in this crate (state descriptors,
//! binding layouts, pipelines, render passes) is deduplicated through one of
//! these pools.
//!
//! # Deduplication Contract
//!
//! At most one live object exists per distinct hash. Two `get_or_create`
//! calls with equal descriptors return the *same* `Arc` (`Arc::ptr_eq`), not
//! merely equal objects.
//!
//! # Locking
//!
//! Lookup-or-create is double-checked over a `parking_lot::RwLock`:
//!
//! 1. shared lock → lookup; on hit, return.
//! 2. exclusive lock → lookup *again* (another thread may have just
//!    inserted), return if found.
//! 3. construct under the exclusive lock, insert, return.
//!
//! Constructing under the exclusive lock guarantees exactly one construction
//! per key under contention. Construction is expected to be a bounded
//! backend call; readers of *other* keys are only blocked for its duration.
//!
//! # Failure
//!
//! A failed construction propagates the error and leaves the pool
//! unmodified — no partial or invalid entry is ever inserted.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::hash::ContentHash;

// ─── Statistics ───────────────────────────────────────────────────────────────

/// Snapshot of a pool's cache effectiveness counters.
#[derive(Debug, Default, Clone, Copy)]
pub struct PoolStats {
    /// Lookups satisfied by an existing entry.
    pub hits: u64,
    /// Lookups that constructed a new entry.
    pub misses: u64,
    /// Current number of live entries.
    pub entries: usize,
}

// ─── ResourcePool ─────────────────────────────────────────────────────────────

/// Thread-safe, hash-keyed deduplication cache for native objects.
pub struct ResourcePool<T> {
    entries: RwLock<FxHashMap<ContentHash, Arc<T>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    /// Shown in cache hit/miss logs.
    name: &'static str,
}

impl<T> ResourcePool<T> {
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            entries: RwLock::new(FxHashMap::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            name,
        }
    }

    /// Return the entry for `hash`, constructing it with `create` on miss.
    ///
    /// Safe to call concurrently with the same or different hashes; `create`
    /// runs at most once per distinct hash for the lifetime of the entry.
    pub fn get_or_create<F>(&self, hash: ContentHash, create: F) -> Result<Arc<T>>
    where
        F: FnOnce() -> Result<T>,
    {
        if let Some(existing) = self.entries.read().get(&hash) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            log::trace!("{} cache HIT {hash:#018x}", self.name);
            return Ok(Arc::clone(existing));
        }

        let mut entries = self.entries.write();
        // Re-check: another thread may have inserted between the locks.
        if let Some(existing) = entries.get(&hash) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Arc::clone(existing));
        }

        log::debug!("{} cache MISS {hash:#018x}, creating", self.name);
        self.misses.fetch_add(1, Ordering::Relaxed);
        let object = Arc::new(create()?);
        entries.insert(hash, Arc::clone(&object));
        Ok(object)
    }

    /// Look up an entry without creating it.
    #[must_use]
    pub fn get(&self, hash: ContentHash) -> Option<Arc<T>> {
        self.entries.read().get(&hash).cloned()
    }

    /// Insert a pre-built object under `hash`.
    ///
    /// Used when construction must happen outside the pool. Replacing an
    /// existing entry is a caller bug; the previous entry, if any, is
    /// returned so the caller can detect it.
    pub fn add(&self, hash: ContentHash, object: T) -> (Arc<T>, Option<Arc<T>>) {
        let object = Arc::new(object);
        let previous = self.entries.write().insert(hash, Arc::clone(&object));
        debug_assert!(
            previous.is_none(),
            "{} pool: add() replaced a live entry {hash:#018x}",
            self.name
        );
        (object, previous)
    }

    /// Remove and return one entry, transferring ownership to the caller.
    ///
    /// A subsequent `get_or_create` with the same hash constructs a fresh
    /// object.
    pub fn release(&self, hash: ContentHash) -> Option<Arc<T>> {
        let released = self.entries.write().remove(&hash);
        if released.is_some() {
            log::debug!("{} cache released {hash:#018x}", self.name);
        }
        released
    }

    /// Drop every owned entry.
    ///
    /// Only valid at subsystem shutdown: no concurrent access may occur
    /// during or after this call.
    pub fn release_all(&self) {
        let mut entries = self.entries.write();
        log::debug!("{} cache teardown, {} entries", self.name, entries.len());
        entries.clear();
    }

    #[must_use]
    pub fn contains(&self, hash: ContentHash) -> bool {
        self.entries.read().contains_key(&hash)
    }

    /// Current number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Snapshot of the hit/miss counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len(),
        }
    }
}

impl<T> std::fmt::Debug for ResourcePool<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("name", &self.name)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RhiError;

    #[test]
    fn get_or_create_dedups_by_hash() {
        let pool: ResourcePool<u32> = ResourcePool::new("test");
        let a = pool.get_or_create(7, || Ok(1)).unwrap();
        let b = pool.get_or_create(7, || Ok(2)).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(*b, 1, "second create closure must not run");
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn failed_creation_leaves_pool_unmodified() {
        let pool: ResourcePool<u32> = ResourcePool::new("test");
        let err = pool.get_or_create(7, || {
            Err(RhiError::BackendCreation {
                what: "thing",
                reason: "out of memory".into(),
            })
        });
        assert!(err.is_err());
        assert!(pool.is_empty());
        assert!(!pool.contains(7));

        // The key is still creatable afterwards.
        let ok = pool.get_or_create(7, || Ok(3)).unwrap();
        assert_eq!(*ok, 3);
    }

    #[test]
    fn add_inserts_a_prebuilt_object() {
        let pool: ResourcePool<u32> = ResourcePool::new("test");
        let (added, previous) = pool.add(5, 42);
        assert!(previous.is_none());

        let fetched = pool.get_or_create(5, || Ok(0)).unwrap();
        assert!(Arc::ptr_eq(&added, &fetched));
        assert_eq!(*fetched, 42);
    }

    #[test]
    fn release_detaches_entry() {
        let pool: ResourcePool<u32> = ResourcePool::new("test");
        let first = pool.get_or_create(9, || Ok(10)).unwrap();
        let released = pool.release(9).unwrap();
        assert!(Arc::ptr_eq(&first, &released));

        let second = pool.get_or_create(9, || Ok(11)).unwrap();
        assert!(!Arc::ptr_eq(&first, &second), "fresh construction expected");
        assert_eq!(*second, 11);
    }

    #[test]
    fn release_all_empties_pool() {
        let pool: ResourcePool<u32> = ResourcePool::new("test");
        for i in 0..4 {
            pool.get_or_create(i, || Ok(i as u32)).unwrap();
        }
        pool.release_all();
        assert!(pool.is_empty());
    }

    #[test]
    fn stats_count_hits_and_misses() {
        let pool: ResourcePool<u32> = ResourcePool::new("test");
        pool.get_or_create(1, || Ok(1)).unwrap();
        pool.get_or_create(1, || Ok(1)).unwrap();
        pool.get_or_create(2, || Ok(2)).unwrap();

        let stats = pool.stats();
        assert_eq!(stats.misses, 2);
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.entries, 2);
    }
}
