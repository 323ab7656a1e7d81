//! Bounded memo of derived deposits.
//!
//! Populating one chunk re-derives every deposit within range, so adjacent
//! chunk populations repeat almost all of that work. The cache only ever
//! returns what derivation would have produced for the same key.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use lru::LruCache;
use oilgen_world::ChunkPos;
use serde::Serialize;

use crate::generator::Deposit;

type Key = (u64, ChunkPos);

/// Hit/miss counters since creation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub resident: usize,
}

/// LRU of deposits keyed by `(seed, chunk)`.
pub struct DepositCache {
    entries: Mutex<LruCache<Key, Arc<Deposit>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl DepositCache {
    /// `None` for a zero capacity.
    pub fn new(capacity: usize) -> Option<Self> {
        let capacity = NonZeroUsize::new(capacity)?;
        Some(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Cached deposit for the key, deriving and inserting it on a miss.
    ///
    /// Derivation runs without the lock held.
    pub fn get_or_insert_with<F>(&self, seed: u64, chunk: ChunkPos, derive: F) -> Arc<Deposit>
    where
        F: FnOnce() -> Deposit,
    {
        let key = (seed, chunk);
        if let Some(hit) = self.lock().get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(hit);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);

        let deposit = Arc::new(derive());
        self.lock().put(key, Arc::clone(&deposit));
        deposit
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            resident: self.lock().len(),
        }
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    // Entries are immutable once inserted, so a poisoned lock still holds valid data.
    fn lock(&self) -> MutexGuard<'_, LruCache<Key, Arc<Deposit>>> {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
