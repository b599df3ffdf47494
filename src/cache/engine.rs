//! Order Cache Engine
//!
//! Thread-safe fixed-capacity LRU cache for order records. A single
//! exclusive lock guards the combined map-plus-list state for the duration
//! of every operation, so concurrent callers serialize against each other
//! and never observe a partially updated structure. No operation performs
//! I/O or produces an error; population on miss is the caller's job.

use parking_lot::Mutex;

use crate::cache::lru::LruMap;
use crate::cache::CacheStats;
use crate::error::{Result, ServiceError};
use crate::models::Order;

struct Inner {
    lru: LruMap,
    stats: CacheStats,
}

// == Order Cache ==
/// Shared LRU cache for order records.
///
/// Created once at startup with an immutable capacity; lives for the
/// process lifetime and is never resized. Reads return clones of the stored
/// record; internal nodes never escape the lock.
pub struct OrderCache {
    inner: Mutex<Inner>,
    capacity: usize,
}

impl OrderCache {
    // == Constructor ==
    /// Creates a cache holding at most `capacity` orders.
    ///
    /// Capacity zero is a configuration error, not a runtime fault.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(ServiceError::Config(
                "cache capacity must be greater than 0".to_string(),
            ));
        }
        Ok(Self {
            inner: Mutex::new(Inner {
                lru: LruMap::new(capacity),
                stats: CacheStats::new(),
            }),
            capacity,
        })
    }

    // == Get ==
    /// Looks up an order, promoting it to most-recently-used on a hit.
    ///
    /// A miss has no side effect beyond the stats counter.
    pub fn get(&self, uid: &str) -> Option<Order> {
        let mut inner = self.inner.lock();
        let found = inner.lru.get(uid).cloned();
        match found {
            Some(order) => {
                inner.stats.record_hit();
                Some(order)
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Inserts or replaces the entry for an order, marking it
    /// most-recently-used. Evicts the least-recently-used entry silently
    /// when a new key would exceed capacity.
    pub fn put(&self, order: Order) {
        let mut inner = self.inner.lock();
        if inner.lru.insert(order.uid.clone(), order).is_some() {
            inner.stats.record_eviction();
        }
    }

    // == Put If Newer ==
    /// Version-checked put used by the stream consumer.
    ///
    /// Applies the order only if no cached entry for the same uid carries a
    /// version greater than or equal to the incoming one, making
    /// at-least-once delivery idempotent and out-of-order delivery safe.
    /// Check and insert happen under one lock acquisition. Returns whether
    /// the order was applied; a rejected put leaves recency order untouched.
    pub fn put_if_newer(&self, order: Order) -> bool {
        let mut inner = self.inner.lock();
        if let Some(cached) = inner.lru.peek_version(&order.uid) {
            if cached >= order.version {
                return false;
            }
        }
        if inner.lru.insert(order.uid.clone(), order).is_some() {
            inner.stats.record_eviction();
        }
        true
    }

    // == Invalidate ==
    /// Removes the entry for `uid` if present; no-op otherwise.
    pub fn invalidate(&self, uid: &str) {
        let mut inner = self.inner.lock();
        inner.lru.remove(uid);
    }

    // == Length ==
    /// Current entry count; never exceeds the configured capacity.
    pub fn len(&self) -> usize {
        self.inner.lock().lru.len()
    }

    /// True when no orders are cached.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The immutable capacity the cache was built with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // == Stats ==
    /// Snapshot of the performance counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.lru.len());
        stats
    }

    /// Asserts map/list agreement under the lock. Test harness only.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        self.inner.lock().lru.assert_consistent();
    }
}
