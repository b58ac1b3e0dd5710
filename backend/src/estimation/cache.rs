use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, instrument};

#[derive(Clone, Copy, Debug)]
struct CacheEntry {
    base_minutes: i64,
    expires_at: Instant,
}

/// Short-TTL memo of base prep minutes keyed by merchant+order type.
///
/// Guarantees:
/// - Entries live for `ttl` from their write; a write replaces any prior entry.
/// - Memory is bounded: once the entry count exceeds `max_entries` after an
///   insert, the whole map is dropped (not LRU).
/// - The lock is never held while computing. Concurrent misses on the same key
///   may each compute and the last write wins; every stored value is the result
///   of some complete computation.
pub struct PrepTimeCache {
    ttl: Duration,
    max_entries: usize,
    map: Mutex<HashMap<String, CacheEntry>>,
}

impl PrepTimeCache {
    pub fn new(ttl: Duration, max_entries: usize) -> Self {
        Self {
            ttl,
            max_entries,
            map: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.lock().is_empty()
    }

    #[instrument(skip(self), target = "cache")]
    pub fn clear(&self) {
        let mut map = self.map.lock();
        let count = map.len();
        map.clear();

        info!(count, "prep-time cache cleared");
    }

    /// Live value for the key, if any. Expired entries are dropped on sight.
    pub fn get(&self, merchant_id: &str, order_type: &str) -> Option<i64> {
        let key = cache_key(merchant_id, order_type);
        let mut map = self.map.lock();

        match map.get(&key).copied() {
            Some(e) if Instant::now() < e.expires_at => Some(e.base_minutes),
            Some(_) => {
                map.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Stores `base_minutes` with a fresh expiry, resetting the cache if it
    /// grew past its ceiling.
    pub fn insert(&self, merchant_id: &str, order_type: &str, base_minutes: i64) {
        let mut map = self.map.lock();

        map.insert(
            cache_key(merchant_id, order_type),
            CacheEntry {
                base_minutes,
                expires_at: Instant::now() + self.ttl,
            },
        );

        if map.len() > self.max_entries {
            let count = map.len();
            map.clear();
            info!(
                target: "cache",
                count,
                max_entries = self.max_entries,
                "prep-time cache over capacity; reset"
            );
        }
    }

    /// Returns the live cached value or runs `compute`, stores and returns it.
    ///
    /// Check and write are two separate critical sections.
    pub async fn get_or_compute<F, Fut>(
        &self,
        merchant_id: &str,
        order_type: &str,
        compute: F,
    ) -> i64
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = i64>,
    {
        if let Some(hit) = self.get(merchant_id, order_type) {
            debug!(
                target: "cache",
                merchant_id,
                order_type,
                base_minutes = hit,
                "prep-time cache hit"
            );
            return hit;
        }

        let computed = compute().await;
        self.insert(merchant_id, order_type, computed);

        debug!(
            target: "cache",
            merchant_id,
            order_type,
            base_minutes = computed,
            "prep-time cache miss; stored"
        );
        computed
    }
}

fn cache_key(merchant_id: &str, order_type: &str) -> String {
    format!("{merchant_id}:{order_type}")
}
