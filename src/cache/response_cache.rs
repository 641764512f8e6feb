// Response cache - bounded, TTL-checked store of AI responses
// Author: kelexine (https://github.com/kelexine)

use crate::cache::models::{CacheStats, CachedResponse};
use crate::config::CacheConfig;
use crate::utils::Clock;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;
use tracing::debug;

/// Cache of AI responses keyed by a derived prompt key.
///
/// Entries are checked for freshness when read; nothing sweeps them in the
/// background. A stale entry stays in place until it is overwritten or
/// evicted. When full, inserting a new key evicts the entry inserted longest
/// ago. Reads and overwrites do not change that order.
pub struct ResponseCache {
    ttl_ms: i64,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

struct Inner {
    entries: LruCache<String, CachedResponse>,
    stats: CacheStats,
}

impl ResponseCache {
    /// Create a cache. A capacity of zero is treated as one.
    pub fn new(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(config.capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            ttl_ms: config.ttl().as_millis() as i64,
            clock,
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Fresh response for `key`, if any.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now_millis();
        let mut inner = self.inner.lock();

        let fresh = inner
            .entries
            .peek(key)
            .filter(|entry| now - entry.stored_at < self.ttl_ms)
            .map(|entry| entry.text.clone());

        if fresh.is_some() {
            inner.stats.hits += 1;
            crate::metrics::record_cache_hit();
        } else {
            inner.stats.misses += 1;
            crate::metrics::record_cache_miss();
        }
        fresh
    }

    /// Store `text` under `key`, replacing any previous entry.
    pub fn put(&self, key: impl Into<String>, text: impl Into<String>) {
        let key = key.into();
        let entry = CachedResponse {
            text: text.into(),
            stored_at: self.clock.now_millis(),
        };

        let mut inner = self.inner.lock();
        inner.stats.inserts += 1;

        if let Some(existing) = inner.entries.peek_mut(&key) {
            *existing = entry;
            return;
        }

        if inner.entries.len() >= inner.entries.cap().get() {
            if let Some((evicted, _)) = inner.entries.pop_lru() {
                debug!("Evicting cached response for key {}", preview(&evicted));
                inner.stats.evictions += 1;
                crate::metrics::record_cache_eviction();
            }
        }

        inner.entries.put(key, entry);
        crate::metrics::record_cache_insert();
        crate::metrics::update_cache_entries(inner.entries.len());
    }

    /// Number of stored entries, stale ones included.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.lock().entries.contains(key)
    }

    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }

    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        crate::metrics::update_cache_entries(0);
        debug!("Response cache cleared");
    }
}

fn preview(key: &str) -> String {
    key.chars().take(16).collect()
}
