//! Response cache entry and statistics models.

// Author: kelexine (https://github.com/kelexine)

/// A cached AI response together with the moment it was stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedResponse {
    pub text: String,
    /// Epoch milliseconds.
    pub stored_at: i64,
}

/// Statistics for cache operations.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of fresh entries returned.
    pub hits: u64,
    /// Number of lookups that found nothing or a stale entry.
    pub misses: u64,
    /// Number of `put` calls.
    pub inserts: u64,
    /// Number of entries dropped to make room.
    pub evictions: u64,
}
