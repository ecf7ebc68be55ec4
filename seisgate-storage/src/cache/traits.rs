//! Cache backend trait and usage statistics.

use std::sync::Arc;

use seisgate_core::CacheKey;

use super::entry::CacheEntry;

/// Cache backend trait for pluggable compute caches.
///
/// Implementations must be safe for concurrent use. `insert` is last writer
/// wins: two requests that raced on the same key both insert and either
/// value may survive. Both values are equal for a deterministic engine.
pub trait CacheBackend: Send + Sync {
    /// Look up a computed product. Counts a hit or a miss.
    fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>>;

    /// Store a computed product, evicting least recently used entries when
    /// the budget is exceeded.
    fn insert(&self, key: CacheKey, entry: Arc<CacheEntry>);

    /// Whether lookups can ever hit.
    fn is_enabled(&self) -> bool {
        true
    }

    /// Get cache statistics.
    fn stats(&self) -> CacheStats;
}

/// Statistics about cache usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits.
    pub hits: u64,
    /// Number of cache misses.
    pub misses: u64,
    /// Number of entries currently in cache.
    pub entry_count: u64,
    /// Bytes currently charged against the budget.
    pub memory_bytes: u64,
    /// Configured budget in bytes.
    pub capacity_bytes: u64,
    /// Number of evictions due to capacity.
    pub evictions: u64,
}

impl CacheStats {
    /// Calculate the hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
