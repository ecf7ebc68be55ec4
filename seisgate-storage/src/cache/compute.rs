//! Byte-bounded LRU cache of computed products.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use moka::notification::RemovalCause;
use moka::policy::EvictionPolicy;
use moka::sync::Cache;
use seisgate_core::CacheKey;

use super::entry::CacheEntry;
use super::traits::{CacheBackend, CacheStats};

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// Configuration for the compute cache.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheConfig {
    /// Total bytes of metadata and blocks the cache may hold. Zero disables
    /// caching.
    pub max_bytes: u64,
}

impl CacheConfig {
    /// Create a new cache config with default values (disabled).
    pub fn new() -> Self {
        Self::default()
    }

    /// Budget expressed in megabytes.
    pub fn with_megabytes(mut self, megabytes: u64) -> Self {
        self.max_bytes = megabytes.saturating_mul(BYTES_PER_MEGABYTE);
        self
    }

    /// Budget expressed in bytes.
    pub fn with_max_bytes(mut self, bytes: u64) -> Self {
        self.max_bytes = bytes;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.max_bytes > 0
    }
}

/// Compute cache backed by `moka`.
///
/// A zero budget builds a cache that stores nothing and misses every lookup.
pub struct ComputeCache {
    config: CacheConfig,
    entries: Option<Cache<CacheKey, Arc<CacheEntry>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: Arc<AtomicU64>,
}

impl ComputeCache {
    pub fn new(config: CacheConfig) -> Self {
        let evictions = Arc::new(AtomicU64::new(0));
        let entries = config.is_enabled().then(|| {
            let counter = Arc::clone(&evictions);
            Cache::builder()
                .max_capacity(config.max_bytes)
                .weigher(|_key: &CacheKey, entry: &Arc<CacheEntry>| entry.weight())
                .eviction_policy(EvictionPolicy::lru())
                .eviction_listener(move |_key, _entry, cause| {
                    if matches!(cause, RemovalCause::Size) {
                        counter.fetch_add(1, Ordering::Relaxed);
                    }
                })
                .build()
        });

        tracing::debug!(
            max_bytes = config.max_bytes,
            enabled = config.is_enabled(),
            "Compute cache configured"
        );

        Self {
            config,
            entries,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions,
        }
    }

    /// Cache with a budget of `megabytes`.
    pub fn with_megabytes(megabytes: u64) -> Self {
        Self::new(CacheConfig::new().with_megabytes(megabytes))
    }

    pub fn disabled() -> Self {
        Self::new(CacheConfig::new())
    }

    pub fn config(&self) -> CacheConfig {
        self.config
    }

    /// Apply pending bookkeeping (weights, recency, evictions) now.
    /// Only needed by callers that inspect sizes right after writing.
    pub fn run_pending_tasks(&self) {
        if let Some(entries) = &self.entries {
            entries.run_pending_tasks();
        }
    }

    /// Whether `key` is stored. Does not count as a hit or a miss.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries
            .as_ref()
            .is_some_and(|entries| entries.contains_key(key))
    }
}

impl CacheBackend for ComputeCache {
    fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        let found = self.entries.as_ref().and_then(|entries| entries.get(key));
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    fn insert(&self, key: CacheKey, entry: Arc<CacheEntry>) {
        if let Some(entries) = &self.entries {
            tracing::trace!(key = %key, bytes = entry.size_in_bytes(), "Caching computed product");
            entries.insert(key, entry);
        }
    }

    fn is_enabled(&self) -> bool {
        self.entries.is_some()
    }

    fn stats(&self) -> CacheStats {
        let (entry_count, memory_bytes) = self
            .entries
            .as_ref()
            .map(|entries| (entries.entry_count(), entries.weighted_size()))
            .unwrap_or_default();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entry_count,
            memory_bytes,
            capacity_bytes: self.config.max_bytes,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for ComputeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComputeCache")
            .field("config", &self.config)
            .field("stats", &self.stats())
            .finish()
    }
}


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================
