//! SEISGATE Storage - Compute Cache
//!
//! Holds computed products (metadata document plus binary blocks) keyed by
//! request fingerprint, bounded by a byte budget with LRU eviction.

pub mod cache;

pub use cache::{CacheBackend, CacheConfig, CacheEntry, CacheStats, ComputeCache};
