//! Bounded compute cache.
//!
//! Entries are immutable once inserted and are shared with readers through
//! `Arc`, so an entry evicted while a response is being written stays alive
//! until that response is done with it.
//!
//! The cache holds no authorization state. Callers must confirm that the
//! requesting credential may read the dataset before serving a hit.

pub mod compute;
pub mod entry;
pub mod traits;

pub use compute::{CacheConfig, ComputeCache};
pub use entry::CacheEntry;
pub use traits::{CacheBackend, CacheStats};
