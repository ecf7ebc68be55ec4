//! Request pipeline shared by every endpoint.
//!
//! A wire request is normalized and fingerprinted, a connection is derived
//! from its credential, and the product is served from the compute cache
//! when the caller is still authorized to read the dataset. Otherwise the
//! dataset is opened on the blocking pool, the variant is executed and the
//! product is cached.

use std::sync::Arc;

use seisgate_core::{
    fingerprint, normalize, ConnectionMaker, CredentialResolver, NormalizedRequest, WireRequest,
};
use seisgate_storage::{CacheBackend, CacheEntry};
use tracing::Span;

use crate::error::ApiResult;

/// Whether a product came out of the compute cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    pub fn is_hit(self) -> bool {
        matches!(self, CacheStatus::Hit)
    }

    /// Value of the `x-cache` response header.
    pub fn as_str(self) -> &'static str {
        match self {
            CacheStatus::Hit => "hit",
            CacheStatus::Miss => "miss",
        }
    }
}

/// A product ready to be written out.
#[derive(Debug, Clone)]
pub struct Computed {
    pub entry: Arc<CacheEntry>,
    pub cache: CacheStatus,
}

/// Normalize, authorize, compute and cache.
pub struct DataPipeline {
    engine: Arc<dyn ConnectionMaker>,
    resolver: CredentialResolver,
    cache: Arc<dyn CacheBackend>,
}

impl DataPipeline {
    pub fn new(
        engine: Arc<dyn ConnectionMaker>,
        resolver: CredentialResolver,
        cache: Arc<dyn CacheBackend>,
    ) -> Self {
        Self {
            engine,
            resolver,
            cache,
        }
    }

    pub fn resolver(&self) -> &CredentialResolver {
        &self.resolver
    }

    /// Run a decoded wire request to completion.
    pub async fn run<R: WireRequest>(&self, request: R) -> ApiResult<Computed> {
        let request = normalize(request, &self.resolver)?;
        let key = fingerprint(&request)?;

        let span = Span::current();
        span.record("request", request.describe().as_str());
        span.record("fingerprint", key.to_hex().as_str());

        let NormalizedRequest {
            connection: descriptor,
            variant,
        } = request;
        let connection = self
            .engine
            .connect(&descriptor)
            .map_err(|e| e.redact(descriptor.credential().expose()))?;

        if let Some(entry) = self.cache.get(&key) {
            if connection.is_authorized_to_read().await {
                tracing::debug!(fingerprint = %key, "Serving cached product");
                return Ok(Computed {
                    entry,
                    cache: CacheStatus::Hit,
                });
            }
            tracing::debug!(fingerprint = %key, "Cached product withheld, caller not authorized");
        }

        let output = tokio::task::spawn_blocking(move || {
            let handle = connection.open()?;
            variant.execute(handle.as_ref())
        })
        .await?
        .map_err(|e| e.redact(descriptor.credential().expose()))?;

        let entry = Arc::new(CacheEntry::from(output));
        tracing::debug!(
            fingerprint = %key,
            bytes = entry.size_in_bytes(),
            blocks = entry.data.len(),
            "Computed product"
        );
        self.cache.insert(key, Arc::clone(&entry));

        Ok(Computed {
            entry,
            cache: CacheStatus::Miss,
        })
    }
}

impl std::fmt::Debug for DataPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataPipeline")
            .field("resolver", &self.resolver)
            .field("cache", &self.cache.stats())
            .finish()
    }
}
