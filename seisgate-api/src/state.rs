//! Shared application state for Axum routers.

use std::sync::Arc;
use std::time::Instant;

use seisgate_core::{ConnectionMaker, CredentialResolver};
use seisgate_storage::{CacheBackend, ComputeCache};

use crate::config::ApiConfig;
use crate::error::ApiResult;
use crate::pipeline::DataPipeline;
use crate::telemetry::{GatewayMetrics, MetricsRecorder};

/// Application-wide state shared across all routes.
#[derive(Clone)]
pub struct AppState {
    /// Normalize, authorize, compute and cache.
    pub pipeline: Arc<DataPipeline>,
    /// The compute cache the pipeline writes to, shared for health reporting.
    pub cache: Arc<dyn CacheBackend>,
    /// Prometheus registry. `None` when metrics are disabled.
    pub metrics: Option<Arc<GatewayMetrics>>,
    /// Sender side of the metrics channel.
    pub recorder: Option<MetricsRecorder>,
    pub start_time: Instant,
}

crate::impl_from_ref!(Arc<DataPipeline>, pipeline);
crate::impl_from_ref!(Arc<dyn CacheBackend>, cache);
crate::impl_from_ref!(Option<MetricsRecorder>, recorder);
crate::impl_from_ref!(Instant, start_time);

impl AppState {
    /// State without metrics.
    pub fn new(
        engine: Arc<dyn ConnectionMaker>,
        resolver: CredentialResolver,
        cache: Arc<dyn CacheBackend>,
    ) -> Self {
        let pipeline = DataPipeline::new(engine, resolver, Arc::clone(&cache));
        Self {
            pipeline: Arc::new(pipeline),
            cache,
            metrics: None,
            recorder: None,
            start_time: Instant::now(),
        }
    }

    /// Attach a metrics registry and spawn the task that drains samples
    /// into it. Must be called from within a tokio runtime.
    pub fn with_metrics(mut self, buffer: usize) -> ApiResult<Self> {
        let metrics = Arc::new(GatewayMetrics::new()?);
        let recorder = MetricsRecorder::spawn(Arc::clone(&metrics), buffer)?;
        self.metrics = Some(metrics);
        self.recorder = Some(recorder);
        Ok(self)
    }

    /// Build the state described by `config` on top of `engine`.
    pub fn from_config(config: &ApiConfig, engine: Arc<dyn ConnectionMaker>) -> ApiResult<Self> {
        let cache: Arc<dyn CacheBackend> = Arc::new(ComputeCache::new(config.cache_config()));
        let state = Self::new(engine, config.resolver(), cache);
        if config.metrics_enabled {
            state.with_metrics(config.metrics_buffer)
        } else {
            Ok(state)
        }
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("cache", &self.cache.stats())
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}
