//! Prometheus Metrics Definitions
//!
//! Request metrics live on a private registry owned by [`GatewayMetrics`].
//! Handlers never touch it directly: the observability middleware hands a
//! [`RequestSample`] to the [`MetricsRecorder`] and a background task folds
//! it into the histograms. Samples are dropped when the channel is full.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use prometheus::{Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::error::{ApiError, ApiResult};

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * KB;

/// Request latency buckets (seconds): 100ms up to 2 minutes.
const DURATION_BUCKETS: &[f64] = &[0.1, 0.5, 1.0, 2.0, 5.0, 20.0, 60.0, 120.0];

/// Response size buckets (bytes): 100KB up to 200MB.
const SIZE_BUCKETS: &[f64] = &[
    100.0 * KB,
    MB,
    5.0 * MB,
    10.0 * MB,
    20.0 * MB,
    50.0 * MB,
    100.0 * MB,
    200.0 * MB,
];

/// What the middleware observed about one request.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSample {
    pub method: String,
    pub path: String,
    pub status: u16,
    pub size: u64,
    pub cache_hit: bool,
    pub duration_secs: f64,
}

/// Container for all gateway metrics.
pub struct GatewayMetrics {
    registry: Registry,

    /// Request duration histogram - labels: path, status, cachehit
    pub request_durations: HistogramVec,

    /// Response size histogram - labels: path, status
    pub response_sizes: HistogramVec,

    /// Request counter - labels: method, path
    pub request_count: IntCounterVec,
}

impl GatewayMetrics {
    /// Create all metrics on a fresh registry.
    pub fn new() -> ApiResult<Self> {
        let registry = Registry::new();

        let request_durations = HistogramVec::new(
            HistogramOpts::new(
                "seisgate_durations_histogram_seconds",
                "Gateway latency distributions.",
            )
            .buckets(DURATION_BUCKETS.to_vec()),
            &["path", "status", "cachehit"],
        )
        .map_err(|e| ApiError::internal_error(format!("Failed to create request_durations: {}", e)))?;

        let response_sizes = HistogramVec::new(
            HistogramOpts::new(
                "seisgate_response_sizes_histogram_bytes",
                "Gateway response size distributions.",
            )
            .buckets(SIZE_BUCKETS.to_vec()),
            &["path", "status"],
        )
        .map_err(|e| ApiError::internal_error(format!("Failed to create response_sizes: {}", e)))?;

        let request_count = IntCounterVec::new(
            Opts::new("seisgate_number_of_requests", "Gateway number of requests."),
            &["method", "path"],
        )
        .map_err(|e| ApiError::internal_error(format!("Failed to create request_count: {}", e)))?;

        registry
            .register(Box::new(request_durations.clone()))
            .map_err(|e| ApiError::internal_error(format!("Failed to register request_durations: {}", e)))?;
        registry
            .register(Box::new(response_sizes.clone()))
            .map_err(|e| ApiError::internal_error(format!("Failed to register response_sizes: {}", e)))?;
        registry
            .register(Box::new(request_count.clone()))
            .map_err(|e| ApiError::internal_error(format!("Failed to register request_count: {}", e)))?;

        Ok(Self {
            registry,
            request_durations,
            response_sizes,
            request_count,
        })
    }

    /// Record one completed request.
    pub fn record(&self, sample: &RequestSample) {
        let status = sample.status.to_string();
        let cache_hit = if sample.cache_hit { "true" } else { "false" };

        self.request_durations
            .with_label_values(&[sample.path.as_str(), status.as_str(), cache_hit])
            .observe(sample.duration_secs);
        self.response_sizes
            .with_label_values(&[sample.path.as_str(), status.as_str()])
            .observe(sample.size as f64);
        self.request_count
            .with_label_values(&[sample.method.as_str(), sample.path.as_str()])
            .inc();
    }

    /// Text exposition of everything on the registry.
    pub fn encode(&self) -> ApiResult<Vec<u8>> {
        let mut buffer = Vec::new();
        TextEncoder::new()
            .encode(&self.registry.gather(), &mut buffer)
            .map_err(|e| ApiError::internal_error(format!("Failed to encode metrics: {}", e)))?;
        Ok(buffer)
    }
}

impl std::fmt::Debug for GatewayMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayMetrics").finish_non_exhaustive()
    }
}

/// Sending half of the metrics side channel.
#[derive(Debug, Clone)]
pub struct MetricsRecorder {
    sender: mpsc::Sender<RequestSample>,
}

impl MetricsRecorder {
    /// Spawn the task that drains samples into `metrics`.
    pub fn spawn(metrics: Arc<GatewayMetrics>, capacity: usize) -> ApiResult<Self> {
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            ApiError::internal_error(format!("Metrics recorder requires a tokio runtime: {}", e))
        })?;

        let (sender, mut receiver) = mpsc::channel::<RequestSample>(capacity.max(1));
        runtime.spawn(async move {
            while let Some(sample) = receiver.recv().await {
                metrics.record(&sample);
            }
        });

        Ok(Self { sender })
    }

    /// Queue a sample without waiting.
    pub fn record(&self, sample: RequestSample) {
        match self.sender.try_send(sample) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => tracing::debug!("Metrics channel full, sample dropped"),
            Err(TrySendError::Closed(_)) => tracing::warn!("Metrics recorder stopped"),
        }
    }
}

/// Handler for GET /metrics endpoint.
///
/// Returns Prometheus text format metrics.
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/metrics",
    tag = "Observability",
    responses(
        (status = 200, description = "Prometheus metrics in text format", content_type = "text/plain"),
        (status = 500, description = "Failed to encode metrics", body = crate::error::ErrorResponse),
    ),
))]
pub async fn metrics_handler(State(metrics): State<Arc<GatewayMetrics>>) -> Response {
    match metrics.encode() {
        Ok(buffer) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, TextEncoder::new().format_type().to_string())],
            buffer,
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(path: &str, cache_hit: bool) -> RequestSample {
        RequestSample {
            method: "POST".to_string(),
            path: path.to_string(),
            status: 200,
            size: 2048,
            cache_hit,
            duration_secs: 0.25,
        }
    }

    fn exposition(metrics: &GatewayMetrics) -> Result<String, String> {
        let buffer = metrics.encode().map_err(|e| e.message)?;
        String::from_utf8(buffer).map_err(|e| e.to_string())
    }

    #[test]
    fn test_registries_are_independent() -> Result<(), String> {
        let first = GatewayMetrics::new().map_err(|e| e.message)?;
        let second = GatewayMetrics::new().map_err(|e| e.message)?;
        first.record(&sample("/slice", false));

        assert!(exposition(&first)?.contains("seisgate_number_of_requests"));
        assert!(!exposition(&second)?.contains("path=\"/slice\""));
        Ok(())
    }

    #[test]
    fn test_record_labels() -> Result<(), String> {
        let metrics = GatewayMetrics::new().map_err(|e| e.message)?;
        metrics.record(&sample("/fence", true));

        let text = exposition(&metrics)?;
        assert!(text.contains(r#"cachehit="true""#));
        assert!(text.contains(r#"seisgate_number_of_requests{method="POST",path="/fence"} 1"#));
        assert_eq!(
            metrics
                .response_sizes
                .with_label_values(&["/fence", "200"])
                .get_sample_count(),
            1
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_recorder_drains_in_background() -> Result<(), String> {
        let metrics = Arc::new(GatewayMetrics::new().map_err(|e| e.message)?);
        let recorder = MetricsRecorder::spawn(Arc::clone(&metrics), 8).map_err(|e| e.message)?;
        recorder.record(sample("/metadata", false));

        for _ in 0..100 {
            if metrics.request_count.with_label_values(&["POST", "/metadata"]).get() == 1 {
                return Ok(());
            }
            tokio::task::yield_now().await;
        }
        Err("sample was never recorded".to_string())
    }

    #[test]
    fn test_recorder_needs_runtime() -> Result<(), String> {
        let metrics = Arc::new(GatewayMetrics::new().map_err(|e| e.message)?);
        assert!(MetricsRecorder::spawn(metrics, 8).is_err());
        Ok(())
    }
}
