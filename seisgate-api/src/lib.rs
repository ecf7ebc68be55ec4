//! SEISGATE API - HTTP Gateway for Seismic Volumes
//!
//! Serves metadata, slices, fences and horizon attributes of datasets held
//! by a storage engine. Requests are normalized, fingerprinted and served
//! from a shared compute cache whenever the caller is still authorized to
//! read the dataset.

pub mod config;
pub mod error;
pub mod extract;
pub mod macros;
#[cfg(feature = "openapi")]
pub mod openapi;
pub mod pipeline;
pub mod response;
pub mod routes;
pub mod state;
pub mod telemetry;

// Re-export commonly used types
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode, ErrorResponse};
#[cfg(feature = "openapi")]
pub use openapi::ApiDoc;
pub use pipeline::{CacheStatus, Computed, DataPipeline};
pub use response::CACHE_HEADER;
pub use routes::create_api_router;
pub use state::AppState;
pub use telemetry::{init_tracing, GatewayMetrics, MetricsRecorder, TelemetryConfig};
