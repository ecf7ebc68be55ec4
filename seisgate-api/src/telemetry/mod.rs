//! SEISGATE Telemetry - Observability Infrastructure
//!
//! Structured JSON logging through `tracing` and Prometheus metrics for
//! the HTTP layer.

pub mod metrics;
pub mod middleware;
pub mod tracer;

pub use metrics::{metrics_handler, GatewayMetrics, MetricsRecorder, RequestSample};
pub use middleware::observability_middleware;
pub use tracer::{init_tracing, TelemetryConfig};
