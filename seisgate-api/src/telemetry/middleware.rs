//! Axum Middleware for HTTP Request Tracing and Metrics
//!
//! Every request runs inside an `http_request` span. Handlers fill in the
//! `request` and `fingerprint` fields; the completion line and the metrics
//! sample are emitted here once the response is ready. Only the path is
//! logged, never the query string, since GET requests carry credentials
//! there.

use std::time::Instant;

use axum::{
    body::HttpBody,
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{field, info_span, Instrument};

use super::metrics::{MetricsRecorder, RequestSample};
use crate::pipeline::CacheStatus;

/// Observability middleware for Axum.
pub async fn observability_middleware(
    State(recorder): State<Option<MetricsRecorder>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let span = info_span!(
        "http_request",
        http.method = %method,
        http.target = %path,
        request = field::Empty,
        fingerprint = field::Empty,
    );

    let response = next.run(request).instrument(span.clone()).await;

    let duration = start.elapsed();
    let status = response.status();
    let cache = response.extensions().get::<CacheStatus>().copied();
    let size = response.body().size_hint().exact().unwrap_or(0);

    span.in_scope(|| {
        tracing::info!(
            method = %method,
            path = %path,
            status = status.as_u16(),
            duration_ms = duration.as_millis(),
            cache = cache.map(CacheStatus::as_str),
            bytes = size,
            "Request completed"
        );
    });

    if let Some(recorder) = recorder {
        recorder.record(RequestSample {
            method: method.to_string(),
            path,
            status: status.as_u16(),
            size,
            cache_hit: cache.is_some_and(CacheStatus::is_hit),
            duration_secs: duration.as_secs_f64(),
        });
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::telemetry::GatewayMetrics;
    use axum::{body::Body, http::StatusCode, middleware::from_fn_with_state, routing::get, Router};
    use std::sync::Arc;
    use tower::ServiceExt;

    async fn cached() -> Response {
        let mut response = Response::new(Body::from(vec![0u8; 12]));
        response.extensions_mut().insert(CacheStatus::Hit);
        response
    }

    #[tokio::test]
    async fn test_sample_reaches_registry() -> Result<(), String> {
        let metrics = Arc::new(GatewayMetrics::new().map_err(|e| e.message)?);
        let recorder = MetricsRecorder::spawn(Arc::clone(&metrics), 8).map_err(|e| e.message)?;
        let app = Router::new()
            .route("/slice", get(cached))
            .layer(from_fn_with_state(Some(recorder), observability_middleware));

        let request = Request::builder()
            .uri("/slice?query=%7B%7D")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = app.oneshot(request).await.map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::OK);

        for _ in 0..100 {
            let hits = metrics
                .request_durations
                .with_label_values(&["/slice", "200", "true"])
                .get_sample_count();
            if hits == 1 {
                let sizes = metrics.response_sizes.with_label_values(&["/slice", "200"]);
                assert_eq!(sizes.get_sample_sum(), 12.0);
                return Ok(());
            }
            tokio::task::yield_now().await;
        }
        Err("sample was never recorded".to_string())
    }

    #[tokio::test]
    async fn test_without_recorder() -> Result<(), String> {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(from_fn_with_state(None, observability_middleware));

        let request = Request::builder()
            .uri("/")
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        let response = app.oneshot(request).await.map_err(|e| e.to_string())?;
        assert_eq!(response.status(), StatusCode::OK);
        Ok(())
    }
}
