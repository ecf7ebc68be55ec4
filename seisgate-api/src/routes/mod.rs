//! REST API Routes Module
//!
//! Every data endpoint accepts the same request document either as the
//! URL-escaped `query` parameter of a GET or as the JSON body of a POST.

use std::time::Duration;

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower_http::cors::{Any, CorsLayer};

use crate::config::ApiConfig;
use crate::response::CACHE_HEADER;
use crate::state::AppState;
use crate::telemetry::{metrics_handler, observability_middleware};

pub mod attributes;
pub mod fence;
pub mod health;
pub mod metadata;
pub mod slice;

// ============================================================================
// OPENAPI ENDPOINTS
// ============================================================================

/// Handler for /openapi.json endpoint.
#[cfg(feature = "openapi")]
async fn openapi_json() -> impl axum::response::IntoResponse {
    use utoipa::OpenApi;
    axum::Json(crate::openapi::ApiDoc::openapi())
}

// ============================================================================
// ROUTER
// ============================================================================

fn build_cors_layer(config: &ApiConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([CACHE_HEADER])
        .max_age(Duration::from_secs(config.cors_max_age_secs));

    if config.cors_origins.is_empty() {
        tracing::info!("CORS: allowing all origins");
        cors.allow_origin(Any)
    } else {
        tracing::info!("CORS: allowing origins: {:?}", config.cors_origins);
        let origins: Vec<HeaderValue> = config
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        cors.allow_origin(origins)
    }
}

/// Create the complete gateway router.
///
/// - Data endpoints: /metadata, /slice, /fence, /attributes/surface/{along,between}
/// - Health checks at / and /health/*
/// - Metrics at /metrics (when metrics are enabled)
/// - OpenAPI spec at /openapi.json (when the openapi feature is enabled)
pub fn create_api_router(state: AppState, config: &ApiConfig) -> Router {
    let mut router = Router::new()
        .route("/", get(health::liveness))
        .nest("/health", health::create_router())
        .route(
            "/metadata",
            get(metadata::metadata_get).post(metadata::metadata_post),
        )
        .route("/slice", get(slice::slice_get).post(slice::slice_post))
        .route("/fence", get(fence::fence_get).post(fence::fence_post))
        .route(
            "/attributes/surface/along",
            get(attributes::along_surface_get).post(attributes::along_surface_post),
        )
        .route(
            "/attributes/surface/between",
            get(attributes::between_surfaces_get).post(attributes::between_surfaces_post),
        );

    #[cfg(feature = "openapi")]
    {
        router = router.route("/openapi.json", get(openapi_json));
    }

    if let Some(metrics) = state.metrics.clone() {
        router = router.merge(
            Router::new()
                .route("/metrics", get(metrics_handler))
                .with_state(metrics),
        );
    }

    router
        .layer(from_fn_with_state(
            state.recorder.clone(),
            observability_middleware,
        ))
        .layer(build_cors_layer(config))
        .with_state(state)
}
