//! SEISGATE API Server Entry Point
//!
//! Bootstraps configuration and telemetry, builds the storage engine and
//! starts the Axum HTTP server.

use std::sync::Arc;

use axum::Router;
use seisgate_api::{create_api_router, init_tracing, ApiConfig, ApiError, ApiResult, AppState, TelemetryConfig};
use seisgate_core::{ConnectionMaker, MemoryEngine, MemoryVolume};

#[tokio::main]
async fn main() -> ApiResult<()> {
    let telemetry_config = TelemetryConfig::default();
    init_tracing(&telemetry_config)?;

    let config = ApiConfig::from_env();
    let engine = build_engine(&config)?;

    let state = AppState::from_config(&config, engine)?;
    tracing::info!(
        storage_accounts = ?config.storage_accounts,
        cache_bytes = config.cache_config().max_bytes,
        metrics = config.metrics_enabled,
        "Gateway configured"
    );

    let app: Router = create_api_router(state, &config);

    let addr = config.bind_addr()?;
    tracing::info!(%addr, "Starting seisgate API server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| ApiError::internal_error(format!("Failed to bind {}: {}", addr, e)))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::internal_error(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

/// The only engine linked into this binary is the in-memory one. It serves
/// the built-in demo volume when `SEISGATE_DEMO_DATASET` is set.
fn build_engine(config: &ApiConfig) -> ApiResult<Arc<dyn ConnectionMaker>> {
    let engine = MemoryEngine::new();

    match (&config.demo_dataset, &config.demo_credential) {
        (Some(dataset), Some(credential)) => {
            if config.resolver().resolve(dataset, Some(credential.expose())).is_err() {
                return Err(ApiError::invalid_argument(format!(
                    "Demo dataset {} is not under any storage account",
                    dataset
                )));
            }
            engine.register(dataset.as_str(), MemoryVolume::well_known());
            engine.grant(dataset, credential);
            tracing::info!(dataset = %dataset, "Serving demo volume");
        }
        (Some(dataset), None) => {
            engine.register(dataset.as_str(), MemoryVolume::well_known());
            tracing::warn!(dataset = %dataset, "Demo volume registered without a reader credential");
        }
        (None, _) => tracing::warn!("No datasets registered, every request will fail to open"),
    }

    Ok(Arc::new(engine))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
