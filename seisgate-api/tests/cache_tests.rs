//! Compute cache behavior as seen through HTTP.

mod support;

use axum::http::StatusCode;
use seisgate_core::Credential;
use seisgate_storage::ComputeCache;
use seisgate_test_utils::fixtures::*;
use seisgate_test_utils::{DATASET, READER_TOKEN, SECOND_READER_TOKEN, STRANGER_TOKEN};
use serde_json::json;
use support::TestApp;

#[tokio::test]
async fn test_repeat_request_is_served_from_cache() -> Result<(), String> {
    let app = TestApp::new();
    let request = slice_request(DATASET, "j", 1, READER_TOKEN);

    let first = app.post("/slice", &request).await?;
    let second = app.post("/slice", &request).await?;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.cache(), Some("miss"));
    assert_eq!(second.cache(), Some("hit"));
    assert_eq!(first.parts()?, second.parts()?);
    assert_eq!(app.engine.opened_handles(), 1);
    Ok(())
}

#[tokio::test]
async fn test_cache_is_shared_across_credentials() -> Result<(), String> {
    let app = TestApp::new();
    app.post("/slice", &slice_request(DATASET, "k", 2, READER_TOKEN))
        .await?;
    let other = app
        .post("/slice", &slice_request(DATASET, "k", 2, SECOND_READER_TOKEN))
        .await?;

    assert_eq!(other.status, StatusCode::OK);
    assert_eq!(other.cache(), Some("hit"));
    assert_eq!(app.cache.inserts(), 1);
    Ok(())
}

#[tokio::test]
async fn test_get_and_post_share_entries() -> Result<(), String> {
    let app = TestApp::new();
    let request = fence_request(DATASET, "ij", json!([[1, 1]]), READER_TOKEN);

    let posted = app.post("/fence", &request).await?;
    let fetched = app.get("/fence", &request).await?;

    assert_eq!(posted.cache(), Some("miss"));
    assert_eq!(fetched.status, StatusCode::OK);
    assert_eq!(fetched.cache(), Some("hit"));
    Ok(())
}

#[tokio::test]
async fn test_cached_product_is_withheld_from_strangers() -> Result<(), String> {
    let app = TestApp::new();
    let request = slice_request(DATASET, "i", 0, READER_TOKEN);
    app.post("/slice", &request).await?;

    let stranger = app
        .post("/slice", &slice_request(DATASET, "i", 0, STRANGER_TOKEN))
        .await?;
    assert_eq!(stranger.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        stranger.error()?,
        "Could not open VDS: server failed to authenticate the request"
    );
    assert!(stranger.cache().is_none());
    Ok(())
}

#[tokio::test]
async fn test_revocation_takes_effect_on_cached_products() -> Result<(), String> {
    let app = TestApp::new();
    let request = metadata_request(DATASET, READER_TOKEN);
    let before = app.post("/metadata", &request).await?;
    assert_eq!(before.status, StatusCode::OK);

    app.engine
        .revoke(DATASET, &Credential::new(READER_TOKEN.to_string()));
    let after = app.post("/metadata", &request).await?;

    assert_eq!(after.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(after.error()?.starts_with("Could not open VDS"));
    Ok(())
}

#[tokio::test]
async fn test_failed_requests_are_never_cached() -> Result<(), String> {
    let app = TestApp::new();
    let requests = [
        ("/slice", slice_request(DATASET, "sideways", 0, READER_TOKEN)),
        ("/slice", slice_request(DATASET, "i", 99, READER_TOKEN)),
        ("/slice", slice_request(DATASET, "i", 0, STRANGER_TOKEN)),
        (
            "/attributes/surface/along",
            along_surface_request(flat_surface_json(8.0), 300.0, 0.0, &["mean"], READER_TOKEN),
        ),
    ];
    for (path, request) in &requests {
        let response = app.post(path, request).await?;
        assert!(!response.status.is_success(), "{} unexpectedly succeeded", path);
    }

    assert_eq!(app.cache.inserts(), 0);
    assert_eq!(app.engine.live_handles(), 0);
    Ok(())
}

#[tokio::test]
async fn test_disabled_cache_always_misses() -> Result<(), String> {
    let app = TestApp::with_cache(ComputeCache::disabled());
    let request = slice_request(DATASET, "i", 0, READER_TOKEN);

    for _ in 0..3 {
        let response = app.post("/slice", &request).await?;
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.cache(), Some("miss"));
    }
    assert_eq!(app.engine.opened_handles(), 3);
    Ok(())
}

#[tokio::test]
async fn test_identical_requests_yield_identical_bytes() -> Result<(), String> {
    let app = TestApp::with_cache(ComputeCache::disabled());
    let request = between_surfaces_request(
        flat_surface_json(4.0),
        flat_surface_json(16.0),
        &["mean", "rms", "sd"],
        READER_TOKEN,
    );

    let first = app.post("/attributes/surface/between", &request).await?;
    let second = app.post("/attributes/surface/between", &request).await?;
    let (first, second) = (first.parts()?, second.parts()?);
    assert_eq!(first.len(), 4);
    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_every_handle_is_released() -> Result<(), String> {
    let app = TestApp::new();
    let requests = [
        ("/metadata", metadata_request(DATASET, READER_TOKEN)),
        ("/slice", slice_request(DATASET, "crossline", 11, READER_TOKEN)),
        ("/slice", slice_request(DATASET, "depth", 7, READER_TOKEN)),
        ("/fence", fence_request(DATASET, "cdp", json!([[2, 0], [8, 4]]), READER_TOKEN)),
        ("/fence", fence_request(DATASET, "bogus", json!([[0, 0]]), READER_TOKEN)),
    ];
    for (path, request) in &requests {
        app.post(path, request).await?;
    }

    assert_eq!(app.engine.opened_handles(), requests.len());
    assert_eq!(app.engine.live_handles(), 0);
    Ok(())
}
