//! Shared harness for the gateway integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use seisgate_api::{create_api_router, ApiConfig, AppState, CACHE_HEADER};
use seisgate_core::{ConnectionMaker, MemoryEngine};
use seisgate_storage::ComputeCache;
use seisgate_test_utils::{resolver, split_multipart, well_known_engine, Part, RecordingCache};
use serde_json::Value;
use tower::ServiceExt;

/// Router over the well-known engine with a recording cache.
pub struct TestApp {
    pub router: Router,
    pub engine: MemoryEngine,
    pub cache: Arc<RecordingCache>,
}

impl TestApp {
    /// 16 MB cache, no metrics.
    pub fn new() -> Self {
        Self::with_cache(ComputeCache::with_megabytes(16))
    }

    pub fn with_cache(cache: ComputeCache) -> Self {
        let engine = well_known_engine();
        let cache = Arc::new(RecordingCache::new(cache));
        let state = AppState::new(Arc::new(engine.clone()), resolver(), cache.clone());
        let router = create_api_router(state, &ApiConfig::default());
        Self {
            router,
            engine,
            cache,
        }
    }

    /// Router over an arbitrary engine.
    pub fn with_engine(engine: Arc<dyn ConnectionMaker>) -> Router {
        let cache = Arc::new(ComputeCache::with_megabytes(16));
        let state = AppState::new(engine, resolver(), cache);
        create_api_router(state, &ApiConfig::default())
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<TestResponse, String> {
        send(&self.router, post_request(path, body)?).await
    }

    pub async fn get(&self, path: &str, query: &Value) -> Result<TestResponse, String> {
        send(&self.router, get_request(path, query)?).await
    }

    pub async fn get_raw(&self, uri: &str) -> Result<TestResponse, String> {
        let request = Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .map_err(|e| e.to_string())?;
        send(&self.router, request).await
    }
}

pub fn post_request(path: &str, body: &Value) -> Result<Request<Body>, String> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .map_err(|e| e.to_string())
}

pub fn get_request(path: &str, query: &Value) -> Result<Request<Body>, String> {
    let uri = format!("{}?query={}", path, urlencoding::encode(&query.to_string()));
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .map_err(|e| e.to_string())
}

pub async fn send(router: &Router, request: Request<Body>) -> Result<TestResponse, String> {
    let response = router
        .clone()
        .oneshot(request)
        .await
        .map_err(|e| e.to_string())?;
    let status = response.status();
    let headers = response.headers().clone();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .map_err(|e| e.to_string())?;
    Ok(TestResponse {
        status,
        headers,
        body,
    })
}

/// A fully buffered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    pub fn content_type(&self) -> &str {
        self.headers
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
    }

    /// Value of the `x-cache` header.
    pub fn cache(&self) -> Option<&str> {
        self.headers.get(CACHE_HEADER).and_then(|v| v.to_str().ok())
    }

    pub fn json(&self) -> Result<Value, String> {
        serde_json::from_slice(&self.body).map_err(|e| e.to_string())
    }

    /// The `error` field of a failure body.
    pub fn error(&self) -> Result<String, String> {
        self.json()?
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| format!("no error field in {:?}", self.body))
    }

    pub fn parts(&self) -> Result<Vec<Part>, String> {
        split_multipart(self.content_type(), &self.body)
    }

    /// Metadata JSON of a multipart response.
    pub fn part_metadata(&self) -> Result<Value, String> {
        let parts = self.parts()?;
        let first = parts.first().ok_or("no parts")?;
        serde_json::from_slice(&first.body).map_err(|e| e.to_string())
    }
}
