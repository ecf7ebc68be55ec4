//! Fence endpoint: full traces along an arbitrary path.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
};
use seisgate_core::FenceRequest;

use crate::error::ApiResult;
use crate::extract::{parse_body, parse_query, QueryParams};
use crate::pipeline::DataPipeline;
use crate::response::multipart_response;

#[cfg(feature = "openapi")]
use crate::error::ErrorResponse;

/// GET /fence - Traces along a list of coordinates
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/fence",
    tag = "Fence",
    params(("query" = String, Query, description = "URL-escaped FenceRequest")),
    responses(
        (status = 200, description = "Shape metadata part followed by one block of N x samples little-endian f32 values", content_type = "multipart/mixed"),
        (status = 400, description = "Request is invalid", body = ErrorResponse),
        (status = 500, description = "Engine failed to process the request", body = ErrorResponse),
    ),
))]
pub async fn fence_get(
    State(pipeline): State<Arc<DataPipeline>>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> ApiResult<Response> {
    let request: FenceRequest = parse_query(params)?;
    multipart_response(pipeline.run(request).await?)
}

/// POST /fence - Traces along a list of coordinates
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/fence",
    tag = "Fence",
    request_body = FenceRequest,
    responses(
        (status = 200, description = "Shape metadata part followed by one block of N x samples little-endian f32 values", content_type = "multipart/mixed"),
        (status = 400, description = "Request is invalid", body = ErrorResponse),
        (status = 500, description = "Engine failed to process the request", body = ErrorResponse),
    ),
))]
pub async fn fence_post(
    State(pipeline): State<Arc<DataPipeline>>,
    body: Bytes,
) -> ApiResult<Response> {
    let request: FenceRequest = parse_body(&body)?;
    multipart_response(pipeline.run(request).await?)
}
