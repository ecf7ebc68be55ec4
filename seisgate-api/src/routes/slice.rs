//! Slice endpoint.
//!
//! A slice is the 2D plane through the volume at one line of one axis,
//! optionally restricted along the remaining two axes by `bounds`.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
};
use seisgate_core::SliceRequest;

use crate::error::ApiResult;
use crate::extract::{parse_body, parse_query, QueryParams};
use crate::pipeline::DataPipeline;
use crate::response::multipart_response;

#[cfg(feature = "openapi")]
use crate::error::ErrorResponse;

/// GET /slice - Fetch a slice
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/slice",
    tag = "Slice",
    params(("query" = String, Query, description = "URL-escaped SliceRequest")),
    responses(
        (status = 200, description = "Slice metadata part followed by one block of little-endian f32 samples", content_type = "multipart/mixed"),
        (status = 400, description = "Request is invalid", body = ErrorResponse),
        (status = 500, description = "Engine failed to process the request", body = ErrorResponse),
    ),
))]
pub async fn slice_get(
    State(pipeline): State<Arc<DataPipeline>>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> ApiResult<Response> {
    let request: SliceRequest = parse_query(params)?;
    multipart_response(pipeline.run(request).await?)
}

/// POST /slice - Fetch a slice
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/slice",
    tag = "Slice",
    request_body = SliceRequest,
    responses(
        (status = 200, description = "Slice metadata part followed by one block of little-endian f32 samples", content_type = "multipart/mixed"),
        (status = 400, description = "Request is invalid", body = ErrorResponse),
        (status = 500, description = "Engine failed to process the request", body = ErrorResponse),
    ),
))]
pub async fn slice_post(
    State(pipeline): State<Arc<DataPipeline>>,
    body: Bytes,
) -> ApiResult<Response> {
    let request: SliceRequest = parse_body(&body)?;
    multipart_response(pipeline.run(request).await?)
}
