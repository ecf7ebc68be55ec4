//! Dataset metadata endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
};
use seisgate_core::MetadataRequest;

use crate::error::ApiResult;
use crate::extract::{parse_body, parse_query, QueryParams};
use crate::pipeline::DataPipeline;
use crate::response::metadata_response;

#[cfg(feature = "openapi")]
use crate::error::ErrorResponse;

/// GET /metadata - Axes, bounding boxes and provenance of a dataset
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/metadata",
    tag = "Metadata",
    params(("query" = String, Query, description = "URL-escaped MetadataRequest")),
    responses(
        (status = 200, description = "Dataset metadata", body = seisgate_core::Metadata),
        (status = 400, description = "Request is invalid", body = ErrorResponse),
        (status = 500, description = "Dataset could not be read", body = ErrorResponse),
    ),
))]
pub async fn metadata_get(
    State(pipeline): State<Arc<DataPipeline>>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> ApiResult<Response> {
    let request: MetadataRequest = parse_query(params)?;
    Ok(metadata_response(pipeline.run(request).await?))
}

/// POST /metadata - Axes, bounding boxes and provenance of a dataset
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/metadata",
    tag = "Metadata",
    request_body = MetadataRequest,
    responses(
        (status = 200, description = "Dataset metadata", body = seisgate_core::Metadata),
        (status = 400, description = "Request is invalid", body = ErrorResponse),
        (status = 500, description = "Dataset could not be read", body = ErrorResponse),
    ),
))]
pub async fn metadata_post(
    State(pipeline): State<Arc<DataPipeline>>,
    body: Bytes,
) -> ApiResult<Response> {
    let request: MetadataRequest = parse_body(&body)?;
    Ok(metadata_response(pipeline.run(request).await?))
}
