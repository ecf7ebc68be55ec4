//! Horizon attribute endpoints.
//!
//! Both endpoints answer with the shape metadata followed by one block per
//! requested attribute, in the order the attributes were requested.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{rejection::QueryRejection, Query, State},
    response::Response,
};
use seisgate_core::{AttributeAlongSurfaceRequest, AttributeBetweenSurfacesRequest};

use crate::error::ApiResult;
use crate::extract::{parse_body, parse_query, QueryParams};
use crate::pipeline::DataPipeline;
use crate::response::multipart_response;

#[cfg(feature = "openapi")]
use crate::error::ErrorResponse;

/// GET /attributes/surface/along - Attributes in a window around a surface
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/attributes/surface/along",
    tag = "Attributes",
    params(("query" = String, Query, description = "URL-escaped AttributeAlongSurfaceRequest")),
    responses(
        (status = 200, description = "Shape metadata part followed by one block per attribute", content_type = "multipart/mixed"),
        (status = 400, description = "Request is invalid", body = ErrorResponse),
        (status = 500, description = "Engine failed to process the request", body = ErrorResponse),
    ),
))]
pub async fn along_surface_get(
    State(pipeline): State<Arc<DataPipeline>>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> ApiResult<Response> {
    let request: AttributeAlongSurfaceRequest = parse_query(params)?;
    multipart_response(pipeline.run(request).await?)
}

/// POST /attributes/surface/along - Attributes in a window around a surface
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/attributes/surface/along",
    tag = "Attributes",
    request_body = AttributeAlongSurfaceRequest,
    responses(
        (status = 200, description = "Shape metadata part followed by one block per attribute", content_type = "multipart/mixed"),
        (status = 400, description = "Request is invalid", body = ErrorResponse),
        (status = 500, description = "Engine failed to process the request", body = ErrorResponse),
    ),
))]
pub async fn along_surface_post(
    State(pipeline): State<Arc<DataPipeline>>,
    body: Bytes,
) -> ApiResult<Response> {
    let request: AttributeAlongSurfaceRequest = parse_body(&body)?;
    multipart_response(pipeline.run(request).await?)
}

/// GET /attributes/surface/between - Attributes between two surfaces
#[cfg_attr(feature = "openapi", utoipa::path(
    get,
    path = "/attributes/surface/between",
    tag = "Attributes",
    params(("query" = String, Query, description = "URL-escaped AttributeBetweenSurfacesRequest")),
    responses(
        (status = 200, description = "Shape metadata part followed by one block per attribute", content_type = "multipart/mixed"),
        (status = 400, description = "Request is invalid", body = ErrorResponse),
        (status = 500, description = "Engine failed to process the request", body = ErrorResponse),
    ),
))]
pub async fn between_surfaces_get(
    State(pipeline): State<Arc<DataPipeline>>,
    params: Result<Query<QueryParams>, QueryRejection>,
) -> ApiResult<Response> {
    let request: AttributeBetweenSurfacesRequest = parse_query(params)?;
    multipart_response(pipeline.run(request).await?)
}

/// POST /attributes/surface/between - Attributes between two surfaces
#[cfg_attr(feature = "openapi", utoipa::path(
    post,
    path = "/attributes/surface/between",
    tag = "Attributes",
    request_body = AttributeBetweenSurfacesRequest,
    responses(
        (status = 200, description = "Shape metadata part followed by one block per attribute", content_type = "multipart/mixed"),
        (status = 400, description = "Request is invalid", body = ErrorResponse),
        (status = 500, description = "Engine failed to process the request", body = ErrorResponse),
    ),
))]
pub async fn between_surfaces_post(
    State(pipeline): State<Arc<DataPipeline>>,
    body: Bytes,
) -> ApiResult<Response> {
    let request: AttributeBetweenSurfacesRequest = parse_body(&body)?;
    multipart_response(pipeline.run(request).await?)
}
