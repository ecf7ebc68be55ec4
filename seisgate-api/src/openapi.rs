//! OpenAPI Specification for the seisgate API
//!
//! The document is generated with utoipa from the request types and the
//! route annotations.

use utoipa::OpenApi;

use seisgate_core::{
    AttributeAlongSurfaceRequest, AttributeBetweenSurfacesRequest, AxisMetadata, BoundingBox,
    FenceRequest, Metadata, MetadataRequest, RegularSurface, ShapeMetadata, SliceBound,
    SliceMetadata, SliceRequest,
};

use crate::error::{ErrorCode, ErrorResponse};
use crate::routes::health::{CacheHealth, HealthDetails, HealthResponse, HealthStatus};
use crate::routes::{attributes, fence, health, metadata, slice};
use crate::telemetry::metrics;

/// OpenAPI document for the seisgate API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "seisgate API",
        description = "HTTP gateway for slices, fences and horizon attributes of seismic volumes",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local Development")
    ),
    tags(
        (name = "Metadata", description = "Dataset axes, bounding boxes and provenance"),
        (name = "Slice", description = "2D planes through the volume"),
        (name = "Fence", description = "Traces along arbitrary paths"),
        (name = "Attributes", description = "Horizon attributes around and between surfaces"),
        (name = "Health", description = "Liveness and readiness"),
        (name = "Observability", description = "Prometheus metrics")
    ),
    paths(
        metadata::metadata_get,
        metadata::metadata_post,
        slice::slice_get,
        slice::slice_post,
        fence::fence_get,
        fence::fence_post,
        attributes::along_surface_get,
        attributes::along_surface_post,
        attributes::between_surfaces_get,
        attributes::between_surfaces_post,
        health::ping,
        health::liveness,
        health::readiness,
        metrics::metrics_handler,
    ),
    components(schemas(
        MetadataRequest,
        SliceRequest,
        FenceRequest,
        AttributeAlongSurfaceRequest,
        AttributeBetweenSurfacesRequest,
        RegularSurface,
        SliceBound,
        Metadata,
        AxisMetadata,
        BoundingBox,
        SliceMetadata,
        ShapeMetadata,
        ErrorCode,
        ErrorResponse,
        HealthResponse,
        HealthStatus,
        HealthDetails,
        CacheHealth,
    ))
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Pretty-printed JSON document.
    pub fn to_json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_endpoint_is_documented() -> Result<(), serde_json::Error> {
        let doc = serde_json::to_value(ApiDoc::openapi())?;
        for path in [
            "/metadata",
            "/slice",
            "/fence",
            "/attributes/surface/along",
            "/attributes/surface/between",
        ] {
            let item = &doc["paths"][path];
            assert!(item.get("get").is_some(), "GET {} missing", path);
            assert!(item.get("post").is_some(), "POST {} missing", path);
        }
        assert!(doc["components"]["schemas"].get("SliceRequest").is_some());
        Ok(())
    }
}
