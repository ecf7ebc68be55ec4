//! Wire requests and their normalized form.
//!
//! Callers send one of five JSON documents. Each is decoded into its wire
//! struct, structurally validated, canonicalized and split into a
//! [`ConnectionDescriptor`] (dataset + credential) and a credential-free
//! [`RequestVariant`] that drives fingerprinting and execution.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::credentials::{ConnectionDescriptor, CredentialResolver};
use crate::error::{CoreResult, GatewayError};
use crate::geometry::{RegularSurface, SliceBound};
use crate::tokens::Interpolation;

// ============================================================================
// WIRE REQUESTS
// ============================================================================

/// Request for dataset-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct MetadataRequest {
    /// Dataset locator.
    pub vds: String,
    /// Shared-access token for the dataset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sas: Option<String>,
}

/// Request for a 2D slice through the volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct SliceRequest {
    pub vds: String,
    /// One of i, j, k, inline, crossline, depth, time, sample.
    pub direction: String,
    /// Line to slice, as index or annotation depending on `direction`.
    pub lineno: i32,
    /// Optional restrictions of the remaining axes.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bounds: Vec<SliceBound>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sas: Option<String>,
}

/// Request for traces along an arbitrary path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct FenceRequest {
    pub vds: String,
    /// One of ij, ilxl, cdp.
    pub coordinate_system: String,
    /// `[x y]` pairs in `coordinate_system`.
    pub coordinates: Vec<Vec<f32>>,
    #[serde(default)]
    pub interpolation: String,
    /// Value for coordinates outside the survey. Without it such
    /// coordinates are an error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill_value: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sas: Option<String>,
}

/// Request for attributes in a window hung around one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AttributeAlongSurfaceRequest {
    pub vds: String,
    pub surface: RegularSurface,
    pub above: f32,
    pub below: f32,
    #[serde(default)]
    pub stepsize: f32,
    pub attributes: Vec<String>,
    #[serde(default)]
    pub interpolation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sas: Option<String>,
}

/// Request for attributes in the window between two surfaces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct AttributeBetweenSurfacesRequest {
    pub vds: String,
    pub primary_surface: RegularSurface,
    pub secondary_surface: RegularSurface,
    #[serde(default)]
    pub stepsize: f32,
    pub attributes: Vec<String>,
    #[serde(default)]
    pub interpolation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sas: Option<String>,
}

// ============================================================================
// NORMALIZED VARIANTS
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SliceQuery {
    pub direction: String,
    pub lineno: i32,
    pub bounds: Vec<SliceBound>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FenceQuery {
    pub coordinate_system: String,
    pub coordinates: Vec<Vec<f32>>,
    pub interpolation: String,
    pub fill_value: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlongSurfaceQuery {
    pub surface: RegularSurface,
    pub above: f32,
    pub below: f32,
    pub stepsize: f32,
    pub attributes: Vec<String>,
    pub interpolation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BetweenSurfacesQuery {
    pub primary_surface: RegularSurface,
    pub secondary_surface: RegularSurface,
    pub stepsize: f32,
    pub attributes: Vec<String>,
    pub interpolation: String,
}

/// Result-affecting part of a request. Holds no credential material.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum RequestVariant {
    Metadata,
    Slice(SliceQuery),
    Fence(FenceQuery),
    AttributeAlongSurface(AlongSurfaceQuery),
    AttributeBetweenSurfaces(BetweenSurfacesQuery),
}

impl RequestVariant {
    /// Short name for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            RequestVariant::Metadata => "metadata",
            RequestVariant::Slice(_) => "slice",
            RequestVariant::Fence(_) => "fence",
            RequestVariant::AttributeAlongSurface(_) => "attributes_along_surface",
            RequestVariant::AttributeBetweenSurfaces(_) => "attributes_between_surfaces",
        }
    }

    /// Whether the reply carries binary data blocks after the metadata.
    pub fn has_data(&self) -> bool {
        !matches!(self, RequestVariant::Metadata)
    }
}

/// A validated request: where to read, as whom, and what to compute.
#[derive(Debug, Clone)]
pub struct NormalizedRequest {
    pub connection: ConnectionDescriptor,
    pub variant: RequestVariant,
}

impl NormalizedRequest {
    pub fn dataset(&self) -> &str {
        self.connection.dataset()
    }

    /// Credential-free description for logging.
    pub fn describe(&self) -> String {
        #[derive(Serialize)]
        struct Description<'a> {
            vds: &'a str,
            #[serde(flatten)]
            variant: &'a RequestVariant,
        }

        serde_json::to_string(&Description {
            vds: self.dataset(),
            variant: &self.variant,
        })
        .unwrap_or_else(|_| format!("{} {}", self.variant.kind(), self.dataset()))
    }
}

// ============================================================================
// NORMALIZATION
// ============================================================================

/// Wire request that can be turned into a [`NormalizedRequest`].
pub trait WireRequest: DeserializeOwned + Send + 'static {
    /// Dataset locator as sent.
    fn dataset(&self) -> &str;

    /// Caller-supplied token, if any.
    fn token(&self) -> Option<&str>;

    /// Structural checks that do not depend on the dataset.
    fn validate(&self) -> CoreResult<()> {
        Ok(())
    }

    /// Canonicalized, credential-free variant.
    fn into_variant(self) -> RequestVariant;
}

/// Decode a JSON document into a wire request.
pub fn parse_json<R: WireRequest>(raw: &[u8]) -> CoreResult<R> {
    serde_json::from_slice(raw).map_err(|e| GatewayError::invalid_argument(e.to_string()))
}

/// Validate, canonicalize and resolve credentials for a decoded request.
pub fn normalize<R: WireRequest>(request: R, resolver: &CredentialResolver) -> CoreResult<NormalizedRequest> {
    let dataset = canonical_dataset(request.dataset())?;
    request.validate()?;
    let connection = resolver.resolve(&dataset, request.token())?;
    Ok(NormalizedRequest {
        connection,
        variant: request.into_variant(),
    })
}

fn canonical_dataset(dataset: &str) -> CoreResult<String> {
    let dataset = dataset.trim().trim_end_matches('/');
    if dataset.is_empty() {
        return Err(GatewayError::invalid_argument("Field 'vds' must not be empty"));
    }
    if dataset.contains('?') {
        // The query string of a signed URL is itself a credential, so it is
        // not echoed back.
        return Err(GatewayError::invalid_argument(
            "Signed urls are not supported, pass the token in 'sas'",
        ));
    }
    Ok(dataset.to_string())
}

fn canonical_token(token: &str) -> String {
    token.trim().to_lowercase()
}

fn canonical_interpolation(token: &str) -> String {
    let token = canonical_token(token);
    if token.is_empty() {
        Interpolation::DEFAULT_TOKEN.to_string()
    } else {
        token
    }
}

fn require_token(field: &str, value: &str) -> CoreResult<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::invalid_argument(format!(
            "Field '{}' must not be empty",
            field
        )));
    }
    Ok(())
}

impl WireRequest for MetadataRequest {
    fn dataset(&self) -> &str {
        &self.vds
    }

    fn token(&self) -> Option<&str> {
        self.sas.as_deref()
    }

    fn into_variant(self) -> RequestVariant {
        RequestVariant::Metadata
    }
}

impl WireRequest for SliceRequest {
    fn dataset(&self) -> &str {
        &self.vds
    }

    fn token(&self) -> Option<&str> {
        self.sas.as_deref()
    }

    fn validate(&self) -> CoreResult<()> {
        require_token("direction", &self.direction)?;
        for bound in &self.bounds {
            require_token("bounds.direction", &bound.direction)?;
        }
        Ok(())
    }

    fn into_variant(self) -> RequestVariant {
        RequestVariant::Slice(SliceQuery {
            direction: canonical_token(&self.direction),
            lineno: self.lineno,
            bounds: self
                .bounds
                .into_iter()
                .map(|bound| SliceBound {
                    direction: canonical_token(&bound.direction),
                    ..bound
                })
                .collect(),
        })
    }
}

impl WireRequest for FenceRequest {
    fn dataset(&self) -> &str {
        &self.vds
    }

    fn token(&self) -> Option<&str> {
        self.sas.as_deref()
    }

    fn validate(&self) -> CoreResult<()> {
        require_token("coordinateSystem", &self.coordinate_system)?;
        if self.coordinates.is_empty() {
            return Err(GatewayError::invalid_argument(
                "Field 'coordinates' must contain at least one coordinate",
            ));
        }
        Ok(())
    }

    fn into_variant(self) -> RequestVariant {
        RequestVariant::Fence(FenceQuery {
            coordinate_system: canonical_token(&self.coordinate_system),
            coordinates: self.coordinates,
            interpolation: canonical_interpolation(&self.interpolation),
            fill_value: self.fill_value,
        })
    }
}

impl WireRequest for AttributeAlongSurfaceRequest {
    fn dataset(&self) -> &str {
        &self.vds
    }

    fn token(&self) -> Option<&str> {
        self.sas.as_deref()
    }

    fn validate(&self) -> CoreResult<()> {
        self.surface.validate()
    }

    fn into_variant(self) -> RequestVariant {
        RequestVariant::AttributeAlongSurface(AlongSurfaceQuery {
            surface: self.surface,
            above: self.above,
            below: self.below,
            stepsize: self.stepsize,
            attributes: self.attributes.iter().map(|a| canonical_token(a)).collect(),
            interpolation: canonical_interpolation(&self.interpolation),
        })
    }
}

impl WireRequest for AttributeBetweenSurfacesRequest {
    fn dataset(&self) -> &str {
        &self.vds
    }

    fn token(&self) -> Option<&str> {
        self.sas.as_deref()
    }

    fn validate(&self) -> CoreResult<()> {
        self.primary_surface.validate()?;
        self.secondary_surface.validate()
    }

    fn into_variant(self) -> RequestVariant {
        RequestVariant::AttributeBetweenSurfaces(BetweenSurfacesQuery {
            primary_surface: self.primary_surface,
            secondary_surface: self.secondary_surface,
            stepsize: self.stepsize,
            attributes: self.attributes.iter().map(|a| canonical_token(a)).collect(),
            interpolation: canonical_interpolation(&self.interpolation),
        })
    }
}
