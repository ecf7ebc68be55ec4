//! Metadata documents returned ahead of (or instead of) binary data.

use serde::{Deserialize, Serialize};

/// Sample format tag for every binary block: little-endian 32-bit float.
pub const SAMPLE_FORMAT: &str = "<f4";

/// One axis of the volume or of a slice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct AxisMetadata {
    pub annotation: String,
    pub max: f32,
    pub min: f32,
    pub samples: usize,
    pub stepsize: f32,
    pub unit: String,
}

/// Survey corners in the three supported coordinate systems.
///
/// Corners are ordered (0, 0), (max i, 0), (max i, max j), (0, max j).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct BoundingBox {
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Vec<f64>>))]
    pub cdp: Vec<[f64; 2]>,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Vec<f32>>))]
    pub ilxl: Vec<[f32; 2]>,
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Vec<f32>>))]
    pub ij: Vec<[f32; 2]>,
}

/// Dataset-level metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub axis: Vec<AxisMetadata>,
    pub bounding_box: BoundingBox,
    pub crs: String,
    pub input_file_name: String,
    pub import_time_stamp: String,
    pub format: String,
}

/// Metadata for a slice: `y` indexes rows and `x` columns of the data block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SliceMetadata {
    pub x: AxisMetadata,
    pub y: AxisMetadata,
    /// `[rows, columns]`.
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<usize>))]
    pub shape: [usize; 2],
    pub format: String,
    /// World coordinates outlining the slice.
    #[cfg_attr(feature = "openapi", schema(value_type = Vec<Vec<f64>>))]
    pub geospatial: Vec<[f64; 2]>,
}

/// Shape-only metadata used for fences and attribute maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct ShapeMetadata {
    pub shape: Vec<usize>,
    pub format: String,
}

impl ShapeMetadata {
    pub fn new(shape: Vec<usize>) -> Self {
        Self {
            shape,
            format: SAMPLE_FORMAT.to_string(),
        }
    }
}

/// Encode samples as a little-endian f32 block.
pub fn encode_samples(samples: &[f32]) -> Vec<u8> {
    let mut block = Vec::with_capacity(samples.len() * 4);
    for sample in samples {
        block.extend_from_slice(&sample.to_le_bytes());
    }
    block
}
