//! Per-variant execution against an open dataset handle.
//!
//! Every token and window parameter is validated before the first engine
//! call, so a rejected request never leaves partial output behind.

use crate::engine::{AxisBound, DatasetHandle};
use crate::error::CoreResult;
use crate::geometry::{coordinate_pairs, validate_stepsize, VerticalWindow};
use crate::request::{AlongSurfaceQuery, BetweenSurfacesQuery, FenceQuery, RequestVariant, SliceQuery};
use crate::tokens::{Attribute, CoordinateSystem, Direction, Interpolation};

/// Metadata document plus zero or more binary blocks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutput {
    pub metadata: Vec<u8>,
    pub data: Vec<Vec<u8>>,
}

impl RequestVariant {
    /// Compute this request's product from `handle`.
    pub fn execute(&self, handle: &dyn DatasetHandle) -> CoreResult<ExecutionOutput> {
        match self {
            RequestVariant::Metadata => execute_metadata(handle),
            RequestVariant::Slice(query) => execute_slice(query, handle),
            RequestVariant::Fence(query) => execute_fence(query, handle),
            RequestVariant::AttributeAlongSurface(query) => execute_along_surface(query, handle),
            RequestVariant::AttributeBetweenSurfaces(query) => {
                execute_between_surfaces(query, handle)
            }
        }
    }
}

fn execute_metadata(handle: &dyn DatasetHandle) -> CoreResult<ExecutionOutput> {
    let metadata = handle.metadata()?;
    Ok(ExecutionOutput {
        metadata: serde_json::to_vec(&metadata)?,
        data: Vec::new(),
    })
}

fn execute_slice(query: &SliceQuery, handle: &dyn DatasetHandle) -> CoreResult<ExecutionOutput> {
    let direction = Direction::parse(&query.direction)?;
    let bounds = query
        .bounds
        .iter()
        .map(|bound| {
            Ok(AxisBound {
                direction: Direction::parse(&bound.direction)?,
                lower: bound.lower,
                upper: bound.upper,
            })
        })
        .collect::<CoreResult<Vec<_>>>()?;

    let metadata = handle.slice_metadata(direction, query.lineno, &bounds)?;
    let data = handle.slice(direction, query.lineno, &bounds)?;
    Ok(ExecutionOutput {
        metadata: serde_json::to_vec(&metadata)?,
        data: vec![data],
    })
}

fn execute_fence(query: &FenceQuery, handle: &dyn DatasetHandle) -> CoreResult<ExecutionOutput> {
    let coordinate_system = CoordinateSystem::parse(&query.coordinate_system)?;
    let coordinates = coordinate_pairs(&query.coordinates)?;
    let interpolation = Interpolation::parse(&query.interpolation)?;

    let metadata = handle.fence_metadata(&coordinates)?;
    let data = handle.fence(coordinate_system, &coordinates, interpolation, query.fill_value)?;
    Ok(ExecutionOutput {
        metadata: serde_json::to_vec(&metadata)?,
        data: vec![data],
    })
}

fn execute_along_surface(query: &AlongSurfaceQuery, handle: &dyn DatasetHandle) -> CoreResult<ExecutionOutput> {
    let window = VerticalWindow::new(query.above, query.below, query.stepsize)?;
    let interpolation = Interpolation::parse(&query.interpolation)?;
    let attributes = Attribute::parse_all(&query.attributes)?;

    let metadata = handle.attribute_metadata(&query.surface)?;
    let data = handle.attributes_along_surface(&query.surface, window, &attributes, interpolation)?;
    Ok(ExecutionOutput {
        metadata: serde_json::to_vec(&metadata)?,
        data,
    })
}

fn execute_between_surfaces(
    query: &BetweenSurfacesQuery,
    handle: &dyn DatasetHandle,
) -> CoreResult<ExecutionOutput> {
    validate_stepsize(query.stepsize)?;
    let interpolation = Interpolation::parse(&query.interpolation)?;
    let attributes = Attribute::parse_all(&query.attributes)?;

    let metadata = handle.attribute_metadata(&query.primary_surface)?;
    let data = handle.attributes_between_surfaces(
        &query.primary_surface,
        &query.secondary_surface,
        query.stepsize,
        &attributes,
        interpolation,
    )?;
    Ok(ExecutionOutput {
        metadata: serde_json::to_vec(&metadata)?,
        data,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::{ConnectionDescriptor, Credential};
    use crate::engine::{ConnectionMaker, MemoryEngine, MemoryVolume};
    use crate::geometry::RegularSurface;

    fn handle() -> CoreResult<Box<dyn DatasetHandle>> {
        let engine = MemoryEngine::new();
        engine.register("memory://cube", MemoryVolume::well_known());
        let credential = Credential::new("t".to_string());
        engine.grant("memory://cube", &credential);
        engine
            .connect(&ConnectionDescriptor::new("memory://cube", credential))?
            .open()
    }

    fn surface() -> RegularSurface {
        RegularSurface {
            values: vec![vec![8.0, 8.0]; 3],
            xori: 2.0,
            yori: 0.0,
            xinc: 52f32.sqrt(),
            yinc: 13f32.sqrt(),
            rotation: 4f32.atan2(6.0).to_degrees(),
            fill_value: -999.25,
        }
    }

    #[test]
    fn test_metadata_has_no_blocks() -> CoreResult<()> {
        let output = RequestVariant::Metadata.execute(handle()?.as_ref())?;
        assert!(output.data.is_empty());
        let json: serde_json::Value = serde_json::from_slice(&output.metadata)?;
        assert_eq!(json["inputFileName"], "well_known.segy");
        Ok(())
    }

    #[test]
    fn test_slice_produces_one_block() -> CoreResult<()> {
        let variant = RequestVariant::Slice(SliceQuery {
            direction: "i".to_string(),
            lineno: 0,
            bounds: vec![],
        });
        let output = variant.execute(handle()?.as_ref())?;
        assert_eq!(output.data.len(), 1);
        assert_eq!(output.data[0].len(), 2 * 4 * 4);
        let json: serde_json::Value = serde_json::from_slice(&output.metadata)?;
        assert_eq!(json["format"], "<f4");
        assert_eq!(json["shape"], serde_json::json!([2, 4]));
        Ok(())
    }

    #[test]
    fn test_fence_rejects_bad_tuple() -> CoreResult<()> {
        let variant = RequestVariant::Fence(FenceQuery {
            coordinate_system: "ilxl".to_string(),
            coordinates: vec![vec![1.0, 10.0], vec![3.0, 11.0], vec![2.0, 10.0, 3.0, 4.0]],
            interpolation: "nearest".to_string(),
            fill_value: None,
        });
        let err = variant.execute(handle()?.as_ref()).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.message().contains("position 2"));
        Ok(())
    }

    #[test]
    fn test_along_surface_window_is_validated() -> CoreResult<()> {
        let variant = RequestVariant::AttributeAlongSurface(AlongSurfaceQuery {
            surface: surface(),
            above: -1.0,
            below: 0.0,
            stepsize: 0.0,
            attributes: vec!["min".to_string()],
            interpolation: "nearest".to_string(),
        });
        let err = variant.execute(handle()?.as_ref()).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.message().starts_with("'above' out of range"));
        Ok(())
    }

    #[test]
    fn test_between_surfaces_block_per_attribute() -> CoreResult<()> {
        let mut secondary = surface();
        secondary.values = vec![vec![12.0, 12.0]; 3];
        let variant = RequestVariant::AttributeBetweenSurfaces(BetweenSurfacesQuery {
            primary_surface: surface(),
            secondary_surface: secondary,
            stepsize: 0.0,
            attributes: vec!["max".to_string(), "min".to_string()],
            interpolation: "linear".to_string(),
        });
        let output = variant.execute(handle()?.as_ref())?;
        assert_eq!(output.data.len(), 2);
        assert!(output.data.iter().all(|block| block.len() == 24));
        let json: serde_json::Value = serde_json::from_slice(&output.metadata)?;
        assert_eq!(json["shape"], serde_json::json!([3, 2]));
        Ok(())
    }
}
