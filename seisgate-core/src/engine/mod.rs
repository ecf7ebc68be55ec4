//! Storage engine contract.
//!
//! The gateway never decodes datasets itself. It derives a [`Connection`]
//! per request from a [`ConnectionDescriptor`], asks it whether the caller
//! may read, and opens a [`DatasetHandle`] to compute products. Handles are
//! released by dropping them.

pub mod memory;
pub mod statistics;
pub mod volume;

use std::sync::Arc;

use async_trait::async_trait;

use crate::credentials::ConnectionDescriptor;
use crate::error::CoreResult;
use crate::geometry::{RegularSurface, VerticalWindow};
use crate::metadata::{Metadata, ShapeMetadata, SliceMetadata};
use crate::tokens::{Attribute, CoordinateSystem, Direction, Interpolation};

pub use memory::MemoryEngine;
pub use volume::{AxisSpec, MemoryVolume};

/// Parsed slice bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AxisBound {
    pub direction: Direction,
    pub lower: f32,
    pub upper: f32,
}

/// Builds per-request connections. Must not touch the dataset.
pub trait ConnectionMaker: Send + Sync {
    fn connect(&self, descriptor: &ConnectionDescriptor) -> CoreResult<Arc<dyn Connection>>;
}

/// Capability to reach one dataset with one credential.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Live check that the credential may currently read the dataset.
    async fn is_authorized_to_read(&self) -> bool;

    /// Open the dataset. Blocking; fails with an internal error when the
    /// dataset is unreachable or the credential is rejected.
    fn open(&self) -> CoreResult<Box<dyn DatasetHandle>>;
}

/// An open dataset. All operations are blocking.
pub trait DatasetHandle: Send {
    fn metadata(&self) -> CoreResult<Metadata>;

    fn slice_metadata(&self, direction: Direction, lineno: i32, bounds: &[AxisBound]) -> CoreResult<SliceMetadata>;

    fn slice(&self, direction: Direction, lineno: i32, bounds: &[AxisBound]) -> CoreResult<Vec<u8>>;

    fn fence_metadata(&self, coordinates: &[[f32; 2]]) -> CoreResult<ShapeMetadata>;

    fn fence(
        &self,
        coordinate_system: CoordinateSystem,
        coordinates: &[[f32; 2]],
        interpolation: Interpolation,
        fill_value: Option<f32>,
    ) -> CoreResult<Vec<u8>>;

    fn attribute_metadata(&self, surface: &RegularSurface) -> CoreResult<ShapeMetadata>;

    /// One block per attribute, in the order given.
    fn attributes_along_surface(
        &self,
        surface: &RegularSurface,
        window: VerticalWindow,
        attributes: &[Attribute],
        interpolation: Interpolation,
    ) -> CoreResult<Vec<Vec<u8>>>;

    /// One block per attribute, in the order given.
    fn attributes_between_surfaces(
        &self,
        primary: &RegularSurface,
        secondary: &RegularSurface,
        stepsize: f32,
        attributes: &[Attribute],
        interpolation: Interpolation,
    ) -> CoreResult<Vec<Vec<u8>>>;
}
