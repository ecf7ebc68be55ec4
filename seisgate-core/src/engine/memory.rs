//! In-memory implementation of the engine contract.
//!
//! Datasets are registered by locator. Read access is granted per
//! credential; only the SHA-256 of each credential is kept, and grants can
//! be revoked at any time.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use crate::credentials::{ConnectionDescriptor, Credential};
use crate::error::{CoreResult, GatewayError};
use crate::fingerprint::compute_content_hash;
use crate::geometry::{RegularSurface, VerticalWindow};
use crate::metadata::{encode_samples, Metadata, ShapeMetadata, SliceMetadata};
use crate::tokens::{Attribute, CoordinateSystem, Direction, Interpolation};

use super::volume::MemoryVolume;
use super::{AxisBound, Connection, ConnectionMaker, DatasetHandle};

type CredentialDigest = [u8; 32];

struct MemoryDataset {
    volume: MemoryVolume,
    readers: RwLock<HashSet<CredentialDigest>>,
}

#[derive(Default)]
struct EngineState {
    datasets: RwLock<HashMap<String, Arc<MemoryDataset>>>,
    opened: AtomicUsize,
    live: AtomicUsize,
}

impl EngineState {
    fn dataset(&self, locator: &str) -> Option<Arc<MemoryDataset>> {
        self.datasets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(locator)
            .cloned()
    }
}

/// Engine serving [`MemoryVolume`]s.
#[derive(Clone, Default)]
pub struct MemoryEngine {
    state: Arc<EngineState>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the volume served at `locator`.
    pub fn register(&self, locator: impl Into<String>, volume: MemoryVolume) {
        let dataset = Arc::new(MemoryDataset {
            volume,
            readers: RwLock::new(HashSet::new()),
        });
        self.state
            .datasets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(locator.into(), dataset);
    }

    /// Grant `credential` read access to `locator`. Returns false when no
    /// such dataset is registered.
    pub fn grant(&self, locator: &str, credential: &Credential) -> bool {
        match self.state.dataset(locator) {
            Some(dataset) => {
                dataset
                    .readers
                    .write()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(digest(credential));
                true
            }
            None => false,
        }
    }

    /// Withdraw read access. Takes effect for every later request.
    pub fn revoke(&self, locator: &str, credential: &Credential) {
        if let Some(dataset) = self.state.dataset(locator) {
            dataset
                .readers
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .remove(&digest(credential));
        }
    }

    /// Number of handles opened so far.
    pub fn opened_handles(&self) -> usize {
        self.state.opened.load(Ordering::SeqCst)
    }

    /// Number of handles currently open.
    pub fn live_handles(&self) -> usize {
        self.state.live.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for MemoryEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEngine")
            .field("opened", &self.opened_handles())
            .field("live", &self.live_handles())
            .finish()
    }
}

fn digest(credential: &Credential) -> CredentialDigest {
    compute_content_hash(credential.expose().as_bytes())
}

impl ConnectionMaker for MemoryEngine {
    fn connect(&self, descriptor: &ConnectionDescriptor) -> CoreResult<Arc<dyn Connection>> {
        Ok(Arc::new(MemoryConnection {
            state: Arc::clone(&self.state),
            locator: descriptor.dataset().to_string(),
            credential: digest(descriptor.credential()),
        }))
    }
}

// ============================================================================
// CONNECTION
// ============================================================================

struct MemoryConnection {
    state: Arc<EngineState>,
    locator: String,
    credential: CredentialDigest,
}

impl MemoryConnection {
    fn authorized(&self, dataset: &MemoryDataset) -> bool {
        dataset
            .readers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&self.credential)
    }
}

#[async_trait]
impl Connection for MemoryConnection {
    async fn is_authorized_to_read(&self) -> bool {
        self.state
            .dataset(&self.locator)
            .is_some_and(|dataset| self.authorized(&dataset))
    }

    fn open(&self) -> CoreResult<Box<dyn DatasetHandle>> {
        let dataset = self.state.dataset(&self.locator).ok_or_else(|| {
            GatewayError::internal(format!(
                "Could not open VDS: dataset does not exist: {}",
                self.locator
            ))
        })?;
        if !self.authorized(&dataset) {
            return Err(GatewayError::internal(
                "Could not open VDS: server failed to authenticate the request",
            ));
        }

        self.state.opened.fetch_add(1, Ordering::SeqCst);
        self.state.live.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryHandle {
            dataset,
            state: Arc::clone(&self.state),
        }))
    }
}

// ============================================================================
// HANDLE
// ============================================================================

struct MemoryHandle {
    dataset: Arc<MemoryDataset>,
    state: Arc<EngineState>,
}

impl MemoryHandle {
    fn volume(&self) -> &MemoryVolume {
        &self.dataset.volume
    }
}

impl Drop for MemoryHandle {
    fn drop(&mut self) {
        self.state.live.fetch_sub(1, Ordering::SeqCst);
    }
}

impl DatasetHandle for MemoryHandle {
    fn metadata(&self) -> CoreResult<Metadata> {
        Ok(self.volume().metadata())
    }

    fn slice_metadata(&self, direction: Direction, lineno: i32, bounds: &[AxisBound]) -> CoreResult<SliceMetadata> {
        self.volume()
            .slice(direction, lineno, bounds)
            .map(|(metadata, _)| metadata)
    }

    fn slice(&self, direction: Direction, lineno: i32, bounds: &[AxisBound]) -> CoreResult<Vec<u8>> {
        self.volume()
            .slice(direction, lineno, bounds)
            .map(|(_, data)| encode_samples(&data))
    }

    fn fence_metadata(&self, coordinates: &[[f32; 2]]) -> CoreResult<ShapeMetadata> {
        Ok(ShapeMetadata::new(vec![
            coordinates.len(),
            self.volume().trace_length(),
        ]))
    }

    fn fence(
        &self,
        coordinate_system: CoordinateSystem,
        coordinates: &[[f32; 2]],
        interpolation: Interpolation,
        fill_value: Option<f32>,
    ) -> CoreResult<Vec<u8>> {
        self.volume()
            .fence(coordinate_system, coordinates, interpolation, fill_value)
            .map(|data| encode_samples(&data))
    }

    fn attribute_metadata(&self, surface: &RegularSurface) -> CoreResult<ShapeMetadata> {
        Ok(ShapeMetadata::new(vec![surface.nrows(), surface.ncols()]))
    }

    fn attributes_along_surface(
        &self,
        surface: &RegularSurface,
        window: VerticalWindow,
        attributes: &[Attribute],
        interpolation: Interpolation,
    ) -> CoreResult<Vec<Vec<u8>>> {
        let maps = self
            .volume()
            .attributes_along_surface(surface, window, attributes, interpolation)?;
        Ok(maps.iter().map(|map| encode_samples(map)).collect())
    }

    fn attributes_between_surfaces(
        &self,
        primary: &RegularSurface,
        secondary: &RegularSurface,
        stepsize: f32,
        attributes: &[Attribute],
        interpolation: Interpolation,
    ) -> CoreResult<Vec<Vec<u8>>> {
        let maps = self.volume().attributes_between_surfaces(
            primary,
            secondary,
            stepsize,
            attributes,
            interpolation,
        )?;
        Ok(maps.iter().map(|map| encode_samples(map)).collect())
    }
}
