//! SEISGATE Test Utilities
//!
//! Centralized test infrastructure for the seisgate workspace:
//! - A well-known in-memory engine and its credentials
//! - Request document fixtures
//! - Proptest generators for wire requests
//! - A recording cache backend
//! - Multipart response parsing and sample decoding

pub use seisgate_core::{
    CacheKey, Credential, CredentialResolver, MemoryEngine, MemoryVolume, RegularSurface,
    SliceBound, SliceRequest,
};
pub use seisgate_storage::{CacheBackend, CacheEntry, CacheStats, ComputeCache};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Storage prefix that every fixture dataset lives under.
pub const STORAGE_PREFIX: &str = "memory://survey";

/// Locator of [`MemoryVolume::well_known`] in [`well_known_engine`].
pub const DATASET: &str = "memory://survey/well_known";

/// Allow-listed locator with nothing registered behind it.
pub const MISSING_DATASET: &str = "memory://survey/does_not_exist";

/// Credential granted read access to [`DATASET`].
pub const READER_TOKEN: &str = "reader-secret-token-0001";

/// A second credential granted read access to [`DATASET`].
pub const SECOND_READER_TOKEN: &str = "reader-secret-token-0002";

/// Credential the engine has never heard of.
pub const STRANGER_TOKEN: &str = "stranger-secret-token-9999";

/// Fill value used by fixture surfaces.
pub const FILL_VALUE: f32 = -999.25;

/// Engine serving the well-known volume at [`DATASET`], readable with
/// [`READER_TOKEN`] and [`SECOND_READER_TOKEN`].
pub fn well_known_engine() -> MemoryEngine {
    let engine = MemoryEngine::new();
    engine.register(DATASET, MemoryVolume::well_known());
    engine.grant(DATASET, &Credential::new(READER_TOKEN.to_string()));
    engine.grant(DATASET, &Credential::new(SECOND_READER_TOKEN.to_string()));
    engine
}

/// Resolver that allows [`STORAGE_PREFIX`] without default credentials.
pub fn resolver() -> CredentialResolver {
    CredentialResolver::new().allow(STORAGE_PREFIX)
}

// ============================================================================
// RECORDING CACHE
// ============================================================================

/// Cache backend that counts inserts on top of a real [`ComputeCache`].
#[derive(Debug)]
pub struct RecordingCache {
    inner: ComputeCache,
    inserts: AtomicUsize,
}

impl RecordingCache {
    pub fn new(inner: ComputeCache) -> Self {
        Self {
            inner,
            inserts: AtomicUsize::new(0),
        }
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    pub fn inner(&self) -> &ComputeCache {
        &self.inner
    }
}

impl CacheBackend for RecordingCache {
    fn get(&self, key: &CacheKey) -> Option<Arc<CacheEntry>> {
        self.inner.get(key)
    }

    fn insert(&self, key: CacheKey, entry: Arc<CacheEntry>) {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(key, entry);
    }

    fn is_enabled(&self) -> bool {
        self.inner.is_enabled()
    }

    fn stats(&self) -> CacheStats {
        self.inner.stats()
    }
}

// ============================================================================
// TEST FIXTURES
// ============================================================================

pub mod fixtures {
    //! Request documents against the well-known volume.

    use super::*;
    use serde_json::{json, Value};

    /// Surface whose rows follow inlines and columns follow crosslines of
    /// the well-known volume, one node per trace.
    pub fn aligned_surface(values: Vec<Vec<f32>>) -> RegularSurface {
        RegularSurface {
            values,
            xori: 2.0,
            yori: 0.0,
            xinc: 52f32.sqrt(),
            yinc: 13f32.sqrt(),
            rotation: 4f32.atan2(6.0).to_degrees(),
            fill_value: FILL_VALUE,
        }
    }

    /// JSON form of [`aligned_surface`].
    pub fn aligned_surface_json(values: Vec<Vec<f32>>) -> Value {
        serde_json::to_value(aligned_surface(values)).unwrap_or(Value::Null)
    }

    /// A 3x2 surface at `depth` on every node.
    pub fn flat_surface_json(depth: f32) -> Value {
        aligned_surface_json(vec![vec![depth; 2]; 3])
    }

    pub fn metadata_request(vds: &str, sas: &str) -> Value {
        json!({ "vds": vds, "sas": sas })
    }

    pub fn slice_request(vds: &str, direction: &str, lineno: i32, sas: &str) -> Value {
        json!({
            "vds": vds,
            "direction": direction,
            "lineno": lineno,
            "sas": sas,
        })
    }

    pub fn fence_request(vds: &str, coordinate_system: &str, coordinates: Value, sas: &str) -> Value {
        json!({
            "vds": vds,
            "coordinateSystem": coordinate_system,
            "coordinates": coordinates,
            "interpolation": "nearest",
            "sas": sas,
        })
    }

    pub fn along_surface_request(surface: Value, above: f32, below: f32, attributes: &[&str], sas: &str) -> Value {
        json!({
            "vds": DATASET,
            "surface": surface,
            "above": above,
            "below": below,
            "attributes": attributes,
            "sas": sas,
        })
    }

    pub fn between_surfaces_request(primary: Value, secondary: Value, attributes: &[&str], sas: &str) -> Value {
        json!({
            "vds": DATASET,
            "primarySurface": primary,
            "secondarySurface": secondary,
            "attributes": attributes,
            "sas": sas,
        })
    }
}

// ============================================================================
// PROPTEST GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for wire requests.

    use super::*;
    use proptest::prelude::*;

    /// Opaque credential strings, possibly with a leading `?`.
    pub fn arb_sas() -> impl Strategy<Value = String> {
        ("[?]?", "[a-zA-Z0-9=&%]{1,40}").prop_map(|(prefix, token)| format!("{prefix}{token}"))
    }

    /// Direction tokens in any letter case.
    pub fn arb_direction() -> impl Strategy<Value = String> {
        (
            prop::sample::select(vec![
                "i", "j", "k", "inline", "crossline", "depth", "time", "sample",
            ]),
            any::<bool>(),
        )
            .prop_map(|(token, upper)| {
                if upper {
                    token.to_uppercase()
                } else {
                    token.to_string()
                }
            })
    }

    /// Slice requests against [`DATASET`] with an arbitrary credential.
    pub fn arb_slice_request() -> impl Strategy<Value = SliceRequest> {
        (arb_direction(), -100i32..100, arb_sas()).prop_map(|(direction, lineno, sas)| SliceRequest {
            vds: DATASET.to_string(),
            direction,
            lineno,
            bounds: vec![],
            sas: Some(sas),
        })
    }

    /// Fence coordinates as `[x, y]` pairs.
    pub fn arb_fence_coordinates() -> impl Strategy<Value = Vec<Vec<f32>>> {
        prop::collection::vec((-10f32..10.0, -10f32..10.0).prop_map(|(x, y)| vec![x, y]), 1..16)
    }
}

// ============================================================================
// RESPONSE HELPERS
// ============================================================================

/// One part of a `multipart/mixed` body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub content_type: String,
    pub body: Vec<u8>,
}

/// Split a `multipart/mixed` body using the boundary from `content_type`.
pub fn split_multipart(content_type: &str, body: &[u8]) -> Result<Vec<Part>, String> {
    let boundary = content_type
        .split(';')
        .map(str::trim)
        .find_map(|param| param.strip_prefix("boundary="))
        .ok_or_else(|| format!("no boundary in '{content_type}'"))?;
    let opening = format!("--{boundary}\r\n");
    let delimiter = format!("\r\n--{boundary}");

    let mut rest = body
        .strip_prefix(opening.as_bytes())
        .ok_or("body does not start with the boundary")?;
    let mut parts = Vec::new();
    loop {
        let end = find(rest, delimiter.as_bytes()).ok_or("unterminated part")?;
        parts.push(parse_part(&rest[..end])?);
        rest = &rest[end + delimiter.len()..];
        if rest.starts_with(b"--") {
            return Ok(parts);
        }
        rest = rest.strip_prefix(b"\r\n").ok_or("malformed delimiter")?;
    }
}

fn parse_part(raw: &[u8]) -> Result<Part, String> {
    let split = find(raw, b"\r\n\r\n").ok_or("part has no header terminator")?;
    let headers = std::str::from_utf8(&raw[..split]).map_err(|e| e.to_string())?;
    let content_type = headers
        .split("\r\n")
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-type"))
        .map(|(_, value)| value.trim().to_string())
        .ok_or("part has no Content-Type")?;
    Ok(Part {
        content_type,
        body: raw[split + 4..].to_vec(),
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|window| window == needle)
}

/// Decode a little-endian float32 block.
pub fn decode_f32_le(block: &[u8]) -> Vec<f32> {
    block
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_split_multipart() -> Result<(), String> {
        let body = b"--b1\r\nContent-Type: application/json\r\n\r\n{}\r\n--b1\r\nContent-Type: application/octet-stream\r\n\r\n\x00\x01\r\n--b1--\r\n";
        let parts = split_multipart("multipart/mixed; boundary=b1", body)?;
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].content_type, "application/json");
        assert_eq!(parts[0].body, b"{}");
        assert_eq!(parts[1].body, vec![0u8, 1]);
        Ok(())
    }

    #[test]
    fn test_split_multipart_requires_boundary() {
        assert!(split_multipart("multipart/mixed", b"").is_err());
    }

    #[test]
    fn test_decode_f32_le() {
        let bytes: Vec<u8> = [1.5f32, -2.0].iter().flat_map(|v| v.to_le_bytes()).collect();
        assert_eq!(decode_f32_le(&bytes), vec![1.5, -2.0]);
    }

    #[test]
    fn test_well_known_engine_grants_readers() {
        let engine = well_known_engine();
        assert!(engine.grant(DATASET, &Credential::new(READER_TOKEN.to_string())));
        assert!(!engine.grant(MISSING_DATASET, &Credential::new(READER_TOKEN.to_string())));
    }

    #[test]
    fn test_recording_cache_counts_inserts() {
        let cache = RecordingCache::new(ComputeCache::with_megabytes(1));
        cache.insert(CacheKey::from_bytes([1; 32]), Arc::new(CacheEntry::new(vec![1], vec![])));
        assert_eq!(cache.inserts(), 1);
        assert!(cache.get(&CacheKey::from_bytes([1; 32])).is_some());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_sas_is_not_empty(sas in generators::arb_sas()) {
            prop_assert!(!sas.trim_start_matches('?').is_empty());
        }
    }
}
