//! Deterministic request fingerprints.
//!
//! A fingerprint is the SHA-256 of the canonical JSON serialization of the
//! dataset locator and the normalized [`RequestVariant`]. Credentials are
//! not reachable from either, so two callers asking for the same product
//! share one cache entry.

use std::fmt;

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::error::CoreResult;
use crate::request::{NormalizedRequest, RequestVariant};

/// SHA-256 digest identifying a request's output.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey([u8; 32]);

impl CacheKey {
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CacheKey({})", self.to_hex())
    }
}

#[derive(Serialize)]
struct FingerprintInput<'a> {
    vds: &'a str,
    request: &'a RequestVariant,
}

/// Compute SHA-256 hash of content.
pub fn compute_content_hash(content: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let result = hasher.finalize();
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&result);
    hash
}

/// Fingerprint a dataset + variant pair.
pub fn fingerprint_variant(dataset: &str, variant: &RequestVariant) -> CoreResult<CacheKey> {
    let canonical = serde_json::to_vec(&FingerprintInput {
        vds: dataset,
        request: variant,
    })?;
    Ok(CacheKey(compute_content_hash(&canonical)))
}

/// Fingerprint a normalized request.
pub fn fingerprint(request: &NormalizedRequest) -> CoreResult<CacheKey> {
    fingerprint_variant(request.dataset(), &request.variant)
}


// ============================================================================
// PROPERTY-BASED TESTS
// ============================================================================

#[cfg(test)]
mod prop_tests {
    use super::*;
    use crate::request::{FenceQuery, SliceQuery};
    use proptest::prelude::*;

    fn slice_variant() -> impl Strategy<Value = RequestVariant> {
        (
            prop::sample::select(vec!["i", "j", "k", "inline", "crossline", "sample"]),
            -1000i32..1000,
        )
            .prop_map(|(direction, lineno)| {
                RequestVariant::Slice(SliceQuery {
                    direction: direction.to_string(),
                    lineno,
                    bounds: vec![],
                })
            })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Fingerprinting is a pure function of its input.
        #[test]
        fn prop_fingerprint_is_deterministic(variant in slice_variant()) {
            let a = fingerprint_variant("memory://survey/cube", &variant);
            let b = fingerprint_variant("memory://survey/cube", &variant);
            prop_assert!(a.is_ok());
            prop_assert_eq!(a, b);
        }

        /// Moving any fence coordinate changes the fingerprint.
        #[test]
        fn prop_fence_coordinates_are_significant(
            coordinates in prop::collection::vec((-1e4f32..1e4, -1e4f32..1e4), 1..8),
            index in any::<prop::sample::Index>(),
            delta in 0.5f32..100.0,
        ) {
            let coordinates: Vec<Vec<f32>> = coordinates.into_iter().map(|(x, y)| vec![x, y]).collect();
            let mut moved = coordinates.clone();
            let position = index.index(moved.len());
            moved[position][0] += delta;
            prop_assume!(moved[position][0] != coordinates[position][0]);

            let fence = |coordinates: Vec<Vec<f32>>| RequestVariant::Fence(FenceQuery {
                coordinate_system: "cdp".to_string(),
                coordinates,
                interpolation: "nearest".to_string(),
                fill_value: None,
            });
            let a = fingerprint_variant("memory://survey/cube", &fence(coordinates));
            let b = fingerprint_variant("memory://survey/cube", &fence(moved));
            prop_assert!(a.is_ok() && b.is_ok());
            prop_assert_ne!(a, b);
        }
    }
}
