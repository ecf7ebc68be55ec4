//! SEISGATE Core - Request Model and Engine Contract
//!
//! Everything the gateway knows about a request before it reaches HTTP:
//! wire documents and their normalization, credential resolution,
//! fingerprints, per-variant execution and the storage engine contract
//! (with an in-memory engine for tests and demos).

pub mod credentials;
pub mod engine;
pub mod error;
pub mod execute;
pub mod fingerprint;
pub mod geometry;
pub mod metadata;
pub mod request;
pub mod tokens;

pub use credentials::{ConnectionDescriptor, Credential, CredentialResolver};
pub use engine::{
    AxisBound, AxisSpec, Connection, ConnectionMaker, DatasetHandle, MemoryEngine, MemoryVolume,
};
pub use error::{CoreResult, GatewayError};
pub use execute::ExecutionOutput;
pub use fingerprint::{compute_content_hash, fingerprint, fingerprint_variant, CacheKey};
pub use geometry::{RegularSurface, SliceBound, VerticalWindow};
pub use metadata::{
    encode_samples, AxisMetadata, BoundingBox, Metadata, ShapeMetadata, SliceMetadata,
    SAMPLE_FORMAT,
};
pub use request::{
    normalize, parse_json, AlongSurfaceQuery, AttributeAlongSurfaceRequest,
    AttributeBetweenSurfacesRequest, BetweenSurfacesQuery, FenceQuery, FenceRequest,
    MetadataRequest, NormalizedRequest, RequestVariant, SliceQuery, SliceRequest, WireRequest,
};
pub use tokens::{Attribute, CoordinateSystem, Direction, Interpolation};
