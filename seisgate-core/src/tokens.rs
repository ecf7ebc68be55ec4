//! Closed vocabularies accepted in request payloads.
//!
//! Every token is matched case-insensitively after the normalizer has
//! lower-cased it. Unknown tokens are caller errors and list the accepted
//! options in their message.

use crate::error::{CoreResult, GatewayError};

fn lookup<T: Copy>(token: &str, table: &[(&'static str, T)]) -> Option<T> {
    let token = token.trim().to_lowercase();
    table
        .iter()
        .find(|(name, _)| *name == token)
        .map(|(_, value)| *value)
}

fn options<T>(table: &[(&'static str, T)]) -> String {
    table
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

// ============================================================================
// DIRECTION
// ============================================================================

/// Axis a slice is taken along, either by index or by annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    I,
    J,
    K,
    Inline,
    Crossline,
    Depth,
    Time,
    Sample,
}

const DIRECTIONS: &[(&str, Direction)] = &[
    ("i", Direction::I),
    ("j", Direction::J),
    ("k", Direction::K),
    ("inline", Direction::Inline),
    ("crossline", Direction::Crossline),
    ("depth", Direction::Depth),
    ("time", Direction::Time),
    ("sample", Direction::Sample),
];

impl Direction {
    pub fn parse(token: &str) -> CoreResult<Self> {
        lookup(token, DIRECTIONS).ok_or_else(|| {
            GatewayError::invalid_argument(format!(
                "invalid direction '{}', valid options are: {}",
                token,
                options(DIRECTIONS)
            ))
        })
    }

    /// Volume dimension the direction addresses: 0 inline, 1 crossline, 2 sample.
    pub fn dimension(self) -> usize {
        match self {
            Direction::I | Direction::Inline => 0,
            Direction::J | Direction::Crossline => 1,
            Direction::K | Direction::Depth | Direction::Time | Direction::Sample => 2,
        }
    }

    /// Whether line numbers along this direction are zero-based indices.
    pub fn is_index(self) -> bool {
        matches!(self, Direction::I | Direction::J | Direction::K)
    }
}

// ============================================================================
// COORDINATE SYSTEM
// ============================================================================

/// Coordinate system fence points are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoordinateSystem {
    /// Zero-based grid indices.
    Ij,
    /// Inline/crossline annotation.
    Ilxl,
    /// World (CDP) coordinates.
    Cdp,
}

const COORDINATE_SYSTEMS: &[(&str, CoordinateSystem)] = &[
    ("ij", CoordinateSystem::Ij),
    ("ilxl", CoordinateSystem::Ilxl),
    ("cdp", CoordinateSystem::Cdp),
];

impl CoordinateSystem {
    pub fn parse(token: &str) -> CoreResult<Self> {
        lookup(token, COORDINATE_SYSTEMS).ok_or_else(|| {
            GatewayError::invalid_argument(format!(
                "coordinate system not recognized: '{}', valid options are: {}",
                token,
                options(COORDINATE_SYSTEMS)
            ))
        })
    }
}

// ============================================================================
// INTERPOLATION
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Interpolation {
    #[default]
    Nearest,
    Linear,
    Cubic,
    Angular,
    Triangular,
}

const INTERPOLATIONS: &[(&str, Interpolation)] = &[
    ("nearest", Interpolation::Nearest),
    ("linear", Interpolation::Linear),
    ("cubic", Interpolation::Cubic),
    ("angular", Interpolation::Angular),
    ("triangular", Interpolation::Triangular),
];

impl Interpolation {
    /// Canonical token used when a request leaves interpolation empty.
    pub const DEFAULT_TOKEN: &'static str = "nearest";

    pub fn parse(token: &str) -> CoreResult<Self> {
        if token.trim().is_empty() {
            return Ok(Interpolation::default());
        }
        lookup(token, INTERPOLATIONS).ok_or_else(|| {
            GatewayError::invalid_argument(format!(
                "invalid interpolation method '{}', valid options are: {}",
                token,
                options(INTERPOLATIONS)
            ))
        })
    }
}

// ============================================================================
// ATTRIBUTE
// ============================================================================

/// Statistic computed over the vertical window at every surface point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Trace value at the surface itself.
    SampleValue,
    Min,
    Max,
    MaxAbs,
    Mean,
    MeanAbs,
    MeanPos,
    MeanNeg,
    Median,
    Rms,
    /// Population variance.
    Var,
    /// Population standard deviation.
    Sd,
    SumPos,
    SumNeg,
}

const ATTRIBUTES: &[(&str, Attribute)] = &[
    ("samplevalue", Attribute::SampleValue),
    ("min", Attribute::Min),
    ("max", Attribute::Max),
    ("maxabs", Attribute::MaxAbs),
    ("mean", Attribute::Mean),
    ("meanabs", Attribute::MeanAbs),
    ("meanpos", Attribute::MeanPos),
    ("meanneg", Attribute::MeanNeg),
    ("median", Attribute::Median),
    ("rms", Attribute::Rms),
    ("var", Attribute::Var),
    ("sd", Attribute::Sd),
    ("sumpos", Attribute::SumPos),
    ("sumneg", Attribute::SumNeg),
];

impl Attribute {
    pub fn parse(token: &str) -> CoreResult<Self> {
        lookup(token, ATTRIBUTES).ok_or_else(|| {
            GatewayError::invalid_argument(format!(
                "invalid attribute '{}', valid options are: {}",
                token,
                options(ATTRIBUTES)
            ))
        })
    }

    /// Parse a list, preserving request order.
    pub fn parse_all(tokens: &[String]) -> CoreResult<Vec<Self>> {
        if tokens.is_empty() {
            return Err(GatewayError::invalid_argument(
                "at least one attribute must be requested",
            ));
        }
        tokens.iter().map(|token| Attribute::parse(token)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_is_case_insensitive() {
        assert_eq!(Direction::parse("InLine"), Ok(Direction::Inline));
        assert_eq!(Direction::parse("K"), Ok(Direction::K));
    }

    #[test]
    fn test_direction_unknown_lists_options() {
        let err = Direction::parse("unknown").unwrap_err();
        assert!(err.is_invalid_argument());
        assert_eq!(
            err.message(),
            "invalid direction 'unknown', valid options are: i, j, k, inline, crossline, depth, time, sample"
        );
    }

    #[test]
    fn test_direction_dimensions() {
        assert_eq!(Direction::I.dimension(), 0);
        assert_eq!(Direction::Crossline.dimension(), 1);
        assert_eq!(Direction::Time.dimension(), 2);
        assert!(Direction::J.is_index());
        assert!(!Direction::Sample.is_index());
    }

    #[test]
    fn test_coordinate_system_unknown() {
        let err = CoordinateSystem::parse("unknown").unwrap_err();
        assert!(err
            .message()
            .starts_with("coordinate system not recognized: 'unknown', valid options are"));
    }

    #[test]
    fn test_interpolation_empty_defaults_to_nearest() {
        assert_eq!(Interpolation::parse(""), Ok(Interpolation::Nearest));
        assert_eq!(Interpolation::parse("Cubic"), Ok(Interpolation::Cubic));
        assert!(Interpolation::parse("unsupported")
            .unwrap_err()
            .message()
            .starts_with("invalid interpolation method"));
    }

    #[test]
    fn test_attributes_keep_order() {
        let tokens = vec!["sd".to_string(), "min".to_string(), "samplevalue".to_string()];
        assert_eq!(
            Attribute::parse_all(&tokens),
            Ok(vec![Attribute::Sd, Attribute::Min, Attribute::SampleValue])
        );
    }

    #[test]
    fn test_attributes_reject_unknown_and_empty() {
        let tokens = vec!["min".to_string(), "bogus".to_string()];
        assert!(Attribute::parse_all(&tokens).unwrap_err().is_invalid_argument());
        assert!(Attribute::parse_all(&[]).is_err());
    }
}
