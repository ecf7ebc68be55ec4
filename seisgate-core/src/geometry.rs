//! Geometry carried by data requests: surfaces, vertical windows, bounds.

use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, GatewayError};

/// Exclusive upper limit for `above` and `below`, in vertical units.
pub const MAX_WINDOW_EXTENT: f32 = 250.0;

// ============================================================================
// REGULAR SURFACE
// ============================================================================

/// A regular 2D grid of depths/times positioned in world coordinates.
///
/// Grid point `(row, col)` sits at
/// `origin + row * xinc * (cos r, sin r) + col * yinc * (-sin r, cos r)`
/// where `r` is `rotation` in degrees, counter-clockwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "camelCase")]
pub struct RegularSurface {
    /// Surface values, row-major. Every row must have the same length.
    pub values: Vec<Vec<f32>>,
    pub xori: f32,
    pub yori: f32,
    pub xinc: f32,
    pub yinc: f32,
    /// Rotation of the row axis, degrees counter-clockwise from east.
    pub rotation: f32,
    /// Value marking grid points without data.
    pub fill_value: f32,
}

impl RegularSurface {
    pub fn nrows(&self) -> usize {
        self.values.len()
    }

    pub fn ncols(&self) -> usize {
        self.values.first().map_or(0, Vec::len)
    }

    /// Reject empty and ragged grids.
    pub fn validate(&self) -> CoreResult<()> {
        let Some(first) = self.values.first() else {
            return Err(GatewayError::invalid_argument(
                "Surface must have at least one row",
            ));
        };
        if first.is_empty() {
            return Err(GatewayError::invalid_argument(
                "Surface rows must have at least one element",
            ));
        }
        for (row, values) in self.values.iter().enumerate().skip(1) {
            if values.len() != first.len() {
                return Err(GatewayError::invalid_argument(format!(
                    "Surface rows are not of the same length. Row 0 has {} elements. Row {} has {} elements",
                    first.len(),
                    row,
                    values.len()
                )));
            }
        }
        Ok(())
    }

    pub fn is_fill(&self, value: f32) -> bool {
        value == self.fill_value || value.is_nan()
    }

    /// World position of a grid point.
    pub fn to_world(&self, row: usize, col: usize) -> (f64, f64) {
        let angle = f64::from(self.rotation).to_radians();
        let (sin, cos) = angle.sin_cos();
        let row = row as f64 * f64::from(self.xinc);
        let col = col as f64 * f64::from(self.yinc);
        (
            f64::from(self.xori) + row * cos - col * sin,
            f64::from(self.yori) + row * sin + col * cos,
        )
    }
}

// ============================================================================
// VERTICAL WINDOW
// ============================================================================

/// Window around a surface, in the volume's vertical units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalWindow {
    pub above: f32,
    pub below: f32,
    /// Resampling step; zero means the volume's own sample interval.
    pub stepsize: f32,
}

impl VerticalWindow {
    pub fn new(above: f32, below: f32, stepsize: f32) -> CoreResult<Self> {
        validate_window_extent("above", above)?;
        validate_window_extent("below", below)?;
        validate_stepsize(stepsize)?;
        Ok(Self {
            above,
            below,
            stepsize,
        })
    }
}

fn validate_window_extent(name: &str, value: f32) -> CoreResult<()> {
    if !(0.0..MAX_WINDOW_EXTENT).contains(&value) {
        return Err(GatewayError::invalid_argument(format!(
            "'{}' out of range! Must be within [0, {}], was {}",
            name, MAX_WINDOW_EXTENT, value
        )));
    }
    Ok(())
}

pub fn validate_stepsize(stepsize: f32) -> CoreResult<()> {
    if stepsize.is_nan() || stepsize < 0.0 {
        return Err(GatewayError::invalid_argument(format!(
            "'stepsize' out of range! Must be bigger than 0, was {}",
            stepsize
        )));
    }
    Ok(())
}

// ============================================================================
// SLICE BOUNDS
// ============================================================================

/// Restricts one axis of a slice to `[lower, upper]`.
///
/// Index directions (`i`, `j`, `k`) bound by zero-based index, annotation
/// directions by annotated value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SliceBound {
    pub direction: String,
    pub lower: f32,
    pub upper: f32,
}

// ============================================================================
// COORDINATES
// ============================================================================

/// Check that every fence coordinate is an `[x y]` pair.
pub fn coordinate_pairs(coordinates: &[Vec<f32>]) -> CoreResult<Vec<[f32; 2]>> {
    coordinates
        .iter()
        .enumerate()
        .map(|(position, coordinate)| match coordinate.as_slice() {
            [x, y] => Ok([*x, *y]),
            other => Err(GatewayError::invalid_argument(format!(
                "invalid coordinate [{}] at position {}, expected [x y] pair",
                other
                    .iter()
                    .map(|v| v.to_string())
                    .collect::<Vec<_>>()
                    .join(" "),
                position
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface(values: Vec<Vec<f32>>) -> RegularSurface {
        RegularSurface {
            values,
            xori: 0.0,
            yori: 0.0,
            xinc: 1.0,
            yinc: 1.0,
            rotation: 0.0,
            fill_value: -999.25,
        }
    }

    #[test]
    fn test_ragged_surface_names_rows() {
        let err = surface(vec![vec![4.0, 4.0], vec![4.0, 4.0, 4.0], vec![4.0, 4.0]])
            .validate()
            .unwrap_err();
        assert_eq!(
            err.message(),
            "Surface rows are not of the same length. Row 0 has 2 elements. Row 1 has 3 elements"
        );
    }

    #[test]
    fn test_empty_surface_rejected() {
        assert!(surface(vec![]).validate().unwrap_err().is_invalid_argument());
        assert!(surface(vec![vec![]]).validate().is_err());
    }

    #[test]
    fn test_surface_dimensions() {
        let s = surface(vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]]);
        assert!(s.validate().is_ok());
        assert_eq!((s.nrows(), s.ncols()), (3, 2));
    }

    #[test]
    fn test_to_world_applies_rotation() {
        let mut s = surface(vec![vec![0.0]]);
        s.xori = 2.0;
        s.yori = 1.0;
        s.xinc = 2.0;
        s.rotation = 90.0;
        let (x, y) = s.to_world(1, 0);
        assert!((x - 2.0).abs() < 1e-9);
        assert!((y - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_window_bounds() {
        assert!(VerticalWindow::new(0.0, 249.9, 0.0).is_ok());
        let err = VerticalWindow::new(-1.0, 0.0, 1.0).unwrap_err();
        assert_eq!(err.message(), "'above' out of range! Must be within [0, 250], was -1");
        let err = VerticalWindow::new(0.0, 250.0, 1.0).unwrap_err();
        assert!(err.message().starts_with("'below' out of range!"));
        let err = VerticalWindow::new(0.0, 0.0, -1.0).unwrap_err();
        assert_eq!(err.message(), "'stepsize' out of range! Must be bigger than 0, was -1");
    }

    #[test]
    fn test_coordinate_pairs_reports_position() {
        let coordinates = vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![2.0, 10.0, 3.0, 4.0]];
        let err = coordinate_pairs(&coordinates).unwrap_err();
        assert_eq!(
            err.message(),
            "invalid coordinate [2 10 3 4] at position 2, expected [x y] pair"
        );
        assert_eq!(
            coordinate_pairs(&coordinates[..2]),
            Ok(vec![[1.0, 2.0], [3.0, 4.0]])
        );
    }
}
