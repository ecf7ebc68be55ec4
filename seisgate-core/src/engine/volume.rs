//! Regular 3D volumes held in memory.
//!
//! A volume is a dense grid indexed `(i, j, k)` along inline, crossline and
//! sample. Each axis maps indices to annotations linearly, and an affine
//! transform maps `(i, j)` to world (CDP) coordinates.

use crate::error::{CoreResult, GatewayError};
use crate::geometry::{RegularSurface, VerticalWindow};
use crate::metadata::{AxisMetadata, BoundingBox, Metadata, SliceMetadata, SAMPLE_FORMAT};
use crate::tokens::{Attribute, CoordinateSystem, Direction, Interpolation};

use super::statistics;
use super::AxisBound;

/// Tolerance when snapping annotations and vertical positions to samples.
const SNAP_EPSILON: f64 = 1e-4;

/// Upper bound on resampled points per attribute window.
const MAX_WINDOW_SAMPLES: usize = 1 << 20;

// ============================================================================
// AXIS
// ============================================================================

/// Linear index-to-annotation mapping for one dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct AxisSpec {
    pub annotation: String,
    pub unit: String,
    pub min: f32,
    pub stepsize: f32,
    pub samples: usize,
}

impl AxisSpec {
    pub fn new(annotation: &str, unit: &str, min: f32, stepsize: f32, samples: usize) -> Self {
        Self {
            annotation: annotation.to_string(),
            unit: unit.to_string(),
            min,
            stepsize,
            samples,
        }
    }

    pub fn max(&self) -> f32 {
        self.annotation_at(self.samples.saturating_sub(1))
    }

    pub fn annotation_at(&self, index: usize) -> f32 {
        self.min + self.stepsize * index as f32
    }

    /// Fractional index of an annotated value.
    pub fn position(&self, annotation: f64) -> f64 {
        (annotation - f64::from(self.min)) / f64::from(self.stepsize)
    }

    fn last(&self) -> usize {
        self.samples.saturating_sub(1)
    }

    fn metadata(&self, from: usize, to: usize) -> AxisMetadata {
        AxisMetadata {
            annotation: self.annotation.clone(),
            max: self.annotation_at(to),
            min: self.annotation_at(from),
            samples: to - from + 1,
            stepsize: self.stepsize,
            unit: self.unit.clone(),
        }
    }
}

// ============================================================================
// VOLUME
// ============================================================================

#[derive(Debug, Clone)]
pub struct MemoryVolume {
    axes: [AxisSpec; 3],
    origin: [f64; 2],
    inline_step: [f64; 2],
    crossline_step: [f64; 2],
    crs: String,
    input_file_name: String,
    import_time_stamp: String,
    /// Samples ordered by i, then j, then k.
    data: Vec<f32>,
}

impl MemoryVolume {
    /// Build a volume by evaluating `value(i, j, k)` at every grid point.
    ///
    /// The world transform defaults to the identity on `(i, j)`.
    pub fn from_fn(
        inline: AxisSpec,
        crossline: AxisSpec,
        sample: AxisSpec,
        value: impl Fn(usize, usize, usize) -> f32,
    ) -> Self {
        let mut data = Vec::with_capacity(inline.samples * crossline.samples * sample.samples);
        for i in 0..inline.samples {
            for j in 0..crossline.samples {
                for k in 0..sample.samples {
                    data.push(value(i, j, k));
                }
            }
        }
        Self {
            axes: [inline, crossline, sample],
            origin: [0.0, 0.0],
            inline_step: [1.0, 0.0],
            crossline_step: [0.0, 1.0],
            crs: String::new(),
            input_file_name: String::new(),
            import_time_stamp: String::new(),
            data,
        }
    }

    /// Place the grid in the world: `cdp = origin + i * inline_step + j * crossline_step`.
    pub fn with_transform(mut self, origin: [f64; 2], inline_step: [f64; 2], crossline_step: [f64; 2]) -> Self {
        self.origin = origin;
        self.inline_step = inline_step;
        self.crossline_step = crossline_step;
        self
    }

    pub fn with_provenance(mut self, crs: &str, input_file_name: &str, import_time_stamp: &str) -> Self {
        self.crs = crs.to_string();
        self.input_file_name = input_file_name.to_string();
        self.import_time_stamp = import_time_stamp.to_string();
        self
    }

    /// Small synthetic survey: 3 inlines (1, 3, 5), 2 crosslines (10, 11)
    /// and 4 samples (4 to 16 ms), valued `100 + 8i + 4j + k`.
    pub fn well_known() -> Self {
        Self::from_fn(
            AxisSpec::new("Inline", "unitless", 1.0, 2.0, 3),
            AxisSpec::new("Crossline", "unitless", 10.0, 1.0, 2),
            AxisSpec::new("Sample", "ms", 4.0, 4.0, 4),
            |i, j, k| 100.0 + 8.0 * i as f32 + 4.0 * j as f32 + k as f32,
        )
        .with_transform([2.0, 0.0], [6.0, 4.0], [-2.0, 3.0])
        .with_provenance("utmXX", "well_known.segy", "2021-02-18T21:54:42.123Z")
    }

    pub fn axis(&self, dimension: usize) -> &AxisSpec {
        &self.axes[dimension]
    }

    /// Number of samples per trace.
    pub fn trace_length(&self) -> usize {
        self.axes[2].samples
    }

    pub fn value(&self, i: usize, j: usize, k: usize) -> f32 {
        let [_, crossline, sample] = &self.axes;
        self.data[(i * crossline.samples + j) * sample.samples + k]
    }

    fn trace(&self, i: usize, j: usize) -> &[f32] {
        let n = self.trace_length();
        let start = (i * self.axes[1].samples + j) * n;
        &self.data[start..start + n]
    }

    /// Total size of the sample data in bytes.
    pub fn size_in_bytes(&self) -> usize {
        self.data.len() * std::mem::size_of::<f32>()
    }

    // ========================================================================
    // COORDINATES
    // ========================================================================

    pub fn index_to_cdp(&self, i: f64, j: f64) -> [f64; 2] {
        [
            self.origin[0] + i * self.inline_step[0] + j * self.crossline_step[0],
            self.origin[1] + i * self.inline_step[1] + j * self.crossline_step[1],
        ]
    }

    pub fn cdp_to_index(&self, x: f64, y: f64) -> CoreResult<(f64, f64)> {
        let [a0, a1] = self.inline_step;
        let [b0, b1] = self.crossline_step;
        let det = a0 * b1 - a1 * b0;
        if det.abs() < f64::EPSILON {
            return Err(GatewayError::internal("Degenerate world transform in dataset"));
        }
        let dx = x - self.origin[0];
        let dy = y - self.origin[1];
        Ok(((dx * b1 - dy * b0) / det, (a0 * dy - a1 * dx) / det))
    }

    fn to_index(&self, system: CoordinateSystem, x: f64, y: f64) -> CoreResult<(f64, f64)> {
        match system {
            CoordinateSystem::Ij => Ok((x, y)),
            CoordinateSystem::Ilxl => Ok((self.axes[0].position(x), self.axes[1].position(y))),
            CoordinateSystem::Cdp => self.cdp_to_index(x, y),
        }
    }

    // ========================================================================
    // METADATA
    // ========================================================================

    pub fn metadata(&self) -> Metadata {
        let (ni, nj) = (self.axes[0].last(), self.axes[1].last());
        let corners = [(0, 0), (ni, 0), (ni, nj), (0, nj)];
        Metadata {
            axis: self
                .axes
                .iter()
                .map(|axis| axis.metadata(0, axis.last()))
                .collect(),
            bounding_box: BoundingBox {
                cdp: corners
                    .iter()
                    .map(|&(i, j)| self.index_to_cdp(i as f64, j as f64))
                    .collect(),
                ilxl: corners
                    .iter()
                    .map(|&(i, j)| [self.axes[0].annotation_at(i), self.axes[1].annotation_at(j)])
                    .collect(),
                ij: corners.iter().map(|&(i, j)| [i as f32, j as f32]).collect(),
            },
            crs: self.crs.clone(),
            input_file_name: self.input_file_name.clone(),
            import_time_stamp: self.import_time_stamp.clone(),
            format: SAMPLE_FORMAT.to_string(),
        }
    }

    // ========================================================================
    // SLICE
    // ========================================================================

    fn line_index(&self, direction: Direction, lineno: i32) -> CoreResult<usize> {
        let axis = &self.axes[direction.dimension()];
        if direction.is_index() {
            if lineno >= 0 && (lineno as usize) < axis.samples {
                return Ok(lineno as usize);
            }
            return Err(GatewayError::internal(format!(
                "Invalid lineno: {}, valid range: [0:{}:1]",
                lineno,
                axis.last()
            )));
        }

        let position = axis.position(f64::from(lineno));
        let snapped = position.round();
        if (position - snapped).abs() < SNAP_EPSILON && snapped >= 0.0 && snapped <= axis.last() as f64 {
            return Ok(snapped as usize);
        }
        Err(GatewayError::internal(format!(
            "Invalid lineno: {}, valid range: [{}:{}:{}]",
            lineno,
            axis.min,
            axis.max(),
            axis.stepsize
        )))
    }

    fn bounded_range(&self, dimension: usize, bounds: &[AxisBound]) -> CoreResult<(usize, usize)> {
        let axis = &self.axes[dimension];
        let (mut from, mut to) = (0.0f64, axis.last() as f64);
        for bound in bounds.iter().filter(|b| b.direction.dimension() == dimension) {
            let (lower, upper) = if bound.direction.is_index() {
                (f64::from(bound.lower), f64::from(bound.upper))
            } else {
                (axis.position(f64::from(bound.lower)), axis.position(f64::from(bound.upper)))
            };
            from = from.max((lower - SNAP_EPSILON).ceil());
            to = to.min((upper + SNAP_EPSILON).floor());
        }
        if from > to {
            return Err(GatewayError::internal(format!(
                "Bounds on '{}' select no samples",
                axis.annotation
            )));
        }
        Ok((from as usize, to as usize))
    }

    pub fn slice(&self, direction: Direction, lineno: i32, bounds: &[AxisBound]) -> CoreResult<(SliceMetadata, Vec<f32>)> {
        let dimension = direction.dimension();
        let line = self.line_index(direction, lineno)?;
        let mut others = (0..3).filter(|d| *d != dimension);
        let (row_dim, col_dim) = match (others.next(), others.next()) {
            (Some(row), Some(col)) => (row, col),
            _ => return Err(GatewayError::internal("Volume must be three-dimensional")),
        };
        let (row_from, row_to) = self.bounded_range(row_dim, bounds)?;
        let (col_from, col_to) = self.bounded_range(col_dim, bounds)?;

        let mut data = Vec::with_capacity((row_to - row_from + 1) * (col_to - col_from + 1));
        let mut index = [0usize; 3];
        index[dimension] = line;
        for row in row_from..=row_to {
            index[row_dim] = row;
            for col in col_from..=col_to {
                index[col_dim] = col;
                data.push(self.value(index[0], index[1], index[2]));
            }
        }

        let geospatial = match dimension {
            0 => vec![
                self.index_to_cdp(line as f64, row_from as f64),
                self.index_to_cdp(line as f64, row_to as f64),
            ],
            1 => vec![
                self.index_to_cdp(row_from as f64, line as f64),
                self.index_to_cdp(row_to as f64, line as f64),
            ],
            _ => vec![
                self.index_to_cdp(row_from as f64, col_from as f64),
                self.index_to_cdp(row_to as f64, col_from as f64),
                self.index_to_cdp(row_to as f64, col_to as f64),
                self.index_to_cdp(row_from as f64, col_to as f64),
            ],
        };

        let metadata = SliceMetadata {
            x: self.axes[col_dim].metadata(col_from, col_to),
            y: self.axes[row_dim].metadata(row_from, row_to),
            shape: [row_to - row_from + 1, col_to - col_from + 1],
            format: SAMPLE_FORMAT.to_string(),
            geospatial,
        };
        Ok((metadata, data))
    }

    // ========================================================================
    // TRACES
    // ========================================================================

    fn contains(&self, i: f64, j: f64) -> bool {
        let inside = |position: f64, axis: &AxisSpec| {
            position >= -0.5 && position < axis.samples as f64 - 0.5
        };
        inside(i, &self.axes[0]) && inside(j, &self.axes[1])
    }

    /// Trace at a fractional `(i, j)`, or `None` outside the survey.
    fn trace_at(&self, i: f64, j: f64, interpolation: Interpolation) -> Option<Vec<f64>> {
        if !i.is_finite() || !j.is_finite() || !self.contains(i, j) {
            return None;
        }
        let (last_i, last_j) = (self.axes[0].last(), self.axes[1].last());

        if interpolation == Interpolation::Nearest {
            let i = (i.round().max(0.0) as usize).min(last_i);
            let j = (j.round().max(0.0) as usize).min(last_j);
            return Some(self.trace(i, j).iter().map(|v| f64::from(*v)).collect());
        }

        let i = i.clamp(0.0, last_i as f64);
        let j = j.clamp(0.0, last_j as f64);
        let (i0, j0) = (i.floor() as usize, j.floor() as usize);
        let (i1, j1) = ((i0 + 1).min(last_i), (j0 + 1).min(last_j));
        let (wi, wj) = (i - i0 as f64, j - j0 as f64);

        let corners = [
            (self.trace(i0, j0), (1.0 - wi) * (1.0 - wj)),
            (self.trace(i1, j0), wi * (1.0 - wj)),
            (self.trace(i0, j1), (1.0 - wi) * wj),
            (self.trace(i1, j1), wi * wj),
        ];
        let mut trace = vec![0.0; self.trace_length()];
        for (samples, weight) in corners {
            for (out, sample) in trace.iter_mut().zip(samples) {
                *out += weight * f64::from(*sample);
            }
        }
        Some(trace)
    }

    /// Linear interpolation of a trace at vertical position `depth`.
    fn sample_at(&self, trace: &[f64], depth: f64) -> Option<f64> {
        let axis = &self.axes[2];
        let position = axis.position(depth);
        let last = axis.last() as f64;
        if position < -SNAP_EPSILON || position > last + SNAP_EPSILON {
            return None;
        }
        let position = position.clamp(0.0, last);
        let k0 = position.floor() as usize;
        let k1 = (k0 + 1).min(axis.last());
        let weight = position - k0 as f64;
        Some(trace[k0] * (1.0 - weight) + trace[k1] * weight)
    }

    // ========================================================================
    // FENCE
    // ========================================================================

    pub fn fence(
        &self,
        system: CoordinateSystem,
        coordinates: &[[f32; 2]],
        interpolation: Interpolation,
        fill_value: Option<f32>,
    ) -> CoreResult<Vec<f32>> {
        let n = self.trace_length();
        let mut data = Vec::with_capacity(coordinates.len() * n);
        for (position, [x, y]) in coordinates.iter().enumerate() {
            let (i, j) = self.to_index(system, f64::from(*x), f64::from(*y))?;
            match (self.trace_at(i, j, interpolation), fill_value) {
                (Some(trace), _) => data.extend(trace.into_iter().map(|v| v as f32)),
                (None, Some(fill)) => data.extend(std::iter::repeat(fill).take(n)),
                (None, None) => {
                    return Err(GatewayError::internal(format!(
                        "Coordinate ({}, {}) at position {} is out of bounds",
                        x, y, position
                    )))
                }
            }
        }
        Ok(data)
    }

    // ========================================================================
    // ATTRIBUTES
    // ========================================================================

    fn resample_step(&self, stepsize: f32) -> f64 {
        if stepsize > 0.0 {
            f64::from(stepsize)
        } else {
            f64::from(self.axes[2].stepsize)
        }
    }

    /// Evaluate `attributes` at one surface point for the window spanning
    /// `above` units over and `below` units under `reference`.
    #[allow(clippy::too_many_arguments)]
    fn window_attributes(
        &self,
        surface: &RegularSurface,
        row: usize,
        col: usize,
        reference: f64,
        above: f64,
        below: f64,
        step: f64,
        attributes: &[Attribute],
        interpolation: Interpolation,
    ) -> CoreResult<Option<Vec<f32>>> {
        let (x, y) = surface.to_world(row, col);
        let (i, j) = self.cdp_to_index(x, y)?;
        let Some(trace) = self.trace_at(i, j, interpolation) else {
            return Ok(None);
        };

        let samples_above = (above / step + SNAP_EPSILON).floor();
        let samples_below = (below / step + SNAP_EPSILON).floor();
        if self.sample_at(&trace, reference - samples_above * step).is_none()
            || self.sample_at(&trace, reference + samples_below * step).is_none()
        {
            return Ok(None);
        }

        let total = samples_above + samples_below + 1.0;
        if !total.is_finite() || total > MAX_WINDOW_SAMPLES as f64 {
            return Err(GatewayError::internal(format!(
                "Vertical window of {} samples exceeds the limit of {}, increase the stepsize",
                total, MAX_WINDOW_SAMPLES
            )));
        }
        let samples_above = samples_above as usize;
        let samples_below = samples_below as usize;

        let mut window = Vec::with_capacity(samples_above + samples_below + 1);
        for m in 0..=samples_above + samples_below {
            let offset = m as f64 - samples_above as f64;
            match self.sample_at(&trace, reference + offset * step) {
                Some(value) => window.push(value),
                None => return Ok(None),
            }
        }

        let reference_index = samples_above;
        Ok(Some(
            attributes
                .iter()
                .map(|attribute| statistics::compute(*attribute, &window, reference_index))
                .collect(),
        ))
    }

    pub fn attributes_along_surface(
        &self,
        surface: &RegularSurface,
        window: VerticalWindow,
        attributes: &[Attribute],
        interpolation: Interpolation,
    ) -> CoreResult<Vec<Vec<f32>>> {
        let step = self.resample_step(window.stepsize);
        let mut maps = vec![Vec::with_capacity(surface.nrows() * surface.ncols()); attributes.len()];
        for (row, values) in surface.values.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                let computed = if surface.is_fill(*value) {
                    None
                } else {
                    self.window_attributes(
                        surface,
                        row,
                        col,
                        f64::from(*value),
                        f64::from(window.above),
                        f64::from(window.below),
                        step,
                        attributes,
                        interpolation,
                    )?
                };
                push_point(&mut maps, computed, surface.fill_value);
            }
        }
        Ok(maps)
    }

    pub fn attributes_between_surfaces(
        &self,
        primary: &RegularSurface,
        secondary: &RegularSurface,
        stepsize: f32,
        attributes: &[Attribute],
        interpolation: Interpolation,
    ) -> CoreResult<Vec<Vec<f32>>> {
        if (primary.nrows(), primary.ncols()) != (secondary.nrows(), secondary.ncols()) {
            return Err(GatewayError::internal(format!(
                "Expected surfaces to have the same shape, primary is {}x{}, secondary is {}x{}",
                primary.nrows(),
                primary.ncols(),
                secondary.nrows(),
                secondary.ncols()
            )));
        }

        let step = self.resample_step(stepsize);
        let mut maps = vec![Vec::with_capacity(primary.nrows() * primary.ncols()); attributes.len()];
        for (row, (top_row, other_row)) in primary.values.iter().zip(&secondary.values).enumerate() {
            for (col, (reference, other)) in top_row.iter().zip(other_row).enumerate() {
                let computed = if primary.is_fill(*reference) || secondary.is_fill(*other) {
                    None
                } else {
                    let reference = f64::from(*reference);
                    let other = f64::from(*other);
                    self.window_attributes(
                        primary,
                        row,
                        col,
                        reference,
                        (reference - other).max(0.0),
                        (other - reference).max(0.0),
                        step,
                        attributes,
                        interpolation,
                    )?
                };
                push_point(&mut maps, computed, primary.fill_value);
            }
        }
        Ok(maps)
    }
}

fn push_point(maps: &mut [Vec<f32>], computed: Option<Vec<f32>>, fill: f32) {
    match computed {
        Some(values) => {
            for (map, value) in maps.iter_mut().zip(values) {
                map.push(value);
            }
        }
        None => {
            for map in maps.iter_mut() {
                map.push(fill);
            }
        }
    }
}
