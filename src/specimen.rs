//! Specimen geometry and initial-dimension bookkeeping.
//!
//! A [`SpecimenGeometry`] is created once per specimen and never mutated:
//! the undeformed dimensions `(Lx0, Ly0, Lz0)` and the four marker positions
//! of the free-floating first sample, already in element node order.

use crate::error::{BiaxError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Element node `i` is read from recorded marker slot `NODE_ORDER[i]`.
pub const NODE_ORDER: [usize; 4] = [2, 1, 3, 0];

/// Number of leading rows searched when inferring thickness.
pub const INFERENCE_ROWS: usize = 10;

/// Reorder four recorded marker values into element node order.
#[must_use]
pub fn reorder_markers(recorded: &[f64; 4]) -> [f64; 4] {
    [
        recorded[NODE_ORDER[0]],
        recorded[NODE_ORDER[1]],
        recorded[NODE_ORDER[2]],
        recorded[NODE_ORDER[3]],
    ]
}

/// Immutable per-specimen geometry.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpecimenGeometry {
    /// Initial dimensions `[Lx0, Ly0, Lz0]`.
    pub dims: [f64; 3],

    /// Initial marker x-coordinates, element node order.
    pub x_ref: [f64; 4],

    /// Initial marker y-coordinates, element node order.
    pub y_ref: [f64; 4],
}

impl SpecimenGeometry {
    /// Create a specimen from dimensions and initial marker coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if a dimension is not strictly positive or a
    /// coordinate is not finite.
    pub fn new(dims: [f64; 3], x_ref: [f64; 4], y_ref: [f64; 4]) -> Result<Self> {
        if dims.iter().any(|&d| !(d > 0.0 && d.is_finite())) {
            return Err(BiaxError::inconsistent_input(format!(
                "specimen dimensions must be positive and finite, got {dims:?}"
            )));
        }
        if x_ref.iter().chain(y_ref.iter()).any(|v| !v.is_finite()) {
            return Err(BiaxError::geometry("non-finite initial marker coordinate"));
        }
        Ok(Self { dims, x_ref, y_ref })
    }

    /// Project nominal dimensions onto the free-floating first sample.
    ///
    /// The first recorded sample may already be slightly stretched; in-plane
    /// dimensions scale with the stretch and thickness shrinks so the volume
    /// is preserved.
    ///
    /// # Arguments
    ///
    /// * `nominal` - Measured `[x, y, h]` dimensions
    /// * `stretch_x` - Stretch ratio along x at the first sample
    /// * `stretch_y` - Stretch ratio along y at the first sample
    /// * `x_recorded` - Marker x-coordinates at the first sample, recorded order
    /// * `y_recorded` - Marker y-coordinates at the first sample, recorded order
    ///
    /// # Errors
    ///
    /// Returns an error if a stretch ratio is not strictly positive.
    pub fn from_free_floating(
        nominal: [f64; 3],
        stretch_x: f64,
        stretch_y: f64,
        x_recorded: &[f64; 4],
        y_recorded: &[f64; 4],
    ) -> Result<Self> {
        if !(stretch_x > 0.0 && stretch_y > 0.0) {
            return Err(BiaxError::inconsistent_input(format!(
                "initial stretch ratios must be positive, got ({stretch_x}, {stretch_y})"
            )));
        }
        let dims = [
            nominal[0] * stretch_x,
            nominal[1] * stretch_y,
            nominal[2] / stretch_x / stretch_y,
        ];
        Self::new(dims, reorder_markers(x_recorded), reorder_markers(y_recorded))
    }

    /// Initial area of the face normal to x (`Ly0 * Lz0`).
    #[must_use]
    pub fn area_x(&self) -> f64 {
        self.dims[1] * self.dims[2]
    }

    /// Initial area of the face normal to y (`Lx0 * Lz0`).
    #[must_use]
    pub fn area_y(&self) -> f64 {
        self.dims[0] * self.dims[2]
    }
}

/// Columns of a previously processed table used to recover thickness.
///
/// Sizes are in micrometres; the recovered dimensions are in millimetres.
#[derive(Debug, Clone, Copy)]
pub struct ProcessedColumns<'a> {
    pub x_size_um: &'a [f64],
    pub y_size_um: &'a [f64],
    pub force_x: &'a [f64],
    pub force_y: &'a [f64],
    pub lx: &'a [f64],
    pub ly: &'a [f64],
    pub txx: &'a [f64],
    pub tyy: &'a [f64],
}

/// Infer initial dimensions `[Lx0, Ly0, Lz0]` from a processed table.
///
/// In-plane dimensions come from the first row. Thickness is recovered from
/// the first of the leading [`INFERENCE_ROWS`] rows that carries a non-zero
/// `txx` (or, failing that, `tyy`): `Lz0 = F * lambda / (size * t)`.
///
/// # Errors
///
/// Returns [`BiaxError::DimensionInference`] if no leading row is loaded or
/// the recovered thickness is not positive, and
/// [`BiaxError::InconsistentInput`] on mismatched column lengths.
pub fn infer_initial_dimensions(cols: &ProcessedColumns<'_>) -> Result<[f64; 3]> {
    let n = cols.x_size_um.len();
    for (name, len) in [
        ("y_size_um", cols.y_size_um.len()),
        ("force_x", cols.force_x.len()),
        ("force_y", cols.force_y.len()),
        ("lx", cols.lx.len()),
        ("ly", cols.ly.len()),
        ("txx", cols.txx.len()),
        ("tyy", cols.tyy.len()),
    ] {
        if len != n {
            return Err(BiaxError::length_mismatch(name, n, len));
        }
    }
    if n == 0 {
        return Err(BiaxError::dimension_inference("table is empty"));
    }

    for i in 0..n.min(INFERENCE_ROWS) {
        let thickness = if cols.txx[i] != 0.0 {
            cols.force_x[i] * cols.lx[i] / cols.y_size_um[i] / cols.txx[i]
        } else if cols.tyy[i] != 0.0 {
            cols.force_y[i] * cols.ly[i] / cols.x_size_um[i] / cols.tyy[i]
        } else {
            continue;
        };
        if !(thickness > 0.0 && thickness.is_finite()) {
            return Err(BiaxError::dimension_inference(format!(
                "row {i} gives non-physical thickness {thickness}"
            )));
        }
        return Ok([
            cols.x_size_um[0] / 1000.0,
            cols.y_size_um[0] / 1000.0,
            thickness * 1000.0,
        ]);
    }

    Err(BiaxError::dimension_inference(format!(
        "no loaded sample in the first {INFERENCE_ROWS} rows"
    )))
}
