//! Reference configuration and reference-instant selection.
//!
//! The reference tensor maps the gradient of current marker positions with
//! respect to the element's natural coordinates onto the deformation
//! gradient relative to the reference markers. It is solved once per
//! specimen or protocol and shared read-only by every sample in that scope.

use crate::config::{AnalysisConfig, ReferencePolicy};
use crate::error::{BiaxError, Result};
use crate::math::tensor::{det2, inverse2, natural_gradient, Tensor2};
use crate::series::Protocol;
use crate::specimen::SpecimenGeometry;

/// Relative determinant below which a marker layout counts as degenerate.
const DEGENERATE_TOL: f64 = 1e-12;

/// Inverse natural-coordinate Jacobian of the reference marker layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceConfiguration {
    tensor: Tensor2,
}

impl ReferenceConfiguration {
    /// Solve the reference tensor from four reference markers.
    ///
    /// # Arguments
    ///
    /// * `x` - Reference x-coordinates, element node order
    /// * `y` - Reference y-coordinates, element node order
    ///
    /// # Errors
    ///
    /// Returns [`BiaxError::Geometry`] if the markers are collinear,
    /// coincident or non-finite.
    pub fn new(x: &[f64; 4], y: &[f64; 4]) -> Result<Self> {
        let jac = natural_gradient(x, y);
        let det = det2(&jac);
        let scale = jac.amax();

        if !det.is_finite() || det.abs() <= DEGENERATE_TOL * scale * scale {
            return Err(BiaxError::geometry(format!(
                "reference marker layout has determinant {det:e}"
            )));
        }

        Ok(Self {
            tensor: inverse2(&jac, det),
        })
    }

    /// Solve the reference tensor from a specimen's own initial markers.
    ///
    /// # Errors
    ///
    /// Same as [`ReferenceConfiguration::new`].
    pub fn from_specimen(specimen: &SpecimenGeometry) -> Result<Self> {
        Self::new(&specimen.x_ref, &specimen.y_ref)
    }

    /// The reference tensor.
    #[must_use]
    pub const fn tensor(&self) -> &Tensor2 {
        &self.tensor
    }
}

/// Reference markers chosen by a [`ReferencePolicy`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReferenceMarkers {
    /// Reference x-coordinates.
    pub x: [f64; 4],
    /// Reference y-coordinates.
    pub y: [f64; 4],
    /// Protocol index and sample the markers were taken from, if not the
    /// specimen's initial state.
    pub source: Option<(usize, usize)>,
}

impl ReferencePolicy {
    /// Locate the reference markers for `protocols[target]`.
    ///
    /// # Arguments
    ///
    /// * `specimen` - Specimen geometry (used by [`ReferencePolicy::First`])
    /// * `protocols` - All protocols of the specimen
    /// * `target` - Position in `protocols` of the protocol being processed
    /// * `config` - Search window and preconditioning marker
    ///
    /// # Errors
    ///
    /// Returns [`BiaxError::ReferenceNotFound`] if no sample satisfies the
    /// policy's predicate within its search range, and
    /// [`BiaxError::InconsistentInput`] if a protocol scanned by
    /// [`ReferencePolicy::Auto`] fails validation.
    pub fn locate(
        self,
        specimen: &SpecimenGeometry,
        protocols: &[Protocol],
        target: usize,
        config: &AnalysisConfig,
    ) -> Result<ReferenceMarkers> {
        match self {
            Self::First => Ok(ReferenceMarkers {
                x: specimen.x_ref,
                y: specimen.y_ref,
                source: None,
            }),
            Self::Every => {
                let protocol = protocols.get(target).ok_or_else(|| {
                    BiaxError::reference_not_found(format!("no protocol at position {target}"))
                })?;
                let series = &protocol.series;
                let window = series.len().min(config.reference_window);
                (0..window)
                    .find(|&i| series.is_unstretched(i))
                    .map(|i| {
                        let (x, y) = series.frame(i);
                        ReferenceMarkers {
                            x: *x,
                            y: *y,
                            source: Some((protocol.index, i)),
                        }
                    })
                    .ok_or_else(|| {
                        BiaxError::reference_not_found(format!(
                            "protocol `{}` has no unit-stretch sample in its first {} samples",
                            protocol.name, config.reference_window
                        ))
                    })
            }
            Self::Auto => {
                let mut ordered: Vec<&Protocol> = protocols.iter().collect();
                ordered.sort_by_key(|p| p.index);
                for p in ordered {
                    if p.is_preconditioning(&config.precondition_marker) {
                        continue;
                    }
                    p.series.validate()?;
                    if let Some(i) = (0..p.series.len()).find(|&i| !p.series.is_recorded_preload(i)) {
                        let (x, y) = p.series.frame(i);
                        return Ok(ReferenceMarkers {
                            x: *x,
                            y: *y,
                            source: Some((p.index, i)),
                        });
                    }
                }
                Err(BiaxError::reference_not_found(
                    "every sample is preconditioning or preload",
                ))
            }
        }
    }
}
