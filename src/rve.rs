//! Specimen-dimension tracking.
//!
//! Converts raw forces to true stress requires the current cross sections
//! of the tested region. They are estimated from a second deformation
//! gradient referenced against the specimen's own initial markers (not the
//! per-protocol reference used for reporting), projecting the local
//! deformation onto the full specimen under a homogeneity assumption.

use crate::error::Result;
use crate::kinematics::{compute_kinematics, Kinematics};
use crate::math::tensor::{stretch_along, Tensor2, EX, EY};
use crate::reference::ReferenceConfiguration;
use crate::series::MarkerFrame;
use crate::specimen::SpecimenGeometry;

/// Per-sample effective dimensions of the tested region.
#[derive(Debug, Clone, PartialEq)]
pub struct DimensionTrack {
    /// Current length along x: `Lx0 * |F ex|`.
    pub lx: Vec<f64>,

    /// Current length along y: `Ly0 * |F ey|`.
    pub ly: Vec<f64>,

    /// Current thickness: `Lz0 / J`.
    pub lz: Vec<f64>,

    /// Inverse of the specimen-level deformation gradient, whose rows give
    /// the current face normals for the equilibrium solve.
    pub finv: Vec<Tensor2>,
}

impl DimensionTrack {
    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lx.len()
    }

    /// Whether there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lx.is_empty()
    }

    /// Current area of the face normal to x at sample `i`.
    #[must_use]
    pub fn area_x(&self, i: usize) -> f64 {
        self.ly[i] * self.lz[i]
    }

    /// Current area of the face normal to y at sample `i`.
    #[must_use]
    pub fn area_y(&self, i: usize) -> f64 {
        self.lx[i] * self.lz[i]
    }
}

/// Track the specimen dimensions over a marker series.
///
/// # Errors
///
/// Returns an error if the specimen's initial markers are degenerate or a
/// sample is singular with respect to them.
pub fn track_dimensions(
    specimen: &SpecimenGeometry,
    markers: &[MarkerFrame],
    singular_tol: f64,
) -> Result<DimensionTrack> {
    tracing::debug!(samples = markers.len(), "tracking specimen dimensions");
    let origin = ReferenceConfiguration::from_specimen(specimen)?;
    let kin = compute_kinematics(&origin, markers, singular_tol)?;
    Ok(track_from_kinematics(specimen, kin))
}

/// Dimension track from kinematics already referenced to the specimen.
#[must_use]
pub fn track_from_kinematics(specimen: &SpecimenGeometry, kin: Kinematics) -> DimensionTrack {
    let [lx0, ly0, lz0] = specimen.dims;
    let lx = kin.f.iter().map(|f| lx0 * stretch_along(f, EX)).collect();
    let ly = kin.f.iter().map(|f| ly0 * stretch_along(f, EY)).collect();
    let lz = kin.jacobian.iter().map(|&j| lz0 / j).collect();
    DimensionTrack {
        lx,
        ly,
        lz,
        finv: kin.finv,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn specimen() -> SpecimenGeometry {
        SpecimenGeometry::new(
            [10.0, 8.0, 0.4],
            [0.0, 0.0, 2.0, 2.0],
            [0.0, 2.0, 0.0, 2.0],
        )
        .unwrap()
    }

    #[test]
    fn test_equibiaxial_track() {
        let lam = 1.25;
        let frame = [[0.0, 0.0, 2.0 * lam, 2.0 * lam], [0.0, 2.0 * lam, 0.0, 2.0 * lam]];
        let track = track_dimensions(&specimen(), &[frame], 0.0).unwrap();
        assert_relative_eq!(track.lx[0], 10.0 * lam, epsilon = 1e-12);
        assert_relative_eq!(track.ly[0], 8.0 * lam, epsilon = 1e-12);
        assert_relative_eq!(track.lz[0], 0.4 / (lam * lam), epsilon = 1e-12);
        // Volume is preserved.
        assert_relative_eq!(
            track.lx[0] * track.ly[0] * track.lz[0],
            10.0 * 8.0 * 0.4,
            epsilon = 1e-10
        );
        assert_relative_eq!(track.finv[0][(0, 0)], 1.0 / lam, epsilon = 1e-12);
    }

    #[test]
    fn test_simple_shear_keeps_thickness() {
        // x' = x + 0.5 y: stretch along y grows, J stays 1.
        let frame = [[0.0, 1.0, 2.0, 3.0], [0.0, 2.0, 0.0, 2.0]];
        let track = track_dimensions(&specimen(), &[frame], 0.0).unwrap();
        assert_relative_eq!(track.lx[0], 10.0, epsilon = 1e-12);
        assert_relative_eq!(track.ly[0], 8.0 * 1.25_f64.sqrt(), epsilon = 1e-12);
        assert_relative_eq!(track.lz[0], 0.4, epsilon = 1e-12);
        assert_relative_eq!(track.area_x(0), track.ly[0] * 0.4, epsilon = 1e-12);
    }
}
