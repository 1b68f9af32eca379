//! Stress recovery under the three constitutive assumptions.
//!
//! Exactly one stress measure is built directly from the forces; the other
//! two follow from the shared convention
//!
//! - push-forward: `sigma = P F^T`, equivalently `P = sigma F^-T`
//! - nominal stress: `N = P^T`, so `sigma = F N` up to transposition
//! - pull-back: `S = F^-1 P`
//!
//! so every method hands out the same `(sigma, P, S)` triple.
//!
//! The equilibrium method balances tractions on the current unit face
//! normals against force per current area. Under the thickness update
//! `Lz = Lz0 / J` this is the same balance as `P ex = fx / (Ly0 Lz0)`, which
//! is why all three methods agree for pure stretch without shear.

use nalgebra::Matrix2;

use crate::config::{AnalysisConfig, StressMethod};
use crate::error::{BiaxError, Result};
use crate::kinematics::Kinematics;
use crate::math::lstsq::{solve_equilibrium, LstsqScratch};
use crate::math::tensor::Tensor2;
use crate::rve::track_dimensions;
use crate::series::SampleSeries;
use crate::specimen::SpecimenGeometry;

/// Stress measures of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct Kinetics {
    /// Cauchy stress.
    pub sigma: Vec<Tensor2>,

    /// First Piola–Kirchhoff stress.
    pub pk1: Vec<Tensor2>,

    /// Second Piola–Kirchhoff stress.
    pub pk2: Vec<Tensor2>,
}

impl Kinetics {
    /// Complete the triple from `sigma` and `P` by pulling back `S = F^-1 P`.
    fn assemble(sigma: Vec<Tensor2>, pk1: Vec<Tensor2>, kin: &Kinematics) -> Self {
        let pk2 = kin
            .finv
            .iter()
            .zip(pk1.iter())
            .map(|(finv, p)| finv * p)
            .collect();
        Self { sigma, pk1, pk2 }
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sigma.len()
    }

    /// Whether there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sigma.is_empty()
    }
}

/// Numerical settings shared by the stress methods.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StressSettings {
    /// Relative singular-value cutoff of the equilibrium solve.
    pub lstsq_eps: f64,
    /// Singular Jacobian tolerance for the specimen-level gradient.
    pub singular_tol: f64,
}

impl Default for StressSettings {
    fn default() -> Self {
        Self {
            lstsq_eps: 1e-12,
            singular_tol: 0.0,
        }
    }
}

impl From<&AnalysisConfig> for StressSettings {
    fn from(config: &AnalysisConfig) -> Self {
        Self {
            lstsq_eps: config.lstsq_eps,
            singular_tol: config.singular_tol,
        }
    }
}

impl StressMethod {
    /// Recover the stress triple for one series.
    ///
    /// # Arguments
    ///
    /// * `specimen` - Geometry supplying initial dimensions and markers
    /// * `kin` - Kinematics of the series relative to its reference
    /// * `series` - Raw samples (forces and markers)
    /// * `scratch` - Caller-owned buffer for the equilibrium solve
    /// * `settings` - Numerical tolerances
    ///
    /// # Errors
    ///
    /// Returns [`BiaxError::InconsistentInput`] if the kinematics and the
    /// series differ in length or a loaded face has zero cross section, and
    /// propagates singular samples from the dimension track.
    pub fn recover(
        self,
        specimen: &SpecimenGeometry,
        kin: &Kinematics,
        series: &SampleSeries,
        scratch: &mut LstsqScratch,
        settings: StressSettings,
    ) -> Result<Kinetics> {
        if kin.len() != series.len() {
            return Err(BiaxError::length_mismatch("kinematics", series.len(), kin.len()));
        }
        tracing::debug!(method = self.name(), samples = kin.len(), "computing kinetics");

        match self {
            Self::Cauchy => equilibrium(specimen, kin, series, scratch, settings),
            Self::FirstPiola => {
                let pk1 = initial_area_stress(specimen, series)?;
                let sigma = pk1
                    .iter()
                    .zip(kin.f.iter())
                    .map(|(p, f)| p * f.transpose())
                    .collect();
                Ok(Kinetics::assemble(sigma, pk1, kin))
            }
            Self::Nominal => {
                let nominal = initial_area_stress(specimen, series)?;
                let sigma = kin
                    .f
                    .iter()
                    .zip(nominal.iter())
                    .map(|(f, n)| f * n)
                    .collect();
                let pk1 = nominal.iter().map(|n| n.transpose()).collect();
                Ok(Kinetics::assemble(sigma, pk1, kin))
            }
        }
    }
}

/// Homogeneous-equilibrium Cauchy stress on the tracked dimensions.
fn equilibrium(
    specimen: &SpecimenGeometry,
    kin: &Kinematics,
    series: &SampleSeries,
    scratch: &mut LstsqScratch,
    settings: StressSettings,
) -> Result<Kinetics> {
    let track = track_dimensions(specimen, &series.markers, settings.singular_tol)?;

    let mut sigma = Vec::with_capacity(kin.len());
    for i in 0..kin.len() {
        let t1 = traction(series.force_x[i], track.area_x(i), i, "x")?;
        let t2 = traction(series.force_y[i], track.area_y(i), i, "y")?;
        let [sxx, sxy, syy] =
            solve_equilibrium(scratch, &track.finv[i], t1, t2, settings.lstsq_eps)?;
        sigma.push(Matrix2::new(sxx, sxy, sxy, syy));
    }

    let pk1 = sigma
        .iter()
        .zip(kin.finv.iter())
        .map(|(s, finv)| s * finv.transpose())
        .collect();
    Ok(Kinetics::assemble(sigma, pk1, kin))
}

/// Force per area, distinguishing an unloaded face from a missing one.
fn traction(force: f64, area: f64, index: usize, axis: &str) -> Result<f64> {
    if area != 0.0 && area.is_finite() {
        Ok(force / area)
    } else if force == 0.0 {
        Ok(0.0)
    } else {
        Err(BiaxError::inconsistent_input(format!(
            "sample {index} carries force {force} on a face normal to {axis} with area {area}"
        )))
    }
}

/// Diagonal stress from forces over the fixed initial cross sections.
fn initial_area_stress(specimen: &SpecimenGeometry, series: &SampleSeries) -> Result<Vec<Tensor2>> {
    let (ax, ay) = (specimen.area_x(), specimen.area_y());
    series
        .force_x
        .iter()
        .zip(series.force_y.iter())
        .enumerate()
        .map(|(i, (&fx, &fy))| {
            Ok(Matrix2::new(
                traction(fx, ax, i, "x")?,
                0.0,
                0.0,
                traction(fy, ay, i, "y")?,
            ))
        })
        .collect()
}
