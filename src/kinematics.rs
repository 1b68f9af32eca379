//! Deformation gradient and derived kinematic measures.
//!
//! # Pipeline
//!
//! 1. Contract each sample's marker coordinates with the bilinear
//!    shape-function gradients (spatial gradient in natural coordinates)
//! 2. Right-multiply by the reference tensor to obtain `F`
//! 3. Derive `J = det F`, the cofactor inverse and `C = F^T F`
//!
//! Every sample is independent, so the batch is evaluated in parallel.

use nalgebra::Vector2;
use rayon::prelude::*;

use crate::error::{BiaxError, Result};
use crate::math::tensor::{det2, inverse2, natural_gradient, Tensor2, EX, EY};
use crate::reference::ReferenceConfiguration;
use crate::series::MarkerFrame;

/// Per-sample deformation gradient of a marker series.
#[must_use]
pub fn deformation_gradient(
    reference: &ReferenceConfiguration,
    markers: &[MarkerFrame],
) -> Vec<Tensor2> {
    let r = *reference.tensor();
    markers
        .par_iter()
        .map(|frame| natural_gradient(&frame[0], &frame[1]) * r)
        .collect()
}

/// Kinematic measures of one series.
#[derive(Debug, Clone, PartialEq)]
pub struct Kinematics {
    /// Deformation gradient `F`.
    pub f: Vec<Tensor2>,

    /// Closed-form inverse of `F`.
    pub finv: Vec<Tensor2>,

    /// Area ratio `J = det F`.
    pub jacobian: Vec<f64>,

    /// Right Cauchy–Green tensor `C = F^T F`.
    pub right_cauchy_green: Vec<Tensor2>,
}

impl Kinematics {
    /// Derive the inverse, Jacobian and right Cauchy–Green tensor from `F`.
    ///
    /// # Arguments
    ///
    /// * `f` - Deformation gradient per sample
    /// * `singular_tol` - Samples with `|J| <= singular_tol` are rejected
    ///
    /// # Errors
    ///
    /// Returns [`BiaxError::SingularSample`] for the first sample whose
    /// Jacobian is zero (within tolerance) or not finite.
    pub fn from_gradient(f: Vec<Tensor2>, singular_tol: f64) -> Result<Self> {
        let jacobian: Vec<f64> = f.iter().map(det2).collect();

        if let Some((index, &j)) = jacobian
            .iter()
            .enumerate()
            .find(|(_, j)| !j.is_finite() || j.abs() <= singular_tol)
        {
            return Err(BiaxError::singular_sample(index, j));
        }

        let finv = f
            .iter()
            .zip(jacobian.iter())
            .map(|(f, &j)| inverse2(f, j))
            .collect();
        let right_cauchy_green = f.iter().map(|f| f.transpose() * f).collect();

        let kin = Self {
            f,
            finv,
            jacobian,
            right_cauchy_green,
        };

        let inverted = kin.inverted_samples();
        if !inverted.is_empty() {
            tracing::warn!(
                count = inverted.len(),
                first = inverted[0],
                "negative jacobian: reference and current marker layouts have opposite orientation"
            );
        }

        Ok(kin)
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.f.len()
    }

    /// Whether there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.f.is_empty()
    }

    /// Indices of samples with `J < 0`.
    ///
    /// A negative Jacobian is physically invalid (the element is turned
    /// inside out) and should be flagged as a data-quality problem.
    #[must_use]
    pub fn inverted_samples(&self) -> Vec<usize> {
        self.jacobian
            .iter()
            .enumerate()
            .filter(|&(_, &j)| j < 0.0)
            .map(|(i, _)| i)
            .collect()
    }
}

/// Compute the full kinematic set for a marker series.
///
/// # Errors
///
/// Returns [`BiaxError::SingularSample`] if any sample is singular.
pub fn compute_kinematics(
    reference: &ReferenceConfiguration,
    markers: &[MarkerFrame],
    singular_tol: f64,
) -> Result<Kinematics> {
    tracing::debug!(samples = markers.len(), "computing kinematics");
    Kinematics::from_gradient(deformation_gradient(reference, markers), singular_tol)
}

/// Shear angle in degrees between the deformed basis vectors `F ex` and `F ey`.
///
/// Zero for an undeformed or purely stretched sample; positive when the
/// angle between the deformed axes closes below 90 degrees.
#[must_use]
pub fn shear_angle(f: &[Tensor2]) -> Vec<f64> {
    let ex = Vector2::new(EX[0], EX[1]);
    let ey = Vector2::new(EY[0], EY[1]);
    f.iter()
        .map(|f| {
            let a = f * ex;
            let b = f * ey;
            let cos = (a.dot(&b) / a.norm() / b.norm()).clamp(-1.0, 1.0);
            180.0 * (0.5 - cos.acos() / std::f64::consts::PI)
        })
        .collect()
}
