//! Least-squares solve for the homogeneous-equilibrium stress method.
//!
//! Each sample gives four equations (traction balance on the two loaded
//! faces) in the three independent in-plane Cauchy components
//! `[sxx, sxy, syy]`. The system is solved through an SVD with a relative
//! singular-value cutoff, so rank deficiency yields a minimum-norm best fit
//! instead of an error.

use nalgebra::{Matrix4x3, Vector2, Vector3, Vector4};

use crate::error::{BiaxError, Result};
use crate::math::tensor::{row_along, Tensor2, EX, EY};

/// Caller-owned coefficient storage for [`solve_equilibrium`].
///
/// One scratch per worker; it is overwritten on every call.
#[derive(Debug, Clone)]
pub struct LstsqScratch {
    a: Matrix4x3<f64>,
    b: Vector4<f64>,
}

impl Default for LstsqScratch {
    fn default() -> Self {
        Self {
            a: Matrix4x3::zeros(),
            b: Vector4::zeros(),
        }
    }
}

impl LstsqScratch {
    /// Create a zeroed scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// Solve the four-equation equilibrium system for one sample.
///
/// # Arguments
///
/// * `scratch` - Reused coefficient storage
/// * `finv` - Inverse deformation gradient of the sample
/// * `t1` - Traction on the face normal to x (force per current area)
/// * `t2` - Traction on the face normal to y
/// * `eps` - Relative singular-value cutoff
///
/// # Returns
///
/// `[sxx, sxy, syy]`.
///
/// # Errors
///
/// Returns an error if a face normal degenerates to zero length.
pub fn solve_equilibrium(
    scratch: &mut LstsqScratch,
    finv: &Tensor2,
    t1: f64,
    t2: f64,
    eps: f64,
) -> Result<[f64; 3]> {
    let n1 = unit_normal(finv, EX)?;
    let n2 = unit_normal(finv, EY)?;

    scratch.a.fill(0.0);
    scratch.a[(0, 0)] = n1[0];
    scratch.a[(0, 1)] = n1[1];
    scratch.a[(1, 1)] = n1[0];
    scratch.a[(1, 2)] = n1[1];
    scratch.a[(2, 0)] = n2[0];
    scratch.a[(2, 1)] = n2[1];
    scratch.a[(3, 1)] = n2[0];
    scratch.a[(3, 2)] = n2[1];
    scratch.b = Vector4::new(t1, 0.0, 0.0, t2);

    let svd = scratch.a.svd(true, true);
    let cutoff = eps * svd.singular_values.max();
    let x: Vector3<f64> = svd
        .solve(&scratch.b, cutoff)
        .map_err(BiaxError::inconsistent_input)?;
    Ok([x[0], x[1], x[2]])
}

/// Current unit normal of the face whose reference normal is `axis`.
fn unit_normal(finv: &Tensor2, axis: [f64; 2]) -> Result<Vector2<f64>> {
    let n = row_along(finv, axis);
    let norm = n.norm();
    if !(norm > 0.0 && norm.is_finite()) {
        return Err(BiaxError::inconsistent_input(format!(
            "face normal along {axis:?} has degenerate length {norm}"
        )));
    }
    Ok(n / norm)
}
