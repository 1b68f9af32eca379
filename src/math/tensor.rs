//! Closed-form 2x2 tensor operations.
//!
//! All tensors are `nalgebra::Matrix2<f64>` indexed `(row, col)`. Inversion
//! uses the cofactor formula rather than a general factorization so the
//! determinant is available to the caller for singularity checks.

use nalgebra::{Matrix2, Vector2};

/// Planar second-order tensor.
pub type Tensor2 = Matrix2<f64>;

/// Bilinear quadrilateral shape-function derivatives at the element center.
///
/// Row 0 is `dN/dr`, row 1 is `dN/ds`, one column per node. Nodes are ordered
/// `(r, s) = (-1,-1), (-1,1), (1,-1), (1,1)`.
pub const SHAPE_GRAD: [[f64; 4]; 2] = [
    [-0.25, -0.25, 0.25, 0.25],
    [-0.25, 0.25, -0.25, 0.25],
];

/// Unit vector along the x testing direction.
pub const EX: [f64; 2] = [1.0, 0.0];

/// Unit vector along the y testing direction.
pub const EY: [f64; 2] = [0.0, 1.0];

/// Gradient of nodal coordinates with respect to the natural coordinates.
///
/// Returns `[[dx/dr, dx/ds], [dy/dr, dy/ds]]`.
#[must_use]
pub fn natural_gradient(x: &[f64; 4], y: &[f64; 4]) -> Tensor2 {
    let dot = |a: &[f64; 4], b: &[f64; 4]| a[0] * b[0] + a[1] * b[1] + a[2] * b[2] + a[3] * b[3];
    Matrix2::new(
        dot(x, &SHAPE_GRAD[0]),
        dot(x, &SHAPE_GRAD[1]),
        dot(y, &SHAPE_GRAD[0]),
        dot(y, &SHAPE_GRAD[1]),
    )
}

/// Determinant `F00*F11 - F01*F10`.
#[must_use]
#[inline]
pub fn det2(f: &Tensor2) -> f64 {
    f[(0, 0)] * f[(1, 1)] - f[(0, 1)] * f[(1, 0)]
}

/// Cofactor inverse given a precomputed determinant.
///
/// The caller is responsible for rejecting `det == 0`.
#[must_use]
#[inline]
pub fn inverse2(f: &Tensor2, det: f64) -> Tensor2 {
    Matrix2::new(
        f[(1, 1)] / det,
        -f[(0, 1)] / det,
        -f[(1, 0)] / det,
        f[(0, 0)] / det,
    )
}

/// Euclidean norm of `F` applied to a unit axis.
#[must_use]
#[inline]
pub fn stretch_along(f: &Tensor2, axis: [f64; 2]) -> f64 {
    (f * Vector2::new(axis[0], axis[1])).norm()
}

/// Row `axis^T * A` of a tensor, i.e. `A^T * axis`.
#[must_use]
#[inline]
pub fn row_along(a: &Tensor2, axis: [f64; 2]) -> Vector2<f64> {
    a.transpose() * Vector2::new(axis[0], axis[1])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_natural_gradient_unit_square() {
        let x = [0.0, 0.0, 1.0, 1.0];
        let y = [0.0, 1.0, 0.0, 1.0];
        let g = natural_gradient(&x, &y);
        assert_relative_eq!(g[(0, 0)], 0.5);
        assert_relative_eq!(g[(0, 1)], 0.0);
        assert_relative_eq!(g[(1, 0)], 0.0);
        assert_relative_eq!(g[(1, 1)], 0.5);
    }

    #[test]
    fn test_inverse_round_trip() {
        let f = Matrix2::new(1.2, 0.3, -0.1, 0.9);
        let det = det2(&f);
        assert_relative_eq!(det, 1.2 * 0.9 + 0.3 * 0.1, epsilon = 1e-15);
        let product = f * inverse2(&f, det);
        assert_relative_eq!(product, Matrix2::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_stretch_and_row() {
        let f = Matrix2::new(3.0, 0.0, 4.0, 2.0);
        assert_relative_eq!(stretch_along(&f, EX), 5.0);
        assert_relative_eq!(stretch_along(&f, EY), 2.0);
        let r = row_along(&f, EY);
        assert_relative_eq!(r[0], 4.0);
        assert_relative_eq!(r[1], 2.0);
    }
}
