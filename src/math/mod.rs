//! Mathematical utilities for planar kinematics.
//!
//! This module provides:
//! - [`tensor`]: closed-form 2x2 tensor algebra and the bilinear shape functions
//! - [`lstsq`]: the caller-owned least-squares solve behind the equilibrium method

pub mod lstsq;
pub mod tensor;

pub use lstsq::{solve_equilibrium, LstsqScratch};
pub use tensor::{
    det2, inverse2, natural_gradient, row_along, stretch_along, Tensor2, EX, EY, SHAPE_GRAD,
};
