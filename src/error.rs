//! Error types for biaxial kinematics and stress recovery.
//!
//! Every error raised here is fatal for one unit of work (one specimen) and
//! is never downgraded to a NaN or zero entry in the output.

use thiserror::Error;

/// Main error type for biaxial analysis operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BiaxError {
    /// Degenerate or zero-determinant reference marker configuration.
    #[error("Degenerate reference geometry: {0}")]
    Geometry(String),

    /// Zero or non-finite Jacobian at a sample.
    #[error("Singular deformation gradient at sample {index}: J = {jacobian}")]
    SingularSample { index: usize, jacobian: f64 },

    /// Reference-instant search exhausted without a match.
    #[error("Reference configuration not found: {0}")]
    ReferenceNotFound(String),

    /// Mismatched array lengths or a loaded sample with no cross section.
    #[error("Inconsistent input: {0}")]
    InconsistentInput(String),

    /// Initial thickness could not be recovered from the data.
    #[error("Cannot infer specimen dimensions: {0}")]
    DimensionInference(String),

    /// Configuration validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for biaxial analysis operations.
pub type Result<T> = std::result::Result<T, BiaxError>;

impl BiaxError {
    /// Create a geometry error.
    #[must_use]
    pub fn geometry(msg: impl Into<String>) -> Self {
        Self::Geometry(msg.into())
    }

    /// Create a singular sample error.
    #[must_use]
    pub const fn singular_sample(index: usize, jacobian: f64) -> Self {
        Self::SingularSample { index, jacobian }
    }

    /// Create a reference-not-found error.
    #[must_use]
    pub fn reference_not_found(msg: impl Into<String>) -> Self {
        Self::ReferenceNotFound(msg.into())
    }

    /// Create an inconsistent input error.
    #[must_use]
    pub fn inconsistent_input(msg: impl Into<String>) -> Self {
        Self::InconsistentInput(msg.into())
    }

    /// Create an inconsistent input error for two columns of different length.
    #[must_use]
    pub fn length_mismatch(column: &str, expected: usize, actual: usize) -> Self {
        Self::InconsistentInput(format!(
            "column `{column}` has {actual} samples, expected {expected}"
        ))
    }

    /// Create a dimension inference error.
    #[must_use]
    pub fn dimension_inference(msg: impl Into<String>) -> Self {
        Self::DimensionInference(msg.into())
    }

    /// Create an invalid configuration error.
    #[must_use]
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}
