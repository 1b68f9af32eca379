//! Configuration for a biaxial analysis pass.
//!
//! [`AnalysisConfig`] gathers the selectors and thresholds that every
//! specimen in a batch shares, along with presets matching the three
//! stress-recovery conventions.
//!
//! # Example
//!
//! ```
//! use planar_biax::{AnalysisConfig, ReferencePolicy, StressMethod};
//!
//! let config = AnalysisConfig::raw().with_reference_policy(ReferencePolicy::First);
//! assert_eq!(config.stress_method, StressMethod::FirstPiola);
//! assert!(config.validate().is_ok());
//! ```

use crate::error::{BiaxError, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Constitutive assumption used to turn applied forces into stress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum StressMethod {
    /// Homogeneous-equilibrium least squares on the current dimensions.
    /// The only method that needs the specimen dimension track.
    #[default]
    Cauchy,
    /// First Piola–Kirchhoff stress from fixed initial cross sections.
    FirstPiola,
    /// Nominal (engineering) stress from fixed initial cross sections.
    Nominal,
}

impl StressMethod {
    /// Short name used in log lines and export names.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Cauchy => "CAUCHY",
            Self::FirstPiola => "PK1",
            Self::Nominal => "NOMINAL",
        }
    }
}

/// Which sample defines the undeformed reference configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ReferencePolicy {
    /// The specimen's very first sample, shared by every protocol.
    First,
    /// Re-solved per protocol: the first unit-stretch sample of that protocol.
    #[default]
    Every,
    /// First sample across the whole specimen outside preconditioning
    /// protocols and recorded preload segments.
    Auto,
}

/// Configuration for biaxial kinematics and stress recovery.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnalysisConfig {
    /// Selected stress-recovery method.
    pub stress_method: StressMethod,

    /// Reference-instant selection policy.
    pub reference_policy: ReferencePolicy,

    /// Number of leading samples searched by [`ReferencePolicy::Every`].
    pub reference_window: usize,

    /// A Jacobian minimum later than this sample index is treated as noise
    /// and the preload segment is dropped.
    pub preload_guard: usize,

    /// Case-insensitive substring marking preconditioning protocol names.
    pub precondition_marker: String,

    /// Samples with `|J| <= singular_tol` are rejected as singular.
    pub singular_tol: f64,

    /// Relative singular-value cutoff for the equilibrium least-squares solve.
    pub lstsq_eps: f64,

    /// Fixed prefix for rendered phase labels. When `None`, each protocol
    /// is tagged with its 1-based position in index order, e.g. `"2-Stretch"`.
    pub cycle_tag: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            stress_method: StressMethod::Cauchy,
            reference_policy: ReferencePolicy::Every,
            reference_window: 20,
            preload_guard: 20,
            precondition_marker: "precond".to_string(),
            singular_tol: 0.0,
            lstsq_eps: 1e-12,
            cycle_tag: None,
        }
    }
}

impl AnalysisConfig {
    /// Create a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any parameter is out of valid range.
    pub fn validate(&self) -> Result<()> {
        if self.reference_window == 0 {
            return Err(BiaxError::invalid_config(
                "reference_window must be at least 1",
            ));
        }
        if !(self.singular_tol >= 0.0 && self.singular_tol.is_finite()) {
            return Err(BiaxError::invalid_config(
                "singular_tol must be finite and non-negative",
            ));
        }
        if !(self.lstsq_eps >= 0.0 && self.lstsq_eps.is_finite()) {
            return Err(BiaxError::invalid_config(
                "lstsq_eps must be finite and non-negative",
            ));
        }
        if self.precondition_marker.is_empty()
            && self.reference_policy == ReferencePolicy::Auto
        {
            return Err(BiaxError::invalid_config(
                "precondition_marker must not be empty for the auto reference policy",
            ));
        }
        Ok(())
    }

    /// Preset producing corrected (equilibrium) Cauchy stress.
    #[must_use]
    pub fn corrected() -> Self {
        Self {
            stress_method: StressMethod::Cauchy,
            ..Self::default()
        }
    }

    /// Preset producing raw first Piola–Kirchhoff stress.
    #[must_use]
    pub fn raw() -> Self {
        Self {
            stress_method: StressMethod::FirstPiola,
            ..Self::default()
        }
    }

    /// Preset producing nominal stress.
    #[must_use]
    pub fn nominal() -> Self {
        Self {
            stress_method: StressMethod::Nominal,
            ..Self::default()
        }
    }

    /// Set the stress method.
    #[must_use]
    pub const fn with_stress_method(mut self, method: StressMethod) -> Self {
        self.stress_method = method;
        self
    }

    /// Set the reference policy.
    #[must_use]
    pub const fn with_reference_policy(mut self, policy: ReferencePolicy) -> Self {
        self.reference_policy = policy;
        self
    }

    /// Set the reference search window.
    #[must_use]
    pub const fn with_reference_window(mut self, window: usize) -> Self {
        self.reference_window = window;
        self
    }

    /// Set the preload guard threshold.
    #[must_use]
    pub const fn with_preload_guard(mut self, guard: usize) -> Self {
        self.preload_guard = guard;
        self
    }

    /// Set the singular Jacobian tolerance.
    #[must_use]
    pub const fn with_singular_tol(mut self, tol: f64) -> Self {
        self.singular_tol = tol;
        self
    }

    /// Override the per-protocol cycle tag with a fixed one.
    #[must_use]
    pub fn with_cycle_tag(mut self, tag: impl Into<String>) -> Self {
        self.cycle_tag = Some(tag.into());
        self
    }

    /// Tag for the protocol at 0-based `position` in index order.
    #[must_use]
    pub fn cycle_tag_for(&self, position: usize) -> String {
        self.cycle_tag
            .clone()
            .unwrap_or_else(|| (position + 1).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AnalysisConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stress_method, StressMethod::Cauchy);
        assert_eq!(config.reference_policy, ReferencePolicy::Every);
        assert_eq!(config.preload_guard, 20);
    }

    #[test]
    fn test_presets() {
        assert_eq!(AnalysisConfig::corrected().stress_method, StressMethod::Cauchy);
        assert_eq!(AnalysisConfig::raw().stress_method, StressMethod::FirstPiola);
        assert_eq!(AnalysisConfig::nominal().stress_method, StressMethod::Nominal);
    }

    #[test]
    fn test_validation() {
        let mut config = AnalysisConfig::default();

        config.reference_window = 0;
        assert!(config.validate().is_err());

        config.reference_window = 20;
        config.singular_tol = -1.0;
        assert!(config.validate().is_err());

        config.singular_tol = 0.0;
        config.lstsq_eps = f64::NAN;
        assert!(config.validate().is_err());

        config.lstsq_eps = 1e-12;
        config.reference_policy = ReferencePolicy::Auto;
        config.precondition_marker.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_builder_pattern() {
        let config = AnalysisConfig::nominal()
            .with_reference_policy(ReferencePolicy::Auto)
            .with_preload_guard(30)
            .with_cycle_tag("3");
        assert_eq!(config.reference_policy, ReferencePolicy::Auto);
        assert_eq!(config.preload_guard, 30);
        assert_eq!(config.cycle_tag_for(0), "3");
        assert_eq!(config.cycle_tag_for(4), "3");
    }

    #[test]
    fn test_cycle_tag_follows_position() {
        let config = AnalysisConfig::default();
        assert!(config.cycle_tag.is_none());
        assert_eq!(config.cycle_tag_for(0), "1");
        assert_eq!(config.cycle_tag_for(2), "3");
    }
}
