//! Raw per-sample series for one protocol.
//!
//! A [`SampleSeries`] holds equal-length columns sharing one sample index.
//! Elapsed time is not required to be monotonic here; see
//! [`fix_time`](crate::phase::fix_time).

use crate::error::{BiaxError, Result};
use crate::phase::Phase;

/// Current marker positions of one sample: row 0 holds the x-coordinates,
/// row 1 the y-coordinates, one column per element node.
pub type MarkerFrame = [[f64; 4]; 2];

/// Default test-bath temperature recorded when the rig does not log one.
pub const DEFAULT_TEMPERATURE: f64 = 37.0;

/// Raw sample columns of one protocol.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SampleSeries {
    /// Elapsed time per sample.
    pub time: Vec<f64>,

    /// Grip stretch ratio along x.
    pub stretch_x: Vec<f64>,

    /// Grip stretch ratio along y.
    pub stretch_y: Vec<f64>,

    /// Applied force along x.
    pub force_x: Vec<f64>,

    /// Applied force along y.
    pub force_y: Vec<f64>,

    /// Bath temperature.
    pub temperature: Vec<f64>,

    /// Shear angle reported by the rig, in degrees.
    pub shear_deg: Vec<f64>,

    /// Marker coordinates in element node order.
    pub markers: Vec<MarkerFrame>,

    /// Phase labels already present in the input, if any.
    pub recorded_phase: Option<Vec<Phase>>,
}

impl SampleSeries {
    /// Build an unloaded, unstretched series from time and marker columns.
    ///
    /// Forces and shear start at zero, stretch ratios at one.
    #[must_use]
    pub fn from_markers(time: Vec<f64>, markers: Vec<MarkerFrame>) -> Self {
        let n = markers.len();
        Self {
            time,
            stretch_x: vec![1.0; n],
            stretch_y: vec![1.0; n],
            force_x: vec![0.0; n],
            force_y: vec![0.0; n],
            temperature: vec![DEFAULT_TEMPERATURE; n],
            shear_deg: vec![0.0; n],
            markers,
            recorded_phase: None,
        }
    }

    /// Replace the force columns.
    #[must_use]
    pub fn with_forces(mut self, force_x: Vec<f64>, force_y: Vec<f64>) -> Self {
        self.force_x = force_x;
        self.force_y = force_y;
        self
    }

    /// Replace the grip stretch columns.
    #[must_use]
    pub fn with_stretch(mut self, stretch_x: Vec<f64>, stretch_y: Vec<f64>) -> Self {
        self.stretch_x = stretch_x;
        self.stretch_y = stretch_y;
        self
    }

    /// Attach phase labels recorded by the rig.
    #[must_use]
    pub fn with_recorded_phase(mut self, phase: Vec<Phase>) -> Self {
        self.recorded_phase = Some(phase);
        self
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    /// Whether the series holds no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Marker x and y coordinates of sample `i`.
    #[must_use]
    pub fn frame(&self, i: usize) -> (&[f64; 4], &[f64; 4]) {
        (&self.markers[i][0], &self.markers[i][1])
    }

    /// Whether sample `i` sits at unit grip stretch in both directions.
    #[must_use]
    pub fn is_unstretched(&self, i: usize) -> bool {
        self.stretch_x[i] == 1.0 && self.stretch_y[i] == 1.0
    }

    /// Whether sample `i` was recorded as part of a preload segment.
    #[must_use]
    pub fn is_recorded_preload(&self, i: usize) -> bool {
        self.recorded_phase
            .as_ref()
            .and_then(|p| p.get(i))
            .is_some_and(|&p| p == Phase::Preload)
    }

    /// Validate column lengths and finiteness.
    ///
    /// # Errors
    ///
    /// Returns [`BiaxError::InconsistentInput`] if the series is empty, any
    /// column length differs from the marker column, or a marker, force or
    /// time value is not finite.
    pub fn validate(&self) -> Result<()> {
        let n = self.len();
        if n == 0 {
            return Err(BiaxError::inconsistent_input("series has no samples"));
        }

        let mut columns = vec![
            ("time", self.time.len()),
            ("stretch_x", self.stretch_x.len()),
            ("stretch_y", self.stretch_y.len()),
            ("force_x", self.force_x.len()),
            ("force_y", self.force_y.len()),
            ("temperature", self.temperature.len()),
            ("shear_deg", self.shear_deg.len()),
        ];
        if let Some(phase) = &self.recorded_phase {
            columns.push(("recorded_phase", phase.len()));
        }
        for (name, len) in columns {
            if len != n {
                return Err(BiaxError::length_mismatch(name, n, len));
            }
        }

        for (i, frame) in self.markers.iter().enumerate() {
            if frame.iter().flatten().any(|v| !v.is_finite()) {
                return Err(BiaxError::inconsistent_input(format!(
                    "non-finite marker coordinate at sample {i}"
                )));
            }
        }
        for (i, ((&t, &fx), &fy)) in self
            .time
            .iter()
            .zip(self.force_x.iter())
            .zip(self.force_y.iter())
            .enumerate()
        {
            if !(t.is_finite() && fx.is_finite() && fy.is_finite()) {
                return Err(BiaxError::inconsistent_input(format!(
                    "non-finite time or force at sample {i}"
                )));
            }
        }

        Ok(())
    }
}

/// One loading protocol of a specimen.
#[derive(Debug, Clone, PartialEq)]
pub struct Protocol {
    /// Position of the protocol in the test sequence.
    pub index: usize,

    /// Protocol name, e.g. `"1-1-1"` or `"0-precondition"`.
    pub name: String,

    /// Raw samples.
    pub series: SampleSeries,
}

impl Protocol {
    /// Create a protocol.
    #[must_use]
    pub fn new(index: usize, name: impl Into<String>, series: SampleSeries) -> Self {
        Self {
            index,
            name: name.into(),
            series,
        }
    }

    /// Whether the protocol name contains `marker`, ignoring case.
    #[must_use]
    pub fn is_preconditioning(&self, marker: &str) -> bool {
        self.name
            .to_lowercase()
            .contains(&marker.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> MarkerFrame {
        [[0.0, 0.0, 1.0, 1.0], [0.0, 1.0, 0.0, 1.0]]
    }

    #[test]
    fn test_from_markers_defaults() {
        let s = SampleSeries::from_markers(vec![0.0, 1.0], vec![square(); 2]);
        assert!(s.validate().is_ok());
        assert_eq!(s.len(), 2);
        assert!(s.is_unstretched(0));
        assert!(!s.is_recorded_preload(0));
    }

    #[test]
    fn test_recorded_preload_past_column_end() {
        let s = SampleSeries::from_markers(vec![0.0, 1.0, 2.0], vec![square(); 3])
            .with_recorded_phase(vec![Phase::Preload; 2]);
        assert!(s.is_recorded_preload(1));
        assert!(!s.is_recorded_preload(2));
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_length_mismatch() {
        let s = SampleSeries::from_markers(vec![0.0, 1.0], vec![square(); 2])
            .with_forces(vec![0.0], vec![0.0, 0.0]);
        let err = s.validate().unwrap_err();
        assert!(err.to_string().contains("force_x"));
    }

    #[test]
    fn test_empty_and_non_finite() {
        assert!(SampleSeries::default().validate().is_err());

        let mut frame = square();
        frame[1][2] = f64::INFINITY;
        let s = SampleSeries::from_markers(vec![0.0], vec![frame]);
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_preconditioning_name() {
        let p = Protocol::new(0, "0-Preconditioning", SampleSeries::default());
        assert!(p.is_preconditioning("precond"));
        let p = Protocol::new(1, "1-1-1", SampleSeries::default());
        assert!(!p.is_preconditioning("precond"));
    }
}
