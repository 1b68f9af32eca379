//! Loading-phase segmentation and elapsed-time repair.
//!
//! Phases are attached to the output as metadata only; nothing downstream
//! feeds them back into the tensor computations.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Loading phase of one sample within a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Phase {
    /// Before the Jacobian minimum: slack removal and preload.
    #[default]
    Preload,
    /// Loading ramp up to the Jacobian maximum.
    Stretch,
    /// Held at peak load. Never assigned by [`parse_cycle`].
    Hold,
    /// Unloading after the Jacobian maximum.
    Recover,
}

impl Phase {
    /// Name without the cycle tag.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Preload => "Preload",
            Self::Stretch => "Stretch",
            Self::Hold => "Hold",
            Self::Recover => "Recover",
        }
    }

    /// Render as `"{tag}-{name}"`, e.g. `"2-Stretch"`.
    #[must_use]
    pub fn label(self, tag: &str) -> String {
        format!("{tag}-{}", self.name())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Classify each sample of a cycle from its Jacobian series.
///
/// The Jacobian minimum marks the start of loading and the maximum marks its
/// end. A minimum later than `guard` samples is taken as noise at the start
/// of the record and the preload segment is dropped. This guard is a fixed
/// heuristic: specimens with unusually long preload ramps are labelled
/// `Stretch` from sample 0.
///
/// Samples `[0, start)` are `Preload`, `[start, end)` are `Stretch` and
/// `[end, N)` are `Recover`. If the minimum follows the maximum the
/// `Stretch` segment is empty.
#[must_use]
pub fn parse_cycle(jacobian: &[f64], guard: usize) -> Vec<Phase> {
    if jacobian.is_empty() {
        return Vec::new();
    }

    let end = arg_extreme(jacobian, |candidate, best| candidate > best);
    let mut start = arg_extreme(jacobian, |candidate, best| candidate < best);
    if start > guard {
        tracing::debug!(start, guard, "jacobian minimum past preload guard, dropping preload");
        start = 0;
    }

    (0..jacobian.len())
        .map(|i| {
            if i >= end {
                Phase::Recover
            } else if i >= start {
                Phase::Stretch
            } else {
                Phase::Preload
            }
        })
        .collect()
}

/// First index whose value beats every earlier one under `better`.
fn arg_extreme(values: &[f64], better: impl Fn(f64, f64) -> bool) -> usize {
    let mut best = 0;
    for (i, &v) in values.iter().enumerate().skip(1) {
        if better(v, values[best]) {
            best = i;
        }
    }
    best
}

/// Repair a non-monotonic elapsed-time series.
///
/// Successive differences are taken against an implicit leading zero, so the
/// first difference is the first timestamp itself. Every negative difference
/// after the first is replaced by the last non-negative one, and the repaired differences are accumulated again. Only clock
/// rollovers and duplicated timestamps are expected to produce negative
/// deltas; genuinely reordered samples are not restored.
///
/// Applying the repair twice gives the same result as applying it once.
#[must_use]
pub fn fix_time(time: &[f64]) -> Vec<f64> {
    let mut out = Vec::with_capacity(time.len());
    let mut previous = 0.0;
    let mut last_valid = 0.0;
    let mut total = 0.0;
    let mut repaired = 0usize;

    for (i, &t) in time.iter().enumerate() {
        let mut dt = t - previous;
        previous = t;
        if dt >= 0.0 {
            last_valid = dt;
        } else if i > 0 {
            dt = last_valid;
            repaired += 1;
        }
        total += dt;
        out.push(total);
    }

    if repaired > 0 {
        tracing::warn!(repaired, "replaced negative time steps");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fix_time_example() {
        let fixed = fix_time(&[0.0, 1.0, 2.0, 1.5, 3.0]);
        let expected = [0.0, 1.0, 2.0, 3.0, 4.5];
        for (a, b) in fixed.iter().zip(expected.iter()) {
            assert_relative_eq!(a, b);
        }
    }

    #[test]
    fn test_fix_time_idempotent() {
        let raw = [0.5, 1.0, 0.2, 0.4, 0.4, 2.0, 1.0];
        let once = fix_time(&raw);
        let twice = fix_time(&once);
        for (a, b) in once.iter().zip(twice.iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-12);
        }
        assert!(once.windows(2).all(|w| w[1] >= w[0]));
    }

    #[test]
    fn test_fix_time_nonzero_start() {
        // The first step is the first timestamp; a drop right after it repeats it.
        let fixed = fix_time(&[5.0, 3.0, 4.0]);
        assert_eq!(fixed, vec![5.0, 10.0, 11.0]);
        assert_eq!(fix_time(&fixed), fixed);
    }

    #[test]
    fn test_fix_time_empty() {
        assert!(fix_time(&[]).is_empty());
    }

    #[test]
    fn test_parse_cycle_ramp() {
        // Minimum at 5, peak at 50, recovery afterwards.
        let mut j = vec![1.0; 80];
        for (i, v) in j.iter_mut().enumerate() {
            *v = if i < 5 {
                1.0 - 0.001 * i as f64
            } else if i <= 50 {
                0.995 + 0.01 * (i - 5) as f64
            } else {
                1.445 - 0.01 * (i - 50) as f64
            };
        }
        let phases = parse_cycle(&j, 20);
        assert!(phases[..5].iter().all(|&p| p == Phase::Preload));
        assert!(phases[5..50].iter().all(|&p| p == Phase::Stretch));
        assert!(phases[50..].iter().all(|&p| p == Phase::Recover));
    }

    #[test]
    fn test_parse_cycle_guard() {
        let mut j: Vec<f64> = (0..60).map(|i| 1.0 + 0.001 * i as f64).collect();
        j[25] = 0.5;
        j[40] = 2.0;
        let phases = parse_cycle(&j, 20);
        assert_eq!(phases[0], Phase::Stretch);
        assert!(!phases.contains(&Phase::Preload));
        assert_eq!(phases[39], Phase::Stretch);
        assert_eq!(phases[40], Phase::Recover);
    }

    #[test]
    fn test_parse_cycle_never_holds() {
        let j = [1.0, 0.9, 1.1, 1.3, 1.2];
        let phases = parse_cycle(&j, 20);
        assert!(!phases.contains(&Phase::Hold));
        assert!(parse_cycle(&[], 20).is_empty());
    }

    #[test]
    fn test_label() {
        assert_eq!(Phase::Stretch.label("2"), "2-Stretch");
        assert_eq!(Phase::Recover.to_string(), "Recover");
    }
}
