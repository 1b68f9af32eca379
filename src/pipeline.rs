//! Per-protocol, per-specimen and batch orchestration.
//!
//! # Pipeline Overview
//!
//! 1. Validate the raw series and locate the reference markers
//! 2. Solve the reference tensor and compute kinematics
//! 3. Recover the stress triple with the configured method
//! 4. Compute shear angles and phase labels
//! 5. Concatenate protocols by index and repair the time column
//!
//! Protocols of one specimen are independent and run in parallel; specimens
//! of a batch are independent units whose failures never affect siblings.

use rayon::prelude::*;

use crate::config::AnalysisConfig;
use crate::error::{BiaxError, Result};
use crate::kinematics::{compute_kinematics, shear_angle, Kinematics};
use crate::math::lstsq::LstsqScratch;
use crate::phase::{fix_time, parse_cycle, Phase};
use crate::reference::ReferenceConfiguration;
use crate::series::Protocol;
use crate::specimen::SpecimenGeometry;
use crate::stress::{Kinetics, StressSettings};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Everything computed for one protocol.
#[derive(Debug, Clone)]
pub struct ProtocolResult {
    /// Protocol index within the specimen.
    pub index: usize,

    /// Protocol name.
    pub name: String,

    /// Kinematics relative to the selected reference.
    pub kinematics: Kinematics,

    /// Stress triple.
    pub kinetics: Kinetics,

    /// Shear angle per sample, in degrees.
    pub shear_deg: Vec<f64>,

    /// Phase label per sample.
    pub phases: Vec<Phase>,
}

/// Process one protocol of a specimen.
///
/// # Arguments
///
/// * `specimen` - Specimen geometry
/// * `protocols` - All protocols of the specimen (reference policies may
///   look beyond the target)
/// * `target` - Position in `protocols` of the protocol to process
/// * `config` - Analysis configuration
///
/// # Errors
///
/// Propagates any error raised while validating, locating the reference,
/// or computing kinematics and stress.
pub fn process_protocol(
    specimen: &SpecimenGeometry,
    protocols: &[Protocol],
    target: usize,
    config: &AnalysisConfig,
) -> Result<ProtocolResult> {
    let protocol = protocols.get(target).ok_or_else(|| {
        BiaxError::inconsistent_input(format!("no protocol at position {target}"))
    })?;
    let series = &protocol.series;
    tracing::info!(protocol = %protocol.name, samples = series.len(), "processing protocol");
    series.validate()?;

    let markers = config
        .reference_policy
        .locate(specimen, protocols, target, config)?;
    tracing::debug!(source = ?markers.source, "reference markers located");
    let reference = ReferenceConfiguration::new(&markers.x, &markers.y)?;

    let kinematics = compute_kinematics(&reference, &series.markers, config.singular_tol)?;

    let mut scratch = LstsqScratch::new();
    let kinetics = config.stress_method.recover(
        specimen,
        &kinematics,
        series,
        &mut scratch,
        StressSettings::from(config),
    )?;

    tracing::debug!("computing shear angle");
    let shear_deg = shear_angle(&kinematics.f);
    tracing::debug!("finding loading and unloading points");
    let phases = parse_cycle(&kinematics.jacobian, config.preload_guard);

    Ok(ProtocolResult {
        index: protocol.index,
        name: protocol.name.clone(),
        kinematics,
        kinetics,
        shear_deg,
        phases,
    })
}

/// One output row per sample, mirroring the exported table layout.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OutputRecord {
    /// Protocol name.
    #[cfg_attr(feature = "serde", serde(rename = "SetName"))]
    pub set_name: String,
    /// Phase label prefixed with the cycle tag, e.g. `"2-Stretch"`.
    #[cfg_attr(feature = "serde", serde(rename = "Cycle"))]
    pub cycle: String,
    /// Repaired elapsed time in seconds, monotone across the specimen.
    #[cfg_attr(feature = "serde", serde(rename = "Time_S"))]
    pub time_s: f64,
    /// Current grip-to-grip size along x in µm.
    #[cfg_attr(feature = "serde", serde(rename = "XSize_um"))]
    pub x_size_um: f64,
    /// Current grip-to-grip size along y in µm.
    #[cfg_attr(feature = "serde", serde(rename = "YSize_um"))]
    pub y_size_um: f64,
    /// Size change along x since the protocol's first sample, in µm.
    #[cfg_attr(feature = "serde", serde(rename = "XDisplacement_um"))]
    pub x_displacement_um: f64,
    /// Size change along y since the protocol's first sample, in µm.
    #[cfg_attr(feature = "serde", serde(rename = "YDisplacement_um"))]
    pub y_displacement_um: f64,
    /// Applied force along x in mN.
    #[cfg_attr(feature = "serde", serde(rename = "XForce_mN"))]
    pub x_force: f64,
    /// Applied force along y in mN.
    #[cfg_attr(feature = "serde", serde(rename = "YForce_mN"))]
    pub y_force: f64,
    /// Bath temperature in degrees Celsius.
    #[cfg_attr(feature = "serde", serde(rename = "Temperature"))]
    pub temperature: f64,
    /// Marker x-coordinates, element node order.
    pub x: [f64; 4],
    /// Marker y-coordinates, element node order.
    pub y: [f64; 4],
    /// Deformation gradient `F00`.
    pub lx: f64,
    /// Deformation gradient `F01`.
    pub kx: f64,
    /// Deformation gradient `F10`.
    pub ky: f64,
    /// Deformation gradient `F11`.
    pub ly: f64,
    /// First Piola–Kirchhoff `P00`, force over initial area (mN/mm²).
    pub txx: f64,
    /// First Piola–Kirchhoff `P01`.
    pub txy: f64,
    /// First Piola–Kirchhoff `P10`.
    pub tyx: f64,
    /// First Piola–Kirchhoff `P11`.
    pub tyy: f64,
    /// Cauchy `sigma00`, force over current area (mN/mm²).
    pub sxx: f64,
    /// Cauchy `sigma01`.
    pub sxy: f64,
    /// Cauchy `sigma10`.
    pub syx: f64,
    /// Cauchy `sigma11`.
    pub syy: f64,
    /// Second Piola–Kirchhoff `[S00, S01, S10, S11]` (mN/mm²).
    pub pk2: [f64; 4],
    /// Deviation of the deformed axes from a right angle, in degrees.
    #[cfg_attr(feature = "serde", serde(rename = "ShearAngleDeg"))]
    pub shear_angle_deg: f64,
}

/// All protocols of a specimen, assembled in protocol order.
#[derive(Debug, Clone)]
pub struct SpecimenResult {
    /// Per-protocol results sorted by protocol index.
    pub protocols: Vec<ProtocolResult>,

    /// Flat rows across all protocols with the repaired time column.
    pub records: Vec<OutputRecord>,
}

/// Process every protocol of a specimen and assemble the output table.
///
/// # Errors
///
/// Returns the first error raised by any protocol; the whole specimen is
/// the unit of failure. Every protocol is validated before any is processed.
pub fn process_specimen(
    specimen: &SpecimenGeometry,
    protocols: &[Protocol],
    config: &AnalysisConfig,
) -> Result<SpecimenResult> {
    config.validate()?;
    for protocol in protocols {
        protocol.series.validate()?;
    }

    let mut results = (0..protocols.len())
        .into_par_iter()
        .map(|target| process_protocol(specimen, protocols, target, config))
        .collect::<Result<Vec<_>>>()?;
    results.sort_by_key(|r| r.index);

    let mut ordered: Vec<&Protocol> = protocols.iter().collect();
    ordered.sort_by_key(|p| p.index);

    let raw_time: Vec<f64> = ordered
        .iter()
        .flat_map(|p| p.series.time.iter().copied())
        .collect();
    tracing::debug!("fixing time array to always increasing");
    let time = fix_time(&raw_time);

    let mut records = Vec::with_capacity(time.len());
    for (position, (protocol, result)) in ordered.iter().zip(results.iter()).enumerate() {
        let tag = config.cycle_tag_for(position);
        append_records(specimen, protocol, result, &tag, &time[records.len()..], &mut records);
    }

    Ok(SpecimenResult {
        protocols: results,
        records,
    })
}

fn append_records(
    specimen: &SpecimenGeometry,
    protocol: &Protocol,
    result: &ProtocolResult,
    tag: &str,
    time: &[f64],
    out: &mut Vec<OutputRecord>,
) {
    let s = &protocol.series;
    let x_size = |i: usize| 1000.0 * specimen.dims[0] * s.stretch_x[i];
    let y_size = |i: usize| 1000.0 * specimen.dims[1] * s.stretch_y[i];

    for i in 0..s.len() {
        let f = &result.kinematics.f[i];
        let p = &result.kinetics.pk1[i];
        let sigma = &result.kinetics.sigma[i];
        let pk2 = &result.kinetics.pk2[i];
        out.push(OutputRecord {
            set_name: protocol.name.clone(),
            cycle: result.phases[i].label(tag),
            time_s: time[i],
            x_size_um: x_size(i),
            y_size_um: y_size(i),
            x_displacement_um: x_size(i) - x_size(0),
            y_displacement_um: y_size(i) - y_size(0),
            x_force: s.force_x[i],
            y_force: s.force_y[i],
            temperature: s.temperature[i],
            x: s.markers[i][0],
            y: s.markers[i][1],
            lx: f[(0, 0)],
            kx: f[(0, 1)],
            ky: f[(1, 0)],
            ly: f[(1, 1)],
            txx: p[(0, 0)],
            txy: p[(0, 1)],
            tyx: p[(1, 0)],
            tyy: p[(1, 1)],
            sxx: sigma[(0, 0)],
            sxy: sigma[(0, 1)],
            syx: sigma[(1, 0)],
            syy: sigma[(1, 1)],
            pk2: [pk2[(0, 0)], pk2[(0, 1)], pk2[(1, 0)], pk2[(1, 1)]],
            shear_angle_deg: result.shear_deg[i],
        });
    }
}

/// One specimen to process in a batch.
#[derive(Debug, Clone)]
pub struct SpecimenJob {
    /// Name used in log lines, usually the specimen directory.
    pub name: String,
    /// Specimen geometry.
    pub specimen: SpecimenGeometry,
    /// Protocols of the specimen.
    pub protocols: Vec<Protocol>,
}

/// Outcome of one batch unit.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Job name.
    pub name: String,
    /// Result of the unit; an error here affects no other unit.
    pub result: Result<SpecimenResult>,
}

/// Process independent specimens in parallel.
///
/// Each specimen is one unit of work. A failing unit is logged and reported
/// in its own [`BatchOutcome`]; the remaining units still run to completion.
/// Outcomes are returned in job order.
#[must_use]
pub fn process_batch(jobs: &[SpecimenJob], config: &AnalysisConfig) -> Vec<BatchOutcome> {
    jobs.par_iter()
        .map(|job| {
            tracing::info!(specimen = %job.name, "working on specimen");
            let result = process_specimen(&job.specimen, &job.protocols, config);
            match &result {
                Ok(r) => tracing::info!(specimen = %job.name, rows = r.records.len(), "processing complete"),
                Err(e) => tracing::error!(specimen = %job.name, error = %e, "specimen failed"),
            }
            BatchOutcome {
                name: job.name.clone(),
                result,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ReferencePolicy, StressMethod};
    use crate::series::{MarkerFrame, SampleSeries};
    use approx::assert_relative_eq;

    const X: [f64; 4] = [0.0, 0.0, 3.0, 3.0];
    const Y: [f64; 4] = [0.0, 3.0, 0.0, 3.0];

    fn frame(l: f64) -> MarkerFrame {
        [X.map(|v| v * l), Y.map(|v| v * l)]
    }

    fn protocol(index: usize, t0: f64) -> Protocol {
        let lams = [1.0, 1.0, 1.05, 1.1, 1.05, 1.0];
        let n = lams.len();
        let series = SampleSeries::from_markers(
            (0..n).map(|i| t0 + i as f64).collect(),
            lams.iter().map(|&l| frame(l)).collect(),
        )
        .with_stretch(lams.to_vec(), lams.to_vec())
        .with_forces(
            lams.iter().map(|l| 100.0 * (l - 1.0)).collect(),
            lams.iter().map(|l| 80.0 * (l - 1.0)).collect(),
        );
        Protocol::new(index, format!("{index}-1-1"), series)
    }

    fn specimen() -> SpecimenGeometry {
        SpecimenGeometry::new([10.0, 10.0, 0.5], X, Y).unwrap()
    }

    #[test]
    fn test_process_protocol() {
        let protocols = vec![protocol(0, 0.0)];
        let r = process_protocol(&specimen(), &protocols, 0, &AnalysisConfig::default()).unwrap();
        assert_eq!(r.kinematics.len(), 6);
        assert_relative_eq!(r.kinematics.f[3][(0, 0)], 1.1, epsilon = 1e-12);
        assert_eq!(r.phases[3], Phase::Recover);
        assert_eq!(r.phases[2], Phase::Stretch);
        assert_relative_eq!(r.shear_deg[3], 0.0, epsilon = 1e-10);
    }

    #[test]
    fn test_specimen_is_sorted_and_time_repaired() {
        // Second protocol restarts its clock at zero.
        let protocols = vec![protocol(1, 0.0), protocol(0, 0.0)];
        let config = AnalysisConfig::raw().with_reference_policy(ReferencePolicy::First);
        let r = process_specimen(&specimen(), &protocols, &config).unwrap();
        assert_eq!(r.protocols[0].index, 0);
        assert_eq!(r.records.len(), 12);
        assert_eq!(r.records[0].set_name, "0-1-1");
        assert!(r.records.windows(2).all(|w| w[1].time_s >= w[0].time_s));
        assert_relative_eq!(r.records[3].txx, 10.0 / 5.0, epsilon = 1e-9);
        assert_relative_eq!(r.records[3].x_displacement_um, 1000.0, epsilon = 1e-9);
        assert_eq!(r.records[3].cycle, "1-Recover");
    }

    #[test]
    fn test_each_protocol_gets_its_own_tag() {
        let protocols = vec![protocol(1, 0.0), protocol(0, 0.0)];
        let r = process_specimen(&specimen(), &protocols, &AnalysisConfig::default()).unwrap();
        assert_eq!(r.records[3].cycle, "1-Recover");
        assert_eq!(r.records[9].cycle, "2-Recover");
        assert_eq!(r.records[8].cycle, "2-Stretch");

        let fixed = AnalysisConfig::default().with_cycle_tag("7");
        let r = process_specimen(&specimen(), &protocols, &fixed).unwrap();
        assert!(r.records.iter().all(|rec| rec.cycle.starts_with("7-")));
    }

    #[test]
    fn test_batch_isolates_failures() {
        let good = SpecimenJob {
            name: "good".into(),
            specimen: specimen(),
            protocols: vec![protocol(0, 0.0)],
        };
        let mut bad_protocol = protocol(0, 0.0);
        bad_protocol.series.force_x.pop();
        let bad = SpecimenJob {
            name: "bad".into(),
            specimen: specimen(),
            protocols: vec![bad_protocol],
        };
        let config = AnalysisConfig::default().with_stress_method(StressMethod::Cauchy);
        let outcomes = process_batch(&[bad, good], &config);
        assert_eq!(outcomes[0].name, "bad");
        assert!(matches!(
            outcomes[0].result,
            Err(BiaxError::InconsistentInput(_))
        ));
        assert!(outcomes[1].result.is_ok());
    }
}
