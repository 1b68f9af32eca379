//! Planar Biaxial Analysis Library
//!
//! Kinematics and stress recovery for planar biaxial tension tests of soft
//! tissue.
//!
//! Four fiducial markers tracked on the specimen surface are treated as the
//! nodes of a bilinear quadrilateral element. From their motion the library
//! derives the in-plane deformation gradient, its inverse and determinant,
//! and the right Cauchy–Green tensor, and combines these with the measured
//! axial forces to recover Cauchy, first and second Piola–Kirchhoff stress.
//!
//! # Features
//!
//! - **Three stress methods**: equilibrium least-squares Cauchy stress,
//!   first Piola–Kirchhoff from the initial cross sections, and nominal stress
//! - **Reference policies**: specimen initial state, per-protocol unit
//!   stretch, or first non-preconditioning sample
//! - **Phase segmentation**: preload, stretch and recover labels from the
//!   Jacobian history
//! - **Parallel**: protocols and specimens are independent units of work
//!
//! # Quick Start
//!
//! ```
//! use planar_biax::{process_specimen, AnalysisConfig, Protocol, SampleSeries, SpecimenGeometry};
//!
//! let x = [0.0, 0.0, 2.0, 2.0];
//! let y = [0.0, 2.0, 0.0, 2.0];
//! let specimen = SpecimenGeometry::new([10.0, 10.0, 0.5], x, y)?;
//!
//! let lams = [1.0, 1.1, 1.2, 1.1];
//! let series = SampleSeries::from_markers(
//!     vec![0.0, 1.0, 2.0, 3.0],
//!     lams.iter().map(|&l| [x.map(|v| v * l), y.map(|v| v * l)]).collect(),
//! )
//! .with_stretch(lams.to_vec(), lams.to_vec())
//! .with_forces(vec![0.0, 50.0, 100.0, 50.0], vec![0.0, 50.0, 100.0, 50.0]);
//!
//! let protocols = vec![Protocol::new(0, "1-1-1", series)];
//! let result = process_specimen(&specimen, &protocols, &AnalysisConfig::corrected())?;
//!
//! assert_eq!(result.records.len(), 4);
//! assert_eq!(result.records[3].cycle, "1-Recover");
//! # Ok::<(), planar_biax::BiaxError>(())
//! ```
//!
//! # Presets
//!
//! ```
//! use planar_biax::AnalysisConfig;
//!
//! let corrected = AnalysisConfig::corrected();
//! let raw = AnalysisConfig::raw();
//! let nominal = AnalysisConfig::nominal();
//! ```

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::many_single_char_names)]

pub mod config;
pub mod error;
pub mod kinematics;
pub mod math;
pub mod phase;
pub mod pipeline;
pub mod reference;
pub mod rve;
pub mod series;
pub mod specimen;
pub mod stress;

// Re-exports for convenient access
pub use config::{AnalysisConfig, ReferencePolicy, StressMethod};
pub use error::{BiaxError, Result};
pub use kinematics::{compute_kinematics, deformation_gradient, shear_angle, Kinematics};
pub use math::{LstsqScratch, Tensor2};
pub use phase::{fix_time, parse_cycle, Phase};
pub use pipeline::{
    process_batch, process_protocol, process_specimen, BatchOutcome, OutputRecord,
    ProtocolResult, SpecimenJob, SpecimenResult,
};
pub use reference::{ReferenceConfiguration, ReferenceMarkers};
pub use rve::{track_dimensions, DimensionTrack};
pub use series::{MarkerFrame, Protocol, SampleSeries};
pub use specimen::{infer_initial_dimensions, ProcessedColumns, SpecimenGeometry, NODE_ORDER};
pub use stress::{Kinetics, StressSettings};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
