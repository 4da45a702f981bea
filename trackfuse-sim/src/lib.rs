//! Simulation and experiment harness for TrackFuse
//!
//! Everything around the estimator that needs `std`:
//!
//! - [`scenario`]: seeded ground-truth paths with two noisy sensors
//! - [`dataset`]: JSON persistence of generated sensor logs
//! - [`experiment`]: standard vs adaptive runs with scoring
//! - [`report`]: the plain-text performance report
//!
//! ```no_run
//! use trackfuse_sim::{experiment::{run_experiment, ExperimentConfig}, report};
//!
//! let outcome = run_experiment(&ExperimentConfig::default())?;
//! println!("{}", report::render(&outcome));
//! # Ok::<(), trackfuse_sim::SimError>(())
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod dataset;
pub mod error;
pub mod experiment;
pub mod report;
pub mod scenario;

pub use dataset::SensorLog;
pub use error::{SimError, SimResult};
pub use experiment::{evaluate, run_experiment, ExperimentConfig, ExperimentOutcome};
pub use report::render;
pub use scenario::{generate, ScenarioConfig, TrajectoryShape};
