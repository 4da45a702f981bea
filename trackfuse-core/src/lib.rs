//! Core estimation engine for TrackFuse
//!
//! Fuses two synchronous, noisy 2D position sensors into one measurement
//! per step and tracks it with a constant-velocity Kalman filter whose
//! process noise may be inflated on inconsistent steps.
//!
//! Key constraints:
//! - No heap allocation in the per-step path
//! - Fixed-size stack matrices, no dense linear algebra dependency
//! - Numerical failures reported, never propagated as NaN
//!
//! ```no_run
//! use trackfuse_core::{run_comparison, KalmanConfig, SensorStreams};
//!
//! let gps = [[0.0, 0.0], [0.2, 0.1], [0.3, 0.0]];
//! let wifi = [[0.1, 0.0], [0.1, 0.0], [0.2, 0.1]];
//! let streams = SensorStreams::new(&gps, &wifi, 2.0, 1.0, 0.1);
//!
//! let comparison = run_comparison(&streams, &KalmanConfig::default())?;
//! println!("adaptive inflated {} steps", comparison.adaptive.inflation_count());
//! # Ok::<(), trackfuse_core::FusionError>(())
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(unsafe_code)]
#![warn(missing_docs)]

#[cfg(not(feature = "std"))]
extern crate alloc;

// Macros for optional logging
#[cfg(feature = "log")]
macro_rules! log_warn {
    ($($arg:tt)*) => { log::warn!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_warn {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "log")]
macro_rules! log_debug {
    ($($arg:tt)*) => { log::debug!($($arg)*) };
}

#[cfg(not(feature = "log"))]
macro_rules! log_debug {
    ($($arg:tt)*) => {};
}

pub mod constants;
pub mod errors;
pub mod fusion;
pub mod metrics;
pub mod run;

// Public API
pub use errors::{ErrorKind, FusionError, FusionResult};
pub use fusion::{
    FilterMode, FilterPhase, FusedMeasurement, FusionEngine, KalmanConfig, KalmanFilter,
    NoiseDecision, NoiseMonitor, Point2, SpatialCombiner, StepEstimate,
};
pub use metrics::PerformanceReport;
pub use run::{run_comparison, run_fusion, FusionTrace, ModeComparison, SensorStreams};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
