//! Constants for TrackFuse Core
//!
//! Centralized, documented numeric defaults and tolerances.
//!
//! ## Organization
//!
//! - **Fusion**: motion model and consistency-test defaults
//! - **Numerics**: singularity and definiteness tolerances

/// Motion model and adaptive monitor defaults.
pub mod fusion;

/// Tolerances for matrix conditioning checks.
pub mod numerics;

pub use fusion::{
    CHI2_95_2DOF, DEFAULT_INITIAL_VARIANCE, DEFAULT_NIS_INFLATION_FACTOR,
    DEFAULT_NIS_THRESHOLD, DEFAULT_PROCESS_NOISE_STD, MEASUREMENT_DIM, STATE_DIM,
};

pub use numerics::{MIN_INNOVATION_CONDITION, PSD_RELATIVE_JITTER, SYMMETRY_RELATIVE_TOLERANCE};
