//! Estimator Model Constants
//!
//! Default values for the constant-velocity Kalman filter and the
//! adaptive noise monitor. Every default can be overridden through
//! [`KalmanConfig`](crate::fusion::KalmanConfig).

// ===== MOTION MODEL =====

/// Dimension of the state vector `[px, py, vx, vy]`.
pub const STATE_DIM: usize = 4;

/// Dimension of a position measurement `[px, py]`.
pub const MEASUREMENT_DIM: usize = 2;

/// Default standard deviation of the unmodeled acceleration (m/s²).
///
/// Drives the analytical constant-velocity process noise `Q`. Small values
/// keep straight-line estimates tight; a maneuver then shows up as an NIS
/// spike.
pub const DEFAULT_PROCESS_NOISE_STD: f64 = 0.5;

/// Default diagonal of the initial state covariance `P₀` (m², m²/s²).
///
/// Large relative to the sensor variances so the first corrections lean on
/// the measurements rather than the seeded prior.
pub const DEFAULT_INITIAL_VARIANCE: f64 = 10.0;

// ===== CONSISTENCY TEST =====

/// 95% quantile of the chi-squared distribution with 2 degrees of freedom.
///
/// A 2D innovation from a consistent filter exceeds this value on about one
/// step in twenty.
///
/// Source: χ²₂ inverse CDF at 0.95 = -2·ln(0.05) ≈ 5.991
pub const CHI2_95_2DOF: f64 = 5.991;

/// Default NIS threshold above which the adaptive filter inflates `Q`.
pub const DEFAULT_NIS_THRESHOLD: f64 = CHI2_95_2DOF;

/// Default multiplicative factor applied to `Q` on an inconsistent step.
///
/// Source: tuned on a 90° turn at 1.5-5 m/s with dt = 0.1 s; 10× lets the
/// velocity estimate swing within a few steps without visibly loosening the
/// straight-line estimate.
pub const DEFAULT_NIS_INFLATION_FACTOR: f64 = 10.0;
