//! Numerical Tolerances
//!
//! Thresholds used to decide when a matrix can no longer be trusted. All of
//! them are relative to the magnitude of the matrix under test, so a track
//! in millimetres and a track in kilometres are judged alike.

/// Smallest accepted `det(S) / (S[0][0]·S[1][1])` for the 2x2 innovation
/// covariance `S`.
///
/// For a symmetric positive definite `S` the ratio equals `1 - ρ²`, where `ρ`
/// is the correlation between the two axes, so it measures conditioning and
/// not scale.
pub const MIN_INNOVATION_CONDITION: f64 = 1e-12;

/// Diagonal jitter, relative to the largest diagonal entry, added before the
/// Cholesky positive semi-definiteness check.
///
/// A PSD matrix plus `ε·max(Aᵢᵢ)·I` is positive definite, so factorization
/// failure means at least one eigenvalue is below `-ε·max(Aᵢᵢ)`.
pub const PSD_RELATIVE_JITTER: f64 = 1e-9;

/// Largest tolerated asymmetry `|P[i][j] - P[j][i]|`, relative to the largest
/// diagonal entry.
pub const SYMMETRY_RELATIVE_TOLERANCE: f64 = 1e-9;
