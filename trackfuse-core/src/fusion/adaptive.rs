//! Adaptive Process-Noise Monitor
//!
//! ## Overview
//!
//! While the constant-velocity model fits the motion, the normalized
//! innovation squared
//!
//! ```text
//! NIS = yᵀ·S⁻¹·y
//! ```
//!
//! follows a χ² distribution with 2 degrees of freedom. A maneuver (sudden
//! turn) makes the prediction wrong for a few steps; the innovation grows
//! and NIS spikes well beyond the 95% quantile (5.991).
//!
//! On such a step the adaptive filter trusts the model less: the covariance
//! prediction is recomputed with `Q` multiplied by a fixed factor, which
//! raises the gain and lets the estimate follow the turn without a long lag.
//!
//! The decision is per step and stateless. Nothing carries over to the next
//! step; the following prediction starts from nominal `Q` again.

use crate::{
    constants::{DEFAULT_NIS_INFLATION_FACTOR, DEFAULT_NIS_THRESHOLD},
    errors::{require_positive, FusionError, FusionResult},
    fusion::matrix::{self, SquareMatrix, Vector},
};

/// Outcome of the consistency test for one step
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NoiseDecision {
    /// Innovation consistent with the model; use nominal `Q`
    Nominal,
    /// Innovation inconsistent; re-predict with `Q · factor`
    Inflate {
        /// Multiplicative scale applied to `Q`
        factor: f64,
    },
}

impl NoiseDecision {
    /// True when this step's `Q` is inflated
    pub fn is_inflated(&self) -> bool {
        matches!(self, Self::Inflate { .. })
    }

    /// Scale applied to `Q` for this step (1 when nominal)
    pub fn scale(&self) -> f64 {
        match self {
            Self::Nominal => 1.0,
            Self::Inflate { factor } => *factor,
        }
    }
}

/// χ² consistency test with fixed threshold and inflation factor
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NoiseMonitor {
    threshold: f64,
    inflation_factor: f64,
}

impl Default for NoiseMonitor {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_NIS_THRESHOLD,
            inflation_factor: DEFAULT_NIS_INFLATION_FACTOR,
        }
    }
}

impl NoiseMonitor {
    /// Create a monitor; `threshold > 0` and `inflation_factor > 1`
    pub fn new(threshold: f64, inflation_factor: f64) -> FusionResult<Self> {
        let threshold = require_positive("nis_threshold", threshold)?;
        let inflation_factor = require_positive("nis_inflation_factor", inflation_factor)?;
        if inflation_factor <= 1.0 {
            return Err(FusionError::InvalidParameter {
                parameter: "nis_inflation_factor",
                value: inflation_factor,
                reason: "must be greater than 1",
            });
        }

        Ok(Self {
            threshold,
            inflation_factor,
        })
    }

    /// Chi-squared threshold
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Multiplicative `Q` scale on an inconsistent step
    pub fn inflation_factor(&self) -> f64 {
        self.inflation_factor
    }

    /// Decide whether this step's `Q` is inflated
    ///
    /// Strictly greater than the threshold inflates; equality is nominal.
    pub fn assess(&self, nis: f64) -> NoiseDecision {
        if nis > self.threshold {
            NoiseDecision::Inflate {
                factor: self.inflation_factor,
            }
        } else {
            NoiseDecision::Nominal
        }
    }
}

/// Normalized innovation squared `yᵀ·S⁻¹·y`
///
/// `s_inv` must be the inverse of a positive definite innovation covariance,
/// which makes the result non-negative up to round-off. Tiny negative values
/// from round-off are clamped to zero.
pub fn normalized_innovation_squared(
    innovation: &Vector<2>,
    s_inv: &SquareMatrix<2>,
) -> f64 {
    matrix::quadratic_form(innovation, s_inv).max(0.0)
}
