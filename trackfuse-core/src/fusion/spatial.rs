//! Spatial Fusion of Two Synchronous Position Sensors
//!
//! ## Overview
//!
//! Two sensors report the same position at the same instant with known,
//! fixed, isotropic noise `σ₁` and `σ₂`. The best linear unbiased estimate
//! weights each reading by the *other* sensor's variance:
//!
//! ```text
//! w₁ = σ₂² / (σ₁² + σ₂²)
//! w₂ = σ₁² / (σ₁² + σ₂²)
//! z_fused = w₁·z₁ + w₂·z₂
//! ```
//!
//! The fused variance is the harmonic combination
//!
//! ```text
//! v_f = σ₁²·σ₂² / (σ₁² + σ₂²)
//! ```
//!
//! which is strictly smaller than both `σ₁²` and `σ₂²`. This is the
//! precision gain of the whole system: the fused measurement is always
//! better than the better sensor.
//!
//! ## Example
//!
//! ```rust
//! use trackfuse_core::fusion::spatial;
//!
//! // GPS (σ = 2 m) and WiFi (σ = 1 m)
//! let fused = spatial::fuse([10.0, 0.0], 2.0, [12.0, 0.0], 1.0).unwrap();
//! assert!((fused.position[0] - 11.6).abs() < 1e-12);
//! assert!((fused.variance() - 0.8).abs() < 1e-12);
//! ```

use crate::{
    errors::{require_positive, FusionError, FusionResult},
    fusion::{matrix::SquareMatrix, Point2},
};

/// Fused measurement and its covariance for one time step
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FusedMeasurement {
    /// Precision-weighted position `[x, y]`
    pub position: Point2,
    /// Diagonal measurement covariance `R_fused`
    pub covariance: SquareMatrix<2>,
}

impl FusedMeasurement {
    /// Build a measurement with isotropic variance `variance` on both axes
    pub fn isotropic(position: Point2, variance: f64) -> Self {
        Self {
            position,
            covariance: [[variance, 0.0], [0.0, variance]],
        }
    }

    /// Per-axis fused variance `v_f`
    pub fn variance(&self) -> f64 {
        self.covariance[0][0]
    }
}

/// Fused variance of two independent estimates
///
/// `var1 · var2 / (var1 + var2)`
pub fn fused_variance(var1: f64, var2: f64) -> f64 {
    (var1 * var2) / (var1 + var2)
}

/// Inverse-variance weights `(w₁, w₂)` for standard deviations `σ₁`, `σ₂`
pub fn weights(sigma1: f64, sigma2: f64) -> FusionResult<(f64, f64)> {
    SpatialCombiner::new(sigma1, sigma2).map(|c| c.weights())
}

/// Fuse one pair of readings
///
/// Fails with a configuration error when either standard deviation is not
/// strictly positive, and with a numerical error when a reading is not
/// finite.
pub fn fuse(z1: Point2, sigma1: f64, z2: Point2, sigma2: f64) -> FusionResult<FusedMeasurement> {
    SpatialCombiner::new(sigma1, sigma2)?.combine(z1, z2)
}

/// Combiner with the sensor noise validated once
///
/// Holds only the two weights and the fused variance, all derived from the
/// constructor arguments. `combine` is a pure function of its inputs.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SpatialCombiner {
    sigma1: f64,
    sigma2: f64,
    w1: f64,
    w2: f64,
    fused_variance: f64,
}

impl SpatialCombiner {
    /// Validate the sensor standard deviations and precompute the weights
    pub fn new(sigma1: f64, sigma2: f64) -> FusionResult<Self> {
        let sigma1 = require_positive("sigma1", sigma1)?;
        let sigma2 = require_positive("sigma2", sigma2)?;

        let var1 = sigma1 * sigma1;
        let var2 = sigma2 * sigma2;
        let total = var1 + var2;
        // Squaring can underflow for denormal sigmas
        if !(total > 0.0) || !total.is_finite() {
            return Err(FusionError::invalid(
                "sigma1^2 + sigma2^2",
                total,
                "variance sum must be finite and positive",
            ));
        }

        Ok(Self {
            sigma1,
            sigma2,
            w1: var2 / total,
            w2: var1 / total,
            fused_variance: fused_variance(var1, var2),
        })
    }

    /// Weights `(w₁, w₂)`; they sum to one
    pub fn weights(&self) -> (f64, f64) {
        (self.w1, self.w2)
    }

    /// Per-axis variance of every measurement this combiner produces
    pub fn fused_variance(&self) -> f64 {
        self.fused_variance
    }

    /// Sensor standard deviations `(σ₁, σ₂)`
    pub fn sigmas(&self) -> (f64, f64) {
        (self.sigma1, self.sigma2)
    }

    /// Merge two same-timestamp readings
    pub fn combine(&self, z1: Point2, z2: Point2) -> FusionResult<FusedMeasurement> {
        if !z1.iter().chain(z2.iter()).all(|v| v.is_finite()) {
            return Err(FusionError::NonFinite {
                quantity: "sensor reading",
            });
        }

        let position = [
            self.w1 * z1[0] + self.w2 * z2[0],
            self.w1 * z1[1] + self.w2 * z2[1],
        ];

        Ok(FusedMeasurement::isotropic(position, self.fused_variance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use proptest::prelude::*;

    #[test]
    fn reference_weights_and_variance() {
        let combiner = SpatialCombiner::new(2.0, 1.0).unwrap();
        let (w1, w2) = combiner.weights();

        assert!((w1 - 0.2).abs() < 1e-12);
        assert!((w2 - 0.8).abs() < 1e-12);
        assert!((combiner.fused_variance() - 0.8).abs() < 1e-12);
    }

    #[test]
    fn more_precise_sensor_dominates() {
        let fused = fuse([0.0, 0.0], 2.0, [10.0, -5.0], 1.0).unwrap();
        assert!((fused.position[0] - 8.0).abs() < 1e-12);
        assert!((fused.position[1] + 4.0).abs() < 1e-12);
    }

    #[test]
    fn covariance_is_diagonal() {
        let fused = fuse([1.0, 2.0], 0.3, [1.5, 2.5], 0.4).unwrap();
        assert_eq!(fused.covariance[0][1], 0.0);
        assert_eq!(fused.covariance[1][0], 0.0);
        assert_eq!(fused.covariance[0][0], fused.covariance[1][1]);
    }

    #[test]
    fn equal_sensors_average() {
        let fused = fuse([1.0, 3.0], 1.5, [3.0, 5.0], 1.5).unwrap();
        assert!((fused.position[0] - 2.0).abs() < 1e-12);
        assert!((fused.position[1] - 4.0).abs() < 1e-12);
        assert!((fused.variance() - 1.125).abs() < 1e-12);
    }

    #[test]
    fn non_positive_sigma_is_configuration_error() {
        for (s1, s2) in [(0.0, 1.0), (1.0, 0.0), (-1.0, 1.0), (f64::NAN, 1.0)] {
            let err = fuse([0.0, 0.0], s1, [0.0, 0.0], s2).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration);
        }
    }

    #[test]
    fn non_finite_reading_is_numerical_error() {
        let err = fuse([f64::NAN, 0.0], 1.0, [0.0, 0.0], 1.0).unwrap_err();
        assert_eq!(err, FusionError::NonFinite { quantity: "sensor reading" });
    }

    proptest! {
        #[test]
        fn fused_variance_beats_both_sensors(s1 in 1e-3f64..1e3, s2 in 1e-3f64..1e3) {
            let combiner = SpatialCombiner::new(s1, s2).unwrap();
            let v = combiner.fused_variance();
            prop_assert!(v < s1 * s1);
            prop_assert!(v < s2 * s2);
        }

        #[test]
        fn weights_sum_to_one(s1 in 1e-3f64..1e3, s2 in 1e-3f64..1e3) {
            let (w1, w2) = weights(s1, s2).unwrap();
            prop_assert!((w1 + w2 - 1.0).abs() < 1e-12);
        }

        #[test]
        fn combine_is_pure(
            x1 in -1e4f64..1e4, y1 in -1e4f64..1e4,
            x2 in -1e4f64..1e4, y2 in -1e4f64..1e4,
            s1 in 1e-2f64..1e2, s2 in 1e-2f64..1e2,
        ) {
            let first = fuse([x1, y1], s1, [x2, y2], s2).unwrap();
            let second = fuse([x1, y1], s1, [x2, y2], s2).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
