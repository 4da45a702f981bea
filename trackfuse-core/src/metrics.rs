//! Accuracy and Precision Scoring
//!
//! Offline scoring of estimated tracks against ground truth. Nothing here
//! feeds back into the estimator.
//!
//! ## Measures
//!
//! ```text
//! mean position error  = (1/n) Σ ‖p̂ₖ - pₖ‖
//! error variance       = var({p̂ₖ,ᵢ - pₖ,ᵢ})   over both axes, population
//! theoretical v_f      = σ₁²·σ₂² / (σ₁² + σ₂²)
//! ```
//!
//! Fusion improved *accuracy* when the fused track's mean error is below
//! both raw sensors', and improved *precision* when the theoretical fused
//! variance is below both sensor variances.

use core::fmt;
use core::ops::Range;

use crate::{
    errors::{FusionError, FusionResult},
    fusion::{spatial, Point2},
};

fn check_aligned(estimates: &[Point2], truth: &[Point2]) -> FusionResult<()> {
    if estimates.len() != truth.len() {
        return Err(FusionError::LengthMismatch {
            stream: "estimates",
            expected: truth.len(),
            found: estimates.len(),
        });
    }
    if truth.is_empty() {
        return Err(FusionError::EmptyInput);
    }
    Ok(())
}

fn distance(a: &Point2, b: &Point2) -> f64 {
    libm::hypot(a[0] - b[0], a[1] - b[1])
}

/// Mean Euclidean distance between aligned estimates and truth
pub fn mean_position_error(estimates: &[Point2], truth: &[Point2]) -> FusionResult<f64> {
    check_aligned(estimates, truth)?;
    let total: f64 = estimates.iter().zip(truth).map(|(e, t)| distance(e, t)).sum();
    Ok(total / truth.len() as f64)
}

/// Population variance of every per-axis error component
pub fn error_variance(estimates: &[Point2], truth: &[Point2]) -> FusionResult<f64> {
    check_aligned(estimates, truth)?;
    let components = || {
        estimates
            .iter()
            .zip(truth)
            .flat_map(|(e, t)| [e[0] - t[0], e[1] - t[1]])
    };

    let n = (2 * truth.len()) as f64;
    let mean = components().sum::<f64>() / n;
    let squared: f64 = components().map(|d| (d - mean) * (d - mean)).sum();
    Ok(squared / n)
}

/// Mean Euclidean error over the steps in `range`
///
/// The range is clipped to the track length; an empty result is an error.
pub fn region_error(
    estimates: &[Point2],
    truth: &[Point2],
    range: Range<usize>,
) -> FusionResult<f64> {
    check_aligned(estimates, truth)?;
    let end = range.end.min(truth.len());
    let start = range.start.min(end);
    mean_position_error(&estimates[start..end], &truth[start..end])
}

/// Accuracy and precision of a fused track compared with its raw sensors
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PerformanceReport {
    /// Mean error of sensor 1 readings
    pub sensor1_error: f64,
    /// Mean error of sensor 2 readings
    pub sensor2_error: f64,
    /// Mean error of the fused track
    pub fused_error: f64,
    /// σ₁²
    pub sensor1_variance: f64,
    /// σ₂²
    pub sensor2_variance: f64,
    /// `v_f` from the sensor noise alone
    pub theoretical_fused_variance: f64,
    /// Measured variance of the fused track's error
    pub empirical_fused_variance: f64,
}

impl PerformanceReport {
    /// Score a fused track and both raw sensor sequences against truth
    pub fn evaluate(
        truth: &[Point2],
        sensor1: &[Point2],
        sensor2: &[Point2],
        fused: &[Point2],
        sigma1: f64,
        sigma2: f64,
    ) -> FusionResult<Self> {
        let combiner = spatial::SpatialCombiner::new(sigma1, sigma2)?;

        Ok(Self {
            sensor1_error: mean_position_error(sensor1, truth)?,
            sensor2_error: mean_position_error(sensor2, truth)?,
            fused_error: mean_position_error(fused, truth)?,
            sensor1_variance: sigma1 * sigma1,
            sensor2_variance: sigma2 * sigma2,
            theoretical_fused_variance: combiner.fused_variance(),
            empirical_fused_variance: error_variance(fused, truth)?,
        })
    }

    /// Fused track closer to truth than either sensor
    pub fn accuracy_improved(&self) -> bool {
        self.fused_error < self.sensor1_error && self.fused_error < self.sensor2_error
    }

    /// Theoretical fused variance below both sensor variances
    pub fn precision_improved(&self) -> bool {
        self.theoretical_fused_variance < self.sensor1_variance.min(self.sensor2_variance)
    }
}

impl fmt::Display for PerformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Accuracy (mean position error)")?;
        writeln!(f, "  Sensor 1:  {:.4} m", self.sensor1_error)?;
        writeln!(f, "  Sensor 2:  {:.4} m", self.sensor2_error)?;
        writeln!(f, "  Fused:     {:.4} m", self.fused_error)?;
        writeln!(f, "Precision (variance)")?;
        writeln!(f, "  Sensor 1:  {:.4} m²", self.sensor1_variance)?;
        writeln!(f, "  Sensor 2:  {:.4} m²", self.sensor2_variance)?;
        writeln!(f, "  Fused (theoretical): {:.4} m²", self.theoretical_fused_variance)?;
        write!(f, "  Fused (empirical):   {:.4} m²", self.empirical_fused_variance)
    }
}
