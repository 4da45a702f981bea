//! Batch Fusion over Recorded Sensor Streams
//!
//! ## Overview
//!
//! Drives a [`FusionEngine`] over two aligned position sequences and
//! collects the per-step outputs:
//!
//! ```text
//! sensor1[k] ──┐
//!              ├─→ FusionEngine::step ─→ positions[k], fused_variances[k], nis[k], inflated[k]
//! sensor2[k] ──┘
//! ```
//!
//! Ground truth is not an input here; it belongs to scoring (see
//! [`crate::metrics`]).
//!
//! ## Seeding
//!
//! When the configuration carries no start position the filter is seeded
//! from the first fused measurement, with the configured start velocity.
//! That measurement is then processed like every other one.

#[cfg(not(feature = "std"))]
use alloc::vec::Vec;

use crate::{
    errors::{FusionError, FusionResult},
    fusion::{
        kalman::{FilterMode, KalmanConfig, KalmanFilter},
        spatial::SpatialCombiner,
        FusionEngine, Point2,
    },
};

/// Two aligned sensor sequences plus their noise and sampling interval
#[derive(Debug, Clone, Copy)]
pub struct SensorStreams<'a> {
    /// Readings of sensor 1
    pub sensor1: &'a [Point2],
    /// Readings of sensor 2, same timestamps as `sensor1`
    pub sensor2: &'a [Point2],
    /// Standard deviation of sensor 1
    pub sigma1: f64,
    /// Standard deviation of sensor 2
    pub sigma2: f64,
    /// Sampling interval in seconds
    pub dt: f64,
}

impl<'a> SensorStreams<'a> {
    /// Borrow two sequences
    pub fn new(
        sensor1: &'a [Point2],
        sensor2: &'a [Point2],
        sigma1: f64,
        sigma2: f64,
        dt: f64,
    ) -> Self {
        Self {
            sensor1,
            sensor2,
            sigma1,
            sigma2,
            dt,
        }
    }

    /// Number of time steps
    pub fn len(&self) -> usize {
        self.sensor1.len()
    }

    /// True when there is nothing to process
    pub fn is_empty(&self) -> bool {
        self.sensor1.is_empty()
    }

    /// Lengths must agree and at least one step must be present
    pub fn validate(&self) -> FusionResult<()> {
        if self.sensor2.len() != self.sensor1.len() {
            return Err(FusionError::LengthMismatch {
                stream: "sensor2",
                expected: self.sensor1.len(),
                found: self.sensor2.len(),
            });
        }
        if self.is_empty() {
            return Err(FusionError::EmptyInput);
        }
        Ok(())
    }
}

/// Ordered per-step outputs of one run
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FusionTrace {
    /// Corrected position per step
    pub positions: Vec<Point2>,
    /// Per-axis fused measurement variance per step
    pub fused_variances: Vec<f64>,
    /// Normalized innovation squared per step
    pub nis: Vec<f64>,
    /// Whether inflated process noise was used per step
    pub inflated: Vec<bool>,
}

impl FusionTrace {
    fn with_capacity(steps: usize) -> Self {
        Self {
            positions: Vec::with_capacity(steps),
            fused_variances: Vec::with_capacity(steps),
            nis: Vec::with_capacity(steps),
            inflated: Vec::with_capacity(steps),
        }
    }

    /// Number of recorded steps
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    /// True when no step was recorded
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Steps that used inflated process noise
    pub fn inflation_count(&self) -> usize {
        self.inflated.iter().filter(|&&i| i).count()
    }

    /// Largest NIS in the run
    pub fn max_nis(&self) -> f64 {
        self.nis.iter().copied().fold(0.0, f64::max)
    }
}

/// Standard and adaptive runs over the same input
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModeComparison {
    /// Run with nominal process noise throughout
    pub standard: FusionTrace,
    /// Run with NIS-triggered process noise inflation
    pub adaptive: FusionTrace,
}

/// Fuse and track both streams end to end
///
/// The streams' `dt` overrides `config.dt`. A configuration or numerical
/// error aborts the run; there is no partial trace.
pub fn run_fusion(streams: &SensorStreams<'_>, config: &KalmanConfig) -> FusionResult<FusionTrace> {
    streams.validate()?;
    let combiner = SpatialCombiner::new(streams.sigma1, streams.sigma2)?;

    let mut config = config.with_dt(streams.dt);
    if config.start_pos.is_none() {
        let first = combiner.combine(streams.sensor1[0], streams.sensor2[0])?;
        config = config.with_start_pos(first.position);
    }

    let mut engine = FusionEngine::from_parts(combiner, KalmanFilter::new(config)?);
    log_debug!(
        "Fusion run: {} steps, {:?} mode, v_f = {:.4}",
        streams.len(),
        config.mode,
        combiner.fused_variance()
    );

    let mut trace = FusionTrace::with_capacity(streams.len());
    for (&z1, &z2) in streams.sensor1.iter().zip(streams.sensor2.iter()) {
        let (fused, estimate) = engine.step(z1, z2)?;
        trace.positions.push(estimate.position);
        trace.fused_variances.push(fused.variance());
        trace.nis.push(estimate.nis);
        trace.inflated.push(estimate.inflated);
    }

    log_debug!(
        "Fusion run finished: {} steps, {} inflated",
        trace.len(),
        engine.filter().inflation_count()
    );
    Ok(trace)
}

/// Run the standard and adaptive filters over the same streams
///
/// Both runs share every parameter of `config` except the mode.
pub fn run_comparison(
    streams: &SensorStreams<'_>,
    config: &KalmanConfig,
) -> FusionResult<ModeComparison> {
    Ok(ModeComparison {
        standard: run_fusion(streams, &config.with_mode(FilterMode::Standard))?,
        adaptive: run_fusion(streams, &config.with_mode(FilterMode::Adaptive))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    fn straight(steps: usize) -> Vec<Point2> {
        (0..steps).map(|k| [0.15 * k as f64, 0.1 * k as f64]).collect()
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let a = straight(10);
        let b = straight(9);
        let streams = SensorStreams::new(&a, &b, 2.0, 1.0, 0.1);

        let err = run_fusion(&streams, &KalmanConfig::default()).unwrap_err();
        assert_eq!(
            err,
            FusionError::LengthMismatch {
                stream: "sensor2",
                expected: 10,
                found: 9
            }
        );
    }

    #[test]
    fn empty_streams_rejected() {
        let streams = SensorStreams::new(&[], &[], 2.0, 1.0, 0.1);
        assert_eq!(streams.validate(), Err(FusionError::EmptyInput));
    }

    #[test]
    fn bad_noise_or_dt_rejected() {
        let a = straight(5);
        for streams in [
            SensorStreams::new(&a, &a, 0.0, 1.0, 0.1),
            SensorStreams::new(&a, &a, 2.0, -1.0, 0.1),
            SensorStreams::new(&a, &a, 2.0, 1.0, 0.0),
        ] {
            let err = run_fusion(&streams, &KalmanConfig::default()).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration);
        }
    }

    #[test]
    fn trace_has_one_entry_per_step() {
        let a = straight(50);
        let streams = SensorStreams::new(&a, &a, 2.0, 1.0, 0.1);
        let trace = run_fusion(&streams, &KalmanConfig::default()).unwrap();

        assert_eq!(trace.len(), 50);
        assert_eq!(trace.nis.len(), 50);
        assert_eq!(trace.inflated.len(), 50);
        assert!(trace.fused_variances.iter().all(|&v| (v - 0.8).abs() < 1e-12));
        assert!(trace.nis.iter().all(|&n| n >= 0.0));
    }

    #[test]
    fn seeds_from_first_fused_measurement() {
        let a = [[10.0, -4.0]; 3];
        let streams = SensorStreams::new(&a, &a, 1.0, 1.0, 0.1);
        let trace = run_fusion(&streams, &KalmanConfig::default()).unwrap();

        // Stationary readings at the seed produce zero innovation
        assert!(trace.positions.iter().all(|p| *p == [10.0, -4.0]));
        assert!(trace.nis.iter().all(|&n| n == 0.0));
    }

    #[test]
    fn comparison_runs_both_modes() {
        let a = straight(40);
        let streams = SensorStreams::new(&a, &a, 2.0, 1.0, 0.1);
        let comparison = run_comparison(&streams, &KalmanConfig::default()).unwrap();

        assert_eq!(comparison.standard.len(), 40);
        assert_eq!(comparison.adaptive.len(), 40);
        assert_eq!(comparison.standard.inflation_count(), 0);
    }
}
