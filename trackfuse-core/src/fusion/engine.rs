//! Per-step fusion engine
//!
//! Wires the stateless [`SpatialCombiner`] in front of one owned
//! [`KalmanFilter`]. Each call to [`FusionEngine::step`] takes one
//! same-timestamp pair of sensor readings through both stages.

use crate::{
    errors::FusionResult,
    fusion::{
        kalman::{KalmanConfig, KalmanFilter, StepEstimate},
        spatial::{FusedMeasurement, SpatialCombiner},
        Point2,
    },
};

/// Combiner plus estimator for one track
#[derive(Debug, Clone)]
pub struct FusionEngine {
    combiner: SpatialCombiner,
    filter: KalmanFilter,
}

impl FusionEngine {
    /// Validate sensor noise and filter configuration together
    pub fn new(sigma1: f64, sigma2: f64, config: KalmanConfig) -> FusionResult<Self> {
        Ok(Self {
            combiner: SpatialCombiner::new(sigma1, sigma2)?,
            filter: KalmanFilter::new(config)?,
        })
    }

    /// Build from parts that were validated elsewhere
    pub fn from_parts(combiner: SpatialCombiner, filter: KalmanFilter) -> Self {
        Self { combiner, filter }
    }

    /// Fuse one reading pair and run it through the filter
    ///
    /// Returns the fused measurement alongside the estimate so callers can
    /// record `R_fused` without recomputing it.
    pub fn step(&mut self, z1: Point2, z2: Point2) -> FusionResult<(FusedMeasurement, StepEstimate)> {
        let fused = self.combiner.combine(z1, z2)?;
        let estimate = self.filter.update(&fused)?;
        Ok((fused, estimate))
    }

    /// Spatial stage
    pub fn combiner(&self) -> &SpatialCombiner {
        &self.combiner
    }

    /// Temporal stage
    pub fn filter(&self) -> &KalmanFilter {
        &self.filter
    }

    /// Restart tracking from the filter's seed
    pub fn reset(&mut self) {
        self.filter.reset();
    }
}
