//! Synthetic Two-Sensor Scenarios
//!
//! ## Overview
//!
//! Generates a ground-truth path and two noisy observations of it:
//!
//! ```text
//! truth[k] = p;  p += v(k)·dt
//! z1[k]    = truth[k] + N(0, σ₁²·I)
//! z2[k]    = truth[k] + N(0, σ₂²·I)
//! ```
//!
//! Two path shapes:
//! - **Turn** ("L"): `before` until the turn step, `after` from then on
//! - **Straight** ("I"): one velocity throughout
//!
//! Noise is drawn from a `ChaCha8Rng` seeded by the configuration, so a
//! scenario is reproducible bit for bit. The whole sensor-1 stream is drawn
//! before sensor 2, x before y within each step.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use trackfuse_core::{Point2, SpatialCombiner};

use crate::{
    dataset::SensorLog,
    error::{SimError, SimResult},
};

/// Shape of the ground-truth path
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TrajectoryShape {
    /// Constant velocity, then a sharp change of heading
    Turn {
        /// Velocity before the turn
        before: Point2,
        /// Velocity from the turn step on
        after: Point2,
        /// Step at which `after` takes over; half way when absent
        #[serde(default)]
        turn_step: Option<usize>,
    },
    /// One constant velocity
    Straight {
        /// Velocity of the whole run
        velocity: Point2,
    },
}

impl Default for TrajectoryShape {
    fn default() -> Self {
        Self::l_turn()
    }
}

impl TrajectoryShape {
    /// East at 1.5 m/s, then north at 1.5 m/s
    pub fn l_turn() -> Self {
        Self::Turn {
            before: [1.5, 0.0],
            after: [0.0, 1.5],
            turn_step: None,
        }
    }

    /// Straight at (1.5, 1.0) m/s
    pub fn straight() -> Self {
        Self::Straight {
            velocity: [1.5, 1.0],
        }
    }
}

/// Scenario parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Sampling interval in seconds
    pub dt: f64,
    /// Duration in seconds
    pub total_time: f64,
    /// Ground-truth position at step 0
    pub start_pos: Point2,
    /// Sensor 1 noise standard deviation
    pub sigma1: f64,
    /// Sensor 2 noise standard deviation
    pub sigma2: f64,
    /// RNG seed
    pub seed: u64,
    /// Path shape
    pub shape: TrajectoryShape,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,
            total_time: 20.0,
            start_pos: [0.0, 0.0],
            sigma1: 2.0,
            sigma2: 1.0,
            seed: 42,
            shape: TrajectoryShape::default(),
        }
    }
}

impl ScenarioConfig {
    /// Number of steps, `floor(total_time / dt)`
    pub fn steps(&self) -> usize {
        let steps = (self.total_time / self.dt).floor();
        if steps.is_finite() && steps > 0.0 {
            steps as usize
        } else {
            0
        }
    }

    /// Step at which the heading changes, if the shape has one
    pub fn maneuver_step(&self) -> Option<usize> {
        match self.shape {
            TrajectoryShape::Turn { turn_step, .. } => Some(turn_step.unwrap_or(self.steps() / 2)),
            TrajectoryShape::Straight { .. } => None,
        }
    }

    /// Set the path shape
    pub fn with_shape(mut self, shape: TrajectoryShape) -> Self {
        self.shape = shape;
        self
    }

    /// Set the RNG seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set both sensor noise levels
    pub fn with_sigmas(mut self, sigma1: f64, sigma2: f64) -> Self {
        self.sigma1 = sigma1;
        self.sigma2 = sigma2;
        self
    }

    /// Check time base, noise levels and path parameters
    pub fn validate(&self) -> SimResult<()> {
        if !(self.dt > 0.0) || !self.dt.is_finite() {
            return Err(SimError::Scenario(format!("dt must be positive, got {}", self.dt)));
        }
        if self.steps() == 0 {
            return Err(SimError::Scenario(format!(
                "total_time {} gives no steps at dt {}",
                self.total_time, self.dt
            )));
        }
        SpatialCombiner::new(self.sigma1, self.sigma2)?;

        let velocities = match self.shape {
            TrajectoryShape::Turn { before, after, .. } => [before, after],
            TrajectoryShape::Straight { velocity } => [velocity, velocity],
        };
        let finite = |p: &Point2| p.iter().all(|v| v.is_finite());
        if !finite(&self.start_pos) || !velocities.iter().all(finite) {
            return Err(SimError::Scenario("positions and velocities must be finite".into()));
        }
        Ok(())
    }

    fn velocity_at(&self, step: usize, turn: Option<usize>) -> Point2 {
        match (self.shape, turn) {
            (TrajectoryShape::Turn { before, after, .. }, Some(turn)) => {
                if step < turn {
                    before
                } else {
                    after
                }
            }
            (TrajectoryShape::Turn { before, .. }, None) => before,
            (TrajectoryShape::Straight { velocity }, _) => velocity,
        }
    }
}

/// Noise-free path for `config`
pub fn ground_truth(config: &ScenarioConfig) -> Vec<Point2> {
    let steps = config.steps();
    let turn = config.maneuver_step();

    let mut position = config.start_pos;
    let mut truth = Vec::with_capacity(steps);
    for k in 0..steps {
        truth.push(position);
        let v = config.velocity_at(k, turn);
        position = [position[0] + v[0] * config.dt, position[1] + v[1] * config.dt];
    }
    truth
}

fn observe<R: rand::Rng>(truth: &[Point2], noise: &Normal<f64>, rng: &mut R) -> Vec<Point2> {
    truth
        .iter()
        .map(|p| {
            let x = p[0] + noise.sample(rng);
            let y = p[1] + noise.sample(rng);
            [x, y]
        })
        .collect()
}

/// Generate ground truth and both sensor streams
pub fn generate(config: &ScenarioConfig) -> SimResult<SensorLog> {
    config.validate()?;

    let truth = ground_truth(config);
    let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
    let noise1 = Normal::new(0.0, config.sigma1)
        .map_err(|e| SimError::Scenario(format!("sensor 1 noise: {e}")))?;
    let noise2 = Normal::new(0.0, config.sigma2)
        .map_err(|e| SimError::Scenario(format!("sensor 2 noise: {e}")))?;

    let z1 = observe(&truth, &noise1, &mut rng);
    let z2 = observe(&truth, &noise2, &mut rng);

    log::info!(
        "Generated {} steps (dt = {} s, seed {}), maneuver at {:?}",
        truth.len(),
        config.dt,
        config.seed,
        config.maneuver_step()
    );

    Ok(SensorLog {
        ground_truth: truth,
        z1,
        z2,
        sigma_1: config.sigma1,
        sigma_2: config.sigma2,
        dt: config.dt,
        turn_step: config.maneuver_step(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_reference_run() {
        let config = ScenarioConfig::default();
        assert_eq!(config.steps(), 200);
        assert_eq!(config.maneuver_step(), Some(100));
    }

    #[test]
    fn l_turn_changes_heading_at_turn_step() {
        let config = ScenarioConfig::default();
        let truth = ground_truth(&config);

        assert_eq!(truth[0], [0.0, 0.0]);
        // East until the turn step, then north
        assert!((truth[100][0] - 15.0).abs() < 1e-9);
        assert!(truth[100][1].abs() < 1e-12);
        assert!((truth[101][0] - 15.0).abs() < 1e-9);
        assert!((truth[101][1] - 0.15).abs() < 1e-9);
    }

    #[test]
    fn straight_has_no_maneuver() {
        let config = ScenarioConfig::default().with_shape(TrajectoryShape::straight());
        assert_eq!(config.maneuver_step(), None);

        let truth = ground_truth(&config);
        assert!((truth[10][0] - 1.5).abs() < 1e-9);
        assert!((truth[10][1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn generation_is_deterministic_per_seed() {
        let config = ScenarioConfig::default();
        let a = generate(&config).unwrap();
        let b = generate(&config).unwrap();
        let c = generate(&config.clone().with_seed(7)).unwrap();

        assert_eq!(a, b);
        assert_ne!(a.z1, c.z1);
        assert_eq!(a.ground_truth, c.ground_truth);
    }

    #[test]
    fn sensor_noise_matches_sigma() {
        let config = ScenarioConfig {
            total_time: 500.0,
            ..ScenarioConfig::default()
        };
        let log = generate(&config).unwrap();

        let rms = |z: &[Point2]| {
            let n = (2 * z.len()) as f64;
            let sum: f64 = z
                .iter()
                .zip(&log.ground_truth)
                .map(|(m, t)| (m[0] - t[0]).powi(2) + (m[1] - t[1]).powi(2))
                .sum();
            (sum / n).sqrt()
        };
        assert!((rms(&log.z1) - 2.0).abs() < 0.1);
        assert!((rms(&log.z2) - 1.0).abs() < 0.05);
    }

    #[test]
    fn invalid_scenarios_rejected() {
        let bad_dt = ScenarioConfig {
            dt: 0.0,
            ..ScenarioConfig::default()
        };
        assert!(matches!(generate(&bad_dt), Err(SimError::Scenario(_))));

        let bad_sigma = ScenarioConfig::default().with_sigmas(2.0, -1.0);
        assert!(matches!(generate(&bad_sigma), Err(SimError::Fusion(_))));

        let too_short = ScenarioConfig {
            total_time: 0.05,
            ..ScenarioConfig::default()
        };
        assert!(generate(&too_short).is_err());
    }

    #[test]
    fn shape_round_trips_through_json() {
        let json = r#"{"kind": "turn", "before": [2.0, 0.0], "after": [0.0, -2.0], "turn_step": 40}"#;
        let shape: TrajectoryShape = serde_json::from_str(json).unwrap();
        assert_eq!(
            shape,
            TrajectoryShape::Turn {
                before: [2.0, 0.0],
                after: [0.0, -2.0],
                turn_step: Some(40)
            }
        );
    }
}
