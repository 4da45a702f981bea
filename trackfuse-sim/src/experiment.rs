//! Standard vs adaptive experiment
//!
//! Generates (or takes) a [`SensorLog`], runs both filter configurations
//! over it and scores them:
//!
//! ```text
//! ScenarioConfig ─→ generate ─→ SensorLog ─→ run_comparison ─→ standard / adaptive traces
//!                                    │                               │
//!                                    └──────── ground truth ─────────┴─→ reports, maneuver errors
//! ```
//!
//! The filters start at the first ground-truth position with zero velocity.

use std::{fs, ops::Range, path::Path};

use serde::{Deserialize, Serialize};
use trackfuse_core::{
    constants::{
        DEFAULT_INITIAL_VARIANCE, DEFAULT_NIS_INFLATION_FACTOR, DEFAULT_NIS_THRESHOLD,
        DEFAULT_PROCESS_NOISE_STD,
    },
    metrics::region_error,
    run_comparison, FusionError, KalmanConfig, ModeComparison, PerformanceReport, Point2,
};

use crate::{
    dataset::SensorLog,
    error::SimResult,
    scenario::{generate, ScenarioConfig},
};

/// Experiment parameters, loadable from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    /// Data generation
    pub scenario: ScenarioConfig,
    /// Acceleration noise standard deviation σₐ
    pub process_noise_std: f64,
    /// Initial covariance diagonal
    pub initial_variance: f64,
    /// χ² threshold on NIS
    pub nis_threshold: f64,
    /// `Q` scale on inconsistent steps
    pub nis_inflation_factor: f64,
    /// Steps after the maneuver scored as the maneuver region
    pub maneuver_window: usize,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            scenario: ScenarioConfig::default(),
            process_noise_std: DEFAULT_PROCESS_NOISE_STD,
            initial_variance: DEFAULT_INITIAL_VARIANCE,
            nis_threshold: DEFAULT_NIS_THRESHOLD,
            nis_inflation_factor: DEFAULT_NIS_INFLATION_FACTOR,
            maneuver_window: 30,
        }
    }
}

impl ExperimentConfig {
    /// Read a JSON configuration; absent fields keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let raw = fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Check filter parameters, scenario and maneuver window
    pub fn validate(&self) -> SimResult<()> {
        self.kalman_config([0.0, 0.0], self.scenario.dt).validate()?;
        self.scenario.validate()?;
        self.check_maneuver_window()
    }

    fn check_maneuver_window(&self) -> SimResult<()> {
        if self.maneuver_window == 0 {
            return Err(FusionError::InvalidParameter {
                parameter: "maneuver_window",
                value: 0.0,
                reason: "must cover at least one step",
            }
            .into());
        }
        Ok(())
    }

    /// Filter configuration starting at `start_pos` with zero velocity
    pub fn kalman_config(&self, start_pos: Point2, dt: f64) -> KalmanConfig {
        KalmanConfig::seeded_from(start_pos, dt)
            .with_process_noise(self.process_noise_std)
            .with_initial_variance(self.initial_variance)
            .with_nis_threshold(self.nis_threshold)
            .with_inflation_factor(self.nis_inflation_factor)
    }
}

/// Mean errors over the maneuver region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManeuverScores {
    /// Scored steps
    pub window: Range<usize>,
    /// Standard filter mean error
    pub standard_error: f64,
    /// Adaptive filter mean error
    pub adaptive_error: f64,
    /// Largest standard-filter NIS inside the window
    pub peak_nis: f64,
}

impl ManeuverScores {
    /// Adaptive mean error at or below the standard one
    pub fn adaptive_no_worse(&self) -> bool {
        self.adaptive_error <= self.standard_error
    }
}

/// Everything produced by one experiment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExperimentOutcome {
    /// Input data
    pub log: SensorLog,
    /// Both filter runs
    pub comparison: ModeComparison,
    /// Whole-run scores of the standard filter
    pub standard: PerformanceReport,
    /// Whole-run scores of the adaptive filter
    pub adaptive: PerformanceReport,
    /// Maneuver-region scores, when the path has a maneuver
    pub maneuver: Option<ManeuverScores>,
    /// χ² threshold the adaptive run used
    pub nis_threshold: f64,
}

/// Generate the scenario and run the experiment on it
pub fn run_experiment(config: &ExperimentConfig) -> SimResult<ExperimentOutcome> {
    evaluate(config, generate(&config.scenario)?)
}

/// Run both filters over an existing log and score them
///
/// Only the filter parameters of `config` are used; the log carries its own
/// noise levels and time step.
pub fn evaluate(config: &ExperimentConfig, data: SensorLog) -> SimResult<ExperimentOutcome> {
    config.check_maneuver_window()?;
    data.validate()?;

    let kalman = config.kalman_config(data.ground_truth[0], data.dt);
    let comparison = run_comparison(&data.streams(), &kalman)?;

    let score = |positions: &[Point2]| {
        PerformanceReport::evaluate(
            &data.ground_truth,
            &data.z1,
            &data.z2,
            positions,
            data.sigma_1,
            data.sigma_2,
        )
    };
    let standard = score(&comparison.standard.positions)?;
    let adaptive = score(&comparison.adaptive.positions)?;

    let maneuver = match data.turn_step {
        Some(turn) if turn < data.len() => {
            let window = turn..(turn + config.maneuver_window).min(data.len());
            let peak_nis = comparison.standard.nis[window.clone()]
                .iter()
                .copied()
                .fold(0.0, f64::max);
            Some(ManeuverScores {
                standard_error: region_error(
                    &comparison.standard.positions,
                    &data.ground_truth,
                    window.clone(),
                )?,
                adaptive_error: region_error(
                    &comparison.adaptive.positions,
                    &data.ground_truth,
                    window.clone(),
                )?,
                peak_nis,
                window,
            })
        }
        _ => None,
    };

    log::info!(
        "Experiment: fused error {:.4} m (standard) / {:.4} m (adaptive), {} inflated steps",
        standard.fused_error,
        adaptive.fused_error,
        comparison.adaptive.inflation_count()
    );

    Ok(ExperimentOutcome {
        log: data,
        comparison,
        standard,
        adaptive,
        maneuver,
        nis_threshold: kalman.nis_threshold,
    })
}
