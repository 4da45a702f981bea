//! Constant-Velocity Kalman Filter with Optional Adaptive Process Noise
//!
//! ## Overview
//!
//! Tracks `x = [px, py, vx, vy]` from a stream of fused position
//! measurements. The filter owns `x` and its covariance `P`; everything else
//! in a step is local to that step.
//!
//! ### 1. Prediction Step
//! ```text
//! State prediction:      x̂ = F·x
//! Covariance prediction: P̂ = F·P·Fᵀ + Q
//! ```
//!
//! ### 2. Correction Step
//! ```text
//! Innovation:      y = z - H·x̂
//! Innovation cov:  S = H·P̂·Hᵀ + R
//! NIS:             yᵀ·S⁻¹·y
//! Kalman gain:     K = P̂·Hᵀ·S⁻¹
//! State update:    x = x̂ + K·y
//! Covariance:      P = (I - K·H)·P̂·(I - K·H)ᵀ + K·R·Kᵀ
//! ```
//!
//! The covariance update uses the Joseph form, which equals `(I - K·H)·P̂`
//! for the optimal gain and stays symmetric PSD under round-off.
//!
//! ### Adaptive Mode
//!
//! In [`FilterMode::Adaptive`] the NIS of the nominal prediction is tested
//! against the χ² threshold. Above it, `P̂` is recomputed as
//! `F·P·Fᵀ + factor·Q` and `S`, `K` follow from the inflated `P̂`. The
//! reported NIS is always the nominal one, the value the decision was made on.
//!
//! ## Phases
//!
//! ```text
//!            predict()               update()
//! Corrected ──────────→ Predicted ──────────→ Corrected
//!     │                                          ↑
//!     └──────────────── update() ────────────────┘
//! ```
//!
//! A fresh filter is `Corrected`: it was seeded from a start position and
//! velocity, and no prediction precedes the first correction. `update`
//! predicts first when the filter is `Corrected`.
//!
//! ## Failure
//!
//! A step is all-or-nothing. Every quantity is computed into locals and
//! committed only after the new `P` passed the PSD check. On any error the
//! filter is exactly as it was before the call.
//!
//! ## Usage Example
//!
//! ```rust
//! use trackfuse_core::fusion::{FilterMode, FusedMeasurement, KalmanConfig, KalmanFilter};
//!
//! let config = KalmanConfig::seeded_from([0.0, 0.0], 0.1)
//!     .with_process_noise(0.5)
//!     .with_mode(FilterMode::Adaptive);
//! let mut kf = KalmanFilter::new(config).unwrap();
//!
//! let estimate = kf.update(&FusedMeasurement::isotropic([1.0, 0.0], 0.8)).unwrap();
//! assert!(estimate.position[0] > 0.0 && estimate.position[0] < 1.0);
//! assert!(estimate.nis >= 0.0);
//! ```

use crate::{
    constants::{
        DEFAULT_INITIAL_VARIANCE, DEFAULT_NIS_INFLATION_FACTOR, DEFAULT_NIS_THRESHOLD,
        DEFAULT_PROCESS_NOISE_STD, MEASUREMENT_DIM, MIN_INNOVATION_CONDITION,
        PSD_RELATIVE_JITTER, STATE_DIM, SYMMETRY_RELATIVE_TOLERANCE,
    },
    errors::{require_positive, FusionError, FusionResult},
    fusion::{
        adaptive::{self, NoiseDecision, NoiseMonitor},
        matrix::{
            self, add, determinant_2x2, invert_2x2, make_symmetric, matvec, multiply,
            transpose, Matrix, SquareMatrix, Vector,
        },
        models::{position_measurement_matrix, StateTransition},
        spatial::FusedMeasurement,
        Point2,
    },
};

/// Whether the NIS test may inflate the process noise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterMode {
    /// Nominal `Q` on every step
    #[default]
    Standard,
    /// `Q` inflated on steps whose NIS exceeds the threshold
    Adaptive,
}

/// Observable filter phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FilterPhase {
    /// `x`, `P` hold a prediction awaiting its measurement
    Predicted,
    /// `x`, `P` hold the posterior of the last measurement (or the seed)
    Corrected,
}

/// Kalman filter configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct KalmanConfig {
    /// Time between measurements in seconds
    pub dt: f64,
    /// Initial position; `None` lets the batch runner seed from the first
    /// fused measurement (a filter built directly starts at the origin)
    pub start_pos: Option<Point2>,
    /// Initial velocity
    pub start_vel: Point2,
    /// Acceleration noise standard deviation σₐ
    pub process_noise_std: f64,
    /// Diagonal of the initial covariance `P₀`
    pub initial_variance: f64,
    /// Standard or adaptive process noise
    pub mode: FilterMode,
    /// χ² threshold on NIS
    pub nis_threshold: f64,
    /// `Q` scale on steps above the threshold
    pub nis_inflation_factor: f64,
}

impl Default for KalmanConfig {
    fn default() -> Self {
        Self {
            dt: 0.1,
            start_pos: None,
            start_vel: [0.0, 0.0],
            process_noise_std: DEFAULT_PROCESS_NOISE_STD,
            initial_variance: DEFAULT_INITIAL_VARIANCE,
            mode: FilterMode::Standard,
            nis_threshold: DEFAULT_NIS_THRESHOLD,
            nis_inflation_factor: DEFAULT_NIS_INFLATION_FACTOR,
        }
    }
}

impl KalmanConfig {
    /// Start at `first_measurement` with zero velocity
    pub fn seeded_from(first_measurement: Point2, dt: f64) -> Self {
        Self {
            dt,
            start_pos: Some(first_measurement),
            ..Self::default()
        }
    }

    /// Set the time step
    pub fn with_dt(mut self, dt: f64) -> Self {
        self.dt = dt;
        self
    }

    /// Set the initial position
    pub fn with_start_pos(mut self, start_pos: Point2) -> Self {
        self.start_pos = Some(start_pos);
        self
    }

    /// Set the initial velocity
    pub fn with_start_vel(mut self, start_vel: Point2) -> Self {
        self.start_vel = start_vel;
        self
    }

    /// Set process noise (higher = less trust in the constant-velocity model)
    pub fn with_process_noise(mut self, process_noise_std: f64) -> Self {
        self.process_noise_std = process_noise_std;
        self
    }

    /// Set the initial covariance diagonal
    pub fn with_initial_variance(mut self, initial_variance: f64) -> Self {
        self.initial_variance = initial_variance;
        self
    }

    /// Select standard or adaptive process noise
    pub fn with_mode(mut self, mode: FilterMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the NIS threshold
    pub fn with_nis_threshold(mut self, threshold: f64) -> Self {
        self.nis_threshold = threshold;
        self
    }

    /// Set the `Q` inflation factor
    pub fn with_inflation_factor(mut self, factor: f64) -> Self {
        self.nis_inflation_factor = factor;
        self
    }

    /// Check every parameter against its domain
    pub fn validate(&self) -> FusionResult<()> {
        require_positive("dt", self.dt)?;
        require_positive("process_noise_std", self.process_noise_std)?;
        require_positive("initial_variance", self.initial_variance)?;
        NoiseMonitor::new(self.nis_threshold, self.nis_inflation_factor)?;

        let start = self.start_pos.unwrap_or([0.0, 0.0]);
        for (parameter, pair) in [("start_pos", start), ("start_vel", self.start_vel)] {
            if let Some(bad) = pair.iter().copied().find(|v| !v.is_finite()) {
                return Err(FusionError::invalid(parameter, bad, "must be finite"));
            }
        }

        Ok(())
    }

    /// Seed state `[px, py, vx, vy]`
    pub fn initial_state(&self) -> Vector<STATE_DIM> {
        let [px, py] = self.start_pos.unwrap_or([0.0, 0.0]);
        let [vx, vy] = self.start_vel;
        [px, py, vx, vy]
    }

    /// Seed covariance `initial_variance · I`
    pub fn initial_covariance(&self) -> SquareMatrix<STATE_DIM> {
        let mut p = [[0.0; STATE_DIM]; STATE_DIM];
        matrix::scale(&matrix::identity(), self.initial_variance, &mut p);
        p
    }
}

/// Result of one correction
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepEstimate {
    /// Corrected position `(x₀, x₁)`
    pub position: Point2,
    /// Corrected velocity `(x₂, x₃)`
    pub velocity: Point2,
    /// Normalized innovation squared against the nominal prediction
    pub nis: f64,
    /// Whether this step used inflated process noise
    pub inflated: bool,
    /// Innovation `y = z - H·x̂`
    pub innovation: Vector<MEASUREMENT_DIM>,
}

/// Posterior computed for a step but not yet committed
struct Correction {
    state: Vector<STATE_DIM>,
    covariance: SquareMatrix<STATE_DIM>,
    innovation: Vector<MEASUREMENT_DIM>,
    nis: f64,
    decision: NoiseDecision,
}

/// Kalman filter for 2D constant-velocity tracking
#[derive(Debug, Clone)]
pub struct KalmanFilter {
    /// Current state estimate
    state: Vector<STATE_DIM>,
    /// Estimation error covariance
    covariance: SquareMatrix<STATE_DIM>,
    /// Covariance before the pending prediction; `Some` while `Predicted`
    prior_covariance: Option<SquareMatrix<STATE_DIM>>,
    transition: StateTransition<STATE_DIM>,
    measurement_matrix: Matrix<MEASUREMENT_DIM, STATE_DIM>,
    measurement_transpose: Matrix<STATE_DIM, MEASUREMENT_DIM>,
    monitor: NoiseMonitor,
    config: KalmanConfig,
    /// Completed corrections
    steps: usize,
    inflation_count: usize,
}

impl KalmanFilter {
    /// Create a filter seeded from `config`
    pub fn new(config: KalmanConfig) -> FusionResult<Self> {
        config.validate()?;
        let transition = StateTransition::constant_velocity(config.dt, config.process_noise_std)?;
        let monitor = NoiseMonitor::new(config.nis_threshold, config.nis_inflation_factor)?;

        let measurement_matrix = position_measurement_matrix();
        let mut measurement_transpose = [[0.0; MEASUREMENT_DIM]; STATE_DIM];
        transpose(&measurement_matrix, &mut measurement_transpose);

        Ok(Self {
            state: config.initial_state(),
            covariance: config.initial_covariance(),
            prior_covariance: None,
            transition,
            measurement_matrix,
            measurement_transpose,
            monitor,
            config,
            steps: 0,
            inflation_count: 0,
        })
    }

    /// Advance `x` and `P` by one time step without a measurement
    ///
    /// Leaves the filter `Predicted`. Calling it again coasts one more step;
    /// an inflated re-prediction in the following `update` then replaces the
    /// last of those steps only.
    pub fn predict(&mut self) -> FusionResult<()> {
        let (state, covariance) = self.propagate(&self.state, &self.covariance)?;
        self.prior_covariance = Some(self.covariance);
        self.state = state;
        self.covariance = covariance;
        Ok(())
    }

    /// Run one full predict/correct cycle with a fused measurement
    ///
    /// Predicts first unless a prediction is already pending. On error the
    /// filter is left untouched.
    pub fn update(&mut self, measurement: &FusedMeasurement) -> FusionResult<StepEstimate> {
        let (predicted_state, predicted_cov, prior_cov) = match self.prior_covariance {
            Some(prior) => (self.state, self.covariance, prior),
            None => {
                let (state, covariance) = self.propagate(&self.state, &self.covariance)?;
                (state, covariance, self.covariance)
            }
        };

        let correction = self
            .correct(&predicted_state, &predicted_cov, &prior_cov, measurement)
            .map_err(|e| {
                log_warn!("Rejected step {}: {}", self.steps, e);
                e
            })?;

        if correction.decision.is_inflated() {
            self.inflation_count += 1;
            log_debug!(
                "Step {}: NIS {:.3} above {:.3}, process noise x{}",
                self.steps,
                correction.nis,
                self.monitor.threshold(),
                correction.decision.scale()
            );
        }

        self.state = correction.state;
        self.covariance = correction.covariance;
        self.prior_covariance = None;
        self.steps += 1;

        Ok(StepEstimate {
            position: self.position(),
            velocity: self.velocity(),
            nis: correction.nis,
            inflated: correction.decision.is_inflated(),
            innovation: correction.innovation,
        })
    }

    /// Restore the seed state and covariance
    pub fn reset(&mut self) {
        self.state = self.config.initial_state();
        self.covariance = self.config.initial_covariance();
        self.prior_covariance = None;
        self.steps = 0;
        self.inflation_count = 0;
    }

    /// State vector `[px, py, vx, vy]`
    pub fn state(&self) -> &Vector<STATE_DIM> {
        &self.state
    }

    /// State covariance `P`
    pub fn covariance(&self) -> &SquareMatrix<STATE_DIM> {
        &self.covariance
    }

    /// Position `(x₀, x₁)`
    pub fn position(&self) -> Point2 {
        [self.state[0], self.state[1]]
    }

    /// Velocity `(x₂, x₃)`
    pub fn velocity(&self) -> Point2 {
        [self.state[2], self.state[3]]
    }

    /// Current phase
    pub fn phase(&self) -> FilterPhase {
        if self.prior_covariance.is_some() {
            FilterPhase::Predicted
        } else {
            FilterPhase::Corrected
        }
    }

    /// Number of committed corrections
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Number of corrections that used inflated process noise
    pub fn inflation_count(&self) -> usize {
        self.inflation_count
    }

    /// Configuration the filter was built from
    pub fn config(&self) -> &KalmanConfig {
        &self.config
    }

    /// Motion model in use
    pub fn transition(&self) -> &StateTransition<STATE_DIM> {
        &self.transition
    }

    // ===== PREDICTION =====

    fn propagate(
        &self,
        state: &Vector<STATE_DIM>,
        covariance: &SquareMatrix<STATE_DIM>,
    ) -> FusionResult<(Vector<STATE_DIM>, SquareMatrix<STATE_DIM>)> {
        // x̂ = F·x
        let mut predicted_state = [0.0; STATE_DIM];
        matvec(&self.transition.transition_matrix, state, &mut predicted_state);

        let predicted_cov = self.predict_covariance(covariance, &self.transition.process_noise)?;

        if !predicted_state.iter().all(|v| v.is_finite()) {
            return Err(FusionError::NonFinite {
                quantity: "predicted state",
            });
        }

        Ok((predicted_state, predicted_cov))
    }

    /// `F·P·Fᵀ + Q`
    fn predict_covariance(
        &self,
        covariance: &SquareMatrix<STATE_DIM>,
        process_noise: &SquareMatrix<STATE_DIM>,
    ) -> FusionResult<SquareMatrix<STATE_DIM>> {
        let f = &self.transition.transition_matrix;

        let mut fp = [[0.0; STATE_DIM]; STATE_DIM];
        multiply(f, covariance, &mut fp);

        let mut f_transpose = [[0.0; STATE_DIM]; STATE_DIM];
        transpose(f, &mut f_transpose);
        let mut fpft = [[0.0; STATE_DIM]; STATE_DIM];
        multiply(&fp, &f_transpose, &mut fpft);

        let mut predicted = [[0.0; STATE_DIM]; STATE_DIM];
        add(&fpft, process_noise, &mut predicted);
        make_symmetric(&mut predicted);

        if !matrix::is_finite(&predicted) {
            return Err(FusionError::NonFinite {
                quantity: "predicted covariance",
            });
        }
        Ok(predicted)
    }

    // ===== CORRECTION =====

    fn correct(
        &self,
        predicted_state: &Vector<STATE_DIM>,
        predicted_cov: &SquareMatrix<STATE_DIM>,
        prior_cov: &SquareMatrix<STATE_DIM>,
        measurement: &FusedMeasurement,
    ) -> FusionResult<Correction> {
        if !measurement.position.iter().all(|v| v.is_finite())
            || !matrix::is_finite(&measurement.covariance)
        {
            return Err(FusionError::NonFinite {
                quantity: "fused measurement",
            });
        }
        let r = &measurement.covariance;

        // y = z - H·x̂
        let mut predicted_measurement = [0.0; MEASUREMENT_DIM];
        matvec(&self.measurement_matrix, predicted_state, &mut predicted_measurement);
        let innovation = [
            measurement.position[0] - predicted_measurement[0],
            measurement.position[1] - predicted_measurement[1],
        ];

        let nominal_s_inv = self.innovation_inverse(predicted_cov, r)?;
        let nis = adaptive::normalized_innovation_squared(&innovation, &nominal_s_inv);

        let decision = match self.config.mode {
            FilterMode::Standard => NoiseDecision::Nominal,
            FilterMode::Adaptive => self.monitor.assess(nis),
        };

        let (covariance, s_inv) = match decision {
            NoiseDecision::Nominal => (*predicted_cov, nominal_s_inv),
            NoiseDecision::Inflate { factor } => {
                let inflated_q = self.transition.inflated_noise(factor);
                let inflated = self.predict_covariance(prior_cov, &inflated_q)?;
                let s_inv = self.innovation_inverse(&inflated, r)?;
                (inflated, s_inv)
            }
        };

        // K = P̂·Hᵀ·S⁻¹
        let mut pht = [[0.0; MEASUREMENT_DIM]; STATE_DIM];
        multiply(&covariance, &self.measurement_transpose, &mut pht);
        let mut gain = [[0.0; MEASUREMENT_DIM]; STATE_DIM];
        multiply(&pht, &s_inv, &mut gain);

        // x = x̂ + K·y
        let mut correction = [0.0; STATE_DIM];
        matvec(&gain, &innovation, &mut correction);
        let mut state = *predicted_state;
        for (x, dx) in state.iter_mut().zip(correction.iter()) {
            *x += dx;
        }
        if !state.iter().all(|v| v.is_finite()) {
            return Err(FusionError::NonFinite { quantity: "state" });
        }

        let covariance = joseph_update(&covariance, &gain, &self.measurement_matrix, r);
        if !matrix::is_positive_semidefinite(
            &covariance,
            PSD_RELATIVE_JITTER,
            SYMMETRY_RELATIVE_TOLERANCE,
        ) {
            return Err(FusionError::CovarianceNotPsd { step: self.steps });
        }

        Ok(Correction {
            state,
            covariance,
            innovation,
            nis,
            decision,
        })
    }

    /// `S⁻¹` for `S = H·P̂·Hᵀ + R`
    ///
    /// `S` must be positive definite and well conditioned: positive diagonal
    /// and `det(S) > MIN_INNOVATION_CONDITION·S₀₀·S₁₁`. The test is
    /// independent of the measurement units.
    fn innovation_inverse(
        &self,
        predicted_cov: &SquareMatrix<STATE_DIM>,
        measurement_noise: &SquareMatrix<MEASUREMENT_DIM>,
    ) -> FusionResult<SquareMatrix<MEASUREMENT_DIM>> {
        let mut hp = [[0.0; STATE_DIM]; MEASUREMENT_DIM];
        multiply(&self.measurement_matrix, predicted_cov, &mut hp);
        let mut hpht = [[0.0; MEASUREMENT_DIM]; MEASUREMENT_DIM];
        multiply(&hp, &self.measurement_transpose, &mut hpht);

        let mut s = [[0.0; MEASUREMENT_DIM]; MEASUREMENT_DIM];
        add(&hpht, measurement_noise, &mut s);

        let determinant = determinant_2x2(&s);
        let diagonal = s[0][0] * s[1][1];
        if !(s[0][0] > 0.0 && s[1][1] > 0.0 && determinant > MIN_INNOVATION_CONDITION * diagonal)
        {
            return Err(FusionError::SingularInnovation { determinant });
        }

        let mut s_inv = [[0.0; MEASUREMENT_DIM]; MEASUREMENT_DIM];
        if !invert_2x2(&s, &mut s_inv) {
            return Err(FusionError::SingularInnovation { determinant });
        }
        Ok(s_inv)
    }
}

/// Joseph form covariance update
///
/// `P = (I - K·H)·P̂·(I - K·H)ᵀ + K·R·Kᵀ`, symmetrized.
fn joseph_update<const N: usize, const M: usize>(
    predicted_cov: &SquareMatrix<N>,
    gain: &Matrix<N, M>,
    measurement_matrix: &Matrix<M, N>,
    measurement_noise: &SquareMatrix<M>,
) -> SquareMatrix<N> {
    let mut kh = [[0.0; N]; N];
    multiply(gain, measurement_matrix, &mut kh);

    let mut i_kh = matrix::identity::<N>();
    for i in 0..N {
        for j in 0..N {
            i_kh[i][j] -= kh[i][j];
        }
    }

    let mut left = [[0.0; N]; N];
    multiply(&i_kh, predicted_cov, &mut left);
    let mut i_kh_t = [[0.0; N]; N];
    transpose(&i_kh, &mut i_kh_t);
    let mut propagated = [[0.0; N]; N];
    multiply(&left, &i_kh_t, &mut propagated);

    let mut kr = [[0.0; M]; N];
    multiply(gain, measurement_noise, &mut kr);
    let mut k_t = [[0.0; N]; M];
    transpose(gain, &mut k_t);
    let mut krk = [[0.0; N]; N];
    multiply(&kr, &k_t, &mut krk);

    let mut updated = [[0.0; N]; N];
    add(&propagated, &krk, &mut updated);
    make_symmetric(&mut updated);
    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{constants::CHI2_95_2DOF, errors::ErrorKind};

    const DT: f64 = 0.1;
    const FUSED_VARIANCE: f64 = 0.8; // σ₁ = 2, σ₂ = 1

    fn measurement(position: Point2) -> FusedMeasurement {
        FusedMeasurement::isotropic(position, FUSED_VARIANCE)
    }

    /// Noise-free "L": east at `speed` until `turn`, then north
    fn l_turn(step: usize, turn: usize, speed: f64) -> Point2 {
        if step <= turn {
            [speed * step as f64 * DT, 0.0]
        } else {
            [speed * turn as f64 * DT, speed * (step - turn) as f64 * DT]
        }
    }

    fn distance(a: Point2, b: Point2) -> f64 {
        libm::hypot(a[0] - b[0], a[1] - b[1])
    }

    #[test]
    fn first_correction_moves_toward_measurement() {
        let config = KalmanConfig::seeded_from([0.0, 0.0], DT);
        let mut kf = KalmanFilter::new(config).unwrap();
        assert_eq!(kf.phase(), FilterPhase::Corrected);

        let estimate = kf.update(&measurement([1.0, 0.0])).unwrap();

        assert!(estimate.position[0] > 0.0 && estimate.position[0] < 1.0);
        assert!((estimate.position[0] - 0.9266).abs() < 1e-3);
        assert_eq!(estimate.position[1], 0.0);
        assert!(estimate.nis >= 0.0);
        assert!(!estimate.inflated);
        assert_eq!(kf.phase(), FilterPhase::Corrected);
        assert_eq!(kf.steps(), 1);
    }

    #[test]
    fn explicit_predict_then_update() {
        let config = KalmanConfig::seeded_from([0.0, 0.0], DT).with_start_vel([2.0, -1.0]);
        let mut kf = KalmanFilter::new(config).unwrap();

        kf.predict().unwrap();
        assert_eq!(kf.phase(), FilterPhase::Predicted);
        assert!((kf.position()[0] - 0.2).abs() < 1e-12);
        assert!((kf.position()[1] + 0.1).abs() < 1e-12);
        assert!(kf.covariance()[0][0] > DEFAULT_INITIAL_VARIANCE);

        // Correcting the pending prediction must not predict again
        let mut direct = KalmanFilter::new(config).unwrap();
        let via_predict = kf.update(&measurement([0.2, -0.1])).unwrap();
        let via_update = direct.update(&measurement([0.2, -0.1])).unwrap();
        assert_eq!(via_predict, via_update);
        assert_eq!(kf.phase(), FilterPhase::Corrected);
    }

    #[test]
    fn covariance_stays_symmetric_psd() {
        let config = KalmanConfig::seeded_from([0.0, 0.0], DT).with_mode(FilterMode::Adaptive);
        let mut kf = KalmanFilter::new(config).unwrap();

        for k in 0..1000 {
            let t = k as f64 * DT;
            let z = [2.0 * t + 3.0 * libm::sin(t), libm::cos(3.0 * t) * 4.0];
            kf.update(&measurement(z)).unwrap();

            let p = kf.covariance();
            assert_eq!(matrix::max_asymmetry(p), 0.0);
            assert!(matrix::is_positive_semidefinite(
                p,
                PSD_RELATIVE_JITTER,
                SYMMETRY_RELATIVE_TOLERANCE
            ));
        }
    }

    #[test]
    fn singular_innovation_leaves_state_unchanged() {
        let config = KalmanConfig::seeded_from([1.0, 2.0], DT).with_start_vel([0.5, 0.5]);
        let mut kf = KalmanFilter::new(config).unwrap();
        kf.update(&measurement([1.05, 2.05])).unwrap();

        // Cancel H·P̂·Hᵀ exactly so that S = 0
        let mut predicted = kf.clone();
        predicted.predict().unwrap();
        let a = predicted.covariance()[0][0];
        let degenerate = FusedMeasurement::isotropic([1.1, 2.1], -a);

        let state = *kf.state();
        let covariance = *kf.covariance();
        let err = kf.update(&degenerate).unwrap_err();

        assert!(matches!(err, FusionError::SingularInnovation { .. }));
        assert_eq!(err.kind(), ErrorKind::Numerical);
        assert_eq!(*kf.state(), state);
        assert_eq!(*kf.covariance(), covariance);
        assert_eq!(kf.phase(), FilterPhase::Corrected);
        assert_eq!(kf.steps(), 1);

        // Same from the predicted phase
        let err = predicted.update(&degenerate).unwrap_err();
        assert!(matches!(err, FusionError::SingularInnovation { .. }));
        assert_eq!(predicted.phase(), FilterPhase::Predicted);
        assert_eq!(predicted.covariance()[0][0], a);
    }

    #[test]
    fn ill_conditioned_innovation_rejected_at_any_scale() {
        let config = KalmanConfig::seeded_from([0.0, 0.0], DT);
        let mut predicted = KalmanFilter::new(config).unwrap();
        predicted.predict().unwrap();
        let a = predicted.covariance()[0][0];

        // S = scale·[[1, 1 - 1e-14], [1 - 1e-14, 1]]: det(S) is large in
        // absolute terms but the axes are almost perfectly correlated
        let scale = 1e6;
        let coupling = scale * (1.0 - 1e-14);
        let nearly_singular = FusedMeasurement {
            position: [0.1, 0.1],
            covariance: [[scale - a, coupling], [coupling, scale - a]],
        };

        let err = predicted.update(&nearly_singular).unwrap_err();
        match err {
            FusionError::SingularInnovation { determinant } => assert!(determinant > 1e-3),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(predicted.phase(), FilterPhase::Predicted);
    }

    #[test]
    fn millimetre_sensors_accepted() {
        // σ₁ = σ₂ = 1 mm fused, sampled at 100 Hz
        for (sigma, mode) in [
            (1e-3, FilterMode::Standard),
            (1e-3, FilterMode::Adaptive),
            (1e-4, FilterMode::Standard),
        ] {
            let variance = sigma * sigma / 2.0;
            let config = KalmanConfig::seeded_from([0.0, 0.0], 0.01).with_mode(mode);
            let mut kf = KalmanFilter::new(config).unwrap();

            let mut last = [0.0, 0.0];
            for k in 0..500 {
                let t = k as f64 * 0.01;
                last = [t, 0.5 * t];
                let estimate = kf
                    .update(&FusedMeasurement::isotropic(last, variance))
                    .unwrap_or_else(|e| panic!("σ = {sigma}, step {k}: {e:?}"));
                assert!(estimate.nis >= 0.0);
                assert!(matrix::is_positive_semidefinite(
                    kf.covariance(),
                    PSD_RELATIVE_JITTER,
                    SYMMETRY_RELATIVE_TOLERANCE
                ));
            }
            assert!(distance(kf.position(), last) < sigma);
            assert!(kf.covariance()[0][0] < variance);
        }
    }

    #[test]
    fn non_finite_measurement_rejected() {
        let mut kf = KalmanFilter::new(KalmanConfig::seeded_from([0.0, 0.0], DT)).unwrap();
        let before = *kf.state();

        let err = kf.update(&measurement([f64::NAN, 0.0])).unwrap_err();
        assert_eq!(
            err,
            FusionError::NonFinite {
                quantity: "fused measurement"
            }
        );
        assert_eq!(*kf.state(), before);
        assert_eq!(kf.steps(), 0);
    }

    #[test]
    fn sharp_turn_exceeds_chi2_threshold() {
        let turn = 100;
        let config = KalmanConfig::seeded_from([0.0, 0.0], DT).with_start_vel([5.0, 0.0]);
        let mut kf = KalmanFilter::new(config).unwrap();

        let mut max_before = 0.0f64;
        let mut max_after = 0.0f64;
        for k in 0..turn + 20 {
            let estimate = kf.update(&measurement(l_turn(k, turn, 5.0))).unwrap();
            assert!(estimate.nis >= 0.0);
            if k <= turn {
                max_before = max_before.max(estimate.nis);
            } else {
                max_after = max_after.max(estimate.nis);
            }
        }

        assert!(max_before < CHI2_95_2DOF);
        assert!(max_after > CHI2_95_2DOF);
        assert_eq!(kf.inflation_count(), 0);
    }

    #[test]
    fn adaptive_tracks_turn_at_least_as_well() {
        let turn = 100;
        let base = KalmanConfig::seeded_from([0.0, 0.0], DT).with_start_vel([5.0, 0.0]);
        let mut standard = KalmanFilter::new(base).unwrap();
        let mut adaptive = KalmanFilter::new(base.with_mode(FilterMode::Adaptive)).unwrap();

        let mut standard_error = 0.0;
        let mut adaptive_error = 0.0;
        for k in 0..turn + 30 {
            let truth = l_turn(k, turn, 5.0);
            let s = standard.update(&measurement(truth)).unwrap();
            let a = adaptive.update(&measurement(truth)).unwrap();
            if k >= turn {
                standard_error += distance(s.position, truth);
                adaptive_error += distance(a.position, truth);
            }
        }

        assert!(adaptive_error <= standard_error);
        assert!(adaptive.inflation_count() > 0);
        assert_eq!(standard.inflation_count(), 0);
    }

    #[test]
    fn adaptive_quiet_on_consistent_motion() {
        let velocity = [1.5, 1.0];
        let config = KalmanConfig::seeded_from([0.0, 0.0], DT)
            .with_start_vel(velocity)
            .with_mode(FilterMode::Adaptive);
        let mut kf = KalmanFilter::new(config).unwrap();

        for k in 0..300 {
            let t = k as f64 * DT;
            let estimate = kf
                .update(&measurement([velocity[0] * t, velocity[1] * t]))
                .unwrap();
            assert!(!estimate.inflated);
        }
        assert_eq!(kf.inflation_count(), 0);
    }

    #[test]
    fn reset_restores_seed() {
        let config = KalmanConfig::seeded_from([3.0, 4.0], DT);
        let mut kf = KalmanFilter::new(config).unwrap();
        kf.update(&measurement([3.5, 4.5])).unwrap();
        kf.predict().unwrap();

        kf.reset();
        assert_eq!(*kf.state(), [3.0, 4.0, 0.0, 0.0]);
        assert_eq!(*kf.covariance(), config.initial_covariance());
        assert_eq!(kf.phase(), FilterPhase::Corrected);
        assert_eq!(kf.steps(), 0);
    }

    #[test]
    fn invalid_configuration_rejected() {
        let base = KalmanConfig::default();
        let bad = [
            base.with_dt(0.0),
            base.with_dt(-0.1),
            base.with_process_noise(0.0),
            base.with_initial_variance(-1.0),
            base.with_nis_threshold(0.0),
            base.with_inflation_factor(1.0),
            base.with_start_pos([f64::NAN, 0.0]),
            base.with_start_vel([0.0, f64::INFINITY]),
        ];

        for config in bad {
            let err = KalmanFilter::new(config).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Configuration, "{config:?}");
        }
        assert!(KalmanFilter::new(base).is_ok());
    }
}
