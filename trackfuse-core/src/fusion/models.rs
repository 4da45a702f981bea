//! Constant-Velocity Motion Model
//!
//! ## Overview
//!
//! The tracked object moves in the plane with state `[px, py, vx, vy]`.
//! Between steps the velocity is assumed constant and any acceleration is
//! treated as white noise held constant over one step (σₐ = process noise
//! standard deviation).
//!
//! ### State Transition
//! ```text
//!     ┌ 1  0  dt  0 ┐
//! F = │ 0  1  0  dt │      position += velocity · dt
//!     │ 0  0  1   0 │
//!     └ 0  0  0   1 ┘
//! ```
//!
//! ### Process Noise
//! ```text
//!          ┌ dt⁴/4   0      dt³/2   0     ┐
//! Q = σₐ²· │ 0       dt⁴/4  0       dt³/2 │
//!          │ dt³/2   0      dt²     0     │
//!          └ 0       dt³/2  0       dt²   ┘
//! ```
//!
//! ### Measurement
//! ```text
//! H = ┌ 1 0 0 0 ┐    only position is observed
//!     └ 0 1 0 0 ┘
//! ```

use crate::{
    constants::{MEASUREMENT_DIM, STATE_DIM},
    errors::{require_positive, FusionResult},
    fusion::matrix::{self, Matrix, SquareMatrix},
};

/// State transition model: `F` and its process noise `Q`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateTransition<const N: usize> {
    /// State transition matrix (F)
    pub transition_matrix: SquareMatrix<N>,
    /// Process noise covariance (Q)
    pub process_noise: SquareMatrix<N>,
}

impl StateTransition<STATE_DIM> {
    /// Constant-velocity model for step `dt` and acceleration noise `process_noise_std`
    pub fn constant_velocity(dt: f64, process_noise_std: f64) -> FusionResult<Self> {
        let dt = require_positive("dt", dt)?;
        let q = require_positive("process_noise_std", process_noise_std)?;

        Ok(Self {
            transition_matrix: constant_velocity_transition(dt),
            process_noise: constant_velocity_noise(dt, q * q),
        })
    }

    /// Process noise scaled by `factor`
    pub fn inflated_noise(&self, factor: f64) -> SquareMatrix<STATE_DIM> {
        let mut scaled = [[0.0; STATE_DIM]; STATE_DIM];
        matrix::scale(&self.process_noise, factor, &mut scaled);
        scaled
    }
}

/// `F` for a constant-velocity model
pub fn constant_velocity_transition(dt: f64) -> SquareMatrix<STATE_DIM> {
    let mut f = matrix::identity::<STATE_DIM>();
    f[0][2] = dt; // px += vx * dt
    f[1][3] = dt; // py += vy * dt
    f
}

/// Piecewise-constant white acceleration noise with variance `accel_variance`
pub fn constant_velocity_noise(dt: f64, accel_variance: f64) -> SquareMatrix<STATE_DIM> {
    let dt2 = dt * dt;
    let dt3 = dt2 * dt;
    let dt4 = dt3 * dt;

    let base = [
        [dt4 / 4.0, 0.0, dt3 / 2.0, 0.0],
        [0.0, dt4 / 4.0, 0.0, dt3 / 2.0],
        [dt3 / 2.0, 0.0, dt2, 0.0],
        [0.0, dt3 / 2.0, 0.0, dt2],
    ];

    let mut q = [[0.0; STATE_DIM]; STATE_DIM];
    matrix::scale(&base, accel_variance, &mut q);
    q
}

/// `H` selecting the position sub-vector
pub fn position_measurement_matrix() -> Matrix<MEASUREMENT_DIM, STATE_DIM> {
    [[1.0, 0.0, 0.0, 0.0], [0.0, 1.0, 0.0, 0.0]]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_advances_position_by_velocity() {
        let model = StateTransition::constant_velocity(0.1, 0.5).unwrap();
        let mut next = [0.0; 4];
        matrix::matvec(&model.transition_matrix, &[1.0, 2.0, 3.0, -4.0], &mut next);

        assert!((next[0] - 1.3).abs() < 1e-12);
        assert!((next[1] - 1.6).abs() < 1e-12);
        assert_eq!(next[2], 3.0);
        assert_eq!(next[3], -4.0);
    }

    #[test]
    fn process_noise_values() {
        let model = StateTransition::constant_velocity(0.1, 0.5).unwrap();
        let q = model.process_noise;
        let var = 0.25;

        assert!((q[0][0] - var * 1e-4 / 4.0).abs() < 1e-15);
        assert!((q[0][2] - var * 1e-3 / 2.0).abs() < 1e-15);
        assert!((q[2][2] - var * 1e-2).abs() < 1e-15);
        assert_eq!(q[0][1], 0.0);
        assert_eq!(q[0][3], 0.0);
        assert_eq!(matrix::max_asymmetry(&q), 0.0);
    }

    #[test]
    fn process_noise_is_psd() {
        let model = StateTransition::constant_velocity(0.25, 2.0).unwrap();
        assert!(matrix::is_positive_semidefinite(&model.process_noise, 1e-9, 0.0));
    }

    #[test]
    fn inflation_scales_every_entry() {
        let model = StateTransition::constant_velocity(0.1, 0.5).unwrap();
        let inflated = model.inflated_noise(10.0);
        for i in 0..4 {
            for j in 0..4 {
                assert!((inflated[i][j] - 10.0 * model.process_noise[i][j]).abs() < 1e-15);
            }
        }
    }

    #[test]
    fn invalid_parameters_rejected() {
        assert!(StateTransition::constant_velocity(0.0, 0.5).is_err());
        assert!(StateTransition::constant_velocity(-0.1, 0.5).is_err());
        assert!(StateTransition::constant_velocity(0.1, 0.0).is_err());
    }

    #[test]
    fn measurement_selects_position() {
        let h = position_measurement_matrix();
        let mut z = [0.0; 2];
        matrix::matvec(&h, &[5.0, 6.0, 7.0, 8.0], &mut z);
        assert_eq!(z, [5.0, 6.0]);
    }
}
