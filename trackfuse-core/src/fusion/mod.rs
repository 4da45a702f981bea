//! Dual-Sensor Position Fusion and Temporal Tracking
//!
//! ## Overview
//!
//! Two noisy position sensors observe the same moving object at the same
//! instants. Each step is processed in two stages:
//!
//! ```text
//! Sensor 1 ──┐
//!            ├─→ Spatial Combiner ─→ (z_fused, R_fused) ─→ Kalman Filter ─→ position, NIS
//! Sensor 2 ──┘     (stateless)                              (owns x, P)
//! ```
//!
//! ### Spatial Combiner
//!
//! Inverse-variance weighting of the two readings:
//! ```text
//! w₁ = σ₂² / (σ₁² + σ₂²)     w₂ = σ₁² / (σ₁² + σ₂²)
//! z_fused = w₁·z₁ + w₂·z₂
//! R_fused = diag(v_f, v_f),  v_f = σ₁²·σ₂² / (σ₁² + σ₂²) < min(σ₁², σ₂²)
//! ```
//!
//! ### Kalman Filter (constant velocity)
//!
//! ```text
//! State Prediction:    x̂ = F·x
//! Covariance:          P̂ = F·P·Fᵀ + Q
//! Innovation:          y = z_fused - H·x̂
//! Innovation cov:      S = H·P̂·Hᵀ + R_fused
//! Kalman Gain:         K = P̂·Hᵀ·S⁻¹
//! State Update:        x = x̂ + K·y
//! ```
//!
//! ### Adaptive Noise Monitor
//!
//! The normalized innovation squared `NIS = yᵀ·S⁻¹·y` is χ²-distributed with
//! two degrees of freedom while the motion model fits. When it exceeds the
//! 95% quantile the adaptive filter re-predicts `P̂` with an inflated `Q` for
//! that step only.
//!
//! ## Memory Model
//!
//! All per-step operations use fixed-size stack arrays:
//! ```text
//! KalmanFilter size:
//! ├── State vector:      4 × 8 bytes
//! ├── Covariance:        4 × 4 × 8 bytes
//! ├── F, Q:              2 × 4 × 4 × 8 bytes
//! ├── H:                 2 × 4 × 8 bytes
//! └── Total:             ~520 bytes + config
//! ```
//!
//! ## Numerical Stability
//!
//! - **Joseph form**: covariance correction keeps `P` PSD under round-off
//! - **Symmetric enforcement**: `P` symmetrized after every correction
//! - **Conditioning gate**: `S` rejected before inversion when `det(S)` is
//!   negligible next to the product of its diagonal
//! - **Cholesky check**: `P` verified PSD after every correction, with
//!   tolerances relative to its largest diagonal entry

pub mod adaptive;
pub mod engine;
pub mod kalman;
pub mod models;
pub mod spatial;

// Re-export main types
pub use adaptive::{NoiseDecision, NoiseMonitor};
pub use engine::FusionEngine;
pub use kalman::{FilterMode, FilterPhase, KalmanConfig, KalmanFilter, StepEstimate};
pub use models::StateTransition;
pub use spatial::{FusedMeasurement, SpatialCombiner};

/// A 2D point `[x, y]` in metres
pub type Point2 = matrix::Vector<2>;

/// Matrix operations for fusion algorithms
///
/// Provides the linear algebra needed for the Kalman cycle without heap
/// allocation. All operations work on fixed-size arrays.
pub mod matrix {
    /// Matrix type using const generics
    pub type Matrix<const R: usize, const C: usize> = [[f64; C]; R];

    /// Square matrix type
    pub type SquareMatrix<const N: usize> = Matrix<N, N>;

    /// Vector type
    pub type Vector<const N: usize> = [f64; N];

    /// Identity matrix
    pub fn identity<const N: usize>() -> SquareMatrix<N> {
        let mut m = [[0.0; N]; N];
        for (i, row) in m.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        m
    }

    /// Matrix multiplication: C = A × B
    ///
    /// Dimensions: A[R×K] × B[K×C] = C[R×C]
    pub fn multiply<const R: usize, const K: usize, const C: usize>(
        a: &Matrix<R, K>,
        b: &Matrix<K, C>,
        result: &mut Matrix<R, C>,
    ) {
        for i in 0..R {
            for j in 0..C {
                result[i][j] = 0.0;
                for k in 0..K {
                    result[i][j] += a[i][k] * b[k][j];
                }
            }
        }
    }

    /// Matrix transpose: B = Aᵀ
    pub fn transpose<const R: usize, const C: usize>(
        a: &Matrix<R, C>,
        result: &mut Matrix<C, R>,
    ) {
        for i in 0..R {
            for j in 0..C {
                result[j][i] = a[i][j];
            }
        }
    }

    /// Matrix addition: C = A + B
    pub fn add<const R: usize, const C: usize>(
        a: &Matrix<R, C>,
        b: &Matrix<R, C>,
        result: &mut Matrix<R, C>,
    ) {
        for i in 0..R {
            for j in 0..C {
                result[i][j] = a[i][j] + b[i][j];
            }
        }
    }

    /// Scalar multiple: B = s·A
    pub fn scale<const R: usize, const C: usize>(
        a: &Matrix<R, C>,
        factor: f64,
        result: &mut Matrix<R, C>,
    ) {
        for i in 0..R {
            for j in 0..C {
                result[i][j] = a[i][j] * factor;
            }
        }
    }

    /// Matrix-vector multiplication: y = A × x
    pub fn matvec<const R: usize, const C: usize>(
        matrix: &Matrix<R, C>,
        vector: &Vector<C>,
        result: &mut Vector<R>,
    ) {
        for i in 0..R {
            result[i] = 0.0;
            for j in 0..C {
                result[i] += matrix[i][j] * vector[j];
            }
        }
    }

    /// Quadratic form vᵀ·M·v
    pub fn quadratic_form<const N: usize>(v: &Vector<N>, m: &SquareMatrix<N>) -> f64 {
        let mut mv = [0.0; N];
        matvec(m, v, &mut mv);
        v.iter().zip(mv.iter()).map(|(a, b)| a * b).sum()
    }

    /// Make matrix symmetric: A = (A + Aᵀ) / 2
    ///
    /// Critical for keeping covariance matrices positive semi-definite
    pub fn make_symmetric<const N: usize>(matrix: &mut SquareMatrix<N>) {
        for i in 0..N {
            for j in i + 1..N {
                let avg = (matrix[i][j] + matrix[j][i]) * 0.5;
                matrix[i][j] = avg;
                matrix[j][i] = avg;
            }
        }
    }

    /// Largest |A[i][j] - A[j][i]|
    pub fn max_asymmetry<const N: usize>(matrix: &SquareMatrix<N>) -> f64 {
        let mut worst = 0.0f64;
        for i in 0..N {
            for j in i + 1..N {
                worst = worst.max(libm::fabs(matrix[i][j] - matrix[j][i]));
            }
        }
        worst
    }

    /// Largest |A[i][i]|
    pub fn max_diagonal<const N: usize>(matrix: &SquareMatrix<N>) -> f64 {
        (0..N).fold(0.0f64, |worst, i| worst.max(libm::fabs(matrix[i][i])))
    }

    /// True when every entry is finite
    pub fn is_finite<const R: usize, const C: usize>(matrix: &Matrix<R, C>) -> bool {
        matrix.iter().all(|row| row.iter().all(|v| v.is_finite()))
    }

    /// Cholesky decomposition: A = L × Lᵀ
    ///
    /// ## Algorithm
    ///
    /// For each element:
    /// - Diagonal: L[j,j] = sqrt(A[j,j] - Σ(L[j,k]²))
    /// - Below diagonal: L[i,j] = (A[i,j] - Σ(L[i,k]×L[j,k])) / L[j,j]
    ///
    /// Returns false if matrix is not positive definite
    pub fn cholesky<const N: usize>(a: &SquareMatrix<N>, l: &mut SquareMatrix<N>) -> bool {
        *l = [[0.0; N]; N];

        for j in 0..N {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[j][k] * l[j][k];
            }

            let diag_val = a[j][j] - sum;
            if !(diag_val > 0.0) {
                // Not positive definite (or NaN)
                return false;
            }
            l[j][j] = libm::sqrt(diag_val);

            for i in (j + 1)..N {
                let mut sum = 0.0;
                for k in 0..j {
                    sum += l[i][k] * l[j][k];
                }
                l[i][j] = (a[i][j] - sum) / l[j][j];
            }
        }

        true
    }

    /// Positive semi-definiteness test
    ///
    /// Both tolerances are relative to the largest diagonal entry `d`. The
    /// matrix must be finite, symmetric within `symmetry_tol·d`, and
    /// `A + jitter·d·I` must admit a Cholesky factorization. A matrix with an
    /// all-zero diagonal is PSD only when it is zero.
    pub fn is_positive_semidefinite<const N: usize>(
        a: &SquareMatrix<N>,
        jitter: f64,
        symmetry_tol: f64,
    ) -> bool {
        if !is_finite(a) {
            return false;
        }
        let magnitude = max_diagonal(a);
        if magnitude == 0.0 {
            return a.iter().all(|row| row.iter().all(|&v| v == 0.0));
        }
        if max_asymmetry(a) > symmetry_tol * magnitude {
            return false;
        }
        let mut shifted = *a;
        for (i, row) in shifted.iter_mut().enumerate() {
            row[i] += jitter * magnitude;
        }
        let mut l = [[0.0; N]; N];
        cholesky(&shifted, &mut l)
    }

    /// Determinant of a 2x2 matrix
    pub fn determinant_2x2(a: &SquareMatrix<2>) -> f64 {
        a[0][0] * a[1][1] - a[0][1] * a[1][0]
    }

    /// Closed-form 2x2 inverse
    ///
    /// Returns false if the determinant is zero or not finite
    pub fn invert_2x2(a: &SquareMatrix<2>, inv: &mut SquareMatrix<2>) -> bool {
        let det = determinant_2x2(a);
        if det == 0.0 || !det.is_finite() {
            return false;
        }
        inv[0][0] = a[1][1] / det;
        inv[0][1] = -a[0][1] / det;
        inv[1][0] = -a[1][0] / det;
        inv[1][1] = a[0][0] / det;
        true
    }
}
