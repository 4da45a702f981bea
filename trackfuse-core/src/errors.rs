//! Error Types for Fusion and Estimation Failures
//!
//! ## Design Philosophy
//!
//! The error type follows the same rules as the rest of the numerical core:
//!
//! 1. **No Heap Allocation**: All error data is inline. Messages are
//!    `&'static str`, so an error can be produced inside the per-step path.
//!
//! 2. **Copy Semantics**: Errors implement `Copy` and can be stored alongside
//!    the step index that produced them.
//!
//! 3. **Two Categories Only**: Every variant is either a configuration error
//!    (caller supplied something unusable) or a numerical error (the recursion
//!    produced a quantity that can no longer be trusted). See [`ErrorKind`].
//!
//! ## Error Categories
//!
//! ### Configuration
//! - `InvalidParameter`: non-positive variance, `dt`, process noise, ...
//! - `LengthMismatch`: sensor sequences of different lengths
//! - `EmptyInput`: nothing to seed the estimator from
//!
//! ### Numerical
//! - `SingularInnovation`: innovation covariance `S` cannot be inverted
//! - `CovarianceNotPsd`: state covariance `P` lost positive semi-definiteness
//! - `NonFinite`: NaN or infinity reached a measurement or the state
//!
//! Neither category is retried. A numerical error rejects the step it was
//! raised in and leaves the estimator as it was before the call.
//!
//! ```rust
//! use trackfuse_core::{fusion::spatial, ErrorKind};
//!
//! let err = spatial::fuse([0.0, 0.0], 0.0, [1.0, 1.0], 1.0).unwrap_err();
//! assert_eq!(err.kind(), ErrorKind::Configuration);
//! ```

use thiserror_no_std::Error;

/// Result type for fusion and estimation operations
pub type FusionResult<T> = Result<T, FusionError>;

/// The two failure categories of the numerical core
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Programmer or setup error, surfaced before or at construction
    Configuration,
    /// The recursion produced an untrustworthy quantity
    Numerical,
}

/// Fusion errors - kept small and `Copy`
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum FusionError {
    /// A scalar parameter is outside its valid domain
    #[error("Invalid parameter {parameter} = {value}: {reason}")]
    InvalidParameter {
        /// Name of the offending parameter (e.g. "sigma1", "dt")
        parameter: &'static str,
        /// The rejected value
        value: f64,
        /// Constraint that was violated
        reason: &'static str,
    },

    /// Two input sequences that must be aligned have different lengths
    #[error("Length mismatch in {stream}: expected {expected}, found {found}")]
    LengthMismatch {
        /// Which sequence disagreed with the reference length
        stream: &'static str,
        /// Reference length
        expected: usize,
        /// Actual length
        found: usize,
    },

    /// Input sequences contain no measurements
    #[error("Empty input: at least one measurement is required")]
    EmptyInput,

    /// Innovation covariance is singular or too ill-conditioned to invert
    #[error("Innovation covariance is singular (determinant {determinant})")]
    SingularInnovation {
        /// Determinant of the rejected 2x2 matrix
        determinant: f64,
    },

    /// State covariance is no longer symmetric positive semi-definite
    #[error("State covariance lost positive semi-definiteness at step {step}")]
    CovarianceNotPsd {
        /// Zero-based index of the rejected step
        step: usize,
    },

    /// A NaN or infinite value was encountered
    #[error("Non-finite value in {quantity}")]
    NonFinite {
        /// Which quantity was non-finite
        quantity: &'static str,
    },
}

impl FusionError {
    /// Classify this error into the configuration/numerical taxonomy
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidParameter { .. } | Self::LengthMismatch { .. } | Self::EmptyInput => {
                ErrorKind::Configuration
            }
            Self::SingularInnovation { .. }
            | Self::CovarianceNotPsd { .. }
            | Self::NonFinite { .. } => ErrorKind::Numerical,
        }
    }

    /// True for setup errors that no amount of new data can fix
    pub fn is_configuration(&self) -> bool {
        self.kind() == ErrorKind::Configuration
    }

    /// True for errors raised by the recursion itself
    pub fn is_numerical(&self) -> bool {
        self.kind() == ErrorKind::Numerical
    }

    pub(crate) fn invalid(parameter: &'static str, value: f64, reason: &'static str) -> Self {
        Self::InvalidParameter {
            parameter,
            value,
            reason,
        }
    }
}

/// Require `value` to be finite and strictly positive
pub(crate) fn require_positive(parameter: &'static str, value: f64) -> FusionResult<f64> {
    if !value.is_finite() {
        return Err(FusionError::invalid(parameter, value, "must be finite"));
    }
    if value <= 0.0 {
        return Err(FusionError::invalid(parameter, value, "must be strictly positive"));
    }
    Ok(value)
}

#[cfg(feature = "defmt")]
impl defmt::Format for FusionError {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::InvalidParameter { parameter, value, reason } =>
                defmt::write!(fmt, "Invalid {} = {}: {}", parameter, value, reason),
            Self::LengthMismatch { stream, expected, found } =>
                defmt::write!(fmt, "{} length {} != {}", stream, found, expected),
            Self::EmptyInput =>
                defmt::write!(fmt, "Empty input"),
            Self::SingularInnovation { determinant } =>
                defmt::write!(fmt, "Singular S (det {})", determinant),
            Self::CovarianceNotPsd { step } =>
                defmt::write!(fmt, "P not PSD at step {}", step),
            Self::NonFinite { quantity } =>
                defmt::write!(fmt, "Non-finite {}", quantity),
        }
    }
}
