//! Error types for the nodal solver.
//!
//! This module provides a unified error type [`NodalError`] that covers
//! configuration mistakes (caught when a circuit is wired or driven) and
//! failures of the Newton-Raphson solve.

use thiserror::Error;

use crate::circuit::Pin;

/// Result type alias using [`NodalError`].
pub type Result<T> = std::result::Result<T, NodalError>;

/// Unified error type for all nodal solver operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodalError {
    // ============ Configuration Errors ============
    /// Wrong number of pins supplied for a component
    #[error("Component '{component}' has {expected} terminals but {actual} pins were given")]
    PinCountMismatch {
        component: String,
        expected: usize,
        actual: usize,
    },

    /// Pin index outside the range of its node class
    #[error("Pin {pin} of component '{component}' is out of range ({available} {class} nodes)")]
    PinOutOfRange {
        component: String,
        pin: Pin,
        class: &'static str,
        available: usize,
    },

    /// Invalid parameter value
    #[error("Invalid parameter '{param}' for '{component}': {message}")]
    InvalidParameter {
        component: String,
        param: String,
        message: String,
    },

    /// State vector of the wrong length
    #[error("Expected {expected} values for the {state} state, got {actual}")]
    StateLengthMismatch {
        state: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Time step that is zero, negative or not finite
    #[error("Invalid time step {value:e} (must be finite and positive)")]
    InvalidTimeStep { value: f64 },

    // ============ Simulation Errors ============
    /// Jacobian is singular and cannot be factored
    #[error("Singular Jacobian - a dynamic node may have no DC path to a driven node")]
    SingularMatrix,

    /// Newton-Raphson iteration did not converge
    #[error("Newton-Raphson did not converge after {iterations} iterations (residual: {residual:.2e})")]
    ConvergenceFailure { iterations: usize, residual: f64 },

    /// Residual or Jacobian entry became NaN or infinite
    #[error("Non-finite value at node '{node}' (value: {value:.2e})")]
    NonFinite { node: String, value: f64 },

    /// Dynamic node with no conductive path to a driven node
    #[error("Floating node '{node}' - no DC path to a static, input or ground node")]
    FloatingNode { node: String },
}

impl NodalError {
    /// Create an invalid parameter error
    pub fn invalid_parameter(
        component: impl Into<String>,
        param: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            component: component.into(),
            param: param.into(),
            message: message.into(),
        }
    }

    /// Create a state length mismatch error
    pub fn state_length(state: &'static str, expected: usize, actual: usize) -> Self {
        Self::StateLengthMismatch {
            state,
            expected,
            actual,
        }
    }

    /// Create a convergence failure error
    pub fn convergence_failure(iterations: usize, residual: f64) -> Self {
        Self::ConvergenceFailure {
            iterations,
            residual,
        }
    }

    /// Mistakes in wiring or driving a circuit, detected before any solve.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::PinCountMismatch { .. }
                | Self::PinOutOfRange { .. }
                | Self::InvalidParameter { .. }
                | Self::StateLengthMismatch { .. }
                | Self::InvalidTimeStep { .. }
        )
    }

    /// The iteration cap was reached without meeting the tolerance.
    pub fn is_convergence(&self) -> bool {
        matches!(self, Self::ConvergenceFailure { .. })
    }

    /// A non-finite value or a singular Jacobian was met during a solve.
    pub fn is_numerical(&self) -> bool {
        matches!(
            self,
            Self::SingularMatrix | Self::NonFinite { .. } | Self::FloatingNode { .. }
        )
    }
}
