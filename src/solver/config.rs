//! Solver configuration.

use crate::error::{NodalError, Result};

use super::{DEFAULT_MAX_ITERATIONS, DEFAULT_MAX_STEP, DEFAULT_TOLERANCE, DEFAULT_WARMUP_STEPS};

/// Configuration for the Newton-Raphson solve of one circuit.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    /// Maximum Newton-Raphson iterations per solve.
    pub max_iterations: usize,
    /// Convergence tolerance on the residual (A) and the step (V).
    pub tolerance: f64,
    /// Largest step allowed on any node in one iteration (V).
    pub max_step: f64,
    /// Number of increments over which `setup` ramps the static state.
    pub warmup_steps: usize,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            tolerance: DEFAULT_TOLERANCE,
            max_step: DEFAULT_MAX_STEP,
            warmup_steps: DEFAULT_WARMUP_STEPS,
        }
    }
}

impl SolverConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum Newton-Raphson iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the convergence tolerance.
    ///
    /// The same figure bounds the largest nodal current imbalance (amps)
    /// and the largest Newton step (volts).
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set the largest step allowed on any node per iteration (in volts).
    pub fn with_max_step(mut self, max_step: f64) -> Self {
        self.max_step = max_step;
        self
    }

    /// Ramp the static state over `steps` increments during `setup`.
    pub fn with_warmup_steps(mut self, steps: usize) -> Self {
        self.warmup_steps = steps;
        self
    }

    /// Check that every setting is usable.
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(NodalError::invalid_parameter(
                "solver",
                "max_iterations",
                "must be at least 1",
            ));
        }
        if !(self.tolerance.is_finite() && self.tolerance > 0.0) {
            return Err(NodalError::invalid_parameter(
                "solver",
                "tolerance",
                format!("must be finite and positive, got {}", self.tolerance),
            ));
        }
        if !(self.max_step.is_finite() && self.max_step > 0.0) {
            return Err(NodalError::invalid_parameter(
                "solver",
                "max_step",
                format!("must be finite and positive, got {}", self.max_step),
            ));
        }
        if self.warmup_steps == 0 {
            return Err(NodalError::invalid_parameter(
                "solver",
                "warmup_steps",
                "must be at least 1",
            ));
        }
        Ok(())
    }
}
