//! Nodal equation solver.
//!
//! This module provides the numerical engine for circuit simulation.
//!
//! ## Nodal Analysis
//!
//! Every dynamic node contributes one current-balance equation
//!
//! ```text
//! F_k(x) = Σ currents injected into node k = 0
//! ```
//!
//! over the vector x of dynamic node voltages. Static, input and ground
//! nodes are known voltages and contribute no unknowns.
//!
//! The system is solved with damped Newton-Raphson iteration:
//!
//! ```text
//! J(x) Δ = F(x),   x ← x - Δ
//! ```
//!
//! where J = dF/dx, and Δ is scaled down whenever its largest entry
//! exceeds the configured maximum step.

mod assembler;
mod config;
mod newton;
mod system;

pub use assembler::{Assembler, NUMERICAL_JACOBIAN_DX};
pub use config::SolverConfig;
pub use newton::{Equations, NewtonRaphson, NewtonReport};
pub use system::NodalSystem;

/// Convergence tolerance, applied to the residual (A) and to the step (V).
///
/// Reference operating points are the first iterate below this residual.
/// Tightening it moves a converged state by around a microvolt.
pub const DEFAULT_TOLERANCE: f64 = 1e-8;

/// Maximum Newton-Raphson iterations per solve.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Largest Newton step allowed on any node (V).
pub const DEFAULT_MAX_STEP: f64 = 1.0;

/// Number of source-stepping increments used by `setup`.
pub const DEFAULT_WARMUP_STEPS: usize = 1;

/// Pivots smaller than this are treated as singular.
pub const PIVOT_EPSILON: f64 = 1e-15;
