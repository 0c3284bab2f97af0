//! # Nodal Core
//!
//! A Newton-Raphson solver for nonlinear transistor circuits.
//!
//! This library provides:
//! - A registry wiring component terminals onto dynamic, static, input and
//!   ground nodes
//! - Resistor and Ebers-Moll NPN/PNP transistor models with analytic
//!   Jacobians
//! - Assembly of the nodal current-balance equations (KCL)
//! - A damped Newton-Raphson solve for the dynamic node voltages
//!
//! ## Architecture
//!
//! - [`circuit`] - Nodes, wiring and the [`Circuit`] orchestrator
//! - [`components`] - Component models
//! - [`solver`] - Equation assembly and numerical solving
//! - [`error`] - Error types
//!
//! ## Usage
//!
//! ```
//! use nodal_core::circuit::{Circuit, Pin};
//! use nodal_core::components::Component;
//!
//! # fn main() -> nodal_core::Result<()> {
//! // Divider-biased common-emitter stage: S0 is ground, S1 the supply
//! let mut circuit = Circuit::new(3, 2, 0);
//! circuit.add_component(Component::resistor(1470.0)?, &[Pin::Static(0), Pin::Dynamic(0)])?;
//! circuit.add_component(Component::resistor(16670.0)?, &[Pin::Dynamic(0), Pin::Static(1)])?;
//! circuit.add_component(Component::resistor(1000.0)?, &[Pin::Static(1), Pin::Dynamic(1)])?;
//! circuit.add_component(Component::resistor(100.0)?, &[Pin::Static(0), Pin::Dynamic(2)])?;
//! circuit.add_component(Component::npn(), &[Pin::Dynamic(0), Pin::Dynamic(1), Pin::Dynamic(2)])?;
//! circuit.set_static_state(&[0.0, 5.0])?;
//! circuit.setup()?;
//!
//! let base = circuit.dynamic_state()[0];
//! assert!((base - 0.405).abs() < 1e-3);
//! # Ok(())
//! # }
//! ```
//!
//! ## Solution Method
//!
//! For each solve:
//!
//! 1. Evaluate every component at the current node voltages
//! 2. Sum terminal currents into each dynamic node to form F, and their
//!    derivatives to form the Jacobian J
//! 3. Solve J Δ = F by LU decomposition and update x ← x - Δ, limiting the
//!    step on any node
//! 4. Repeat until the residual or the step falls below the tolerance

pub mod circuit;
pub mod components;
pub mod error;
pub mod solver;

// Re-export main types for convenience
pub use circuit::{Circuit, Pin};
pub use components::Component;
pub use error::{NodalError, Result};
pub use solver::{NewtonReport, SolverConfig};
