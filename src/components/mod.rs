//! Component models for circuit simulation.
//!
//! This module provides models for the supported circuit components:
//! - Linear: Resistor
//! - Nonlinear: NPN and PNP BJTs (Ebers-Moll)
//!
//! Each component reports, for given terminal voltages, the current it
//! injects into the node at each terminal and the gradient of those
//! currents with respect to the terminal voltages.

mod bjt;
mod linear;

pub use bjt::{
    limited_exp, Bjt, BjtParams, BjtType, DEFAULT_SATURATION_CURRENT, DEFAULT_THERMAL_VOLTAGE,
    EXP_LIMIT,
};
pub use linear::Resistor;

use std::fmt;

use crate::error::Result;

/// Largest terminal count of any component.
pub const MAX_TERMINALS: usize = 3;

/// Terminal currents and their gradient at one set of terminal voltages.
///
/// `currents[t]` is the current flowing from the component into the node
/// at terminal `t`. `gradient[t][u]` is `d currents[t] / d v[u]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    terminals: usize,
    pub currents: [f64; MAX_TERMINALS],
    pub gradient: [[f64; MAX_TERMINALS]; MAX_TERMINALS],
}

impl Evaluation {
    /// Zeroed evaluation for a component with `terminals` terminals.
    pub fn new(terminals: usize) -> Self {
        debug_assert!(terminals <= MAX_TERMINALS);
        Self {
            terminals,
            currents: [0.0; MAX_TERMINALS],
            gradient: [[0.0; MAX_TERMINALS]; MAX_TERMINALS],
        }
    }

    /// Number of terminals in use.
    pub fn terminals(&self) -> usize {
        self.terminals
    }

    /// Currents for the terminals in use.
    pub fn currents(&self) -> &[f64] {
        &self.currents[..self.terminals]
    }

    /// Gradient rows for the terminals in use.
    pub fn gradient(&self) -> impl Iterator<Item = &[f64]> + '_ {
        self.gradient[..self.terminals]
            .iter()
            .map(move |row| &row[..self.terminals])
    }
}

/// A circuit component.
#[derive(Debug, Clone, PartialEq)]
pub enum Component {
    Resistor(Resistor),
    Bjt(Bjt),
}

impl Component {
    /// Create a resistor. The resistance must be finite and positive.
    pub fn resistor(resistance: f64) -> Result<Self> {
        Ok(Component::Resistor(Resistor::new(resistance)?))
    }

    /// NPN transistor with default parameters.
    pub fn npn() -> Self {
        Component::Bjt(Bjt::npn())
    }

    /// PNP transistor with default parameters.
    pub fn pnp() -> Self {
        Component::Bjt(Bjt::pnp())
    }

    /// BJT with custom parameters.
    pub fn bjt(bjt_type: BjtType, params: BjtParams) -> Result<Self> {
        Ok(Component::Bjt(Bjt::new(bjt_type, params)?))
    }

    /// Get the component type name.
    pub fn name(&self) -> &'static str {
        match self {
            Component::Resistor(_) => "Resistor",
            Component::Bjt(q) => q.bjt_type.name(),
        }
    }

    /// Terminal names, in pin order.
    pub fn terminal_names(&self) -> &'static [&'static str] {
        match self {
            Component::Resistor(_) => &Resistor::TERMINALS,
            Component::Bjt(_) => &Bjt::TERMINALS,
        }
    }

    /// Number of terminals (and so of pins at registration).
    pub fn terminal_count(&self) -> usize {
        self.terminal_names().len()
    }

    /// Check if this component is nonlinear.
    pub fn is_nonlinear(&self) -> bool {
        matches!(self, Component::Bjt(_))
    }

    /// Terminal currents and gradient at the given terminal voltages.
    ///
    /// `voltages` holds one entry per terminal, in pin order.
    pub fn evaluate(&self, voltages: &[f64]) -> Evaluation {
        debug_assert_eq!(voltages.len(), self.terminal_count());
        match self {
            Component::Resistor(r) => r.evaluate(voltages),
            Component::Bjt(q) => q.evaluate(voltages),
        }
    }

    /// Current flowing into the node at each terminal.
    pub fn current_contribution(&self, voltages: &[f64]) -> Vec<f64> {
        self.evaluate(voltages).currents().to_vec()
    }

    /// Partial derivatives of each terminal current with respect to each
    /// terminal voltage, one row per terminal.
    pub fn jacobian_contribution(&self, voltages: &[f64]) -> Vec<Vec<f64>> {
        self.evaluate(voltages)
            .gradient()
            .map(|row| row.to_vec())
            .collect()
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Component::Resistor(r) => fmt::Display::fmt(r, f),
            Component::Bjt(q) => fmt::Display::fmt(q, f),
        }
    }
}
