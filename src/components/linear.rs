//! Linear passive components.

use std::fmt;

use super::Evaluation;
use crate::error::{NodalError, Result};

/// A resistor between terminals `a` and `b`.
#[derive(Debug, Clone, PartialEq)]
pub struct Resistor {
    resistance: f64,
    conductance: f64,
}

impl Resistor {
    /// Terminal names, in pin order.
    pub const TERMINALS: [&'static str; 2] = ["a", "b"];

    /// Create a new resistor. The resistance must be finite and positive.
    pub fn new(resistance: f64) -> Result<Self> {
        if !(resistance.is_finite() && resistance > 0.0) {
            return Err(NodalError::invalid_parameter(
                "Resistor",
                "resistance",
                format!("must be finite and positive, got {}", resistance),
            ));
        }
        Ok(Self {
            resistance,
            conductance: 1.0 / resistance,
        })
    }

    pub fn resistance(&self) -> f64 {
        self.resistance
    }

    /// Get the conductance (1/R).
    pub fn conductance(&self) -> f64 {
        self.conductance
    }

    /// Current into the node at each terminal, and its gradient.
    ///
    /// The current entering node `a` from the resistor is `(v_b - v_a) * G`;
    /// node `b` receives the opposite.
    pub fn evaluate(&self, voltages: &[f64]) -> Evaluation {
        let g = self.conductance;
        let i = (voltages[1] - voltages[0]) * g;

        let mut eval = Evaluation::new(2);
        eval.currents[0] = i;
        eval.currents[1] = -i;
        eval.gradient[0][0] = -g;
        eval.gradient[0][1] = g;
        eval.gradient[1][0] = g;
        eval.gradient[1][1] = -g;
        eval
    }
}

impl fmt::Display for Resistor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2e} ohms", self.resistance)
    }
}
