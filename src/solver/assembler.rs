//! Assembly of the current-balance equations.
//!
//! For every dynamic node the residual is the sum of the currents injected
//! by all terminals attached to it (Kirchhoff's Current Law), and the
//! Jacobian row holds the derivatives of that sum with respect to every
//! dynamic unknown. Static, input and ground voltages enter as constants.

use crate::circuit::{NodeRegistry, NodeVoltages, Pin, Terminal};
use crate::components::{Component, Evaluation, MAX_TERMINALS};

use super::system::NodalSystem;

/// Step used for the finite-difference Jacobian (volts).
pub const NUMERICAL_JACOBIAN_DX: f64 = 1e-6;

/// Structural snapshot of a circuit, built once per topology.
#[derive(Debug, Clone)]
pub struct Assembler {
    /// Pins of each component, in terminal order
    wiring: Vec<Vec<Pin>>,
    /// Terminals attached to each dynamic node
    rows: Vec<Vec<Terminal>>,
    /// Per-component evaluations at the current iterate
    evaluations: Vec<Evaluation>,
}

impl Assembler {
    /// Build the assembler from the registered topology.
    pub fn build(registry: &NodeRegistry) -> Self {
        let wiring: Vec<Vec<Pin>> = (0..registry.len())
            .map(|c| registry.pins(c).to_vec())
            .collect();
        let rows = (0..registry.counts().dynamic)
            .map(|node| registry.terminals(node).to_vec())
            .collect();
        let evaluations = wiring.iter().map(|pins| Evaluation::new(pins.len())).collect();

        Self {
            wiring,
            rows,
            evaluations,
        }
    }

    /// Number of dynamic unknowns.
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Evaluate every component at the given node voltages.
    fn evaluate_all(&mut self, components: &[Component], voltages: &NodeVoltages<'_>) {
        debug_assert_eq!(components.len(), self.wiring.len());
        for ((component, pins), eval) in components
            .iter()
            .zip(&self.wiring)
            .zip(&mut self.evaluations)
        {
            let mut v = [0.0; MAX_TERMINALS];
            for (slot, &pin) in v.iter_mut().zip(pins) {
                *slot = voltages.voltage(pin);
            }
            *eval = component.evaluate(&v[..pins.len()]);
        }
    }

    /// Assemble F and J at the given node voltages into `system`.
    pub fn assemble(
        &mut self,
        components: &[Component],
        voltages: &NodeVoltages<'_>,
        system: &mut NodalSystem,
    ) {
        self.evaluate_all(components, voltages);
        system.clear();

        for (row, terminals) in self.rows.iter().enumerate() {
            for &(component, terminal) in terminals {
                let eval = &self.evaluations[component];
                system.add_residual(row, eval.currents[terminal]);

                for (other, pin) in self.wiring[component].iter().enumerate() {
                    if let Some(col) = pin.dynamic_index() {
                        system.add(row, col, eval.gradient[terminal][other]);
                    }
                }
            }
        }
    }

    /// Residual only, written into `out`.
    pub fn residual(
        &mut self,
        components: &[Component],
        voltages: &NodeVoltages<'_>,
        out: &mut [f64],
    ) {
        self.evaluate_all(components, voltages);
        for (row, terminals) in self.rows.iter().enumerate() {
            out[row] = terminals
                .iter()
                .map(|&(component, terminal)| self.evaluations[component].currents[terminal])
                .sum();
        }
    }

    /// Forward-difference Jacobian (row-major), for checking the analytic one.
    pub fn numerical_jacobian(
        &mut self,
        components: &[Component],
        voltages: &NodeVoltages<'_>,
    ) -> Vec<f64> {
        let n = self.size();
        let mut base = vec![0.0; n];
        self.residual(components, voltages, &mut base);

        let mut jacobian = vec![0.0; n * n];
        let mut shifted = voltages.dynamic.to_vec();
        let mut perturbed = vec![0.0; n];
        for col in 0..n {
            shifted[col] += NUMERICAL_JACOBIAN_DX;
            let view = NodeVoltages {
                dynamic: &shifted,
                ..*voltages
            };
            self.residual(components, &view, &mut perturbed);
            for row in 0..n {
                jacobian[row * n + col] = (perturbed[row] - base[row]) / NUMERICAL_JACOBIAN_DX;
            }
            shifted[col] = voltages.dynamic[col];
        }
        jacobian
    }
}
