//! Newton-Raphson iteration over the dynamic node voltages.

use log::trace;

use crate::circuit::{NodeRegistry, NodeVoltages};
use crate::components::Component;
use crate::error::{NodalError, Result};

use super::assembler::Assembler;
use super::config::SolverConfig;
use super::system::NodalSystem;

/// The fixed inputs of one solve.
#[derive(Debug, Clone, Copy)]
pub struct Equations<'a> {
    pub components: &'a [Component],
    pub registry: &'a NodeRegistry,
    pub fixed: &'a [f64],
    pub input: &'a [f64],
}

/// Outcome of a converged solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NewtonReport {
    /// Iterations used (0 when the initial guess already balanced)
    pub iterations: usize,
    /// Largest current imbalance at the last assembled iterate
    pub residual: f64,
}

/// Damped Newton-Raphson solver.
#[derive(Debug, Clone)]
pub struct NewtonRaphson {
    /// Maximum iterations
    pub max_iterations: usize,
    /// Convergence tolerance
    pub tolerance: f64,
    /// Largest step on any node per iteration
    pub max_step: f64,
}

impl Default for NewtonRaphson {
    fn default() -> Self {
        Self::with_config(&SolverConfig::default())
    }
}

impl NewtonRaphson {
    /// Create a new Newton-Raphson solver with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a solver from a configuration.
    pub fn with_config(config: &SolverConfig) -> Self {
        Self {
            max_iterations: config.max_iterations,
            tolerance: config.tolerance,
            max_step: config.max_step,
        }
    }

    /// Solve F(x) = 0, starting from and updating `x` in place.
    ///
    /// On error `x` holds the last iterate and must not be published.
    pub fn solve(
        &self,
        equations: &Equations<'_>,
        assembler: &mut Assembler,
        system: &mut NodalSystem,
        x: &mut [f64],
    ) -> Result<NewtonReport> {
        let mut residual = f64::INFINITY;

        for iter in 0..self.max_iterations {
            let voltages = NodeVoltages {
                dynamic: x,
                fixed: equations.fixed,
                input: equations.input,
            };
            assembler.assemble(equations.components, &voltages, system);

            if let Some((row, value)) = system.find_non_finite() {
                return Err(NodalError::NonFinite {
                    node: equations.registry.dynamic_name(row).to_string(),
                    value,
                });
            }

            residual = system.residual_norm();
            if residual < self.tolerance {
                return Ok(NewtonReport {
                    iterations: iter,
                    residual,
                });
            }

            system.factor()?;
            system.solve()?;

            let step = system.delta_norm();
            trace!("iteration {}: residual {:.3e}, step {:.3e}", iter, residual, step);

            if step < self.tolerance {
                for (xi, di) in x.iter_mut().zip(&system.delta) {
                    *xi -= di;
                }
                return Ok(NewtonReport {
                    iterations: iter + 1,
                    residual,
                });
            }

            // Damping: keep the largest nodal step within max_step
            let scale = if step > self.max_step {
                self.max_step / step
            } else {
                1.0
            };
            for (xi, di) in x.iter_mut().zip(&system.delta) {
                *xi -= di * scale;
            }
        }

        Err(NodalError::convergence_failure(self.max_iterations, residual))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::{NodeCounts, Pin};

    fn solve_with(
        newton: &NewtonRaphson,
        registry: &NodeRegistry,
        components: &[Component],
        fixed: &[f64],
        x: &mut [f64],
    ) -> Result<NewtonReport> {
        let mut assembler = Assembler::build(registry);
        let mut system = NodalSystem::new(assembler.size());
        let equations = Equations {
            components,
            registry,
            fixed,
            input: &[],
        };
        newton.solve(&equations, &mut assembler, &mut system, x)
    }

    #[test]
    fn test_linear_divider_converges_in_one_step() {
        let mut reg = NodeRegistry::new(NodeCounts::new(1, 1, 0));
        reg.attach(&[Pin::Static(0), Pin::Dynamic(0)]);
        reg.attach(&[Pin::Dynamic(0), Pin::Ground]);
        let components = vec![
            Component::resistor(1000.0).unwrap(),
            Component::resistor(3000.0).unwrap(),
        ];

        let mut x = vec![0.0];
        let newton = NewtonRaphson {
            max_step: f64::INFINITY,
            ..NewtonRaphson::new()
        };
        let report = solve_with(&newton, &reg, &components, &[4.0], &mut x).unwrap();

        assert!((x[0] - 3.0).abs() < 1e-12);
        assert!(report.iterations <= 2);
    }

    #[test]
    fn test_diode_connected_npn() {
        // S0 = 5V -- 10k -- D0, NPN with base and collector on D0, emitter on ground
        let mut reg = NodeRegistry::new(NodeCounts::new(1, 1, 0));
        reg.attach(&[Pin::Static(0), Pin::Dynamic(0)]);
        reg.attach(&[Pin::Dynamic(0), Pin::Dynamic(0), Pin::Ground]);
        let components = vec![Component::resistor(10_000.0).unwrap(), Component::npn()];

        let mut x = vec![0.0];
        let report = solve_with(&NewtonRaphson::new(), &reg, &components, &[5.0], &mut x).unwrap();

        // Roughly 0.5mA through a junction with Is = 1pA: Vt * ln(I / Is) ~ 0.52V
        assert!(x[0] > 0.45 && x[0] < 0.6, "v = {}", x[0]);
        assert!(report.residual < 1e-8);
    }

    #[test]
    fn test_iteration_cap() {
        let mut reg = NodeRegistry::new(NodeCounts::new(1, 1, 0));
        reg.attach(&[Pin::Static(0), Pin::Dynamic(0)]);
        reg.attach(&[Pin::Dynamic(0), Pin::Dynamic(0), Pin::Ground]);
        let components = vec![Component::resistor(10_000.0).unwrap(), Component::npn()];

        let newton = NewtonRaphson {
            max_iterations: 2,
            ..NewtonRaphson::new()
        };
        let mut x = vec![0.0];
        let err = solve_with(&newton, &reg, &components, &[5.0], &mut x).unwrap_err();
        assert!(matches!(err, NodalError::ConvergenceFailure { iterations: 2, .. }));
    }

    #[test]
    fn test_floating_node_is_singular() {
        let mut reg = NodeRegistry::new(NodeCounts::new(2, 0, 0));
        reg.attach(&[Pin::Dynamic(0), Pin::Dynamic(1)]);
        let components = vec![Component::resistor(1000.0).unwrap()];

        let mut x = vec![1.0, 0.0];
        let err = solve_with(&NewtonRaphson::new(), &reg, &components, &[], &mut x).unwrap_err();
        assert_eq!(err, NodalError::SingularMatrix);
    }

    #[test]
    fn test_non_finite_input_is_reported() {
        let mut reg = NodeRegistry::new(NodeCounts::new(1, 1, 0));
        reg.attach(&[Pin::Static(0), Pin::Dynamic(0)]);
        let components = vec![Component::resistor(1000.0).unwrap()];

        let mut x = vec![0.0];
        let err =
            solve_with(&NewtonRaphson::new(), &reg, &components, &[f64::NAN], &mut x).unwrap_err();
        assert!(matches!(err, NodalError::NonFinite { ref node, .. } if node == "D0"));
    }
}
