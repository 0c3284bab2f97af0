//! The circuit being solved.

use std::fmt;

use log::debug;

use super::registry::NodeRegistry;
use super::types::{NodeCounts, NodeVoltages, Pin};
use super::validate::validate_topology;
use crate::components::Component;
use crate::error::{NodalError, Result};
use crate::solver::{Assembler, Equations, NewtonRaphson, NewtonReport, NodalSystem, SolverConfig};

/// A circuit: components wired onto dynamic, static and input nodes.
///
/// Static and input voltages are set by the caller. Dynamic voltages are
/// the unknowns, found by [`Circuit::setup`] and [`Circuit::solve`].
#[derive(Debug, Clone)]
pub struct Circuit {
    registry: NodeRegistry,
    components: Vec<Component>,

    static_state: Vec<f64>,
    input_state: Vec<f64>,
    dynamic_state: Vec<f64>,

    /// Simulation time step in seconds, once set
    time_step: Option<f64>,

    config: SolverConfig,
    newton: NewtonRaphson,

    /// Built lazily, dropped whenever the topology changes
    assembler: Option<Assembler>,
    /// Dynamic nodes with no path to a driven node, found with the assembler
    floating: Vec<usize>,
    system: NodalSystem,
    /// Newton iterate, published to `dynamic_state` only on success
    scratch: Vec<f64>,
}

impl Circuit {
    /// Create an empty circuit. All node voltages start at zero.
    pub fn new(num_dynamic: usize, num_static: usize, num_input: usize) -> Self {
        let counts = NodeCounts::new(num_dynamic, num_static, num_input);
        let config = SolverConfig::default();
        Self {
            registry: NodeRegistry::new(counts),
            components: Vec::new(),
            static_state: vec![0.0; num_static],
            input_state: vec![0.0; num_input],
            dynamic_state: vec![0.0; num_dynamic],
            time_step: None,
            newton: NewtonRaphson::with_config(&config),
            config,
            assembler: None,
            floating: Vec::new(),
            system: NodalSystem::new(num_dynamic),
            scratch: vec![0.0; num_dynamic],
        }
    }

    /// Create an empty circuit with a custom solver configuration.
    pub fn with_config(
        num_dynamic: usize,
        num_static: usize,
        num_input: usize,
        config: SolverConfig,
    ) -> Result<Self> {
        let mut circuit = Self::new(num_dynamic, num_static, num_input);
        circuit.set_config(config)?;
        Ok(circuit)
    }

    /// Replace the solver configuration.
    pub fn set_config(&mut self, config: SolverConfig) -> Result<()> {
        config.validate()?;
        self.newton = NewtonRaphson::with_config(&config);
        self.config = config;
        Ok(())
    }

    /// Wire a component onto the given pins, in terminal order.
    ///
    /// Returns the index of the component. Nothing is recorded on error.
    pub fn add_component(&mut self, component: Component, pins: &[Pin]) -> Result<usize> {
        self.registry
            .check(component.name(), component.terminal_count(), pins)?;

        let index = self.registry.attach(pins);
        self.components.push(component);
        self.assembler = None;
        Ok(index)
    }

    pub fn set_static_state(&mut self, values: &[f64]) -> Result<()> {
        check_state("static", &self.static_state, values)?;
        self.static_state.copy_from_slice(values);
        Ok(())
    }

    pub fn set_input_state(&mut self, values: &[f64]) -> Result<()> {
        check_state("input", &self.input_state, values)?;
        self.input_state.copy_from_slice(values);
        Ok(())
    }

    /// Set the simulation time step (seconds).
    pub fn set_time_step(&mut self, dt: f64) -> Result<()> {
        if !(dt.is_finite() && dt > 0.0) {
            return Err(NodalError::InvalidTimeStep { value: dt });
        }
        self.time_step = Some(dt);
        Ok(())
    }

    pub fn set_dynamic_node_names(&mut self, names: Vec<String>) -> Result<()> {
        self.registry.set_dynamic_names(names)
    }

    pub fn set_static_node_names(&mut self, names: Vec<String>) -> Result<()> {
        self.registry.set_static_names(names)
    }

    /// Compute the operating point for the present static and input state.
    ///
    /// With `warmup_steps > 1` the static voltages are ramped up from zero
    /// in equal increments, solving at each one from the previous result.
    /// If any increment fails, the dynamic state is restored to what it was
    /// before the call.
    pub fn setup(&mut self) -> Result<NewtonReport> {
        self.assembler = None;
        structure(&mut self.assembler, &mut self.floating, &self.registry);

        let steps = self.config.warmup_steps;
        if steps <= 1 {
            return self.solve();
        }

        let target = self.static_state.clone();
        let initial = self.dynamic_state.clone();
        let mut iterations = 0;
        let mut outcome = Ok(());
        for k in 1..steps {
            let fraction = k as f64 / steps as f64;
            for (v, &t) in self.static_state.iter_mut().zip(&target) {
                *v = t * fraction;
            }
            match self.solve() {
                Ok(report) => iterations += report.iterations,
                Err(e) => {
                    outcome = Err(e);
                    break;
                }
            }
        }

        // Final increment at the exact static state
        self.static_state = target;
        let report = outcome.and_then(|()| self.solve());
        let report = match report {
            Ok(report) => report,
            Err(e) => {
                self.dynamic_state = initial;
                return Err(e);
            }
        };
        debug!(
            "warm-up over {} steps took {} iterations",
            steps,
            iterations + report.iterations
        );
        Ok(report)
    }

    /// Solve for the dynamic voltages at the present inputs.
    ///
    /// Starts from the last converged state. On error the dynamic state is
    /// left as it was. A floating node fails before any iteration, since
    /// its voltage is not determined by the circuit.
    pub fn solve(&mut self) -> Result<NewtonReport> {
        let assembler = structure(&mut self.assembler, &mut self.floating, &self.registry);
        if let Some(&node) = self.floating.first() {
            let err = NodalError::FloatingNode {
                node: self.registry.dynamic_name(node).to_string(),
            };
            debug!("solve failed: {}", err);
            return Err(err);
        }

        self.scratch.copy_from_slice(&self.dynamic_state);
        let equations = Equations {
            components: &self.components,
            registry: &self.registry,
            fixed: &self.static_state,
            input: &self.input_state,
        };

        match self
            .newton
            .solve(&equations, assembler, &mut self.system, &mut self.scratch)
        {
            Ok(report) => {
                self.dynamic_state.copy_from_slice(&self.scratch);
                debug!(
                    "solved {} dynamic nodes in {} iterations (residual {:.2e})",
                    self.dynamic_state.len(),
                    report.iterations,
                    report.residual
                );
                Ok(report)
            }
            Err(e) => {
                debug!("solve failed: {}", e);
                Err(e)
            }
        }
    }

    /// Set the input voltages and solve from the previous state.
    pub fn step(&mut self, inputs: &[f64]) -> Result<&[f64]> {
        self.set_input_state(inputs)?;
        self.solve()?;
        Ok(&self.dynamic_state)
    }

    pub fn dynamic_state(&self) -> &[f64] {
        &self.dynamic_state
    }

    pub fn static_state(&self) -> &[f64] {
        &self.static_state
    }

    pub fn input_state(&self) -> &[f64] {
        &self.input_state
    }

    pub fn time_step(&self) -> Option<f64> {
        self.time_step
    }

    pub fn node_counts(&self) -> NodeCounts {
        self.registry.counts()
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Voltage of any node at the present state.
    pub fn voltage(&self, pin: Pin) -> f64 {
        self.voltages().voltage(pin)
    }

    /// Display name of the node behind a pin.
    pub fn node_name(&self, pin: Pin) -> String {
        self.registry.pin_name(pin)
    }

    fn voltages(&self) -> NodeVoltages<'_> {
        NodeVoltages {
            dynamic: &self.dynamic_state,
            fixed: &self.static_state,
            input: &self.input_state,
        }
    }

    /// Nodal current imbalances at the present dynamic state.
    pub fn residual_vector(&mut self) -> Vec<f64> {
        let assembler = structure(&mut self.assembler, &mut self.floating, &self.registry);
        let mut out = vec![0.0; self.dynamic_state.len()];
        let voltages = NodeVoltages {
            dynamic: &self.dynamic_state,
            fixed: &self.static_state,
            input: &self.input_state,
        };
        assembler.residual(&self.components, &voltages, &mut out);
        out
    }

    /// Largest nodal current imbalance at the present dynamic state.
    pub fn residual(&mut self) -> f64 {
        self.residual_vector()
            .iter()
            .fold(0.0, |acc: f64, r| acc.max(r.abs()))
    }

    /// Analytic Jacobian at the present dynamic state (row-major).
    pub fn jacobian(&mut self) -> Vec<f64> {
        let assembler = structure(&mut self.assembler, &mut self.floating, &self.registry);
        let voltages = NodeVoltages {
            dynamic: &self.dynamic_state,
            fixed: &self.static_state,
            input: &self.input_state,
        };
        assembler.assemble(&self.components, &voltages, &mut self.system);
        self.system.jacobian.clone()
    }

    /// Finite-difference Jacobian at the present dynamic state (row-major).
    pub fn numerical_jacobian(&mut self) -> Vec<f64> {
        let assembler = structure(&mut self.assembler, &mut self.floating, &self.registry);
        let voltages = NodeVoltages {
            dynamic: &self.dynamic_state,
            fixed: &self.static_state,
            input: &self.input_state,
        };
        assembler.numerical_jacobian(&self.components, &voltages)
    }
}

/// The assembler for `registry`, built and checked on first use.
fn structure<'a>(
    slot: &'a mut Option<Assembler>,
    floating: &mut Vec<usize>,
    registry: &NodeRegistry,
) -> &'a mut Assembler {
    slot.get_or_insert_with(|| {
        *floating = validate_topology(registry);
        Assembler::build(registry)
    })
}

fn check_state(state: &'static str, current: &[f64], values: &[f64]) -> Result<()> {
    if values.len() != current.len() {
        return Err(NodalError::state_length(state, current.len(), values.len()));
    }
    if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(NodalError::invalid_parameter(
            format!("{} state", state),
            format!("[{}]", i),
            format!("must be finite, got {}", v),
        ));
    }
    Ok(())
}

impl fmt::Display for Circuit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts = self.node_counts();
        writeln!(
            f,
            "Circuit with {} dynamic, {} static and {} input nodes",
            counts.dynamic, counts.fixed, counts.input
        )?;
        for (i, v) in self.static_state.iter().enumerate() {
            writeln!(f, "  {:.6}V at static node {}", v, self.registry.static_name(i))?;
        }
        for (i, v) in self.dynamic_state.iter().enumerate() {
            writeln!(f, "  {:.6}V at dynamic node {}", v, self.registry.dynamic_name(i))?;
        }
        writeln!(f, "Components:")?;
        for (c, component) in self.components.iter().enumerate() {
            let wiring: Vec<String> = component
                .terminal_names()
                .iter()
                .zip(self.registry.pins(c))
                .map(|(name, &pin)| format!("{}={}", name, self.registry.pin_name(pin)))
                .collect();
            match component {
                Component::Resistor(_) => {
                    writeln!(f, "  Resistor {} [{}]", component, wiring.join(", "))?
                }
                Component::Bjt(_) => writeln!(f, "  {} [{}]", component, wiring.join(", "))?,
            }
        }
        Ok(())
    }
}
