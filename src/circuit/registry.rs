//! Node and pin registry.
//!
//! Records which component terminal is wired to which node, and keeps the
//! reverse index from each dynamic node to the terminals attached to it.

use super::types::{NodeCounts, Pin};
use crate::error::{NodalError, Result};

/// A component terminal: (component index, terminal index).
pub type Terminal = (usize, usize);

/// Connectivity of a circuit.
#[derive(Debug, Clone, Default)]
pub struct NodeRegistry {
    counts: NodeCounts,
    /// Pins of each registered component, in terminal order
    wiring: Vec<Vec<Pin>>,
    /// Terminals attached to each dynamic node
    dynamic_terminals: Vec<Vec<Terminal>>,
    dynamic_names: Vec<String>,
    static_names: Vec<String>,
}

impl NodeRegistry {
    /// Create an empty registry for the given node counts.
    pub fn new(counts: NodeCounts) -> Self {
        Self {
            counts,
            wiring: Vec::new(),
            dynamic_terminals: vec![Vec::new(); counts.dynamic],
            dynamic_names: (0..counts.dynamic).map(|i| Pin::Dynamic(i).to_string()).collect(),
            static_names: (0..counts.fixed).map(|i| Pin::Static(i).to_string()).collect(),
        }
    }

    pub fn counts(&self) -> NodeCounts {
        self.counts
    }

    /// Check a pin list for a component with `terminal_count` terminals.
    pub fn check(&self, component: &str, terminal_count: usize, pins: &[Pin]) -> Result<()> {
        if pins.len() != terminal_count {
            return Err(NodalError::PinCountMismatch {
                component: component.to_string(),
                expected: terminal_count,
                actual: pins.len(),
            });
        }

        for &pin in pins {
            if !self.counts.contains(pin) {
                return Err(NodalError::PinOutOfRange {
                    component: component.to_string(),
                    pin,
                    class: pin.class_name(),
                    available: self.counts.available(pin),
                });
            }
        }

        Ok(())
    }

    /// Record the wiring of the next component. Pins must already be checked.
    pub fn attach(&mut self, pins: &[Pin]) -> usize {
        let component = self.wiring.len();
        for (terminal, pin) in pins.iter().enumerate() {
            if let Some(node) = pin.dynamic_index() {
                self.dynamic_terminals[node].push((component, terminal));
            }
        }
        self.wiring.push(pins.to_vec());
        component
    }

    /// Pins of a registered component.
    pub fn pins(&self, component: usize) -> &[Pin] {
        &self.wiring[component]
    }

    /// Number of registered components.
    pub fn len(&self) -> usize {
        self.wiring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wiring.is_empty()
    }

    /// Terminals attached to a dynamic node.
    pub fn terminals(&self, node: usize) -> &[Terminal] {
        &self.dynamic_terminals[node]
    }

    /// Dynamic nodes with no terminal attached at all.
    pub fn unattached_dynamic_nodes(&self) -> Vec<usize> {
        self.dynamic_terminals
            .iter()
            .enumerate()
            .filter(|(_, terminals)| terminals.is_empty())
            .map(|(node, _)| node)
            .collect()
    }

    /// Name a dynamic node (`D<i>` unless renamed).
    pub fn dynamic_name(&self, node: usize) -> &str {
        &self.dynamic_names[node]
    }

    /// Name a static node (`S<i>` unless renamed).
    pub fn static_name(&self, node: usize) -> &str {
        &self.static_names[node]
    }

    /// Name of the node behind any pin.
    pub fn pin_name(&self, pin: Pin) -> String {
        match pin {
            Pin::Dynamic(i) => self.dynamic_names[i].clone(),
            Pin::Static(i) => self.static_names[i].clone(),
            other => other.to_string(),
        }
    }

    pub fn set_dynamic_names(&mut self, names: Vec<String>) -> Result<()> {
        if names.len() != self.counts.dynamic {
            return Err(NodalError::state_length(
                "dynamic name",
                self.counts.dynamic,
                names.len(),
            ));
        }
        self.dynamic_names = names;
        Ok(())
    }

    pub fn set_static_names(&mut self, names: Vec<String>) -> Result<()> {
        if names.len() != self.counts.fixed {
            return Err(NodalError::state_length(
                "static name",
                self.counts.fixed,
                names.len(),
            ));
        }
        self.static_names = names;
        Ok(())
    }
}
