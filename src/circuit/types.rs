//! Core types for circuit representation.

use std::fmt;

/// Where a component terminal is connected.
///
/// Indices are 0-based and contiguous within each class. Ground is a
/// fixed 0 V reference and needs no index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pin {
    /// A node whose voltage is solved for
    Dynamic(usize),
    /// A node driven by the static state
    Static(usize),
    /// A node driven by the per-step input state
    Input(usize),
    /// The 0 V reference
    Ground,
}

impl Pin {
    /// Check if this pin is a solved unknown.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Pin::Dynamic(_))
    }

    /// Index into the dynamic state, if this is a dynamic pin.
    pub fn dynamic_index(&self) -> Option<usize> {
        match self {
            Pin::Dynamic(i) => Some(*i),
            _ => None,
        }
    }

    /// Name of the node class, for messages.
    pub fn class_name(&self) -> &'static str {
        match self {
            Pin::Dynamic(_) => "dynamic",
            Pin::Static(_) => "static",
            Pin::Input(_) => "input",
            Pin::Ground => "ground",
        }
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pin::Dynamic(i) => write!(f, "D{}", i),
            Pin::Static(i) => write!(f, "S{}", i),
            Pin::Input(i) => write!(f, "I{}", i),
            Pin::Ground => write!(f, "GND"),
        }
    }
}

/// Number of nodes in each class, fixed when a circuit is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeCounts {
    pub dynamic: usize,
    pub fixed: usize,
    pub input: usize,
}

impl NodeCounts {
    /// Create a new set of node counts.
    pub fn new(dynamic: usize, fixed: usize, input: usize) -> Self {
        Self {
            dynamic,
            fixed,
            input,
        }
    }

    /// Number of nodes available for the class of `pin` (ground has none).
    pub fn available(&self, pin: Pin) -> usize {
        match pin {
            Pin::Dynamic(_) => self.dynamic,
            Pin::Static(_) => self.fixed,
            Pin::Input(_) => self.input,
            Pin::Ground => 0,
        }
    }

    /// Check that `pin` lies within its class range.
    pub fn contains(&self, pin: Pin) -> bool {
        match pin {
            Pin::Dynamic(i) => i < self.dynamic,
            Pin::Static(i) => i < self.fixed,
            Pin::Input(i) => i < self.input,
            Pin::Ground => true,
        }
    }
}

/// Read-only view of every node voltage at one Newton iterate.
#[derive(Debug, Clone, Copy)]
pub struct NodeVoltages<'a> {
    pub dynamic: &'a [f64],
    pub fixed: &'a [f64],
    pub input: &'a [f64],
}

impl<'a> NodeVoltages<'a> {
    /// Get the voltage at a pin.
    pub fn voltage(&self, pin: Pin) -> f64 {
        match pin {
            Pin::Dynamic(i) => self.dynamic[i],
            Pin::Static(i) => self.fixed[i],
            Pin::Input(i) => self.input[i],
            Pin::Ground => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pin_display() {
        assert_eq!(Pin::Dynamic(2).to_string(), "D2");
        assert_eq!(Pin::Static(0).to_string(), "S0");
        assert_eq!(Pin::Input(1).to_string(), "I1");
        assert_eq!(Pin::Ground.to_string(), "GND");
    }

    #[test]
    fn test_counts_bounds() {
        let counts = NodeCounts::new(3, 2, 0);
        assert!(counts.contains(Pin::Dynamic(2)));
        assert!(!counts.contains(Pin::Dynamic(3)));
        assert!(counts.contains(Pin::Static(1)));
        assert!(!counts.contains(Pin::Input(0)));
        assert!(counts.contains(Pin::Ground));
        assert_eq!(counts.available(Pin::Static(7)), 2);
    }

    #[test]
    fn test_voltage_lookup() {
        let dynamic = [0.5, 1.5];
        let fixed = [5.0];
        let input = [-1.0];
        let v = NodeVoltages {
            dynamic: &dynamic,
            fixed: &fixed,
            input: &input,
        };
        assert_eq!(v.voltage(Pin::Dynamic(1)), 1.5);
        assert_eq!(v.voltage(Pin::Static(0)), 5.0);
        assert_eq!(v.voltage(Pin::Input(0)), -1.0);
        assert_eq!(v.voltage(Pin::Ground), 0.0);
    }
}
