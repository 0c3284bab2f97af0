//! Circuit representation.
//!
//! The [`Circuit`] struct owns the components, the wiring of their
//! terminals onto nodes, and the voltages of every node class. Wiring is
//! kept in a [`NodeRegistry`], which also indexes the terminals attached
//! to each dynamic node.

mod graph;
mod registry;
mod types;
mod validate;

pub use graph::Circuit;
pub use registry::{NodeRegistry, Terminal};
pub use types::*;
pub use validate::{floating_nodes, validate_topology};
