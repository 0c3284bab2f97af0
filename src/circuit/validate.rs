//! Circuit validation.

use log::warn;

use super::registry::NodeRegistry;
use super::types::Pin;

/// Dynamic nodes with no conductive path to a driven node.
///
/// Every component is treated as connecting all of its terminals. A
/// dynamic node that cannot reach a static, input or ground node through
/// such connections has no DC reference, and its Jacobian row is singular.
pub fn floating_nodes(registry: &NodeRegistry) -> Vec<usize> {
    let n = registry.counts().dynamic;
    // Vertex n stands for every driven node at once
    let mut parent: Vec<usize> = (0..=n).collect();

    fn find(parent: &mut [usize], mut i: usize) -> usize {
        while parent[i] != i {
            parent[i] = parent[parent[i]];
            i = parent[i];
        }
        i
    }

    let vertex = |pin: Pin| pin.dynamic_index().unwrap_or(n);

    for component in 0..registry.len() {
        let pins = registry.pins(component);
        let Some(&first) = pins.first() else {
            continue;
        };
        let root = find(&mut parent, vertex(first));
        for &pin in &pins[1..] {
            let other = find(&mut parent, vertex(pin));
            if other != root {
                parent[other] = root;
            }
        }
    }

    let reference = find(&mut parent, n);
    (0..n)
        .filter(|&node| find(&mut parent, node) != reference)
        .collect()
}

/// Check a circuit topology before solving.
///
/// Every problem is logged. The floating nodes are returned so the caller
/// can refuse to solve.
pub fn validate_topology(registry: &NodeRegistry) -> Vec<usize> {
    if registry.is_empty() {
        warn!("Circuit has no components");
    }

    for node in registry.unattached_dynamic_nodes() {
        warn!(
            "Dynamic node '{}' has no component attached",
            registry.dynamic_name(node)
        );
    }

    let floating = floating_nodes(registry);
    for &node in &floating {
        warn!(
            "Floating node '{}' detected - no path to a driven node",
            registry.dynamic_name(node)
        );
    }
    floating
}
