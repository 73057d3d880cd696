//! Circuit validation.

use crate::components::ComponentKind;
use crate::error::{KirchhoffError, Result};

use super::CircuitGraph;

/// Validate a circuit graph before simulation.
///
/// Checks:
/// - The circuit has at least one component
/// - At most one component is flagged as the source, and it is a battery
/// - Node and wire membership agree in both directions
///
/// Wiring problems around the source (unwired, shorted) are not errors here;
/// a tick reports them as diagnostics.
pub fn validate_circuit(graph: &CircuitGraph) -> Result<()> {
    if graph.components.is_empty() {
        return Err(KirchhoffError::topology("Circuit has no components"));
    }

    let mut sources = graph.components.iter().filter(|c| c.is_source);
    if let Some(first) = sources.next() {
        if let Some(second) = sources.next() {
            return Err(KirchhoffError::MultipleSources {
                first: first.name.clone(),
                second: second.name.clone(),
            });
        }
        if first.kind != ComponentKind::Battery {
            return Err(KirchhoffError::topology(format!(
                "source '{}' must be a battery",
                first.name
            )));
        }
    }

    for wire in &graph.wires {
        for &node in &wire.nodes {
            if graph.node(node).wire != Some(wire.id) {
                return Err(KirchhoffError::topology(format!(
                    "{} lists {} but the node is not on it",
                    wire.id, node
                )));
            }
        }
    }

    for node in &graph.nodes {
        if let Some(wire) = node.wire {
            if !graph.wires[wire.0].nodes.contains(&node.id) {
                return Err(KirchhoffError::topology(format!(
                    "{} points at {} which does not list it",
                    node.id, wire
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl;

    #[test]
    fn test_valid_circuit() {
        let graph = CircuitGraph::from_ast(dsl::parse("B1 a 0 9\nR1 a 0 100").unwrap()).unwrap();
        assert!(validate_circuit(&graph).is_ok());
    }

    #[test]
    fn test_empty_circuit_rejected() {
        assert!(validate_circuit(&CircuitGraph::new()).is_err());
    }

    #[test]
    fn test_multiple_sources_rejected() {
        let mut graph = CircuitGraph::from_ast(dsl::parse("B1 a 0 9\nB2 a 0 9").unwrap()).unwrap();
        let b2 = graph.lookup("B2").unwrap();
        graph.component_mut(b2).is_source = true;
        assert!(matches!(
            validate_circuit(&graph),
            Err(KirchhoffError::MultipleSources { .. })
        ));
    }

    #[test]
    fn test_inconsistent_wire_rejected() {
        let mut graph = CircuitGraph::from_ast(dsl::parse("B1 a 0 9\nR1 a 0 100").unwrap()).unwrap();
        graph.nodes[0].wire = None;
        assert!(validate_circuit(&graph).is_err());
    }
}
