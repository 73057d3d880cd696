//! Selection of the loops that currently conduct.

use crate::circuit::{CircuitGraph, ComponentId, Terminal};
use crate::components::Quantity;

use super::Path;

/// Loops carrying current this tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Activation {
    /// Conducting loops, oriented in the direction of current flow
    pub active_paths: Vec<Path>,
    /// The source's configured voltage is negative
    pub polarity_reversed: bool,
}

/// Filter `paths` down to the loops that conduct.
///
/// A negative source voltage reverses every loop first, so current always
/// leaves the source at position 0. A loop is dropped when it crosses an open
/// switch or enters a directional component through its end terminal.
pub fn activate_paths(graph: &CircuitGraph, source: ComponentId, paths: Vec<Path>) -> Activation {
    let polarity_reversed = graph.get(source, Quantity::Voltage).is_some_and(|v| v < 0.0);

    let active_paths: Vec<Path> = paths
        .into_iter()
        .map(|mut path| {
            if polarity_reversed {
                path.reverse();
            }
            path
        })
        .filter(|path| conducts(graph, source, path, polarity_reversed))
        .collect();

    tracing::debug!(
        active = active_paths.len(),
        polarity_reversed,
        "selected conducting loops"
    );

    Activation {
        active_paths,
        polarity_reversed,
    }
}

fn conducts(graph: &CircuitGraph, source: ComponentId, path: &[ComponentId], polarity_reversed: bool) -> bool {
    let outgoing = if polarity_reversed { Terminal::End } else { Terminal::Start };
    let mut current_wire = graph.terminal_wire(source, outgoing);

    let interior = path.get(1..path.len().saturating_sub(1)).unwrap_or_default();
    for &id in interior {
        let component = graph.component(id);
        if component.is_open_switch() {
            return false;
        }

        let entered_from_start = graph.terminal_wire(id, Terminal::Start) == current_wire;
        if !entered_from_start && component.kind.is_directional() {
            return false;
        }

        let exit = if entered_from_start { Terminal::End } else { Terminal::Start };
        current_wire = graph.terminal_wire(id, exit);
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl;
    use crate::solver::extract_paths;

    fn activate(netlist: &str) -> (CircuitGraph, Activation) {
        let graph = CircuitGraph::from_ast(dsl::parse(netlist).unwrap()).unwrap();
        let source = graph.find_source().unwrap();
        let paths = extract_paths(&graph, source).unwrap();
        let activation = activate_paths(&graph, source, paths);
        (graph, activation)
    }

    #[test]
    fn test_closed_switch_conducts() {
        let (_, a) = activate("B1 top 0 9\nSW1 top mid on\nR1 mid 0 100");
        assert_eq!(a.active_paths.len(), 1);
        assert!(!a.polarity_reversed);
    }

    #[test]
    fn test_open_switch_blocks_loop() {
        let (_, a) = activate("B1 top 0 9\nSW1 top mid off\nR1 mid 0 100");
        assert!(a.active_paths.is_empty());
    }

    #[test]
    fn test_open_switch_blocks_only_its_branch() {
        let (g, a) = activate("B1 top 0 9\nSW1 top mid off\nR1 mid 0 100\nR2 top 0 50");
        assert_eq!(a.active_paths.len(), 1);
        assert!(a.active_paths[0].contains(&g.lookup("R2").unwrap()));
    }

    #[test]
    fn test_backwards_bulb_blocks_loop() {
        let (_, forward) = activate("B1 top 0 9\nL1 top 0 20");
        assert_eq!(forward.active_paths.len(), 1);

        let (_, backward) = activate("B1 top 0 9\nL1 0 top 20");
        assert!(backward.active_paths.is_empty());
    }

    #[test]
    fn test_resistor_conducts_either_way() {
        let (_, a) = activate("B1 top 0 9\nR1 0 top 20");
        assert_eq!(a.active_paths.len(), 1);
    }

    #[test]
    fn test_negative_source_reverses_orientation() {
        // With -9 V current leaves through the end terminal, so the
        // ammeter must face the other way.
        let (g, a) = activate("B1 top 0 -9\nAM1 0 top");
        assert!(a.polarity_reversed);
        assert_eq!(a.active_paths.len(), 1);
        assert_eq!(a.active_paths[0][1], g.lookup("AM1").unwrap());

        let (_, blocked) = activate("B1 top 0 -9\nAM1 top 0");
        assert!(blocked.active_paths.is_empty());
    }
}
