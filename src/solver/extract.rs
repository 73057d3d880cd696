//! Loop enumeration from the source back to itself.

use std::collections::HashSet;

use crate::circuit::{CircuitGraph, ComponentId, Terminal, WireId};

use super::Diagnostic;

/// One simple conduction loop: the source, the components crossed in order,
/// and the source again.
pub type Path = Vec<ComponentId>;

/// Enumerate every simple loop leaving the source through its start terminal
/// and returning to its end terminal.
///
/// Fails with a diagnostic when a source terminal is unwired or both share a
/// wire. The search is exhaustive, so its cost grows with the number of
/// loops; interactive circuits stay small.
pub fn extract_paths(graph: &CircuitGraph, source: ComponentId) -> Result<Vec<Path>, Diagnostic> {
    let start_wire = graph.terminal_wire(source, Terminal::Start);
    let end_wire = graph.terminal_wire(source, Terminal::End);

    let (Some(start_wire), Some(end_wire)) = (start_wire, end_wire) else {
        return Err(Diagnostic::SourceUnwired { source });
    };
    if start_wire == end_wire {
        return Err(Diagnostic::SourceShortCircuited { source });
    }

    let mut walker = Walker {
        graph,
        source,
        return_wire: end_wire,
        visited: HashSet::new(),
        path: vec![source],
        paths: Vec::new(),
    };
    // Entering the source at its end terminal makes the walk leave through start (+).
    walker.walk(source, Terminal::End);

    tracing::trace!(paths = walker.paths.len(), "enumerated loops");
    Ok(walker.paths)
}

struct Walker<'a> {
    graph: &'a CircuitGraph,
    source: ComponentId,
    return_wire: WireId,
    visited: HashSet<ComponentId>,
    path: Vec<ComponentId>,
    paths: Vec<Path>,
}

impl Walker<'_> {
    fn walk(&mut self, component: ComponentId, entry: Terminal) {
        self.visited.insert(component);

        let exit = self.graph.component(component).node(entry.opposite());
        let exit_wire = self.graph.wire_of(exit);
        let adjacent = self.graph.adjacent_components(exit, Some(component));

        // Reaching the source ends the walk: a loop when we arrive on its end
        // terminal, a dead end when we are back on its start wire.
        if component != self.source && adjacent.contains(&self.source) {
            if exit_wire == Some(self.return_wire) {
                let mut path = self.path.clone();
                path.push(self.source);
                self.paths.push(path);
            }
            self.visited.remove(&component);
            return;
        }

        for next in adjacent {
            if self.visited.contains(&next) {
                continue;
            }
            let entry = if self.graph.terminal_wire(next, Terminal::Start) == exit_wire {
                Terminal::Start
            } else {
                Terminal::End
            };

            self.path.push(next);
            self.walk(next, entry);
            self.path.pop();
        }

        self.visited.remove(&component);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl;

    fn setup(netlist: &str) -> (CircuitGraph, ComponentId) {
        let graph = CircuitGraph::from_ast(dsl::parse(netlist).unwrap()).unwrap();
        let source = graph.find_source().unwrap();
        (graph, source)
    }

    fn names(graph: &CircuitGraph, path: &Path) -> Vec<String> {
        path.iter().map(|&id| graph.component(id).name.clone()).collect()
    }

    #[test]
    fn test_series_loop() {
        let (g, src) = setup("B1 top 0 9\nR1 top mid 100\nR2 mid 0 200");
        let paths = extract_paths(&g, src).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(names(&g, &paths[0]), vec!["B1", "R1", "R2", "B1"]);
    }

    #[test]
    fn test_parallel_branches_give_two_loops() {
        let (g, src) = setup("B1 top 0 9\nR1 top 0 100\nR2 top 0 300");
        let paths = extract_paths(&g, src).unwrap();
        assert_eq!(paths.len(), 2);
        assert_eq!(names(&g, &paths[0]), vec!["B1", "R1", "B1"]);
        assert_eq!(names(&g, &paths[1]), vec!["B1", "R2", "B1"]);
    }

    #[test]
    fn test_source_never_in_interior() {
        let (g, src) = setup("B1 a 0 9\nR1 a b 1\nR2 b 0 1\nR3 a b 1\nR4 b 0 1");
        let paths = extract_paths(&g, src).unwrap();
        assert_eq!(paths.len(), 4);
        for path in &paths {
            assert_eq!(path.first(), Some(&src));
            assert_eq!(path.last(), Some(&src));
            assert!(!path[1..path.len() - 1].contains(&src));
        }
    }

    #[test]
    fn test_dangling_branch_is_pruned() {
        let (g, src) = setup("B1 a 0 9\nR1 a 0 100\nR2 a stub 5\nR3 stub2 x 5");
        let paths = extract_paths(&g, src).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(names(&g, &paths[0]), vec!["B1", "R1", "B1"]);
    }

    #[test]
    fn test_unwired_source() {
        let (g, src) = setup("B1 a b 9\nR1 a c 1");
        assert_eq!(
            extract_paths(&g, src),
            Err(Diagnostic::SourceUnwired { source: src })
        );
    }

    #[test]
    fn test_short_circuited_source() {
        let (g, src) = setup("B1 a a 9\nR1 a b 1");
        assert_eq!(
            extract_paths(&g, src),
            Err(Diagnostic::SourceShortCircuited { source: src })
        );
    }
}
