//! Fixed-point solver over the equation pool.

use crate::circuit::ComponentId;
use crate::components::{Quantity, VariableRef};

use super::equations::{branch_voltage, member_voltage, Equation};
use super::tree::{Tree, TreeNode};
use super::{Path, Values};

/// How the fixed-point loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolOutcome {
    /// Passes run, including the final one that changed nothing
    pub iterations: usize,
    /// `false` when the iteration cap cut the loop short
    pub converged: bool,
}

/// Apply equations and the two voltage passes until nothing changes.
///
/// Each iteration runs every equation in insertion order, then the series
/// divider pass, then the path voltage pass. Variables left undefined stay
/// `None`; partially specified circuits are expected.
pub fn solve_pool(
    values: &mut Values,
    equations: &[Equation<'_>],
    tree: &Tree,
    paths: &[Path],
    max_iterations: usize,
) -> PoolOutcome {
    for iteration in 1..=max_iterations {
        let _span = tracing::trace_span!("pool_iter", iteration).entered();
        let mut progress = false;

        for equation in equations {
            if values.is_defined(equation.target) {
                continue;
            }
            if let Some(value) = equation.evaluate(values) {
                if values.define(equation.target, value) {
                    tracing::debug!(variable = %equation.target, value, kind = %equation.kind, "derived");
                    progress = true;
                }
            }
        }

        progress |= series_divider_pass(values, tree);
        progress |= path_voltage_pass(values, paths);

        if !progress {
            return PoolOutcome {
                iterations: iteration,
                converged: true,
            };
        }
    }

    tracing::warn!(max_iterations, "equation pool hit the iteration cap");
    PoolOutcome {
        iterations: max_iterations,
        converged: false,
    }
}

/// Series voltage law: in a run with exactly one unknown voltage, that voltage
/// is the reference minus the known ones, clamped at zero.
///
/// The root's reference is the source voltage; a run inside a parallel group
/// uses any sibling branch's known voltage.
fn series_divider_pass(values: &mut Values, tree: &Tree) -> bool {
    let source = values.source();
    let mut progress = false;

    for group in tree.series_groups() {
        let members: Vec<&TreeNode> = group
            .members
            .iter()
            .filter(|m| !group.is_root || **m != TreeNode::Leaf(source))
            .collect();
        if members.is_empty() {
            continue;
        }

        let mut unknown = None;
        let mut known_sum = 0.0;
        let mut unknown_count = 0;
        for &member in &members {
            match member_voltage(values, member) {
                Some(v) => known_sum += v,
                None => {
                    unknown = Some(member);
                    unknown_count += 1;
                }
            }
        }
        let (Some(unknown), 1) = (unknown, unknown_count) else {
            continue;
        };

        let reference = if group.is_root {
            values.value(source, Quantity::Voltage)
        } else {
            group.siblings.iter().find_map(|b| branch_voltage(values, b))
        };
        let Some(reference) = reference else {
            continue;
        };

        let value = (reference - known_sum).max(0.0);
        match unknown {
            TreeNode::Leaf(id) => {
                if values.define(VariableRef::new(*id, Quantity::Voltage), value) {
                    tracing::debug!(component = %id, value, "series divider");
                    progress = true;
                }
            }
            TreeNode::Seq(branches) => {
                for branch in branches {
                    if let TreeNode::Leaf(id) = branch {
                        if values.define(VariableRef::new(*id, Quantity::Voltage), value) {
                            tracing::debug!(component = %id, value, "series divider (parallel group)");
                            progress = true;
                        }
                    }
                }
            }
        }
    }

    progress
}

/// Loop voltage law: on a loop with exactly one unknown voltage, that voltage
/// is the source voltage minus the others, clamped at zero.
///
/// Without a known source voltage, a sibling loop whose diverging section is
/// fully known serves as the reference for the same section of this loop.
fn path_voltage_pass(values: &mut Values, paths: &[Path]) -> bool {
    let source = values.source();
    let mut progress = false;

    for (p, path) in paths.iter().enumerate() {
        let interior = interior_of(path);
        let voltage = |k: usize| values.value(interior[k], Quantity::Voltage);

        let unknown: Vec<usize> = (0..interior.len()).filter(|&k| voltage(k).is_none()).collect();
        let &[target] = unknown.as_slice() else {
            continue;
        };
        let others = |range: std::ops::Range<usize>| -> f64 {
            range.filter(|&k| k != target).filter_map(voltage).sum()
        };

        let value = match values.value(source, Quantity::Voltage) {
            Some(reference) => Some(reference - others(0..interior.len())),
            None => paths
                .iter()
                .enumerate()
                .filter(|&(q, _)| q != p)
                .find_map(|(_, sibling)| {
                    let sibling = interior_of(sibling);
                    let (start, end) = diverging_section(interior, sibling);
                    if !(start..interior.len() - end).contains(&target) {
                        return None;
                    }
                    let section: Option<f64> = sibling[start..sibling.len() - end]
                        .iter()
                        .map(|&id| values.value(id, Quantity::Voltage))
                        .sum();
                    Some(section? - others(start..interior.len() - end))
                }),
        };

        let Some(value) = value else {
            continue;
        };
        let id = interior[target];
        if values.define(VariableRef::new(id, Quantity::Voltage), value.max(0.0)) {
            tracing::debug!(component = %id, value, "path voltage");
            progress = true;
        }
    }

    progress
}

fn interior_of(path: &[ComponentId]) -> &[ComponentId] {
    path.get(1..path.len().saturating_sub(1)).unwrap_or_default()
}

/// Lengths of the shared head and the shared, non-overlapping tail of two loops.
fn diverging_section<T: PartialEq>(a: &[T], b: &[T]) -> (usize, usize) {
    let min_len = a.len().min(b.len());
    let head = a.iter().zip(b).take_while(|(x, y)| x == y).count();
    let tail = a
        .iter()
        .rev()
        .zip(b.iter().rev())
        .take(min_len - head)
        .take_while(|(x, y)| x == y)
        .count();
    (head, tail)
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::circuit::CircuitGraph;
    use crate::components::Slot;
    use crate::dsl;
    use crate::solver::{activate_paths, build_tree, extract_paths, generate_equations};

    struct Fixture {
        graph: CircuitGraph,
        tree: Tree,
        paths: Vec<Path>,
    }

    fn fixture(netlist: &str) -> Fixture {
        let graph = CircuitGraph::from_ast(dsl::parse(netlist).unwrap()).unwrap();
        let source = graph.find_source().unwrap();
        let paths = activate_paths(&graph, source, extract_paths(&graph, source).unwrap()).active_paths;
        let tree = build_tree(&paths);
        Fixture { graph, tree, paths }
    }

    impl Fixture {
        fn solve(&self) -> (Values, PoolOutcome) {
            let source = self.graph.find_source().unwrap();
            let mut values = Values::extract(&self.graph, source, &self.tree.flatten());
            let equations = generate_equations(&values, &self.tree);
            let outcome = solve_pool(&mut values, &equations, &self.tree, &self.paths, 100);
            (values, outcome)
        }

        fn get(&self, values: &Values, name: &str, q: Quantity) -> Option<f64> {
            values.value(self.graph.lookup(name).unwrap(), q)
        }
    }

    #[test]
    fn test_divider_scenario() {
        let f = fixture("B1 top 0 9\nR1 top mid 100\nR2 mid 0 v=3");
        let (values, outcome) = f.solve();

        assert!(outcome.converged);
        assert_abs_diff_eq!(f.get(&values, "R1", Quantity::Voltage).unwrap(), 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.get(&values, "R1", Quantity::Current).unwrap(), 0.06, epsilon = 1e-12);
        assert_abs_diff_eq!(f.get(&values, "R2", Quantity::Current).unwrap(), 0.06, epsilon = 1e-12);
        assert_abs_diff_eq!(f.get(&values, "R2", Quantity::Resistance).unwrap(), 50.0, epsilon = 1e-9);
        assert_abs_diff_eq!(f.get(&values, "B1", Quantity::Current).unwrap(), 0.06, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_voltage_from_source() {
        let f = fixture("B1 top 0 9\nR1 top 0 100\nR2 top 0 i=0.03");
        let (values, _) = f.solve();

        assert_abs_diff_eq!(f.get(&values, "R1", Quantity::Voltage).unwrap(), 9.0);
        assert_abs_diff_eq!(f.get(&values, "R2", Quantity::Voltage).unwrap(), 9.0);
        assert_abs_diff_eq!(f.get(&values, "R1", Quantity::Current).unwrap(), 0.09, epsilon = 1e-12);
        assert_abs_diff_eq!(f.get(&values, "R2", Quantity::Resistance).unwrap(), 300.0, epsilon = 1e-9);
        assert_abs_diff_eq!(f.get(&values, "B1", Quantity::Current).unwrap(), 0.12, epsilon = 1e-12);
    }

    #[test]
    fn test_divider_clamps_at_zero() {
        let f = fixture("B1 top 0 9\nR1 top mid 100\nR2 mid 0 v=12");
        let (values, _) = f.solve();
        assert_eq!(f.get(&values, "R1", Quantity::Voltage), Some(0.0));
    }

    #[test]
    fn test_series_branch_uses_sibling_reference() {
        // R3 is in series with R4 inside a parallel group across R2.
        let f = fixture("B1 top 0 9\nR1 top mid 1\nR2 mid 0 v=4\nR3 mid x v=1\nR4 x 0 i=auto");
        let (values, _) = f.solve();
        assert_abs_diff_eq!(f.get(&values, "R4", Quantity::Voltage).unwrap(), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(f.get(&values, "R1", Quantity::Voltage).unwrap(), 5.0, epsilon = 1e-12);
    }

    #[test]
    fn test_path_pass_subtracts_known_drops() {
        let f = fixture("B1 top 0 9\nR1 top mid v=2\nR2 mid 0");
        let source = f.graph.find_source().unwrap();
        let mut values = Values::extract(&f.graph, source, &f.tree.flatten());

        assert!(path_voltage_pass(&mut values, &f.paths));
        assert_abs_diff_eq!(f.get(&values, "R2", Quantity::Voltage).unwrap(), 7.0, epsilon = 1e-12);
        assert!(!path_voltage_pass(&mut values, &f.paths));
    }

    #[test]
    fn test_sibling_branch_reference_without_source_voltage() {
        let mut f = fixture("B1 top 0 9\nR1 top 0 v=4\nR2 top mid v=1\nR3 mid 0");
        let b1 = f.graph.lookup("B1").unwrap();
        f.graph.set_slot(b1, Quantity::Voltage, Slot::automatic());
        let (values, _) = f.solve();
        assert_abs_diff_eq!(f.get(&values, "R3", Quantity::Voltage).unwrap(), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_unsolvable_circuit_converges_with_unknowns() {
        let f = fixture("B1 top 0 9\nR1 top mid\nR2 mid 0");
        let (values, outcome) = f.solve();
        assert!(outcome.converged);
        assert_eq!(f.get(&values, "R1", Quantity::Current), None);
    }

    #[test]
    fn test_diverging_section() {
        assert_eq!(diverging_section(&[1, 2, 5], &[1, 3, 4, 5]), (1, 1));
        assert_eq!(diverging_section(&[2], &[3]), (0, 0));
        assert_eq!(diverging_section(&[1, 2], &[1, 2, 3]), (2, 0));
    }
}
