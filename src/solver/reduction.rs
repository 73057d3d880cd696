//! Direct series/parallel reduction for fully resistive circuits.
//!
//! When the source voltage and every resistance are known, the equivalent
//! resistance of the tree gives the total current outright, which is then
//! split back down the tree. Fixed values are never replaced.

use crate::circuit::ComponentId;
use crate::components::{Quantity, VariableRef};

use super::tree::{Tree, TreeNode};
use super::Values;

/// Try to solve the tree by reduction. Returns `false` when the preconditions
/// do not hold and nothing was touched.
pub fn reduce(values: &mut Values, tree: &Tree) -> bool {
    let source = values.source();
    let Some(voltage) = values.value(source, Quantity::Voltage) else {
        return false;
    };
    if voltage == 0.0 {
        return false;
    }

    let Some(equivalent) = series_resistance(values, &tree.0, source) else {
        return false;
    };
    if equivalent <= 0.0 {
        // A zero-resistance loop has no finite current.
        return false;
    }

    let current = voltage / equivalent;
    tracing::debug!(equivalent, current, "reduced tree");

    values.define(VariableRef::new(source, Quantity::Current), current);
    propagate_series(values, &tree.0, source, current);
    true
}

fn series_resistance(values: &Values, members: &[TreeNode], source: ComponentId) -> Option<f64> {
    members
        .iter()
        .filter(|m| **m != TreeNode::Leaf(source))
        .map(|member| match member {
            TreeNode::Leaf(id) => values.value(*id, Quantity::Resistance),
            TreeNode::Seq(branches) => parallel_resistance(values, branches, source),
        })
        .sum()
}

fn parallel_resistance(values: &Values, branches: &[TreeNode], source: ComponentId) -> Option<f64> {
    let mut conductance = 0.0;
    let mut shorted = false;
    for branch in branches {
        let r = branch_resistance(values, branch, source)?;
        if r == 0.0 {
            shorted = true;
        } else {
            conductance += 1.0 / r;
        }
    }

    if shorted {
        Some(0.0)
    } else if conductance > 0.0 {
        Some(1.0 / conductance)
    } else {
        None
    }
}

fn branch_resistance(values: &Values, branch: &TreeNode, source: ComponentId) -> Option<f64> {
    match branch {
        TreeNode::Leaf(id) => values.value(*id, Quantity::Resistance),
        TreeNode::Seq(members) => series_resistance(values, members, source),
    }
}

fn define_leaf(values: &mut Values, id: ComponentId, voltage: f64, current: f64) {
    values.define(VariableRef::new(id, Quantity::Current), current);
    values.define(VariableRef::new(id, Quantity::Voltage), voltage);
}

fn propagate_series(values: &mut Values, members: &[TreeNode], source: ComponentId, current: f64) {
    for member in members {
        match member {
            TreeNode::Leaf(id) if *id == source => {}
            TreeNode::Leaf(id) => {
                let r = values.value(*id, Quantity::Resistance).unwrap_or(0.0);
                define_leaf(values, *id, current * r, current);
            }
            TreeNode::Seq(branches) => {
                let r = parallel_resistance(values, branches, source).unwrap_or(0.0);
                propagate_parallel(values, branches, source, current * r, current);
            }
        }
    }
}

fn propagate_parallel(values: &mut Values, branches: &[TreeNode], source: ComponentId, voltage: f64, current: f64) {
    let resistances: Vec<f64> = branches
        .iter()
        .map(|b| branch_resistance(values, b, source).unwrap_or(0.0))
        .collect();
    let shorts = resistances.iter().filter(|&&r| r == 0.0).count();

    for (branch, &r) in branches.iter().zip(&resistances) {
        let branch_current = match (shorts, r == 0.0) {
            (0, _) => voltage / r,
            (n, true) => current / n as f64,
            (_, false) => 0.0,
        };
        match branch {
            TreeNode::Leaf(id) => define_leaf(values, *id, voltage, branch_current),
            TreeNode::Seq(members) => propagate_series(values, members, source, branch_current),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::circuit::CircuitGraph;
    use crate::dsl;
    use crate::solver::{activate_paths, build_tree, extract_paths};

    fn reduce_netlist(netlist: &str) -> (CircuitGraph, Values, bool) {
        let graph = CircuitGraph::from_ast(dsl::parse(netlist).unwrap()).unwrap();
        let source = graph.find_source().unwrap();
        let paths = extract_paths(&graph, source).unwrap();
        let tree = build_tree(&activate_paths(&graph, source, paths).active_paths);
        let mut values = Values::extract(&graph, source, &tree.flatten());
        let reduced = reduce(&mut values, &tree);
        (graph, values, reduced)
    }

    fn value(graph: &CircuitGraph, values: &Values, name: &str, q: Quantity) -> f64 {
        values.value(graph.lookup(name).unwrap(), q).unwrap()
    }

    #[test]
    fn test_series_divider() {
        let (g, v, reduced) = reduce_netlist("B1 top 0 9\nR1 top mid 100\nR2 mid 0 200");
        assert!(reduced);
        assert_abs_diff_eq!(value(&g, &v, "B1", Quantity::Current), 0.03, epsilon = 1e-12);
        assert_abs_diff_eq!(value(&g, &v, "R1", Quantity::Voltage), 3.0, epsilon = 1e-12);
        assert_abs_diff_eq!(value(&g, &v, "R2", Quantity::Voltage), 6.0, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_pair() {
        let (g, v, reduced) = reduce_netlist("B1 top 0 9\nR1 top 0 100\nR2 top 0 300");
        assert!(reduced);
        assert_abs_diff_eq!(value(&g, &v, "B1", Quantity::Current), 0.12, epsilon = 1e-12);
        assert_abs_diff_eq!(value(&g, &v, "R1", Quantity::Current), 0.09, epsilon = 1e-12);
        assert_abs_diff_eq!(value(&g, &v, "R2", Quantity::Voltage), 9.0, epsilon = 1e-12);
    }

    #[test]
    fn test_shorted_branch_takes_all_current() {
        let (g, v, reduced) = reduce_netlist("B1 top 0 9\nR1 top mid 90\nR2 mid 0 100\nAM1 mid 0");
        assert!(reduced);
        assert_abs_diff_eq!(value(&g, &v, "R1", Quantity::Current), 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(value(&g, &v, "R2", Quantity::Current), 0.0);
        assert_abs_diff_eq!(value(&g, &v, "AM1", Quantity::Current), 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(value(&g, &v, "AM1", Quantity::Voltage), 0.0);
    }

    #[test]
    fn test_unknown_resistance_skips_reduction() {
        let (g, v, reduced) = reduce_netlist("B1 top 0 9\nR1 top mid 100\nR2 mid 0 v=3");
        assert!(!reduced);
        assert_eq!(v.value(g.lookup("R1").unwrap(), Quantity::Current), None);
    }

    #[test]
    fn test_fixed_values_win() {
        let (g, v, _) = reduce_netlist("B1 top 0 9\nR1 top 0 100 v=5");
        assert_abs_diff_eq!(value(&g, &v, "R1", Quantity::Voltage), 5.0);
        assert_abs_diff_eq!(value(&g, &v, "R1", Quantity::Current), 0.09, epsilon = 1e-12);
    }
}
