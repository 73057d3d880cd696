//! Candidate relations over the tree and its components.
//!
//! Equations are generated in a fixed order and the solver applies them in
//! that same order every pass:
//!
//! 1. Per component, in tree order: Ohm's law (`V=IR`, `I=V/R`, `R=V/I`),
//!    the power law (`P=VI`, `I=P/V`, `V=P/I`), then the derived power forms
//!    (`P=I²R`, `P=V²/R`, `I=√(P/R)`, `V=√(PR)`, `R=P/I²`, `R=V²/P`). Batteries
//!    only get the power law. The source takes part with its voltage
//!    magnitude, so source power is never negative.
//! 2. Current law, series: every leaf of a series run copies any sibling's
//!    known current.
//! 3. Current law, parallel: the leaf after a group equals the sum of the
//!    branch currents, and each branch equals the total minus its siblings.
//! 4. Voltage law, parallel: a single-component branch copies any sibling
//!    branch's known voltage.
//!
//! The series voltage sum is not an equation; see the divider pass in
//! [`pool`](super::pool).

use std::fmt;

use crate::circuit::ComponentId;
use crate::components::{ComponentKind, Quantity, VariableRef};

use super::tree::{representative_leaf, Tree, TreeNode};
use super::Values;

/// Law an equation comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquationKind {
    OhmsLaw,
    PowerLaw,
    KclSeries,
    KclParallelSum,
    KclParallelBranch,
    KvlParallel,
}

impl fmt::Display for EquationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::OhmsLaw => "ohm",
            Self::PowerLaw => "power",
            Self::KclSeries => "kcl-series",
            Self::KclParallelSum => "kcl-sum",
            Self::KclParallelBranch => "kcl-branch",
            Self::KvlParallel => "kvl-parallel",
        };
        f.write_str(name)
    }
}

/// How the target is computed from other variables.
#[derive(Debug, Clone, PartialEq)]
pub enum Relation<'t> {
    /// `a · b`
    Product(VariableRef, VariableRef),
    /// `a / b`, refused when `b == 0`
    Quotient(VariableRef, VariableRef),
    /// `s² · f`
    ProductSquare { square: VariableRef, factor: VariableRef },
    /// `s² / d`, refused when `d == 0`
    SquareQuotient { square: VariableRef, divisor: VariableRef },
    /// `n / s²`, refused when `s == 0`
    QuotientSquare { numerator: VariableRef, square: VariableRef },
    /// `√(a / b)`, refused when `b == 0` or the ratio is negative
    SqrtQuotient(VariableRef, VariableRef),
    /// `√(a · b)`, refused when the product is negative
    SqrtProduct(VariableRef, VariableRef),
    /// The first of these that is known
    CopyAny(Vec<VariableRef>),
    /// `total − Σ others`, all required
    Difference { total: VariableRef, others: Vec<VariableRef> },
    /// `Σ terms`, all required
    Sum(Vec<VariableRef>),
    /// The first sibling branch whose voltage is known
    CopyBranchVoltage(Vec<&'t TreeNode>),
}

/// One candidate relation solving for `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct Equation<'t> {
    pub kind: EquationKind,
    pub target: VariableRef,
    pub relation: Relation<'t>,
}

impl Equation<'_> {
    /// Compute the target, or `None` if inputs are missing or a guard refuses.
    pub fn evaluate(&self, values: &Values) -> Option<f64> {
        let get = |var: &VariableRef| values.get(*var);
        let result = match &self.relation {
            Relation::Product(a, b) => get(a)? * get(b)?,
            Relation::Quotient(a, b) => {
                let divisor = get(b)?;
                if divisor == 0.0 {
                    return None;
                }
                get(a)? / divisor
            }
            Relation::ProductSquare { square, factor } => get(square)?.powi(2) * get(factor)?,
            Relation::SquareQuotient { square, divisor } => {
                let divisor = get(divisor)?;
                if divisor == 0.0 {
                    return None;
                }
                get(square)?.powi(2) / divisor
            }
            Relation::QuotientSquare { numerator, square } => {
                let square = get(square)?;
                if square == 0.0 {
                    return None;
                }
                get(numerator)? / square.powi(2)
            }
            Relation::SqrtQuotient(a, b) => {
                let divisor = get(b)?;
                if divisor == 0.0 {
                    return None;
                }
                let ratio = get(a)? / divisor;
                if ratio < 0.0 {
                    return None;
                }
                ratio.sqrt()
            }
            Relation::SqrtProduct(a, b) => {
                let product = get(a)? * get(b)?;
                if product < 0.0 {
                    return None;
                }
                product.sqrt()
            }
            Relation::CopyAny(candidates) => candidates.iter().find_map(get)?,
            Relation::Difference { total, others } => {
                let mut rest = 0.0;
                for other in others {
                    rest += get(other)?;
                }
                get(total)? - rest
            }
            Relation::Sum(terms) => {
                let mut sum = 0.0;
                for term in terms {
                    sum += get(term)?;
                }
                sum
            }
            Relation::CopyBranchVoltage(siblings) => {
                siblings.iter().find_map(|b| branch_voltage(values, b))?
            }
        };
        result.is_finite().then_some(result)
    }

    /// Variables the relation reads.
    pub fn requires(&self) -> Vec<VariableRef> {
        match &self.relation {
            Relation::Product(a, b) | Relation::Quotient(a, b) => vec![*a, *b],
            Relation::SqrtQuotient(a, b) | Relation::SqrtProduct(a, b) => vec![*a, *b],
            Relation::ProductSquare { square, factor } => vec![*square, *factor],
            Relation::SquareQuotient { square, divisor } => vec![*square, *divisor],
            Relation::QuotientSquare { numerator, square } => vec![*numerator, *square],
            Relation::CopyAny(vars) | Relation::Sum(vars) => vars.clone(),
            Relation::Difference { total, others } => {
                std::iter::once(*total).chain(others.iter().copied()).collect()
            }
            Relation::CopyBranchVoltage(siblings) => {
                let mut leaves = Vec::new();
                for sibling in siblings {
                    collect_leaves(sibling, &mut leaves);
                }
                leaves
                    .into_iter()
                    .map(|id| VariableRef::new(id, Quantity::Voltage))
                    .collect()
            }
        }
    }
}

fn collect_leaves(node: &TreeNode, out: &mut Vec<ComponentId>) {
    match node {
        TreeNode::Leaf(id) => out.push(*id),
        TreeNode::Seq(children) => children.iter().for_each(|c| collect_leaves(c, out)),
    }
}

/// Voltage across a parallel branch: a leaf's voltage, or the sum along a
/// series branch. A nested parallel group counts with any known branch.
pub fn branch_voltage(values: &Values, branch: &TreeNode) -> Option<f64> {
    match branch {
        TreeNode::Leaf(id) => values.value(*id, Quantity::Voltage),
        TreeNode::Seq(members) => members
            .iter()
            .map(|m| member_voltage(values, m))
            .sum(),
    }
}

/// Voltage across one member of a series run.
pub fn member_voltage(values: &Values, member: &TreeNode) -> Option<f64> {
    match member {
        TreeNode::Leaf(id) => values.value(*id, Quantity::Voltage),
        TreeNode::Seq(branches) => branches.iter().find_map(|b| branch_voltage(values, b)),
    }
}

/// Build the equation pool for one tick.
pub fn generate_equations<'t>(values: &Values, tree: &'t Tree) -> Vec<Equation<'t>> {
    let mut equations = Vec::new();

    for &id in values.ids() {
        component_equations(values, id, &mut equations);
    }
    kcl_series(values, tree, &mut equations);
    kcl_parallel(values, tree, &mut equations);
    kvl_parallel(values, tree, &mut equations);

    tracing::debug!(count = equations.len(), "generated equation pool");
    equations
}

fn push_unknown<'t>(values: &Values, equations: &mut Vec<Equation<'t>>, equation: Equation<'t>) {
    if !values.is_defined(equation.target) {
        equations.push(equation);
    }
}

fn component_equations(values: &Values, id: ComponentId, equations: &mut Vec<Equation<'_>>) {
    let r = VariableRef::new(id, Quantity::Resistance);
    let v = VariableRef::new(id, Quantity::Voltage);
    let i = VariableRef::new(id, Quantity::Current);
    let p = VariableRef::new(id, Quantity::Power);
    let is_battery = values.kind(id) == Some(ComponentKind::Battery);

    let ohm = [
        (v, Relation::Product(i, r)),
        (i, Relation::Quotient(v, r)),
        (r, Relation::Quotient(v, i)),
    ];
    let power = [
        (p, Relation::Product(v, i)),
        (i, Relation::Quotient(p, v)),
        (v, Relation::Quotient(p, i)),
    ];
    let derived = [
        (p, Relation::ProductSquare { square: i, factor: r }),
        (p, Relation::SquareQuotient { square: v, divisor: r }),
        (i, Relation::SqrtQuotient(p, r)),
        (v, Relation::SqrtProduct(p, r)),
        (r, Relation::QuotientSquare { numerator: p, square: i }),
        (r, Relation::SquareQuotient { square: v, divisor: p }),
    ];

    let mut add = |kind, (target, relation)| {
        push_unknown(values, equations, Equation { kind, target, relation });
    };
    if !is_battery {
        ohm.into_iter().for_each(|e| add(EquationKind::OhmsLaw, e));
    }
    power.into_iter().for_each(|e| add(EquationKind::PowerLaw, e));
    if !is_battery {
        derived.into_iter().for_each(|e| add(EquationKind::PowerLaw, e));
    }
}

fn kcl_series<'t>(values: &Values, tree: &'t Tree, equations: &mut Vec<Equation<'t>>) {
    for group in tree.series_groups() {
        let mut leaves: Vec<ComponentId> = Vec::new();
        for member in group.members {
            if let TreeNode::Leaf(id) = member {
                if !leaves.contains(id) {
                    leaves.push(*id);
                }
            }
        }
        if leaves.len() < 2 {
            continue;
        }

        for &leaf in &leaves {
            let siblings = leaves
                .iter()
                .filter(|&&other| other != leaf)
                .map(|&other| VariableRef::new(other, Quantity::Current))
                .collect();
            push_unknown(
                values,
                equations,
                Equation {
                    kind: EquationKind::KclSeries,
                    target: VariableRef::new(leaf, Quantity::Current),
                    relation: Relation::CopyAny(siblings),
                },
            );
        }
    }
}

fn kcl_parallel<'t>(values: &Values, tree: &'t Tree, equations: &mut Vec<Equation<'t>>) {
    for group in tree.parallel_groups() {
        let Some(reps) = group
            .branches
            .iter()
            .map(representative_leaf)
            .collect::<Option<Vec<_>>>()
        else {
            continue;
        };
        let currents: Vec<VariableRef> = reps
            .iter()
            .map(|&id| VariableRef::new(id, Quantity::Current))
            .collect();

        if let Some(total) = group.after.or(group.before) {
            push_unknown(
                values,
                equations,
                Equation {
                    kind: EquationKind::KclParallelSum,
                    target: VariableRef::new(total, Quantity::Current),
                    relation: Relation::Sum(currents.clone()),
                },
            );
        }

        let Some(total) = group.before.or(group.after) else {
            continue;
        };
        let total = VariableRef::new(total, Quantity::Current);
        for (k, &target) in currents.iter().enumerate() {
            let others = currents
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != k)
                .map(|(_, &c)| c)
                .collect();
            push_unknown(
                values,
                equations,
                Equation {
                    kind: EquationKind::KclParallelBranch,
                    target,
                    relation: Relation::Difference { total, others },
                },
            );
        }
    }
}

fn kvl_parallel<'t>(values: &Values, tree: &'t Tree, equations: &mut Vec<Equation<'t>>) {
    for group in tree.parallel_groups() {
        for (k, branch) in group.branches.iter().enumerate() {
            let TreeNode::Leaf(id) = branch else {
                continue;
            };
            let siblings = group
                .branches
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != k)
                .map(|(_, b)| b)
                .collect();
            push_unknown(
                values,
                equations,
                Equation {
                    kind: EquationKind::KvlParallel,
                    target: VariableRef::new(*id, Quantity::Voltage),
                    relation: Relation::CopyBranchVoltage(siblings),
                },
            );
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

    fn setup(netlist: &str) -> (CircuitGraph, Tree, Values) {
        let graph = CircuitGraph::from_ast(dsl::parse(netlist).unwrap()).unwrap();
        let source = graph.find_source().unwrap();
        let paths = extract_paths(&graph, source).unwrap();
        let tree = build_tree(&activate_paths(&graph, source, paths).active_paths);
        let values = Values::extract(&graph, source, &tree.flatten());
        (graph, tree, values)
    }

    #[test]
    fn test_ohms_law_skips_batteries() {
        let (g, tree, values) = setup("B1 top 0 9\nR1 top 0 100");
        let b1 = g.lookup("B1").unwrap();
        let equations = generate_equations(&values, &tree);

        assert!(equations
            .iter()
            .filter(|e| e.target.component == b1)
            .all(|e| e.kind != EquationKind::OhmsLaw));
        assert!(equations
            .iter()
            .any(|e| e.target.component == b1 && e.kind == EquationKind::PowerLaw));
    }

    #[test]
    fn test_known_targets_get_no_equations() {
        let (g, tree, values) = setup("B1 top 0 9\nR1 top 0 100");
        let r1 = g.lookup("R1").unwrap();
        let equations = generate_equations(&values, &tree);
        assert!(!equations
            .iter()
            .any(|e| e.target == VariableRef::new(r1, Quantity::Resistance)));
    }

    #[test]
    fn test_ohm_insertion_order() {
        let (g, tree, values) = setup("B1 top 0 9\nR1 top 0 i=auto");
        let r1 = g.lookup("R1").unwrap();
        let first: Vec<_> = generate_equations(&values, &tree)
            .into_iter()
            .filter(|e| e.target.component == r1)
            .take(3)
            .map(|e| (e.kind, e.target.quantity))
            .collect();
        assert_eq!(
            first,
            vec![
                (EquationKind::OhmsLaw, Quantity::Voltage),
                (EquationKind::OhmsLaw, Quantity::Current),
                (EquationKind::OhmsLaw, Quantity::Resistance),
            ]
        );
    }

    #[test]
    fn test_division_guard() {
        let (g, tree, mut values) = setup("B1 top 0 9\nR1 top 0 r=0");
        let r1 = g.lookup("R1").unwrap();
        values.define(VariableRef::new(r1, Quantity::Voltage), 5.0);
        let equations = generate_equations(&values, &tree);

        let current = equations
            .iter()
            .find(|e| e.kind == EquationKind::OhmsLaw && e.target == VariableRef::new(r1, Quantity::Current))
            .unwrap();
        assert_eq!(current.evaluate(&values), None);
        assert_eq!(
            current.requires(),
            vec![
                VariableRef::new(r1, Quantity::Voltage),
                VariableRef::new(r1, Quantity::Resistance)
            ]
        );
    }

    #[test]
    fn test_parallel_current_equations() {
        let (g, tree, mut values) = setup("B1 top 0 9\nR1 top 0 100\nR2 top 0 300");
        let b1 = g.lookup("B1").unwrap();
        let r1 = g.lookup("R1").unwrap();
        let r2 = g.lookup("R2").unwrap();
        values.define(VariableRef::new(r1, Quantity::Current), 0.09);
        values.define(VariableRef::new(r2, Quantity::Current), 0.03);
        let equations = generate_equations(&values, &tree);

        let sum = equations
            .iter()
            .find(|e| e.kind == EquationKind::KclParallelSum)
            .unwrap();
        assert_eq!(sum.target, VariableRef::new(b1, Quantity::Current));
        assert_abs_diff_eq!(sum.evaluate(&values).unwrap(), 0.12, epsilon = 1e-12);
    }

    #[test]
    fn test_parallel_voltage_copy() {
        let (g, tree, mut values) = setup("B1 top 0 9\nR1 top 0 100\nR2 top 0 300");
        let r1 = g.lookup("R1").unwrap();
        let r2 = g.lookup("R2").unwrap();
        values.define(VariableRef::new(r1, Quantity::Voltage), 9.0);
        let equations = generate_equations(&values, &tree);

        let copy = equations
            .iter()
            .find(|e| e.kind == EquationKind::KvlParallel && e.target.component == r2)
            .unwrap();
        assert_eq!(copy.evaluate(&values), Some(9.0));
    }

    #[test]
    fn test_sqrt_guard() {
        let (g, tree, mut values) = setup("B1 top 0 9\nR1 top 0 100");
        let r1 = g.lookup("R1").unwrap();
        values.define(VariableRef::new(r1, Quantity::Power), -1.0);
        let equations = generate_equations(&values, &tree);

        let sqrt = equations
            .iter()
            .find(|e| matches!(e.relation, Relation::SqrtQuotient(..)))
            .unwrap();
        assert_eq!(sqrt.evaluate(&values), None);
    }
}
