//! Series/parallel tree built from the conducting loops.
//!
//! The tree's root is a series sequence. A [`TreeNode::Seq`] directly inside a
//! series sequence is a parallel group whose children are its branches; a
//! `Seq` directly inside a parallel group is a series branch. Connection type
//! therefore alternates with nesting depth.

use std::fmt;

use crate::circuit::{CircuitGraph, ComponentId};

use super::Path;

/// One element of the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeNode {
    Leaf(ComponentId),
    Seq(Vec<TreeNode>),
}

/// The root series sequence. Empty when nothing conducts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tree(pub Vec<TreeNode>);

/// A series run: members share one current.
#[derive(Debug, Clone)]
pub struct SeriesGroup<'a> {
    pub members: &'a [TreeNode],
    /// Other branches of the enclosing parallel group; empty for the root
    pub siblings: Vec<&'a TreeNode>,
    pub is_root: bool,
}

/// A parallel group: branches share one voltage and their currents add up.
#[derive(Debug, Clone)]
pub struct ParallelGroup<'a> {
    pub branches: &'a [TreeNode],
    /// Leaf right before the group in the enclosing series run
    pub before: Option<ComponentId>,
    /// Leaf right after the group in the enclosing series run
    pub after: Option<ComponentId>,
}

/// Collapse conducting loops into one tree.
///
/// A single loop becomes a flat series run. Several loops are split into their
/// common prefix, a parallel section and their common suffix, recursing into
/// the section. Prefix and suffix are taken greedily and never backtracked.
pub fn build_tree(paths: &[Path]) -> Tree {
    match paths {
        [] => Tree::default(),
        [path] => Tree(path.iter().copied().map(TreeNode::Leaf).collect()),
        _ => {
            let slices: Vec<&[ComponentId]> = paths.iter().map(Vec::as_slice).collect();
            Tree(build_series(&slices))
        }
    }
}

/// Length of the common prefix and of the non-overlapping common suffix.
fn common_ends(paths: &[&[ComponentId]]) -> (usize, usize) {
    let min_len = paths.iter().map(|p| p.len()).min().unwrap_or(0);
    let first = paths[0];

    let mut prefix = 0;
    while prefix < min_len && paths.iter().all(|p| p[prefix] == first[prefix]) {
        prefix += 1;
    }

    let mut suffix = 0;
    while suffix < min_len - prefix
        && paths
            .iter()
            .all(|p| p[p.len() - 1 - suffix] == first[first.len() - 1 - suffix])
    {
        suffix += 1;
    }

    (prefix, suffix)
}

fn build_series(paths: &[&[ComponentId]]) -> Vec<TreeNode> {
    let (prefix, suffix) = common_ends(paths);
    let first = paths[0];

    let mut series: Vec<TreeNode> = first[..prefix].iter().copied().map(TreeNode::Leaf).collect();

    let middles: Vec<&[ComponentId]> = paths.iter().map(|p| &p[prefix..p.len() - suffix]).collect();
    let mut branches = build_parallel(&middles);
    match branches.len() {
        0 => {}
        1 => match branches.remove(0) {
            TreeNode::Seq(members) => series.extend(members),
            leaf => series.push(leaf),
        },
        _ => series.push(TreeNode::Seq(branches)),
    }

    series.extend(first[first.len() - suffix..].iter().copied().map(TreeNode::Leaf));
    series
}

fn build_parallel(middles: &[&[ComponentId]]) -> Vec<TreeNode> {
    // Group slices that start or end on the same component; each group is one branch.
    let mut groups: Vec<Vec<&[ComponentId]>> = Vec::new();
    for &middle in middles.iter().filter(|m| !m.is_empty()) {
        let linked = |group: &Vec<&[ComponentId]>| {
            group
                .iter()
                .any(|other| other.first() == middle.first() || other.last() == middle.last())
        };

        // Merge every linked group into the first one, keeping path order.
        let mut target: Option<usize> = None;
        let mut i = 0;
        while i < groups.len() {
            if !linked(&groups[i]) {
                i += 1;
                continue;
            }
            match target {
                None => {
                    target = Some(i);
                    i += 1;
                }
                Some(t) => {
                    let group = groups.remove(i);
                    groups[t].extend(group);
                }
            }
        }
        match target {
            Some(t) => groups[t].push(middle),
            None => groups.push(vec![middle]),
        }
    }

    let mut branches = Vec::new();
    for group in groups {
        if group.len() == 1 {
            branches.push(series_branch(group[0]));
            continue;
        }

        let (prefix, suffix) = common_ends(&group);
        if prefix == 0 && suffix == 0 {
            branches.extend(group.into_iter().map(series_branch));
            continue;
        }

        let mut members = build_series(&group);
        if members.len() == 1 {
            match members.remove(0) {
                // A parallel group inside a parallel group is the same group.
                TreeNode::Seq(inner) => branches.extend(inner),
                leaf => branches.push(leaf),
            }
        } else {
            branches.push(TreeNode::Seq(members));
        }
    }
    branches
}

fn series_branch(slice: &[ComponentId]) -> TreeNode {
    match slice {
        [single] => TreeNode::Leaf(*single),
        _ => TreeNode::Seq(slice.iter().copied().map(TreeNode::Leaf).collect()),
    }
}

impl Tree {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Every component in the tree once, in order of first appearance.
    pub fn flatten(&self) -> Vec<ComponentId> {
        fn visit(nodes: &[TreeNode], out: &mut Vec<ComponentId>) {
            for node in nodes {
                match node {
                    TreeNode::Leaf(id) => {
                        if !out.contains(id) {
                            out.push(*id);
                        }
                    }
                    TreeNode::Seq(children) => visit(children, out),
                }
            }
        }

        let mut out = Vec::new();
        visit(&self.0, &mut out);
        out
    }

    /// All series runs, root first.
    pub fn series_groups(&self) -> Vec<SeriesGroup<'_>> {
        let mut out = Vec::new();
        if !self.is_empty() {
            out.push(SeriesGroup {
                members: &self.0,
                siblings: Vec::new(),
                is_root: true,
            });
        }
        for parallel in self.parallel_groups() {
            for (i, branch) in parallel.branches.iter().enumerate() {
                if let TreeNode::Seq(members) = branch {
                    out.push(SeriesGroup {
                        members,
                        siblings: other_branches(parallel.branches, i),
                        is_root: false,
                    });
                }
            }
        }
        out
    }

    /// All parallel groups, outermost first.
    pub fn parallel_groups(&self) -> Vec<ParallelGroup<'_>> {
        fn visit_series<'a>(members: &'a [TreeNode], out: &mut Vec<ParallelGroup<'a>>) {
            for (i, member) in members.iter().enumerate() {
                let TreeNode::Seq(branches) = member else {
                    continue;
                };
                let leaf_at = |j: Option<usize>| match j.and_then(|j| members.get(j)) {
                    Some(TreeNode::Leaf(id)) => Some(*id),
                    _ => None,
                };
                out.push(ParallelGroup {
                    branches,
                    before: leaf_at(i.checked_sub(1)),
                    after: leaf_at(Some(i + 1)),
                });
                for branch in branches {
                    if let TreeNode::Seq(inner) = branch {
                        visit_series(inner, out);
                    }
                }
            }
        }

        let mut out = Vec::new();
        visit_series(&self.0, &mut out);
        out
    }

    /// Render the tree with component names, `[...]` marking nesting.
    pub fn display<'a>(&'a self, graph: &'a CircuitGraph) -> TreeDisplay<'a> {
        TreeDisplay {
            tree: self,
            graph: Some(graph),
        }
    }
}

fn other_branches(branches: &[TreeNode], skip: usize) -> Vec<&TreeNode> {
    branches
        .iter()
        .enumerate()
        .filter(|&(j, _)| j != skip)
        .map(|(_, b)| b)
        .collect()
}

/// Any leaf of a branch; every leaf of a series branch carries the branch current.
pub fn representative_leaf(branch: &TreeNode) -> Option<ComponentId> {
    match branch {
        TreeNode::Leaf(id) => Some(*id),
        TreeNode::Seq(members) => members.iter().find_map(|m| match m {
            TreeNode::Leaf(id) => Some(*id),
            TreeNode::Seq(_) => None,
        }),
    }
}

/// [`Tree`] formatter; see [`Tree::display`].
pub struct TreeDisplay<'a> {
    tree: &'a Tree,
    graph: Option<&'a CircuitGraph>,
}

impl TreeDisplay<'_> {
    fn write_nodes(&self, f: &mut fmt::Formatter<'_>, nodes: &[TreeNode]) -> fmt::Result {
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match node {
                TreeNode::Leaf(id) => match self.graph {
                    Some(graph) => f.write_str(&graph.component(*id).name)?,
                    None => write!(f, "{}", id)?,
                },
                TreeNode::Seq(children) => {
                    f.write_str("[")?;
                    self.write_nodes(f, children)?;
                    f.write_str("]")?;
                }
            }
        }
        Ok(())
    }
}

impl fmt::Display for TreeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_nodes(f, &self.tree.0)
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        TreeDisplay { tree: self, graph: None }.fmt(f)
    }
}
