//! Main simulator interface.

use std::collections::BTreeMap;

use crate::circuit::{CircuitGraph, ComponentId};
use crate::components::{Quantity, VariableRef};

use super::{
    activate_paths, build_tree, cross_validate, extract_paths, generate_equations, reduce, solve_pool,
    write_back, Diagnostic, SolvedValues, ValidationWarning, Values, MAX_ITERATIONS, TOLERANCE,
};

/// Configuration for the simulator.
#[derive(Debug, Clone)]
pub struct SimulatorConfig {
    /// Maximum fixed-point passes over the equation pool.
    pub max_iterations: usize,
    /// Cross-validation tolerance.
    pub tolerance: f64,
    /// Solve fully resistive trees by series/parallel reduction before the pool.
    pub tree_reduction: bool,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_iterations: MAX_ITERATIONS,
            tolerance: TOLERANCE,
            tree_reduction: true,
        }
    }
}

impl SimulatorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum number of fixed-point passes.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the cross-validation tolerance.
    ///
    /// A stored value further than this from the value recomputed by Ohm's
    /// law or the power law produces a [`ValidationWarning`].
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Enable or disable the reduction pass.
    ///
    /// With it disabled, a plain series chain of known resistors has no
    /// equation with two known inputs and stays unsolved.
    pub fn with_tree_reduction(mut self, enabled: bool) -> Self {
        self.tree_reduction = enabled;
        self
    }
}

/// Outcome of one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    /// Values of every reachable component; the source voltage carries its sign
    pub solved: BTreeMap<ComponentId, SolvedValues>,
    /// Reachable variables nothing could derive
    pub undefined: Vec<VariableRef>,
    /// Cross-validation mismatches
    pub warnings: Vec<ValidationWarning>,
    /// Everything else worth telling the caller
    pub diagnostics: Vec<Diagnostic>,
    /// The source voltage is negative
    pub polarity_reversed: bool,
    /// Number of conducting loops
    pub active_paths: usize,
    /// Fixed-point passes used
    pub iterations: usize,
}

impl TickReport {
    /// Solved value of one quantity.
    pub fn get(&self, id: ComponentId, quantity: Quantity) -> Option<f64> {
        self.solved.get(&id)?.get(quantity)
    }

    /// Whether a topology error aborted the tick.
    pub fn aborted(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_topology_error)
            || self
                .diagnostics
                .iter()
                .any(|d| matches!(d, Diagnostic::NoConductingPath { .. }))
    }
}

/// The circuit solver.
///
/// Holds configuration only: every tick rebuilds loops, tree and equations
/// from the graph it is handed and keeps nothing afterwards.
#[derive(Debug, Clone, Default)]
pub struct Simulator {
    config: SimulatorConfig,
}

impl Simulator {
    /// Create a new simulator with default configuration.
    pub fn new() -> Self {
        Self::with_config(SimulatorConfig::default())
    }

    /// Create a new simulator with custom configuration.
    pub fn with_config(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Run one full tick: enumerate loops, select the conducting ones, build
    /// the tree, solve, cross-check and write back.
    ///
    /// Topology problems yield a report with diagnostics and leave the graph
    /// untouched. Otherwise only automatic slots of reachable components are
    /// written.
    pub fn run_tick(&self, graph: &mut CircuitGraph) -> TickReport {
        let _span = tracing::info_span!("tick", components = graph.components.len()).entered();
        let mut report = TickReport::default();

        let Some(source) = graph.find_source() else {
            tracing::warn!("no source battery");
            report.diagnostics.push(Diagnostic::NoSource);
            return report;
        };

        let paths = match extract_paths(graph, source) {
            Ok(paths) => paths,
            Err(diagnostic) => {
                tracing::warn!(?diagnostic, "source wiring error");
                report.diagnostics.push(diagnostic);
                return report;
            }
        };

        let activation = activate_paths(graph, source, paths);
        report.polarity_reversed = activation.polarity_reversed;
        report.active_paths = activation.active_paths.len();
        if activation.active_paths.is_empty() {
            tracing::info!("no conducting path");
            report.diagnostics.push(Diagnostic::NoConductingPath { source });
            return report;
        }

        let tree = build_tree(&activation.active_paths);
        tracing::debug!(tree = %tree.display(graph), "built tree");

        let mut values = Values::extract(graph, source, &tree.flatten());
        if self.config.tree_reduction && reduce(&mut values, &tree) {
            tracing::debug!("seeded values by tree reduction");
        }

        let equations = generate_equations(&values, &tree);
        let outcome = solve_pool(
            &mut values,
            &equations,
            &tree,
            &activation.active_paths,
            self.config.max_iterations,
        );
        report.iterations = outcome.iterations;
        if !outcome.converged {
            report.diagnostics.push(Diagnostic::IterationLimit {
                iterations: outcome.iterations,
            });
        }

        report.undefined = values.undefined();
        report
            .diagnostics
            .extend(report.undefined.iter().copied().map(Diagnostic::Undefined));
        report.warnings = cross_validate(&values, self.config.tolerance);

        write_back(graph, &values, activation.polarity_reversed);
        report.solved = values.solved(activation.polarity_reversed).into_iter().collect();

        tracing::info!(
            solved = report.solved.len(),
            undefined = report.undefined.len(),
            warnings = report.warnings.len(),
            iterations = report.iterations,
            "tick complete"
        );
        report
    }
}

/// Run one tick with the default configuration.
pub fn run_tick(graph: &mut CircuitGraph) -> TickReport {
    Simulator::new().run_tick(graph)
}
