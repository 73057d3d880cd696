//! Loop-based DC solver.
//!
//! One tick runs a fixed pipeline over a snapshot of the circuit graph:
//!
//! ```text
//! extract ──> activate ──> tree ──> [reduction] ──> equations ──> pool ──> crosscheck ──> writer
//! ```
//!
//! - [`extract_paths`] enumerates every simple loop from the source back to itself
//! - [`activate_paths`] keeps the loops that conduct given switches and polarity
//! - [`build_tree`] folds the loops into a nested series/parallel [`Tree`]
//! - [`reduce`] solves fully resistive trees directly
//! - [`generate_equations`] emits Ohm's law, power law and Kirchhoff relations
//! - [`solve_pool`] iterates them to a fixed point, with series and loop voltage passes
//! - [`cross_validate`] re-checks the result
//! - [`write_back`] stores it in the graph's automatic slots
//!
//! Everything built during a tick is dropped at its end.

mod activate;
mod crosscheck;
mod diagnostics;
mod equations;
mod extract;
mod pool;
mod reduction;
mod simulator;
mod tree;
mod values;
mod writer;

pub use activate::{activate_paths, Activation};
pub use crosscheck::cross_validate;
pub use diagnostics::{Diagnostic, ValidationWarning};
pub use equations::{generate_equations, Equation, EquationKind, Relation};
pub use extract::{extract_paths, Path};
pub use pool::{solve_pool, PoolOutcome};
pub use reduction::reduce;
pub use simulator::{run_tick, Simulator, SimulatorConfig, TickReport};
pub use tree::{build_tree, ParallelGroup, SeriesGroup, Tree, TreeDisplay, TreeNode};
pub use values::{SolvedValues, Values};
pub use writer::write_back;

/// Maximum fixed-point passes per tick.
pub const MAX_ITERATIONS: usize = 100;

/// Cross-validation tolerance.
pub const TOLERANCE: f64 = 1e-3;
