//! Kirchhoff - DC Teaching Circuit Solver
//!
//! Solves a netlist and prints every component's resistance, voltage,
//! current and power.
//!
//! # Usage
//!
//! ```bash
//! RUST_LOG=kirchhoff_core=debug kirchhoff divider.kh --ticks 2
//! ```

use std::path::PathBuf;

use clap::Parser;
use kirchhoff_core::{
    circuit::{validate_circuit, CircuitGraph},
    dsl,
    error::Result,
    report::render_report,
    solver::{MAX_ITERATIONS, TOLERANCE},
    Simulator, SimulatorConfig, TickReport,
};
use tracing_subscriber::EnvFilter;

/// DC teaching circuit solver
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the circuit description file (.kh)
    #[arg(value_name = "CIRCUIT_FILE")]
    circuit_file: PathBuf,

    /// Number of ticks to run before printing
    #[arg(short, long, default_value_t = 1)]
    ticks: usize,

    /// Fixed-point pass cap per tick
    #[arg(long, default_value_t = MAX_ITERATIONS)]
    max_iterations: usize,

    /// Relative tolerance for the final cross-check
    #[arg(long, default_value_t = TOLERANCE)]
    tolerance: f64,

    /// Skip the direct series/parallel reduction
    #[arg(long)]
    no_reduction: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let ast = dsl::parse_file(&args.circuit_file)?;
    let mut graph = CircuitGraph::from_ast(ast)?;
    validate_circuit(&graph)?;

    let config = SimulatorConfig::new()
        .with_max_iterations(args.max_iterations)
        .with_tolerance(args.tolerance)
        .with_tree_reduction(!args.no_reduction);
    let simulator = Simulator::with_config(config);

    let mut report = TickReport::default();
    for tick in 0..args.ticks.max(1) {
        tracing::debug!(tick, "running tick");
        report = simulator.run_tick(&mut graph);
    }

    print!("{}", render_report(&graph, &report));

    Ok(())
}
