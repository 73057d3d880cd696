//! # Kirchhoff Core
//!
//! A steady-state solver for interactively built, single-source DC circuits.
//!
//! This library provides:
//! - A netlist language for describing batteries, resistors, bulbs, switches and meters
//! - A circuit graph with union-merged wires that an editor can mutate between ticks
//! - A loop-based solver deriving every unknown voltage, current, resistance and
//!   power from whatever subset the user fixed
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`dsl`] - Parser for the netlist language
//! - [`circuit`] - Circuit graph representation and validation
//! - [`components`] - Component kinds and quantity slots
//! - [`solver`] - The per-tick pipeline (loops, tree, equations, fixed point)
//! - [`report`] - Text rendering of tick reports and diagnostics
//!
//! ## Usage
//!
//! ### Native CLI
//!
//! ```bash
//! kirchhoff divider.kh --ticks 1
//! ```
//!
//! ### Library
//!
//! ```
//! use kirchhoff_core::{circuit::CircuitGraph, components::Quantity, dsl, run_tick};
//!
//! let ast = dsl::parse("B1 top 0 9\nR1 top mid 100\nR2 mid 0 v=3").unwrap();
//! let mut graph = CircuitGraph::from_ast(ast).unwrap();
//! let report = run_tick(&mut graph);
//!
//! let r2 = graph.lookup("R2").unwrap();
//! assert!((report.get(r2, Quantity::Resistance).unwrap() - 50.0).abs() < 1e-9);
//! ```
//!
//! ### WASM
//!
//! ```javascript
//! import { WasmCircuitSim } from 'kirchhoff_core';
//!
//! const sim = new WasmCircuitSim(netlist);
//! sim.run_tick();
//! const amps = sim.quantity("R1", "current");
//! ```
//!
//! ## Solving Method
//!
//! Each tick is independent and caller-driven:
//!
//! 1. Enumerate every loop from the source's positive terminal back to its negative one
//! 2. Keep the loops that conduct (closed switches, directional parts facing the right way)
//! 3. Fold the loops into a nested series/parallel tree
//! 4. Iterate Ohm's law, the power law and Kirchhoff's laws to a fixed point
//! 5. Cross-check the result and write it into the automatic quantity slots

pub mod circuit;
pub mod components;
pub mod dsl;
pub mod error;
pub mod report;
pub mod solver;

// Re-export main types for convenience
pub use circuit::CircuitGraph;
pub use error::{KirchhoffError, Result};
pub use solver::{run_tick, Simulator, SimulatorConfig, TickReport};

// WASM bindings
#[cfg(feature = "wasm")]
mod wasm;

#[cfg(feature = "wasm")]
pub use wasm::WasmCircuitSim;
