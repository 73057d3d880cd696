//! Circuit graph representation and validation.
//!
//! [`CircuitGraph`] holds every component, its two terminal nodes and the
//! wires that make terminals electrically identical. The solver only reads
//! wiring; it writes back nothing but quantity slots.

mod graph;
mod types;
mod validate;

pub use graph::CircuitGraph;
pub use types::*;
pub use validate::validate_circuit;
