//! WASM bindings for Kirchhoff Core.
//!
//! This module provides JavaScript-friendly bindings for a browser circuit
//! editor. The editor owns the timer: it calls `run_tick` whenever it wants
//! fresh values.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { WasmCircuitSim } from 'kirchhoff_core';
//!
//! await init();
//!
//! const netlist = `
//!   B1   top  0    9
//!   R1   top  mid  100
//!   SW1  mid  x    on
//!   L1   x    0    r=50
//! `;
//!
//! const sim = new WasmCircuitSim(netlist);
//! sim.run_tick();
//! console.log(sim.quantity("L1", "current"));
//!
//! sim.set_switch("SW1", false);
//! sim.run_tick();
//! console.log(sim.diagnostics());
//! ```

use wasm_bindgen::prelude::*;

use crate::circuit::{validate_circuit, CircuitGraph, ComponentId};
use crate::components::{Quantity, Slot};
use crate::dsl;
use crate::error::KirchhoffError;
use crate::report::{describe_diagnostic, describe_warning};
use crate::solver::{Simulator, SimulatorConfig, TickReport};

/// Initialize panic hook for better error messages in browser console.
#[wasm_bindgen(start)]
pub fn init_panic_hook() {
    console_error_panic_hook::set_once();
}

fn js_error(e: KirchhoffError) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// WASM-compatible circuit solver.
///
/// Wraps a [`CircuitGraph`] and a [`Simulator`]; components are addressed by
/// their netlist names.
#[wasm_bindgen]
pub struct WasmCircuitSim {
    graph: CircuitGraph,
    simulator: Simulator,
    last_report: TickReport,
}

#[wasm_bindgen]
impl WasmCircuitSim {
    /// Create a new solver from a netlist string.
    ///
    /// # Returns
    /// A new `WasmCircuitSim` instance or an error if the netlist is invalid.
    #[wasm_bindgen(constructor)]
    pub fn new(netlist: &str) -> Result<WasmCircuitSim, JsValue> {
        Self::with_config(netlist, crate::solver::MAX_ITERATIONS, crate::solver::TOLERANCE)
    }

    /// Create a new solver with a custom iteration cap and validation tolerance.
    #[wasm_bindgen]
    pub fn with_config(netlist: &str, max_iterations: usize, tolerance: f64) -> Result<WasmCircuitSim, JsValue> {
        let ast = dsl::parse(netlist).map_err(js_error)?;
        let graph = CircuitGraph::from_ast(ast).map_err(js_error)?;
        validate_circuit(&graph).map_err(js_error)?;

        let config = SimulatorConfig::new()
            .with_max_iterations(max_iterations)
            .with_tolerance(tolerance);

        Ok(WasmCircuitSim {
            graph,
            simulator: Simulator::with_config(config),
            last_report: TickReport::default(),
        })
    }

    /// Run one tick. Returns the number of components with solved values.
    #[wasm_bindgen]
    pub fn run_tick(&mut self) -> usize {
        self.last_report = self.simulator.run_tick(&mut self.graph);
        self.last_report.solved.len()
    }

    /// Current value of a quantity (`resistance`, `voltage`, `current`,
    /// `power` or `r`/`v`/`i`/`p`), or `undefined` if unknown.
    #[wasm_bindgen]
    pub fn quantity(&self, name: &str, quantity: &str) -> Option<f64> {
        let id = self.graph.component_by_name(name)?;
        let quantity = Quantity::from_key(quantity)?;
        self.graph.component(id).quantities.slot(quantity).value
    }

    /// Open or close a switch.
    #[wasm_bindgen]
    pub fn set_switch(&mut self, name: &str, on: bool) -> Result<(), JsValue> {
        let id = self.lookup(name)?;
        self.graph.set_switch(id, on).map_err(js_error)
    }

    /// Fix a quantity to a user-supplied value.
    #[wasm_bindgen]
    pub fn set_quantity(&mut self, name: &str, quantity: &str, value: f64) -> Result<(), JsValue> {
        let id = self.lookup(name)?;
        let quantity = parse_quantity(quantity)?;
        self.graph.set_slot(id, quantity, Slot::fixed(value));
        Ok(())
    }

    /// Hand a quantity back to the solver.
    #[wasm_bindgen]
    pub fn set_automatic(&mut self, name: &str, quantity: &str) -> Result<(), JsValue> {
        let id = self.lookup(name)?;
        let quantity = parse_quantity(quantity)?;
        self.graph.set_slot(id, quantity, Slot::automatic());
        Ok(())
    }

    /// Diagnostics and warnings from the last tick, one per line.
    #[wasm_bindgen]
    pub fn diagnostics(&self) -> String {
        let warnings = self
            .last_report
            .warnings
            .iter()
            .map(|w| describe_warning(&self.graph, w));
        let diagnostics = self
            .last_report
            .diagnostics
            .iter()
            .map(|d| describe_diagnostic(&self.graph, d));
        warnings.chain(diagnostics).collect::<Vec<_>>().join("\n")
    }

    /// Whether the source voltage was negative on the last tick.
    #[wasm_bindgen(getter)]
    pub fn polarity_reversed(&self) -> bool {
        self.last_report.polarity_reversed
    }
}

impl WasmCircuitSim {
    fn lookup(&self, name: &str) -> Result<ComponentId, JsValue> {
        self.graph.lookup(name).map_err(js_error)
    }
}

fn parse_quantity(key: &str) -> Result<Quantity, JsValue> {
    Quantity::from_key(key).ok_or_else(|| JsValue::from_str(&format!("unknown quantity '{}'", key)))
}

/// Get the library version.
#[wasm_bindgen]
pub fn version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}
