//! Abstract Syntax Tree types for the netlist language.

use std::collections::HashMap;

use crate::components::{ComponentKind, Quantity};

/// Complete AST representation of a parsed netlist.
#[derive(Debug, Clone, Default)]
pub struct CircuitAst {
    /// All component instances, in source order
    pub components: Vec<ComponentDef>,
    /// Name of the battery selected with `.source`
    pub source: Option<String>,
    /// Wire-name pairs merged with `.join`
    pub joins: Vec<(String, String)>,
}

impl CircuitAst {
    /// Create a new empty circuit AST.
    pub fn new() -> Self {
        Self::default()
    }
}

/// A component definition from the netlist.
#[derive(Debug, Clone)]
pub struct ComponentDef {
    pub kind: ComponentKind,
    /// Unique component name
    pub name: String,
    /// Wire names for the start and end terminals
    pub nodes: Vec<String>,
    /// Bare value for the kind's primary quantity
    pub value: Option<f64>,
    /// `on`/`off` state (switches only)
    pub state: Option<bool>,
    /// Explicit quantity parameters (`v=3`, `i=auto`, ...)
    pub params: HashMap<Quantity, ParamValue>,
    /// Source line number for error reporting
    pub line: usize,
}

/// Right-hand side of a quantity parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamValue {
    /// A fixed, user-supplied value
    Fixed(f64),
    /// `auto`: let the solver derive it
    Automatic,
}
