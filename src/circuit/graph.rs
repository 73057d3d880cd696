//! Circuit graph structure.

use std::collections::HashMap;

use super::types::{ComponentId, Node, NodeId, Terminal, Wire, WireId};
use crate::components::{Component, ComponentKind, Quantity, Slot};
use crate::dsl::CircuitAst;
use crate::error::{KirchhoffError, Result};

/// Components, their terminal nodes and the wires joining them.
///
/// Nodes are created with their component and never removed. Wires are
/// union-merged on [`connect`](Self::connect); a merged or dissolved wire is
/// retired (left empty) so that [`WireId`]s stay valid indices.
#[derive(Debug, Clone, Default)]
pub struct CircuitGraph {
    /// All components, indexed by [`ComponentId`]
    pub components: Vec<Component>,

    /// All terminal nodes, indexed by [`NodeId`]
    pub nodes: Vec<Node>,

    /// All wires ever created, indexed by [`WireId`]
    pub wires: Vec<Wire>,

    /// Lookup from component name to id
    names: HashMap<String, ComponentId>,
}

impl CircuitGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a parsed netlist.
    ///
    /// Terminals sharing a wire name end up on one wire; a wire name used by a
    /// single terminal leaves that terminal unwired. The source is the battery
    /// named by `.source`, or the first battery otherwise.
    pub fn from_ast(ast: CircuitAst) -> Result<Self> {
        let mut graph = Self::new();

        // Wire name -> terminals, in order of first appearance
        let mut wire_index: HashMap<String, usize> = HashMap::new();
        let mut wire_terminals: Vec<Vec<NodeId>> = Vec::new();

        for def in &ast.components {
            if def.nodes.len() != 2 {
                return Err(KirchhoffError::invalid_component(
                    &def.name,
                    def.line,
                    format!("expected 2 nodes, got {}", def.nodes.len()),
                ));
            }
            if graph.names.contains_key(&def.name) {
                return Err(KirchhoffError::DuplicateComponent {
                    name: def.name.clone(),
                });
            }

            let id = ComponentId(graph.components.len());
            let (start, end) = graph.push_nodes(id);
            let component = Component::from_def(id, def, start, end)?;
            graph.names.insert(component.name.clone(), id);
            graph.components.push(component);

            for (wire_name, node) in def.nodes.iter().zip([start, end]) {
                let idx = *wire_index.entry(wire_name.clone()).or_insert_with(|| {
                    wire_terminals.push(Vec::new());
                    wire_terminals.len() - 1
                });
                wire_terminals[idx].push(node);
            }
        }

        for terminals in &wire_terminals {
            if let Some((&first, rest)) = terminals.split_first() {
                for &node in rest {
                    graph.connect(first, node);
                }
            }
        }

        for (a, b) in &ast.joins {
            let first_of = |name: &str| {
                wire_index
                    .get(name)
                    .and_then(|&idx| wire_terminals[idx].first().copied())
                    .ok_or_else(|| KirchhoffError::topology(format!("unknown wire '{}' in .join", name)))
            };
            let (a, b) = (first_of(a)?, first_of(b)?);
            graph.connect(a, b);
        }

        let source = match &ast.source {
            Some(name) => Some(graph.lookup(name)?),
            None => graph
                .components
                .iter()
                .find(|c| c.kind == ComponentKind::Battery)
                .map(|c| c.id),
        };
        if let Some(source) = source {
            graph.set_source(source)?;
        }

        Ok(graph)
    }

    fn push_nodes(&mut self, component: ComponentId) -> (NodeId, NodeId) {
        let start = NodeId(self.nodes.len());
        let end = NodeId(self.nodes.len() + 1);
        for (id, terminal) in [(start, Terminal::Start), (end, Terminal::End)] {
            self.nodes.push(Node {
                id,
                component,
                terminal,
                wire: None,
            });
        }
        (start, end)
    }

    /// Add an unwired component with default quantity slots.
    pub fn add_component(&mut self, name: impl Into<String>, kind: ComponentKind) -> Result<ComponentId> {
        let name = name.into();
        if self.names.contains_key(&name) {
            return Err(KirchhoffError::DuplicateComponent { name });
        }

        let id = ComponentId(self.components.len());
        let (start, end) = self.push_nodes(id);
        self.names.insert(name.clone(), id);
        self.components.push(Component::new(id, name, kind, start, end));
        Ok(id)
    }

    /// Make `id` the circuit's sole source.
    pub fn set_source(&mut self, id: ComponentId) -> Result<()> {
        let component = self.component(id);
        if component.kind != ComponentKind::Battery {
            return Err(KirchhoffError::topology(format!(
                "source '{}' is a {}, not a battery",
                component.name, component.kind
            )));
        }
        for component in &mut self.components {
            component.is_source = component.id == id;
        }
        Ok(())
    }

    /// Put two nodes on the same wire, merging their wires if both are wired.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> WireId {
        match (self.wire_of(a), self.wire_of(b)) {
            (Some(wa), Some(wb)) => self.join_wires(wa, wb),
            (Some(w), None) => {
                self.attach(b, w);
                w
            }
            (None, Some(w)) => {
                self.attach(a, w);
                w
            }
            (None, None) => {
                let w = WireId(self.wires.len());
                self.wires.push(Wire { id: w, nodes: Vec::new() });
                self.attach(a, w);
                if b != a {
                    self.attach(b, w);
                }
                w
            }
        }
    }

    /// Merge wire `b` into wire `a`. Returns the surviving wire.
    pub fn join_wires(&mut self, a: WireId, b: WireId) -> WireId {
        if a == b {
            return a;
        }
        let moved = std::mem::take(&mut self.wires[b.0].nodes);
        for node in moved {
            self.attach(node, a);
        }
        a
    }

    fn attach(&mut self, node: NodeId, wire: WireId) {
        self.nodes[node.0].wire = Some(wire);
        self.wires[wire.0].nodes.push(node);
    }

    /// Detach a node from its wire. A wire left with fewer than two nodes is dissolved.
    pub fn disconnect(&mut self, node: NodeId) {
        let Some(wire) = self.nodes[node.0].wire.take() else {
            return;
        };
        let members = &mut self.wires[wire.0].nodes;
        members.retain(|&n| n != node);
        if members.len() < 2 {
            for orphan in std::mem::take(members) {
                self.nodes[orphan.0].wire = None;
            }
        }
    }

    /// Open or close a switch.
    pub fn set_switch(&mut self, id: ComponentId, on: bool) -> Result<()> {
        let component = self.component_mut(id);
        if component.kind != ComponentKind::Switch {
            return Err(KirchhoffError::topology(format!(
                "'{}' is a {}, not a switch",
                component.name, component.kind
            )));
        }
        component.is_on = on;
        Ok(())
    }

    /// Replace one quantity slot of a component.
    pub fn set_slot(&mut self, id: ComponentId, quantity: Quantity, slot: Slot) {
        *self.component_mut(id).quantities.slot_mut(quantity) = slot;
    }

    /// The battery flagged as the circuit's source, if any.
    pub fn find_source(&self) -> Option<ComponentId> {
        self.components
            .iter()
            .find(|c| c.is_source && c.kind == ComponentKind::Battery)
            .map(|c| c.id)
    }

    /// All components with a terminal on `node`'s wire, except `excluding`.
    ///
    /// Each component appears once, in wire order. An unwired node has no
    /// neighbours.
    pub fn adjacent_components(&self, node: NodeId, excluding: Option<ComponentId>) -> Vec<ComponentId> {
        let Some(wire) = self.wire_of(node) else {
            return Vec::new();
        };

        let mut adjacent = Vec::new();
        for member in &self.wires[wire.0].nodes {
            let owner = self.nodes[member.0].component;
            if Some(owner) != excluding && !adjacent.contains(&owner) {
                adjacent.push(owner);
            }
        }
        adjacent
    }

    /// Known (non-automatic) value of a component quantity.
    pub fn get(&self, id: ComponentId, quantity: Quantity) -> Option<f64> {
        self.component(id).get(quantity)
    }

    /// Get a component by id.
    pub fn component(&self, id: ComponentId) -> &Component {
        &self.components[id.0]
    }

    /// Get a component by id mutably.
    pub fn component_mut(&mut self, id: ComponentId) -> &mut Component {
        &mut self.components[id.0]
    }

    /// Find a component id by name.
    pub fn component_by_name(&self, name: &str) -> Option<ComponentId> {
        self.names.get(name).copied()
    }

    /// Find a component id by name, failing if it does not exist.
    pub fn lookup(&self, name: &str) -> Result<ComponentId> {
        self.component_by_name(name)
            .ok_or_else(|| KirchhoffError::ComponentNotFound { name: name.to_string() })
    }

    /// Get a node by id.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// Wire a node sits on.
    pub fn wire_of(&self, node: NodeId) -> Option<WireId> {
        self.nodes[node.0].wire
    }

    /// Wire on one terminal of a component.
    pub fn terminal_wire(&self, id: ComponentId, terminal: Terminal) -> Option<WireId> {
        self.wire_of(self.component(id).node(terminal))
    }

    /// Wires still holding nodes.
    pub fn live_wires(&self) -> impl Iterator<Item = &Wire> {
        self.wires.iter().filter(|w| !w.is_retired())
    }
}
