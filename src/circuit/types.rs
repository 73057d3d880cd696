//! Core types for circuit representation.

use std::fmt;

/// A unique identifier for a terminal node in the circuit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "N{}", self.0)
    }
}

/// A unique identifier for a component in the circuit.
///
/// Ids are indices into the owning [`CircuitGraph`](super::CircuitGraph) and
/// stay stable for the lifetime of the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(pub usize);

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{}", self.0)
    }
}

/// Identifier of a wire, i.e. an equivalence class of electrically identical nodes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WireId(pub usize);

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "W{}", self.0)
    }
}

/// One of the two terminals of a component.
///
/// For the source, `Start` is the positive terminal and `End` the negative one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Terminal {
    Start,
    End,
}

impl Terminal {
    /// The terminal on the other side of the component.
    pub fn opposite(self) -> Self {
        match self {
            Terminal::Start => Terminal::End,
            Terminal::End => Terminal::Start,
        }
    }
}

/// A terminal point owned by exactly one component.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    /// Owning component
    pub component: ComponentId,
    /// Which side of the owning component this node is
    pub terminal: Terminal,
    /// Wire this node belongs to, if any
    pub wire: Option<WireId>,
}

/// An equivalence class of nodes that are electrically the same point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Wire {
    pub id: WireId,
    /// Member nodes. Empty once the wire has been merged away or dissolved.
    pub nodes: Vec<NodeId>,
}

impl Wire {
    /// A retired wire no longer holds any node.
    pub fn is_retired(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_ids() {
        assert_eq!(NodeId(3).to_string(), "N3");
        assert_eq!(ComponentId(0).to_string(), "C0");
        assert_eq!(WireId(7).to_string(), "W7");
    }

    #[test]
    fn test_terminal_opposite() {
        assert_eq!(Terminal::Start.opposite(), Terminal::End);
        assert_eq!(Terminal::End.opposite(), Terminal::Start);
    }
}
