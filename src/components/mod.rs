//! Component models for the circuit solver.
//!
//! Every component is a two-terminal element carrying four quantity slots
//! (resistance, voltage, current, power). The kinds differ only in how the
//! solver treats them:
//! - Battery: the source (or an interior, directional cell)
//! - Resistor: plain Ohm's-law element
//! - Bulb: resistive and directional (conducts from start to end only)
//! - Switch: conducts when closed, breaks the path when open
//! - Ammeter / Voltmeter: directional meters

mod quantities;

pub use quantities::{Quantity, QuantityMap, Slot, VariableRef};

use std::fmt;

use crate::circuit::{ComponentId, NodeId, Terminal};
use crate::dsl::{ComponentDef, ParamValue};
use crate::error::{KirchhoffError, Result};

/// Default internal resistance of a voltmeter, in ohms.
pub const VOLTMETER_RESISTANCE: f64 = 1e9;

/// Kinds of circuit elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Battery,
    Resistor,
    Bulb,
    Switch,
    Ammeter,
    Voltmeter,
}

impl ComponentKind {
    /// Parse a kind from the first character of a component name.
    pub fn from_prefix(prefix: char) -> Option<Self> {
        match prefix.to_ascii_uppercase() {
            'B' | 'V' => Some(Self::Battery),
            'R' => Some(Self::Resistor),
            'L' => Some(Self::Bulb),
            'S' => Some(Self::Switch),
            'A' => Some(Self::Ammeter),
            'M' => Some(Self::Voltmeter),
            _ => None,
        }
    }

    /// Parse a kind from a multi-character name prefix (`BULB1`, `VM2`, ...).
    ///
    /// Checked before [`from_prefix`](Self::from_prefix) so that `BULB1` is not
    /// read as a battery and `VM1` not as a voltage source.
    pub fn from_name_prefix(name: &str) -> Option<Self> {
        let upper = name.to_ascii_uppercase();
        if upper.starts_with("BULB") || upper.starts_with("LAMP") {
            Some(Self::Bulb)
        } else if upper.starts_with("VM") {
            Some(Self::Voltmeter)
        } else if upper.starts_with("AM") {
            Some(Self::Ammeter)
        } else if upper.starts_with("SW") {
            Some(Self::Switch)
        } else {
            None
        }
    }

    /// Parse a kind from a full keyword; the following token is then the name.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_uppercase().as_str() {
            "BATTERY" => Some(Self::Battery),
            "RESISTOR" => Some(Self::Resistor),
            "BULB" | "LAMP" => Some(Self::Bulb),
            "SWITCH" => Some(Self::Switch),
            "AMMETER" => Some(Self::Ammeter),
            "VOLTMETER" => Some(Self::Voltmeter),
            _ => None,
        }
    }

    /// Directional components conduct only when entered through their start terminal.
    pub fn is_directional(&self) -> bool {
        matches!(
            self,
            Self::Battery | Self::Bulb | Self::Ammeter | Self::Voltmeter
        )
    }

    /// The quantity a bare value in the netlist sets.
    pub fn primary_quantity(&self) -> Option<Quantity> {
        match self {
            Self::Battery => Some(Quantity::Voltage),
            Self::Resistor | Self::Bulb | Self::Ammeter | Self::Voltmeter => {
                Some(Quantity::Resistance)
            }
            Self::Switch => None,
        }
    }

    /// Initial slots for a freshly created component.
    ///
    /// Everything is automatic except the resistance of meters and switches.
    /// Ammeters and switches are ideal conductors fixed at zero; a voltmeter is
    /// fixed at [`VOLTMETER_RESISTANCE`] so it barely loads what it measures.
    pub fn default_quantities(&self) -> QuantityMap {
        let mut quantities = QuantityMap::default();
        match self {
            Self::Ammeter | Self::Switch => quantities.resistance = Slot::fixed(0.0),
            Self::Voltmeter => quantities.resistance = Slot::fixed(VOLTMETER_RESISTANCE),
            _ => {}
        }
        quantities
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Battery => "battery",
            Self::Resistor => "resistor",
            Self::Bulb => "bulb",
            Self::Switch => "switch",
            Self::Ammeter => "ammeter",
            Self::Voltmeter => "voltmeter",
        };
        f.write_str(name)
    }
}

/// A circuit component.
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    pub id: ComponentId,
    /// Unique, user-facing name
    pub name: String,
    pub kind: ComponentKind,
    /// Start terminal (positive on the source)
    pub start: NodeId,
    /// End terminal (negative on the source)
    pub end: NodeId,
    pub quantities: QuantityMap,
    /// Closed state, meaningful for switches only
    pub is_on: bool,
    /// Whether this battery drives the circuit
    pub is_source: bool,
}

impl Component {
    /// Create a component with default slots.
    pub fn new(id: ComponentId, name: String, kind: ComponentKind, start: NodeId, end: NodeId) -> Self {
        Self {
            id,
            name,
            kind,
            start,
            end,
            quantities: kind.default_quantities(),
            is_on: false,
            is_source: false,
        }
    }

    /// Create a component from a netlist definition.
    pub fn from_def(id: ComponentId, def: &ComponentDef, start: NodeId, end: NodeId) -> Result<Self> {
        let mut component = Self::new(id, def.name.clone(), def.kind, start, end);

        if let Some(value) = def.value {
            let quantity = def.kind.primary_quantity().ok_or_else(|| {
                KirchhoffError::invalid_component(
                    &def.name,
                    def.line,
                    format!("a {} takes no bare value", def.kind),
                )
            })?;
            *component.quantities.slot_mut(quantity) = Slot::fixed(value);
        }

        for (&quantity, param) in &def.params {
            let slot = match param {
                ParamValue::Fixed(value) => Slot::fixed(*value),
                ParamValue::Automatic => Slot::automatic(),
            };
            *component.quantities.slot_mut(quantity) = slot;
        }

        match (def.kind, def.state) {
            (ComponentKind::Switch, state) => component.is_on = state.unwrap_or(false),
            (_, Some(_)) => {
                return Err(KirchhoffError::invalid_component(
                    &def.name,
                    def.line,
                    "only switches take an on/off state",
                ));
            }
            (_, None) => {}
        }

        Ok(component)
    }

    /// Node at the given terminal.
    pub fn node(&self, terminal: Terminal) -> NodeId {
        match terminal {
            Terminal::Start => self.start,
            Terminal::End => self.end,
        }
    }

    /// Which terminal a node is, if it belongs to this component.
    pub fn terminal_of(&self, node: NodeId) -> Option<Terminal> {
        if node == self.start {
            Some(Terminal::Start)
        } else if node == self.end {
            Some(Terminal::End)
        } else {
            None
        }
    }

    /// An open switch blocks current; every other component lets it through.
    pub fn is_open_switch(&self) -> bool {
        self.kind == ComponentKind::Switch && !self.is_on
    }

    /// Known (non-automatic) value of a quantity.
    pub fn get(&self, quantity: Quantity) -> Option<f64> {
        self.quantities.known(quantity)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn def(name: &str, kind: ComponentKind) -> ComponentDef {
        ComponentDef {
            kind,
            name: name.to_string(),
            nodes: vec!["a".to_string(), "b".to_string()],
            value: None,
            state: None,
            params: HashMap::new(),
            line: 1,
        }
    }

    #[test]
    fn test_name_prefixes() {
        assert_eq!(ComponentKind::from_name_prefix("BULB1"), Some(ComponentKind::Bulb));
        assert_eq!(ComponentKind::from_name_prefix("vm2"), Some(ComponentKind::Voltmeter));
        assert_eq!(ComponentKind::from_name_prefix("B1"), None);
        assert_eq!(ComponentKind::from_prefix('b'), Some(ComponentKind::Battery));
        assert_eq!(ComponentKind::from_prefix('x'), None);
    }

    #[test]
    fn test_meter_and_switch_default_resistance() {
        let ammeter = ComponentKind::Ammeter.default_quantities();
        assert_eq!(ammeter.known(Quantity::Resistance), Some(0.0));
        let voltmeter = ComponentKind::Voltmeter.default_quantities();
        assert_eq!(voltmeter.known(Quantity::Resistance), Some(VOLTMETER_RESISTANCE));
        let resistor = ComponentKind::Resistor.default_quantities();
        assert_eq!(resistor.known(Quantity::Resistance), None);
        assert!(resistor.voltage.automatic);
    }

    #[test]
    fn test_from_def_applies_value_and_params() {
        let mut d = def("R1", ComponentKind::Resistor);
        d.value = Some(100.0);
        d.params.insert(Quantity::Voltage, ParamValue::Fixed(3.0));
        d.params.insert(Quantity::Current, ParamValue::Automatic);

        let c = Component::from_def(ComponentId(0), &d, NodeId(0), NodeId(1)).unwrap();
        assert_eq!(c.get(Quantity::Resistance), Some(100.0));
        assert_eq!(c.get(Quantity::Voltage), Some(3.0));
        assert_eq!(c.get(Quantity::Current), None);
    }

    #[test]
    fn test_from_def_rejects_state_on_non_switch() {
        let mut d = def("R1", ComponentKind::Resistor);
        d.state = Some(true);
        assert!(Component::from_def(ComponentId(0), &d, NodeId(0), NodeId(1)).is_err());
    }

    #[test]
    fn test_switch_defaults_open() {
        let d = def("SW1", ComponentKind::Switch);
        let c = Component::from_def(ComponentId(0), &d, NodeId(0), NodeId(1)).unwrap();
        assert!(c.is_open_switch());
    }
}
