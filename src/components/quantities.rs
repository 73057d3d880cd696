//! Electrical quantities and the slots that hold them.

use std::fmt;

use crate::circuit::ComponentId;

/// One of the four scalar quantities tracked per component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Quantity {
    Resistance,
    Voltage,
    Current,
    Power,
}

impl Quantity {
    /// All quantities in canonical order.
    pub const ALL: [Quantity; 4] = [
        Quantity::Resistance,
        Quantity::Voltage,
        Quantity::Current,
        Quantity::Power,
    ];

    /// Parse a quantity from its netlist key (`r`, `v`, `i`, `p` or the full name).
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_ascii_lowercase().as_str() {
            "r" | "resistance" => Some(Self::Resistance),
            "v" | "voltage" => Some(Self::Voltage),
            "i" | "current" => Some(Self::Current),
            "p" | "power" => Some(Self::Power),
            _ => None,
        }
    }

    /// SI unit symbol.
    pub fn unit(&self) -> &'static str {
        match self {
            Quantity::Resistance => "Ω",
            Quantity::Voltage => "V",
            Quantity::Current => "A",
            Quantity::Power => "W",
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Quantity::Resistance => "resistance",
            Quantity::Voltage => "voltage",
            Quantity::Current => "current",
            Quantity::Power => "power",
        };
        f.write_str(name)
    }
}

/// A `(component, quantity)` pair naming one solver variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VariableRef {
    pub component: ComponentId,
    pub quantity: Quantity,
}

impl VariableRef {
    pub fn new(component: ComponentId, quantity: Quantity) -> Self {
        Self { component, quantity }
    }
}

impl fmt::Display for VariableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.component, self.quantity)
    }
}

/// Storage for one quantity.
///
/// `automatic = true` means "derive this value": any number still stored in
/// `value` is a leftover from a previous tick and must not be trusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub value: Option<f64>,
    pub automatic: bool,
}

impl Slot {
    /// A user-fixed value.
    pub fn fixed(value: f64) -> Self {
        Self {
            value: Some(value),
            automatic: false,
        }
    }

    /// A slot the solver should derive.
    pub fn automatic() -> Self {
        Self {
            value: None,
            automatic: true,
        }
    }

    /// The value, if it can be trusted as a known input.
    pub fn known(&self) -> Option<f64> {
        if self.automatic {
            None
        } else {
            self.value
        }
    }
}

impl Default for Slot {
    fn default() -> Self {
        Self::automatic()
    }
}

/// The four quantity slots of a component.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QuantityMap {
    pub resistance: Slot,
    pub voltage: Slot,
    pub current: Slot,
    pub power: Slot,
}

impl QuantityMap {
    /// Get the slot for a quantity.
    pub fn slot(&self, quantity: Quantity) -> &Slot {
        match quantity {
            Quantity::Resistance => &self.resistance,
            Quantity::Voltage => &self.voltage,
            Quantity::Current => &self.current,
            Quantity::Power => &self.power,
        }
    }

    /// Get the slot for a quantity mutably.
    pub fn slot_mut(&mut self, quantity: Quantity) -> &mut Slot {
        match quantity {
            Quantity::Resistance => &mut self.resistance,
            Quantity::Voltage => &mut self.voltage,
            Quantity::Current => &mut self.current,
            Quantity::Power => &mut self.power,
        }
    }

    /// Known (non-automatic) value of a quantity.
    pub fn known(&self, quantity: Quantity) -> Option<f64> {
        self.slot(quantity).known()
    }
}
