//! Per-tick scratch copy of component quantities.

use std::collections::HashMap;

use crate::circuit::{CircuitGraph, ComponentId};
use crate::components::{ComponentKind, Quantity, VariableRef};

/// Quantities of one component as the solver sees them.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolvedValues {
    pub resistance: Option<f64>,
    pub voltage: Option<f64>,
    pub current: Option<f64>,
    pub power: Option<f64>,
}

impl SolvedValues {
    pub fn get(&self, quantity: Quantity) -> Option<f64> {
        match quantity {
            Quantity::Resistance => self.resistance,
            Quantity::Voltage => self.voltage,
            Quantity::Current => self.current,
            Quantity::Power => self.power,
        }
    }

    fn slot_mut(&mut self, quantity: Quantity) -> &mut Option<f64> {
        match quantity {
            Quantity::Resistance => &mut self.resistance,
            Quantity::Voltage => &mut self.voltage,
            Quantity::Current => &mut self.current,
            Quantity::Power => &mut self.power,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry {
    kind: ComponentKind,
    values: SolvedValues,
}

/// Values of every reachable component during one tick.
///
/// A variable is *defined* once it holds a value. Defined variables are never
/// overwritten, so the first derivation wins. The source's voltage is held as
/// a magnitude; the sign is restored when results leave the solver.
#[derive(Debug, Clone)]
pub struct Values {
    source: ComponentId,
    order: Vec<ComponentId>,
    entries: HashMap<ComponentId, Entry>,
}

impl Values {
    /// Seed from the graph: every non-automatic slot of each listed component
    /// starts out defined.
    pub fn extract(graph: &CircuitGraph, source: ComponentId, components: &[ComponentId]) -> Self {
        let mut entries = HashMap::with_capacity(components.len());
        for &id in components {
            let component = graph.component(id);
            let mut values = SolvedValues::default();
            for quantity in Quantity::ALL {
                *values.slot_mut(quantity) = component.get(quantity).filter(|v| v.is_finite());
            }
            if id == source {
                values.voltage = values.voltage.map(f64::abs);
            }
            entries.insert(
                id,
                Entry {
                    kind: component.kind,
                    values,
                },
            );
        }

        Self {
            source,
            order: components.to_vec(),
            entries,
        }
    }

    pub fn source(&self) -> ComponentId {
        self.source
    }

    /// Components in tree order.
    pub fn ids(&self) -> &[ComponentId] {
        &self.order
    }

    pub fn contains(&self, id: ComponentId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn kind(&self, id: ComponentId) -> Option<ComponentKind> {
        self.entries.get(&id).map(|e| e.kind)
    }

    pub fn get(&self, var: VariableRef) -> Option<f64> {
        self.entries.get(&var.component)?.values.get(var.quantity)
    }

    /// Shorthand for [`get`](Self::get) on a component's quantity.
    pub fn value(&self, id: ComponentId, quantity: Quantity) -> Option<f64> {
        self.get(VariableRef::new(id, quantity))
    }

    pub fn is_defined(&self, var: VariableRef) -> bool {
        self.get(var).is_some()
    }

    /// Define a variable. Refuses non-finite values, unknown components and
    /// variables that are already defined; returns whether it took effect.
    pub fn define(&mut self, var: VariableRef, value: f64) -> bool {
        if !value.is_finite() {
            return false;
        }
        let Some(entry) = self.entries.get_mut(&var.component) else {
            return false;
        };
        let slot = entry.values.slot_mut(var.quantity);
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    /// Variables still without a value. Battery resistance is not a variable.
    pub fn undefined(&self) -> Vec<VariableRef> {
        let mut out = Vec::new();
        for &id in &self.order {
            let entry = &self.entries[&id];
            for quantity in Quantity::ALL {
                if quantity == Quantity::Resistance && entry.kind == ComponentKind::Battery {
                    continue;
                }
                if entry.values.get(quantity).is_none() {
                    out.push(VariableRef::new(id, quantity));
                }
            }
        }
        out
    }

    /// Final values per component, with the source voltage signed again.
    pub fn solved(&self, polarity_reversed: bool) -> Vec<(ComponentId, SolvedValues)> {
        self.order
            .iter()
            .filter_map(|&id| Some((id, self.signed_values(id, polarity_reversed)?)))
            .collect()
    }

    /// Values of one component with the source voltage signed again.
    pub fn signed_values(&self, id: ComponentId, polarity_reversed: bool) -> Option<SolvedValues> {
        let mut values = self.entries.get(&id)?.values;
        if id == self.source && polarity_reversed {
            values.voltage = values.voltage.map(|v| -v);
        }
        Some(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::Slot;
    use crate::dsl;

    fn setup() -> (CircuitGraph, Values) {
        let graph = CircuitGraph::from_ast(dsl::parse("B1 top 0 -9\nR1 top 0 100 i=auto").unwrap()).unwrap();
        let source = graph.find_source().unwrap();
        let ids: Vec<_> = graph.components.iter().map(|c| c.id).collect();
        let values = Values::extract(&graph, source, &ids);
        (graph, values)
    }

    #[test]
    fn test_extract_seeds_fixed_slots_only() {
        let (graph, values) = setup();
        let r1 = graph.lookup("R1").unwrap();
        assert_eq!(values.value(r1, Quantity::Resistance), Some(100.0));
        assert_eq!(values.value(r1, Quantity::Current), None);
    }

    #[test]
    fn test_source_voltage_is_magnitude() {
        let (graph, values) = setup();
        let b1 = graph.lookup("B1").unwrap();
        assert_eq!(values.value(b1, Quantity::Voltage), Some(9.0));
        assert_eq!(values.signed_values(b1, true).unwrap().voltage, Some(-9.0));
    }

    #[test]
    fn test_first_definition_wins() {
        let (graph, mut values) = setup();
        let var = VariableRef::new(graph.lookup("R1").unwrap(), Quantity::Current);
        assert!(!values.define(var, f64::NAN));
        assert!(values.define(var, 0.09));
        assert!(!values.define(var, 1.0));
        assert_eq!(values.get(var), Some(0.09));
    }

    #[test]
    fn test_stale_automatic_value_ignored() {
        let (mut graph, _) = setup();
        let r1 = graph.lookup("R1").unwrap();
        graph.set_slot(
            r1,
            Quantity::Voltage,
            Slot {
                value: Some(123.0),
                automatic: true,
            },
        );
        let values = Values::extract(&graph, graph.find_source().unwrap(), &[r1]);
        assert_eq!(values.value(r1, Quantity::Voltage), None);
    }

    #[test]
    fn test_undefined_skips_battery_resistance() {
        let (graph, values) = setup();
        let b1 = graph.lookup("B1").unwrap();
        let undefined = values.undefined();
        assert!(!undefined.contains(&VariableRef::new(b1, Quantity::Resistance)));
        assert!(undefined.contains(&VariableRef::new(b1, Quantity::Current)));
    }
}
