//! Write-back of solved values onto the graph.

use crate::circuit::CircuitGraph;
use crate::components::{Quantity, Slot};

use super::Values;

/// Store this tick's values in the automatic slots of every reachable component.
///
/// Fixed slots are left alone. An automatic slot whose variable stayed
/// undefined is cleared so no stale number survives. The source voltage gets
/// its sign back when the polarity is reversed. Returns the number of slots
/// that now hold a value.
pub fn write_back(graph: &mut CircuitGraph, values: &Values, polarity_reversed: bool) -> usize {
    let mut written = 0;

    for &id in values.ids() {
        let Some(solved) = values.signed_values(id, polarity_reversed) else {
            continue;
        };
        let component = graph.component_mut(id);
        for quantity in Quantity::ALL {
            let slot = component.quantities.slot_mut(quantity);
            if !slot.automatic {
                continue;
            }
            let value = solved.get(quantity);
            *slot = Slot {
                value,
                automatic: true,
            };
            written += usize::from(value.is_some());
        }
    }

    tracing::debug!(written, "wrote back solved values");
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::VariableRef;
    use crate::dsl;

    #[test]
    fn test_only_automatic_slots_written() {
        let mut graph = CircuitGraph::from_ast(dsl::parse("B1 a 0 -9\nR1 a 0 100\nR2 x y").unwrap()).unwrap();
        let b1 = graph.lookup("B1").unwrap();
        let r1 = graph.lookup("R1").unwrap();
        let r2 = graph.lookup("R2").unwrap();

        let mut values = Values::extract(&graph, b1, &[b1, r1]);
        values.define(VariableRef::new(r1, Quantity::Resistance), 1.0);
        values.define(VariableRef::new(r1, Quantity::Current), 0.09);
        values.define(VariableRef::new(b1, Quantity::Current), 0.09);

        let written = write_back(&mut graph, &values, true);
        assert_eq!(written, 2);

        let r1_slots = graph.component(r1).quantities;
        assert_eq!(r1_slots.resistance, Slot::fixed(100.0));
        assert_eq!(r1_slots.current.value, Some(0.09));
        assert!(r1_slots.current.automatic);
        assert_eq!(r1_slots.voltage.value, None);

        // Fixed source voltage keeps its sign; unreachable components untouched.
        assert_eq!(graph.component(b1).quantities.voltage, Slot::fixed(-9.0));
        assert_eq!(graph.component(r2).quantities, crate::components::ComponentKind::Resistor.default_quantities());
    }

    #[test]
    fn test_reversed_automatic_source_voltage_is_negated() {
        let mut graph = CircuitGraph::from_ast(dsl::parse("B1 a 0 9\nR1 a 0 100").unwrap()).unwrap();
        let b1 = graph.lookup("B1").unwrap();
        let values = Values::extract(&graph, b1, &[b1]);
        graph.set_slot(b1, Quantity::Voltage, Slot::automatic());

        write_back(&mut graph, &values, true);
        assert_eq!(graph.component(b1).get(Quantity::Voltage), None);
        assert_eq!(graph.component(b1).quantities.voltage.value, Some(-9.0));
    }
}
