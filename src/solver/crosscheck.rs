//! Post-solve consistency check against Ohm's law and the power law.

use crate::components::Quantity;

use super::{ValidationWarning, Values};

/// Re-check every component whose values are complete enough.
///
/// Ohm's law is checked for non-source components with `V`, `I` and `R`
/// known; the power law for any component with `P`, `V` and `I` known.
/// Mismatches beyond `tolerance` are reported, never corrected.
pub fn cross_validate(values: &Values, tolerance: f64) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    for &id in values.ids() {
        let get = |q| values.value(id, q);
        let (r, v, i, p) = (
            get(Quantity::Resistance),
            get(Quantity::Voltage),
            get(Quantity::Current),
            get(Quantity::Power),
        );

        if id != values.source() {
            if let (Some(v), Some(i), Some(r)) = (v, i, r) {
                let expected = i * r;
                if (v - expected).abs() >= tolerance {
                    tracing::warn!(component = %id, voltage = v, expected, "Ohm's law mismatch");
                    warnings.push(ValidationWarning::OhmsLaw {
                        component: id,
                        voltage: v,
                        expected,
                    });
                }
            }
        }

        if let (Some(p), Some(v), Some(i)) = (p, v, i) {
            let expected = v * i;
            if (p - expected).abs() >= tolerance {
                tracing::warn!(component = %id, power = p, expected, "power law mismatch");
                warnings.push(ValidationWarning::PowerLaw {
                    component: id,
                    power: p,
                    expected,
                });
            }
        }
    }

    warnings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::CircuitGraph;
    use crate::dsl;

    fn values(netlist: &str) -> (CircuitGraph, Values) {
        let graph = CircuitGraph::from_ast(dsl::parse(netlist).unwrap()).unwrap();
        let ids: Vec<_> = graph.components.iter().map(|c| c.id).collect();
        let values = Values::extract(&graph, graph.find_source().unwrap(), &ids);
        (graph, values)
    }

    #[test]
    fn test_consistent_values_pass() {
        let (_, v) = values("B1 a 0 9 i=0.09 p=0.81\nR1 a 0 100 v=9 i=0.09 p=0.81");
        assert!(cross_validate(&v, 1e-3).is_empty());
    }

    #[test]
    fn test_inconsistent_fixed_values_warn() {
        let (g, v) = values("B1 a 0 9\nR1 a 0 100 v=9 i=1 p=2");
        let r1 = g.lookup("R1").unwrap();
        let warnings = cross_validate(&v, 1e-3);

        assert_eq!(warnings.len(), 2);
        assert_eq!(
            warnings[0],
            ValidationWarning::OhmsLaw {
                component: r1,
                voltage: 9.0,
                expected: 100.0,
            }
        );
        assert!(matches!(warnings[1], ValidationWarning::PowerLaw { .. }));
        assert_eq!(warnings[1].deviation(), 7.0);
    }

    #[test]
    fn test_source_skips_ohms_law() {
        let (_, v) = values("B1 a 0 9 r=1 i=1 p=9\nR1 a 0");
        assert!(cross_validate(&v, 1e-3).is_empty());
    }
}
