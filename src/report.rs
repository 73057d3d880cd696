//! Text rendering of tick results.
//!
//! The solver only produces structured data; this is the one place that turns
//! it into human-readable text, using component names from the graph.

use std::fmt::Write;

use crate::circuit::{CircuitGraph, ComponentId};
use crate::components::Quantity;
use crate::solver::{Diagnostic, TickReport, ValidationWarning};

const PREFIXES: [(f64, &str); 7] = [
    (1e9, "G"),
    (1e6, "M"),
    (1e3, "k"),
    (1.0, ""),
    (1e-3, "m"),
    (1e-6, "u"),
    (1e-9, "n"),
];

/// Format a value with an SI prefix, e.g. `4.700 kΩ`.
pub fn format_si(value: f64, unit: &str) -> String {
    if value == 0.0 || !value.is_finite() {
        return format!("{} {}", value, unit);
    }
    let magnitude = value.abs();
    let (scale, prefix) = PREFIXES
        .iter()
        .copied()
        .find(|&(scale, _)| magnitude >= scale)
        .unwrap_or((1e-12, "p"));
    format!("{:.3} {}{}", value / scale, prefix, unit)
}

fn name(graph: &CircuitGraph, id: ComponentId) -> &str {
    graph
        .components
        .get(id.0)
        .map(|c| c.name.as_str())
        .unwrap_or("?")
}

/// Describe one diagnostic.
pub fn describe_diagnostic(graph: &CircuitGraph, diagnostic: &Diagnostic) -> String {
    match diagnostic {
        Diagnostic::NoSource => "no battery is marked as the source".to_string(),
        Diagnostic::SourceUnwired { source } => {
            format!("source {} must be wired on both terminals", name(graph, *source))
        }
        Diagnostic::SourceShortCircuited { source } => {
            format!("source {} is short-circuited (both terminals on one wire)", name(graph, *source))
        }
        Diagnostic::NoConductingPath { source } => {
            format!("no conducting path through source {}", name(graph, *source))
        }
        Diagnostic::Undefined(var) => {
            format!("{} {} is undetermined", name(graph, var.component), var.quantity)
        }
        Diagnostic::IterationLimit { iterations } => {
            format!("solver stopped after {} iterations", iterations)
        }
    }
}

/// Describe one cross-validation warning.
pub fn describe_warning(graph: &CircuitGraph, warning: &ValidationWarning) -> String {
    match warning {
        ValidationWarning::OhmsLaw {
            component,
            voltage,
            expected,
        } => format!(
            "{}: voltage {} but I·R gives {}",
            name(graph, *component),
            format_si(*voltage, "V"),
            format_si(*expected, "V")
        ),
        ValidationWarning::PowerLaw {
            component,
            power,
            expected,
        } => format!(
            "{}: power {} but V·I gives {}",
            name(graph, *component),
            format_si(*power, "W"),
            format_si(*expected, "W")
        ),
    }
}

/// Render a full report: one row per solved component, then warnings and
/// diagnostics other than undefined variables (those show as `-`).
pub fn render_report(graph: &CircuitGraph, report: &TickReport) -> String {
    let mut out = String::new();
    let width = report
        .solved
        .keys()
        .map(|&id| name(graph, id).len())
        .max()
        .unwrap_or(4)
        .max(4);

    if !report.solved.is_empty() {
        let _ = write!(out, "{:<width$}", "name");
        for quantity in Quantity::ALL {
            let _ = write!(out, "  {:>14}", quantity.to_string());
        }
        out.push('\n');
    }

    for (&id, values) in &report.solved {
        let _ = write!(out, "{:<width$}", name(graph, id));
        for quantity in Quantity::ALL {
            let cell = values
                .get(quantity)
                .map(|v| format_si(v, quantity.unit()))
                .unwrap_or_else(|| "-".to_string());
            let _ = write!(out, "  {:>14}", cell);
        }
        out.push('\n');
    }

    for warning in &report.warnings {
        let _ = writeln!(out, "warning: {}", describe_warning(graph, warning));
    }
    for diagnostic in &report.diagnostics {
        if !matches!(diagnostic, Diagnostic::Undefined(_)) {
            let _ = writeln!(out, "error: {}", describe_diagnostic(graph, diagnostic));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dsl;
    use crate::solver::run_tick;

    #[test]
    fn test_format_si() {
        assert_eq!(format_si(4700.0, "Ω"), "4.700 kΩ");
        assert_eq!(format_si(0.06, "A"), "60.000 mA");
        assert_eq!(format_si(-9.0, "V"), "-9.000 V");
        assert_eq!(format_si(0.0, "W"), "0 W");
    }

    #[test]
    fn test_render_report() {
        let mut graph = CircuitGraph::from_ast(dsl::parse("B1 top 0 9\nR1 top 0 100").unwrap()).unwrap();
        let report = run_tick(&mut graph);
        let text = render_report(&graph, &report);

        assert!(text.starts_with("name"));
        assert!(text.contains("R1"));
        assert!(text.contains("90.000 mA"));
        assert!(!text.contains("error:"));
    }

    #[test]
    fn test_render_topology_error() {
        let mut graph = CircuitGraph::from_ast(dsl::parse("B1 a a 9\nR1 a b 1").unwrap()).unwrap();
        let report = run_tick(&mut graph);
        assert_eq!(
            render_report(&graph, &report),
            "error: source B1 is short-circuited (both terminals on one wire)\n"
        );
    }
}
