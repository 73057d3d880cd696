//! Structured, string-free tick diagnostics.
//!
//! Everything here names components by id and carries plain numbers so a
//! presentation layer can format or localize it.

use crate::circuit::ComponentId;
use crate::components::VariableRef;

/// Something a tick could not do.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Diagnostic {
    /// No battery is flagged as the source.
    NoSource,
    /// One or both source terminals are not on a wire.
    SourceUnwired { source: ComponentId },
    /// Both source terminals sit on the same wire.
    SourceShortCircuited { source: ComponentId },
    /// Loops exist (or not) but none currently conducts.
    NoConductingPath { source: ComponentId },
    /// A reachable variable could not be derived.
    Undefined(VariableRef),
    /// The solver was still making progress when it hit the iteration cap.
    IterationLimit { iterations: usize },
}

impl Diagnostic {
    /// Topology errors abort the tick before anything is solved or written.
    pub fn is_topology_error(&self) -> bool {
        matches!(
            self,
            Self::NoSource | Self::SourceUnwired { .. } | Self::SourceShortCircuited { .. }
        )
    }
}

/// A solved (or fixed) value disagreeing with a physical law.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationWarning {
    /// `V != I·R`; `expected` is `I·R`.
    OhmsLaw {
        component: ComponentId,
        voltage: f64,
        expected: f64,
    },
    /// `P != V·I`; `expected` is `V·I`.
    PowerLaw {
        component: ComponentId,
        power: f64,
        expected: f64,
    },
}

impl ValidationWarning {
    pub fn component(&self) -> ComponentId {
        match self {
            Self::OhmsLaw { component, .. } | Self::PowerLaw { component, .. } => *component,
        }
    }

    /// Absolute difference between the stored and the recomputed value.
    pub fn deviation(&self) -> f64 {
        match self {
            Self::OhmsLaw { voltage, expected, .. } => (voltage - expected).abs(),
            Self::PowerLaw { power, expected, .. } => (power - expected).abs(),
        }
    }
}
