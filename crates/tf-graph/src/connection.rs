//! Stream connections between units, and default-port assignment for
//! handles a payload left unspecified.
//!
//! Grounded on `flowsheet_solver.py`'s `Connection` dataclass and its
//! `_next_default_port` helper: when a multi-port unit's connection is
//! missing a `sourceHandle`/`targetHandle`, the next unused name from that
//! unit kind's default port ordering is assigned, via a per-unit sequential
//! counter, so two unlabeled outgoing edges from a flash drum land on
//! `vapor` then `liquid` rather than colliding.

use std::collections::HashMap;

use crate::alias::{default_inlet_ports, default_outlet_ports, extract_port};

/// A directed edge in the flowsheet graph: a named stream flowing from one
/// unit's outlet port to another unit's inlet port. A missing endpoint
/// marks a flowsheet boundary (external feed or product).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub stream_id: String,
    pub from_unit: Option<String>,
    pub from_port: Option<String>,
    pub to_unit: Option<String>,
    pub to_port: Option<String>,
}

/// Assigns default sequential port names to connections whose handles were
/// omitted, keyed by unit id so each unit gets its own counter.
#[derive(Debug, Default)]
pub struct DefaultPortAssigner {
    outlet_counters: HashMap<String, usize>,
    inlet_counters: HashMap<String, usize>,
}

impl DefaultPortAssigner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Next default outlet port name for `unit_id` of the given kind,
    /// advancing that unit's counter. Returns `None` once the kind's
    /// default ordering is exhausted.
    pub fn next_outlet(&mut self, unit_id: &str, unit_kind: &str) -> Option<String> {
        let ports = default_outlet_ports(unit_kind);
        let counter = self.outlet_counters.entry(unit_id.to_string()).or_insert(0);
        let port = ports.get(*counter).cloned();
        *counter += 1;
        port
    }

    /// Next default inlet port name for `unit_id` of the given kind.
    pub fn next_inlet(&mut self, unit_id: &str, unit_kind: &str) -> Option<String> {
        let ports = default_inlet_ports(unit_kind);
        let counter = self.inlet_counters.entry(unit_id.to_string()).or_insert(0);
        let port = ports.get(*counter).cloned();
        *counter += 1;
        port
    }
}

/// Build a `Connection` from a raw stream spec's endpoints and handles,
/// resolving handles through suffix-stripping/alias rules and, when a
/// handle is missing on a known multi-port unit, the per-unit default
/// ordering tracked by `assigner`.
pub fn build_connection(
    stream_id: impl Into<String>,
    from_unit: Option<String>,
    from_handle: Option<&str>,
    from_unit_kind: Option<&str>,
    to_unit: Option<String>,
    to_handle: Option<&str>,
    to_unit_kind: Option<&str>,
    assigner: &mut DefaultPortAssigner,
) -> Connection {
    let from_port = extract_port(from_handle).or_else(|| {
        let unit = from_unit.as_deref()?;
        let kind = from_unit_kind?;
        assigner.next_outlet(unit, kind)
    });

    let to_port = extract_port(to_handle).or_else(|| {
        let unit = to_unit.as_deref()?;
        let kind = to_unit_kind?;
        assigner.next_inlet(unit, kind)
    });

    Connection {
        stream_id: stream_id.into(),
        from_unit,
        from_port,
        to_unit,
        to_port,
    }
}
