//! Overall mass and energy balance checks across a converged flowsheet.
//!
//! Grounded on `flowsheet_solver.py`'s `_check_mass_balance`/
//! `_check_energy_balance`: boundary flows are summed over tracked feed
//! streams on the in-side, and over streams whose `to_unit` is either
//! absent or a terminal unit (a known unit with no downstream known
//! neighbor) on the out-side.

use std::collections::{BTreeMap, HashSet};

use tf_graph::Connection;
use tf_thermo::StreamState;

/// Units with no downstream known unit — the process chain's outflow
/// boundary for balance accounting.
pub fn terminal_units(unit_ids: &[String], connections: &[Connection]) -> HashSet<String> {
    let known: HashSet<&String> = unit_ids.iter().collect();
    let mut has_downstream_known: HashSet<String> = HashSet::new();
    for conn in connections {
        if let (Some(from), Some(to)) = (&conn.from_unit, &conn.to_unit) {
            if known.contains(from) && known.contains(to) {
                has_downstream_known.insert(from.clone());
            }
        }
    }
    unit_ids.iter().filter(|u| !has_downstream_known.contains(*u)).cloned().collect()
}

/// `|feed_mass - product_mass| / feed_mass`, or 0.0 if there is no feed mass.
pub fn check_mass_balance(
    unit_ids: &[String],
    connections: &[Connection],
    feed_streams: &BTreeMap<String, StreamState>,
    streams: &BTreeMap<String, StreamState>,
) -> f64 {
    let feed_mass: f64 = feed_streams.values().map(|s| s.mass_flow_kg_s).sum();
    if feed_mass <= 0.0 {
        return 0.0;
    }

    let known: HashSet<&String> = unit_ids.iter().collect();
    let terminal = terminal_units(unit_ids, connections);

    let mut product_mass = 0.0;
    for conn in connections {
        if feed_streams.contains_key(&conn.stream_id) {
            continue;
        }
        let Some(state) = streams.get(&conn.stream_id) else { continue };
        let boundary_out = match &conn.to_unit {
            None => true,
            Some(to) => !known.contains(to) || terminal.contains(to),
        };
        if boundary_out {
            product_mass += state.mass_flow_kg_s;
        }
    }

    (feed_mass - product_mass).abs() / feed_mass
}

/// Analogous to [`check_mass_balance`], with unit duties added to the feed
/// (inlet) side of the energy balance.
pub fn check_energy_balance(
    unit_ids: &[String],
    connections: &[Connection],
    feed_streams: &BTreeMap<String, StreamState>,
    streams: &BTreeMap<String, StreamState>,
    total_duty_w: f64,
) -> f64 {
    let feed_energy: f64 = feed_streams.values().map(|s| s.molar_flow_mol_s * s.enthalpy_j_mol).sum();

    let known: HashSet<&String> = unit_ids.iter().collect();
    let terminal = terminal_units(unit_ids, connections);

    let mut product_energy = 0.0;
    for conn in connections {
        if feed_streams.contains_key(&conn.stream_id) {
            continue;
        }
        let Some(state) = streams.get(&conn.stream_id) else { continue };
        let boundary_out = match &conn.to_unit {
            None => true,
            Some(to) => !known.contains(to) || terminal.contains(to),
        };
        if boundary_out {
            product_energy += state.molar_flow_mol_s * state.enthalpy_j_mol;
        }
    }

    let energy_in = feed_energy + total_duty_w;
    if energy_in.abs() > 0.0 {
        (energy_in - product_energy).abs() / energy_in.abs()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conn(stream: &str, from: Option<&str>, to: Option<&str>) -> Connection {
        Connection {
            stream_id: stream.to_string(),
            from_unit: from.map(str::to_string),
            from_port: Some("out".to_string()),
            to_unit: to.map(str::to_string),
            to_port: Some("in".to_string()),
        }
    }

    #[test]
    fn terminal_unit_is_one_with_no_known_downstream() {
        let units = vec!["a".to_string(), "b".to_string()];
        let conns = vec![conn("s1", Some("a"), Some("b"))];
        let terminal = terminal_units(&units, &conns);
        assert!(terminal.contains("b"));
        assert!(!terminal.contains("a"));
    }
}
