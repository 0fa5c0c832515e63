//! Wegstein-accelerated recycle-tear iteration driver.
//!
//! Grounded on `flowsheet_solver.py`'s `solve()`: compute units in
//! tear-aware topological order each pass, update tear streams with
//! Wegstein acceleration once at least 3 history points exist, and stop on
//! convergence or `max_iterations`.

use std::collections::{BTreeMap, HashMap, HashSet};

use tf_graph::{outlet_key_to_port, Connection};
use tf_thermo::{FlashEngine, StreamState};
use tf_unitops::UnitOp;

use crate::balance::{check_energy_balance, check_mass_balance};
use crate::cycle::{select_tear_streams, tarjan_scc, topological_order_with_tears};
use crate::error::SolverResult;

/// A parsed, ready-to-solve flowsheet: units, their stream connections, and
/// the current value of every stream (including external feeds).
#[derive(Debug, Clone)]
pub struct Flowsheet {
    pub units: BTreeMap<String, UnitOp>,
    pub connections: Vec<Connection>,
    pub feed_streams: BTreeMap<String, StreamState>,
    pub streams: BTreeMap<String, StreamState>,
}

impl Flowsheet {
    pub fn new() -> Self {
        Self { units: BTreeMap::new(), connections: Vec::new(), feed_streams: BTreeMap::new(), streams: BTreeMap::new() }
    }
}

impl Default for Flowsheet {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct SolveConfig {
    pub max_iterations: usize,
    pub tolerance: f64,
}

impl Default for SolveConfig {
    fn default() -> Self {
        Self { max_iterations: 100, tolerance: 1e-6 }
    }
}

#[derive(Debug, Clone)]
pub struct SolveReport {
    pub converged: bool,
    pub iterations: usize,
    pub mass_balance_error: Option<f64>,
    pub energy_balance_error: Option<f64>,
    pub warnings: Vec<String>,
}

/// `(T, P, molar_flow, zs...)`, the numeric vector tear-stream convergence
/// and Wegstein acceleration operate on.
fn stream_to_vector(state: &StreamState) -> Vec<f64> {
    let mut v = vec![state.t_k, state.p_pa, state.molar_flow_mol_s];
    v.extend_from_slice(&state.zs);
    v
}

/// Reconstructs a `StreamState` from a numeric vector by re-flashing at
/// (T, P) with the given composition; clamps to physically sane bounds and
/// falls back to `template` unchanged if the reflash fails.
fn vector_to_stream(engine: &FlashEngine, vec: &[f64], template: &StreamState) -> StreamState {
    let t = vec[0].max(100.0);
    let p = vec[1].max(1000.0);
    let flow = vec[2].max(0.0);
    let mut zs: Vec<f64> = vec[3..].iter().map(|z| z.max(0.0)).collect();
    let total: f64 = zs.iter().sum();
    if total > 0.0 {
        for z in &mut zs {
            *z /= total;
        }
    } else {
        zs = template.zs.clone();
    }

    engine.pt_flash(t, p, &zs, flow).unwrap_or_else(|_| template.clone())
}

/// Normalized Euclidean distance between two stream states: relative
/// differences in T, P, molar flow, plus raw composition differences.
fn stream_distance(a: &StreamState, b: &StreamState) -> f64 {
    let mut err = 0.0;
    if a.t_k > 0.0 {
        err += ((a.t_k - b.t_k) / a.t_k).powi(2);
    }
    if a.p_pa > 0.0 {
        err += ((a.p_pa - b.p_pa) / a.p_pa).powi(2);
    }
    if a.molar_flow_mol_s > 0.0 {
        err += ((a.molar_flow_mol_s - b.molar_flow_mol_s) / a.molar_flow_mol_s.max(1e-10)).powi(2);
    }
    for (za, zb) in a.zs.iter().zip(b.zs.iter()) {
        err += (za - zb).powi(2);
    }
    err.sqrt()
}

/// Wegstein extrapolation from the last 3 history points, per component.
fn wegstein_update(history: &[Vec<f64>]) -> Vec<f64> {
    let x_n = history.last().unwrap();
    let x_nm1 = &history[history.len() - 2];
    let g_nm1 = if history.len() >= 3 { &history[history.len() - 3] } else { x_nm1 };

    x_n.iter()
        .zip(x_nm1.iter())
        .zip(g_nm1.iter())
        .map(|((&xn, &xnm1), &gnm1)| {
            let dx = xn - xnm1;
            let dg = xn - gnm1;
            if (dg - dx).abs() > 1e-15 {
                let s = (dx / (dg - dx + 1e-30)).clamp(-5.0, 0.0);
                let q = s / (s - 1.0);
                q * xn + (1.0 - q) * xnm1
            } else {
                xn
            }
        })
        .collect()
}

/// Per-unit outlet/inlet port-name -> stream-id maps, built once from the
/// connection list (connections don't change across iterations).
fn port_maps(connections: &[Connection]) -> (HashMap<String, BTreeMap<String, String>>, HashMap<String, BTreeMap<String, String>>) {
    let mut outlet_ports: HashMap<String, BTreeMap<String, String>> = HashMap::new();
    let mut inlet_ports: HashMap<String, BTreeMap<String, String>> = HashMap::new();
    for conn in connections {
        if let (Some(unit), Some(port)) = (&conn.from_unit, &conn.from_port) {
            outlet_ports.entry(unit.clone()).or_default().insert(port.clone(), conn.stream_id.clone());
        }
        if let (Some(unit), Some(port)) = (&conn.to_unit, &conn.to_port) {
            inlet_ports.entry(unit.clone()).or_default().insert(port.clone(), conn.stream_id.clone());
        }
    }
    (outlet_ports, inlet_ports)
}

fn gather_inlets(unit_id: &str, inlet_ports: &HashMap<String, BTreeMap<String, String>>, streams: &BTreeMap<String, StreamState>) -> BTreeMap<String, StreamState> {
    let mut inlets = BTreeMap::new();
    if let Some(ports) = inlet_ports.get(unit_id) {
        for (port, stream_id) in ports {
            if let Some(state) = streams.get(stream_id) {
                inlets.insert(port.clone(), state.clone());
            }
        }
    }
    inlets
}

/// The outlet-assignment policy: semantic alias, direct match, fuzzy
/// substring match, positional fallback, and finally pairing leftover
/// outlet results with any outgoing connection from this unit that hasn't
/// been claimed yet.
fn assign_outlets(unit_id: &str, outlets: BTreeMap<String, StreamState>, outlet_ports: &BTreeMap<String, String>, connections: &[Connection], streams: &mut BTreeMap<String, StreamState>) {
    let outlet_keys: Vec<String> = outlets.keys().cloned().collect();
    let port_keys: Vec<String> = outlet_ports.keys().cloned().collect();
    let mut assigned: HashSet<String> = HashSet::new();

    for (out_port, out_state) in &outlets {
        let mut stream_id = outlet_key_to_port(out_port).and_then(|mapped| outlet_ports.get(mapped).cloned());

        if stream_id.is_none() {
            stream_id = outlet_ports.get(out_port).cloned();
        }

        if stream_id.is_none() {
            stream_id = outlet_ports
                .iter()
                .find(|(pk, _)| pk.contains(out_port.as_str()) || out_port.contains(pk.as_str()))
                .map(|(_, sid)| sid.clone());
        }

        if stream_id.is_none() {
            if let Some(idx) = outlet_keys.iter().position(|k| k == out_port) {
                stream_id = port_keys.get(idx).and_then(|pk| outlet_ports.get(pk).cloned());
            }
        }

        if let Some(sid) = stream_id {
            if assigned.insert(sid.clone()) {
                streams.insert(sid, out_state.clone());
            }
        }
    }

    if assigned.len() < outlets.len() {
        let unmatched: Vec<(&String, &StreamState)> = outlets
            .iter()
            .filter(|(k, _)| {
                let mapped_sid = outlet_key_to_port(k).and_then(|m| outlet_ports.get(m));
                let direct_sid = outlet_ports.get(k.as_str());
                !mapped_sid.into_iter().chain(direct_sid).any(|sid| assigned.contains(sid))
            })
            .collect();
        let available: Vec<String> = connections
            .iter()
            .filter(|c| c.from_unit.as_deref() == Some(unit_id) && !assigned.contains(&c.stream_id))
            .map(|c| c.stream_id.clone())
            .collect();
        for ((_, state), sid) in unmatched.into_iter().zip(available.into_iter()) {
            streams.insert(sid.clone(), state.clone());
            assigned.insert(sid);
        }
    }
}

fn ambient_stream(engine: &FlashEngine) -> StreamState {
    let n = engine.component_names.len().max(1);
    let zs = vec![1.0 / n as f64; n];
    engine.pt_flash(298.15, 101_325.0, &zs, 1.0).expect("ambient pt_flash should not fail for a valid engine")
}

/// Run one solve of `flowsheet`, mutating its `units`/`streams` in place.
pub fn solve(flowsheet: &mut Flowsheet, engine: &FlashEngine, config: &SolveConfig) -> SolverResult<SolveReport> {
    let unit_ids: Vec<String> = flowsheet.units.keys().cloned().collect();
    let sccs = tarjan_scc(&unit_ids, &flowsheet.connections);
    let tear_streams = select_tear_streams(&sccs, &flowsheet.connections);
    let calc_order = topological_order_with_tears(&unit_ids, &flowsheet.connections, &tear_streams);

    let (outlet_ports, inlet_ports) = port_maps(&flowsheet.connections);

    for sid in &tear_streams {
        flowsheet.streams.entry(sid.clone()).or_insert_with(|| {
            flowsheet.feed_streams.values().next().cloned().unwrap_or_else(|| ambient_stream(engine))
        });
    }

    let mut tear_history: HashMap<String, Vec<Vec<f64>>> = tear_streams.iter().map(|s| (s.clone(), Vec::new())).collect();
    let mut warnings = Vec::new();
    let mut converged = false;
    let mut iterations = 0usize;

    for iter in 1..=config.max_iterations {
        iterations = iter;
        let olds: HashMap<String, StreamState> = tear_streams
            .iter()
            .filter_map(|sid| flowsheet.streams.get(sid).map(|s| (sid.clone(), s.clone())))
            .collect();

        for unit_id in &calc_order {
            let inlets = gather_inlets(unit_id, &inlet_ports, &flowsheet.streams);
            if inlets.is_empty() {
                if let Some(unit) = flowsheet.units.get_mut(unit_id) {
                    unit.warnings.push("No inlet streams available — unit was skipped".to_string());
                }
                continue;
            }
            let unit = flowsheet.units.get_mut(unit_id).expect("calc_order only contains known units");
            match unit.calculate(&inlets, engine) {
                Ok(outlets) => {
                    let empty = BTreeMap::new();
                    let ports = outlet_ports.get(unit_id).unwrap_or(&empty);
                    assign_outlets(unit_id, outlets, ports, &flowsheet.connections, &mut flowsheet.streams);
                }
                Err(e) => {
                    unit.warnings.push(format!("calculate failed: {e}"));
                }
            }
        }

        if tear_streams.is_empty() {
            converged = true;
            break;
        }

        let mut max_err = 0.0_f64;
        for sid in &tear_streams {
            let Some(new_state) = flowsheet.streams.get(sid).cloned() else { continue };
            if let Some(old_state) = olds.get(sid) {
                max_err = max_err.max(stream_distance(old_state, &new_state));
            }

            let history = tear_history.get_mut(sid).unwrap();
            history.push(stream_to_vector(&new_state));

            let resolved = if history.len() >= 3 {
                vector_to_stream(engine, &wegstein_update(history), &new_state)
            } else {
                new_state
            };
            flowsheet.streams.insert(sid.clone(), resolved);
        }

        if max_err < config.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        warnings.push(format!("did not converge within {} iterations", config.max_iterations));
    }

    let total_duty: f64 = flowsheet.units.values().map(|u| u.duty_w).sum();
    let mass_err = check_mass_balance(&unit_ids, &flowsheet.connections, &flowsheet.feed_streams, &flowsheet.streams);
    let energy_err = check_energy_balance(&unit_ids, &flowsheet.connections, &flowsheet.feed_streams, &flowsheet.streams, total_duty);

    if mass_err > 0.01 {
        warnings.push(format!("mass balance error {:.2}% exceeds 1% threshold", mass_err * 100.0));
    }
    if energy_err > 0.05 {
        warnings.push(format!("energy balance error {:.2}% exceeds 5% threshold", energy_err * 100.0));
    }
    for unit in flowsheet.units.values() {
        for w in &unit.warnings {
            warnings.push(format!("{}: {}", unit.id, w));
        }
    }

    Ok(SolveReport {
        converged,
        iterations,
        mass_balance_error: Some(mass_err),
        energy_balance_error: Some(energy_err),
        warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_thermo::{builtin_registry, PackageKind};
    use tf_unitops::UnitOpKind;

    fn water_engine() -> FlashEngine {
        let comps: Vec<_> = builtin_registry().into_iter().filter(|c| c.name == "water").collect();
        FlashEngine::new(PackageKind::IapwsWater, comps, None)
    }

    #[test]
    fn single_pump_converges_with_no_tear_streams() {
        let engine = water_engine();
        let feed = engine.pt_flash(300.0, 101_325.0, &[1.0], 10.0).unwrap();

        let mut fs = Flowsheet::new();
        fs.units.insert(
            "pump-1".to_string(),
            UnitOp::new("pump-1", "pump", UnitOpKind::Pump(tf_unitops::rotating::PumpParams { outlet_pressure_kpa: Some(500.0), efficiency: Some(0.7) })),
        );
        fs.feed_streams.insert("feed".to_string(), feed.clone());
        fs.streams.insert("feed".to_string(), feed);
        fs.connections = vec![
            Connection { stream_id: "feed".to_string(), from_unit: None, from_port: None, to_unit: Some("pump-1".to_string()), to_port: Some("in".to_string()) },
            Connection { stream_id: "out".to_string(), from_unit: Some("pump-1".to_string()), from_port: Some("out".to_string()), to_unit: None, to_port: None },
        ];

        let report = solve(&mut fs, &engine, &SolveConfig::default()).unwrap();
        assert!(report.converged);
        assert_eq!(report.iterations, 1);
        let out = fs.streams.get("out").unwrap();
        assert!(out.p_pa > 101_325.0);
    }

    fn mixture_engine(names: &[&str]) -> FlashEngine {
        let comps: Vec<_> = builtin_registry().into_iter().filter(|c| names.contains(&c.name.as_str())).collect();
        FlashEngine::new(PackageKind::Pr, comps, None)
    }

    #[test]
    fn three_phase_separator_resolves_named_outlets_regardless_of_edge_order() {
        let engine = mixture_engine(&["methane", "n-hexane", "water"]);
        let idx_methane = engine.component_names.iter().position(|n| n == "methane").unwrap();
        let idx_hexane = engine.component_names.iter().position(|n| n == "n-hexane").unwrap();
        let idx_water = engine.component_names.iter().position(|n| n == "water").unwrap();
        let mut zs = vec![0.0; engine.n()];
        zs[idx_methane] = 0.3;
        zs[idx_hexane] = 0.4;
        zs[idx_water] = 0.3;
        let feed = engine.pt_flash(333.15, 4_000_000.0, &zs, 100.0).unwrap();

        let mut fs = Flowsheet::new();
        fs.units.insert(
            "sep-1".to_string(),
            UnitOp::new("sep-1", "3-phase separator", UnitOpKind::ThreePhaseSeparator(tf_unitops::separators::FlashDrumParams::default())),
        );
        fs.feed_streams.insert("feed".to_string(), feed.clone());
        fs.streams.insert("feed".to_string(), feed);

        // Edges listed deliberately out of "gas, oil, water" order: the
        // water outlet is wired first, then oil, then gas.
        fs.connections = vec![
            Connection { stream_id: "feed".to_string(), from_unit: None, from_port: None, to_unit: Some("sep-1".to_string()), to_port: Some("in".to_string()) },
            Connection { stream_id: "water-out".to_string(), from_unit: Some("sep-1".to_string()), from_port: Some("water".to_string()), to_unit: None, to_port: None },
            Connection { stream_id: "oil-out".to_string(), from_unit: Some("sep-1".to_string()), from_port: Some("oil".to_string()), to_unit: None, to_port: None },
            Connection { stream_id: "gas-out".to_string(), from_unit: Some("sep-1".to_string()), from_port: Some("gas".to_string()), to_unit: None, to_port: None },
        ];

        let report = solve(&mut fs, &engine, &SolveConfig::default()).unwrap();
        assert!(report.converged);

        let gas = fs.streams.get("gas-out").unwrap();
        let water = fs.streams.get("water-out").unwrap();
        if gas.molar_flow_mol_s > 0.0 {
            assert!(gas.zs[idx_methane] > gas.zs[idx_water]);
        }
        if water.molar_flow_mol_s > 0.0 {
            assert!(water.zs[idx_water] > water.zs[idx_methane]);
        }
    }

    #[test]
    fn recycle_loop_converges_within_max_iterations() {
        let engine = water_engine();
        let feed = engine.pt_flash(298.15, 200_000.0, &[1.0], 10.0).unwrap();

        let mut fs = Flowsheet::new();
        fs.units.insert(
            "mixer-1".to_string(),
            UnitOp::new("mixer-1", "mixer", UnitOpKind::Mixer(tf_unitops::simple::MixerParams::default())),
        );
        fs.units.insert(
            "heater-1".to_string(),
            UnitOp::new(
                "heater-1",
                "heater",
                UnitOpKind::HeaterCooler(tf_unitops::heat::HeaterCoolerParams { outlet_temperature_c: Some(80.0), ..Default::default() }),
            ),
        );
        fs.units.insert(
            "sep-1".to_string(),
            UnitOp::new(
                "sep-1",
                "separator",
                UnitOpKind::FlashDrum(tf_unitops::separators::FlashDrumParams { temperature_c: Some(30.0), pressure_kpa: Some(200.0) }),
            ),
        );
        fs.feed_streams.insert("feed".to_string(), feed.clone());
        fs.streams.insert("feed".to_string(), feed);

        fs.connections = vec![
            Connection { stream_id: "feed".to_string(), from_unit: None, from_port: None, to_unit: Some("mixer-1".to_string()), to_port: Some("in-1".to_string()) },
            Connection { stream_id: "recycle".to_string(), from_unit: Some("sep-1".to_string()), from_port: Some("liquid".to_string()), to_unit: Some("mixer-1".to_string()), to_port: Some("in-2".to_string()) },
            Connection { stream_id: "to-heater".to_string(), from_unit: Some("mixer-1".to_string()), from_port: Some("out".to_string()), to_unit: Some("heater-1".to_string()), to_port: Some("in".to_string()) },
            Connection { stream_id: "to-sep".to_string(), from_unit: Some("heater-1".to_string()), from_port: Some("out".to_string()), to_unit: Some("sep-1".to_string()), to_port: Some("in".to_string()) },
            Connection { stream_id: "product".to_string(), from_unit: Some("sep-1".to_string()), from_port: Some("vapor".to_string()), to_unit: None, to_port: None },
        ];

        let report = solve(&mut fs, &engine, &SolveConfig::default()).unwrap();
        assert!(report.converged);
        assert!(report.iterations <= 100);
        assert!(report.mass_balance_error.unwrap() < 0.01);
    }
}
