//! Assembles a [`Flowsheet`](crate::iterate::Flowsheet) from a
//! [`FlowsheetPayload`](tf_project::FlowsheetPayload).
//!
//! Grounded on `flowsheet_solver.py`'s `FlowsheetSolver.build_from_payload`
//! and `_create_feed_stream`: unit ops are constructed from each
//! `UnitSpec`'s free-form `parameters` map via a typed per-kind
//! deserialization (the payload-to-struct layer the `parameters: Dict[str,
//! Any]` bag is replaced by), connections are built with port-alias/default
//! resolution, and streams whose source lies outside the known unit set or
//! whose payload properties carry a full thermodynamic specification become
//! feed streams.

use std::collections::{BTreeMap, HashSet};

use serde::de::DeserializeOwned;
use serde_json::Value;

use tf_graph::{build_connection, Connection, DefaultPortAssigner};
use tf_project::{FlowsheetPayload, StreamSpec, UnitSpec};
use tf_thermo::{FlashEngine, StreamState};
use tf_unitops::{UnitOp, UnitOpKind};

use crate::error::{SolverError, SolverResult};
use crate::iterate::Flowsheet;

fn parse_params<T: DeserializeOwned>(unit_id: &str, params: &BTreeMap<String, Value>) -> SolverResult<T> {
    let value = Value::Object(params.clone().into_iter().collect());
    serde_json::from_value(value).map_err(|e| SolverError::InvalidParameters {
        unit_id: unit_id.to_string(),
        message: e.to_string(),
    })
}

/// The variant-name tag `tf-graph`'s default-port tables are keyed by.
pub fn kind_tag(kind: &UnitOpKind) -> &'static str {
    match kind {
        UnitOpKind::Mixer(_) => "Mixer",
        UnitOpKind::Splitter(_) => "Splitter",
        UnitOpKind::Valve(_) => "Valve",
        UnitOpKind::Pump(_) => "Pump",
        UnitOpKind::Compressor(_) => "Compressor",
        UnitOpKind::PolytropicCompressor(_) => "PolytropicCompressor",
        UnitOpKind::Turbine(_) => "Turbine",
        UnitOpKind::HeaterCooler(_) => "HeaterCooler",
        UnitOpKind::HeatExchanger(_) => "HeatExchanger",
        UnitOpKind::RatingHeatExchanger(_) => "RatingHeatExchanger",
        UnitOpKind::FlashDrum(_) => "FlashDrum",
        UnitOpKind::ThreePhaseSeparator(_) => "ThreePhaseSeparator",
        UnitOpKind::ConversionReactor(_) => "ConversionReactor",
        UnitOpKind::EquilibriumReactor(_) => "EquilibriumReactor",
        UnitOpKind::GibbsReactor(_) => "GibbsReactor",
        UnitOpKind::KineticReactor(_) => "KineticReactor",
        UnitOpKind::ShortcutDistillation(_) => "ShortcutDistillation",
        UnitOpKind::RigorousDistillation(_) => "RigorousDistillation",
        UnitOpKind::PipeSegment(_) => "PipeSegment",
    }
}

/// Builds a typed [`UnitOpKind`] from a payload `UnitSpec`'s `type` string
/// and its free-form `parameters` map. Returns `Ok(None)` for an
/// unrecognized type, mirroring `UNIT_OP_REGISTRY.get(unit_type)` returning
/// `None` and the build step skipping (and warning about) that unit.
pub fn unit_op_from_spec(spec: &UnitSpec) -> SolverResult<Option<UnitOp>> {
    let name = spec.name.clone().unwrap_or_else(|| spec.id.clone());
    let p = &spec.parameters;
    let kind = match spec.kind.as_str() {
        "mixer" => UnitOpKind::Mixer(parse_params(&spec.id, p)?),
        "splitter" => UnitOpKind::Splitter(parse_params(&spec.id, p)?),
        "valve" | "controlValve" | "checkValve" | "prv" | "throttleValve" => {
            UnitOpKind::Valve(parse_params(&spec.id, p)?)
        }
        "pump" | "recipPump" => UnitOpKind::Pump(parse_params(&spec.id, p)?),
        "compressor" | "recipCompressor" => UnitOpKind::Compressor(parse_params(&spec.id, p)?),
        "polytropicCompressor" => UnitOpKind::PolytropicCompressor(parse_params(&spec.id, p)?),
        "turbine" | "steamTurbine" => UnitOpKind::Turbine(parse_params(&spec.id, p)?),
        "heaterCooler" | "firedHeater" | "boiler" | "condenser" | "airCooler" | "kettleReboiler" => {
            UnitOpKind::HeaterCooler(parse_params(&spec.id, p)?)
        }
        "heatExchanger" => UnitOpKind::HeatExchanger(parse_params(&spec.id, p)?),
        "shellTubeHX" | "plateHX" | "doublePipeHX" => UnitOpKind::RatingHeatExchanger(parse_params(&spec.id, p)?),
        "flashDrum" | "separator" | "separatorHorizontal" | "knockoutDrumH" | "surgeDrum" | "refluxDrum"
        | "tank" | "horizontalVessel" | "filter" | "cyclone" | "adsorber" | "membrane" => {
            UnitOpKind::FlashDrum(parse_params(&spec.id, p)?)
        }
        "separator3p" => UnitOpKind::ThreePhaseSeparator(parse_params(&spec.id, p)?),
        "cstr" | "conversionReactor" => UnitOpKind::ConversionReactor(parse_params(&spec.id, p)?),
        "equilibriumReactor" => UnitOpKind::EquilibriumReactor(parse_params(&spec.id, p)?),
        "gibbsReactor" => UnitOpKind::GibbsReactor(parse_params(&spec.id, p)?),
        "pfr" | "kineticReactor" => UnitOpKind::KineticReactor(parse_params(&spec.id, p)?),
        "distillationColumn" | "packedColumn" | "absorber" | "stripper" => {
            UnitOpKind::ShortcutDistillation(parse_params(&spec.id, p)?)
        }
        "rigorousDistillationColumn" => UnitOpKind::RigorousDistillation(parse_params(&spec.id, p)?),
        "pipeSegment" | "pipe" => UnitOpKind::PipeSegment(parse_params(&spec.id, p)?),
        other => {
            tracing::warn!("unknown unit type '{}', skipping unit '{}'", other, spec.id);
            return Ok(None);
        }
    };
    Ok(Some(UnitOp::new(spec.id.clone(), name, kind)))
}

fn coerce_f64(value: Option<&Value>) -> Option<f64> {
    match value? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.parse::<f64>().ok(),
        _ => None,
    }
}

/// Builds a feed `StreamState` from a `StreamSpec`'s `properties` map, or
/// the list of fields that were missing when it can't. Mirrors
/// `_create_feed_stream`'s defensive numeric coercion, case-insensitive
/// composition lookup, and zero-sum-composition fallback to equal mole
/// fractions.
pub fn create_feed_stream(spec: &StreamSpec, engine: &FlashEngine) -> Result<StreamState, Vec<String>> {
    let props = &spec.properties;
    if props.is_empty() {
        return Err(vec!["temperature".into(), "pressure".into(), "composition".into()]);
    }

    let t_c = coerce_f64(props.get("temperature").or_else(|| props.get("temperature_c")));
    let p_kpa = coerce_f64(props.get("pressure").or_else(|| props.get("pressure_kpa")));
    let flow_kg_h = coerce_f64(props.get("flow_rate").or_else(|| props.get("mass_flow_kg_per_h")));

    let mut missing = Vec::new();
    if t_c.is_none() {
        missing.push("temperature".to_string());
    }
    if p_kpa.is_none() {
        missing.push("pressure".to_string());
    }
    if !missing.is_empty() {
        return Err(missing);
    }

    let composition: BTreeMap<String, f64> = match props.get("composition") {
        Some(Value::Object(map)) => map
            .iter()
            .filter_map(|(k, v)| v.as_f64().map(|f| (k.clone(), f)))
            .collect(),
        _ => BTreeMap::new(),
    };

    let mut zs: Vec<f64> = Vec::with_capacity(engine.component_names.len());
    for name in engine.component_names.iter() {
        let mut frac = composition.get(name).copied().unwrap_or(0.0);
        if frac == 0.0 {
            if let Some((_, v)) = composition.iter().find(|(k, _)| k.to_lowercase() == name.to_lowercase()) {
                frac = *v;
            }
        }
        zs.push(frac);
    }

    let total: f64 = zs.iter().sum();
    if total <= 0.0 {
        tracing::warn!(
            "stream '{}' has zero composition — falling back to equal mole fractions",
            spec.id
        );
        let n = engine.component_names.len().max(1);
        zs = vec![1.0 / n as f64; n];
    } else {
        zs = zs.into_iter().map(|z| z / total).collect();
    }

    let mass_flow_kg_s = flow_kg_h.filter(|f| *f > 0.0).map(|f| f / 3600.0).unwrap_or(1.0);
    let t_k = t_c.unwrap() + 273.15;
    let p_pa = p_kpa.unwrap() * 1000.0;

    engine
        .create_stream(t_k, p_pa, &zs, mass_flow_kg_s)
        .map_err(|e| vec![format!("flash failed: {e}")])
}

fn handle_str(value: Option<&Value>) -> Option<String> {
    value.and_then(|v| v.as_str()).map(str::to_string)
}

/// Assembles units, connections and feed streams from a payload, returning
/// build-phase warnings alongside the flowsheet (unknown unit types, feed
/// streams dropped for missing data).
pub fn flowsheet_from_payload(payload: &FlowsheetPayload, engine: &FlashEngine) -> SolverResult<(Flowsheet, Vec<String>)> {
    let mut warnings = Vec::new();
    let mut units: BTreeMap<String, UnitOp> = BTreeMap::new();
    let mut unit_kinds: BTreeMap<String, &'static str> = BTreeMap::new();

    for unit_spec in &payload.units {
        match unit_op_from_spec(unit_spec)? {
            Some(op) => {
                unit_kinds.insert(unit_spec.id.clone(), kind_tag(&op.kind));
                units.insert(unit_spec.id.clone(), op);
            }
            None => warnings.push(format!("unknown unit type '{}', skipping unit '{}'", unit_spec.kind, unit_spec.id)),
        }
    }

    let mut assigner = DefaultPortAssigner::new();
    let mut connections: Vec<Connection> = Vec::new();
    for stream_spec in &payload.streams {
        let from_kind = stream_spec.source.as_ref().and_then(|u| unit_kinds.get(u)).copied();
        let to_kind = stream_spec.target.as_ref().and_then(|u| unit_kinds.get(u)).copied();
        let source_handle = handle_str(stream_spec.properties.get("sourceHandle"));
        let target_handle = handle_str(stream_spec.properties.get("targetHandle"));

        let conn = build_connection(
            stream_spec.id.clone(),
            stream_spec.source.clone(),
            source_handle.as_deref(),
            from_kind,
            stream_spec.target.clone(),
            target_handle.as_deref(),
            to_kind,
            &mut assigner,
        );
        connections.push(conn);
    }

    let units_with_incoming: HashSet<&String> = connections
        .iter()
        .filter_map(|c| match (&c.from_unit, &c.to_unit) {
            (Some(from), Some(to)) if units.contains_key(from) && units.contains_key(to) => Some(to),
            _ => None,
        })
        .collect();

    let mut streams: BTreeMap<String, StreamState> = BTreeMap::new();
    let mut feed_streams: BTreeMap<String, StreamState> = BTreeMap::new();

    for stream_spec in &payload.streams {
        let is_external_feed = match &stream_spec.source {
            None => true,
            Some(u) => !units.contains_key(u),
        };
        let is_source_only = stream_spec
            .source
            .as_ref()
            .map(|u| units.contains_key(u) && !units_with_incoming.contains(u))
            .unwrap_or(false);
        let has_thermo_data = stream_spec.properties.get("temperature").is_some()
            && stream_spec.properties.get("composition").is_some();

        if is_external_feed || is_source_only || has_thermo_data {
            match create_feed_stream(stream_spec, engine) {
                Ok(state) => {
                    streams.insert(stream_spec.id.clone(), state.clone());
                    feed_streams.insert(stream_spec.id.clone(), state);
                }
                Err(missing) => {
                    if is_external_feed {
                        warnings.push(format!(
                            "feed stream '{}' dropped: missing {}",
                            stream_spec.id,
                            missing.join(", ")
                        ));
                    }
                }
            }
        }
    }

    Ok((
        Flowsheet {
            units,
            connections,
            feed_streams,
            streams,
        },
        warnings,
    ))
}
