//! Flash drum (2-phase) and 3-phase separators.
//!
//! Grounded on `unit_operations.py`'s `FlashDrumOp`/`ThreePhaseSeparatorOp`;
//! the 3-phase split reuses `FlashEngine::vlle_flash`'s composition-based
//! water/oil heuristic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tf_thermo::{FlashEngine, StreamState};

use crate::error::{UnitOpError, UnitOpResult};
use crate::simple::first_inlet;
use crate::UnitOp;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FlashDrumParams {
    pub temperature_c: Option<f64>,
    pub pressure_kpa: Option<f64>,
}

pub type ThreePhaseSeparatorParams = FlashDrumParams;

fn drum_conditions(inlet: &StreamState, params: &FlashDrumParams) -> (f64, f64) {
    let t = params.temperature_c.map(|c| c + 273.15).unwrap_or(inlet.t_k);
    let p = params.pressure_kpa.map(|kpa| kpa * 1000.0).unwrap_or(inlet.p_pa);
    (t, p)
}

pub fn flash_drum(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &FlashDrumParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let (t_drum, p_drum) = drum_conditions(inlet, params);

    let flash = engine.pt_flash(t_drum, p_drum, &inlet.zs, inlet.molar_flow_mol_s)?;

    let vapor = if flash.vapor_fraction > 0.0001 {
        let ys = flash.ys.clone().unwrap_or_else(|| inlet.zs.clone());
        engine.pt_flash(t_drum, p_drum, &ys, inlet.molar_flow_mol_s * flash.vapor_fraction)?
    } else {
        zero_flow_like(&flash, true)
    };

    let liquid = if flash.liquid_fraction > 0.0001 {
        let xs = flash.xs.clone().unwrap_or_else(|| inlet.zs.clone());
        engine.pt_flash(t_drum, p_drum, &xs, inlet.molar_flow_mol_s * flash.liquid_fraction)?
    } else {
        zero_flow_like(&flash, false)
    };

    op.duty_w = 0.0;
    let dp = inlet.p_pa - p_drum;
    op.pressure_drop_pa = dp.max(0.0);

    Ok(BTreeMap::from([("vapor".to_string(), vapor), ("liquid".to_string(), liquid)]))
}

pub fn three_phase_separator(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &ThreePhaseSeparatorParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let (t, p) = drum_conditions(inlet, params);

    let result = engine.vlle_flash(t, p, &inlet.zs, inlet.molar_flow_mol_s)?;
    if result.liquid2.molar_flow_mol_s > 0.0 {
        op.warnings.push(
            "3-phase split approximated via composition; true VLLE requires a more rigorous treatment".into(),
        );
    }
    op.duty_w = 0.0;
    Ok(BTreeMap::from([
        ("gas".to_string(), result.gas),
        ("oil".to_string(), result.liquid1),
        ("water".to_string(), result.liquid2),
    ]))
}

fn zero_flow_like(template: &StreamState, vapor: bool) -> StreamState {
    let mut s = template.clone();
    s.molar_flow_mol_s = 0.0;
    s.mass_flow_kg_s = 0.0;
    s.vapor_fraction = if vapor { 1.0 } else { 0.0 };
    s.liquid_fraction = if vapor { 0.0 } else { 1.0 };
    s.phase = if vapor { tf_thermo::Phase::Vapor } else { tf_thermo::Phase::Liquid };
    s
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_thermo::{builtin_registry, PackageKind};

    fn mixture_engine(names: &[&str]) -> FlashEngine {
        let comps: Vec<_> = builtin_registry().into_iter().filter(|c| names.contains(&c.name.as_str())).collect();
        FlashEngine::new(PackageKind::Pr, comps, None)
    }

    #[test]
    fn flash_drum_splits_benzene_toluene_feed_into_vapor_and_liquid() {
        let engine = mixture_engine(&["benzene", "toluene"]);
        let inlet = engine.pt_flash(373.15, 101_325.0, &[0.5, 0.5], 100.0).unwrap();
        let mut op = UnitOp::new("fd1", "flash drum", UnitOpKind::FlashDrum(FlashDrumParams::default()));
        let mut inlets = BTreeMap::new();
        inlets.insert("in".to_string(), inlet.clone());
        let out = op.calculate(&inlets, &engine).unwrap();
        let vapor = out.get("vapor").unwrap();
        let liquid = out.get("liquid").unwrap();
        let total = vapor.molar_flow_mol_s + liquid.molar_flow_mol_s;
        assert!((total - 100.0).abs() < 1e-3);
    }

    #[test]
    fn three_phase_separator_routes_water_rich_stream_to_the_water_outlet() {
        let engine = mixture_engine(&["methane", "n-hexane", "water"]);
        let idx_methane = engine.component_names.iter().position(|n| n == "methane").unwrap();
        let idx_hexane = engine.component_names.iter().position(|n| n == "n-hexane").unwrap();
        let idx_water = engine.component_names.iter().position(|n| n == "water").unwrap();
        let mut zs = vec![0.0; engine.n()];
        zs[idx_methane] = 0.3;
        zs[idx_hexane] = 0.4;
        zs[idx_water] = 0.3;
        let inlet = engine.pt_flash(333.15, 4_000_000.0, &zs, 100.0).unwrap();
        let mut op = UnitOp::new("tps1", "3-phase separator", UnitOpKind::ThreePhaseSeparator(FlashDrumParams::default()));
        let mut inlets = BTreeMap::new();
        inlets.insert("in".to_string(), inlet);
        let out = op.calculate(&inlets, &engine).unwrap();
        let water = out.get("water").unwrap();
        if water.molar_flow_mol_s > 0.0 {
            let water_z = water.zs[idx_water];
            assert!(water_z > water.zs[idx_methane] && water_z > water.zs[idx_hexane]);
        }
    }
}
