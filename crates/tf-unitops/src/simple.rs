//! Mixer, splitter and throttling valve — the unit ops with no rotating
//! equipment or reaction chemistry behind them.
//!
//! Grounded on `unit_operations.py`'s `MixerOp`/`SplitterOp`/`ValveOp`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tf_thermo::{FlashEngine, StreamState};

use crate::error::{UnitOpError, UnitOpResult};
use crate::UnitOp;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MixerParams {
    pub outlet_pressure_kpa: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterParams {
    pub fractions: Vec<f64>,
}

impl Default for SplitterParams {
    fn default() -> Self {
        Self { fractions: vec![0.5, 0.5] }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ValveParams {
    pub outlet_pressure_kpa: Option<f64>,
    pub pressure_drop_kpa: Option<f64>,
}

/// Adiabatic mixer: flow-weighted composition/enthalpy blend, PH flash at
/// `min(inlet pressures)` (or the specified outlet pressure).
pub fn mixer(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &MixerParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    if inlets.is_empty() {
        return Err(UnitOpError::NoInlets(op.id.clone()));
    }
    let streams: Vec<&StreamState> = inlets.values().collect();
    let total_flow: f64 = streams.iter().map(|s| s.molar_flow_mol_s).sum();
    if total_flow <= 0.0 {
        op.warnings.push("mixer has zero total flow".into());
        return Ok(BTreeMap::from([("out".to_string(), streams[0].clone())]));
    }

    let n = engine.n();
    let mut zs_mix = vec![0.0; n];
    for s in &streams {
        for (i, z) in s.zs.iter().enumerate() {
            zs_mix[i] += z * s.molar_flow_mol_s;
        }
    }
    for z in &mut zs_mix {
        *z /= total_flow;
    }

    let h_mix: f64 = streams.iter().map(|s| s.molar_flow_mol_s * s.enthalpy_j_mol).sum::<f64>() / total_flow;
    let p_out = params
        .outlet_pressure_kpa
        .map(|kpa| kpa * 1000.0)
        .unwrap_or_else(|| streams.iter().map(|s| s.p_pa).fold(f64::INFINITY, f64::min));

    let outlet = engine.ph_flash(p_out, h_mix, &zs_mix, total_flow)?;
    op.duty_w = 0.0;
    Ok(BTreeMap::from([("out".to_string(), outlet)]))
}

/// Splits one inlet into N outlets at identical intensive state.
pub fn splitter(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    params: &SplitterParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;

    let sum: f64 = params.fractions.iter().sum();
    let fractions: Vec<f64> = if (sum - 1.0).abs() > 0.01 {
        op.warnings.push(format!("split fractions sum to {sum:.4}, normalizing to 1.0"));
        params.fractions.iter().map(|f| f / sum).collect()
    } else {
        params.fractions.clone()
    };

    let mut outlets = BTreeMap::new();
    for (i, frac) in fractions.iter().enumerate() {
        let mut out = inlet.clone();
        out.molar_flow_mol_s = inlet.molar_flow_mol_s * frac;
        out.mass_flow_kg_s = inlet.mass_flow_kg_s * frac;
        outlets.insert(format!("out-{}", i + 1), out);
    }
    Ok(outlets)
}

/// Isenthalpic expansion — PH flash at the lower outlet pressure.
pub fn valve(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &ValveParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;

    let mut p_out = if let Some(kpa) = params.outlet_pressure_kpa {
        kpa * 1000.0
    } else if let Some(dp) = params.pressure_drop_kpa {
        inlet.p_pa - dp * 1000.0
    } else {
        op.warnings.push("no outlet pressure specified, assuming 50 kPa drop".into());
        inlet.p_pa - 50_000.0
    };
    if p_out <= 0.0 {
        op.warnings.push("calculated outlet P <= 0, clamping to 1 atm".into());
        p_out = 101_325.0;
    }
    op.pressure_drop_pa = inlet.p_pa - p_out;

    let outlet = engine.ph_flash(p_out, inlet.enthalpy_j_mol, &inlet.zs, inlet.molar_flow_mol_s)?;
    op.duty_w = 0.0;
    Ok(BTreeMap::from([("out".to_string(), outlet)]))
}

pub fn first_inlet(inlets: &BTreeMap<String, StreamState>) -> Option<&StreamState> {
    inlets.values().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_thermo::{builtin_registry, PackageKind};

    fn water_engine() -> FlashEngine {
        let comps: Vec<_> = builtin_registry().into_iter().filter(|c| c.name == "water").collect();
        FlashEngine::new(PackageKind::IapwsWater, comps, None)
    }

    #[test]
    fn mixer_blends_two_streams_at_the_lower_pressure() {
        let engine = water_engine();
        let a = engine.pt_flash(300.0, 300_000.0, &[1.0], 5.0).unwrap();
        let b = engine.pt_flash(350.0, 200_000.0, &[1.0], 3.0).unwrap();
        let mut op = UnitOp::new("m1", "mixer", UnitOpKind::Mixer(MixerParams::default()));
        let mut inlets = BTreeMap::new();
        inlets.insert("in-1".to_string(), a.clone());
        inlets.insert("in-2".to_string(), b.clone());
        let out = op.calculate(&inlets, &engine).unwrap();
        let outlet = out.get("out").unwrap();
        assert!((outlet.molar_flow_mol_s - 8.0).abs() < 1e-9);
        assert!((outlet.p_pa - 200_000.0).abs() < 1.0);
    }

    #[test]
    fn mixer_on_empty_inlets_errors() {
        let engine = water_engine();
        let mut op = UnitOp::new("m2", "mixer", UnitOpKind::Mixer(MixerParams::default()));
        let inlets = BTreeMap::new();
        assert!(op.calculate(&inlets, &engine).is_err());
    }

    #[test]
    fn splitter_normalizes_fractions_that_do_not_sum_to_one() {
        let engine = water_engine();
        let inlet = engine.pt_flash(300.0, 101_325.0, &[1.0], 10.0).unwrap();
        let mut op = UnitOp::new("s1", "splitter", UnitOpKind::Splitter(SplitterParams { fractions: vec![1.0, 1.0] }));
        let mut inlets = BTreeMap::new();
        inlets.insert("in".to_string(), inlet);
        let out = op.calculate(&inlets, &engine).unwrap();
        assert!(!op.warnings.is_empty());
        let total: f64 = out.values().map(|s| s.molar_flow_mol_s).sum();
        assert!((total - 10.0).abs() < 1e-6);
        assert!((out.get("out-1").unwrap().molar_flow_mol_s - 5.0).abs() < 1e-6);
    }

    #[test]
    fn valve_drops_pressure_isenthalpically() {
        let engine = water_engine();
        let inlet = engine.pt_flash(400.0, 1_000_000.0, &[1.0], 5.0).unwrap();
        let mut op = UnitOp::new(
            "v1",
            "valve",
            UnitOpKind::Valve(ValveParams { pressure_drop_kpa: Some(300.0), ..Default::default() }),
        );
        let mut inlets = BTreeMap::new();
        inlets.insert("in".to_string(), inlet.clone());
        let out = op.calculate(&inlets, &engine).unwrap();
        let outlet = out.get("out").unwrap();
        assert!((outlet.p_pa - (inlet.p_pa - 300_000.0)).abs() < 1.0);
        assert!((outlet.enthalpy_j_mol - inlet.enthalpy_j_mol).abs() < 1e-3);
    }

    #[test]
    fn valve_without_spec_defaults_to_50kpa_drop_and_warns() {
        let engine = water_engine();
        let inlet = engine.pt_flash(400.0, 1_000_000.0, &[1.0], 5.0).unwrap();
        let mut op = UnitOp::new("v2", "unspecified valve", UnitOpKind::Valve(ValveParams::default()));
        let mut inlets = BTreeMap::new();
        inlets.insert("in".to_string(), inlet.clone());
        let out = op.calculate(&inlets, &engine).unwrap();
        assert!((out.get("out").unwrap().p_pa - (inlet.p_pa - 50_000.0)).abs() < 1.0);
        assert!(!op.warnings.is_empty());
    }
}
