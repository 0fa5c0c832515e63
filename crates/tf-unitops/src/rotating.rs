//! Rotating equipment: pump, compressor, polytropic compressor, turbine.
//!
//! All four share the isentropic-then-efficiency-corrected pattern —
//! PS flash to the isentropic outlet, correct the enthalpy rise by the
//! stated efficiency, then PH flash to the actual outlet — grounded on
//! `unit_operations.py`'s `PumpOp`/`CompressorOp`/`TurbineOp`, with the
//! sign convention carried over from the teacher's `turbine.rs`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tf_thermo::{FlashEngine, StreamState};

use crate::error::{UnitOpError, UnitOpResult};
use crate::simple::first_inlet;
use crate::UnitOp;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PumpParams {
    pub outlet_pressure_kpa: Option<f64>,
    pub pressure_rise_kpa: Option<f64>,
    pub efficiency: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompressorParams {
    pub outlet_pressure_kpa: Option<f64>,
    pub pressure_ratio: Option<f64>,
    pub efficiency: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PolytropicCompressorParams {
    pub outlet_pressure_kpa: Option<f64>,
    pub pressure_ratio: Option<f64>,
    pub polytropic_efficiency: Option<f64>,
    pub n_stages: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TurbineParams {
    pub outlet_pressure_kpa: Option<f64>,
    pub pressure_ratio: Option<f64>,
    pub efficiency: Option<f64>,
}

fn isentropic_then_efficiency(
    engine: &FlashEngine,
    inlet: &StreamState,
    p_out: f64,
    eta: f64,
    sign: f64,
) -> UnitOpResult<(StreamState, f64)> {
    let isentropic = engine.ps_flash(p_out, inlet.entropy_j_mol_k, &inlet.zs, inlet.molar_flow_mol_s)?;
    let h_actual = if sign > 0.0 {
        inlet.enthalpy_j_mol + (isentropic.enthalpy_j_mol - inlet.enthalpy_j_mol) / eta
    } else {
        inlet.enthalpy_j_mol - eta * (inlet.enthalpy_j_mol - isentropic.enthalpy_j_mol)
    };
    let outlet = engine.ph_flash(p_out, h_actual, &inlet.zs, inlet.molar_flow_mol_s)?;
    let duty = inlet.molar_flow_mol_s * (h_actual - inlet.enthalpy_j_mol);
    Ok((outlet, duty))
}

pub fn pump(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &PumpParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let eta = params.efficiency.unwrap_or(0.75);
    op.efficiency = Some(eta);

    let mut p_out = if let Some(kpa) = params.outlet_pressure_kpa {
        kpa * 1000.0
    } else if let Some(dp) = params.pressure_rise_kpa {
        inlet.p_pa + dp * 1000.0
    } else {
        op.warnings.push("no outlet pressure specified, assuming 500 kPa rise".into());
        inlet.p_pa + 500_000.0
    };
    if p_out <= inlet.p_pa {
        op.warnings.push("pump outlet pressure <= inlet pressure".into());
        p_out = inlet.p_pa + 100_000.0;
    }
    op.pressure_drop_pa = -(p_out - inlet.p_pa);

    match isentropic_then_efficiency(engine, inlet, p_out, eta, 1.0) {
        Ok((outlet, duty)) => {
            op.duty_w = duty;
            Ok(BTreeMap::from([("out".to_string(), outlet)]))
        }
        Err(_) => {
            op.warnings.push("isentropic calculation failed, using PT flash fallback".into());
            let outlet = engine.pt_flash(inlet.t_k, p_out, &inlet.zs, inlet.molar_flow_mol_s)?;
            op.duty_w = inlet.molar_flow_mol_s * (outlet.enthalpy_j_mol - inlet.enthalpy_j_mol);
            Ok(BTreeMap::from([("out".to_string(), outlet)]))
        }
    }
}

pub fn compressor(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &CompressorParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let eta = params.efficiency.unwrap_or(0.80);
    op.efficiency = Some(eta);

    let p_out = if let Some(kpa) = params.outlet_pressure_kpa {
        kpa * 1000.0
    } else if let Some(ratio) = params.pressure_ratio {
        inlet.p_pa * ratio
    } else {
        op.warnings.push("no outlet pressure or ratio specified, assuming ratio 3.0".into());
        inlet.p_pa * 3.0
    };
    op.pressure_drop_pa = -(p_out - inlet.p_pa);

    match isentropic_then_efficiency(engine, inlet, p_out, eta, 1.0) {
        Ok((outlet, duty)) => {
            op.duty_w = duty;
            Ok(BTreeMap::from([("out".to_string(), outlet)]))
        }
        Err(_) => {
            op.warnings.push("isentropic calculation failed, using PT flash fallback".into());
            let outlet = engine.pt_flash(inlet.t_k, p_out, &inlet.zs, inlet.molar_flow_mol_s)?;
            op.duty_w = inlet.molar_flow_mol_s * (outlet.enthalpy_j_mol - inlet.enthalpy_j_mol);
            Ok(BTreeMap::from([("out".to_string(), outlet)]))
        }
    }
}

pub fn turbine(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &TurbineParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let eta = params.efficiency.unwrap_or(0.80);
    op.efficiency = Some(eta);

    let p_out = if let Some(kpa) = params.outlet_pressure_kpa {
        kpa * 1000.0
    } else if let Some(ratio) = params.pressure_ratio {
        inlet.p_pa / ratio
    } else {
        op.warnings.push("no outlet pressure specified, assuming ratio 3.0".into());
        inlet.p_pa / 3.0
    };
    op.pressure_drop_pa = inlet.p_pa - p_out;

    let (outlet, duty) = isentropic_then_efficiency(engine, inlet, p_out, eta, -1.0)?;
    op.duty_w = duty;
    Ok(BTreeMap::from([("out".to_string(), outlet)]))
}

pub fn polytropic_compressor(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &PolytropicCompressorParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let eta_p = params.polytropic_efficiency.unwrap_or(0.80);
    op.efficiency = Some(eta_p);

    let p_out = if let Some(kpa) = params.outlet_pressure_kpa {
        kpa * 1000.0
    } else if let Some(ratio) = params.pressure_ratio {
        inlet.p_pa * ratio
    } else {
        op.warnings.push("no outlet pressure specified, assuming ratio 3.0".into());
        inlet.p_pa * 3.0
    };
    op.pressure_drop_pa = -(p_out - inlet.p_pa);

    let n_stages = params.n_stages.max(1);
    if n_stages > 1 {
        let stage_ratio = (p_out / inlet.p_pa).powf(1.0 / n_stages as f64);
        let mut current = inlet.clone();
        let mut total_work = 0.0;
        for stage in 0..n_stages {
            let p_stage_out = current.p_pa * stage_ratio;
            let (stage_out, work) = isentropic_then_efficiency(engine, &current, p_stage_out, eta_p, 1.0)?;
            total_work += work;
            current = if stage < n_stages - 1 {
                engine.pt_flash(inlet.t_k, p_stage_out, &current.zs, current.molar_flow_mol_s)?
            } else {
                stage_out
            };
        }
        op.duty_w = total_work;
        op.extra.insert("stage_pressure_ratio".into(), stage_ratio);
        Ok(BTreeMap::from([("out".to_string(), current)]))
    } else {
        let (outlet, duty) = isentropic_then_efficiency(engine, inlet, p_out, eta_p, 1.0)?;
        op.duty_w = duty;
        Ok(BTreeMap::from([("out".to_string(), outlet)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;
    use tf_thermo::{builtin_registry, PackageKind};

    fn water_engine() -> FlashEngine {
        let comps: Vec<_> = builtin_registry().into_iter().filter(|c| c.name == "water").collect();
        FlashEngine::new(PackageKind::IapwsWater, comps, None)
    }

    #[test]
    fn compressor_raises_pressure_with_positive_duty() {
        let engine = water_engine();
        let inlet = engine.pt_flash(400.0, 101_325.0, &[1.0], 5.0).unwrap();
        let mut op = UnitOp::new(
            "c1",
            "compressor",
            UnitOpKind::Compressor(CompressorParams { pressure_ratio: Some(2.5), efficiency: Some(0.8), ..Default::default() }),
        );
        let mut inlets = Map::new();
        inlets.insert("in".to_string(), inlet.clone());
        let out = op.calculate(&inlets, &engine).unwrap();
        let outlet = out.get("out").unwrap();
        assert!((outlet.p_pa - inlet.p_pa * 2.5).abs() < 1.0);
        assert!(op.duty_w > 0.0);
        assert!(op.pressure_drop_pa < 0.0);
    }

    #[test]
    fn turbine_drops_pressure_and_extracts_positive_work() {
        let engine = water_engine();
        let inlet = engine.pt_flash(500.0, 1_000_000.0, &[1.0], 5.0).unwrap();
        let mut op = UnitOp::new(
            "t1",
            "turbine",
            UnitOpKind::Turbine(TurbineParams { pressure_ratio: Some(4.0), efficiency: Some(0.8), ..Default::default() }),
        );
        let mut inlets = Map::new();
        inlets.insert("in".to_string(), inlet.clone());
        let out = op.calculate(&inlets, &engine).unwrap();
        let outlet = out.get("out").unwrap();
        assert!((outlet.p_pa - inlet.p_pa / 4.0).abs() < 1.0);
        assert!(op.pressure_drop_pa > 0.0);
        // the fluid gives up energy to the turbine: outlet enthalpy is lower
        assert!(outlet.enthalpy_j_mol < inlet.enthalpy_j_mol);
    }

    #[test]
    fn polytropic_compressor_multistage_matches_single_stage_pressure_rise() {
        let engine = water_engine();
        let inlet = engine.pt_flash(400.0, 101_325.0, &[1.0], 5.0).unwrap();
        let mut op = UnitOp::new(
            "pc1",
            "multistage compressor",
            UnitOpKind::PolytropicCompressor(PolytropicCompressorParams {
                pressure_ratio: Some(9.0),
                polytropic_efficiency: Some(0.8),
                n_stages: 3,
                ..Default::default()
            }),
        );
        let mut inlets = Map::new();
        inlets.insert("in".to_string(), inlet.clone());
        let out = op.calculate(&inlets, &engine).unwrap();
        let outlet = out.get("out").unwrap();
        assert!((outlet.p_pa - inlet.p_pa * 9.0).abs() < 10.0);
        assert!(op.duty_w > 0.0);
        assert!(op.extra.contains_key("stage_pressure_ratio"));
    }

    #[test]
    fn pump_without_spec_falls_back_to_default_rise_and_warns() {
        let engine = water_engine();
        let inlet = engine.pt_flash(300.0, 101_325.0, &[1.0], 10.0).unwrap();
        let mut op = UnitOp::new("p2", "unspecified pump", UnitOpKind::Pump(PumpParams::default()));
        let mut inlets = Map::new();
        inlets.insert("in".to_string(), inlet);
        let out = op.calculate(&inlets, &engine).unwrap();
        assert!(out.get("out").unwrap().p_pa > 101_325.0);
        assert!(!op.warnings.is_empty());
    }
}
