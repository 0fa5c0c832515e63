//! Heater/cooler and two-sided heat exchangers.
//!
//! Grounded on `unit_operations.py`'s `HeaterCoolerOp`/`HeatExchangerOp`/
//! `RatingHeatExchangerOp`, including the Bowman-Mueller-Nagle `Ft`
//! correction factor for 1-shell/2-tube-pass rating.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tf_thermo::{FlashEngine, StreamState};

use crate::error::{UnitOpError, UnitOpResult};
use crate::simple::first_inlet;
use crate::UnitOp;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeaterCoolerParams {
    pub outlet_temperature_c: Option<f64>,
    pub outlet_pressure_kpa: Option<f64>,
    pub duty_kw: Option<f64>,
    pub pressure_drop_kpa: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatExchangerParams {
    pub hot_pressure_drop_kpa: f64,
    pub cold_pressure_drop_kpa: f64,
    pub hot_outlet_temperature_c: Option<f64>,
    pub cold_outlet_temperature_c: Option<f64>,
    pub duty_kw: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingHeatExchangerParams {
    pub base: HeatExchangerParams,
    pub shell_passes: u32,
    pub tube_passes: u32,
    pub u_overall_w_m2k: Option<f64>,
}

pub fn heater_cooler(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &HeaterCoolerParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;

    let mut p_out = match params.outlet_pressure_kpa {
        Some(kpa) if kpa > 0.0 => kpa * 1000.0,
        _ => inlet.p_pa - params.pressure_drop_kpa * 1000.0,
    };
    if p_out <= 0.0 {
        op.warnings.push(format!("pressure drop ({} kPa) exceeds inlet pressure, ignoring", params.pressure_drop_kpa));
        p_out = inlet.p_pa;
    }
    op.pressure_drop_pa = inlet.p_pa - p_out;

    let outlet = if let Some(t_c) = params.outlet_temperature_c {
        let t_out = t_c + 273.15;
        let outlet = engine.pt_flash(t_out, p_out, &inlet.zs, inlet.molar_flow_mol_s)?;
        op.duty_w = inlet.molar_flow_mol_s * (outlet.enthalpy_j_mol - inlet.enthalpy_j_mol);
        outlet
    } else if let Some(duty_kw) = params.duty_kw {
        op.duty_w = duty_kw * 1000.0;
        let h_out = if inlet.molar_flow_mol_s > 0.0 {
            inlet.enthalpy_j_mol + op.duty_w / inlet.molar_flow_mol_s
        } else {
            inlet.enthalpy_j_mol
        };
        match engine.ph_flash(p_out, h_out, &inlet.zs, inlet.molar_flow_mol_s) {
            Ok(outlet) => outlet,
            Err(_) => {
                op.warnings.push("PH flash failed for specified duty, passing through".into());
                op.duty_w = 0.0;
                engine.pt_flash(inlet.t_k, p_out, &inlet.zs, inlet.molar_flow_mol_s)?
            }
        }
    } else {
        op.warnings.push("no outlet T or duty specified, passing through".into());
        op.duty_w = 0.0;
        engine.pt_flash(inlet.t_k, p_out, &inlet.zs, inlet.molar_flow_mol_s)?
    };

    Ok(BTreeMap::from([("out".to_string(), outlet)]))
}

fn hot_cold_inlets<'a>(inlets: &'a BTreeMap<String, StreamState>) -> (Option<&'a StreamState>, Option<&'a StreamState>) {
    let hot = inlets.get("hot_in").or_else(|| inlets.get("hot-in")).or_else(|| inlets.get("in-1"));
    let cold = inlets.get("cold_in").or_else(|| inlets.get("cold-in")).or_else(|| inlets.get("in-2"));
    (hot, cold)
}

fn lmtd(t1: f64, t2: f64, t1_cold: f64, t2_cold: f64) -> Option<f64> {
    let d_t1 = t1 - t2_cold;
    let d_t2 = t2 - t1_cold;
    if d_t1 > 0.0 && d_t2 > 0.0 {
        if (d_t1 - d_t2).abs() > 0.01 {
            Some((d_t1 - d_t2) / (d_t1 / d_t2).ln())
        } else {
            Some((d_t1 + d_t2) / 2.0)
        }
    } else {
        None
    }
}

pub fn heat_exchanger(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &HeatExchangerParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let (hot_in, cold_in) = hot_cold_inlets(inlets);
    let (hot_in, cold_in) = match (hot_in, cold_in) {
        (Some(h), Some(c)) => (h, c),
        _ => {
            let available: Vec<&StreamState> = inlets.values().collect();
            if available.len() == 1 {
                op.warnings.push("only one side connected, treating as heater/cooler".into());
                let hc_params = crate::heat::HeaterCoolerParams {
                    outlet_temperature_c: params.hot_outlet_temperature_c.or(params.cold_outlet_temperature_c),
                    outlet_pressure_kpa: None,
                    duty_kw: params.duty_kw,
                    pressure_drop_kpa: 0.0,
                };
                let result = heater_cooler(op, inlets, engine, &hc_params)?;
                let out = result.get("out").cloned().unwrap_or_else(|| available[0].clone());
                return Ok(BTreeMap::from([("hot_out".to_string(), out.clone()), ("cold_out".to_string(), out)]));
            }
            return Err(UnitOpError::NoInlets(op.id.clone()));
        }
    };

    let p_hot_out = hot_in.p_pa - params.hot_pressure_drop_kpa * 1000.0;
    let p_cold_out = cold_in.p_pa - params.cold_pressure_drop_kpa * 1000.0;

    let (hot_out, cold_out) = if let Some(t_c) = params.hot_outlet_temperature_c {
        let hot_out = engine.pt_flash(t_c + 273.15, p_hot_out, &hot_in.zs, hot_in.molar_flow_mol_s)?;
        let q = hot_in.molar_flow_mol_s * (hot_in.enthalpy_j_mol - hot_out.enthalpy_j_mol);
        op.duty_w = q;
        let h_cold_out = if cold_in.molar_flow_mol_s > 0.0 { cold_in.enthalpy_j_mol + q / cold_in.molar_flow_mol_s } else { cold_in.enthalpy_j_mol };
        let cold_out = engine.ph_flash(p_cold_out, h_cold_out, &cold_in.zs, cold_in.molar_flow_mol_s)?;
        (hot_out, cold_out)
    } else if let Some(t_c) = params.cold_outlet_temperature_c {
        let cold_out = engine.pt_flash(t_c + 273.15, p_cold_out, &cold_in.zs, cold_in.molar_flow_mol_s)?;
        let q = cold_in.molar_flow_mol_s * (cold_out.enthalpy_j_mol - cold_in.enthalpy_j_mol);
        op.duty_w = q;
        let h_hot_out = if hot_in.molar_flow_mol_s > 0.0 { hot_in.enthalpy_j_mol - q / hot_in.molar_flow_mol_s } else { hot_in.enthalpy_j_mol };
        let hot_out = engine.ph_flash(p_hot_out, h_hot_out, &hot_in.zs, hot_in.molar_flow_mol_s)?;
        (hot_out, cold_out)
    } else if let Some(duty_kw) = params.duty_kw {
        let q = duty_kw * 1000.0;
        op.duty_w = q;
        let h_hot_out = if hot_in.molar_flow_mol_s > 0.0 { hot_in.enthalpy_j_mol - q / hot_in.molar_flow_mol_s } else { hot_in.enthalpy_j_mol };
        let hot_out = engine.ph_flash(p_hot_out, h_hot_out, &hot_in.zs, hot_in.molar_flow_mol_s)?;
        let h_cold_out = if cold_in.molar_flow_mol_s > 0.0 { cold_in.enthalpy_j_mol + q / cold_in.molar_flow_mol_s } else { cold_in.enthalpy_j_mol };
        let cold_out = engine.ph_flash(p_cold_out, h_cold_out, &cold_in.zs, cold_in.molar_flow_mol_s)?;
        (hot_out, cold_out)
    } else {
        op.warnings.push("no outlet T or duty specified for HX, passing through".into());
        op.duty_w = 0.0;
        let hot_out = engine.pt_flash(hot_in.t_k, p_hot_out, &hot_in.zs, hot_in.molar_flow_mol_s)?;
        let cold_out = engine.pt_flash(cold_in.t_k, p_cold_out, &cold_in.zs, cold_in.molar_flow_mol_s)?;
        (hot_out, cold_out)
    };

    match lmtd(hot_in.t_k, hot_out.t_k, cold_in.t_k, cold_out.t_k) {
        Some(l) => {
            op.extra.insert("lmtd_k".into(), l);
        }
        None => op.warnings.push("temperature cross detected in heat exchanger".into()),
    }

    Ok(BTreeMap::from([("hot_out".to_string(), hot_out), ("cold_out".to_string(), cold_out)]))
}

/// Bowman-Mueller-Nagle `Ft` correction factor for 1-shell, 2-tube-pass HX.
fn bowman_ft(t1: f64, t2: f64, t1_cold: f64, t2_cold: f64) -> f64 {
    if (t2_cold - t1_cold).abs() < 0.01 {
        return 1.0;
    }
    let r = (t1 - t2) / (t2_cold - t1_cold);
    let p = (t2_cold - t1_cold) / (t1 - t1_cold);
    if p <= 0.0 || p >= 1.0 {
        return 1.0;
    }
    if (r - 1.0).abs() < 0.001 {
        let ft = (p / (1.0 - p)) / ((1.0 + p * (2f64.sqrt() - 1.0)) / (1.0 - p * (2f64.sqrt() - 1.0))).ln();
        return ft.clamp(0.5, 1.0);
    }
    let s = (r * r + 1.0).sqrt();
    let w = (1.0 - p * r) / (1.0 - p);
    if w <= 0.0 {
        return 0.75;
    }
    let num = s * w.ln();
    let den = (r - 1.0) * ((2.0 - p * (r + 1.0 - s)) / (2.0 - p * (r + 1.0 + s))).ln();
    if den.abs() < 1e-10 {
        return 1.0;
    }
    (num / den).clamp(0.5, 1.0)
}

pub fn rating_heat_exchanger(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &RatingHeatExchangerParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let result = heat_exchanger(op, inlets, engine, &params.base)?;
    let (hot_in, cold_in) = hot_cold_inlets(inlets);
    let (Some(hot_in), Some(cold_in)) = (hot_in, cold_in) else {
        return Ok(result);
    };
    let (Some(hot_out), Some(cold_out)) = (result.get("hot_out"), result.get("cold_out")) else {
        return Ok(result);
    };

    let (t1, t2, t1_cold, t2_cold) = (hot_in.t_k, hot_out.t_k, cold_in.t_k, cold_out.t_k);
    let d_t1 = t1 - t2_cold;
    let d_t2 = t2 - t1_cold;
    if d_t1 <= 0.0 || d_t2 <= 0.0 {
        op.warnings.push("temperature cross: LMTD cannot be calculated".into());
        return Ok(result);
    }
    let base_lmtd = if (d_t1 - d_t2).abs() < 0.01 { (d_t1 + d_t2) / 2.0 } else { (d_t1 - d_t2) / (d_t1 / d_t2).ln() };

    let ft = if params.shell_passes <= 1 && params.tube_passes >= 2 { bowman_ft(t1, t2, t1_cold, t2_cold) } else { 1.0 };
    let corrected_lmtd = base_lmtd * ft;

    op.extra.insert("lmtd_k".into(), base_lmtd);
    op.extra.insert("ft_correction".into(), ft);
    op.extra.insert("corrected_lmtd_k".into(), corrected_lmtd);

    if corrected_lmtd > 0.0 {
        let ua = op.duty_w.abs() / corrected_lmtd;
        op.extra.insert("ua_w_per_k".into(), ua);
        if let Some(u) = params.u_overall_w_m2k {
            if u > 0.0 {
                op.extra.insert("area_m2".into(), ua / u);
            }
        }
    }

    Ok(result)
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
    fn heater_cooler_raises_temperature_with_positive_duty() {
        let engine = water_engine();
        let inlet = engine.pt_flash(300.0, 101_325.0, &[1.0], 5.0).unwrap();
        let mut op = UnitOp::new(
            "h1",
            "heater",
            UnitOpKind::HeaterCooler(HeaterCoolerParams { outlet_temperature_c: Some(80.0), ..Default::default() }),
        );
        let mut inlets = Map::new();
        inlets.insert("in".to_string(), inlet);
        let out = op.calculate(&inlets, &engine).unwrap();
        let outlet = out.get("out").unwrap();
        assert!((outlet.t_k - 353.15).abs() < 1e-6);
        assert!(op.duty_w > 0.0);
    }

    #[test]
    fn heater_cooler_without_spec_passes_through_and_warns() {
        let engine = water_engine();
        let inlet = engine.pt_flash(300.0, 101_325.0, &[1.0], 5.0).unwrap();
        let mut op = UnitOp::new("h2", "passthrough", UnitOpKind::HeaterCooler(HeaterCoolerParams::default()));
        let mut inlets = Map::new();
        inlets.insert("in".to_string(), inlet.clone());
        let out = op.calculate(&inlets, &engine).unwrap();
        assert!((out.get("out").unwrap().t_k - inlet.t_k).abs() < 1e-6);
        assert!(!op.warnings.is_empty());
    }

    #[test]
    fn heat_exchanger_transfers_heat_from_hot_to_cold_side() {
        let engine = water_engine();
        let hot = engine.pt_flash(400.0, 200_000.0, &[1.0], 5.0).unwrap();
        let cold = engine.pt_flash(280.0, 200_000.0, &[1.0], 5.0).unwrap();
        let mut op = UnitOp::new(
            "hx1",
            "exchanger",
            UnitOpKind::HeatExchanger(HeatExchangerParams { hot_outlet_temperature_c: Some(320.0 - 273.15), ..Default::default() }),
        );
        let mut inlets = Map::new();
        inlets.insert("hot_in".to_string(), hot.clone());
        inlets.insert("cold_in".to_string(), cold.clone());
        let out = op.calculate(&inlets, &engine).unwrap();
        let hot_out = out.get("hot_out").unwrap();
        let cold_out = out.get("cold_out").unwrap();
        assert!(hot_out.t_k < hot.t_k);
        assert!(cold_out.t_k > cold.t_k);
        assert!(op.duty_w > 0.0);
        assert!(op.extra.contains_key("lmtd_k"));
    }

    #[test]
    fn rating_heat_exchanger_reports_area_when_u_given() {
        let engine = water_engine();
        let hot = engine.pt_flash(400.0, 200_000.0, &[1.0], 5.0).unwrap();
        let cold = engine.pt_flash(280.0, 200_000.0, &[1.0], 5.0).unwrap();
        let mut op = UnitOp::new(
            "rhx1",
            "rated exchanger",
            UnitOpKind::RatingHeatExchanger(RatingHeatExchangerParams {
                base: HeatExchangerParams { hot_outlet_temperature_c: Some(320.0 - 273.15), ..Default::default() },
                shell_passes: 1,
                tube_passes: 2,
                u_overall_w_m2k: Some(500.0),
            }),
        );
        let mut inlets = Map::new();
        inlets.insert("hot_in".to_string(), hot);
        inlets.insert("cold_in".to_string(), cold);
        let _ = op.calculate(&inlets, &engine).unwrap();
        assert!(op.extra.contains_key("area_m2"));
        assert!(op.extra.contains_key("ft_correction"));
    }
}
