//! Shortcut (Fenske-Underwood-Gilliland) and rigorous (Inside-Out) distillation.
//!
//! Grounded on `unit_operations.py`'s `ShortcutDistillationOp` and
//! `rigorous_distillation.py`'s Inside-Out method.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tf_thermo::{FlashEngine, StreamState};

use crate::error::{UnitOpError, UnitOpResult};
use crate::reaction::resolve_component;
use crate::simple::first_inlet;
use crate::UnitOp;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShortcutDistillationParams {
    pub light_key: Option<String>,
    pub heavy_key: Option<String>,
    pub light_key_recovery: Option<f64>,
    pub heavy_key_recovery: Option<f64>,
    pub reflux_ratio_multiple: Option<f64>,
    pub condenser_pressure_kpa: Option<f64>,
    pub reboiler_pressure_kpa: Option<f64>,
    pub n_stages_override: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigorousDistillationParams {
    pub n_trays: usize,
    pub feed_tray: usize,
    pub reflux_ratio: f64,
    pub distillate_rate_mol_s: f64,
    pub condenser_pressure_kpa: f64,
    pub pressure_drop_per_tray_kpa: f64,
}

impl Default for RigorousDistillationParams {
    fn default() -> Self {
        Self {
            n_trays: 10,
            feed_tray: 5,
            reflux_ratio: 2.0,
            distillate_rate_mol_s: 1.0,
            condenser_pressure_kpa: 101.325,
            pressure_drop_per_tray_kpa: 0.5,
        }
    }
}

fn alpha_at(engine: &FlashEngine, lk_idx: usize, hk_idx: usize, t: f64) -> Option<f64> {
    let p_lk = engine.components[lk_idx].antoine.psat(t)?;
    let p_hk = engine.components[hk_idx].antoine.psat(t)?;
    if p_hk > 0.0 { Some(p_lk / p_hk) } else { None }
}

pub fn shortcut_distillation(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &ShortcutDistillationParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let lk_recovery = params.light_key_recovery.unwrap_or(0.99);
    let hk_recovery = params.heavy_key_recovery.unwrap_or(0.99);
    let rr_multiple = params.reflux_ratio_multiple.unwrap_or(1.3);
    let p_cond = params.condenser_pressure_kpa.map(|k| k * 1000.0).unwrap_or(inlet.p_pa);
    let p_reb = params.reboiler_pressure_kpa.map(|k| k * 1000.0).unwrap_or(p_cond * 1.1);

    let (lk_idx, hk_idx) = match (&params.light_key, &params.heavy_key) {
        (Some(lk), Some(hk)) => {
            let lk_idx = resolve_component(lk, &engine.component_names)
                .and_then(|n| engine.component_names.iter().position(|c| c == n));
            let hk_idx = resolve_component(hk, &engine.component_names)
                .and_then(|n| engine.component_names.iter().position(|c| c == n));
            match (lk_idx, hk_idx) {
                (Some(l), Some(h)) => (l, h),
                _ => {
                    op.warnings.push(format!("key components not found: LK={lk}, HK={hk}"));
                    return Ok(BTreeMap::from([("distillate".to_string(), inlet.clone()), ("bottoms".to_string(), inlet.clone())]));
                }
            }
        }
        _ => {
            if engine.n() < 2 {
                op.warnings.push("need at least 2 components for distillation".into());
                return Ok(BTreeMap::from([("distillate".to_string(), inlet.clone()), ("bottoms".to_string(), inlet.clone())]));
            }
            let mut sorted: Vec<usize> = (0..engine.n()).collect();
            sorted.sort_by(|&a, &b| engine.components[a].tb.partial_cmp(&engine.components[b].tb).unwrap());
            let mid = sorted.len() / 2;
            let (l, h) = (sorted[mid.saturating_sub(1)], sorted[mid]);
            op.warnings.push(format!(
                "auto-detected keys: LK={}, HK={}",
                engine.component_names[l], engine.component_names[h]
            ));
            (l, h)
        }
    };

    let alpha_feed = alpha_at(engine, lk_idx, hk_idx, inlet.t_k);
    let alpha_top = alpha_at(engine, lk_idx, hk_idx, engine.components[lk_idx].tb);
    let alpha_bot = alpha_at(engine, lk_idx, hk_idx, engine.components[hk_idx].tb);
    let alphas: Vec<f64> = [alpha_top, alpha_feed, alpha_bot].into_iter().flatten().filter(|a| *a > 0.0).collect();
    let mut alpha = if alphas.len() >= 2 {
        (alphas.iter().map(|a| a.ln()).sum::<f64>() / alphas.len() as f64).exp()
    } else if let Some(a) = alphas.first() {
        *a
    } else {
        op.warnings.push("relative volatility estimation failed, using alpha=2.0".into());
        2.0
    };
    if alpha <= 1.0 {
        op.warnings.push("relative volatility <= 1, adjusted to 1.1".into());
        alpha = 1.1;
    }

    let feed_flows: Vec<f64> = inlet.zs.iter().map(|z| z * inlet.molar_flow_mol_s).collect();
    let mut d_flows = vec![0.0; engine.n()];
    let mut b_flows = vec![0.0; engine.n()];

    d_flows[lk_idx] = feed_flows[lk_idx] * lk_recovery;
    b_flows[lk_idx] = feed_flows[lk_idx] * (1.0 - lk_recovery);
    d_flows[hk_idx] = feed_flows[hk_idx] * (1.0 - hk_recovery);
    b_flows[hk_idx] = feed_flows[hk_idx] * hk_recovery;

    for i in 0..engine.n() {
        if i == lk_idx || i == hk_idx {
            continue;
        }
        let alpha_i = match alpha_at(engine, i, hk_idx, inlet.t_k) {
            Some(a) => a,
            None => 1.0,
        };
        if alpha_i > alpha {
            d_flows[i] = feed_flows[i] * 0.999;
            b_flows[i] = feed_flows[i] * 0.001;
        } else if alpha_i < 1.0 {
            d_flows[i] = feed_flows[i] * 0.001;
            b_flows[i] = feed_flows[i] * 0.999;
        } else {
            let frac_d = alpha_i / (1.0 + alpha_i);
            d_flows[i] = feed_flows[i] * frac_d;
            b_flows[i] = feed_flows[i] * (1.0 - frac_d);
        }
    }

    let d_total: f64 = d_flows.iter().sum();
    let b_total: f64 = b_flows.iter().sum();
    let x_lk_d = d_flows[lk_idx] / d_total.max(1e-30);
    let x_hk_d = d_flows[hk_idx] / d_total.max(1e-30);
    let x_lk_b = b_flows[lk_idx] / b_total.max(1e-30);
    let x_hk_b = b_flows[hk_idx] / b_total.max(1e-30);

    let n_min = if x_lk_d > 0.0 && x_hk_b > 0.0 && x_hk_d > 0.0 && x_lk_b > 0.0 {
        ((x_lk_d / x_hk_d) * (x_hk_b / x_lk_b)).ln() / alpha.ln()
    } else {
        10.0
    };

    let x_lk_f = inlet.zs[lk_idx];
    let x_hk_f = inlet.zs[hk_idx];
    let r_min = if x_lk_f > 0.0 && x_hk_f > 0.0 {
        ((1.0 / (alpha - 1.0)) * (x_lk_d / x_lk_f - alpha * x_hk_d / x_hk_f)).max(0.1)
    } else {
        1.0
    };
    let r_actual = r_min * rr_multiple;

    let n_actual = if let Some(n) = params.n_stages_override {
        n as f64
    } else {
        let x = (r_actual - r_min) / (r_actual + 1.0);
        let y = 1.0 - (((1.0 + 54.4 * x) / (11.0 + 117.2 * x)) * (x - 1.0) / x.sqrt()).exp();
        if y.is_finite() && y < 1.0 {
            ((n_min + y) / (1.0 - y)).ceil().max(n_min + 2.0)
        } else {
            n_min * 2.0 + 2.0
        }
    };

    let zs_d = if d_total > 0.0 { d_flows.iter().map(|f| f / d_total).collect() } else { inlet.zs.clone() };
    let zs_b = if b_total > 0.0 { b_flows.iter().map(|f| f / b_total).collect() } else { inlet.zs.clone() };

    let distillate = match engine.bubble_point_t(p_cond, &zs_d) {
        Ok(t) => engine.pt_flash(t, p_cond, &zs_d, d_total)?,
        Err(_) => engine.pt_flash((inlet.t_k - 20.0).max(100.0), p_cond, &zs_d, d_total)?,
    };
    let bottoms = match engine.bubble_point_t(p_reb, &zs_b) {
        Ok(t) => engine.pt_flash(t, p_reb, &zs_b, b_total)?,
        Err(_) => engine.pt_flash(inlet.t_k + 20.0, p_reb, &zs_b, b_total)?,
    };

    let h_feed = inlet.molar_flow_mol_s * inlet.enthalpy_j_mol;
    let h_dist = d_total * distillate.enthalpy_j_mol;
    let h_bott = b_total * bottoms.enthalpy_j_mol;
    let q_cond = -(d_total * (r_actual + 1.0) * distillate.enthalpy_j_mol.abs());
    let q_reb = h_dist + h_bott - h_feed - q_cond;
    op.duty_w = q_reb;

    op.extra.insert("n_min_stages".into(), n_min);
    op.extra.insert("n_actual_stages".into(), n_actual);
    op.extra.insert("reflux_ratio_min".into(), r_min);
    op.extra.insert("reflux_ratio_actual".into(), r_actual);
    op.extra.insert("relative_volatility".into(), alpha);
    op.extra.insert("condenser_duty_w".into(), q_cond);
    op.extra.insert("reboiler_duty_w".into(), q_reb);

    Ok(BTreeMap::from([("distillate".to_string(), distillate), ("bottoms".to_string(), bottoms)]))
}

/// Thomas-algorithm solve of a tridiagonal system `a*x[i-1] + b*x[i] + c*x[i+1] = d`.
fn thomas_solve(a: &[f64], b: &[f64], c: &[f64], d: &[f64]) -> Vec<f64> {
    let n = b.len();
    let mut cp = vec![0.0; n];
    let mut dp = vec![0.0; n];
    cp[0] = c[0] / b[0];
    dp[0] = d[0] / b[0];
    for i in 1..n {
        let m = b[i] - a[i] * cp[i - 1];
        cp[i] = if i < n - 1 { c[i] / m } else { 0.0 };
        dp[i] = (d[i] - a[i] * dp[i - 1]) / m;
    }
    let mut x = vec![0.0; n];
    x[n - 1] = dp[n - 1];
    for i in (0..n - 1).rev() {
        x[i] = dp[i] - cp[i] * x[i + 1];
    }
    x
}

/// Rigorous tray-by-tray (MESH) solve via the Inside-Out method: Wilson
/// K-values seed a bubble-point temperature profile, component material
/// balances are swept tray-by-tray via the tridiagonal Thomas algorithm,
/// and the temperature profile is updated to bubble point each outer pass.
pub fn rigorous_distillation(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &RigorousDistillationParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let n_trays = params.n_trays.max(2);
    let feed_tray = params.feed_tray.min(n_trays - 1);
    let n_comp = engine.n();

    let pressures: Vec<f64> = (0..n_trays)
        .map(|i| params.condenser_pressure_kpa * 1000.0 + i as f64 * params.pressure_drop_per_tray_kpa * 1000.0)
        .collect();

    let mut temps = vec![inlet.t_k; n_trays];
    let feed_flow = inlet.molar_flow_mol_s;
    let d = params.distillate_rate_mol_s.min(feed_flow * 0.999).max(1e-6);
    let bottoms_flow = (feed_flow - d).max(1e-6);
    let l_below_feed = params.reflux_ratio * d + feed_flow;
    let v_vapor: f64 = d * (params.reflux_ratio + 1.0);

    let liquid_flow: Vec<f64> = (0..n_trays)
        .map(|i| if i < feed_tray { params.reflux_ratio * d } else { l_below_feed })
        .collect();
    let vapor_flow: Vec<f64> = vec![v_vapor; n_trays];

    let mut x_profile = vec![inlet.zs.clone(); n_trays];

    for _outer in 0..30 {
        for comp in 0..n_comp {
            let mut a = vec![0.0; n_trays];
            let mut b = vec![0.0; n_trays];
            let mut c = vec![0.0; n_trays];
            let mut rhs = vec![0.0; n_trays];

            for i in 0..n_trays {
                let ks = wilson_k(engine, comp, temps[i], pressures[i]);
                let l = liquid_flow[i];
                let v = vapor_flow[i];

                b[i] = -(l + v * ks);
                if i > 0 {
                    a[i] = liquid_flow[i - 1];
                }
                if i < n_trays - 1 {
                    let k_above = wilson_k(engine, comp, temps[i + 1], pressures[i + 1]);
                    c[i] = vapor_flow[i + 1] * k_above;
                }
                rhs[i] = if i == feed_tray { -feed_flow * inlet.zs[comp] } else { 0.0 };
            }
            b[0] -= liquid_flow[0];
            b[n_trays - 1] -= vapor_flow[n_trays - 1] * wilson_k(engine, comp, temps[n_trays - 1], pressures[n_trays - 1]);

            let solved = thomas_solve(&a, &b, &c, &rhs);
            for i in 0..n_trays {
                x_profile[i][comp] = solved[i].max(0.0);
            }
        }

        for i in 0..n_trays {
            let total: f64 = x_profile[i].iter().sum();
            if total > 0.0 {
                for v in x_profile[i].iter_mut() {
                    *v /= total;
                }
            }
            if let Ok(t) = engine.bubble_point_t(pressures[i], &x_profile[i]) {
                temps[i] = t;
            }
        }
    }

    let distillate = engine.pt_flash(temps[0], pressures[0], &x_profile[0], d)?;
    let bottoms = engine.pt_flash(temps[n_trays - 1], pressures[n_trays - 1], &x_profile[n_trays - 1], bottoms_flow)?;

    let q_cond = -v_vapor * distillate.enthalpy_j_mol.abs();
    let h_feed = feed_flow * inlet.enthalpy_j_mol;
    let q_reb = d * distillate.enthalpy_j_mol + bottoms_flow * bottoms.enthalpy_j_mol - h_feed - q_cond;
    op.duty_w = q_reb;
    op.extra.insert("condenser_duty_w".into(), q_cond);
    op.extra.insert("reboiler_duty_w".into(), q_reb);
    for (i, t) in temps.iter().enumerate() {
        op.extra.insert(format!("tray_{i}_temperature_k"), *t);
    }

    Ok(BTreeMap::from([("distillate".to_string(), distillate), ("bottoms".to_string(), bottoms)]))
}

fn wilson_k(engine: &FlashEngine, comp: usize, t: f64, p: f64) -> f64 {
    let c = &engine.components[comp];
    let tr = c.tc / t;
    ((c.pc / p) * (5.373 * (1.0 + c.omega) * (1.0 - tr)).exp()).max(1e-12)
}
