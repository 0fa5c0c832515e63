//! Gibbs-energy-minimization reactor.
//!
//! Grounded on `gibbs_reactor.py`: builds an elemental-balance matrix from
//! component molecular formulas, then minimizes `G(n) = sum(n_i * mu_i)`
//! subject to elemental conservation via projected gradient descent — the
//! tractable Rust equivalent of the Python source's SLSQP call, since the
//! gradient there is just `mu_i` itself (no second-order term), which is
//! exactly what a gradient step needs.

use std::collections::BTreeMap;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};
use tf_thermo::{ChemicalConstants, FlashEngine, StreamState};

use crate::error::{UnitOpError, UnitOpResult};
use crate::simple::first_inlet;
use crate::UnitOp;

const R_GAS: f64 = 8.314462618;
const P_REF: f64 = 101_325.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GibbsReactorParams {
    pub outlet_temperature_c: Option<f64>,
    pub outlet_pressure_kpa: Option<f64>,
}

fn elemental_matrix(components: &[ChemicalConstants]) -> (Vec<String>, DMatrix<f64>) {
    let mut elements: Vec<String> = Vec::new();
    for c in components {
        for el in c.formula.keys() {
            if !elements.contains(el) {
                elements.push(el.clone());
            }
        }
    }
    let mut a = DMatrix::<f64>::zeros(elements.len(), components.len());
    for (j, c) in components.iter().enumerate() {
        for (el, count) in &c.formula {
            let i = elements.iter().position(|e| e == el).unwrap();
            a[(i, j)] = *count as f64;
        }
    }
    (elements, a)
}

/// Chemical potential `mu_i = Hf_i - T*S0_i + R*T*ln(max(x_i*P/P_ref, 1e-30))`.
fn chemical_potentials(components: &[ChemicalConstants], n: &DVector<f64>, t: f64, p: f64) -> DVector<f64> {
    let total: f64 = n.iter().sum();
    DVector::from_iterator(
        n.len(),
        components.iter().zip(n.iter()).map(|(c, ni)| {
            let x = if total > 0.0 { ni / total } else { 0.0 };
            let arg = (x * p / P_REF).max(1e-30);
            c.hf_ig - t * c.s0_ig + R_GAS * t * arg.ln()
        }),
    )
}

/// Projected gradient descent: step along `-mu`, then project back onto the
/// `A n = b` elemental-conservation manifold via the least-squares
/// projector `n -= A^T (A A^T)^-1 (A n - b)`.
fn minimize_gibbs(components: &[ChemicalConstants], a: &DMatrix<f64>, b: &DVector<f64>, n0: DVector<f64>, t: f64, p: f64) -> Option<DVector<f64>> {
    let aat = a * a.transpose();
    let aat_inv = aat.clone().try_inverse()?;
    let mut n = n0;

    for _ in 0..200 {
        let mu = chemical_potentials(components, &n, t, p);
        if !mu.iter().all(|v| v.is_finite()) {
            return None;
        }
        let scale = n.iter().cloned().fold(1.0_f64, f64::max).max(1.0);
        let step = 1e-4 * scale / mu.iter().cloned().fold(1.0_f64, |a, v| a.max(v.abs())).max(1.0);
        let mut candidate = &n - step * &mu;

        let residual = a * &candidate - b;
        candidate -= a.transpose() * (&aat_inv * &residual);
        for v in candidate.iter_mut() {
            *v = v.max(1e-20);
        }

        let delta = (&candidate - &n).norm();
        n = candidate;
        if delta < 1e-12 {
            break;
        }
    }
    n.iter().all(|v| v.is_finite()).then_some(n)
}

pub fn gibbs_reactor(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &GibbsReactorParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let t_out = params.outlet_temperature_c.map(|c| c + 273.15).unwrap_or(inlet.t_k);
    let p_out = params.outlet_pressure_kpa.map(|kpa| kpa * 1000.0).unwrap_or(inlet.p_pa);

    let n_in = DVector::from_iterator(inlet.zs.len(), inlet.zs.iter().map(|z| z * inlet.molar_flow_mol_s));
    let (_elements, a) = elemental_matrix(&engine.components);
    if engine.components.iter().any(|c| c.formula.is_empty()) {
        op.warnings.push("Gibbs minimization unavailable (missing molecular formula data), falling back to PT flash".into());
        let outlet = engine.pt_flash(t_out, p_out, &inlet.zs, inlet.molar_flow_mol_s)?;
        op.duty_w = inlet.molar_flow_mol_s * (outlet.enthalpy_j_mol - inlet.enthalpy_j_mol);
        return Ok(BTreeMap::from([("out".to_string(), outlet)]));
    }
    let b = &a * &n_in;

    let n_out = match minimize_gibbs(&engine.components, &a, &b, n_in.clone(), t_out, p_out) {
        Some(n) => n,
        None => {
            op.warnings.push("Gibbs minimization failed to converge, falling back to PT flash".into());
            let outlet = engine.pt_flash(t_out, p_out, &inlet.zs, inlet.molar_flow_mol_s)?;
            op.duty_w = inlet.molar_flow_mol_s * (outlet.enthalpy_j_mol - inlet.enthalpy_j_mol);
            return Ok(BTreeMap::from([("out".to_string(), outlet)]));
        }
    };

    let total_out: f64 = n_out.iter().sum();
    let zs_out: Vec<f64> = n_out.iter().map(|v| v / total_out).collect();

    let outlet = engine.pt_flash(t_out, p_out, &zs_out, total_out)?;
    op.duty_w = total_out * outlet.enthalpy_j_mol - inlet.molar_flow_mol_s * inlet.enthalpy_j_mol;
    Ok(BTreeMap::from([("out".to_string(), outlet)]))
}
