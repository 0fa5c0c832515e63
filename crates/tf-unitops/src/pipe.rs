//! Pipe segment with Darcy-Weisbach friction.
//!
//! Grounded on the teacher's `tf-components/src/pipe.rs`: Swamee-Jain
//! friction factor for turbulent flow (laminar below Re=2300), bisection
//! solve of mass flow rate from a target pressure drop, adapted here to
//! operate on the multicomponent `StreamState`/`FlashEngine` contract in
//! place of the teacher's single-fluid CoolProp-backed stream type.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tf_thermo::{FlashEngine, StreamState};

use crate::error::{UnitOpError, UnitOpResult};
use crate::simple::first_inlet;
use crate::UnitOp;

const EPSILON_MDOT: f64 = 1e-9;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipeSegmentParams {
    pub length_m: f64,
    pub diameter_m: f64,
    pub roughness_m: f64,
    pub k_minor: f64,
}

impl Default for PipeSegmentParams {
    fn default() -> Self {
        Self { length_m: 10.0, diameter_m: 0.1, roughness_m: 4.5e-5, k_minor: 0.0 }
    }
}

fn friction_factor(params: &PipeSegmentParams, reynolds: f64) -> f64 {
    if reynolds < 2300.0 {
        64.0 / reynolds.max(1.0)
    } else {
        let e_d = params.roughness_m / params.diameter_m;
        let a = e_d / 3.7;
        let b = 5.74 / reynolds.powf(0.9);
        (0.25 / (a + b).log10().powi(2)).max(1e-4)
    }
}

fn pressure_drop_for_mdot(params: &PipeSegmentParams, rho: f64, viscosity: f64, mdot_abs: f64) -> f64 {
    if mdot_abs < EPSILON_MDOT || rho <= 0.0 {
        return 0.0;
    }
    let area = std::f64::consts::PI * params.diameter_m.powi(2) / 4.0;
    let velocity = mdot_abs / (rho * area);
    let reynolds = (rho * velocity * params.diameter_m / viscosity.max(1e-9)).max(1.0);
    let f = friction_factor(params, reynolds);
    (f * params.length_m / params.diameter_m + params.k_minor) * 0.5 * rho * velocity * velocity
}

/// Bisection solve for the mass flow that produces `dp_target`, mirroring
/// the teacher's `solve_mdot`.
fn solve_mdot(params: &PipeSegmentParams, rho: f64, viscosity: f64, dp_target: f64) -> f64 {
    const TOL: f64 = 1.0;
    if dp_target.abs() < TOL {
        return 0.0;
    }
    let mut lo = 0.0;
    let mut hi = 100.0 * dp_target.abs().sqrt();
    for _ in 0..50 {
        let mid = 0.5 * (lo + hi);
        let dp_mid = pressure_drop_for_mdot(params, rho, viscosity, mid);
        if (dp_mid - dp_target.abs()).abs() < TOL {
            return mid;
        }
        if dp_mid < dp_target.abs() {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    0.5 * (lo + hi)
}

/// Isenthalpic pipe segment: computes the pressure drop implied by the
/// inlet's current mass flow rate and produces an outlet stream at
/// `P_in - dP`, same composition and enthalpy as the inlet.
pub fn pipe_segment(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &PipeSegmentParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let rho = inlet.density_kg_m3.unwrap_or(1.0);
    let mu = inlet.viscosity_pa_s.unwrap_or(1e-5);

    let dp = pressure_drop_for_mdot(params, rho, mu, inlet.mass_flow_kg_s.abs());
    op.pressure_drop_pa = dp;
    op.duty_w = 0.0;

    let p_out = (inlet.p_pa - dp).max(1000.0);
    let outlet = engine.ph_flash(p_out, inlet.enthalpy_j_mol, &inlet.zs, inlet.molar_flow_mol_s)?;
    Ok(BTreeMap::from([("out".to_string(), outlet)]))
}

/// Mass flow rate implied by a target pressure drop at the inlet's current
/// conditions, exposed for rating-mode use (given dP, find mdot) rather
/// than the default design-mode flow (given mdot, find dP).
pub fn solve_flow_for_pressure_drop(inlet: &StreamState, params: &PipeSegmentParams, dp_target_pa: f64) -> f64 {
    let rho = inlet.density_kg_m3.unwrap_or(1.0);
    let mu = inlet.viscosity_pa_s.unwrap_or(1e-5);
    solve_mdot(params, rho, mu, dp_target_pa)
}
