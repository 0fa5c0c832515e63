//! Kinetic reactor (CSTR/PFR) with Arrhenius rate laws.
//!
//! Grounded on `kinetic_reactor.py`: rate `k = A*exp(-Ea/RT)`, net
//! per-component rate `r_i = sum_rxn(nu_i * k * prod(C_j^order_j))`, CSTR
//! solved by damped fixed-point iteration on `F_out = F_in + V*r(C(F_out))`
//! (standing in for the Python source's `fsolve` root-find), PFR solved by
//! RK4 integration of `dF/dV = r(C(F))` over `[0, V]` (standing in for
//! `solve_ivp`'s RK45).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tf_thermo::{FlashEngine, StreamState};

use crate::error::{UnitOpError, UnitOpResult};
use crate::reaction::{resolve_component, Reaction};
use crate::simple::first_inlet;
use crate::UnitOp;

const R_GAS: f64 = 8.314462618;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactorMode {
    Cstr,
    Pfr,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KineticReactorParams {
    pub mode: ReactorMode,
    pub volume_m3: f64,
    pub reactions: Vec<Reaction>,
    pub outlet_temperature_c: Option<f64>,
}

impl Default for KineticReactorParams {
    fn default() -> Self {
        Self { mode: ReactorMode::Cstr, volume_m3: 1.0, reactions: Vec::new(), outlet_temperature_c: None }
    }
}

struct ResolvedReaction {
    stoich: Vec<f64>,
    orders: Vec<f64>,
    a: f64,
    ea: f64,
}

fn resolve_reactions(component_names: &[String], reactions: &[Reaction]) -> Vec<ResolvedReaction> {
    let n = component_names.len();
    let mut out = Vec::new();
    for rxn in reactions {
        let mut stoich = vec![0.0; n];
        let mut orders = vec![0.0; n];
        let mut ok = true;
        for (comp, coeff) in &rxn.reactants {
            match resolve_component(comp, component_names) {
                Some(resolved) => {
                    let idx = component_names.iter().position(|c| c == resolved).unwrap();
                    stoich[idx] -= coeff;
                    orders[idx] = rxn.orders.as_ref().and_then(|o| o.get(comp)).copied().unwrap_or(coeff.abs());
                }
                None => ok = false,
            }
        }
        for (comp, coeff) in &rxn.products {
            match resolve_component(comp, component_names) {
                Some(resolved) => {
                    let idx = component_names.iter().position(|c| c == resolved).unwrap();
                    stoich[idx] += coeff;
                }
                None => ok = false,
            }
        }
        if !ok {
            continue;
        }
        out.push(ResolvedReaction {
            stoich,
            orders,
            a: rxn.pre_exponential.unwrap_or(1.0),
            ea: rxn.activation_energy_j_mol.unwrap_or(0.0),
        });
    }
    out
}

fn rates(resolved: &[ResolvedReaction], concentrations: &[f64], t: f64) -> Vec<f64> {
    let n = concentrations.len();
    let mut r_net = vec![0.0; n];
    for rxn in resolved {
        let k = rxn.a * (-rxn.ea / (R_GAS * t)).exp();
        let mut rate = k;
        let mut blocked = false;
        for (c, order) in concentrations.iter().zip(rxn.orders.iter()) {
            if *order > 0.0 {
                if *c <= 0.0 {
                    blocked = true;
                    break;
                }
                rate *= c.powf(*order);
            }
        }
        if blocked {
            continue;
        }
        for i in 0..n {
            r_net[i] += rxn.stoich[i] * rate;
        }
    }
    r_net
}

fn concentrations(flows: &[f64], volumetric_flow: f64) -> Vec<f64> {
    if volumetric_flow <= 0.0 {
        return vec![0.0; flows.len()];
    }
    flows.iter().map(|f| f / volumetric_flow).collect()
}

pub fn kinetic_reactor(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &KineticReactorParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let resolved = resolve_reactions(&engine.component_names, &params.reactions);

    let c_total = if let Some(rho) = inlet.density_kg_m3 {
        rho * 1000.0 / inlet.molecular_weight
    } else {
        inlet.p_pa / (R_GAS * inlet.t_k)
    };
    let volumetric_flow = if c_total > 0.0 { inlet.molar_flow_mol_s / c_total } else { 0.0 };

    let f_in: Vec<f64> = inlet.zs.iter().map(|z| z * inlet.molar_flow_mol_s).collect();

    let f_out = match params.mode {
        ReactorMode::Cstr => solve_cstr(&resolved, &f_in, volumetric_flow, params.volume_m3, inlet.t_k),
        ReactorMode::Pfr => solve_pfr(&resolved, &f_in, volumetric_flow, params.volume_m3, inlet.t_k),
    };

    let total_flow: f64 = f_out.iter().sum();
    let zs_out = if total_flow > 0.0 {
        f_out.iter().map(|f| f.max(0.0) / total_flow).collect()
    } else {
        inlet.zs.clone()
    };

    let outlet = if let Some(t_c) = params.outlet_temperature_c {
        let outlet = engine.pt_flash(t_c + 273.15, inlet.p_pa, &zs_out, total_flow)?;
        op.duty_w = total_flow * outlet.enthalpy_j_mol - inlet.molar_flow_mol_s * inlet.enthalpy_j_mol;
        outlet
    } else {
        let outlet = engine.ph_flash(inlet.p_pa, inlet.enthalpy_j_mol, &zs_out, total_flow)?;
        op.duty_w = 0.0;
        outlet
    };

    Ok(BTreeMap::from([("out".to_string(), outlet)]))
}

/// Damped fixed-point iteration on `F = F_in + V*r(C(F))`, the tractable
/// stand-in for the Python source's `fsolve` root-find.
fn solve_cstr(resolved: &[ResolvedReaction], f_in: &[f64], volumetric_flow: f64, volume: f64, t: f64) -> Vec<f64> {
    let mut f = f_in.to_vec();
    for _ in 0..200 {
        let c = concentrations(&f, volumetric_flow);
        let r = rates(resolved, &c, t);
        if !r.iter().all(|v| v.is_finite()) {
            return f_in.to_vec();
        }
        let candidate: Vec<f64> = f_in.iter().zip(r.iter()).map(|(fi, ri)| (fi + volume * ri).max(0.0)).collect();
        let delta: f64 = candidate.iter().zip(f.iter()).map(|(a, b)| (a - b).abs()).sum();
        f = candidate;
        if delta < 1e-10 {
            return f;
        }
    }
    f
}

/// RK4 integration of `dF/dV = r(C(F))` over `[0, volume]`, standing in for
/// the Python source's `solve_ivp` RK45 call.
fn solve_pfr(resolved: &[ResolvedReaction], f_in: &[f64], volumetric_flow: f64, volume: f64, t: f64) -> Vec<f64> {
    let steps = 200.max((volume / 1e-3).ceil() as usize).min(100_000);
    let dv = volume / steps as f64;
    let mut f = f_in.to_vec();

    let deriv = |f: &[f64]| -> Vec<f64> {
        let c = concentrations(f, volumetric_flow);
        rates(resolved, &c, t)
    };

    for _ in 0..steps {
        let k1 = deriv(&f);
        let f2: Vec<f64> = f.iter().zip(k1.iter()).map(|(fi, ki)| fi + 0.5 * dv * ki).collect();
        let k2 = deriv(&f2);
        let f3: Vec<f64> = f.iter().zip(k2.iter()).map(|(fi, ki)| fi + 0.5 * dv * ki).collect();
        let k3 = deriv(&f3);
        let f4: Vec<f64> = f.iter().zip(k3.iter()).map(|(fi, ki)| fi + dv * ki).collect();
        let k4 = deriv(&f4);

        if !k1.iter().chain(&k2).chain(&k3).chain(&k4).all(|v| v.is_finite()) {
            return f_in.to_vec();
        }

        f = f
            .iter()
            .zip(k1.iter().zip(k2.iter().zip(k3.iter().zip(k4.iter()))))
            .map(|(fi, (a, (b, (c, d))))| (fi + dv / 6.0 * (a + 2.0 * b + 2.0 * c + d)).max(0.0))
            .collect();
    }
    f
}

#[cfg(test)]
mod tests {
    use super::*;
    use tf_thermo::{builtin_registry, PackageKind};

    fn mixture_engine(names: &[&str]) -> FlashEngine {
        let comps: Vec<_> = builtin_registry().into_iter().filter(|c| names.contains(&c.name.as_str())).collect();
        FlashEngine::new(PackageKind::Pr, comps, None)
    }

    fn reaction() -> Reaction {
        Reaction {
            reactants: BTreeMap::from([("methane".to_string(), 1.0)]),
            products: BTreeMap::from([("methanol".to_string(), 1.0)]),
            conversion: 0.0,
            base_component: None,
            pre_exponential: Some(1.0e6),
            activation_energy_j_mol: Some(40_000.0),
            orders: None,
        }
    }

    #[test]
    fn zero_volume_cstr_leaves_flows_unchanged() {
        let resolved = resolve_reactions(&["methane".to_string(), "methanol".to_string()], &[reaction()]);
        let f_in = vec![10.0, 0.0];
        let f_out = solve_cstr(&resolved, &f_in, 1.0, 0.0, 500.0);
        assert!((f_out[0] - 10.0).abs() < 1e-6);
        assert!((f_out[1] - 0.0).abs() < 1e-6);
    }

    #[test]
    fn cstr_with_positive_volume_converts_some_reactant() {
        let resolved = resolve_reactions(&["methane".to_string(), "methanol".to_string()], &[reaction()]);
        let f_in = vec![10.0, 0.0];
        let f_out = solve_cstr(&resolved, &f_in, 1.0, 0.5, 600.0);
        assert!(f_out[0] < 10.0);
        assert!(f_out[1] > 0.0);
    }

    #[test]
    fn kinetic_reactor_cstr_end_to_end_converts_methane() {
        let engine = mixture_engine(&["methane", "methanol"]);
        let inlet = engine.pt_flash(600.0, 2_000_000.0, &[1.0, 0.0], 10.0).unwrap();
        let mut op = UnitOp::new(
            "kr1",
            "kinetic reactor",
            UnitOpKind::KineticReactor(KineticReactorParams {
                mode: ReactorMode::Cstr,
                volume_m3: 2.0,
                reactions: vec![reaction()],
                outlet_temperature_c: Some(600.0 - 273.15),
            }),
        );
        let mut inlets = BTreeMap::new();
        inlets.insert("in".to_string(), inlet);
        let out = op.calculate(&inlets, &engine).unwrap();
        let outlet = out.get("out").unwrap();
        let methanol_idx = engine.component_names.iter().position(|n| n == "methanol").unwrap();
        assert!(outlet.zs[methanol_idx] > 0.0);
    }

    #[test]
    fn pfr_mode_also_converts_reactant_over_volume() {
        let resolved = resolve_reactions(&["methane".to_string(), "methanol".to_string()], &[reaction()]);
        let f_in = vec![10.0, 0.0];
        let f_out = solve_pfr(&resolved, &f_in, 1.0, 0.5, 600.0);
        assert!(f_out[0] < 10.0);
        assert!(f_out[1] > 0.0);
    }
}
