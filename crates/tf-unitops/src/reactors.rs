//! Conversion reactor (stoichiometry + fractional conversion) and
//! equilibrium reactor (conversion-reactor front end, or plain PT flash
//! when no reactions are specified).
//!
//! Grounded on `unit_operations.py`'s `ConversionReactorOp`/`EquilibriumReactorOp`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tf_thermo::{FlashEngine, StreamState};

use crate::error::{UnitOpError, UnitOpResult};
use crate::reaction::{resolve_component, Reaction};
use crate::simple::first_inlet;
use crate::UnitOp;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionReactorParams {
    pub reactions: Vec<Reaction>,
    pub outlet_temperature_c: Option<f64>,
    pub outlet_pressure_kpa: Option<f64>,
}

pub type EquilibriumReactorParams = ConversionReactorParams;

/// Apply fractional-conversion stoichiometry to the inlet component flows,
/// returning the post-reaction flow vector. Shared by the conversion and
/// equilibrium reactor variants.
pub fn apply_reactions(
    op: &mut UnitOp,
    component_names: &[String],
    reactions: &[Reaction],
    mut component_flows: Vec<f64>,
) -> Vec<f64> {
    for rxn in reactions {
        let conversion = rxn.conversion.clamp(0.0, 1.0);
        let base_comp = rxn.base_component.clone().or_else(|| rxn.reactants.keys().next().cloned());
        let Some(base_comp) = base_comp else {
            op.warnings.push("reaction has no base component, skipping".into());
            continue;
        };
        let Some(resolved_base) = resolve_component(&base_comp, component_names) else {
            op.warnings.push(format!("base component '{base_comp}' not found, skipping reaction"));
            continue;
        };
        let base_idx = component_names.iter().position(|n| n == resolved_base).unwrap();
        let base_coeff = rxn.reactants.get(&base_comp).copied().unwrap_or(1.0);
        let moles_reacted = component_flows[base_idx] * conversion;

        for (comp, coeff) in &rxn.reactants {
            if let Some(resolved) = resolve_component(comp, component_names) {
                let idx = component_names.iter().position(|n| n == resolved).unwrap();
                let consumed = moles_reacted * (coeff / base_coeff);
                component_flows[idx] = (component_flows[idx] - consumed).max(0.0);
            }
        }
        for (comp, coeff) in &rxn.products {
            if let Some(resolved) = resolve_component(comp, component_names) {
                let idx = component_names.iter().position(|n| n == resolved).unwrap();
                component_flows[idx] += moles_reacted * (coeff / base_coeff);
            }
        }
    }
    component_flows
}

pub fn conversion_reactor(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &ConversionReactorParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let p_out = params.outlet_pressure_kpa.map(|kpa| kpa * 1000.0).unwrap_or(inlet.p_pa);

    let component_flows: Vec<f64> = inlet.zs.iter().map(|z| z * inlet.molar_flow_mol_s).collect();
    let component_flows = apply_reactions(op, &engine.component_names, &params.reactions, component_flows);

    let total_flow: f64 = component_flows.iter().sum();
    let (zs_out, total_flow) = if total_flow > 0.0 {
        (component_flows.iter().map(|f| f / total_flow).collect(), total_flow)
    } else {
        op.warnings.push("all components consumed in reactor".into());
        (inlet.zs.clone(), inlet.molar_flow_mol_s)
    };

    let outlet = if let Some(t_c) = params.outlet_temperature_c {
        let outlet = engine.pt_flash(t_c + 273.15, p_out, &zs_out, total_flow)?;
        op.duty_w = total_flow * (outlet.enthalpy_j_mol - inlet.enthalpy_j_mol);
        outlet
    } else {
        let outlet = engine.ph_flash(p_out, inlet.enthalpy_j_mol, &zs_out, total_flow)?;
        op.duty_w = 0.0;
        outlet
    };

    Ok(BTreeMap::from([("out".to_string(), outlet)]))
}

pub fn equilibrium_reactor(
    op: &mut UnitOp,
    inlets: &BTreeMap<String, StreamState>,
    engine: &FlashEngine,
    params: &EquilibriumReactorParams,
) -> UnitOpResult<BTreeMap<String, StreamState>> {
    if !params.reactions.is_empty() {
        return conversion_reactor(op, inlets, engine, params);
    }

    let inlet = first_inlet(inlets).ok_or_else(|| UnitOpError::NoInlets(op.id.clone()))?;
    let t_out = params.outlet_temperature_c.map(|c| c + 273.15).unwrap_or(inlet.t_k);
    let p_out = params.outlet_pressure_kpa.map(|kpa| kpa * 1000.0).unwrap_or(inlet.p_pa);

    let outlet = engine.pt_flash(t_out, p_out, &inlet.zs, inlet.molar_flow_mol_s)?;
    op.duty_w = inlet.molar_flow_mol_s * (outlet.enthalpy_j_mol - inlet.enthalpy_j_mol);
    op.warnings.push(
        "equilibrium reactor: phase equilibrium calculated via PT flash; specify reactions for chemical equilibrium".into(),
    );
    Ok(BTreeMap::from([("out".to_string(), outlet)]))
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
            conversion: 0.8,
            base_component: Some("methane".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn conversion_reactor_consumes_reactant_and_forms_product() {
        let engine = mixture_engine(&["methane", "methanol"]);
        let inlet = engine.pt_flash(500.0, 2_000_000.0, &[1.0, 0.0], 10.0).unwrap();
        let methane_idx = engine.component_names.iter().position(|n| n == "methane").unwrap();
        let methanol_idx = engine.component_names.iter().position(|n| n == "methanol").unwrap();
        let mut op = UnitOp::new(
            "cr1",
            "reactor",
            UnitOpKind::ConversionReactor(ConversionReactorParams { reactions: vec![reaction()], outlet_temperature_c: Some(200.0), ..Default::default() }),
        );
        let mut inlets = BTreeMap::new();
        inlets.insert("in".to_string(), inlet);
        let out = op.calculate(&inlets, &engine).unwrap();
        let outlet = out.get("out").unwrap();
        assert!(outlet.zs[methane_idx] < 0.3);
        assert!(outlet.zs[methanol_idx] > 0.0);
    }

    #[test]
    fn equilibrium_reactor_with_no_reactions_is_a_pt_flash_passthrough() {
        let engine = mixture_engine(&["methane", "methanol"]);
        let inlet = engine.pt_flash(400.0, 1_000_000.0, &[0.5, 0.5], 5.0).unwrap();
        let mut op = UnitOp::new(
            "er1",
            "equilibrium reactor",
            UnitOpKind::EquilibriumReactor(EquilibriumReactorParams { outlet_temperature_c: Some(500.0 - 273.15), ..Default::default() }),
        );
        let mut inlets = BTreeMap::new();
        inlets.insert("in".to_string(), inlet);
        let out = op.calculate(&inlets, &engine).unwrap();
        assert!((out.get("out").unwrap().t_k - 500.0).abs() < 1e-6);
        assert!(!op.warnings.is_empty());
    }
}
