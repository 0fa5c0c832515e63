//! Shared reaction-specification type used by the conversion, equilibrium
//! and kinetic reactor variants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A single stoichiometric reaction: component name -> stoichiometric
/// coefficient (reactants and products kept separate, as the Python source
/// does, rather than signed coefficients in one map).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Reaction {
    pub reactants: BTreeMap<String, f64>,
    pub products: BTreeMap<String, f64>,
    pub conversion: f64,
    pub base_component: Option<String>,
    /// Arrhenius pre-exponential factor, kinetic reactors only.
    pub pre_exponential: Option<f64>,
    /// Activation energy, J/mol, kinetic reactors only.
    pub activation_energy_j_mol: Option<f64>,
    /// Reaction order per component; defaults to `|stoich|` for reactants.
    pub orders: Option<BTreeMap<String, f64>>,
}

/// Resolve a user-supplied component name to the engine's canonical name,
/// normalizing case/underscore/whitespace the way `unit_operations.py`'s
/// `_resolve_comp` does.
pub fn resolve_component<'a>(name: &str, component_names: &'a [String]) -> Option<&'a str> {
    let norm = |s: &str| s.to_lowercase().replace('_', " ").trim().to_string();
    let target = norm(name);
    component_names.iter().find(|n| norm(n) == target).map(|s| s.as_str())
}
