//! Simulation result data types.
//!
//! Grounded on `schemas.py`'s `StreamResult`/`UnitResult`/
//! `TrayProfileResult`/`SimulationResult`/`FlashRequest`/`FlashResult`/
//! `CompoundInfo`/`CompoundSearchResult`. Field names carry the engineering
//! unit in the name, matching the Python source; values are rounded to 4-6
//! significant decimals on the way out of the internal SI representation.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type RunId = String;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub run_id: RunId,
    pub flowsheet_name: String,
    pub timestamp: String,
    pub solver_version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct StreamResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_kpa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_flow_kg_per_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mole_flow_kmol_per_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vapor_fraction: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquid_fraction: Option<f64>,
    #[serde(default)]
    pub composition: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_composition: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enthalpy_kj_per_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy_kj_per_kg_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viscosity_cp: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molecular_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_capacity_kj_per_kg_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thermal_conductivity_w_per_mk: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heat_capacity_cv_kj_per_kg_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compressibility_factor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub speed_of_sound_m_per_s: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surface_tension_n_per_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub joule_thomson_k_per_kpa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isentropic_exponent: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gibbs_energy_kj_per_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquid_composition: Option<BTreeMap<String, f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vapor_composition: Option<BTreeMap<String, f64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitResult {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty_kw: Option<f64>,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub extra: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_drop_kpa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub efficiency: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inlet_streams: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outlet_streams: Option<Vec<String>>,
}

fn default_status() -> String {
    "not-run".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrayProfileResult {
    pub unit_id: String,
    pub tray: u32,
    pub temperature_c: f64,
    pub pressure_kpa: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vapor_flow_kmol_per_h: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liquid_flow_kmol_per_h: Option<f64>,
    #[serde(default)]
    pub liquid_composition: BTreeMap<String, f64>,
    #[serde(default)]
    pub vapor_composition: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimulationResult {
    pub flowsheet_name: String,
    pub status: String,
    pub streams: Vec<StreamResult>,
    pub units: Vec<UnitResult>,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub diagnostics: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub converged: bool,
    #[serde(default)]
    pub iterations: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_balance_error: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_balance_error: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_package: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlashRequest {
    #[serde(default)]
    pub thermo: tf_project::ThermoConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pressure_kpa: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enthalpy_kj_per_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entropy_kj_per_kg_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vapor_fraction: Option<f64>,
    pub composition: BTreeMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mass_flow_kg_per_h: Option<f64>,
    #[serde(default = "default_flash_type")]
    pub flash_type: String,
}

fn default_flash_type() -> String {
    "PT".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlashResult {
    pub stream: StreamResult,
    #[serde(default)]
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompoundInfo {
    pub name: String,
    pub cas: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molecular_weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boiling_point_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_temperature_c: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_pressure_kpa: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CompoundSearchResult {
    pub compounds: Vec<CompoundInfo>,
}

/// Rounds to `digits` significant decimals, matching the engineering-unit
/// display convention (4-6 sig figs) used when converting from the solver's
/// internal SI state to a result record.
pub fn round_sig(value: f64, digits: i32) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return value;
    }
    let magnitude = value.abs().log10().floor();
    let factor = 10f64.powf(digits as f64 - magnitude - 1.0);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_sig_keeps_requested_precision() {
        assert_eq!(round_sig(1234.5678, 4), 1235.0);
        assert_eq!(round_sig(0.0123456, 4), 0.01235);
    }

    #[test]
    fn round_sig_passes_through_zero_and_nan() {
        assert_eq!(round_sig(0.0, 4), 0.0);
        assert!(round_sig(f64::NAN, 4).is_nan());
    }
}
