//! Flowsheet payload schema: the input side of a simulation request.
//!
//! Grounded on `schemas.py`'s `UnitSpec`/`StreamSpec`/`ThermoConfig`/
//! `FlowsheetPayload`/`EnergyStreamSpec`/`AdjustSpecModel`/`SetSpecModel`.
//! `energy_streams`, `adjust_specs` and `set_specs` are accepted and
//! round-tripped here but not interpreted by the solver.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UnitSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub parameters: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_package: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub components: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    #[serde(default)]
    pub properties: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThermoConfig {
    #[serde(default = "default_package")]
    pub package: String,
    #[serde(default)]
    pub components: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basis: Option<String>,
}

impl Default for ThermoConfig {
    fn default() -> Self {
        Self {
            package: default_package(),
            components: Vec::new(),
            basis: None,
        }
    }
}

fn default_package() -> String {
    "Peng-Robinson".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EnergyStreamSpec {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duty_kw: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdjustSpecModel {
    pub variable_unit_id: String,
    pub variable_param: String,
    pub variable_min: f64,
    pub variable_max: f64,
    pub target_stream_id: String,
    pub target_property: String,
    pub target_value: f64,
    #[serde(default = "default_adjust_tolerance")]
    pub tolerance: f64,
    #[serde(default = "default_adjust_max_iterations")]
    pub max_iterations: u32,
}

fn default_adjust_tolerance() -> f64 {
    1e-4
}

fn default_adjust_max_iterations() -> u32 {
    50
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SetSpecModel {
    pub source_unit_id: String,
    pub source_param: String,
    pub target_unit_id: String,
    pub target_param: String,
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub offset: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlowsheetPayload {
    #[serde(default = "default_flowsheet_name")]
    pub name: String,
    pub units: Vec<UnitSpec>,
    pub streams: Vec<StreamSpec>,
    #[serde(default)]
    pub thermo: ThermoConfig,
    #[serde(default)]
    pub metadata: BTreeMap<String, Value>,
    #[serde(default)]
    pub energy_streams: Vec<EnergyStreamSpec>,
    #[serde(default)]
    pub adjust_specs: Vec<AdjustSpecModel>,
    #[serde(default)]
    pub set_specs: Vec<SetSpecModel>,
}

fn default_flowsheet_name() -> String {
    "generated-flowsheet".to_string()
}
