//! Flowsheet payload validation logic.

use crate::schema::FlowsheetPayload;
use std::collections::HashSet;

#[derive(thiserror::Error, Debug)]
pub enum ValidationError {
    #[error("Duplicate ID: {id} in {context}")]
    DuplicateId { id: String, context: String },

    #[error("Missing reference: {id} in {context}")]
    MissingReference { id: String, context: String },

    #[error("Invalid value: {field} = {value} ({reason})")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Unsupported feature: {feature} - {reason}")]
    Unsupported { feature: String, reason: String },
}

/// Checks id uniqueness and that every reference a stream or spec makes to a
/// unit id actually resolves within the payload. Does not validate unit
/// `parameters` shapes — each unit kind validates its own parameters when
/// it's built.
pub fn validate_payload(payload: &FlowsheetPayload) -> Result<(), ValidationError> {
    if payload.units.is_empty() {
        return Err(ValidationError::InvalidValue {
            field: "units".to_string(),
            value: "[]".to_string(),
            reason: "flowsheet must contain at least one unit".to_string(),
        });
    }

    let mut unit_ids = HashSet::new();
    for unit in &payload.units {
        if !unit_ids.insert(unit.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: unit.id.clone(),
                context: "units".to_string(),
            });
        }
        if unit.kind.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "type".to_string(),
                value: String::new(),
                reason: format!("unit {} has an empty type", unit.id),
            });
        }
    }

    let mut stream_ids = HashSet::new();
    for stream in &payload.streams {
        if !stream_ids.insert(stream.id.as_str()) {
            return Err(ValidationError::DuplicateId {
                id: stream.id.clone(),
                context: "streams".to_string(),
            });
        }
        if let Some(source) = &stream.source {
            if !source.is_empty() && !unit_ids.contains(source.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: source.clone(),
                    context: format!("stream {} source", stream.id),
                });
            }
        }
        if let Some(target) = &stream.target {
            if !target.is_empty() && !unit_ids.contains(target.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: target.clone(),
                    context: format!("stream {} target", stream.id),
                });
            }
        }
    }

    for energy in &payload.energy_streams {
        if let Some(u) = &energy.source_unit {
            if !unit_ids.contains(u.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: u.clone(),
                    context: format!("energy stream {} source_unit", energy.id),
                });
            }
        }
        if let Some(u) = &energy.target_unit {
            if !unit_ids.contains(u.as_str()) {
                return Err(ValidationError::MissingReference {
                    id: u.clone(),
                    context: format!("energy stream {} target_unit", energy.id),
                });
            }
        }
    }

    for adjust in &payload.adjust_specs {
        if !unit_ids.contains(adjust.variable_unit_id.as_str()) {
            return Err(ValidationError::MissingReference {
                id: adjust.variable_unit_id.clone(),
                context: "adjust_specs variable_unit_id".to_string(),
            });
        }
        if !stream_ids.contains(adjust.target_stream_id.as_str()) {
            return Err(ValidationError::MissingReference {
                id: adjust.target_stream_id.clone(),
                context: "adjust_specs target_stream_id".to_string(),
            });
        }
        if adjust.variable_min >= adjust.variable_max {
            return Err(ValidationError::InvalidValue {
                field: "variable_min/variable_max".to_string(),
                value: format!("{}/{}", adjust.variable_min, adjust.variable_max),
                reason: "variable_min must be less than variable_max".to_string(),
            });
        }
    }

    for set_spec in &payload.set_specs {
        if !unit_ids.contains(set_spec.source_unit_id.as_str()) {
            return Err(ValidationError::MissingReference {
                id: set_spec.source_unit_id.clone(),
                context: "set_specs source_unit_id".to_string(),
            });
        }
        if !unit_ids.contains(set_spec.target_unit_id.as_str()) {
            return Err(ValidationError::MissingReference {
                id: set_spec.target_unit_id.clone(),
                context: "set_specs target_unit_id".to_string(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{StreamSpec, ThermoConfig, UnitSpec};
    use std::collections::BTreeMap;

    fn unit(id: &str) -> UnitSpec {
        UnitSpec {
            id: id.to_string(),
            kind: "Pump".to_string(),
            name: None,
            parameters: BTreeMap::new(),
            property_package: None,
            components: None,
        }
    }

    #[test]
    fn duplicate_unit_id_rejected() {
        let payload = FlowsheetPayload {
            name: "t".to_string(),
            units: vec![unit("p1"), unit("p1")],
            streams: vec![],
            thermo: ThermoConfig::default(),
            metadata: BTreeMap::new(),
            energy_streams: vec![],
            adjust_specs: vec![],
            set_specs: vec![],
        };
        assert!(matches!(
            validate_payload(&payload),
            Err(ValidationError::DuplicateId { .. })
        ));
    }

    #[test]
    fn stream_with_unknown_source_rejected() {
        let payload = FlowsheetPayload {
            name: "t".to_string(),
            units: vec![unit("p1")],
            streams: vec![StreamSpec {
                id: "s1".to_string(),
                name: None,
                source: Some("nope".to_string()),
                target: Some("p1".to_string()),
                phase: None,
                properties: BTreeMap::new(),
            }],
            thermo: ThermoConfig::default(),
            metadata: BTreeMap::new(),
            energy_streams: vec![],
            adjust_specs: vec![],
            set_specs: vec![],
        };
        assert!(matches!(
            validate_payload(&payload),
            Err(ValidationError::MissingReference { .. })
        ));
    }

    #[test]
    fn well_formed_payload_accepted() {
        let payload = FlowsheetPayload {
            name: "t".to_string(),
            units: vec![unit("p1"), unit("p2")],
            streams: vec![StreamSpec {
                id: "s1".to_string(),
                name: None,
                source: Some("p1".to_string()),
                target: Some("p2".to_string()),
                phase: None,
                properties: BTreeMap::new(),
            }],
            thermo: ThermoConfig::default(),
            metadata: BTreeMap::new(),
            energy_streams: vec![],
            adjust_specs: vec![],
            set_specs: vec![],
        };
        assert!(validate_payload(&payload).is_ok());
    }
}
