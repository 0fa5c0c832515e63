//! Content-based hashing for run IDs.

use sha2::{Digest, Sha256};
use tf_project::FlowsheetPayload;

pub fn compute_run_id(payload: &FlowsheetPayload, solver_version: &str) -> String {
    let mut hasher = Sha256::new();

    let payload_json = serde_json::to_string(payload).unwrap_or_default();
    hasher.update(payload_json.as_bytes());
    hasher.update(solver_version.as_bytes());

    let result = hasher.finalize();
    format!("{:x}", result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tf_project::{ThermoConfig, UnitSpec};

    fn payload(name: &str) -> FlowsheetPayload {
        FlowsheetPayload {
            name: name.to_string(),
            units: vec![UnitSpec {
                id: "u1".to_string(),
                kind: "Pump".to_string(),
                name: None,
                parameters: BTreeMap::new(),
                property_package: None,
                components: None,
            }],
            streams: vec![],
            thermo: ThermoConfig::default(),
            metadata: BTreeMap::new(),
            energy_streams: vec![],
            adjust_specs: vec![],
            set_specs: vec![],
        }
    }

    #[test]
    fn hash_stability() {
        let hash1 = compute_run_id(&payload("sys1"), "v1");
        let hash2 = compute_run_id(&payload("sys1"), "v1");
        assert_eq!(hash1, hash2);
    }

    #[test]
    fn hash_differs_for_different_inputs() {
        let hash1 = compute_run_id(&payload("sys1"), "v1");
        let hash2 = compute_run_id(&payload("sys2"), "v1");
        assert_ne!(hash1, hash2);
    }
}
