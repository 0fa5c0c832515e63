//! Property package selection, normalization and fallback remapping.
//!
//! Grounded on `thermo_engine.py`'s package alias table: user-supplied names
//! are normalized, historically-unsupported names are remapped to their
//! closest supported equivalent, and anything else is rejected.

use crate::error::{ThermoError, ThermoResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PackageKind {
    Pr,
    Srk,
    Nrtl,
    Unifac,
    Uniquac,
    IapwsWater,
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase().replace(['-', '_', ' '], "")
}

/// Returns the canonical kind for a user-supplied package name, remapping
/// historically-unsupported names to their closest supported equivalent
/// exactly as `thermo_engine.py` does (Lee-Kesler-Plöcker -> PR,
/// Chao-Seader -> PR, Wilson -> NRTL, sour water -> PR, amine -> NRTL).
pub fn normalize_package_name(name: &str) -> ThermoResult<PackageKind> {
    let n = normalize(name);
    let kind = match n.as_str() {
        "pr" | "pengrobinson" | "peng-robinson" => PackageKind::Pr,
        "srk" | "soavereidlichkwong" | "soaveredlichkwong" => PackageKind::Srk,
        "nrtl" => PackageKind::Nrtl,
        "unifac" => PackageKind::Unifac,
        "uniquac" => PackageKind::Uniquac,
        "iapws" | "iapws95" | "steamtables" | "iapwswater" => PackageKind::IapwsWater,
        // Fallback remaps.
        "leekeslerplocker" | "lk" | "lkp" | "chaoseader" => PackageKind::Pr,
        "sourwater" | "sourwaterpackage" => PackageKind::Pr,
        "wilson" => PackageKind::Nrtl,
        "amine" | "aminepackage" => PackageKind::Nrtl,
        _ => return Err(ThermoError::UnsupportedPackage(name.to_string())),
    };
    Ok(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_common_spellings() {
        assert_eq!(normalize_package_name("PR").unwrap(), PackageKind::Pr);
        assert_eq!(normalize_package_name("Peng-Robinson").unwrap(), PackageKind::Pr);
        assert_eq!(normalize_package_name("pengrobinson").unwrap(), PackageKind::Pr);
    }

    #[test]
    fn remaps_legacy_names() {
        assert_eq!(normalize_package_name("Lee-Kesler-Plocker").unwrap(), PackageKind::Pr);
        assert_eq!(normalize_package_name("Chao-Seader").unwrap(), PackageKind::Pr);
        assert_eq!(normalize_package_name("Wilson").unwrap(), PackageKind::Nrtl);
        assert_eq!(normalize_package_name("amine").unwrap(), PackageKind::Nrtl);
    }

    #[test]
    fn rejects_unknown() {
        assert!(normalize_package_name("made-up-model").is_err());
    }
}
