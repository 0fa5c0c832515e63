//! Port-name normalization: suffix stripping and alias resolution.
//!
//! Grounded on `flowsheet_solver.py`'s `_extract_port`/`_PORT_ALIASES`
//! machinery, generalized to the fuller suffix/alias table spelled out
//! directly by the payload contract — which lists more suffixes
//! (`-inlet`, `-outlet`, `-out`) than `_extract_port` actually strips
//! (`-left`/`-right`/`-top`/`-bottom` only). That fuller table is
//! authoritative here.
//!
//! Lookup order matters: the alias table is consulted on the raw handle
//! *before* suffix stripping, so compound aliases like `hot-out` resolve
//! directly instead of being mangled by a naive trailing `-out` strip.
//! Suffix stripping is the fallback for handles the alias table doesn't
//! recognize verbatim (e.g. `suction-left`).

const SUFFIXES: &[&str] = &["-left", "-right", "-top", "-bottom", "-inlet", "-outlet", "-out"];

fn alias_lookup(s: &str) -> Option<&'static str> {
    match s {
        // "gas"/"oil"/"water" are deliberately left unaliased: they're the
        // literal outlet keys a three-phase separator produces, and aliasing
        // them to the 2-phase "vapor"/"liquid2" names here would make those
        // handles resolve to the wrong port on that unit kind.
        "overhead" | "vapor" | "distillate" => Some("vapor"),
        "bottoms" | "liquid" | "residue" => Some("liquid"),
        "aqueous" => Some("liquid2"),
        "inlet" | "feed" | "suction" | "in" => Some("in"),
        "outlet" | "discharge" | "product" | "out" => Some("out"),
        "hot-in" => Some("hot_in"),
        "hot-out" => Some("hot_out"),
        "cold-in" => Some("cold_in"),
        "cold-out" => Some("cold_out"),
        _ => None,
    }
}

/// Maps a unit op's outlet-result key (e.g. `"distillate"`) to the solver
/// port name it should be written to (e.g. `"vapor"`), for units whose
/// `calculate` output keys don't literally match their graph port names.
pub fn outlet_key_to_port(key: &str) -> Option<&'static str> {
    match key {
        "distillate" | "overhead" => Some("vapor"),
        "bottoms" | "residue" => Some("liquid"),
        "hot_out" => Some("hot_out"),
        "cold_out" => Some("cold_out"),
        _ => None,
    }
}

/// Extract a canonical port name from a raw payload handle string
/// (a React-Flow-style `sourceHandle`/`targetHandle`).
///
/// Returns `None` for a missing handle — callers fall back to default
/// sequential port assignment in that case.
pub fn extract_port(handle: Option<&str>) -> Option<String> {
    let s = handle?;

    if s.starts_with("feed-stage") {
        return Some("feed".to_string());
    }

    // Splitter convention: "out-1-right" -> "out-1", never stripped further.
    if let Some(rest) = s.strip_prefix("out-") {
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        if !digits.is_empty() {
            return Some(format!("out-{digits}"));
        }
    }

    if let Some(mapped) = alias_lookup(s) {
        return Some(mapped.to_string());
    }

    let mut stripped = s;
    for suffix in SUFFIXES {
        if let Some(rest) = stripped.strip_suffix(suffix) {
            stripped = rest;
            break;
        }
    }

    Some(alias_lookup(stripped).unwrap_or(stripped).to_string())
}

/// Default outlet port names for a unit kind with no explicit outlet
/// handles, assigned sequentially as outgoing connections are discovered.
pub fn default_outlet_ports(kind: &str) -> Vec<String> {
    match kind {
        "FlashDrum" | "ConversionReactor" | "EquilibriumReactor" => {
            vec!["vapor".into(), "liquid".into()]
        }
        "ThreePhaseSeparator" => vec!["gas".into(), "oil".into(), "water".into()],
        "ShortcutDistillation" | "RigorousDistillation" => vec!["distillate".into(), "bottoms".into()],
        "Splitter" => (1..=8).map(|i| format!("out-{i}")).collect(),
        "HeatExchanger" | "RatingHeatExchanger" => vec!["hot_out".into(), "cold_out".into()],
        _ => vec!["out".into()],
    }
}

/// Default inlet port names for a unit kind with no explicit inlet handles.
pub fn default_inlet_ports(kind: &str) -> Vec<String> {
    match kind {
        "Mixer" => (1..=8).map(|i| format!("in-{i}")).collect(),
        "HeatExchanger" | "RatingHeatExchanger" => vec!["hot_in".into(), "cold_in".into()],
        "RigorousDistillation" => vec!["feed".into()],
        _ => vec!["in".into()],
    }
}
