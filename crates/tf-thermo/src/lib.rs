//! Thermodynamic property package and flash engine: component resolution,
//! cubic-EOS and activity-coefficient models, a simplified IAPWS water
//! correlation, and the stream value type flowsheet solving is built on.

pub mod activity;
pub mod constants;
pub mod eos;
pub mod error;
pub mod flash;
pub mod iapws;
pub mod package;
pub mod resolver;
pub mod stream;

pub use constants::{ChemicalConstants, builtin_registry};
pub use error::{ThermoError, ThermoResult};
pub use flash::{FlashEngine, ThreePhaseResult};
pub use package::{PackageKind, normalize_package_name};
pub use resolver::{Cas, ComponentResolver};
pub use stream::{Phase, StreamState, normalize_composition, phase_from_vapor_fraction};

/// Build a flash engine from user-facing component names and a package name,
/// resolving components through the registry and normalizing the package
/// spelling, per spec.md §4.A/§4.B.
pub fn build_engine(package_name: &str, component_names: &[String]) -> ThermoResult<FlashEngine> {
    let kind = normalize_package_name(package_name)?;
    let resolver = ComponentResolver::default();
    let cas_list: Vec<Cas> = component_names.iter().map(|n| resolver.resolve(n)).collect::<ThermoResult<_>>()?;
    let components = resolver.load_constants(&cas_list)?;
    Ok(FlashEngine::new(kind, components, None))
}
