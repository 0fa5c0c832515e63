//! Unit operation library: each variant wraps a typed parameter record and
//! dispatches to a free function that computes outlet `StreamState`s from
//! inlets plus a shared `FlashEngine`.
//!
//! Grounded on `unit_operations.py`'s `UnitOpBase` subclasses: a unit op
//! carries bookkeeping (duty, warnings, pressure drop, efficiency, and a
//! free-form `extra` diagnostics map) separate from its calculation
//! parameters, so `calculate` can mutably borrow the bookkeeping fields
//! while immutably matching on `self.kind`.

use std::collections::BTreeMap;

use tf_thermo::{FlashEngine, StreamState};

pub mod distillation;
pub mod error;
pub mod gibbs;
pub mod heat;
pub mod kinetic;
pub mod pipe;
pub mod reaction;
pub mod reactors;
pub mod rotating;
pub mod separators;
pub mod simple;

pub use error::{UnitOpError, UnitOpResult};
pub use reaction::Reaction;

#[derive(Debug, Clone)]
pub enum UnitOpKind {
    Mixer(simple::MixerParams),
    Splitter(simple::SplitterParams),
    Valve(simple::ValveParams),
    Pump(rotating::PumpParams),
    Compressor(rotating::CompressorParams),
    PolytropicCompressor(rotating::PolytropicCompressorParams),
    Turbine(rotating::TurbineParams),
    HeaterCooler(heat::HeaterCoolerParams),
    HeatExchanger(heat::HeatExchangerParams),
    RatingHeatExchanger(heat::RatingHeatExchangerParams),
    FlashDrum(separators::FlashDrumParams),
    ThreePhaseSeparator(separators::ThreePhaseSeparatorParams),
    ConversionReactor(reactors::ConversionReactorParams),
    EquilibriumReactor(reactors::EquilibriumReactorParams),
    GibbsReactor(gibbs::GibbsReactorParams),
    KineticReactor(kinetic::KineticReactorParams),
    ShortcutDistillation(distillation::ShortcutDistillationParams),
    RigorousDistillation(distillation::RigorousDistillationParams),
    PipeSegment(pipe::PipeSegmentParams),
}

/// A single unit operation instance: identity, bookkeeping, and the typed
/// calculation kind. Every `calculate` call produces fresh outlet
/// `StreamState`s and updates the bookkeeping fields in place.
#[derive(Debug, Clone)]
pub struct UnitOp {
    pub id: String,
    pub name: String,
    pub kind: UnitOpKind,
    pub duty_w: f64,
    pub warnings: Vec<String>,
    pub pressure_drop_pa: f64,
    pub efficiency: Option<f64>,
    pub extra: BTreeMap<String, f64>,
}

impl UnitOp {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: UnitOpKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            duty_w: 0.0,
            warnings: Vec::new(),
            pressure_drop_pa: 0.0,
            efficiency: None,
            extra: BTreeMap::new(),
        }
    }

    /// Reset per-call bookkeeping, then dispatch to the calculation
    /// function matching `self.kind`.
    pub fn calculate(
        &mut self,
        inlets: &BTreeMap<String, StreamState>,
        engine: &FlashEngine,
    ) -> UnitOpResult<BTreeMap<String, StreamState>> {
        self.warnings.clear();
        self.extra.clear();
        self.duty_w = 0.0;
        self.pressure_drop_pa = 0.0;

        match self.kind.clone() {
            UnitOpKind::Mixer(params) => simple::mixer(self, inlets, engine, &params),
            UnitOpKind::Splitter(params) => simple::splitter(self, inlets, &params),
            UnitOpKind::Valve(params) => simple::valve(self, inlets, engine, &params),
            UnitOpKind::Pump(params) => rotating::pump(self, inlets, engine, &params),
            UnitOpKind::Compressor(params) => rotating::compressor(self, inlets, engine, &params),
            UnitOpKind::PolytropicCompressor(params) => rotating::polytropic_compressor(self, inlets, engine, &params),
            UnitOpKind::Turbine(params) => rotating::turbine(self, inlets, engine, &params),
            UnitOpKind::HeaterCooler(params) => heat::heater_cooler(self, inlets, engine, &params),
            UnitOpKind::HeatExchanger(params) => heat::heat_exchanger(self, inlets, engine, &params),
            UnitOpKind::RatingHeatExchanger(params) => heat::rating_heat_exchanger(self, inlets, engine, &params),
            UnitOpKind::FlashDrum(params) => separators::flash_drum(self, inlets, engine, &params),
            UnitOpKind::ThreePhaseSeparator(params) => separators::three_phase_separator(self, inlets, engine, &params),
            UnitOpKind::ConversionReactor(params) => reactors::conversion_reactor(self, inlets, engine, &params),
            UnitOpKind::EquilibriumReactor(params) => reactors::equilibrium_reactor(self, inlets, engine, &params),
            UnitOpKind::GibbsReactor(params) => gibbs::gibbs_reactor(self, inlets, engine, &params),
            UnitOpKind::KineticReactor(params) => kinetic::kinetic_reactor(self, inlets, engine, &params),
            UnitOpKind::ShortcutDistillation(params) => distillation::shortcut_distillation(self, inlets, engine, &params),
            UnitOpKind::RigorousDistillation(params) => distillation::rigorous_distillation(self, inlets, engine, &params),
            UnitOpKind::PipeSegment(params) => pipe::pipe_segment(self, inlets, engine, &params),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap as Map;
    use tf_thermo::{FlashEngine, PackageKind, builtin_registry};

    fn water_engine() -> FlashEngine {
        let comps: Vec<_> = builtin_registry().into_iter().filter(|c| c.name == "water").collect();
        FlashEngine::new(PackageKind::IapwsWater, comps, None)
    }

    #[test]
    fn pump_raises_pressure_and_reports_positive_duty() {
        let engine = water_engine();
        let inlet = engine.pt_flash(300.0, 101_325.0, &[1.0], 10.0).unwrap();
        let mut op = UnitOp::new(
            "p1",
            "feed pump",
            UnitOpKind::Pump(rotating::PumpParams { outlet_pressure_kpa: Some(500.0), efficiency: Some(0.7) }),
        );
        let mut inlets = Map::new();
        inlets.insert("in".to_string(), inlet);
        let out = op.calculate(&inlets, &engine).unwrap();
        let outlet = out.get("out").unwrap();
        assert!(outlet.p_pa > 101_325.0);
        assert!(op.duty_w > 0.0);
    }

    #[test]
    fn splitter_conserves_total_molar_flow() {
        let engine = water_engine();
        let inlet = engine.pt_flash(300.0, 101_325.0, &[1.0], 10.0).unwrap();
        let mut op = UnitOp::new(
            "s1",
            "splitter",
            UnitOpKind::Splitter(simple::SplitterParams { fractions: vec![0.3, 0.7] }),
        );
        let mut inlets = Map::new();
        inlets.insert("in".to_string(), inlet);
        let out = op.calculate(&inlets, &engine).unwrap();
        let total: f64 = out.values().map(|s| s.molar_flow_mol_s).sum();
        assert!((total - 10.0).abs() < 1e-6);
    }
}
