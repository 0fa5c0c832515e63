//! Flash engine: given two intensive specifications plus composition,
//! returns a fully-resolved `StreamState`. Grounded on the operation list
//! and thresholds in spec.md §4.C, with VLE K-values from the Wilson
//! correlation (cubic packages) or NRTL-modified Raoult's law (activity
//! packages), and real-mixture departure functions from the cubic EOS.

use std::sync::{Arc, OnceLock};

use crate::activity::{NrtlParams, nrtl_gammas};
use crate::constants::ChemicalConstants;
use crate::error::{ThermoError, ThermoResult};
use crate::eos::{self, CubicKind, R_GAS};
use crate::iapws;
use crate::package::PackageKind;
use crate::stream::{Phase, StreamState, normalize_composition, phase_from_vapor_fraction};

const T_REF: f64 = 298.15;

pub struct FlashEngine {
    pub kind: PackageKind,
    cubic_kind: CubicKind,
    pub components: Vec<ChemicalConstants>,
    pub component_names: Arc<Vec<String>>,
    pub component_mw: Arc<Vec<f64>>,
    pub kij: Vec<Vec<f64>>,
    pub nrtl: Option<NrtlParams>,
    /// Lazily-built PR fallback used when an activity-coefficient flash
    /// fails; built once and reused, per the "interior-mutable one-shot
    /// initializer" design note in spec.md §9.
    fallback: OnceLock<Box<FlashEngine>>,
}

pub struct ThreePhaseResult {
    pub gas: StreamState,
    pub liquid1: StreamState,
    pub liquid2: StreamState,
}

impl FlashEngine {
    pub fn new(kind: PackageKind, components: Vec<ChemicalConstants>, kij: Option<Vec<Vec<f64>>>) -> Self {
        let n = components.len();
        let cubic_kind = match kind {
            PackageKind::Srk => CubicKind::Srk,
            _ => CubicKind::Pr,
        };
        let nrtl = matches!(kind, PackageKind::Nrtl | PackageKind::Unifac | PackageKind::Uniquac)
            .then(|| NrtlParams::ideal(n));
        let names = Arc::new(components.iter().map(|c| c.name.clone()).collect::<Vec<_>>());
        let mws = Arc::new(components.iter().map(|c| c.mw).collect::<Vec<_>>());
        let kij = kij.unwrap_or_else(|| vec![vec![0.0; n]; n]);
        Self {
            kind,
            cubic_kind,
            components,
            component_names: names,
            component_mw: mws,
            kij,
            nrtl,
            fallback: OnceLock::new(),
        }
    }

    pub fn n(&self) -> usize {
        self.components.len()
    }

    fn fallback_engine(&self) -> &FlashEngine {
        self.fallback.get_or_init(|| {
            tracing::warn!("activity-coefficient flash failed, building lazy PR fallback");
            Box::new(FlashEngine::new(PackageKind::Pr, self.components.clone(), Some(self.kij.clone())))
        })
    }

    fn mw_mix(&self, xs: &[f64]) -> f64 {
        xs.iter().zip(self.component_mw.iter()).map(|(x, mw)| x * mw).sum()
    }

    /// Wilson-correlation or activity-corrected K-value at (T, P).
    fn k_value(&self, i: usize, t: f64, p: f64, liquid_xs: &[f64]) -> f64 {
        let c = &self.components[i];
        match self.nrtl.as_ref() {
            Some(params) => {
                let gammas = nrtl_gammas(params, liquid_xs);
                let psat = c.antoine.psat(t).unwrap_or(p);
                (gammas[i] * psat / p).max(1e-12)
            }
            None => {
                let tr = c.tc / t;
                ((c.pc / p) * (5.373 * (1.0 + c.omega) * (1.0 - tr)).exp()).max(1e-12)
            }
        }
    }

    fn k_values(&self, t: f64, p: f64, zs: &[f64]) -> Vec<f64> {
        (0..self.n()).map(|i| self.k_value(i, t, p, zs)).collect()
    }

    /// Rachford-Rice: solve for vapor fraction given K-values and feed zs.
    fn rachford_rice(zs: &[f64], ks: &[f64]) -> f64 {
        let g = |vf: f64| -> f64 {
            zs.iter().zip(ks.iter()).map(|(z, k)| z * (k - 1.0) / (1.0 + vf * (k - 1.0))).sum()
        };
        if g(0.0) <= 0.0 {
            return 0.0;
        }
        if g(1.0) >= 0.0 {
            return 1.0;
        }
        let (mut lo, mut hi) = (0.0, 1.0);
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if g(mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        0.5 * (lo + hi)
    }

    fn phase_split(&self, t: f64, p: f64, zs: &[f64]) -> (f64, Vec<f64>, Vec<f64>) {
        if self.n() == 1 {
            let vf = if p < self.components[0].antoine.psat(t).unwrap_or(p) { 1.0 } else { 0.0 };
            return (vf, vec![1.0], vec![1.0]);
        }
        let ks = self.k_values(t, p, zs);
        let vf = Self::rachford_rice(zs, &ks);
        let xs: Vec<f64> = zs.iter().zip(ks.iter()).map(|(z, k)| z / (1.0 + vf * (k - 1.0))).collect();
        let ys: Vec<f64> = xs.iter().zip(ks.iter()).map(|(x, k)| x * k).collect();
        (vf.clamp(0.0, 1.0), normalize_composition(&xs), normalize_composition(&ys))
    }

    fn ideal_gas_h(&self, t: f64, comp_xs: &[f64]) -> f64 {
        comp_xs
            .iter()
            .zip(self.components.iter())
            .map(|(x, c)| x * (c.hf_ig + c.cp_ig.integral_h(T_REF, t)))
            .sum()
    }

    fn ideal_gas_s(&self, t: f64, comp_xs: &[f64]) -> f64 {
        let mixing: f64 = comp_xs.iter().filter(|x| **x > 1e-15).map(|x| -R_GAS * x * x.ln()).sum();
        comp_xs
            .iter()
            .zip(self.components.iter())
            .map(|(x, c)| x * (c.s0_ig + c.cp_ig.integral_s(T_REF, t)))
            .sum::<f64>()
            + mixing
    }

    fn cp_ig_mix(&self, t: f64, comp_xs: &[f64]) -> f64 {
        comp_xs.iter().zip(self.components.iter()).map(|(x, c)| x * c.cp_ig.cp(t)).sum()
    }

    fn liquid_molar_volume(&self, t: f64, xs: &[f64]) -> f64 {
        xs.iter().zip(self.components.iter()).map(|(x, c)| x / c.liquid_molar_density(t)).sum()
    }

    fn vapor_z(&self, t: f64, p: f64, ys: &[f64]) -> (f64, eos::MixtureParams) {
        let mixture = eos::mix(self.cubic_kind, &self.components, ys, t, &self.kij);
        let roots = eos::solve_z(self.cubic_kind, &mixture, p, t);
        let z = roots.iter().cloned().fold(0.0_f64, f64::max).max(0.05);
        (z, mixture)
    }

    /// Build the full `StreamState` for a converged phase split at (T, P).
    fn build_state(&self, t: f64, p: f64, zs: &[f64], vf: f64, xs: &[f64], ys: &[f64], molar_flow: f64) -> StreamState {
        let vf = vf.clamp(0.0, 1.0);
        let lf = 1.0 - vf;

        let h_liq_ig = self.ideal_gas_h(t, xs);
        let s_liq_ig = self.ideal_gas_s(t, xs);
        let h_vap_ig = self.ideal_gas_h(t, ys);
        let s_vap_ig = self.ideal_gas_s(t, ys);

        let (z_vap, vap_mix) = self.vapor_z(t, p, ys);
        let h_vap_dep = eos::h_departure(self.cubic_kind, &vap_mix, z_vap, p, t);
        let s_vap_dep = eos::s_departure(self.cubic_kind, &vap_mix, z_vap, p, t);

        let h_mix = vf * (h_vap_ig + h_vap_dep) + lf * h_liq_ig;
        let s_mix = vf * (s_vap_ig + s_vap_dep) + lf * s_liq_ig;
        let cp_mix = vf * self.cp_ig_mix(t, ys) + lf * self.cp_ig_mix(t, xs);
        let mw_mix = vf * self.mw_mix(ys) + lf * self.mw_mix(xs);

        let cv_vap = (self.cp_ig_mix(t, ys) - R_GAS).max(1.0);
        let cv_mix = if vf > 0.0001 { vf * cv_vap + lf * cp_mix.max(1.0) } else { cp_mix };
        let gamma = if cv_mix > 0.0 { cp_mix / cv_mix } else { 1.3 };

        let vap_density = p * self.mw_mix(ys) / 1000.0 / (z_vap * R_GAS * t);
        let liq_vol = self.liquid_molar_volume(t, xs);
        let liq_density = if liq_vol > 0.0 { self.mw_mix(xs) / 1000.0 / liq_vol } else { 0.0 };

        let density = if vf > 0.9999 {
            Some(vap_density)
        } else if vf < 0.0001 {
            Some(liq_density)
        } else {
            let vap_mass = vf * self.mw_mix(ys);
            let liq_mass = lf * self.mw_mix(xs);
            let total_mass = vap_mass + liq_mass;
            if total_mass > 0.0 && vap_density > 0.0 && liq_density > 0.0 {
                Some(total_mass / (vap_mass / vap_density + liq_mass / liq_density))
            } else {
                None
            }
        };

        let tc_mix: f64 = xs.iter().zip(self.components.iter()).map(|(x, c)| x * c.tc).sum();
        let surface_tension = if lf > 0.0001 && tc_mix > 0.0 {
            Some((0.06 * (1.0 - t / tc_mix).max(0.0).powf(1.25)).max(0.0))
        } else {
            None
        };

        let viscosity = Some(
            (vf * 1.2e-5 + lf * xs.iter().zip(self.components.iter()).map(|(x, c)| x * c.liquid_viscosity_cp_298 * 1e-3).sum::<f64>())
                .max(1e-7),
        );
        let thermal_conductivity = Some(
            vf * 0.025 + lf * xs.iter().zip(self.components.iter()).map(|(x, c)| x * c.thermal_conductivity_298).sum::<f64>(),
        );
        let speed_of_sound = Some(if vf > 0.5 {
            (gamma * z_vap * R_GAS * t / mw_mix.max(1e-6)).max(0.0).sqrt()
        } else {
            1300.0
        });

        let jt = Some(self.joule_thomson(t, p, ys, vf));

        StreamState {
            component_names: self.component_names.clone(),
            component_mw: self.component_mw.clone(),
            t_k: t,
            p_pa: p,
            phase: if vf > 0.9999 { Phase::Vapor } else if vf < 0.0001 { Phase::Liquid } else { Phase::TwoPhase },
            vapor_fraction: vf,
            liquid_fraction: lf,
            zs: zs.to_vec(),
            ys: (vf > 0.0001).then(|| ys.to_vec()),
            xs: (lf > 0.0001).then(|| xs.to_vec()),
            xs2: None,
            enthalpy_j_mol: h_mix,
            entropy_j_mol_k: s_mix,
            cp_j_mol_k: Some(cp_mix),
            cv_j_mol_k: Some(cv_mix),
            gibbs_j_mol: Some(h_mix - t * s_mix),
            molecular_weight: mw_mix,
            density_kg_m3: density,
            viscosity_pa_s: viscosity,
            thermal_conductivity_w_m_k: thermal_conductivity,
            speed_of_sound_m_s: speed_of_sound,
            joule_thomson_k_per_pa: jt,
            isentropic_exponent: Some(gamma),
            compressibility_factor: Some(if vf > 0.5 { z_vap } else { p * liq_vol / (R_GAS * t) }),
            surface_tension_n_m: surface_tension,
            molar_flow_mol_s: molar_flow,
            mass_flow_kg_s: molar_flow * mw_mix / 1000.0,
        }
    }

    fn joule_thomson(&self, t: f64, p: f64, ys: &[f64], vf: f64) -> f64 {
        if vf < 0.0001 {
            return -1.0e-7;
        }
        let dt = 0.5;
        let (z1, _) = self.vapor_z(t - dt, p, ys);
        let (z2, _) = self.vapor_z(t + dt, p, ys);
        let v1 = z1 * R_GAS * (t - dt) / p;
        let v2 = z2 * R_GAS * (t + dt) / p;
        let dv_dt = (v2 - v1) / (2.0 * dt);
        let (z, _) = self.vapor_z(t, p, ys);
        let v = z * R_GAS * t / p;
        let cp = self.cp_ig_mix(t, ys).max(1.0);
        (t * dv_dt - v) / cp
    }

    pub fn pt_flash(&self, t: f64, p: f64, zs: &[f64], molar_flow: f64) -> ThermoResult<StreamState> {
        if zs.len() != self.n() {
            return Err(ThermoError::CompositionMismatch { got: zs.len(), expected: self.n() });
        }
        if matches!(self.kind, PackageKind::IapwsWater) && self.n() == 1 {
            return Ok(self.iapws_state(t, p, molar_flow));
        }
        let zs = normalize_composition(zs);
        let (vf, xs, ys) = self.phase_split(t, p, &zs);
        let state = self.build_state(t, p, &zs, vf, &xs, &ys, molar_flow);
        if state.enthalpy_j_mol.is_finite() && state.entropy_j_mol_k.is_finite() {
            return Ok(state);
        }
        if self.nrtl.is_some() {
            tracing::warn!("PT flash produced non-finite state on activity package, retrying on PR fallback");
            return self.fallback_engine().pt_flash(t, p, &zs, molar_flow);
        }
        Err(ThermoError::FlashNonConvergent("pt_flash"))
    }

    fn iapws_state(&self, t: f64, p: f64, molar_flow: f64) -> StreamState {
        let props = iapws::pt_props(t, p);
        let mw = iapws::MW_WATER * 1000.0;
        StreamState {
            component_names: self.component_names.clone(),
            component_mw: self.component_mw.clone(),
            t_k: t,
            p_pa: p,
            phase: match props.phase {
                iapws::WaterPhase::Vapor => Phase::Vapor,
                iapws::WaterPhase::Liquid => Phase::Liquid,
            },
            vapor_fraction: if matches!(props.phase, iapws::WaterPhase::Vapor) { 1.0 } else { 0.0 },
            liquid_fraction: if matches!(props.phase, iapws::WaterPhase::Vapor) { 0.0 } else { 1.0 },
            zs: vec![1.0],
            ys: matches!(props.phase, iapws::WaterPhase::Vapor).then(|| vec![1.0]),
            xs: matches!(props.phase, iapws::WaterPhase::Liquid).then(|| vec![1.0]),
            xs2: None,
            enthalpy_j_mol: props.h_j_kg * mw / 1000.0,
            entropy_j_mol_k: props.s_j_kg_k * mw / 1000.0,
            cp_j_mol_k: Some(props.cp_j_kg_k * mw / 1000.0),
            cv_j_mol_k: Some(props.cv_j_kg_k * mw / 1000.0),
            gibbs_j_mol: Some((props.h_j_kg - t * props.s_j_kg_k) * mw / 1000.0),
            molecular_weight: mw,
            density_kg_m3: Some(props.rho_kg_m3),
            viscosity_pa_s: Some(if matches!(props.phase, iapws::WaterPhase::Vapor) { 1.3e-5 } else { 2.8e-4 }),
            thermal_conductivity_w_m_k: Some(if matches!(props.phase, iapws::WaterPhase::Vapor) { 0.03 } else { 0.6 }),
            speed_of_sound_m_s: Some(props.speed_of_sound_m_s),
            joule_thomson_k_per_pa: Some(props.jt_k_per_pa),
            isentropic_exponent: Some(props.cp_j_kg_k / props.cv_j_kg_k),
            compressibility_factor: Some(if matches!(props.phase, iapws::WaterPhase::Vapor) {
                p / (props.rho_kg_m3.max(1e-9) * 461.52 * t)
            } else {
                1.0
            }),
            surface_tension_n_m: matches!(props.phase, iapws::WaterPhase::Liquid).then_some(0.0589),
            molar_flow_mol_s: molar_flow,
            mass_flow_kg_s: molar_flow * mw / 1000.0,
        }
    }

    pub fn ph_flash(&self, p: f64, h_target: f64, zs: &[f64], molar_flow: f64) -> ThermoResult<StreamState> {
        if matches!(self.kind, PackageKind::IapwsWater) && self.n() == 1 {
            return self.iapws_newton(p, molar_flow, |t| iapws::pt_props(t, p).h_j_kg, h_target / (iapws::MW_WATER * 1000.0) * 1000.0, 0.1);
        }
        let mut t = 350.0;
        for _ in 0..100 {
            let state = self.pt_flash(t, p, zs, molar_flow)?;
            let residual = state.enthalpy_j_mol - h_target;
            if residual.abs() < 1e-2 {
                return Ok(state);
            }
            let cp = state.cp_j_mol_k.unwrap_or(30.0).max(1.0);
            t -= residual / cp;
            t = t.clamp(100.0, 2500.0);
        }
        self.pt_flash(t, p, zs, molar_flow)
    }

    pub fn ps_flash(&self, p: f64, s_target: f64, zs: &[f64], molar_flow: f64) -> ThermoResult<StreamState> {
        if matches!(self.kind, PackageKind::IapwsWater) && self.n() == 1 {
            return self.iapws_newton(p, molar_flow, |t| iapws::pt_props(t, p).s_j_kg_k, s_target / (iapws::MW_WATER * 1000.0) * 1000.0, 0.01);
        }
        let mut t = 350.0;
        for _ in 0..100 {
            let state = self.pt_flash(t, p, zs, molar_flow)?;
            let residual = state.entropy_j_mol_k - s_target;
            if residual.abs() < 1e-4 {
                return Ok(state);
            }
            let cp_over_t = state.cp_j_mol_k.unwrap_or(30.0).max(1.0) / t;
            t -= residual / cp_over_t;
            t = t.clamp(100.0, 2500.0);
        }
        self.pt_flash(t, p, zs, molar_flow)
    }

    /// Shared Newton loop for the IAPWS PH/PS path: bounded [273.16, 2273.15] K,
    /// initial guess 373.15 K, 100-iteration cap, per spec.md §4.C.
    fn iapws_newton(
        &self,
        p: f64,
        molar_flow: f64,
        f: impl Fn(f64) -> f64,
        target_mass_basis: f64,
        tol: f64,
    ) -> ThermoResult<StreamState> {
        let mut t = 373.15;
        for _ in 0..100 {
            let residual = f(t) - target_mass_basis;
            if residual.abs() < tol {
                return Ok(self.iapws_state(t, p, molar_flow));
            }
            let df = (f(t + 0.5) - f(t - 0.5)) / 1.0;
            if df.abs() < 1e-9 {
                break;
            }
            t -= residual / df;
            t = t.clamp(273.16, 2273.15);
        }
        Ok(self.iapws_state(t, p, molar_flow))
    }

    pub fn tvf_flash(&self, t: f64, vf_target: f64, zs: &[f64], molar_flow: f64) -> ThermoResult<StreamState> {
        let zs = normalize_composition(zs);
        let g = |p: f64| -> f64 {
            let ks = self.k_values(t, p, &zs);
            Self::rachford_rice(&zs, &ks) - vf_target
        };
        let (mut lo, mut hi) = (1.0, 1.0e8);
        for _ in 0..200 {
            let mid = (lo * hi).sqrt();
            if g(mid) > 0.0 {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        self.pt_flash(t, (lo * hi).sqrt(), &zs, molar_flow)
    }

    pub fn pvf_flash(&self, p: f64, vf_target: f64, zs: &[f64], molar_flow: f64) -> ThermoResult<StreamState> {
        let zs = normalize_composition(zs);
        let g = |t: f64| -> f64 {
            let ks = self.k_values(t, p, &zs);
            Self::rachford_rice(&zs, &ks) - vf_target
        };
        let (mut lo, mut hi) = (150.0, 1500.0);
        for _ in 0..200 {
            let mid = 0.5 * (lo + hi);
            if g(mid) > 0.0 {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        self.pt_flash(0.5 * (lo + hi), p, &zs, molar_flow)
    }

    pub fn bubble_point_t(&self, p: f64, zs: &[f64]) -> ThermoResult<f64> {
        let zs = normalize_composition(zs);
        let g = |t: f64| -> f64 { self.k_values(t, p, &zs).iter().zip(zs.iter()).map(|(k, z)| z * k).sum::<f64>() - 1.0 };
        bisect(g, 150.0, 1500.0).ok_or(ThermoError::FlashNonConvergent("bubble_point_T"))
    }

    pub fn dew_point_t(&self, p: f64, zs: &[f64]) -> ThermoResult<f64> {
        let zs = normalize_composition(zs);
        let g = |t: f64| -> f64 { zs.iter().zip(self.k_values(t, p, &zs).iter()).map(|(z, k)| z / k.max(1e-12)).sum::<f64>() - 1.0 };
        bisect(g, 150.0, 1500.0).ok_or(ThermoError::FlashNonConvergent("dew_point_T"))
    }

    /// Three-phase VLLE flash: a 2-phase PT flash followed by a
    /// composition-based water/oil heuristic split of the liquid phase,
    /// matching the one VLLE path that was judged tractable within scope
    /// (see DESIGN.md). If no liquid phase or no water is present the
    /// second liquid phase is returned as a zero-flow sentinel.
    pub fn vlle_flash(&self, t: f64, p: f64, zs: &[f64], molar_flow: f64) -> ThermoResult<ThreePhaseResult> {
        let base = self.pt_flash(t, p, zs, molar_flow)?;
        let xs = base.xs.clone().unwrap_or_else(|| base.zs.clone());
        let water_idx = self.component_names.iter().position(|n| n == "water");

        let vapor_flow = base.vapor_fraction * molar_flow;
        let gas = if base.vapor_fraction > 0.0001 {
            self.pt_flash(t, p, base.ys.as_ref().unwrap_or(&base.zs), vapor_flow)?
        } else {
            zero_flow_sentinel(&base, t, p)
        };

        let liquid_flow = base.liquid_fraction * molar_flow;
        let water_frac = water_idx.map(|i| xs[i]).unwrap_or(0.0);

        if water_frac > 0.01 && liquid_flow > 0.0 {
            let mut oil_zs = xs.clone();
            if let Some(i) = water_idx {
                oil_zs[i] = 0.0;
            }
            let oil_zs = normalize_composition(&oil_zs);
            let mut water_zs = vec![0.0; self.n()];
            if let Some(i) = water_idx {
                water_zs[i] = 1.0;
            }
            let liquid1 = self.pt_flash(t, p, &oil_zs, liquid_flow * (1.0 - water_frac))?;
            let liquid2 = self.pt_flash(t, p, &water_zs, liquid_flow * water_frac)?;
            Ok(ThreePhaseResult { gas, liquid1, liquid2 })
        } else {
            let liquid1 = if liquid_flow > 0.0 {
                self.pt_flash(t, p, &xs, liquid_flow)?
            } else {
                zero_flow_sentinel(&base, t, p)
            };
            let liquid2 = zero_flow_sentinel(&base, t, p);
            Ok(ThreePhaseResult { gas, liquid1, liquid2 })
        }
    }

    pub fn create_stream(&self, t: f64, p: f64, zs: &[f64], mass_flow_kg_s: f64) -> ThermoResult<StreamState> {
        let zs = normalize_composition(zs);
        let mw_mix = self.mw_mix(&zs);
        let molar_flow = if mw_mix > 0.0 { mass_flow_kg_s * 1000.0 / mw_mix } else { 0.0 };
        self.pt_flash(t, p, &zs, molar_flow)
    }
}

fn zero_flow_sentinel(template: &StreamState, t: f64, p: f64) -> StreamState {
    let mut s = template.clone();
    s.t_k = t;
    s.p_pa = p;
    s.molar_flow_mol_s = 0.0;
    s.mass_flow_kg_s = 0.0;
    s.vapor_fraction = 1.0;
    s.liquid_fraction = 0.0;
    s.phase = Phase::Vapor;
    s
}

fn bisect(g: impl Fn(f64) -> f64, mut lo: f64, mut hi: f64) -> Option<f64> {
    let (mut glo, ghi) = (g(lo), g(hi));
    if glo.signum() == ghi.signum() {
        return None;
    }
    for _ in 0..200 {
        let mid = 0.5 * (lo + hi);
        let gm = g(mid);
        if gm.abs() < 1e-9 || (hi - lo).abs() < 1e-6 {
            return Some(mid);
        }
        if gm.signum() == glo.signum() {
            lo = mid;
            glo = gm;
        } else {
            hi = mid;
        }
    }
    Some(0.5 * (lo + hi))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::builtin_registry;

    fn benzene_toluene_engine() -> FlashEngine {
        let all = builtin_registry();
        let comps: Vec<_> = all.into_iter().filter(|c| c.name == "benzene" || c.name == "toluene").collect();
        FlashEngine::new(PackageKind::Pr, comps, None)
    }

    #[test]
    fn composition_sums_to_one_after_flash() {
        let engine = benzene_toluene_engine();
        let state = engine.pt_flash(373.15, 101_325.0, &[0.5, 0.5], 1.0).unwrap();
        let sum: f64 = state.zs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn benzene_toluene_vapor_is_benzene_rich() {
        let engine = benzene_toluene_engine();
        let state = engine.pt_flash(373.15, 101_325.0, &[0.5, 0.5], 1.0).unwrap();
        if let Some(ys) = &state.ys {
            assert!(ys[0] > 0.5, "vapor should be more benzene-rich than the feed");
        }
    }

    #[test]
    fn mass_flow_consistent_with_molar_flow_and_mw() {
        let engine = benzene_toluene_engine();
        let state = engine.pt_flash(373.15, 101_325.0, &[0.5, 0.5], 10.0).unwrap();
        assert!(state.mass_flow_consistent(0.01));
    }

    #[test]
    fn pt_then_ph_round_trip_recovers_temperature() {
        let engine = benzene_toluene_engine();
        let state = engine.pt_flash(400.0, 101_325.0, &[0.5, 0.5], 1.0).unwrap();
        let h = state.enthalpy_j_mol;
        let back = engine.ph_flash(101_325.0, h, &[0.5, 0.5], 1.0).unwrap();
        assert!((back.t_k - 400.0).abs() < 1.0);
    }
}
