//! The central value type: a fully-resolved thermodynamic stream state.

use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Vapor,
    Liquid,
    TwoPhase,
    LiquidLiquidVapor,
}

/// Classify a phase label from a vapor fraction, per spec §4.C thresholds.
pub fn phase_from_vapor_fraction(vf: f64) -> Phase {
    if vf > 0.9999 {
        Phase::Vapor
    } else if vf < 0.0001 {
        Phase::Liquid
    } else {
        Phase::TwoPhase
    }
}

/// Standard reference conditions for standard-gas-flow calculations, per §4.C.
pub const T_STD: f64 = 288.15;
pub const P_STD: f64 = 101_325.0;
pub const R_GAS: f64 = 8.314462618;

/// Immutable stream state. Every unit op produces a new instance rather than
/// mutating one in place. `component_names`/`component_mw` are shared
/// (`Arc`) across every stream of one solve since they never vary within a
/// single flowsheet.
#[derive(Debug, Clone)]
pub struct StreamState {
    pub component_names: Arc<Vec<String>>,
    pub component_mw: Arc<Vec<f64>>,

    pub t_k: f64,
    pub p_pa: f64,
    pub phase: Phase,
    pub vapor_fraction: f64,
    pub liquid_fraction: f64,

    pub zs: Vec<f64>,
    pub ys: Option<Vec<f64>>,
    pub xs: Option<Vec<f64>>,
    pub xs2: Option<Vec<f64>>,

    pub enthalpy_j_mol: f64,
    pub entropy_j_mol_k: f64,
    pub cp_j_mol_k: Option<f64>,
    pub cv_j_mol_k: Option<f64>,
    pub gibbs_j_mol: Option<f64>,

    /// g/mol.
    pub molecular_weight: f64,
    pub density_kg_m3: Option<f64>,
    pub viscosity_pa_s: Option<f64>,
    pub thermal_conductivity_w_m_k: Option<f64>,
    pub speed_of_sound_m_s: Option<f64>,
    pub joule_thomson_k_per_pa: Option<f64>,
    pub isentropic_exponent: Option<f64>,
    pub compressibility_factor: Option<f64>,
    pub surface_tension_n_m: Option<f64>,

    pub molar_flow_mol_s: f64,
    pub mass_flow_kg_s: f64,
}

impl StreamState {
    /// `mass_flow = molar_flow * MW_mix`, within numerical tolerance.
    pub fn mass_flow_consistent(&self, tol_fraction: f64) -> bool {
        if self.molar_flow_mol_s <= 0.0 {
            return true;
        }
        let expected = self.molar_flow_mol_s * self.molecular_weight / 1000.0;
        let err = (self.mass_flow_kg_s - expected).abs() / expected.max(1e-30);
        err <= tol_fraction
    }

    pub fn vol_flow_m3_h(&self) -> Option<f64> {
        let rho = self.density_kg_m3?;
        if rho <= 0.0 {
            return None;
        }
        Some(self.mass_flow_kg_s / rho * 3600.0)
    }

    pub fn std_gas_flow_sm3_h(&self) -> f64 {
        self.molar_flow_mol_s * R_GAS * T_STD / P_STD * 3600.0
    }

    /// Euclidean distance used by the Wegstein tear-convergence check:
    /// normalized (T, P, molar_flow) plus raw composition differences.
    pub fn distance(&self, other: &StreamState) -> f64 {
        let mut sum = 0.0;
        if self.t_k > 0.0 {
            let d = (self.t_k - other.t_k) / self.t_k;
            sum += d * d;
        }
        if self.p_pa > 0.0 {
            let d = (self.p_pa - other.p_pa) / self.p_pa;
            sum += d * d;
        }
        if self.molar_flow_mol_s > 0.0 {
            let d = (self.molar_flow_mol_s - other.molar_flow_mol_s) / self.molar_flow_mol_s.max(1e-10);
            sum += d * d;
        }
        for (a, b) in self.zs.iter().zip(other.zs.iter()) {
            let d = a - b;
            sum += d * d;
        }
        sum.sqrt()
    }
}

/// Normalize a composition vector to sum to 1, clamping negative entries to
/// zero; falls back to equal fractions if the total is non-positive.
/// Idempotent: normalizing an already-normalized vector returns it unchanged.
pub fn normalize_composition(zs: &[f64]) -> Vec<f64> {
    let clamped: Vec<f64> = zs.iter().map(|z| z.max(0.0)).collect();
    let total: f64 = clamped.iter().sum();
    if total <= 0.0 {
        let n = zs.len().max(1);
        return vec![1.0 / n as f64; zs.len()];
    }
    clamped.into_iter().map(|z| z / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normalization_is_idempotent() {
        let zs = vec![0.3, 0.3, 0.4];
        let once = normalize_composition(&zs);
        let twice = normalize_composition(&once);
        for (a, b) in once.iter().zip(twice.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    proptest! {
        #[test]
        fn normalization_always_sums_to_one(a in 0.0f64..10.0, b in 0.0f64..10.0, c in 0.0f64..10.0) {
            let zs = normalize_composition(&[a, b, c]);
            let sum: f64 = zs.iter().sum();
            prop_assert!((sum - 1.0).abs() < 1e-9);
        }
    }
}
