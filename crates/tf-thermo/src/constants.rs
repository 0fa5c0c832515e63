//! Pure-component constants and temperature-dependent correlations.
//!
//! Grounded on `thermo_engine.py`'s component constant table: critical
//! properties, ideal-gas formation data, and simple correlations for
//! vapor pressure, ideal-gas Cp, liquid density, viscosity and thermal
//! conductivity. The correlations here are deliberately compact
//! (Antoine / low-order polynomials) rather than the full DIPPR
//! correlation set the Python source draws from `chemicals`/`thermo`,
//! but expose the same callable shape so the flash engine never needs
//! to know which correlation form backs a given property.

use std::collections::BTreeMap;

/// Antoine vapor-pressure correlation: `log10(P[mmHg]) = a - b / (T[K] + c)`,
/// converted to Pa by the caller.
#[derive(Debug, Clone, Copy)]
pub struct Antoine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
}

impl Antoine {
    /// Vapor pressure in Pa at temperature `t_k`.
    pub fn psat(&self, t_k: f64) -> Option<f64> {
        let log10_mmhg = self.a - self.b / (t_k + self.c);
        if !log10_mmhg.is_finite() || log10_mmhg > 12.0 {
            return None;
        }
        let mmhg = 10f64.powf(log10_mmhg);
        let pa = mmhg * 133.322_37;
        if pa.is_finite() && pa > 0.0 { Some(pa) } else { None }
    }
}

/// Ideal-gas heat capacity polynomial: `Cp = a + b*T + c*T^2 + d*T^3` (J/mol/K).
#[derive(Debug, Clone, Copy)]
pub struct CpPoly {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
}

impl CpPoly {
    pub fn cp(&self, t_k: f64) -> f64 {
        self.a + self.b * t_k + self.c * t_k * t_k + self.d * t_k * t_k * t_k
    }

    /// Enthalpy of heating an ideal gas from `t_ref` to `t_k` (J/mol).
    pub fn integral_h(&self, t_ref: f64, t_k: f64) -> f64 {
        let f = |t: f64| {
            self.a * t + self.b * t * t / 2.0 + self.c * t.powi(3) / 3.0 + self.d * t.powi(4) / 4.0
        };
        f(t_k) - f(t_ref)
    }

    /// Entropy of heating an ideal gas from `t_ref` to `t_k` (J/mol/K).
    pub fn integral_s(&self, t_ref: f64, t_k: f64) -> f64 {
        let f = |t: f64| {
            self.a * t.ln() + self.b * t + self.c * t * t / 2.0 + self.d * t.powi(3) / 3.0
        };
        f(t_k) - f(t_ref)
    }
}

#[derive(Debug, Clone)]
pub struct ChemicalConstants {
    pub cas: String,
    pub name: String,
    pub formula: BTreeMap<String, u32>,
    pub mw: f64,
    pub tc: f64,
    pub pc: f64,
    pub omega: f64,
    pub tb: f64,
    /// Standard ideal-gas enthalpy of formation, J/mol.
    pub hf_ig: f64,
    /// Standard ideal-gas absolute entropy, J/mol/K.
    pub s0_ig: f64,
    pub antoine: Antoine,
    pub cp_ig: CpPoly,
    /// Liquid molar density at 298.15 K, mol/m^3 (treated as weakly
    /// T-dependent via a simple linear correction below).
    pub liquid_molar_density_298: f64,
    pub liquid_viscosity_cp_298: f64,
    pub thermal_conductivity_298: f64,
}

impl ChemicalConstants {
    pub fn liquid_molar_density(&self, t_k: f64) -> f64 {
        let dt = t_k - 298.15;
        (self.liquid_molar_density_298 * (1.0 - 0.0012 * dt)).max(1.0)
    }
}

/// The built-in compound registry. Grounded on the species `thermo_engine.py`
/// exercises in the end-to-end test scenarios (spec §8): water, light
/// hydrocarbons, benzene/toluene, methanol, and common gas-treating amines.
pub fn builtin_registry() -> Vec<ChemicalConstants> {
    fn formula(pairs: &[(&str, u32)]) -> BTreeMap<String, u32> {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    vec![
        ChemicalConstants {
            cas: "7732-18-5".into(),
            name: "water".into(),
            formula: formula(&[("H", 2), ("O", 1)]),
            mw: 18.01528,
            tc: 647.096,
            pc: 22_064_000.0,
            omega: 0.3449,
            tb: 373.15,
            hf_ig: -241_818.0,
            s0_ig: 188.84,
            antoine: Antoine { a: 8.07131, b: 1730.63, c: 233.426 },
            cp_ig: CpPoly { a: 32.24, b: 1.924e-3, c: 1.055e-5, d: -3.596e-9 },
            liquid_molar_density_298: 55_345.0,
            liquid_viscosity_cp_298: 0.89,
            thermal_conductivity_298: 0.606,
        },
        ChemicalConstants {
            cas: "74-82-8".into(),
            name: "methane".into(),
            formula: formula(&[("C", 1), ("H", 4)]),
            mw: 16.0425,
            tc: 190.56,
            pc: 4_599_000.0,
            omega: 0.0115,
            tb: 111.66,
            hf_ig: -74_600.0,
            s0_ig: 186.25,
            antoine: Antoine { a: 6.61184, b: 389.93, c: 266.0 },
            cp_ig: CpPoly { a: 19.25, b: 5.213e-2, c: 1.197e-5, d: -1.132e-8 },
            liquid_molar_density_298: 28_000.0,
            liquid_viscosity_cp_298: 0.118,
            thermal_conductivity_298: 0.19,
        },
        ChemicalConstants {
            cas: "110-54-3".into(),
            name: "n-hexane".into(),
            formula: formula(&[("C", 6), ("H", 14)]),
            mw: 86.1754,
            tc: 507.6,
            pc: 3_025_000.0,
            omega: 0.3007,
            tb: 341.88,
            hf_ig: -167_300.0,
            s0_ig: 386.8,
            antoine: Antoine { a: 6.87776, b: 1171.53, c: 224.366 },
            cp_ig: CpPoly { a: -20.04, b: 5.450e-1, c: -3.12e-4, d: 6.95e-8 },
            liquid_molar_density_298: 7_680.0,
            liquid_viscosity_cp_298: 0.294,
            thermal_conductivity_298: 0.124,
        },
        ChemicalConstants {
            cas: "71-43-2".into(),
            name: "benzene".into(),
            formula: formula(&[("C", 6), ("H", 6)]),
            mw: 78.1118,
            tc: 562.05,
            pc: 4_895_000.0,
            omega: 0.2103,
            tb: 353.24,
            hf_ig: 82_930.0,
            s0_ig: 269.2,
            antoine: Antoine { a: 6.90565, b: 1211.033, c: 220.79 },
            cp_ig: CpPoly { a: -33.92, b: 4.739e-1, c: -3.017e-4, d: 7.130e-8 },
            liquid_molar_density_298: 11_240.0,
            liquid_viscosity_cp_298: 0.604,
            thermal_conductivity_298: 0.144,
        },
        ChemicalConstants {
            cas: "108-88-3".into(),
            name: "toluene".into(),
            formula: formula(&[("C", 7), ("H", 8)]),
            mw: 92.1384,
            tc: 591.75,
            pc: 4_108_000.0,
            omega: 0.2640,
            tb: 383.75,
            hf_ig: 50_170.0,
            s0_ig: 320.7,
            antoine: Antoine { a: 6.95464, b: 1344.8, c: 219.482 },
            cp_ig: CpPoly { a: -24.35, b: 5.172e-1, c: -3.179e-4, d: 7.222e-8 },
            liquid_molar_density_298: 9_360.0,
            liquid_viscosity_cp_298: 0.560,
            thermal_conductivity_298: 0.131,
        },
        ChemicalConstants {
            cas: "67-56-1".into(),
            name: "methanol".into(),
            formula: formula(&[("C", 1), ("H", 4), ("O", 1)]),
            mw: 32.042,
            tc: 512.5,
            pc: 8_084_000.0,
            omega: 0.5625,
            tb: 337.85,
            hf_ig: -201_300.0,
            s0_ig: 239.9,
            antoine: Antoine { a: 8.08097, b: 1582.271, c: 239.726 },
            cp_ig: CpPoly { a: 21.15, b: 7.092e-2, c: 2.587e-5, d: -2.852e-8 },
            liquid_molar_density_298: 24_700.0,
            liquid_viscosity_cp_298: 0.544,
            thermal_conductivity_298: 0.202,
        },
        ChemicalConstants {
            cas: "7727-37-9".into(),
            name: "nitrogen".into(),
            formula: formula(&[("N", 2)]),
            mw: 28.0134,
            tc: 126.2,
            pc: 3_400_000.0,
            omega: 0.0377,
            tb: 77.36,
            hf_ig: 0.0,
            s0_ig: 191.6,
            antoine: Antoine { a: 6.49457, b: 255.68, c: 266.55 },
            cp_ig: CpPoly { a: 28.9, b: -1.571e-3, c: 8.081e-6, d: -2.873e-9 },
            liquid_molar_density_298: 28_900.0,
            liquid_viscosity_cp_298: 0.158,
            thermal_conductivity_298: 0.026,
        },
        ChemicalConstants {
            cas: "124-38-9".into(),
            name: "carbon dioxide".into(),
            formula: formula(&[("C", 1), ("O", 2)]),
            mw: 44.01,
            tc: 304.13,
            pc: 7_377_000.0,
            omega: 0.2239,
            tb: 194.7,
            hf_ig: -393_510.0,
            s0_ig: 213.79,
            antoine: Antoine { a: 6.81228, b: 1301.679, c: -3.494 },
            cp_ig: CpPoly { a: 19.8, b: 7.344e-2, c: -5.602e-5, d: 1.715e-8 },
            liquid_molar_density_298: 26_000.0,
            liquid_viscosity_cp_298: 0.07,
            thermal_conductivity_298: 0.017,
        },
        ChemicalConstants {
            cas: "7783-06-4".into(),
            name: "hydrogen sulfide".into(),
            formula: formula(&[("H", 2), ("S", 1)]),
            mw: 34.08,
            tc: 373.2,
            pc: 8_963_000.0,
            omega: 0.0942,
            tb: 212.8,
            hf_ig: -20_600.0,
            s0_ig: 205.6,
            antoine: Antoine { a: 7.281, b: 903.62, c: 240.0 },
            cp_ig: CpPoly { a: 31.9, b: 1.44e-3, c: 2.43e-5, d: -1.18e-8 },
            liquid_molar_density_298: 29_000.0,
            liquid_viscosity_cp_298: 0.12,
            thermal_conductivity_298: 0.015,
        },
        ChemicalConstants {
            cas: "7664-41-7".into(),
            name: "ammonia".into(),
            formula: formula(&[("N", 1), ("H", 3)]),
            mw: 17.0305,
            tc: 405.5,
            pc: 11_280_000.0,
            omega: 0.2526,
            tb: 239.82,
            hf_ig: -45_940.0,
            s0_ig: 192.5,
            antoine: Antoine { a: 7.55466, b: 1002.711, c: 247.885 },
            cp_ig: CpPoly { a: 27.31, b: 2.383e-2, c: 1.707e-5, d: -1.185e-8 },
            liquid_molar_density_298: 35_000.0,
            liquid_viscosity_cp_298: 0.13,
            thermal_conductivity_298: 0.022,
        },
    ]
}
