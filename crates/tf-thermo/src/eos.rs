//! Peng-Robinson / SRK cubic equation of state: mixing rules, compressibility
//! roots, and departure functions used by the flash engine to turn an ideal-gas
//! reference state into real mixture enthalpy/entropy/density.

use crate::constants::ChemicalConstants;

pub const R_GAS: f64 = 8.314462618;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CubicKind {
    Pr,
    Srk,
}

impl CubicKind {
    fn omega_a(self) -> f64 {
        match self {
            CubicKind::Pr => 0.45724,
            CubicKind::Srk => 0.42748,
        }
    }
    fn omega_b(self) -> f64 {
        match self {
            CubicKind::Pr => 0.07780,
            CubicKind::Srk => 0.08664,
        }
    }
    /// `u`, `w` coefficients of the generic cubic
    /// `P = RT/(V-b) - a / (V^2 + u*b*V + w*b^2)`.
    fn uw(self) -> (f64, f64) {
        match self {
            CubicKind::Pr => (2.0, -1.0),
            CubicKind::Srk => (1.0, 0.0),
        }
    }
}

fn acentric_m(kind: CubicKind, omega: f64) -> f64 {
    match kind {
        CubicKind::Pr => 0.37464 + 1.54226 * omega - 0.26992 * omega * omega,
        CubicKind::Srk => 0.480 + 1.574 * omega - 0.176 * omega * omega,
    }
}

/// Per-component `a_i(T)` and `b_i`, plus `da_i/dT` for departure functions.
struct PureParams {
    a: f64,
    da_dt: f64,
    b: f64,
}

fn pure_params(kind: CubicKind, c: &ChemicalConstants, t: f64) -> PureParams {
    let m = acentric_m(kind, c.omega);
    let tr = t / c.tc;
    let sqrt_tr = tr.sqrt();
    let alpha = (1.0 + m * (1.0 - sqrt_tr)).powi(2);
    let a_c = kind.omega_a() * R_GAS * R_GAS * c.tc * c.tc / c.pc;
    let b = kind.omega_b() * R_GAS * c.tc / c.pc;
    let a = a_c * alpha;
    // d(alpha)/dT = -m*(1+m*(1-sqrt(Tr))) / sqrt(Tr*Tc*T)
    let dalpha_dt = -m * (1.0 + m * (1.0 - sqrt_tr)) / (sqrt_tr * c.tc).max(1e-30);
    let da_dt = a_c * dalpha_dt;
    PureParams { a, da_dt, b }
}

pub struct MixtureParams {
    pub a_mix: f64,
    pub da_dt_mix: f64,
    pub b_mix: f64,
}

/// van der Waals one-fluid mixing rule with a (possibly zero) binary
/// interaction matrix `kij[i][j]`.
pub fn mix(kind: CubicKind, consts: &[ChemicalConstants], zs: &[f64], t: f64, kij: &[Vec<f64>]) -> MixtureParams {
    let n = consts.len();
    let pure: Vec<PureParams> = consts.iter().map(|c| pure_params(kind, c, t)).collect();

    let mut a_mix = 0.0;
    let mut da_dt_mix = 0.0;
    let mut b_mix = 0.0;
    for i in 0..n {
        b_mix += zs[i] * pure[i].b;
        for j in 0..n {
            let k = kij.get(i).and_then(|row| row.get(j)).copied().unwrap_or(0.0);
            let aij = (pure[i].a * pure[j].a).sqrt() * (1.0 - k);
            a_mix += zs[i] * zs[j] * aij;
            // d(aij)/dT via product rule on sqrt(ai*aj)
            let daij_dt = 0.5 * (pure[i].da_dt * pure[j].a + pure[i].a * pure[j].da_dt)
                / (pure[i].a * pure[j].a).sqrt().max(1e-300)
                * (1.0 - k);
            da_dt_mix += zs[i] * zs[j] * daij_dt;
        }
    }
    MixtureParams { a_mix, da_dt_mix, b_mix }
}

/// Real roots of the cubic EOS in terms of the dimensionless `Z = PV/RT`.
/// Returns roots sorted ascending (smallest = liquid-like, largest = vapor-like).
pub fn solve_z(kind: CubicKind, mixture: &MixtureParams, p: f64, t: f64) -> Vec<f64> {
    let (u, w) = kind.uw();
    let a = mixture.a_mix * p / (R_GAS * R_GAS * t * t);
    let b = mixture.b_mix * p / (R_GAS * t);

    // Z^3 + c2 Z^2 + c1 Z + c0 = 0, generic cubic EOS coefficients.
    let c2 = u * b - b - 1.0;
    let c1 = a + w * b * b - u * b - u * b * b;
    let c0 = -(a * b + w * b * b + w * b * b * b);

    cubic_roots(c2, c1, c0)
        .into_iter()
        .filter(|z| z.is_finite() && *z > b)
        .collect()
}

/// Real roots of `x^3 + c2 x^2 + c1 x + c0 = 0` via the trigonometric method,
/// falling back to Cardano's formula when the discriminant demands it.
fn cubic_roots(c2: f64, c1: f64, c0: f64) -> Vec<f64> {
    let p = c1 - c2 * c2 / 3.0;
    let q = 2.0 * c2.powi(3) / 27.0 - c2 * c1 / 3.0 + c0;
    let shift = -c2 / 3.0;

    let discriminant = (q * q) / 4.0 + (p * p * p) / 27.0;

    if discriminant > 0.0 {
        let sqrt_disc = discriminant.sqrt();
        let u = (-q / 2.0 + sqrt_disc).cbrt();
        let v = (-q / 2.0 - sqrt_disc).cbrt();
        vec![u + v + shift]
    } else if p.abs() < 1e-14 {
        vec![shift]
    } else {
        let m = 2.0 * (-p / 3.0).sqrt();
        let arg = (3.0 * q / (p * m)).clamp(-1.0, 1.0);
        let theta = arg.acos();
        (0..3)
            .map(|k| m * ((theta - 2.0 * std::f64::consts::PI * k as f64) / 3.0).cos() + shift)
            .collect()
    }
}

/// Enthalpy departure (real - ideal gas), J/mol, at a given Z root.
pub fn h_departure(kind: CubicKind, mixture: &MixtureParams, z: f64, p: f64, t: f64) -> f64 {
    let (u, w) = kind.uw();
    let disc = (u * u - 4.0 * w).max(0.0).sqrt();
    let b = mixture.b_mix;
    if b <= 0.0 || disc <= 1e-12 {
        return R_GAS * t * (z - 1.0);
    }
    let term = (mixture.da_dt_mix * t - mixture.a_mix) / (b * disc);
    let log_arg = ((2.0 * z + b * p / (R_GAS * t) * (u + disc)) / (2.0 * z + b * p / (R_GAS * t) * (u - disc))).abs();
    R_GAS * t * (z - 1.0) + term * log_arg.max(1e-300).ln() / 2.0
}

/// Entropy departure (real - ideal gas), J/mol/K.
pub fn s_departure(kind: CubicKind, mixture: &MixtureParams, z: f64, p: f64, t: f64) -> f64 {
    let (u, w) = kind.uw();
    let disc = (u * u - 4.0 * w).max(0.0).sqrt();
    let b = mixture.b_mix;
    if b <= 0.0 || disc <= 1e-12 {
        return 0.0;
    }
    let log_arg = ((2.0 * z + b * p / (R_GAS * t) * (u + disc)) / (2.0 * z + b * p / (R_GAS * t) * (u - disc))).abs();
    mixture.da_dt_mix / (b * disc) * log_arg.max(1e-300).ln() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::builtin_registry;

    #[test]
    fn vapor_root_exceeds_liquid_root() {
        let consts = builtin_registry();
        let water = consts.iter().find(|c| c.name == "water").unwrap().clone();
        let m = mix(CubicKind::Pr, &[water], &[1.0], 373.15, &[vec![0.0]]);
        let roots = solve_z(CubicKind::Pr, &m, 101_325.0, 373.15);
        assert!(roots.len() >= 1);
        let lo = roots.iter().cloned().fold(f64::INFINITY, f64::min);
        let hi = roots.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        assert!(hi >= lo);
    }
}
