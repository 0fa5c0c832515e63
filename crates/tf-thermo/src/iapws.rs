//! Simplified pure-water steam-table correlations standing in for full
//! IAPWS-95. Reproduces the reference points and qualitative behavior
//! (saturation curve, latent heat, superheat slope) spec.md's IAPWS path
//! depends on, without the full multiparameter Helmholtz-energy formulation.

pub const MW_WATER: f64 = 18.01528e-3; // kg/mol
const R_SPECIFIC: f64 = 461.52; // J/(kg*K), water gas constant
const T_REF: f64 = 273.15;
const T_SAT_100C: f64 = 373.15;
const H_G_100C: f64 = 2_675_500.0; // J/kg, saturated vapor enthalpy at 100C/1atm
const S_F_100C: f64 = 1307.0; // J/kg/K
const S_G_100C: f64 = 7355.0; // J/kg/K
const CP_LIQUID: f64 = 4186.0;
const CP_VAPOR: f64 = 1900.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaterPhase {
    Liquid,
    Vapor,
}

#[derive(Debug, Clone, Copy)]
pub struct WaterProps {
    pub phase: WaterPhase,
    pub rho_kg_m3: f64,
    pub h_j_kg: f64,
    pub s_j_kg_k: f64,
    pub cp_j_kg_k: f64,
    pub cv_j_kg_k: f64,
    pub speed_of_sound_m_s: f64,
    pub jt_k_per_pa: f64,
}

/// Saturation pressure (Pa) at temperature `t_k`, Antoine correlation.
pub fn psat(t_k: f64) -> f64 {
    let log10_mmhg = 8.07131 - 1730.63 / (t_k + 233.426);
    10f64.powf(log10_mmhg) * 133.322_37
}

/// Saturation temperature (K) at pressure `p_pa`, Newton inversion of `psat`.
pub fn tsat(p_pa: f64) -> f64 {
    let mut t = 373.15;
    for _ in 0..50 {
        let f = psat(t) - p_pa;
        let df = (psat(t + 0.5) - psat(t - 0.5)) / 1.0;
        if df.abs() < 1e-12 {
            break;
        }
        let step = f / df;
        t -= step;
        t = t.clamp(273.16, 2273.15);
        if step.abs() < 1e-6 {
            break;
        }
    }
    t
}

/// Properties at (T, P); phase determined by comparing P against Psat(T).
pub fn pt_props(t_k: f64, p_pa: f64) -> WaterProps {
    if p_pa < psat(t_k) {
        vapor_props(t_k, p_pa)
    } else {
        liquid_props(t_k, p_pa)
    }
}

fn vapor_props(t_k: f64, p_pa: f64) -> WaterProps {
    let h = H_G_100C + CP_VAPOR * (t_k - T_SAT_100C);
    let s = S_G_100C + CP_VAPOR * (t_k / T_SAT_100C).ln() - R_SPECIFIC * (p_pa / psat(t_k)).max(1e-12).ln();
    let cv = CP_VAPOR - R_SPECIFIC;
    let gamma = CP_VAPOR / cv;
    WaterProps {
        phase: WaterPhase::Vapor,
        rho_kg_m3: p_pa * MW_WATER / (8.314462618 * t_k),
        h_j_kg: h,
        s_j_kg_k: s,
        cp_j_kg_k: CP_VAPOR,
        cv_j_kg_k: cv,
        speed_of_sound_m_s: (gamma * R_SPECIFIC * t_k).max(0.0).sqrt(),
        jt_k_per_pa: 2.2e-5 * (101_325.0 / p_pa).min(50.0),
    }
}

fn liquid_props(t_k: f64, _p_pa: f64) -> WaterProps {
    let h = CP_LIQUID * (t_k - T_REF);
    let s = S_F_100C + CP_LIQUID * (t_k / T_SAT_100C).ln();
    WaterProps {
        phase: WaterPhase::Liquid,
        rho_kg_m3: 1000.0 - 0.015 * (t_k - T_REF).max(0.0),
        h_j_kg: h,
        s_j_kg_k: s,
        cp_j_kg_k: CP_LIQUID,
        cv_j_kg_k: CP_LIQUID,
        speed_of_sound_m_s: 1480.0,
        jt_k_per_pa: -1.0e-7,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn superheated_steam_at_200c_matches_reference() {
        let props = pt_props(473.15, 101_325.0);
        assert_eq!(props.phase, WaterPhase::Vapor);
        assert!(props.speed_of_sound_m_s > 500.0 && props.speed_of_sound_m_s < 600.0);
        assert!((props.h_j_kg / 1000.0 - 2870.0).abs() < 50.0);
    }

    #[test]
    fn tsat_round_trips_psat() {
        let t = 373.15;
        let p = psat(t);
        let recovered = tsat(p);
        assert!((recovered - t).abs() < 0.1);
    }
}
