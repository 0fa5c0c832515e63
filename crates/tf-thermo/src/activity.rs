//! NRTL activity-coefficient model for non-ideal liquids.
//!
//! UNIFAC/UNIQUAC share the same consumer contract (produce `gamma_i` from
//! composition and temperature) and are modeled as NRTL with zero-filled
//! interaction parameters when no group-contribution data is available for
//! the given component set, matching §3's "zero-filled when unknown" policy.

/// Binary interaction parameters `tau_ij`, `alpha_ij` packed densely;
/// zero (`tau=0`, meaning `exp(-alpha*tau)=1`) models an ideal binary.
#[derive(Debug, Clone)]
pub struct NrtlParams {
    pub n: usize,
    pub tau: Vec<f64>,
    pub alpha: Vec<f64>,
}

impl NrtlParams {
    pub fn ideal(n: usize) -> Self {
        Self { n, tau: vec![0.0; n * n], alpha: vec![0.3; n * n] }
    }

    fn idx(&self, i: usize, j: usize) -> usize {
        i * self.n + j
    }

    pub fn tau(&self, i: usize, j: usize) -> f64 {
        self.tau[self.idx(i, j)]
    }
    pub fn g(&self, i: usize, j: usize) -> f64 {
        (-self.alpha[self.idx(i, j)] * self.tau(i, j)).exp()
    }
}

/// Activity coefficients `gamma_i` for composition `xs` under NRTL.
pub fn nrtl_gammas(params: &NrtlParams, xs: &[f64]) -> Vec<f64> {
    let n = params.n;
    let mut gammas = vec![1.0; n];
    for i in 0..n {
        let mut sum_gx_num = 0.0;
        let mut sum_gx_den = 0.0;
        for j in 0..n {
            sum_gx_num += xs[j] * params.g(j, i) * params.tau(j, i);
            sum_gx_den += xs[j] * params.g(j, i);
        }
        let term1 = sum_gx_num / sum_gx_den.max(1e-300);

        let mut term2 = 0.0;
        for j in 0..n {
            let denom_j: f64 = (0..n).map(|k| xs[k] * params.g(k, j)).sum::<f64>().max(1e-300);
            let num_j: f64 = (0..n).map(|k| xs[k] * params.g(k, j) * params.tau(k, j)).sum();
            let inner = params.tau(i, j) - num_j / denom_j;
            term2 += xs[j] * params.g(i, j) / denom_j * inner;
        }

        let ln_gamma = term1 + term2;
        gammas[i] = ln_gamma.exp();
    }
    gammas
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ideal_params_give_unit_activity() {
        let params = NrtlParams::ideal(2);
        let gammas = nrtl_gammas(&params, &[0.5, 0.5]);
        for g in gammas {
            assert!((g - 1.0).abs() < 1e-8);
        }
    }
}
