// =============================================================================
// Binomial and Poisson Distributions
// =============================================================================
//
// Used by the exact tests. The PMFs are evaluated in log space so that
// n = 1000 trials does not overflow the binomial coefficient. The CDFs go
// through the incomplete beta / gamma functions instead of summing PMFs:
//
//   P(X ≤ k), X ~ Bin(n, p)  = 1 − I_p(k + 1, n − k)
//   P(X ≤ k), X ~ Pois(λ)    = Q(k + 1, λ)
//
// `k` is signed so callers can ask for P(X ≤ x − 1) at x = 0 without a
// special case; negative k has zero mass.
//
// =============================================================================

use crate::special::{beta_inc, gamma_q, ln_gamma};

// =============================================================================
// Binomial
// =============================================================================

/// P(X = k) for X ~ Binomial(n, p).
pub fn binomial_pmf(k: i64, n: u64, p: f64) -> f64 {
    if k < 0 || k as u64 > n {
        return 0.0;
    }
    if p == 0.0 {
        return if k == 0 { 1.0 } else { 0.0 };
    }
    if p == 1.0 {
        return if k as u64 == n { 1.0 } else { 0.0 };
    }

    let (k, n) = (k as f64, n as f64);
    let ln_coeff = ln_gamma(n + 1.0) - ln_gamma(k + 1.0) - ln_gamma(n - k + 1.0);
    (ln_coeff + k * p.ln() + (n - k) * (1.0 - p).ln()).exp()
}

/// P(X ≤ k) for X ~ Binomial(n, p).
pub fn binomial_cdf(k: i64, n: u64, p: f64) -> f64 {
    if k < 0 {
        return 0.0;
    }
    if k as u64 >= n {
        return 1.0;
    }
    1.0 - beta_inc(p, k as f64 + 1.0, (n - k as u64) as f64)
}

// =============================================================================
// Poisson
// =============================================================================

/// P(X = k) for X ~ Poisson(λ). Zero for `lambda <= 0`.
pub fn poisson_pmf(k: i64, lambda: f64) -> f64 {
    if k < 0 || lambda <= 0.0 {
        return 0.0;
    }
    let k = k as f64;
    (k * lambda.ln() - lambda - ln_gamma(k + 1.0)).exp()
}

/// P(X ≤ k) for X ~ Poisson(λ). One for `lambda <= 0`.
pub fn poisson_cdf(k: i64, lambda: f64) -> f64 {
    if k < 0 {
        return 0.0;
    }
    if lambda <= 0.0 {
        return 1.0;
    }
    gamma_q(k as f64 + 1.0, lambda)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use statrs::distribution::{Binomial, Discrete, DiscreteCDF, Poisson};

    #[test]
    fn test_binomial_pmf_sums_to_one() {
        let total: f64 = (0..=30).map(|k| binomial_pmf(k, 30, 0.37)).sum();
        assert_abs_diff_eq!(total, 1.0, epsilon = 1e-10);
    }

    #[test]
    fn test_binomial_degenerate_p() {
        assert_eq!(binomial_pmf(0, 10, 0.0), 1.0);
        assert_eq!(binomial_pmf(3, 10, 0.0), 0.0);
        assert_eq!(binomial_pmf(10, 10, 1.0), 1.0);
        assert_eq!(binomial_pmf(9, 10, 1.0), 0.0);
    }

    #[test]
    fn test_binomial_out_of_range() {
        assert_eq!(binomial_pmf(-1, 10, 0.5), 0.0);
        assert_eq!(binomial_pmf(11, 10, 0.5), 0.0);
        assert_eq!(binomial_cdf(-1, 10, 0.5), 0.0);
        assert_eq!(binomial_cdf(10, 10, 0.5), 1.0);
        assert_eq!(binomial_cdf(12, 10, 0.5), 1.0);
    }

    #[test]
    fn test_binomial_cdf_equals_pmf_sum() {
        for k in 0..20 {
            let summed: f64 = (0..=k).map(|i| binomial_pmf(i, 20, 0.5)).sum();
            assert_abs_diff_eq!(binomial_cdf(k, 20, 0.5), summed, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_binomial_matches_statrs() {
        let reference = Binomial::new(0.23, 45).unwrap();
        for k in 0..=45 {
            assert_abs_diff_eq!(binomial_pmf(k, 45, 0.23), reference.pmf(k as u64), epsilon = 1e-10);
            assert_abs_diff_eq!(binomial_cdf(k, 45, 0.23), reference.cdf(k as u64), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_binomial_upper_tail_known_value() {
        // P(X ≥ 15), X ~ Bin(20, 0.5) = 21700 / 2^20
        let upper = 1.0 - binomial_cdf(14, 20, 0.5);
        assert_abs_diff_eq!(upper, 21_700.0 / 1_048_576.0, epsilon = 1e-10);
    }

    #[test]
    fn test_poisson_pmf_and_cdf() {
        assert_abs_diff_eq!(poisson_pmf(0, 2.0), (-2.0_f64).exp(), epsilon = 1e-14);
        assert_abs_diff_eq!(poisson_cdf(1, 2.0), 3.0 * (-2.0_f64).exp(), epsilon = 1e-10);
        for k in 0..25 {
            let summed: f64 = (0..=k).map(|i| poisson_pmf(i, 6.5)).sum();
            assert_abs_diff_eq!(poisson_cdf(k, 6.5), summed, epsilon = 1e-10);
        }
    }

    #[test]
    fn test_poisson_matches_statrs() {
        let reference = Poisson::new(11.3).unwrap();
        for k in 0..40 {
            assert_abs_diff_eq!(poisson_pmf(k, 11.3), reference.pmf(k as u64), epsilon = 1e-10);
            assert_abs_diff_eq!(poisson_cdf(k, 11.3), reference.cdf(k as u64), epsilon = 1e-10);
        }
    }

    #[test]
    fn test_poisson_edge_cases() {
        assert_eq!(poisson_pmf(-1, 3.0), 0.0);
        assert_eq!(poisson_pmf(2, 0.0), 0.0);
        assert_eq!(poisson_cdf(-1, 3.0), 0.0);
        assert_eq!(poisson_cdf(4, 0.0), 1.0);
    }
}
