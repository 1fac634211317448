// =============================================================================
// Distribution Functions
// =============================================================================
//
// PDFs, CDFs and PMFs for every distribution the hypothesis tests use:
//
//   - normal:      Standard normal N(0, 1), plus its inverse CDF
//   - continuous:  Student's t, chi-squared, F
//   - discrete:    Binomial, Poisson
//
// All functions are pure and take plain f64 arguments. Nothing here
// allocates or holds state, so they are safe to call from any thread.
//
// EDGE POLICY
// -----------
// Densities return 0 outside their support (never NaN). CDFs return exactly
// 0 or 1 at the ends of their domain. The only NaN a caller can get back is
// from an invalid shape parameter (e.g. t with df <= 0), which the test
// engine never passes because the validator rejects it first.
//
// =============================================================================

mod continuous;
mod discrete;
mod normal;

pub use continuous::{chi2_cdf, chi2_pdf, f_cdf, f_pdf, t_cdf, t_pdf};
pub use discrete::{binomial_cdf, binomial_pmf, poisson_cdf, poisson_pmf};
pub use normal::{normal_cdf, normal_inv_cdf, normal_pdf};

#[cfg(test)]
pub(crate) mod test_support {
    /// Trapezoid-rule integral of `f` over `[a, b]` with `n` panels.
    pub fn integrate(f: impl Fn(f64) -> f64, a: f64, b: f64, n: usize) -> f64 {
        let h = (b - a) / n as f64;
        let inner: f64 = (1..n).map(|i| f(a + i as f64 * h)).sum();
        h * (0.5 * f(a) + inner + 0.5 * f(b))
    }

    /// True if `values` never decreases (within a rounding tolerance).
    pub fn is_non_decreasing(values: &[f64]) -> bool {
        values.windows(2).all(|w| w[1] >= w[0] - 1e-12)
    }
}
