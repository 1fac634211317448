// =============================================================================
// Student's t, Chi-Squared and F Distributions
// =============================================================================
//
// Each CDF is a thin wrapper over one of the special functions:
//
//   t:   F(x) = 1 − ½·I_{df/(df+x²)}(df/2, ½)           for x ≥ 0
//        F(x) = ½·I_{df/(df+x²)}(df/2, ½)               for x < 0
//   χ²:  F(x) = P(df/2, x/2)
//   F:   F(x) = I_{d1·x/(d1·x+d2)}(d1/2, d2/2)
//
// Degrees of freedom are f64 so the Welch-Satterthwaite df (non-integer)
// can be passed straight through.
//
// =============================================================================

use std::f64::consts::{LN_2, PI};

use crate::special::{beta_inc, gamma_p, ln_gamma};

// =============================================================================
// Student's t
// =============================================================================

/// Density of Student's t distribution with `df` degrees of freedom.
pub fn t_pdf(x: f64, df: f64) -> f64 {
    let half_df_plus = (df + 1.0) / 2.0;
    let half_df = df / 2.0;
    let ln_norm = ln_gamma(half_df_plus) - ln_gamma(half_df) - 0.5 * (df * PI).ln();
    ln_norm.exp() * (1.0 + x * x / df).powf(-half_df_plus)
}

/// CDF of Student's t distribution.
///
/// NaN for `df <= 0`; exactly 0 or 1 for infinite `x`.
pub fn t_cdf(x: f64, df: f64) -> f64 {
    if df <= 0.0 {
        return f64::NAN;
    }
    if x.is_infinite() {
        return if x > 0.0 { 1.0 } else { 0.0 };
    }

    let tail = 0.5 * beta_inc(df / (df + x * x), df / 2.0, 0.5);
    if x >= 0.0 {
        1.0 - tail
    } else {
        tail
    }
}

// =============================================================================
// Chi-Squared
// =============================================================================

/// Density of the chi-squared distribution. Zero for `x <= 0`.
pub fn chi2_pdf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let k2 = df / 2.0;
    ((k2 - 1.0) * x.ln() - x / 2.0 - k2 * LN_2 - ln_gamma(k2)).exp()
}

/// CDF of the chi-squared distribution. Zero for `x <= 0`.
pub fn chi2_cdf(x: f64, df: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    gamma_p(df / 2.0, x / 2.0)
}

// =============================================================================
// F (Fisher-Snedecor)
// =============================================================================

/// Density of the F distribution with (`df1`, `df2`) degrees of freedom.
/// Zero for `x <= 0`.
pub fn f_pdf(x: f64, df1: f64, df2: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    let half1 = df1 / 2.0;
    let half2 = df2 / 2.0;
    (half1 * df1.ln() + half2 * df2.ln() + (half1 - 1.0) * x.ln()
        - (half1 + half2) * (df1 * x + df2).ln()
        - ln_gamma(half1)
        - ln_gamma(half2)
        + ln_gamma(half1 + half2))
    .exp()
}

/// CDF of the F distribution. Zero for `x <= 0`.
pub fn f_cdf(x: f64, df1: f64, df2: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    beta_inc(df1 * x / (df1 * x + df2), df1 / 2.0, df2 / 2.0)
}

// =============================================================================
// Tests
// =============================================================================
