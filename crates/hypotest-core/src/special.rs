// =============================================================================
// Special Functions
// =============================================================================
//
// The three building blocks that every CDF in this crate is assembled from:
//
//   - ln Γ(z)          Lanczos approximation (g = 7, 9 coefficients)
//   - I_x(a, b)        regularized incomplete beta, Lentz continued fraction
//   - P(a, x), Q(a, x) regularized incomplete gamma, series / continued
//                      fraction depending on the regime
//
// WHERE THEY ARE USED
// -------------------
//   t CDF        → I_x(df/2, 1/2)         with x = df / (df + t²)
//   F CDF        → I_x(d1/2, d2/2)        with x = d1·f / (d1·f + d2)
//   binomial CDF → 1 − I_p(k + 1, n − k)
//   χ² CDF       → P(df/2, x/2)
//   Poisson CDF  → Q(k + 1, λ)
//
// DOMAIN POLICY
// -------------
// These functions never panic and never return errors. Out-of-domain
// arguments produce sentinel values (ln Γ(z ≤ 0) = +∞, I_x clamps to 0/1 at
// the ends of [0, 1]). Callers are responsible for not feeding user input
// with non-positive shape parameters straight into them.
//
// =============================================================================

/// Lanczos g parameter.
const LANCZOS_G: f64 = 7.0;

/// Lanczos coefficients for g = 7, n = 9.
const LANCZOS_COEFFS: [f64; 9] = [
    0.999_999_999_999_809_9,
    676.520_368_121_885_1,
    -1_259.139_216_722_402_8,
    771.323_428_777_653_1,
    -176.615_029_162_140_6,
    12.507_343_278_686_905,
    -0.138_571_095_265_720_12,
    9.984_369_578_019_571_6e-6,
    1.505_632_735_149_311_6e-7,
];

/// ln(√(2π))
const LN_SQRT_2PI: f64 = 0.918_938_533_204_672_8;

/// Iteration cap shared by every continued fraction and series below.
pub(crate) const MAX_ITERATIONS: usize = 200;

/// Relative convergence threshold.
const EPSILON: f64 = 1e-14;

/// Floor for intermediate Lentz denominators.
const TINY: f64 = 1e-30;

/// Outcome of an iterative evaluation: the value reached and how it got there.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Iterated {
    pub value: f64,
    pub iterations: usize,
    pub converged: bool,
}

// =============================================================================
// Log-Gamma
// =============================================================================

/// Natural log of the gamma function, ln Γ(z).
///
/// Returns `+∞` for `z <= 0`.
pub fn ln_gamma(z: f64) -> f64 {
    if z <= 0.0 {
        return f64::INFINITY;
    }

    let mut x = LANCZOS_COEFFS[0];
    for (i, &c) in LANCZOS_COEFFS.iter().enumerate().skip(1) {
        x += c / (z + i as f64 - 1.0);
    }

    let t = z + LANCZOS_G - 0.5;
    LN_SQRT_2PI + (z - 0.5) * t.ln() - t + x.ln()
}

// =============================================================================
// Regularized Incomplete Beta
// =============================================================================

/// Regularized incomplete beta function I_x(a, b).
///
/// Returns 0 for `x <= 0` and 1 for `x >= 1`. Above the mean-ish split point
/// `(a + 1) / (a + b + 2)` the symmetry `I_x(a, b) = 1 − I_{1−x}(b, a)` is
/// applied so the continued fraction is always evaluated where it converges
/// quickly.
pub fn beta_inc(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    if x > (a + 1.0) / (a + b + 2.0) {
        return 1.0 - beta_inc(1.0 - x, b, a);
    }

    let ln_beta = ln_gamma(a) + ln_gamma(b) - ln_gamma(a + b);
    let front = (a * x.ln() + b * (1.0 - x).ln() - ln_beta).exp() / a;

    front * (beta_continued_fraction(x, a, b).value - 1.0)
}

/// Lentz evaluation of the incomplete-beta continued fraction.
///
/// Term m = 0 is 1; odd terms are −(a+i)(a+b+i)x / ((a+2i)(a+2i+1)) and even
/// terms are i(b−i)x / ((a+2i−1)(a+2i)), with i = ⌊m/2⌋.
pub(crate) fn beta_continued_fraction(x: f64, a: f64, b: f64) -> Iterated {
    let mut f = 1.0;
    let mut c = 1.0;
    let mut d = 0.0;

    for m in 0..=MAX_ITERATIONS {
        let i = (m / 2) as f64;
        let numerator = if m == 0 {
            1.0
        } else if m % 2 == 0 {
            i * (b - i) * x / ((a + 2.0 * i - 1.0) * (a + 2.0 * i))
        } else {
            -(a + i) * (a + b + i) * x / ((a + 2.0 * i) * (a + 2.0 * i + 1.0))
        };

        d = 1.0 + numerator * d;
        if d.abs() < TINY {
            d = TINY;
        }
        d = 1.0 / d;

        c = 1.0 + numerator / c;
        if c.abs() < TINY {
            c = TINY;
        }

        let delta = c * d;
        f *= delta;
        if (delta - 1.0).abs() < EPSILON {
            return Iterated {
                value: f,
                iterations: m,
                converged: true,
            };
        }
    }

    Iterated {
        value: f,
        iterations: MAX_ITERATIONS,
        converged: false,
    }
}

// =============================================================================
// Regularized Incomplete Gamma
// =============================================================================

/// Lower regularized incomplete gamma function P(a, x).
///
/// Series expansion for `x < a + 1`, complement of [`gamma_q`] otherwise.
pub fn gamma_p(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= a + 1.0 {
        return 1.0 - gamma_q(a, x);
    }

    gamma_series(a, x).value * gamma_prefactor(a, x)
}

/// Upper regularized incomplete gamma function Q(a, x) = 1 − P(a, x).
///
/// Continued fraction for `x >= a + 1`, complement of [`gamma_p`] otherwise.
pub fn gamma_q(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 1.0;
    }
    if x < a + 1.0 {
        return 1.0 - gamma_p(a, x);
    }

    gamma_prefactor(a, x) / gamma_continued_fraction(a, x).value
}

/// e^(−x) · x^a / Γ(a), evaluated in log space.
fn gamma_prefactor(a: f64, x: f64) -> f64 {
    (-x + a * x.ln() - ln_gamma(a)).exp()
}

/// Σ x^n / (a (a+1) ... (a+n)), the series for P(a, x) without its prefactor.
pub(crate) fn gamma_series(a: f64, x: f64) -> Iterated {
    let mut term = 1.0 / a;
    let mut sum = term;

    for n in 1..MAX_ITERATIONS {
        term *= x / (a + n as f64);
        sum += term;
        if term.abs() < sum.abs() * EPSILON {
            return Iterated {
                value: sum,
                iterations: n,
                converged: true,
            };
        }
    }

    Iterated {
        value: sum,
        iterations: MAX_ITERATIONS,
        converged: false,
    }
}

/// Lentz evaluation of b0 + a1/(b1 + a2/(b2 + ...)) for Q(a, x), where
/// b_i = x − a + 1 + 2i and a_i = −i(i − a).
pub(crate) fn gamma_continued_fraction(a: f64, x: f64) -> Iterated {
    let mut f = x - a + 1.0;
    if f.abs() < TINY {
        f = TINY;
    }
    let mut c = f;
    let mut d = 0.0;

    for i in 1..MAX_ITERATIONS {
        let i_f = i as f64;
        let an = -i_f * (i_f - a);
        let bn = x - a + 1.0 + 2.0 * i_f;

        d = bn + an * d;
        if d.abs() < TINY {
            d = TINY;
        }
        d = 1.0 / d;

        c = bn + an / c;
        if c.abs() < TINY {
            c = TINY;
        }

        let delta = c * d;
        f *= delta;
        if (delta - 1.0).abs() < EPSILON {
            return Iterated {
                value: f,
                iterations: i,
                converged: true,
            };
        }
    }

    Iterated {
        value: f,
        iterations: MAX_ITERATIONS,
        converged: false,
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_ln_gamma_known_values() {
        // Γ(1) = Γ(2) = 1
        assert_abs_diff_eq!(ln_gamma(1.0), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ln_gamma(2.0), 0.0, epsilon = 1e-12);
        // Γ(1/2) = √π
        assert_abs_diff_eq!(
            ln_gamma(0.5),
            std::f64::consts::PI.sqrt().ln(),
            epsilon = 1e-12
        );
        // Γ(10) = 9!
        assert_abs_diff_eq!(ln_gamma(10.0), 362_880.0_f64.ln(), epsilon = 1e-10);
    }

    #[test]
    fn test_ln_gamma_non_positive_is_infinite() {
        assert_eq!(ln_gamma(0.0), f64::INFINITY);
        assert_eq!(ln_gamma(-2.5), f64::INFINITY);
    }

    #[test]
    fn test_ln_gamma_matches_statrs() {
        for &z in &[0.3, 0.5, 1.5, 3.7, 12.0, 60.5, 150.0] {
            assert_abs_diff_eq!(
                ln_gamma(z),
                statrs::function::gamma::ln_gamma(z),
                epsilon = 1e-10
            );
        }
    }

    #[test]
    fn test_beta_inc_boundaries() {
        assert_eq!(beta_inc(0.0, 2.0, 3.0), 0.0);
        assert_eq!(beta_inc(-0.1, 2.0, 3.0), 0.0);
        assert_eq!(beta_inc(1.0, 2.0, 3.0), 1.0);
        assert_eq!(beta_inc(1.7, 2.0, 3.0), 1.0);
    }

    #[test]
    fn test_beta_inc_closed_forms() {
        // I_x(1, 1) = x
        assert_abs_diff_eq!(beta_inc(0.3, 1.0, 1.0), 0.3, epsilon = 1e-12);
        // I_x(a, 1) = x^a
        assert_abs_diff_eq!(beta_inc(0.6, 3.0, 1.0), 0.6_f64.powi(3), epsilon = 1e-12);
        // I_{1/2}(a, a) = 1/2
        assert_abs_diff_eq!(beta_inc(0.5, 7.5, 7.5), 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_beta_inc_symmetry() {
        for &(x, a, b) in &[(0.2, 2.0, 5.0), (0.7, 0.5, 12.0), (0.95, 30.0, 4.5)] {
            let lhs = beta_inc(x, a, b);
            let rhs = 1.0 - beta_inc(1.0 - x, b, a);
            assert_abs_diff_eq!(lhs, rhs, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_beta_inc_matches_statrs() {
        let shapes = [0.5, 1.0, 2.5, 6.0, 15.0, 60.0];
        for &a in &shapes {
            for &b in &shapes {
                for &x in &[0.01, 0.2, 0.5, 0.8, 0.99] {
                    let expected = statrs::function::beta::beta_reg(a, b, x);
                    assert_abs_diff_eq!(beta_inc(x, a, b), expected, epsilon = 1e-10);
                }
            }
        }
    }

    #[test]
    fn test_beta_continued_fraction_converges_before_cap() {
        let shapes = [0.5, 1.0, 2.5, 6.0, 15.0, 60.0];
        for &a in &shapes {
            for &b in &shapes {
                for &x in &[0.001, 0.1, 0.3, 0.5, 0.7, 0.9, 0.999] {
                    // Only the regime beta_inc actually evaluates
                    let (x, a, b) = if x > (a + 1.0) / (a + b + 2.0) {
                        (1.0 - x, b, a)
                    } else {
                        (x, a, b)
                    };
                    let cf = beta_continued_fraction(x, a, b);
                    assert!(cf.converged, "no convergence for x={x}, a={a}, b={b}");
                    assert!(cf.iterations < MAX_ITERATIONS);
                }
            }
        }
    }

    #[test]
    fn test_gamma_p_exponential_case() {
        // P(1, x) = 1 − e^(−x)
        for &x in &[0.1_f64, 1.0, 2.0, 7.5] {
            assert_abs_diff_eq!(gamma_p(1.0, x), 1.0 - (-x).exp(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_gamma_p_and_q_are_complementary() {
        for &a in &[0.5, 1.5, 4.0, 20.0] {
            for &x in &[0.2, 1.0, 3.0, 10.0, 40.0] {
                assert_abs_diff_eq!(gamma_p(a, x) + gamma_q(a, x), 1.0, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_gamma_boundaries() {
        assert_eq!(gamma_p(2.0, 0.0), 0.0);
        assert_eq!(gamma_q(2.0, 0.0), 1.0);
        assert_eq!(gamma_p(2.0, -1.0), 0.0);
    }

    #[test]
    fn test_gamma_p_matches_statrs() {
        for &a in &[0.5, 1.0, 2.5, 10.0, 50.0] {
            for &x in &[0.05, 0.5, 2.0, 9.0, 45.0, 120.0] {
                let expected = statrs::function::gamma::gamma_lr(a, x);
                assert_abs_diff_eq!(gamma_p(a, x), expected, epsilon = 1e-10);
            }
        }
    }

    #[test]
    fn test_gamma_expansions_converge_before_cap() {
        for &a in &[0.5, 1.0, 1.5, 5.0, 10.0, 25.0, 60.0] {
            for &x in &[0.1, 1.0, 5.0, 10.0, 30.0, 60.0, 100.0] {
                let result = if x < a + 1.0 {
                    gamma_series(a, x)
                } else {
                    gamma_continued_fraction(a, x)
                };
                assert!(result.converged, "no convergence for a={a}, x={x}");
            }
        }
    }
}
