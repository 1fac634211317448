// =============================================================================
// Exact Tests: Binomial and Poisson
// =============================================================================
//
// No critical value and no approximation: the p-value comes straight from
// the PMF and CDF and is compared against alpha.
//
//   right   P(X ≥ x)   (1 when x = 0)
//   left    P(X ≤ x)
//   two     P(X = i) summed over every outcome no more likely than the
//           observed one, with a small tolerance so floating-point ties count
//
// TWO-SIDED MASS
// --------------
// Both PMFs are unimodal, so the outcomes more likely than x form one run
// around the mode. Binary search finds where that run starts and ends, and
// the two tails outside it are read off the CDF. The cost is logarithmic in
// the support instead of one PMF per outcome.
//
// The Poisson support is truncated at k = max(⌈5λ⌉, 3x, floor). Inputs are
// capped by the validator (`max_exact_count`, `max_poisson_rate`) so every
// CDF involved converges well inside the continued-fraction cap.
//
// =============================================================================

use super::{decide_exact, Computation, Context};
use crate::distributions::{binomial_cdf, binomial_pmf, poisson_cdf, poisson_pmf};
use crate::error::Result;
use crate::input::{OneProportionParams, PoissonParams};
use crate::types::{CriticalValue, DegreesOfFreedom, Tail};

pub(super) fn binomial(p: &OneProportionParams, ctx: &Context) -> Result<Computation> {
    let n = p.n as u64;
    let x = p.x as u64;
    let pmf = |k: u64| binomial_pmf(k as i64, n, p.p0);
    let cdf = |k: u64| binomial_cdf(k as i64, n, p.p0);

    let p_value = match ctx.tail {
        Tail::Right if x > 0 => 1.0 - cdf(x - 1),
        Tail::Right => 1.0,
        Tail::Left => cdf(x),
        Tail::Two => {
            let mode = ((p.n + 1.0) * p.p0).floor() as u64;
            two_sided_mass(x, mode, n, ctx.config.exact_tie_tolerance, pmf, cdf)
        }
    };

    let mut notes = vec!["Decided by the exact binomial test.".to_string()];
    let min = ctx.config.min_expected_count;
    if p.n * p.p0 >= min && p.n * (1.0 - p.p0) >= min {
        notes.push(format!(
            "Note: n·p0 ≥ {min} and n·(1−p0) ≥ {min}, so the normal approximation would also \
             be acceptable."
        ));
    }

    Ok(exact_outcome(
        p.x,
        p_value,
        ctx,
        notes,
        vec![("n", p.n), ("p0", p.p0), ("p_hat", p.x / p.n)],
    ))
}

pub(super) fn poisson(p: &PoissonParams, ctx: &Context) -> Result<Computation> {
    let x = p.observed as u64;
    let lambda = p.lambda0;
    let pmf = |k: u64| poisson_pmf(k as i64, lambda);
    let cdf = |k: u64| poisson_cdf(k as i64, lambda);

    let p_value = match ctx.tail {
        Tail::Right if x > 0 => 1.0 - cdf(x - 1),
        Tail::Right => 1.0,
        Tail::Left => cdf(x),
        Tail::Two => {
            let upper = two_sided_support(x, lambda, ctx.config.poisson_min_support);
            let mode = lambda.floor() as u64;
            two_sided_mass(x, mode, upper, ctx.config.exact_tie_tolerance, pmf, cdf)
        }
    };

    Ok(exact_outcome(
        p.observed,
        p_value,
        ctx,
        vec!["Decided by the exact Poisson test.".to_string()],
        vec![("observed", p.observed), ("lambda0", lambda)],
    ))
}

/// Upper end of the k range covered by the two-sided Poisson test.
fn two_sided_support(x: u64, lambda: f64, floor: u64) -> u64 {
    let by_rate = (5.0 * lambda).ceil() as u64;
    by_rate.max(x.saturating_mul(3)).max(floor)
}

/// Mass of the outcomes in `0..=upper` whose probability is at most
/// `pmf(x) + tolerance`, for a PMF that rises up to `mode` and falls after.
///
/// Capped at 1.
fn two_sided_mass(
    x: u64,
    mode: u64,
    upper: u64,
    tolerance: f64,
    pmf: impl Fn(u64) -> f64,
    cdf: impl Fn(u64) -> f64,
) -> f64 {
    let cutoff = pmf(x) + tolerance;
    let mode = mode.min(upper);
    if pmf(mode) <= cutoff {
        return cdf(upper).min(1.0);
    }

    // Last k below the mode that is no more likely than x
    let left = if pmf(0) <= cutoff {
        let (mut lo, mut hi) = (0, mode);
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if pmf(mid) <= cutoff {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        cdf(lo)
    } else {
        0.0
    };

    // First k above the mode that is no more likely than x
    let right = if pmf(upper) <= cutoff {
        let (mut lo, mut hi) = (mode, upper);
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if pmf(mid) <= cutoff {
                hi = mid;
            } else {
                lo = mid;
            }
        }
        cdf(upper) - cdf(hi - 1)
    } else {
        0.0
    };

    (left + right).min(1.0)
}

fn exact_outcome(
    x: f64,
    p_value: f64,
    ctx: &Context,
    notes: Vec<String>,
    meta: Vec<(&'static str, f64)>,
) -> Computation {
    Computation {
        stat_name: "x",
        stat: x,
        df: DegreesOfFreedom::NotApplicable {},
        critical: CriticalValue::exact(),
        p_value: Some(p_value),
        decision: decide_exact(p_value, ctx.alpha),
        meta,
        notes,
        lookup: None,
    }
}
