// =============================================================================
// z Tests on Proportions
// =============================================================================
//
//   prop_1   z = (p̂ − p₀) / √(p₀(1−p₀)/n)
//   prop_2   z = (p̂₁ − p̂₂) / √(p̂(1−p̂)(1/n₁ + 1/n₂)),  p̂ = (x₁+x₂)/(n₁+n₂)
//
// Both rely on the normal approximation to the binomial, so each result
// carries a note on whether the expected counts are large enough for it.
//
// =============================================================================

use super::{decide, z_p_value, Computation, Context, TableLookup};
use crate::critical::{critical_value_with_config, CriticalParams};
use crate::error::Result;
use crate::input::{OneProportionParams, TwoProportionParams};
use crate::types::{DegreesOfFreedom, Distribution};

pub(super) fn one_proportion(p: &OneProportionParams, ctx: &Context) -> Result<Computation> {
    let p_hat = p.x / p.n;
    let se = (p.p0 * (1.0 - p.p0) / p.n).sqrt();
    let z = (p_hat - p.p0) / se;

    let min = ctx.config.min_expected_count;
    let note = if p.n * p.p0 < min || p.n * (1.0 - p.p0) < min {
        format!(
            "Caution: n·p0 or n·(1−p0) is below {min}, so the normal approximation may be \
             inaccurate. Consider the exact binomial test."
        )
    } else {
        format!("Approximation condition met: n·p0 ≥ {min} and n·(1−p0) ≥ {min}.")
    };

    z_outcome(z, ctx, vec![note], vec![("p_hat", p_hat), ("se", se)])
}

pub(super) fn two_proportion(p: &TwoProportionParams, ctx: &Context) -> Result<Computation> {
    let p1 = p.x1 / p.n1;
    let p2 = p.x2 / p.n2;
    let pooled = (p.x1 + p.x2) / (p.n1 + p.n2);
    let se = (pooled * (1.0 - pooled) * (1.0 / p.n1 + 1.0 / p.n2)).sqrt();
    let z = (p1 - p2) / se;

    let min = ctx.config.min_expected_count;
    let small_cell = [p.n1, p.n2]
        .iter()
        .any(|&n| n * pooled < min || n * (1.0 - pooled) < min);
    let note = if small_cell {
        format!(
            "Caution: some expected cell counts are below {min}, so the normal approximation \
             may be inaccurate."
        )
    } else {
        "Approximation condition met.".to_string()
    };

    z_outcome(
        z,
        ctx,
        vec![note],
        vec![("p1", p1), ("p2", p2), ("p_pooled", pooled), ("se", se)],
    )
}

fn z_outcome(
    z: f64,
    ctx: &Context,
    notes: Vec<String>,
    meta: Vec<(&'static str, f64)>,
) -> Result<Computation> {
    let params = CriticalParams::new(ctx.alpha, ctx.tail);
    let critical = critical_value_with_config(Distribution::Z, &params, &ctx.config.resolver)?;

    Ok(Computation {
        stat_name: "z",
        stat: z,
        df: DegreesOfFreedom::NotApplicable {},
        decision: decide(z, &critical, ctx.tail),
        critical,
        p_value: Some(z_p_value(z, ctx.tail)),
        meta,
        notes,
        lookup: Some(TableLookup {
            distribution: Distribution::Z,
            params,
        }),
    })
}
