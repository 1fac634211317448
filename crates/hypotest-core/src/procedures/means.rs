// =============================================================================
// t Tests on Means
// =============================================================================
//
//   t_1sample    t = (x̄ − μ₀) / (s/√n)                      df = n − 1
//   t_paired     t = d̄ / (s_d/√n)                           df = n − 1
//   t_welch      t = (x̄₁ − x̄₂) / √(s₁²/n₁ + s₂²/n₂)         Welch-Satterthwaite df
//   t_equal_var  t = (x̄₁ − x̄₂) / (s_p·√(1/n₁ + 1/n₂))       df = n₁ + n₂ − 2
//
// Effect sizes are Cohen's d style: the absolute mean difference over the
// relevant SD (the pooled SD for both two-sample tests).
//
// =============================================================================

use super::{decide, shown, t_p_value, Computation, Context, TableLookup};
use crate::critical::{critical_value_with_config, CriticalParams};
use crate::error::Result;
use crate::input::{OneSampleParams, PairedParams, TwoSampleParams};
use crate::types::{DegreesOfFreedom, Distribution};

pub(super) fn one_sample(p: &OneSampleParams, ctx: &Context) -> Result<Computation> {
    let df = p.n - 1.0;
    let se = p.sd / p.n.sqrt();
    let t = (p.mean - p.mu0) / se;
    let effect_size = (p.mean - p.mu0).abs() / p.sd;

    t_outcome(
        t,
        df,
        df,
        ctx,
        vec![format!("SE = {}", shown(se))],
        vec![("effect_size", effect_size), ("se", se)],
    )
}

pub(super) fn paired(p: &PairedParams, ctx: &Context) -> Result<Computation> {
    let df = p.n - 1.0;
    let se = p.sd_d / p.n.sqrt();
    let t = p.d_bar / se;
    let effect_size = p.d_bar.abs() / p.sd_d;

    t_outcome(
        t,
        df,
        df,
        ctx,
        vec![format!("SE = {}", shown(se))],
        vec![("effect_size", effect_size), ("se", se)],
    )
}

pub(super) fn welch(p: &TwoSampleParams, ctx: &Context) -> Result<Computation> {
    let v1 = p.sd1 * p.sd1 / p.n1;
    let v2 = p.sd2 * p.sd2 / p.n2;
    let se = (v1 + v2).sqrt();
    let t = (p.mean1 - p.mean2) / se;
    let df = welch_df(p);

    let sp = pooled_sd(p);
    let effect_size = if sp > 0.0 {
        (p.mean1 - p.mean2).abs() / sp
    } else {
        0.0
    };

    // The critical value rounds df; the p-value truncates it
    t_outcome(
        t,
        df,
        df.floor(),
        ctx,
        vec![
            format!("Welch-Satterthwaite df = {}", shown(df)),
            format!("SE = {}", shown(se)),
        ],
        vec![("effect_size", effect_size), ("se", se), ("welch_df", df)],
    )
}

pub(super) fn equal_variance(p: &TwoSampleParams, ctx: &Context) -> Result<Computation> {
    let df = p.n1 + p.n2 - 2.0;
    let sp = pooled_sd(p);
    let se = sp * (1.0 / p.n1 + 1.0 / p.n2).sqrt();
    let t = (p.mean1 - p.mean2) / se;
    let effect_size = if sp > 0.0 {
        (p.mean1 - p.mean2).abs() / sp
    } else {
        0.0
    };

    t_outcome(
        t,
        df,
        df,
        ctx,
        vec![
            format!("Pooled SD sp = {}", shown(sp)),
            format!("SE = {}", shown(se)),
        ],
        vec![("effect_size", effect_size), ("se", se), ("pooled_sd", sp)],
    )
}

/// Welch-Satterthwaite degrees of freedom.
pub(crate) fn welch_df(p: &TwoSampleParams) -> f64 {
    let v1 = p.sd1 * p.sd1 / p.n1;
    let v2 = p.sd2 * p.sd2 / p.n2;
    (v1 + v2).powi(2) / (v1 * v1 / (p.n1 - 1.0) + v2 * v2 / (p.n2 - 1.0))
}

/// s_p = √(((n₁−1)s₁² + (n₂−1)s₂²) / (n₁+n₂−2))
pub(crate) fn pooled_sd(p: &TwoSampleParams) -> f64 {
    let df = p.n1 + p.n2 - 2.0;
    (((p.n1 - 1.0) * p.sd1 * p.sd1 + (p.n2 - 1.0) * p.sd2 * p.sd2) / df).sqrt()
}

/// Resolve the t critical value and assemble the outcome.
///
/// `df` is reported and used for the table lookup; `p_df` feeds the
/// p-value.
fn t_outcome(
    t: f64,
    df: f64,
    p_df: f64,
    ctx: &Context,
    notes: Vec<String>,
    meta: Vec<(&'static str, f64)>,
) -> Result<Computation> {
    let params = CriticalParams::new(ctx.alpha, ctx.tail).with_df(df);
    let critical = critical_value_with_config(Distribution::T, &params, &ctx.config.resolver)?;

    Ok(Computation {
        stat_name: "t",
        stat: t,
        df: DegreesOfFreedom::Single { v: df },
        decision: decide(t, &critical, ctx.tail),
        critical,
        p_value: Some(t_p_value(t, p_df, ctx.tail)),
        meta,
        notes,
        lookup: Some(TableLookup {
            distribution: Distribution::T,
            params,
        }),
    })
}
