// =============================================================================
// Chi-Squared Tests
// =============================================================================
//
//   chi2_gof     χ² = Σ (Oᵢ − Eᵢ)² / Eᵢ                    df = k − 1
//   chi2_indep   χ² = Σ (Oᵢⱼ − Eᵢⱼ)² / Eᵢⱼ,  Eᵢⱼ = RᵢCⱼ/N   df = (r − 1)(c − 1)
//
// Both are right-tailed whatever tail was requested. The independence test
// also reports Cramér's V = √(χ² / (N·(min(r, c) − 1))).
//
// =============================================================================

use ndarray::Zip;

use super::{decide, Computation, Context, TableLookup};
use crate::convert::{expected_counts, to_array2};
use crate::critical::{critical_value_with_config, CriticalParams};
use crate::distributions::chi2_cdf;
use crate::error::Result;
use crate::input::{ContingencyParams, GoodnessOfFitParams};
use crate::types::{DegreesOfFreedom, Distribution, Tail};

pub(super) fn goodness_of_fit(p: &GoodnessOfFitParams, ctx: &Context) -> Result<Computation> {
    let k = p.observed.len() as f64;
    let df = k - 1.0;
    let chi2: f64 = p
        .observed
        .iter()
        .zip(&p.expected)
        .map(|(o, e)| (o - e).powi(2) / e)
        .sum();

    let min = ctx.config.min_expected_count;
    let note = if p.expected.iter().any(|&e| e < min) {
        format!("Caution: some categories have expected counts below {min}.")
    } else {
        format!("Approximation condition met: all expected counts ≥ {min}.")
    };

    chi2_outcome(chi2, df, ctx, vec![note], vec![("k", k)])
}

pub(super) fn independence(p: &ContingencyParams, ctx: &Context) -> Result<Computation> {
    let observed = to_array2(&p.observed)?;
    let expected = expected_counts(&observed);
    let (rows, cols) = observed.dim();
    let total = observed.sum();
    let df = ((rows - 1) * (cols - 1)) as f64;

    let chi2 = Zip::from(&observed)
        .and(&expected)
        .fold(0.0, |acc, &o, &e| acc + (o - e).powi(2) / e);

    let min = ctx.config.min_expected_count;
    let note = if expected.iter().any(|&e| e < min) {
        format!("Caution: some cells have expected counts below {min}.")
    } else {
        format!("Approximation condition met: all expected counts ≥ {min}.")
    };

    let min_dim = (rows.min(cols) - 1) as f64;
    let cramers_v = if min_dim > 0.0 {
        (chi2 / (total * min_dim)).sqrt()
    } else {
        0.0
    };

    chi2_outcome(
        chi2,
        df,
        ctx,
        vec![note],
        vec![
            ("rows", rows as f64),
            ("cols", cols as f64),
            ("cramers_v", cramers_v),
        ],
    )
}

fn chi2_outcome(
    chi2: f64,
    df: f64,
    ctx: &Context,
    notes: Vec<String>,
    meta: Vec<(&'static str, f64)>,
) -> Result<Computation> {
    let params = CriticalParams::new(ctx.alpha, ctx.tail).with_df(df);
    let critical = critical_value_with_config(Distribution::Chi2, &params, &ctx.config.resolver)?;

    Ok(Computation {
        stat_name: "χ²",
        stat: chi2,
        df: DegreesOfFreedom::Single { v: df },
        decision: decide(chi2, &critical, Tail::Right),
        critical,
        p_value: Some(1.0 - chi2_cdf(chi2, df)),
        meta,
        notes,
        lookup: Some(TableLookup {
            distribution: Distribution::Chi2,
            params,
        }),
    })
}
