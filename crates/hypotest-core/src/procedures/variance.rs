// =============================================================================
// F Tests: Variance Ratio and One-Way ANOVA
// =============================================================================
//
// f_eqvar
// -------
// F = larger sample variance / smaller sample variance, with df1 taken from
// the sample whose variance is on top. Because the ratio is arranged to be
// ≥ 1, a two-sided test looks up the critical value at α/2 and reports the
// p-value 2·min(p, 1 − p).
//
// anova_oneway
// ------------
// From group summaries (n, mean, sd):
//
//   SSB = Σ nᵢ(x̄ᵢ − x̄)²        MSB = SSB / (k − 1)
//   SSW = Σ (nᵢ − 1)sᵢ²         MSW = SSW / (N − k)
//   F   = MSB / MSW             η²  = SSB / (SSB + SSW)
//
// =============================================================================

use super::{decide, shown, Computation, Context, TableLookup};
use crate::critical::{critical_value_with_config, effective_alpha, CriticalParams};
use crate::distributions::f_cdf;
use crate::error::Result;
use crate::input::{AnovaParams, GroupSummary, VarianceRatioParams};
use crate::types::{DegreesOfFreedom, Distribution, Tail};

pub(super) fn variance_ratio(p: &VarianceRatioParams, ctx: &Context) -> Result<Computation> {
    let ratio = VarianceRatio::new(p);

    let alpha = effective_alpha(ctx.alpha, ctx.tail);
    let one_sided = 1.0 - f_cdf(ratio.f, ratio.df1, ratio.df2);
    let p_value = match ctx.tail {
        Tail::Two => 2.0 * one_sided.min(1.0 - one_sided),
        Tail::Right | Tail::Left => one_sided,
    };

    f_outcome(
        ratio.f,
        ratio.df1,
        ratio.df2,
        alpha,
        ctx,
        p_value,
        vec![format!("Variance ratio = {}", shown(ratio.f))],
        vec![("var_ratio", ratio.f)],
    )
}

pub(super) fn anova_oneway(p: &AnovaParams, ctx: &Context) -> Result<Computation> {
    let table = AnovaTable::new(&p.groups);
    let p_value = 1.0 - f_cdf(table.f, table.df_between, table.df_within);

    f_outcome(
        table.f,
        table.df_between,
        table.df_within,
        ctx.alpha,
        ctx,
        p_value,
        vec![
            format!("SS between = {}", shown(table.ss_between)),
            format!("SS within = {}", shown(table.ss_within)),
        ],
        vec![
            ("ss_between", table.ss_between),
            ("ss_within", table.ss_within),
            ("ms_between", table.ms_between),
            ("ms_within", table.ms_within),
            ("eta_squared", table.eta_squared),
        ],
    )
}

// =============================================================================
// Shared Quantities
// =============================================================================

/// Larger-over-smaller variance ratio and its df.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VarianceRatio {
    pub var1: f64,
    pub var2: f64,
    pub f: f64,
    pub df1: f64,
    pub df2: f64,
}

impl VarianceRatio {
    pub fn new(p: &VarianceRatioParams) -> Self {
        let var1 = p.sd1 * p.sd1;
        let var2 = p.sd2 * p.sd2;
        let (f, df1, df2) = if var1 >= var2 {
            (var1 / var2, p.n1 - 1.0, p.n2 - 1.0)
        } else {
            (var2 / var1, p.n2 - 1.0, p.n1 - 1.0)
        };
        Self {
            var1,
            var2,
            f,
            df1,
            df2,
        }
    }
}

/// Sums of squares for a one-way ANOVA from group summaries.
#[derive(Debug, Clone, Copy)]
pub(crate) struct AnovaTable {
    pub grand_mean: f64,
    pub ss_between: f64,
    pub ss_within: f64,
    pub df_between: f64,
    pub df_within: f64,
    pub ms_between: f64,
    pub ms_within: f64,
    pub f: f64,
    pub eta_squared: f64,
}

impl AnovaTable {
    pub fn new(groups: &[GroupSummary]) -> Self {
        let k = groups.len() as f64;
        let total_n: f64 = groups.iter().map(|g| g.n).sum();
        let grand_mean = groups.iter().map(|g| g.n * g.mean).sum::<f64>() / total_n;

        let ss_between: f64 = groups
            .iter()
            .map(|g| g.n * (g.mean - grand_mean).powi(2))
            .sum();
        let ss_within: f64 = groups.iter().map(|g| (g.n - 1.0) * g.sd * g.sd).sum();

        let df_between = k - 1.0;
        let df_within = total_n - k;
        let ms_between = ss_between / df_between;
        let ms_within = ss_within / df_within;

        let ss_total = ss_between + ss_within;
        let eta_squared = if ss_total > 0.0 {
            ss_between / ss_total
        } else {
            0.0
        };

        Self {
            grand_mean,
            ss_between,
            ss_within,
            df_between,
            df_within,
            ms_between,
            ms_within,
            f: ms_between / ms_within,
            eta_squared,
        }
    }
}

/// Look up the F critical value at `alpha` (already adjusted by the
/// caller) and assemble the outcome.
#[allow(clippy::too_many_arguments)]
fn f_outcome(
    f: f64,
    df1: f64,
    df2: f64,
    alpha: f64,
    ctx: &Context,
    p_value: f64,
    notes: Vec<String>,
    meta: Vec<(&'static str, f64)>,
) -> Result<Computation> {
    let params = CriticalParams::new(alpha, ctx.tail).with_df_pair(df1, df2);
    let critical = critical_value_with_config(Distribution::F, &params, &ctx.config.resolver)?;

    Ok(Computation {
        stat_name: "F",
        stat: f,
        df: DegreesOfFreedom::Pair { df1, df2 },
        decision: decide(f, &critical, Tail::Right),
        critical,
        p_value: Some(p_value),
        meta,
        notes,
        lookup: Some(TableLookup {
            distribution: Distribution::F,
            params,
        }),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::types::{Decision, Source};
    use approx::assert_abs_diff_eq;
    use statrs::distribution::{ContinuousCDF, FisherSnedecor};

    fn ctx(config: &EngineConfig, alpha: f64, tail: Tail) -> Context<'_> {
        Context {
            alpha,
            tail,
            config,
        }
    }

    fn group(n: f64, mean: f64, sd: f64) -> GroupSummary {
        GroupSummary { n, mean, sd }
    }

    #[test]
    fn test_variance_ratio_puts_larger_on_top() {
        let ratio = VarianceRatio::new(&VarianceRatioParams {
            n1: 10.0,
            sd1: 2.0,
            n2: 25.0,
            sd2: 4.0,
        });
        assert_abs_diff_eq!(ratio.f, 4.0, epsilon = 1e-12);
        assert_eq!((ratio.df1, ratio.df2), (24.0, 9.0));
    }

    #[test]
    fn test_variance_ratio_two_sided_halves_alpha() {
        let config = EngineConfig::default();
        let p = VarianceRatioParams {
            n1: 11.0,
            sd1: 3.0,
            n2: 11.0,
            sd2: 2.0,
        };
        let out = variance_ratio(&p, &ctx(&config, 0.05, Tail::Two)).unwrap();
        // F(10, 10) at 0.025
        assert_eq!(out.critical.right, Some(3.7168));
        assert_eq!(out.critical.source, Source::Table);
        assert_eq!(out.df, DegreesOfFreedom::Pair { df1: 10.0, df2: 10.0 });

        let one_sided = 1.0 - FisherSnedecor::new(10.0, 10.0).unwrap().cdf(2.25);
        assert_abs_diff_eq!(out.p_value.unwrap(), 2.0 * one_sided, epsilon = 1e-8);
        assert_eq!(out.decision, Decision::FailToReject);
    }

    #[test]
    fn test_variance_ratio_one_sided() {
        let config = EngineConfig::default();
        let p = VarianceRatioParams {
            n1: 11.0,
            sd1: 3.0,
            n2: 11.0,
            sd2: 2.0,
        };
        let out = variance_ratio(&p, &ctx(&config, 0.05, Tail::Right)).unwrap();
        assert_eq!(out.critical.right, Some(2.9782));
        let one_sided = 1.0 - FisherSnedecor::new(10.0, 10.0).unwrap().cdf(2.25);
        assert_abs_diff_eq!(out.p_value.unwrap(), one_sided, epsilon = 1e-8);
    }

    #[test]
    fn test_anova_equal_means_gives_zero_f() {
        let config = EngineConfig::default();
        let p = AnovaParams {
            k: 3.0,
            groups: vec![group(10.0, 5.0, 1.2); 3],
        };
        let out = anova_oneway(&p, &ctx(&config, 0.05, Tail::Two)).unwrap();
        assert_abs_diff_eq!(out.stat, 0.0, epsilon = 1e-12);
        assert_eq!(out.df, DegreesOfFreedom::Pair { df1: 2.0, df2: 27.0 });
        assert_eq!(out.critical.right, Some(3.3541));
        assert_eq!(out.decision, Decision::FailToReject);
        assert_abs_diff_eq!(out.p_value.unwrap(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_anova_table_sums_of_squares() {
        let groups = [group(5.0, 10.0, 2.0), group(5.0, 12.0, 2.0), group(5.0, 17.0, 2.0)];
        let table = AnovaTable::new(&groups);
        assert_abs_diff_eq!(table.grand_mean, 13.0, epsilon = 1e-12);
        // 5·(9 + 1 + 16)
        assert_abs_diff_eq!(table.ss_between, 130.0, epsilon = 1e-9);
        assert_abs_diff_eq!(table.ss_within, 48.0, epsilon = 1e-9);
        assert_abs_diff_eq!(table.f, (130.0 / 2.0) / (48.0 / 12.0), epsilon = 1e-9);
        assert_abs_diff_eq!(table.eta_squared, 130.0 / 178.0, epsilon = 1e-12);
    }
}
