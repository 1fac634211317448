// =============================================================================
// Calculation Steps
// =============================================================================
//
// A worked solution for a test input, one step at a time, ready to render
// next to the result. Formulas use LaTeX. Displayed intermediate numbers are
// rounded to 4 decimals; the arithmetic behind them is not, so the closing
// result marker always matches the statistic `run_test` reports.
//
// STEP KINDS
// ----------
//   formula          titled formula, optionally with an explanatory note
//   note             titled plain-text remark
//   result           the final statistic
//   deviation_table  per-cell (O − E)²/E breakdown for χ² independence
//
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::convert::{expected_counts, margins, to_array2};
use crate::error::Result;
use crate::input::{
    AnovaParams, ContingencyParams, GoodnessOfFitParams, OneProportionParams, OneSampleParams,
    PairedParams, PoissonParams, TestInput, TestParams, TwoProportionParams, TwoSampleParams,
    VarianceRatioParams,
};
use crate::procedures::{
    evaluate_validated, pooled_sd, shown, welch_df, AnovaTable, VarianceRatio,
};
use crate::types::{round4, Source, TestType};

// =============================================================================
// Types
// =============================================================================

/// One displayed step of a worked solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Step {
    Formula {
        title: String,
        formula: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },
    Note {
        title: String,
        text: String,
    },
    Result {
        label: String,
        value: f64,
    },
    DeviationTable {
        title: String,
        table: DeviationTable,
    },
}

/// Cell-by-cell χ² contributions of a contingency table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationTable {
    pub rows: usize,
    pub cols: usize,
    pub row_sums: Vec<f64>,
    pub col_sums: Vec<f64>,
    pub n: f64,
    pub cells: Vec<DeviationCell>,
}

/// One cell: observed, expected and (O − E)²/E. `row` and `col` count from 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviationCell {
    pub row: usize,
    pub col: usize,
    pub o: f64,
    pub e: f64,
    pub term: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationSteps {
    pub test_type: TestType,
    pub steps: Vec<Step>,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Worked solution for a test input, with default settings.
///
/// # Errors
/// `Validation` when the input is invalid, as for `run_test`.
pub fn calculation_steps(input: &TestInput) -> Result<CalculationSteps> {
    calculation_steps_with_config(input, &EngineConfig::default())
}

/// Worked solution for a test input.
pub fn calculation_steps_with_config(
    input: &TestInput,
    config: &EngineConfig,
) -> Result<CalculationSteps> {
    let computation = evaluate_validated(input, config)?;

    let mut steps = match &input.params {
        TestParams::OneSample(p) => one_sample(p),
        TestParams::Paired(p) => paired(p),
        TestParams::Welch(p) => welch(p),
        TestParams::EqualVariance(p) => equal_variance(p),
        TestParams::OneProportion(p) => one_proportion(p),
        TestParams::TwoProportion(p) => two_proportion(p),
        TestParams::GoodnessOfFit(p) => goodness_of_fit(p),
        TestParams::Independence(p) => independence(p)?,
        TestParams::VarianceRatio(p) => variance_ratio(p),
        TestParams::Anova(p) => anova(p),
        TestParams::Binomial(p) => binomial(p),
        TestParams::Poisson(p) => poisson(p),
    };

    let label = if computation.critical.source == Source::Exact {
        format!("Observed value {}", computation.stat_name)
    } else {
        format!("Test statistic {}", computation.stat_name)
    };
    steps.push(Step::Result {
        label,
        value: round4(computation.stat),
    });

    Ok(CalculationSteps {
        test_type: input.test_type(),
        steps,
    })
}

fn formula(title: &str, formula: String) -> Step {
    Step::Formula {
        title: title.to_string(),
        formula,
        note: None,
    }
}

fn formula_with_note(title: &str, formula: String, note: &str) -> Step {
    Step::Formula {
        title: title.to_string(),
        formula,
        note: Some(note.to_string()),
    }
}

fn note(title: &str, text: &str) -> Step {
    Step::Note {
        title: title.to_string(),
        text: text.to_string(),
    }
}

// =============================================================================
// t Tests
// =============================================================================

fn one_sample(p: &OneSampleParams) -> Vec<Step> {
    let s2 = shown(p.sd * p.sd);
    let se = p.sd / p.n.sqrt();
    let t = (p.mean - p.mu0) / se;
    vec![
        formula_with_note(
            "Sample variance s²",
            format!("s^2 = {}^2 = {s2}", p.sd),
            "The population variance is unknown, so it is estimated by the sample variance s².",
        ),
        formula(
            "Standard error SE",
            format!(
                r"SE = \frac{{s}}{{\sqrt{{n}}}} = \frac{{{}}}{{{}}} = {}",
                p.sd,
                shown(p.n.sqrt()),
                shown(se)
            ),
        ),
        formula(
            "t statistic",
            format!(
                r"t = \frac{{\bar{{x}} - \mu_0}}{{SE}} = \frac{{{} - {}}}{{{}}} = \frac{{{}}}{{{}}} = {}",
                p.mean,
                p.mu0,
                shown(se),
                shown(p.mean - p.mu0),
                shown(se),
                shown(t)
            ),
        ),
    ]
}

fn paired(p: &PairedParams) -> Vec<Step> {
    let s2 = shown(p.sd_d * p.sd_d);
    let se = p.sd_d / p.n.sqrt();
    let t = p.d_bar / se;
    vec![
        formula_with_note(
            "Variance of the differences s²_d",
            format!("s_d^2 = {}^2 = {s2}", p.sd_d),
            "The variance of the paired differences is unknown, so it is estimated by s²_d.",
        ),
        formula(
            "Standard error SE",
            format!(
                r"SE = \frac{{s_d}}{{\sqrt{{n}}}} = \frac{{{}}}{{{}}} = {}",
                p.sd_d,
                shown(p.n.sqrt()),
                shown(se)
            ),
        ),
        formula(
            "t statistic",
            format!(
                r"t = \frac{{\bar{{d}}}}{{SE}} = \frac{{{}}}{{{}}} = {}",
                p.d_bar,
                shown(se),
                shown(t)
            ),
        ),
    ]
}

fn sample_variances(p: &TwoSampleParams, note_text: &str) -> Step {
    formula_with_note(
        "Sample variances s²",
        format!(
            r"s_1^2 = {}^2 = {}, \quad s_2^2 = {}^2 = {}",
            p.sd1,
            shown(p.sd1 * p.sd1),
            p.sd2,
            shown(p.sd2 * p.sd2)
        ),
        note_text,
    )
}

fn two_sample_t(p: &TwoSampleParams, se: f64) -> Step {
    let diff = p.mean1 - p.mean2;
    formula(
        "t statistic",
        format!(
            r"t = \frac{{\bar{{x}}_1 - \bar{{x}}_2}}{{SE}} = \frac{{{} - {}}}{{{}}} = \frac{{{}}}{{{}}} = {}",
            p.mean1,
            p.mean2,
            shown(se),
            shown(diff),
            shown(se),
            shown(diff / se)
        ),
    )
}

fn welch(p: &TwoSampleParams) -> Vec<Step> {
    let v1 = p.sd1 * p.sd1 / p.n1;
    let v2 = p.sd2 * p.sd2 / p.n2;
    let se = (v1 + v2).sqrt();
    vec![
        sample_variances(
            p,
            "The population variances are unknown and not assumed equal, so each group \
             keeps its own sample variance.",
        ),
        formula(
            "Standard error SE",
            format!(
                r"SE = \sqrt{{\frac{{s_1^2}}{{n_1}} + \frac{{s_2^2}}{{n_2}}}} = \sqrt{{{} + {}}} = {}",
                shown(v1),
                shown(v2),
                shown(se)
            ),
        ),
        two_sample_t(p, se),
        formula(
            "Welch-Satterthwaite degrees of freedom",
            format!(
                r"df = \frac{{\left(\frac{{s_1^2}}{{n_1}} + \frac{{s_2^2}}{{n_2}}\right)^2}}{{\frac{{(s_1^2/n_1)^2}}{{n_1-1}} + \frac{{(s_2^2/n_2)^2}}{{n_2-1}}}} = {}",
                shown(welch_df(p))
            ),
        ),
    ]
}

fn equal_variance(p: &TwoSampleParams) -> Vec<Step> {
    let df = p.n1 + p.n2 - 2.0;
    let sp = pooled_sd(p);
    let se = sp * (1.0 / p.n1 + 1.0 / p.n2).sqrt();
    vec![
        sample_variances(
            p,
            "The population variances are unknown but assumed equal, so the two sample \
             variances are pooled.",
        ),
        formula(
            "Pooled variance s²_p",
            format!(
                r"s_p^2 = \frac{{(n_1-1)s_1^2 + (n_2-1)s_2^2}}{{n_1+n_2-2}} = \frac{{({}-1) \times {} + ({}-1) \times {}}}{{{}}} = {}",
                p.n1,
                shown(p.sd1 * p.sd1),
                p.n2,
                shown(p.sd2 * p.sd2),
                df,
                shown(sp * sp)
            ),
        ),
        formula(
            "Standard error SE",
            format!(
                r"SE = s_p \sqrt{{\frac{{1}}{{n_1}} + \frac{{1}}{{n_2}}}} = {} \times \sqrt{{\frac{{1}}{{{}}} + \frac{{1}}{{{}}}}} = {}",
                shown(sp),
                p.n1,
                p.n2,
                shown(se)
            ),
        ),
        two_sample_t(p, se),
    ]
}

// =============================================================================
// z Tests on Proportions
// =============================================================================

fn one_proportion(p: &OneProportionParams) -> Vec<Step> {
    let p_hat = p.x / p.n;
    let se = (p.p0 * (1.0 - p.p0) / p.n).sqrt();
    vec![
        formula(
            "Sample proportion p̂",
            format!(
                r"\hat{{p}} = \frac{{x}}{{n}} = \frac{{{}}}{{{}}} = {}",
                p.x,
                p.n,
                shown(p_hat)
            ),
        ),
        formula(
            "Standard error SE",
            format!(
                r"SE = \sqrt{{\frac{{p_0(1-p_0)}}{{n}}}} = \sqrt{{\frac{{{} \times {}}}{{{}}}}} = {}",
                p.p0,
                shown(1.0 - p.p0),
                p.n,
                shown(se)
            ),
        ),
        formula(
            "z statistic",
            format!(
                r"z = \frac{{\hat{{p}} - p_0}}{{SE}} = \frac{{{} - {}}}{{{}}} = {}",
                shown(p_hat),
                p.p0,
                shown(se),
                shown((p_hat - p.p0) / se)
            ),
        ),
    ]
}

fn two_proportion(p: &TwoProportionParams) -> Vec<Step> {
    let p1 = p.x1 / p.n1;
    let p2 = p.x2 / p.n2;
    let pooled = (p.x1 + p.x2) / (p.n1 + p.n2);
    let se = (pooled * (1.0 - pooled) * (1.0 / p.n1 + 1.0 / p.n2)).sqrt();
    vec![
        formula(
            "Sample proportions",
            format!(
                r"\hat{{p}}_1 = \frac{{{}}}{{{}}} = {}, \quad \hat{{p}}_2 = \frac{{{}}}{{{}}} = {}",
                p.x1,
                p.n1,
                shown(p1),
                p.x2,
                p.n2,
                shown(p2)
            ),
        ),
        formula(
            "Pooled proportion",
            format!(
                r"\hat{{p}} = \frac{{x_1 + x_2}}{{n_1 + n_2}} = \frac{{{} + {}}}{{{} + {}}} = {}",
                p.x1,
                p.x2,
                p.n1,
                p.n2,
                shown(pooled)
            ),
        ),
        formula(
            "Standard error SE",
            format!(
                r"SE = \sqrt{{\hat{{p}}(1-\hat{{p}})\left(\frac{{1}}{{n_1}} + \frac{{1}}{{n_2}}\right)}} = {}",
                shown(se)
            ),
        ),
        formula(
            "z statistic",
            format!(
                r"z = \frac{{\hat{{p}}_1 - \hat{{p}}_2}}{{SE}} = \frac{{{} - {}}}{{{}}} = {}",
                shown(p1),
                shown(p2),
                shown(se),
                shown((p1 - p2) / se)
            ),
        ),
    ]
}

// =============================================================================
// χ² Tests
// =============================================================================

fn goodness_of_fit(p: &GoodnessOfFitParams) -> Vec<Step> {
    let terms: Vec<String> = p
        .observed
        .iter()
        .zip(&p.expected)
        .map(|(o, e)| format!(r"\frac{{({o}-{e})^2}}{{{e}}}"))
        .collect();
    let chi2: f64 = p
        .observed
        .iter()
        .zip(&p.expected)
        .map(|(o, e)| (o - e).powi(2) / e)
        .sum();
    let k = p.observed.len();
    vec![
        formula(
            "χ² statistic",
            format!(
                r"\chi^2 = \sum \frac{{(O_i - E_i)^2}}{{E_i}} = {}",
                terms.join(" + ")
            ),
        ),
        formula("Sum", format!(r"\chi^2 = {}", shown(chi2))),
        formula(
            "Degrees of freedom",
            format!("df = k - 1 = {k} - 1 = {}", k - 1),
        ),
    ]
}

fn independence(p: &ContingencyParams) -> Result<Vec<Step>> {
    let observed = to_array2(&p.observed)?;
    let expected = expected_counts(&observed);
    let (row_sums, col_sums) = margins(&observed);
    let (rows, cols) = observed.dim();

    let cells: Vec<DeviationCell> = observed
        .indexed_iter()
        .map(|((i, j), &o)| {
            let e = expected[[i, j]];
            DeviationCell {
                row: i + 1,
                col: j + 1,
                o,
                e: round4(e),
                term: round4((o - e).powi(2) / e),
            }
        })
        .collect();
    let chi2: f64 = observed
        .indexed_iter()
        .map(|((i, j), &o)| (o - expected[[i, j]]).powi(2) / expected[[i, j]])
        .sum();
    let terms: Vec<String> = cells.iter().map(|c| c.term.to_string()).collect();

    Ok(vec![
        formula(
            "Expected counts",
            r"E_{ij} = \frac{f_{i\cdot} \times f_{\cdot j}}{n}".to_string(),
        ),
        Step::DeviationTable {
            title: "Cell deviations (O − E)²/E".to_string(),
            table: DeviationTable {
                rows,
                cols,
                row_sums: row_sums.to_vec(),
                col_sums: col_sums.to_vec(),
                n: observed.sum(),
                cells,
            },
        },
        formula(
            "χ² statistic",
            format!(r"\chi^2 = {} = {}", terms.join(" + "), shown(chi2)),
        ),
        formula(
            "Degrees of freedom",
            format!(
                "df = (r-1)(c-1) = ({rows}-1)({cols}-1) = {}",
                (rows - 1) * (cols - 1)
            ),
        ),
    ])
}

// =============================================================================
// F Tests
// =============================================================================

fn variance_ratio(p: &VarianceRatioParams) -> Vec<Step> {
    let ratio = VarianceRatio::new(p);
    let (larger, smaller) = if ratio.var1 >= ratio.var2 {
        (ratio.var1, ratio.var2)
    } else {
        (ratio.var2, ratio.var1)
    };
    vec![
        formula(
            "Sample variances",
            format!(
                r"s_1^2 = {}^2 = {}, \quad s_2^2 = {}^2 = {}",
                p.sd1,
                shown(ratio.var1),
                p.sd2,
                shown(ratio.var2)
            ),
        ),
        formula(
            "F statistic",
            format!(
                r"F = \frac{{s_{{\text{{larger}}}}^2}}{{s_{{\text{{smaller}}}}^2}} = \frac{{{}}}{{{}}} = {}",
                shown(larger),
                shown(smaller),
                shown(ratio.f)
            ),
        ),
        formula(
            "Degrees of freedom",
            format!(r"df_1 = {}, \quad df_2 = {}", ratio.df1, ratio.df2),
        ),
    ]
}

fn anova(p: &AnovaParams) -> Vec<Step> {
    let table = AnovaTable::new(&p.groups);
    vec![
        formula(
            "Grand mean",
            format!(
                r"\bar{{\bar{{x}}}} = \frac{{\sum n_i \bar{{x}}_i}}{{N}} = {}",
                shown(table.grand_mean)
            ),
        ),
        formula(
            "Between-group sum of squares SS_B",
            format!(
                r"SS_B = \sum n_i (\bar{{x}}_i - \bar{{\bar{{x}}}})^2 = {}",
                shown(table.ss_between)
            ),
        ),
        formula(
            "Within-group sum of squares SS_W",
            format!(r"SS_W = \sum (n_i - 1) s_i^2 = {}", shown(table.ss_within)),
        ),
        formula(
            "F statistic",
            format!(
                r"F = \frac{{MS_B}}{{MS_W}} = \frac{{SS_B / (k-1)}}{{SS_W / (N-k)}} = \frac{{{}}}{{{}}} = {}",
                shown(table.ms_between),
                shown(table.ms_within),
                shown(table.f)
            ),
        ),
    ]
}

// =============================================================================
// Exact Tests
// =============================================================================

fn binomial(p: &OneProportionParams) -> Vec<Step> {
    vec![
        formula(
            "Exact binomial test",
            format!(
                r"x = {}, \quad n = {}, \quad p_0 = {}",
                p.x, p.n, p.p0
            ),
        ),
        formula(
            "Sample proportion",
            format!(
                r"\hat{{p}} = \frac{{x}}{{n}} = \frac{{{}}}{{{}}} = {}",
                p.x,
                p.n,
                shown(p.x / p.n)
            ),
        ),
        note(
            "Decision method",
            "P(X ≥ x) or P(X ≤ x) is computed directly from the binomial distribution.",
        ),
    ]
}

fn poisson(p: &PoissonParams) -> Vec<Step> {
    vec![
        formula(
            "Exact Poisson test",
            format!(r"x = {}, \quad \lambda_0 = {}", p.observed, p.lambda0),
        ),
        note(
            "Decision method",
            "P(X ≥ x) or P(X ≤ x) is computed directly from the Poisson distribution.",
        ),
    ]
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HypotestError;
    use crate::input::GroupSummary;
    use crate::procedures::run_test;
    use crate::types::Tail;
    use serde_json::json;

    fn final_value(steps: &CalculationSteps) -> f64 {
        match steps.steps.last() {
            Some(Step::Result { value, .. }) => *value,
            other => panic!("last step is not a result: {other:?}"),
        }
    }

    #[test]
    fn test_one_sample_steps() {
        let input = TestInput::new(
            0.05,
            Tail::Two,
            TestParams::OneSample(OneSampleParams {
                n: 25.0,
                mean: 52.0,
                sd: 5.0,
                mu0: 50.0,
            }),
        );
        let steps = calculation_steps(&input).unwrap();
        assert_eq!(steps.test_type, TestType::TOneSample);
        assert_eq!(steps.steps.len(), 4);
        match &steps.steps[1] {
            Step::Formula { formula, .. } => {
                assert_eq!(formula, r"SE = \frac{s}{\sqrt{n}} = \frac{5}{5} = 1")
            }
            other => panic!("unexpected step {other:?}"),
        }
        assert_eq!(final_value(&steps), 2.0);
    }

    #[test]
    fn test_result_marker_matches_run_test() {
        let input = TestInput::new(
            0.05,
            Tail::Two,
            TestParams::Welch(TwoSampleParams {
                n1: 12.0,
                mean1: 24.1,
                sd1: 3.2,
                n2: 15.0,
                mean2: 21.4,
                sd2: 5.9,
            }),
        );
        let steps = calculation_steps(&input).unwrap();
        assert_eq!(final_value(&steps), run_test(&input).unwrap().stat.value);
        assert!(steps.steps.iter().any(|s| matches!(
            s,
            Step::Formula { title, .. } if title == "Welch-Satterthwaite degrees of freedom"
        )));
    }

    #[test]
    fn test_independence_deviation_table() {
        let input = TestInput::new(
            0.05,
            Tail::Right,
            TestParams::Independence(ContingencyParams {
                rows: 2.0,
                cols: 2.0,
                observed: vec![vec![10.0, 20.0], vec![30.0, 40.0]],
            }),
        );
        let steps = calculation_steps(&input).unwrap();
        let table = steps
            .steps
            .iter()
            .find_map(|s| match s {
                Step::DeviationTable { table, .. } => Some(table),
                _ => None,
            })
            .unwrap();
        assert_eq!(table.row_sums, vec![30.0, 70.0]);
        assert_eq!(table.col_sums, vec![40.0, 60.0]);
        assert_eq!(table.n, 100.0);
        assert_eq!(table.cells.len(), 4);
        assert_eq!(table.cells[0], DeviationCell {
            row: 1,
            col: 1,
            o: 10.0,
            e: 12.0,
            term: 0.3333,
        });
        assert_eq!(final_value(&steps), run_test(&input).unwrap().stat.value);
    }

    #[test]
    fn test_anova_and_exact_markers() {
        let anova_input = TestInput::new(
            0.05,
            Tail::Right,
            TestParams::Anova(AnovaParams {
                k: 3.0,
                groups: vec![
                    GroupSummary { n: 5.0, mean: 10.0, sd: 2.0 },
                    GroupSummary { n: 5.0, mean: 12.0, sd: 2.0 },
                    GroupSummary { n: 5.0, mean: 17.0, sd: 2.0 },
                ],
            }),
        );
        let steps = calculation_steps(&anova_input).unwrap();
        assert_eq!(final_value(&steps), 16.25);

        let binom_input = TestInput::new(
            0.05,
            Tail::Right,
            TestParams::Binomial(OneProportionParams {
                n: 20.0,
                x: 15.0,
                p0: 0.5,
            }),
        );
        let steps = calculation_steps(&binom_input).unwrap();
        assert!(matches!(steps.steps[2], Step::Note { .. }));
        match steps.steps.last() {
            Some(Step::Result { label, value }) => {
                assert_eq!(label, "Observed value x");
                assert_eq!(*value, 15.0);
            }
            other => panic!("unexpected step {other:?}"),
        }
    }

    #[test]
    fn test_invalid_input_is_rejected() {
        let input = TestInput::new(
            0.05,
            Tail::Two,
            TestParams::VarianceRatio(VarianceRatioParams {
                n1: 10.0,
                sd1: -1.0,
                n2: 10.0,
                sd2: 2.0,
            }),
        );
        assert!(matches!(
            calculation_steps(&input),
            Err(HypotestError::Validation(_))
        ));
    }

    #[test]
    fn test_steps_serialize_with_kind_tag() {
        let step = Step::Result {
            label: "Test statistic t".to_string(),
            value: 2.0,
        };
        assert_eq!(
            serde_json::to_value(&step).unwrap(),
            json!({"kind": "result", "label": "Test statistic t", "value": 2.0})
        );
        let formula_step = formula("Sum", r"\chi^2 = 2".to_string());
        assert_eq!(
            serde_json::to_value(&formula_step).unwrap(),
            json!({"kind": "formula", "title": "Sum", "formula": r"\chi^2 = 2"})
        );
    }
}
