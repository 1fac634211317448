// =============================================================================
// Hypothesis Test Engine
// =============================================================================
//
// Twelve test procedures behind one entry point. Each procedure turns its
// parameter record into a `Computation` at full floating-point precision;
// rounding to 4 decimals happens once, when the computation becomes the
// public `TestResult`.
//
//   means         t_1sample, t_paired, t_welch, t_equal_var
//   proportions   prop_1, prop_2
//   chi_squared   chi2_gof, chi2_indep
//   variance      f_eqvar, anova_oneway
//   exact         binom, poisson
//
// DECISION RULE
// -------------
//   two    reject if stat < left or stat > right
//   right  reject if stat > right
//   left   reject if stat < left
//
// χ², F and ANOVA statistics are non-negative and always use the right-tail
// rule whatever tail was requested. The exact tests have no critical value
// and reject when p ≤ alpha.
//
// Every entry point validates its input first. Inputs that would make a
// formula degenerate (zero sd, n = 1, empty margins, ...) come back as
// `HypotestError::Validation` instead of a NaN-filled result.
//
// =============================================================================

mod chi_squared;
mod exact;
mod means;
mod proportions;
mod variance;

pub(crate) use means::{pooled_sd, welch_df};
pub(crate) use variance::{AnovaTable, VarianceRatio};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::EngineConfig;
use crate::critical::{table_subset, CriticalParams, TableSubset};
use crate::distributions::{normal_cdf, t_cdf};
use crate::error::{HypotestError, Result};
use crate::input::{TestInput, TestParams};
use crate::types::{
    round4, CriticalValue, Decision, DegreesOfFreedom, Distribution, Statistic, Tail, TestResult,
    TestType,
};
use crate::validation::validate_inputs_with_config;

// =============================================================================
// Public Entry Points
// =============================================================================

/// A test result paired with the table rows its critical value came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Simulation {
    pub result: TestResult,
    /// `None` for the exact tests, which use no table.
    pub table_data: Option<TableSubset>,
}

/// Run a hypothesis test with default settings.
///
/// # Example
/// ```
/// use hypotest_core::{run_test, Decision, TestInput};
///
/// let input = TestInput::from_json(r#"{
///     "test_type": "t_1sample", "alpha": 0.05, "tail": "two",
///     "params": {"n": 25, "mean": 52, "sd": 5, "mu0": 50}
/// }"#).unwrap();
/// let result = run_test(&input).unwrap();
/// assert_eq!(result.stat.value, 2.0);
/// assert_eq!(result.decision, Decision::FailToReject);
/// ```
pub fn run_test(input: &TestInput) -> Result<TestResult> {
    run_test_with_config(input, &EngineConfig::default())
}

/// Run a hypothesis test.
///
/// # Arguments
/// * `input` - Alpha, tail and test parameters
/// * `config` - Resolver and engine settings
///
/// # Errors
/// `Validation` with the field-level problems when the input is invalid.
pub fn run_test_with_config(input: &TestInput, config: &EngineConfig) -> Result<TestResult> {
    let computation = evaluate_validated(input, config)?;
    Ok(computation.into_result(input.test_type()))
}

/// Run a test and attach the table subset for the lookup it made.
pub fn simulate(input: &TestInput) -> Result<Simulation> {
    simulate_with_config(input, &EngineConfig::default())
}

/// Run a test and attach the table subset for the lookup it made.
///
/// The subset is drawn at the df and alpha the test actually used: the
/// halved alpha for a two-sided F variance test, the rounded Welch df for
/// Welch's t test.
pub fn simulate_with_config(input: &TestInput, config: &EngineConfig) -> Result<Simulation> {
    let computation = evaluate_validated(input, config)?;
    let table_data = match &computation.lookup {
        Some(lookup) => Some(table_subset(lookup.distribution, &lookup.params)?),
        None => None,
    };
    Ok(Simulation {
        result: computation.into_result(input.test_type()),
        table_data,
    })
}

/// Run many independent tests in parallel. Results keep the input order.
pub fn run_batch(inputs: &[TestInput]) -> Vec<Result<TestResult>> {
    run_batch_with_config(inputs, &EngineConfig::default())
}

/// Run many independent tests in parallel. Results keep the input order.
pub fn run_batch_with_config(inputs: &[TestInput], config: &EngineConfig) -> Vec<Result<TestResult>> {
    inputs
        .par_iter()
        .map(|input| run_test_with_config(input, config))
        .collect()
}

// =============================================================================
// Dispatch
// =============================================================================

/// Validate, then evaluate. Shared by every public entry point.
pub(crate) fn evaluate_validated(input: &TestInput, config: &EngineConfig) -> Result<Computation> {
    let validation = validate_inputs_with_config(input, config);
    if !validation.valid {
        return Err(HypotestError::Validation(validation.errors));
    }
    evaluate(input, config)
}

fn evaluate(input: &TestInput, config: &EngineConfig) -> Result<Computation> {
    trace!(
        test_type = %input.test_type(),
        alpha = input.alpha,
        tail = input.tail.as_str(),
        "running hypothesis test"
    );
    let ctx = Context {
        alpha: input.alpha,
        tail: input.tail,
        config,
    };

    match &input.params {
        TestParams::OneSample(p) => means::one_sample(p, &ctx),
        TestParams::Paired(p) => means::paired(p, &ctx),
        TestParams::Welch(p) => means::welch(p, &ctx),
        TestParams::EqualVariance(p) => means::equal_variance(p, &ctx),
        TestParams::OneProportion(p) => proportions::one_proportion(p, &ctx),
        TestParams::TwoProportion(p) => proportions::two_proportion(p, &ctx),
        TestParams::GoodnessOfFit(p) => chi_squared::goodness_of_fit(p, &ctx),
        TestParams::Independence(p) => chi_squared::independence(p, &ctx),
        TestParams::VarianceRatio(p) => variance::variance_ratio(p, &ctx),
        TestParams::Anova(p) => variance::anova_oneway(p, &ctx),
        TestParams::Binomial(p) => exact::binomial(p, &ctx),
        TestParams::Poisson(p) => exact::poisson(p, &ctx),
    }
}

/// Per-call settings handed to every procedure.
pub(crate) struct Context<'a> {
    pub alpha: f64,
    pub tail: Tail,
    pub config: &'a EngineConfig,
}

// =============================================================================
// Computation
// =============================================================================

/// The table lookup a test made, kept for the subset view.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TableLookup {
    pub distribution: Distribution,
    pub params: CriticalParams,
}

/// Unrounded outcome of a procedure.
#[derive(Debug, Clone)]
pub(crate) struct Computation {
    pub stat_name: &'static str,
    pub stat: f64,
    pub df: DegreesOfFreedom,
    pub critical: CriticalValue,
    pub p_value: Option<f64>,
    pub decision: Decision,
    pub meta: Vec<(&'static str, f64)>,
    pub notes: Vec<String>,
    pub lookup: Option<TableLookup>,
}

impl Computation {
    /// Round every reported number and build the public record.
    pub fn into_result(self, test_type: TestType) -> TestResult {
        let df = match self.df {
            DegreesOfFreedom::Single { v } => DegreesOfFreedom::Single { v: round4(v) },
            DegreesOfFreedom::Pair { df1, df2 } => DegreesOfFreedom::Pair {
                df1: round4(df1),
                df2: round4(df2),
            },
            DegreesOfFreedom::NotApplicable {} => DegreesOfFreedom::NotApplicable {},
        };

        TestResult {
            test_type,
            decision: self.decision,
            decision_text: self.decision.text().to_string(),
            stat: Statistic {
                name: self.stat_name.to_string(),
                value: round4(self.stat),
                df,
            },
            critical: self.critical.rounded(),
            p_value: self.p_value.map(round4),
            meta: self
                .meta
                .into_iter()
                .map(|(key, value)| (key.to_string(), round4(value)))
                .collect(),
            notes: self.notes,
        }
    }
}

// =============================================================================
// Decision Rule
// =============================================================================

/// Compare a statistic against its rejection bounds.
pub(crate) fn decide(stat: f64, critical: &CriticalValue, tail: Tail) -> Decision {
    let above = |bound: Option<f64>| bound.is_some_and(|b| stat > b);
    let below = |bound: Option<f64>| bound.is_some_and(|b| stat < b);

    let reject = match tail {
        Tail::Two => below(critical.left) || above(critical.right),
        Tail::Right => above(critical.right),
        Tail::Left => below(critical.left),
    };
    if reject {
        Decision::Reject
    } else {
        Decision::FailToReject
    }
}

/// Exact tests: reject when the p-value does not exceed alpha.
pub(crate) fn decide_exact(p_value: f64, alpha: f64) -> Decision {
    if p_value <= alpha {
        Decision::Reject
    } else {
        Decision::FailToReject
    }
}

// =============================================================================
// P-Values
// =============================================================================

/// P-value of a t statistic.
///
/// # Arguments
/// * `t` - The t statistic
/// * `df` - Degrees of freedom
/// * `tail` - Which tail(s) count as extreme
pub(crate) fn t_p_value(t: f64, df: f64, tail: Tail) -> f64 {
    match tail {
        Tail::Two => 2.0 * (1.0 - t_cdf(t.abs(), df)),
        Tail::Right => 1.0 - t_cdf(t, df),
        Tail::Left => t_cdf(t, df),
    }
}

/// P-value of a z statistic.
pub(crate) fn z_p_value(z: f64, tail: Tail) -> f64 {
    match tail {
        Tail::Two => 2.0 * (1.0 - normal_cdf(z.abs())),
        Tail::Right => 1.0 - normal_cdf(z),
        Tail::Left => normal_cdf(z),
    }
}

/// Format a number for a note the way it is reported.
pub(crate) fn shown(v: f64) -> String {
    round4(v).to_string()
}

// =============================================================================
// Tests
// =============================================================================
