// =============================================================================
// Input Validation
// =============================================================================
//
// Validation never fails with an `Err`. Every problem becomes a
// `FieldError` naming the parameter it belongs to, so a form can highlight
// the exact box that needs fixing.
//
// WHAT A VALID INPUT GUARANTEES
// -----------------------------
// The procedures do no guarding of their own. A valid input is one for which
// every formula stays finite:
//   - sd > 0 and n ≥ 2 wherever a standard error or n − 1 df appears
//   - counts are integers within their n, proportions strictly inside (0, 1)
//   - expected counts and contingency margins are positive
//   - ANOVA has k ≥ 3 groups and at least one within-group df
//
// ALONGSIDE THE ERRORS
// --------------------
//   badges    ok / warn for approximation conditions, a warn when a
//             right-tail-only test is asked for the left tail, and one
//             error badge summarising the problem count
//   derived   quick previews (df, SE, approximate statistic) computed only
//             when the input is valid
//
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::EngineConfig;
use crate::convert::{expected_counts, margins, to_array2};
use crate::error::FieldError;
use crate::input::{
    AnovaParams, ContingencyParams, GoodnessOfFitParams, OneProportionParams, OneSampleParams,
    PairedParams, PoissonParams, TestInput, TestParams, TwoProportionParams, TwoSampleParams,
    VarianceRatioParams,
};
use crate::procedures::{pooled_sd, welch_df, AnovaTable, VarianceRatio};
use crate::types::{Tail, TestType};

/// Significance levels a caller may choose.
const ACCEPTED_ALPHAS: [f64; 3] = [0.10, 0.05, 0.01];

// =============================================================================
// Result Types
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeStatus {
    Ok,
    Warn,
    Error,
}

/// A short status line shown next to the input form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Badge {
    pub status: BadgeStatus,
    pub message: String,
}

/// Outcome of validating one test input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<FieldError>,
    pub badges: Vec<Badge>,
    /// Preview quantities; empty when `valid` is false.
    pub derived: BTreeMap<String, f64>,
}

// =============================================================================
// Entry Points
// =============================================================================

/// Validate a typed test input with default settings.
pub fn validate_inputs(input: &TestInput) -> ValidationResult {
    validate_inputs_with_config(input, &EngineConfig::default())
}

/// Validate a typed test input.
///
/// `config.min_expected_count` sets the threshold behind the approximation
/// badges.
pub fn validate_inputs_with_config(input: &TestInput, config: &EngineConfig) -> ValidationResult {
    let mut v = Validator::new(config);
    v.alpha(input.alpha);
    check_params(&mut v, input);
    v.finish(input.test_type())
}

/// Validate a raw `{test_type, alpha, tail, params}` JSON document.
pub fn validate_json(value: &Value) -> ValidationResult {
    validate_json_with_config(value, &EngineConfig::default())
}

/// Validate a raw JSON document.
///
/// Shape problems map onto the top-level field they came from:
/// `test_type`, `alpha`, `tail` or `params`. Once the document decodes,
/// the typed checks of [`validate_inputs_with_config`] apply.
pub fn validate_json_with_config(value: &Value, config: &EngineConfig) -> ValidationResult {
    let mut v = Validator::new(config);

    let Some(test_type) = value
        .get("test_type")
        .and_then(Value::as_str)
        .and_then(|name| name.parse::<TestType>().ok())
    else {
        v.error("test_type", "unknown test type");
        return v.finish_untyped();
    };

    let alpha = match value.get("alpha") {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    if alpha.is_none() {
        v.error("alpha", "alpha must be a number");
    }

    let tail = value
        .get("tail")
        .and_then(Value::as_str)
        .and_then(|t| t.parse::<Tail>().ok());
    if tail.is_none() {
        v.error("tail", "tail must be one of two, right, left");
    }

    let params = match TestParams::from_value(
        test_type,
        value.get("params").cloned().unwrap_or(Value::Null),
    ) {
        Ok(params) => Some(params),
        Err(err) => {
            v.error("params", format!("params do not fit {test_type}: {err}"));
            None
        }
    };

    match (alpha, tail, params) {
        (Some(alpha), Some(tail), Some(params)) => {
            validate_inputs_with_config(&TestInput::new(alpha, tail, params), config)
        }
        _ => v.finish(test_type),
    }
}

// =============================================================================
// Per-Test Checks
// =============================================================================

fn check_params(v: &mut Validator, input: &TestInput) {
    match &input.params {
        TestParams::OneSample(p) => one_sample(v, p),
        TestParams::Paired(p) => paired(v, p),
        TestParams::Welch(p) => two_sample(v, p, false),
        TestParams::EqualVariance(p) => two_sample(v, p, true),
        TestParams::OneProportion(p) => one_proportion(v, p),
        TestParams::TwoProportion(p) => two_proportion(v, p),
        TestParams::GoodnessOfFit(p) => goodness_of_fit(v, p),
        TestParams::Independence(p) => independence(v, p),
        TestParams::VarianceRatio(p) => variance_ratio(v, p),
        TestParams::Anova(p) => anova(v, p),
        TestParams::Binomial(p) => binomial(v, p),
        TestParams::Poisson(p) => poisson(v, p),
    }

    if input.test_type().is_right_tail_only() && input.tail == Tail::Left {
        v.badge(
            BadgeStatus::Warn,
            "This test is evaluated in the right tail; the left-tail choice is ignored.",
        );
    }
}

fn one_sample(v: &mut Validator, p: &OneSampleParams) {
    v.sample_size("n", p.n);
    v.finite("mean", p.mean);
    v.positive("sd", p.sd);
    v.finite("mu0", p.mu0);
    if v.is_clean() {
        let se = p.sd / p.n.sqrt();
        v.derive("df", p.n - 1.0);
        v.derive("se", se);
        v.derive("t_approx", (p.mean - p.mu0) / se);
    }
}

fn paired(v: &mut Validator, p: &PairedParams) {
    v.sample_size("n", p.n);
    v.finite("d_bar", p.d_bar);
    v.positive("sd_d", p.sd_d);
    if v.is_clean() {
        let se = p.sd_d / p.n.sqrt();
        v.derive("df", p.n - 1.0);
        v.derive("se", se);
        v.derive("t_approx", p.d_bar / se);
    }
}

fn two_sample(v: &mut Validator, p: &TwoSampleParams, pooled: bool) {
    v.sample_size("n1", p.n1);
    v.finite("mean1", p.mean1);
    v.positive("sd1", p.sd1);
    v.sample_size("n2", p.n2);
    v.finite("mean2", p.mean2);
    v.positive("sd2", p.sd2);
    if !v.is_clean() {
        return;
    }

    let diff = p.mean1 - p.mean2;
    if pooled {
        let sp = pooled_sd(p);
        let se = sp * (1.0 / p.n1 + 1.0 / p.n2).sqrt();
        v.derive("df", p.n1 + p.n2 - 2.0);
        v.derive("se", se);
        v.derive("t_approx", diff / se);
        v.derive("pooled_sd", sp);
    } else {
        let se = (p.sd1 * p.sd1 / p.n1 + p.sd2 * p.sd2 / p.n2).sqrt();
        v.derive("df", welch_df(p));
        v.derive("se", se);
        v.derive("t_approx", diff / se);
    }
}

fn one_proportion(v: &mut Validator, p: &OneProportionParams) {
    v.trials_and_successes(("n", p.n), ("x", p.x));
    v.proportion("p0", p.p0);
    if !v.is_clean() {
        return;
    }

    let min = v.min_expected;
    if p.n * p.p0 < min || p.n * (1.0 - p.p0) < min {
        v.badge(
            BadgeStatus::Warn,
            format!("n·p0 or n·(1−p0) < {min}: the normal approximation may be inaccurate"),
        );
    } else {
        v.badge(BadgeStatus::Ok, "Approximation condition met");
    }

    let p_hat = p.x / p.n;
    let se = (p.p0 * (1.0 - p.p0) / p.n).sqrt();
    v.derive("p_hat", p_hat);
    v.derive("se", se);
    v.derive("z_approx", (p_hat - p.p0) / se);
}

fn two_proportion(v: &mut Validator, p: &TwoProportionParams) {
    v.trials_and_successes(("n1", p.n1), ("x1", p.x1));
    v.trials_and_successes(("n2", p.n2), ("x2", p.x2));
    if !v.is_clean() {
        return;
    }

    let pooled = (p.x1 + p.x2) / (p.n1 + p.n2);
    if pooled <= 0.0 || pooled >= 1.0 {
        v.error(
            "x1",
            "the pooled proportion is 0 or 1, so the standard error is zero",
        );
        return;
    }

    let min = v.min_expected;
    let small = [p.n1, p.n2]
        .iter()
        .any(|&n| n * pooled < min || n * (1.0 - pooled) < min);
    if small {
        v.badge(
            BadgeStatus::Warn,
            format!("Some expected cell counts are below {min}"),
        );
    } else {
        v.badge(BadgeStatus::Ok, "Approximation condition met");
    }

    let p1 = p.x1 / p.n1;
    let p2 = p.x2 / p.n2;
    let se = (pooled * (1.0 - pooled) * (1.0 / p.n1 + 1.0 / p.n2)).sqrt();
    v.derive("p1", p1);
    v.derive("p2", p2);
    v.derive("p_pooled", pooled);
    v.derive("se", se);
    v.derive("z_approx", (p1 - p2) / se);
}

fn goodness_of_fit(v: &mut Validator, p: &GoodnessOfFitParams) {
    if p.observed.len() < 2 {
        v.error("observed", "at least 2 categories are required");
    }
    if p.expected.len() < 2 {
        v.error("expected", "at least 2 categories are required");
    }
    if p.observed.len() != p.expected.len() {
        v.error(
            "expected",
            format!(
                "{} expected counts for {} observed categories",
                p.expected.len(),
                p.observed.len()
            ),
        );
    }
    for (i, &o) in p.observed.iter().enumerate() {
        v.non_negative(&format!("observed[{i}]"), o);
    }
    for (i, &e) in p.expected.iter().enumerate() {
        v.positive(&format!("expected[{i}]"), e);
    }
    if !v.is_clean() {
        return;
    }

    let min = v.min_expected;
    if p.expected.iter().any(|&e| e < min) {
        v.badge(
            BadgeStatus::Warn,
            format!("Some categories have expected counts below {min}"),
        );
    } else {
        v.badge(BadgeStatus::Ok, "Approximation condition met");
    }

    let chi2: f64 = p
        .observed
        .iter()
        .zip(&p.expected)
        .map(|(o, e)| (o - e).powi(2) / e)
        .sum();
    v.derive("df", (p.observed.len() - 1) as f64);
    v.derive("chi2_approx", chi2);
}

fn independence(v: &mut Validator, p: &ContingencyParams) {
    let rows_ok = v.integer_at_least("rows", p.rows, 2.0);
    let cols_ok = v.integer_at_least("cols", p.cols, 2.0);
    if !(rows_ok && cols_ok) {
        return;
    }

    let (rows, cols) = (p.rows as usize, p.cols as usize);
    if p.observed.len() != rows {
        v.error(
            "observed",
            format!("{} rows given, {rows} declared", p.observed.len()),
        );
        return;
    }
    for (i, row) in p.observed.iter().enumerate() {
        if row.len() != cols {
            v.error(
                format!("observed[{i}]"),
                format!("{} columns given, {cols} declared", row.len()),
            );
            continue;
        }
        for (j, &cell) in row.iter().enumerate() {
            v.non_negative(&format!("observed[{i}][{j}]"), cell);
        }
    }
    if !v.is_clean() {
        return;
    }

    let Ok(grid) = to_array2(&p.observed) else {
        v.error("observed", "the table has no cells");
        return;
    };
    let (row_sums, col_sums) = margins(&grid);
    for (i, _) in row_sums.iter().enumerate().filter(|(_, &s)| s <= 0.0) {
        v.error(format!("observed[{i}]"), "row total is zero");
    }
    for (j, _) in col_sums.iter().enumerate().filter(|(_, &s)| s <= 0.0) {
        v.error("observed", format!("column {j} total is zero"));
    }
    if !v.is_clean() {
        return;
    }

    let min = v.min_expected;
    if expected_counts(&grid).iter().any(|&e| e < min) {
        v.badge(
            BadgeStatus::Warn,
            format!("Some cells have expected counts below {min}"),
        );
    } else {
        v.badge(BadgeStatus::Ok, "Approximation condition met");
    }

    v.derive("df", ((rows - 1) * (cols - 1)) as f64);
    v.derive("n_total", grid.sum());
}

fn variance_ratio(v: &mut Validator, p: &VarianceRatioParams) {
    v.sample_size("n1", p.n1);
    v.positive("sd1", p.sd1);
    v.sample_size("n2", p.n2);
    v.positive("sd2", p.sd2);
    if v.is_clean() {
        let ratio = VarianceRatio::new(p);
        v.derive("f_approx", ratio.f);
        v.derive("df1", ratio.df1);
        v.derive("df2", ratio.df2);
    }
}

fn anova(v: &mut Validator, p: &AnovaParams) {
    let k_ok = v.integer_at_least("k", p.k, 3.0);
    if k_ok && p.groups.len() != p.k as usize {
        v.error(
            "groups",
            format!("{} groups given, k = {}", p.groups.len(), p.k),
        );
    }
    for (i, g) in p.groups.iter().enumerate() {
        v.integer_at_least(&format!("groups[{i}].n"), g.n, 1.0);
        v.finite(&format!("groups[{i}].mean"), g.mean);
        v.positive(&format!("groups[{i}].sd"), g.sd);
    }
    if !v.is_clean() {
        return;
    }

    let total: f64 = p.groups.iter().map(|g| g.n).sum();
    if total - p.k < 1.0 {
        v.error("groups", "every group has n = 1, leaving no within-group df");
        return;
    }

    let table = AnovaTable::new(&p.groups);
    v.derive("df1", table.df_between);
    v.derive("df2", table.df_within);
    v.derive("f_approx", table.f);
}

fn binomial(v: &mut Validator, p: &OneProportionParams) {
    v.trials_and_successes(("n", p.n), ("x", p.x));
    let max = v.max_exact_count;
    v.at_most("n", p.n, max);
    v.proportion("p0", p.p0);
    if v.is_clean() {
        v.derive("p_hat", p.x / p.n);
        v.derive("expected", p.n * p.p0);
    }
}

fn poisson(v: &mut Validator, p: &PoissonParams) {
    v.integer_at_least("observed", p.observed, 0.0);
    v.positive("lambda0", p.lambda0);
    let (max_count, max_rate) = (v.max_exact_count, v.max_poisson_rate);
    v.at_most("observed", p.observed, max_count);
    v.at_most("lambda0", p.lambda0, max_rate);
    if v.is_clean() {
        v.derive("expected", p.lambda0);
        v.derive("rate_ratio", p.observed / p.lambda0);
    }
}

// =============================================================================
// Validator
// =============================================================================

/// Collects errors, badges and derived values for one input.
struct Validator {
    errors: Vec<FieldError>,
    badges: Vec<Badge>,
    derived: BTreeMap<String, f64>,
    min_expected: f64,
    max_exact_count: f64,
    max_poisson_rate: f64,
}

impl Validator {
    fn new(config: &EngineConfig) -> Self {
        Self {
            errors: Vec::new(),
            badges: Vec::new(),
            derived: BTreeMap::new(),
            min_expected: config.min_expected_count,
            max_exact_count: config.max_exact_count as f64,
            max_poisson_rate: config.max_poisson_rate,
        }
    }

    fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    fn badge(&mut self, status: BadgeStatus, message: impl Into<String>) {
        self.badges.push(Badge {
            status,
            message: message.into(),
        });
    }

    fn derive(&mut self, key: &str, value: f64) {
        self.derived.insert(key.to_string(), value);
    }

    fn alpha(&mut self, alpha: f64) {
        if !ACCEPTED_ALPHAS.iter().any(|a| (a - alpha).abs() < 1e-9) {
            self.error("alpha", "alpha must be one of 0.10, 0.05, 0.01");
        }
    }

    fn finite(&mut self, field: &str, value: f64) -> bool {
        let ok = value.is_finite();
        if !ok {
            self.error(field, format!("{field} must be a finite number"));
        }
        ok
    }

    fn positive(&mut self, field: &str, value: f64) -> bool {
        let ok = value.is_finite() && value > 0.0;
        if !ok {
            self.error(field, format!("{field} must be positive"));
        }
        ok
    }

    fn non_negative(&mut self, field: &str, value: f64) -> bool {
        let ok = value.is_finite() && value >= 0.0;
        if !ok {
            self.error(field, format!("{field} must be zero or more"));
        }
        ok
    }

    /// Upper bound for the exact tests. Non-finite values are left to the
    /// other checks.
    fn at_most(&mut self, field: &str, value: f64, max: f64) -> bool {
        let ok = !value.is_finite() || value <= max;
        if !ok {
            self.error(field, format!("{field} must be at most {max} for the exact test"));
        }
        ok
    }

    fn proportion(&mut self, field: &str, value: f64) -> bool {
        let ok = value.is_finite() && value > 0.0 && value < 1.0;
        if !ok {
            self.error(field, format!("{field} must lie strictly between 0 and 1"));
        }
        ok
    }

    fn integer_at_least(&mut self, field: &str, value: f64, min: f64) -> bool {
        let ok = value.is_finite() && value.fract() == 0.0 && value >= min;
        if !ok {
            self.error(field, format!("{field} must be an integer >= {min}"));
        }
        ok
    }

    /// A size that feeds an n − 1 df.
    fn sample_size(&mut self, field: &str, value: f64) -> bool {
        self.integer_at_least(field, value, 2.0)
    }

    /// `n` trials with `0 ≤ x ≤ n` successes.
    fn trials_and_successes(&mut self, (n_field, n): (&str, f64), (x_field, x): (&str, f64)) {
        let n_ok = self.integer_at_least(n_field, n, 1.0);
        let x_ok = self.integer_at_least(x_field, x, 0.0);
        if n_ok && x_ok && x > n {
            self.error(x_field, format!("{x_field} cannot exceed {n_field}"));
        }
    }

    fn finish(self, test_type: TestType) -> ValidationResult {
        if !self.is_clean() {
            debug!(
                test_type = %test_type,
                problems = self.errors.len(),
                "test input failed validation"
            );
        }
        self.finish_untyped()
    }

    fn finish_untyped(mut self) -> ValidationResult {
        let valid = self.is_clean();
        if !valid {
            let count = self.errors.len();
            self.badge(
                BadgeStatus::Error,
                format!("{count} problem(s) found in the input"),
            );
            self.derived.clear();
        }
        ValidationResult {
            valid,
            errors: self.errors,
            badges: self.badges,
            derived: self.derived,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::GroupSummary;
    use approx::assert_abs_diff_eq;
    use serde_json::json;

    fn input(tail: Tail, params: TestParams) -> TestInput {
        TestInput::new(0.05, tail, params)
    }

    fn fields(result: &ValidationResult) -> Vec<&str> {
        result.errors.iter().map(|e| e.field.as_str()).collect()
    }

    fn one_sample(n: f64, sd: f64) -> TestParams {
        TestParams::OneSample(OneSampleParams {
            n,
            mean: 52.0,
            sd,
            mu0: 50.0,
        })
    }

    #[test]
    fn test_valid_one_sample_derives_preview() {
        let result = validate_inputs(&input(Tail::Two, one_sample(25.0, 5.0)));
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert_eq!(result.derived["df"], 24.0);
        assert_abs_diff_eq!(result.derived["se"], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.derived["t_approx"], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_one_sample_is_rejected() {
        let result = validate_inputs(&input(Tail::Two, one_sample(1.0, 0.0)));
        assert!(!result.valid);
        assert_eq!(fields(&result), vec!["n", "sd"]);
        assert!(result.derived.is_empty());
        let last = result.badges.last().unwrap();
        assert_eq!(last.status, BadgeStatus::Error);
        assert_eq!(last.message, "2 problem(s) found in the input");
    }

    #[test]
    fn test_alpha_outside_choices() {
        let mut bad = input(Tail::Two, one_sample(25.0, 5.0));
        bad.alpha = 0.025;
        assert_eq!(fields(&validate_inputs(&bad)), vec!["alpha"]);
    }

    #[test]
    fn test_fractional_sample_size() {
        let result = validate_inputs(&input(Tail::Two, one_sample(12.5, 5.0)));
        assert_eq!(fields(&result), vec!["n"]);
    }

    #[test]
    fn test_equal_variance_derives_pooled_sd() {
        let params = TestParams::EqualVariance(TwoSampleParams {
            n1: 10.0,
            mean1: 5.0,
            sd1: 2.0,
            n2: 10.0,
            mean2: 4.0,
            sd2: 2.0,
        });
        let result = validate_inputs(&input(Tail::Two, params));
        assert_eq!(result.derived["df"], 18.0);
        assert_abs_diff_eq!(result.derived["pooled_sd"], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_successes_cannot_exceed_trials() {
        let params = TestParams::OneProportion(OneProportionParams {
            n: 10.0,
            x: 11.0,
            p0: 0.5,
        });
        assert_eq!(fields(&validate_inputs(&input(Tail::Two, params))), vec!["x"]);
    }

    #[test]
    fn test_one_proportion_badges() {
        let small = TestParams::OneProportion(OneProportionParams {
            n: 20.0,
            x: 3.0,
            p0: 0.1,
        });
        let result = validate_inputs(&input(Tail::Two, small));
        assert!(result.valid);
        assert_eq!(result.badges[0].status, BadgeStatus::Warn);

        let large = TestParams::OneProportion(OneProportionParams {
            n: 100.0,
            x: 62.0,
            p0: 0.5,
        });
        let result = validate_inputs(&input(Tail::Two, large));
        assert_eq!(result.badges[0].status, BadgeStatus::Ok);
        assert_abs_diff_eq!(result.derived["z_approx"], 2.4, epsilon = 1e-12);
    }

    #[test]
    fn test_two_proportion_pooled_extremes() {
        let params = TestParams::TwoProportion(TwoProportionParams {
            n1: 30.0,
            x1: 0.0,
            n2: 40.0,
            x2: 0.0,
        });
        let result = validate_inputs(&input(Tail::Two, params));
        assert!(!result.valid);
        assert_eq!(fields(&result), vec!["x1"]);
    }

    #[test]
    fn test_goodness_of_fit_shape_and_values() {
        let params = TestParams::GoodnessOfFit(GoodnessOfFitParams {
            observed: vec![10.0, -1.0, 5.0],
            expected: vec![5.0, 0.0],
        });
        let result = validate_inputs(&input(Tail::Right, params));
        assert_eq!(fields(&result), vec!["expected", "observed[1]", "expected[1]"]);
    }

    #[test]
    fn test_goodness_of_fit_preview() {
        let params = TestParams::GoodnessOfFit(GoodnessOfFitParams {
            observed: vec![30.0, 25.0, 20.0, 25.0],
            expected: vec![25.0; 4],
        });
        let result = validate_inputs(&input(Tail::Right, params));
        assert!(result.valid);
        assert_eq!(result.derived["df"], 3.0);
        assert_abs_diff_eq!(result.derived["chi2_approx"], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_independence_ragged_rows() {
        let params = TestParams::Independence(ContingencyParams {
            rows: 2.0,
            cols: 3.0,
            observed: vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0]],
        });
        let result = validate_inputs(&input(Tail::Right, params));
        assert_eq!(fields(&result), vec!["observed[1]"]);
    }

    #[test]
    fn test_independence_empty_margin() {
        let params = TestParams::Independence(ContingencyParams {
            rows: 2.0,
            cols: 3.0,
            observed: vec![vec![4.0, 0.0, 3.0], vec![6.0, 0.0, 9.0]],
        });
        let result = validate_inputs(&input(Tail::Right, params));
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].message, "column 1 total is zero");
    }

    #[test]
    fn test_independence_preview() {
        let params = TestParams::Independence(ContingencyParams {
            rows: 2.0,
            cols: 2.0,
            observed: vec![vec![10.0, 20.0], vec![30.0, 40.0]],
        });
        let result = validate_inputs(&input(Tail::Right, params));
        assert!(result.valid);
        assert_eq!(result.derived["df"], 1.0);
        assert_eq!(result.derived["n_total"], 100.0);
    }

    #[test]
    fn test_anova_checks() {
        let group = |sd| GroupSummary {
            n: 8.0,
            mean: 3.0,
            sd,
        };
        let too_few = TestParams::Anova(AnovaParams {
            k: 2.0,
            groups: vec![group(1.0), group(1.0)],
        });
        assert_eq!(fields(&validate_inputs(&input(Tail::Right, too_few))), vec!["k"]);

        let mismatch = TestParams::Anova(AnovaParams {
            k: 3.0,
            groups: vec![group(1.0), group(0.0)],
        });
        assert_eq!(
            fields(&validate_inputs(&input(Tail::Right, mismatch))),
            vec!["groups", "groups[1].sd"]
        );

        let valid = TestParams::Anova(AnovaParams {
            k: 3.0,
            groups: vec![group(1.0); 3],
        });
        let result = validate_inputs(&input(Tail::Right, valid));
        assert_eq!(result.derived["df1"], 2.0);
        assert_eq!(result.derived["df2"], 21.0);
    }

    #[test]
    fn test_left_tail_warning_on_right_tail_tests() {
        let params = TestParams::VarianceRatio(VarianceRatioParams {
            n1: 10.0,
            sd1: 2.0,
            n2: 12.0,
            sd2: 3.0,
        });
        let result = validate_inputs(&input(Tail::Left, params));
        assert!(result.valid);
        assert!(result.badges.iter().any(|b| b.status == BadgeStatus::Warn));
        assert_eq!(result.derived["df1"], 11.0);
        assert_abs_diff_eq!(result.derived["f_approx"], 2.25, epsilon = 1e-12);
    }

    #[test]
    fn test_poisson_preview() {
        let params = TestParams::Poisson(PoissonParams {
            observed: 12.0,
            lambda0: 8.0,
        });
        let result = validate_inputs(&input(Tail::Two, params));
        assert_eq!(result.derived["expected"], 8.0);
        assert_abs_diff_eq!(result.derived["rate_ratio"], 1.5, epsilon = 1e-12);

        let bad = TestParams::Poisson(PoissonParams {
            observed: 2.5,
            lambda0: 0.0,
        });
        let result = validate_inputs(&input(Tail::Two, bad));
        assert_eq!(fields(&result), vec!["observed", "lambda0"]);
    }

    #[test]
    fn test_exact_tests_reject_oversized_counts() {
        let binom = TestParams::Binomial(OneProportionParams {
            n: 1e19,
            x: 5e18,
            p0: 0.5,
        });
        let result = validate_inputs(&input(Tail::Two, binom));
        assert!(!result.valid);
        assert_eq!(fields(&result), vec!["n"]);

        let poisson = TestParams::Poisson(PoissonParams {
            observed: 4e18,
            lambda0: 1.0,
        });
        let result = validate_inputs(&input(Tail::Two, poisson));
        assert_eq!(fields(&result), vec!["observed"]);

        let poisson = TestParams::Poisson(PoissonParams {
            observed: 12.0,
            lambda0: 1e6,
        });
        let result = validate_inputs(&input(Tail::Two, poisson));
        assert_eq!(fields(&result), vec!["lambda0"]);
    }

    #[test]
    fn test_exact_limits_follow_config() {
        let params = TestParams::Binomial(OneProportionParams {
            n: 10_000.0,
            x: 5_000.0,
            p0: 0.5,
        });
        assert!(validate_inputs(&input(Tail::Two, params.clone())).valid);

        let config = EngineConfig {
            max_exact_count: 1_000,
            ..EngineConfig::default()
        };
        let result = validate_inputs_with_config(&input(Tail::Two, params), &config);
        assert_eq!(fields(&result), vec!["n"]);
        assert_eq!(result.errors[0].message, "n must be at most 1000 for the exact test");
    }

    #[test]
    fn test_validate_json_unknown_test_type() {
        let result = validate_json(&json!({"test_type": "z_magic", "alpha": 0.05}));
        assert!(!result.valid);
        assert_eq!(fields(&result), vec!["test_type"]);
    }

    #[test]
    fn test_validate_json_top_level_fields() {
        let result = validate_json(&json!({
            "test_type": "binom", "alpha": "abc", "tail": "up",
            "params": {"n": 10}
        }));
        assert_eq!(fields(&result), vec!["alpha", "tail", "params"]);
    }

    #[test]
    fn test_validate_json_accepts_alpha_string() {
        let result = validate_json(&json!({
            "test_type": "binom", "alpha": "0.05", "tail": "right",
            "params": {"n": 20, "x": 15, "p0": 0.5}
        }));
        assert!(result.valid);
        assert_eq!(result.derived["expected"], 10.0);
    }
}
