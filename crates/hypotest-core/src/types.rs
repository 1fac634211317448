// =============================================================================
// Shared Types
// =============================================================================
//
// The vocabulary every other module speaks: which test, which tail, which
// distribution, where a critical value came from, and the standardized
// result record produced by every test procedure.
//
// All enums serialize with the spellings a JSON caller sends and expects
// back (`t_1sample`, `two`, `fail_to_reject`, `chi2`, ...).
//
// =============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::HypotestError;

// =============================================================================
// Test Types
// =============================================================================

/// The twelve supported hypothesis test procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TestType {
    /// One-sample t test on a mean.
    #[serde(rename = "t_1sample")]
    TOneSample,
    /// Paired t test on mean differences.
    #[serde(rename = "t_paired")]
    TPaired,
    /// Welch's unequal-variance two-sample t test.
    #[serde(rename = "t_welch")]
    TWelch,
    /// Student's pooled-variance two-sample t test.
    #[serde(rename = "t_equal_var")]
    TEqualVar,
    /// One-proportion z test.
    #[serde(rename = "prop_1")]
    Prop1,
    /// Two-proportion z test with pooled proportion.
    #[serde(rename = "prop_2")]
    Prop2,
    /// Chi-squared goodness-of-fit test.
    #[serde(rename = "chi2_gof")]
    Chi2Gof,
    /// Chi-squared test of independence on an r×c table.
    #[serde(rename = "chi2_indep")]
    Chi2Indep,
    /// F test for equality of two variances.
    #[serde(rename = "f_eqvar")]
    FEqVar,
    /// One-way ANOVA from group summaries.
    #[serde(rename = "anova_oneway")]
    AnovaOneway,
    /// Exact binomial test.
    #[serde(rename = "binom")]
    Binom,
    /// Exact Poisson test.
    #[serde(rename = "poisson")]
    Poisson,
}

impl TestType {
    pub const ALL: [TestType; 12] = [
        TestType::TOneSample,
        TestType::TPaired,
        TestType::TWelch,
        TestType::TEqualVar,
        TestType::Prop1,
        TestType::Prop2,
        TestType::Chi2Gof,
        TestType::Chi2Indep,
        TestType::FEqVar,
        TestType::AnovaOneway,
        TestType::Binom,
        TestType::Poisson,
    ];

    /// Wire name of the test (`"t_1sample"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            TestType::TOneSample => "t_1sample",
            TestType::TPaired => "t_paired",
            TestType::TWelch => "t_welch",
            TestType::TEqualVar => "t_equal_var",
            TestType::Prop1 => "prop_1",
            TestType::Prop2 => "prop_2",
            TestType::Chi2Gof => "chi2_gof",
            TestType::Chi2Indep => "chi2_indep",
            TestType::FEqVar => "f_eqvar",
            TestType::AnovaOneway => "anova_oneway",
            TestType::Binom => "binom",
            TestType::Poisson => "poisson",
        }
    }

    /// χ², F and ANOVA statistics are non-negative and always judged in
    /// the right tail, whatever tail the caller selected.
    pub fn is_right_tail_only(&self) -> bool {
        matches!(
            self,
            TestType::Chi2Gof | TestType::Chi2Indep | TestType::FEqVar | TestType::AnovaOneway
        )
    }
}

impl fmt::Display for TestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TestType {
    type Err = HypotestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TestType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| HypotestError::UnknownTestType(s.to_string()))
    }
}

// =============================================================================
// Tail, Decision, Source
// =============================================================================

/// Which side(s) of the distribution form the rejection region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tail {
    Two,
    Right,
    Left,
}

impl Tail {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tail::Two => "two",
            Tail::Right => "right",
            Tail::Left => "left",
        }
    }
}

impl FromStr for Tail {
    type Err = HypotestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "two" => Ok(Tail::Two),
            "right" => Ok(Tail::Right),
            "left" => Ok(Tail::Left),
            other => Err(HypotestError::InvalidValue(format!(
                "tail must be one of two, right, left (got {other:?})"
            ))),
        }
    }
}

/// Outcome of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Reject,
    FailToReject,
}

impl Decision {
    /// Human-readable sentence for display next to the result.
    pub fn text(&self) -> &'static str {
        match self {
            Decision::Reject => "Reject the null hypothesis in favor of the alternative.",
            Decision::FailToReject => "Fail to reject the null hypothesis.",
        }
    }
}

/// Where a critical value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Read directly from a bundled table.
    Table,
    /// Linear interpolation between two bundled table rows.
    Interpolated,
    /// Computed numerically (inverse CDF, Newton, bisection, Wilson-Hilferty).
    Computed,
    /// Exact test; there is no critical value, the p-value decides.
    Exact,
}

// =============================================================================
// Distributions and Alpha Levels
// =============================================================================

/// Reference distributions that have critical-value tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Distribution {
    #[serde(rename = "z")]
    Z,
    #[serde(rename = "t")]
    T,
    #[serde(rename = "chi2")]
    Chi2,
    #[serde(rename = "f")]
    F,
}

impl Distribution {
    pub fn as_str(&self) -> &'static str {
        match self {
            Distribution::Z => "z",
            Distribution::T => "t",
            Distribution::Chi2 => "chi2",
            Distribution::F => "f",
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Distribution {
    type Err = HypotestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "z" => Ok(Distribution::Z),
            "t" => Ok(Distribution::T),
            "chi2" => Ok(Distribution::Chi2),
            "f" => Ok(Distribution::F),
            other => Err(HypotestError::UnknownDistribution(other.to_string())),
        }
    }
}

/// Upper-tail probabilities that have a column in the bundled tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AlphaLevel {
    P005,
    P01,
    P025,
    P05,
    P10,
}

impl AlphaLevel {
    /// Table columns in display order.
    pub const ALL: [AlphaLevel; 5] = [
        AlphaLevel::P10,
        AlphaLevel::P05,
        AlphaLevel::P025,
        AlphaLevel::P01,
        AlphaLevel::P005,
    ];

    /// Column key used in the table files.
    pub fn key(&self) -> &'static str {
        match self {
            AlphaLevel::P10 => "0.10",
            AlphaLevel::P05 => "0.05",
            AlphaLevel::P025 => "0.025",
            AlphaLevel::P01 => "0.01",
            AlphaLevel::P005 => "0.005",
        }
    }

    pub fn value(&self) -> f64 {
        match self {
            AlphaLevel::P10 => 0.10,
            AlphaLevel::P05 => 0.05,
            AlphaLevel::P025 => 0.025,
            AlphaLevel::P01 => 0.01,
            AlphaLevel::P005 => 0.005,
        }
    }

    /// Map an alpha to its table column, if it has one.
    pub fn from_alpha(alpha: f64) -> Option<Self> {
        AlphaLevel::ALL
            .into_iter()
            .find(|level| (level.value() - alpha).abs() < 1e-9)
    }

    pub fn from_key(key: &str) -> Option<Self> {
        AlphaLevel::ALL.into_iter().find(|level| level.key() == key)
    }
}

/// Display key for an alpha: the table column name when there is one.
pub fn alpha_label(alpha: f64) -> String {
    match AlphaLevel::from_alpha(alpha) {
        Some(level) => level.key().to_string(),
        None => alpha.to_string(),
    }
}

// =============================================================================
// Degrees of Freedom
// =============================================================================

/// Degrees of freedom attached to a statistic.
///
/// Serialized untagged: `{}`, `{"v": 24}` or `{"df1": 2, "df2": 27}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DegreesOfFreedom {
    Pair { df1: f64, df2: f64 },
    Single { v: f64 },
    NotApplicable {},
}

impl DegreesOfFreedom {
    pub fn single(&self) -> Option<f64> {
        match self {
            DegreesOfFreedom::Single { v } => Some(*v),
            _ => None,
        }
    }

    pub fn pair(&self) -> Option<(f64, f64)> {
        match self {
            DegreesOfFreedom::Pair { df1, df2 } => Some((*df1, *df2)),
            _ => None,
        }
    }
}

// =============================================================================
// Critical Values
// =============================================================================

/// Rejection bounds for a test statistic.
///
/// Two-tailed symmetric tests set both bounds (`left = −right`). Right-tailed
/// tests, and every χ² / F test, set only `right`. Left-tailed symmetric
/// tests set only `left`, stored as a negative number.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalValue {
    pub left: Option<f64>,
    pub right: Option<f64>,
    pub source: Source,
}

impl CriticalValue {
    /// Bounds for a distribution symmetric about zero (z, t).
    pub fn symmetric(cv: f64, tail: Tail, source: Source) -> Self {
        let cv = cv.abs();
        match tail {
            Tail::Two => Self {
                left: Some(-cv),
                right: Some(cv),
                source,
            },
            Tail::Right => Self {
                left: None,
                right: Some(cv),
                source,
            },
            Tail::Left => Self {
                left: Some(-cv),
                right: None,
                source,
            },
        }
    }

    /// Upper bound only (χ², F).
    pub fn right_only(cv: f64, source: Source) -> Self {
        Self {
            left: None,
            right: Some(cv),
            source,
        }
    }

    /// No bounds; used by the exact tests.
    pub fn exact() -> Self {
        Self {
            left: None,
            right: None,
            source: Source::Exact,
        }
    }

    /// Copy with both bounds rounded for reporting.
    pub fn rounded(&self) -> Self {
        Self {
            left: self.left.map(round4),
            right: self.right.map(round4),
            source: self.source,
        }
    }
}

// =============================================================================
// Test Result
// =============================================================================

/// The test statistic as reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Statistic {
    /// Display name: `t`, `z`, `χ²`, `F` or `x`.
    pub name: String,
    pub value: f64,
    pub df: DegreesOfFreedom,
}

/// Standardized record produced by every test procedure.
///
/// Every number in here has been rounded to 4 decimals; intermediate
/// computation happened at full precision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_type: TestType,
    pub decision: Decision,
    pub decision_text: String,
    pub stat: Statistic,
    pub critical: CriticalValue,
    pub p_value: Option<f64>,
    /// Derived quantities (effect size, standard error, pooled SD, ...).
    pub meta: BTreeMap<String, f64>,
    pub notes: Vec<String>,
}

/// Round to 4 decimal places, halves away from zero.
pub fn round4(v: f64) -> f64 {
    (v * 10_000.0).round() / 10_000.0
}
