// =============================================================================
// Test Inputs
// =============================================================================
//
// A request to run a test is `{ test_type, alpha, tail, params }` on the
// wire. In Rust the test type and its parameters travel together as one
// `TestParams` variant, so a parameter record can never be paired with the
// wrong procedure.
//
// All numeric parameters are f64, including counts and sample sizes: JSON
// callers send plain numbers and the validator is the one place that
// decides whether a value is an acceptable integer.
//
// =============================================================================

use serde::de::Error as _;
use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{HypotestError, Result};
use crate::types::{Tail, TestType};

// =============================================================================
// Parameter Records
// =============================================================================

/// One-sample t test: summary of a single sample against `mu0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneSampleParams {
    pub n: f64,
    pub mean: f64,
    pub sd: f64,
    pub mu0: f64,
}

/// Paired t test: summary of the within-pair differences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairedParams {
    pub n: f64,
    pub d_bar: f64,
    pub sd_d: f64,
}

/// Two independent sample summaries (Welch and pooled t tests).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoSampleParams {
    pub n1: f64,
    pub mean1: f64,
    pub sd1: f64,
    pub n2: f64,
    pub mean2: f64,
    pub sd2: f64,
}

/// `x` successes out of `n` trials against the null proportion `p0`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OneProportionParams {
    pub n: f64,
    pub x: f64,
    pub p0: f64,
}

/// Successes and trials for two independent groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TwoProportionParams {
    pub n1: f64,
    pub x1: f64,
    pub n2: f64,
    pub x2: f64,
}

/// Observed and expected category counts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodnessOfFitParams {
    pub observed: Vec<f64>,
    pub expected: Vec<f64>,
}

/// An r×c table of observed counts, row-major.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContingencyParams {
    pub rows: f64,
    pub cols: f64,
    pub observed: Vec<Vec<f64>>,
}

/// Two sample standard deviations for the variance-ratio test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceRatioParams {
    pub n1: f64,
    pub sd1: f64,
    pub n2: f64,
    pub sd2: f64,
}

/// Summary of one ANOVA group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSummary {
    pub n: f64,
    pub mean: f64,
    pub sd: f64,
}

/// One-way ANOVA from `k` group summaries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnovaParams {
    pub k: f64,
    pub groups: Vec<GroupSummary>,
}

/// Observed count against a Poisson rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoissonParams {
    pub observed: f64,
    pub lambda0: f64,
}

// =============================================================================
// TestParams
// =============================================================================

/// Test-specific parameters, one variant per test type.
///
/// Serializes as the bare parameter record; the test type is written
/// alongside it by [`TestInput`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TestParams {
    OneSample(OneSampleParams),
    Paired(PairedParams),
    Welch(TwoSampleParams),
    EqualVariance(TwoSampleParams),
    OneProportion(OneProportionParams),
    TwoProportion(TwoProportionParams),
    GoodnessOfFit(GoodnessOfFitParams),
    Independence(ContingencyParams),
    VarianceRatio(VarianceRatioParams),
    Anova(AnovaParams),
    /// Exact binomial test; same fields as the one-proportion z test.
    Binomial(OneProportionParams),
    Poisson(PoissonParams),
}

impl TestParams {
    pub fn test_type(&self) -> TestType {
        match self {
            TestParams::OneSample(_) => TestType::TOneSample,
            TestParams::Paired(_) => TestType::TPaired,
            TestParams::Welch(_) => TestType::TWelch,
            TestParams::EqualVariance(_) => TestType::TEqualVar,
            TestParams::OneProportion(_) => TestType::Prop1,
            TestParams::TwoProportion(_) => TestType::Prop2,
            TestParams::GoodnessOfFit(_) => TestType::Chi2Gof,
            TestParams::Independence(_) => TestType::Chi2Indep,
            TestParams::VarianceRatio(_) => TestType::FEqVar,
            TestParams::Anova(_) => TestType::AnovaOneway,
            TestParams::Binomial(_) => TestType::Binom,
            TestParams::Poisson(_) => TestType::Poisson,
        }
    }

    /// Decode the JSON parameter record for `test_type`.
    pub fn from_value(test_type: TestType, value: serde_json::Value) -> Result<Self> {
        let params = match test_type {
            TestType::TOneSample => TestParams::OneSample(serde_json::from_value(value)?),
            TestType::TPaired => TestParams::Paired(serde_json::from_value(value)?),
            TestType::TWelch => TestParams::Welch(serde_json::from_value(value)?),
            TestType::TEqualVar => TestParams::EqualVariance(serde_json::from_value(value)?),
            TestType::Prop1 => TestParams::OneProportion(serde_json::from_value(value)?),
            TestType::Prop2 => TestParams::TwoProportion(serde_json::from_value(value)?),
            TestType::Chi2Gof => TestParams::GoodnessOfFit(serde_json::from_value(value)?),
            TestType::Chi2Indep => TestParams::Independence(serde_json::from_value(value)?),
            TestType::FEqVar => TestParams::VarianceRatio(serde_json::from_value(value)?),
            TestType::AnovaOneway => TestParams::Anova(serde_json::from_value(value)?),
            TestType::Binom => TestParams::Binomial(serde_json::from_value(value)?),
            TestType::Poisson => TestParams::Poisson(serde_json::from_value(value)?),
        };
        Ok(params)
    }
}

// =============================================================================
// TestInput
// =============================================================================

/// A complete request: significance level, tail and test parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct TestInput {
    pub alpha: f64,
    pub tail: Tail,
    pub params: TestParams,
}

impl TestInput {
    pub fn new(alpha: f64, tail: Tail, params: TestParams) -> Self {
        Self {
            alpha,
            tail,
            params,
        }
    }

    pub fn test_type(&self) -> TestType {
        self.params.test_type()
    }

    /// Parse a `{test_type, alpha, tail, params}` JSON document.
    ///
    /// # Errors
    /// `UnknownTestType` when `test_type` names no known test, `Json` for
    /// any other malformed input.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Like [`TestInput::from_json`], for an already-parsed document.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        if let Some(name) = value.get("test_type").and_then(|t| t.as_str()) {
            name.parse::<TestType>()?;
        }
        let wire: WireInput = serde_json::from_value(value)?;
        wire.try_into()
    }
}

/// Wire shape of a request.
#[derive(Deserialize)]
struct WireInput {
    test_type: TestType,
    alpha: f64,
    tail: Tail,
    params: serde_json::Value,
}

impl TryFrom<WireInput> for TestInput {
    type Error = HypotestError;

    fn try_from(wire: WireInput) -> Result<Self> {
        Ok(TestInput {
            alpha: wire.alpha,
            tail: wire.tail,
            params: TestParams::from_value(wire.test_type, wire.params)?,
        })
    }
}

impl Serialize for TestInput {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("TestInput", 4)?;
        state.serialize_field("test_type", &self.test_type())?;
        state.serialize_field("alpha", &self.alpha)?;
        state.serialize_field("tail", &self.tail)?;
        state.serialize_field("params", &self.params)?;
        state.end()
    }
}

impl<'de> Deserialize<'de> for TestInput {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let wire = WireInput::deserialize(deserializer)?;
        TestInput::try_from(wire).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_one_sample() {
        let input = TestInput::from_json(
            r#"{"test_type": "t_1sample", "alpha": 0.05, "tail": "two",
                "params": {"n": 25, "mean": 52, "sd": 5, "mu0": 50}}"#,
        )
        .unwrap();
        assert_eq!(input.test_type(), TestType::TOneSample);
        assert_eq!(input.tail, Tail::Two);
        assert_eq!(
            input.params,
            TestParams::OneSample(OneSampleParams {
                n: 25.0,
                mean: 52.0,
                sd: 5.0,
                mu0: 50.0
            })
        );
    }

    #[test]
    fn test_unknown_test_type() {
        let err = TestInput::from_json(
            r#"{"test_type": "z_magic", "alpha": 0.05, "tail": "two", "params": {}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, HypotestError::UnknownTestType(name) if name == "z_magic"));
    }

    #[test]
    fn test_wrong_param_shape_is_json_error() {
        let err = TestInput::from_value(json!({
            "test_type": "chi2_gof", "alpha": 0.05, "tail": "right",
            "params": {"observed": [1, 2]}
        }))
        .unwrap_err();
        assert!(matches!(err, HypotestError::Json(_)));
    }

    #[test]
    fn test_serializes_wire_shape() {
        let input = TestInput::new(
            0.01,
            Tail::Right,
            TestParams::Poisson(PoissonParams {
                observed: 12.0,
                lambda0: 6.0,
            }),
        );
        let value = serde_json::to_value(&input).unwrap();
        assert_eq!(
            value,
            json!({
                "test_type": "poisson", "alpha": 0.01, "tail": "right",
                "params": {"observed": 12.0, "lambda0": 6.0}
            })
        );
        let back: TestInput = serde_json::from_value(value).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn test_binomial_and_prop1_share_fields() {
        let fields = json!({"n": 20, "x": 15, "p0": 0.5});
        let binom = TestParams::from_value(TestType::Binom, fields.clone()).unwrap();
        let prop = TestParams::from_value(TestType::Prop1, fields).unwrap();
        assert_eq!(binom.test_type(), TestType::Binom);
        assert_eq!(prop.test_type(), TestType::Prop1);
    }
}
