// =============================================================================
// Engine Configuration
// =============================================================================
//
// Numeric knobs for the critical-value resolver and the test engine. The
// defaults reproduce the behaviour of the bundled tables and the textbook
// procedures; there is rarely a reason to change them outside of tests.
//
// =============================================================================

use serde::{Deserialize, Serialize};

/// Iteration limits and tolerances for the computed tier of the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Maximum Newton steps when inverting the t CDF.
    /// Default: 20
    pub newton_max_iterations: usize,

    /// Newton stops once a step moves the estimate by less than this.
    /// Default: 1e-10
    pub newton_tolerance: f64,

    /// Maximum bisection steps when inverting the F CDF.
    /// Default: 100
    pub bisection_max_iterations: usize,

    /// Bisection stops once the bracket is narrower than this.
    /// Default: 1e-8
    pub bisection_tolerance: f64,

    /// Starting upper bracket for F bisection; doubled until it covers the
    /// target probability.
    /// Default: 100.0
    pub bisection_initial_upper: f64,

    /// Above this many degrees of freedom the t critical value is replaced
    /// by the z critical value.
    /// Default: 120.0
    pub t_normal_cutoff_df: f64,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            newton_max_iterations: 20,
            newton_tolerance: 1e-10,
            bisection_max_iterations: 100,
            bisection_tolerance: 1e-8,
            bisection_initial_upper: 100.0,
            t_normal_cutoff_df: 120.0,
        }
    }
}

/// Settings for the hypothesis-test engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub resolver: ResolverConfig,

    /// Outcomes whose probability is within this of the observed outcome's
    /// probability count as "as extreme" in the two-sided exact tests.
    /// Default: 1e-12
    pub exact_tie_tolerance: f64,

    /// Minimum upper bound of the k range summed by the two-sided Poisson
    /// test.
    /// Default: 50
    pub poisson_min_support: u64,

    /// Largest `n` of the binomial test and largest observed count of the
    /// Poisson test the validator accepts. Every binomial and Poisson CDF
    /// evaluated under this bound converges within the continued-fraction
    /// iteration cap.
    /// Default: 10_000
    pub max_exact_count: u64,

    /// Largest `lambda0` the validator accepts for the Poisson test, under
    /// the same convergence bound.
    /// Default: 500.0
    pub max_poisson_rate: f64,

    /// Expected counts below this trigger an approximation warning.
    /// Default: 5.0
    pub min_expected_count: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            exact_tie_tolerance: 1e-12,
            poisson_min_support: 50,
            max_exact_count: 10_000,
            max_poisson_rate: 500.0,
            min_expected_count: 5.0,
        }
    }
}
