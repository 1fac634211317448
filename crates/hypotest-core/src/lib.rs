// =============================================================================
// Hypotest Core Library
// =============================================================================
//
// Classical hypothesis tests from summary statistics, in pure Rust: the
// special functions, the distributions built on them, critical values from
// bundled tables, and twelve test procedures that turn a request into a
// decision.
//
// STRUCTURE:
// ----------
// Leaf modules first; each layer only calls the ones above it:
//
//   - special:        ln Γ, regularized incomplete beta and gamma
//   - distributions:  normal, t, χ², F densities and CDFs; binomial, Poisson
//   - tables:         bundled critical-value tables, parsed once
//   - critical:       table → interpolated → computed critical values,
//                     plus the table-subset view
//   - procedures:     the twelve tests, `run_test`, `simulate`, `run_batch`
//   - validation:     field-level checks and live previews
//   - steps:          worked solutions in LaTeX
//
// Supporting modules: `types` (shared enums and the result record), `input`
// (requests), `config`, `convert` (nested rows → ndarray), `error`.
//
// CONCURRENCY:
// ------------
// Everything is a pure function of its arguments. The tables are the only
// shared state and are immutable after first use, so every entry point can
// be called from any number of threads at once.
//
// FOR MAINTAINERS:
// ----------------
// When adding a test:
//   1. Add the variant to `TestType` and its parameter record to `TestParams`
//   2. Write the procedure in the matching `procedures` submodule
//   3. Add its checks to `validation` and its worked steps to `steps`
//   4. Re-export anything public here
//
// =============================================================================

pub mod config;
pub mod convert;
pub mod critical;
pub mod distributions;
pub mod error;
pub mod input;
pub mod procedures;
pub mod special;
pub mod steps;
pub mod tables;
pub mod types;
pub mod validation;

// Re-export the everyday API so callers can write `hypotest_core::run_test`
pub use config::{EngineConfig, ResolverConfig};
pub use critical::{
    critical_value, critical_value_with_config, table_subset, CriticalParams, TableRow,
    TableSubset,
};
pub use error::{FieldError, HypotestError, Result};
pub use input::{TestInput, TestParams};
pub use procedures::{
    run_batch, run_batch_with_config, run_test, run_test_with_config, simulate,
    simulate_with_config, Simulation,
};
pub use steps::{calculation_steps, calculation_steps_with_config, CalculationSteps, Step};
pub use types::{
    AlphaLevel, CriticalValue, Decision, DegreesOfFreedom, Distribution, Source, Statistic, Tail,
    TestResult, TestType,
};
pub use validation::{
    validate_inputs, validate_inputs_with_config, validate_json, validate_json_with_config,
    Badge, BadgeStatus, ValidationResult,
};
