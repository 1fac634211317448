// =============================================================================
// Critical-Value Resolver
// =============================================================================
//
// Finds the rejection threshold(s) for a z, t, χ² or F statistic.
//
// HOW THIS WORKS
// --------------
// Every family walks the same three tiers and stops at the first that
// answers:
//
//   1. TABLE         The (df, alpha) cell exists in the bundled table.
//   2. INTERPOLATED  df lies strictly between two tabulated rows at the same
//                    alpha column; linear interpolation in df (df2 for F,
//                    holding df1 fixed). Never extrapolates.
//   3. COMPUTED      Numeric inversion:
//                      z    −Φ⁻¹(α)
//                      t    Newton's method on the t CDF, seeded at z
//                           (df above the cutoff: the z value itself)
//                      χ²   Wilson-Hilferty cube-root approximation
//                      F    bisection on the F CDF
//
// ALPHA CONVENTION
// ----------------
// The tables hold upper-tail probabilities. For z and t a two-tailed test
// looks up α/2. χ² and F always look up α as given: their tests are
// right-tailed by construction, and the F variance test halves α itself
// before calling in.
//
// =============================================================================

mod subset;

pub use subset::{table_subset, TableRow, TableSubset};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ResolverConfig;
use crate::distributions::{f_cdf, normal_inv_cdf, t_cdf, t_pdf};
use crate::error::{HypotestError, Result};
use crate::tables::{bracket, tables};
use crate::types::{AlphaLevel, CriticalValue, Distribution, Source, Tail};

/// Doubling steps allowed while searching for an F bisection bracket.
const MAX_BRACKET_DOUBLINGS: usize = 64;

/// Below this the t density is too flat for a Newton step.
const MIN_NEWTON_SLOPE: f64 = 1e-15;

// =============================================================================
// Parameters
// =============================================================================

/// Arguments for a critical-value lookup.
///
/// `df` is used by t and χ², `df1`/`df2` by F; z uses neither.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalParams {
    pub alpha: f64,
    pub tail: Tail,
    #[serde(default)]
    pub df: Option<f64>,
    #[serde(default)]
    pub df1: Option<f64>,
    #[serde(default)]
    pub df2: Option<f64>,
}

impl CriticalParams {
    pub fn new(alpha: f64, tail: Tail) -> Self {
        Self {
            alpha,
            tail,
            df: None,
            df1: None,
            df2: None,
        }
    }

    pub fn with_df(mut self, df: f64) -> Self {
        self.df = Some(df);
        self
    }

    pub fn with_df_pair(mut self, df1: f64, df2: f64) -> Self {
        self.df1 = Some(df1);
        self.df2 = Some(df2);
        self
    }
}

// =============================================================================
// Unified Entry Point
// =============================================================================

/// Resolve the critical value(s) for `distribution` with default settings.
///
/// # Example
/// ```
/// use hypotest_core::{critical_value, CriticalParams, Distribution, Source, Tail};
///
/// let cv = critical_value(Distribution::T, &CriticalParams::new(0.05, Tail::Two).with_df(24.0)).unwrap();
/// assert_eq!(cv.right, Some(2.0639));
/// assert_eq!(cv.source, Source::Table);
/// ```
pub fn critical_value(distribution: Distribution, params: &CriticalParams) -> Result<CriticalValue> {
    critical_value_with_config(distribution, params, &ResolverConfig::default())
}

/// Resolve the critical value(s) for `distribution`.
///
/// # Errors
/// `InvalidValue` when alpha is outside (0, 1) or a required df is missing,
/// non-finite or below 1 after rounding.
pub fn critical_value_with_config(
    distribution: Distribution,
    params: &CriticalParams,
    config: &ResolverConfig,
) -> Result<CriticalValue> {
    match distribution {
        Distribution::Z => z_critical(params.alpha, params.tail),
        Distribution::T => t_critical(params.alpha, params.tail, require_df("df", params.df)?, config),
        Distribution::Chi2 => chi2_critical(params.alpha, require_df("df", params.df)?),
        Distribution::F => f_critical(
            params.alpha,
            require_df("df1", params.df1)?,
            require_df("df2", params.df2)?,
            config,
        ),
    }
}

// =============================================================================
// Per-Family Resolvers
// =============================================================================

/// z critical value(s).
pub fn z_critical(alpha: f64, tail: Tail) -> Result<CriticalValue> {
    check_alpha(alpha)?;
    let a = effective_alpha(alpha, tail);
    let table = &tables()?.z;

    if let Some(cv) = AlphaLevel::from_alpha(a).and_then(|level| table.get(level)) {
        return Ok(CriticalValue::symmetric(cv, tail, Source::Table));
    }

    debug!(distribution = "z", alpha = a, "alpha not tabulated, using inverse normal");
    Ok(CriticalValue::symmetric(-normal_inv_cdf(a), tail, Source::Computed))
}

/// t critical value(s). `df` is rounded to the nearest integer first.
pub fn t_critical(alpha: f64, tail: Tail, df: f64, config: &ResolverConfig) -> Result<CriticalValue> {
    check_alpha(alpha)?;
    let df = round_df("df", df)?;
    let a = effective_alpha(alpha, tail);
    let level = AlphaLevel::from_alpha(a).zip(table_key(df));
    let table = &tables()?.t;

    if let Some(cv) = level.and_then(|(level, key)| table.get(key, level)) {
        return Ok(CriticalValue::symmetric(cv, tail, Source::Table));
    }

    if df > config.t_normal_cutoff_df {
        debug!(distribution = "t", df, "df above cutoff, using z critical value");
        return z_critical(alpha, tail);
    }

    if let Some((level, key)) = level {
        if let Some((lo, hi)) = table.bracket(key) {
            if let (Some(y0), Some(y1)) = (table.get(lo, level), table.get(hi, level)) {
                debug!(distribution = "t", df, lo, hi, "interpolating between table rows");
                let cv = lerp(df, f64::from(lo), f64::from(hi), y0, y1);
                return Ok(CriticalValue::symmetric(cv, tail, Source::Interpolated));
            }
        }
    }

    debug!(distribution = "t", df, alpha = a, "no table coverage, inverting t CDF");
    let cv = invert_t(a, df, config);
    Ok(CriticalValue::symmetric(cv, tail, Source::Computed))
}

/// χ² critical value (right bound only). Uses `alpha` as given.
pub fn chi2_critical(alpha: f64, df: f64) -> Result<CriticalValue> {
    check_alpha(alpha)?;
    let df = round_df("df", df)?;
    let level = AlphaLevel::from_alpha(alpha);
    let table = &tables()?.chi2;

    if let Some((level, key)) = level.zip(table_key(df)) {
        if let Some(cv) = table.get(key, level) {
            return Ok(CriticalValue::right_only(cv, Source::Table));
        }
        if let Some((lo, hi)) = table.bracket(key) {
            if let (Some(y0), Some(y1)) = (table.get(lo, level), table.get(hi, level)) {
                debug!(distribution = "chi2", df, lo, hi, "interpolating between table rows");
                let cv = lerp(df, f64::from(lo), f64::from(hi), y0, y1);
                return Ok(CriticalValue::right_only(cv, Source::Interpolated));
            }
        }
    }

    debug!(distribution = "chi2", df, alpha, "no table coverage, using Wilson-Hilferty");
    Ok(CriticalValue::right_only(wilson_hilferty(alpha, df), Source::Computed))
}

/// F critical value (right bound only). Uses `alpha` as given.
pub fn f_critical(alpha: f64, df1: f64, df2: f64, config: &ResolverConfig) -> Result<CriticalValue> {
    check_alpha(alpha)?;
    let df1 = round_df("df1", df1)?;
    let df2 = round_df("df2", df2)?;
    let level = AlphaLevel::from_alpha(alpha);
    let table = &tables()?.f;
    let keys = table_key(df1).zip(table_key(df2));

    if let Some((level, (key1, key2))) = level.zip(keys) {
        if let Some(cv) = table.get(key1, key2, level) {
            return Ok(CriticalValue::right_only(cv, Source::Table));
        }
        let df2_keys = table.df2_keys(key1);
        if let Some((lo, hi)) = bracket(&df2_keys, key2) {
            if let (Some(y0), Some(y1)) = (table.get(key1, lo, level), table.get(key1, hi, level)) {
                debug!(distribution = "f", df1, df2, lo, hi, "interpolating between table rows");
                let cv = lerp(df2, f64::from(lo), f64::from(hi), y0, y1);
                return Ok(CriticalValue::right_only(cv, Source::Interpolated));
            }
        }
    }

    debug!(distribution = "f", df1, df2, alpha, "no table coverage, bisecting F CDF");
    let cv = invert_f(alpha, df1, df2, config);
    Ok(CriticalValue::right_only(cv, Source::Computed))
}

// =============================================================================
// Computed Tier
// =============================================================================

/// Upper-tail quantile of t: the `cv` with P(T > cv) = `a`.
fn invert_t(a: f64, df: f64, config: &ResolverConfig) -> f64 {
    let mut cv = -normal_inv_cdf(a);
    let mut converged = false;

    for _ in 0..config.newton_max_iterations {
        let upper = 1.0 - t_cdf(cv, df);
        let slope = t_pdf(cv, df);
        if slope.abs() < MIN_NEWTON_SLOPE {
            break;
        }
        let delta = (upper - a) / slope;
        cv += delta;
        if delta.abs() < config.newton_tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(df, alpha = a, cv, "t quantile Newton iteration stopped before tolerance");
    }
    cv.abs()
}

/// Wilson-Hilferty: χ²_α ≈ df·(1 − 2/(9df) + z_α·√(2/(9df)))³.
fn wilson_hilferty(alpha: f64, df: f64) -> f64 {
    let z = -normal_inv_cdf(alpha);
    let c = 2.0 / (9.0 * df);
    df * (1.0 - c + z * c.sqrt()).powi(3)
}

/// Upper-tail quantile of F by bisection on the CDF.
fn invert_f(alpha: f64, df1: f64, df2: f64, config: &ResolverConfig) -> f64 {
    let target = 1.0 - alpha;
    let mut lo = 0.0;
    let mut hi = config.bisection_initial_upper;

    let mut doublings = 0;
    while f_cdf(hi, df1, df2) < target && doublings < MAX_BRACKET_DOUBLINGS {
        hi *= 2.0;
        doublings += 1;
    }

    let mut converged = false;
    for _ in 0..config.bisection_max_iterations {
        let mid = 0.5 * (lo + hi);
        if f_cdf(mid, df1, df2) < target {
            lo = mid;
        } else {
            hi = mid;
        }
        if hi - lo < config.bisection_tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(df1, df2, alpha, width = hi - lo, "F quantile bisection stopped before tolerance");
    }
    0.5 * (lo + hi)
}

// =============================================================================
// Helpers
// =============================================================================

/// Table lookup alpha: halved for two-tailed symmetric tests.
pub(crate) fn effective_alpha(alpha: f64, tail: Tail) -> f64 {
    match tail {
        Tail::Two => alpha / 2.0,
        Tail::Right | Tail::Left => alpha,
    }
}

fn lerp(x: f64, x0: f64, x1: f64, y0: f64, y1: f64) -> f64 {
    if x1 == x0 {
        return y0;
    }
    y0 + (y1 - y0) * (x - x0) / (x1 - x0)
}

fn check_alpha(alpha: f64) -> Result<()> {
    if alpha.is_finite() && alpha > 0.0 && alpha < 1.0 {
        Ok(())
    } else {
        Err(HypotestError::InvalidValue(format!(
            "alpha must lie strictly between 0 and 1, got {alpha}"
        )))
    }
}

pub(crate) fn require_df(name: &str, df: Option<f64>) -> Result<f64> {
    df.ok_or_else(|| HypotestError::InvalidValue(format!("{name} is required")))
}

/// Round a df to the nearest integer, which is what every tier works with.
pub(crate) fn round_df(name: &str, df: f64) -> Result<f64> {
    if !df.is_finite() {
        return Err(HypotestError::InvalidValue(format!("{name} must be finite, got {df}")));
    }
    let rounded = df.round();
    if rounded < 1.0 {
        return Err(HypotestError::InvalidValue(format!(
            "{name} must be at least 1, got {df}"
        )));
    }
    Ok(rounded)
}

/// Table key of a rounded df, or `None` past anything a table could hold.
pub(crate) fn table_key(df: f64) -> Option<u32> {
    (df <= f64::from(u32::MAX)).then_some(df as u32)
}

// =============================================================================
// Tests
// =============================================================================
