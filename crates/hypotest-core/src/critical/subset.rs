// =============================================================================
// Table Subset View
// =============================================================================
//
// A handful of rows from a bundled table around the df a test used, so a
// caller can show where its critical value came from. Up to six rows are
// taken, starting two rows before the first tabulated df at or above the
// target; a target beyond the last row shows the final five rows.
//
// =============================================================================

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{effective_alpha, require_df, round_df, table_key, CriticalParams};
use crate::error::Result;
use crate::tables::{tables, AlphaRow};
use crate::types::{alpha_label, AlphaLevel, Distribution};

const WINDOW_ROWS: usize = 6;
const ROWS_BEFORE_TARGET: usize = 2;

/// A slice of a critical-value table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSubset {
    pub distribution: Distribution,
    /// Column keys in display order.
    pub alpha_levels: Vec<String>,
    /// Column the resolver looked up.
    pub used_alpha: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_df: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_df1: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_df2: Option<u32>,
    pub rows: Vec<TableRow>,
}

/// One row of a [`TableSubset`]. The z row carries no df (df = ∞).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub df: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub df1: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub df2: Option<u32>,
    /// Alpha key → value; `None` where the table has no entry.
    pub values: BTreeMap<String, Option<f64>>,
    pub is_highlighted: bool,
}

/// Rows of the `distribution` table around the df in `params`.
///
/// The used alpha is halved for two-tailed z and t, and taken as given
/// for χ² and F.
pub fn table_subset(distribution: Distribution, params: &CriticalParams) -> Result<TableSubset> {
    let tables = tables()?;
    let alpha_levels: Vec<String> = AlphaLevel::ALL.iter().map(|l| l.key().to_string()).collect();

    let subset = match distribution {
        Distribution::Z => TableSubset {
            distribution,
            alpha_levels,
            used_alpha: alpha_label(effective_alpha(params.alpha, params.tail)),
            used_df: None,
            used_df1: None,
            used_df2: None,
            rows: vec![TableRow {
                df: None,
                df1: None,
                df2: None,
                values: row_values(Some(tables.z.row())),
                is_highlighted: true,
            }],
        },
        Distribution::T | Distribution::Chi2 => {
            let table = if distribution == Distribution::T {
                &tables.t
            } else {
                &tables.chi2
            };
            let used_alpha = if distribution == Distribution::T {
                effective_alpha(params.alpha, params.tail)
            } else {
                params.alpha
            };
            let target = table_key(round_df("df", require_df("df", params.df)?)?);
            let keys = table.df_keys();
            let rows = window(&keys, target)
                .iter()
                .map(|&df| TableRow {
                    df: Some(df),
                    df1: None,
                    df2: None,
                    values: row_values(table.row(df)),
                    is_highlighted: Some(df) == target,
                })
                .collect();
            TableSubset {
                distribution,
                alpha_levels,
                used_alpha: alpha_label(used_alpha),
                used_df: target,
                used_df1: None,
                used_df2: None,
                rows,
            }
        }
        Distribution::F => {
            let df1 = table_key(round_df("df1", require_df("df1", params.df1)?)?);
            let df2 = table_key(round_df("df2", require_df("df2", params.df2)?)?);
            let rows = match df1 {
                Some(df1) => window(&tables.f.df2_keys(df1), df2)
                    .iter()
                    .map(|&key| TableRow {
                        df: None,
                        df1: Some(df1),
                        df2: Some(key),
                        values: row_values(tables.f.row(df1, key)),
                        is_highlighted: Some(key) == df2,
                    })
                    .collect(),
                None => Vec::new(),
            };
            TableSubset {
                distribution,
                alpha_levels,
                used_alpha: alpha_label(params.alpha),
                used_df: None,
                used_df1: df1,
                used_df2: df2,
                rows,
            }
        }
    };
    Ok(subset)
}

/// Select the display window of `keys` (ascending) around `target`. A
/// missing target sits past the last key.
fn window(keys: &[u32], target: Option<u32>) -> Vec<u32> {
    let start = match target.and_then(|t| keys.iter().position(|&k| k >= t)) {
        Some(i) => i.saturating_sub(ROWS_BEFORE_TARGET),
        None => keys.len().saturating_sub(WINDOW_ROWS - 1),
    };
    let end = (start + WINDOW_ROWS).min(keys.len());
    keys[start..end].to_vec()
}

fn row_values(row: Option<&AlphaRow>) -> BTreeMap<String, Option<f64>> {
    AlphaLevel::ALL
        .iter()
        .map(|level| {
            let value = row.and_then(|r| r.get(level).copied());
            (level.key().to_string(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Tail;

    #[test]
    fn test_window_positions() {
        let keys: Vec<u32> = (1..=10).collect();
        assert_eq!(window(&keys, Some(1)), vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(window(&keys, Some(5)), vec![3, 4, 5, 6, 7, 8]);
        assert_eq!(window(&keys, Some(9)), vec![7, 8, 9, 10]);
        assert_eq!(window(&keys, Some(50)), vec![6, 7, 8, 9, 10]);
        assert_eq!(window(&keys, None), vec![6, 7, 8, 9, 10]);
        assert!(window(&[], Some(3)).is_empty());
    }

    #[test]
    fn test_t_subset_highlights_target() {
        let params = CriticalParams::new(0.05, Tail::Two).with_df(24.0);
        let subset = table_subset(Distribution::T, &params).unwrap();
        assert_eq!(subset.used_alpha, "0.025");
        assert_eq!(subset.used_df, Some(24));
        let dfs: Vec<u32> = subset.rows.iter().filter_map(|r| r.df).collect();
        assert_eq!(dfs, vec![22, 23, 24, 25, 26, 27]);
        let highlighted: Vec<_> = subset.rows.iter().filter(|r| r.is_highlighted).collect();
        assert_eq!(highlighted.len(), 1);
        assert_eq!(highlighted[0].values["0.025"], Some(2.0639));
    }

    #[test]
    fn test_chi2_subset_uses_raw_alpha() {
        let params = CriticalParams::new(0.05, Tail::Two).with_df(45.0);
        let subset = table_subset(Distribution::Chi2, &params).unwrap();
        assert_eq!(subset.used_alpha, "0.05");
        let dfs: Vec<u32> = subset.rows.iter().filter_map(|r| r.df).collect();
        assert_eq!(dfs, vec![30, 40, 50, 60, 70, 80]);
        assert!(subset.rows.iter().all(|r| !r.is_highlighted));
    }

    #[test]
    fn test_subset_past_every_table_key() {
        let params = CriticalParams::new(0.05, Tail::Right).with_df(1e10);
        let subset = table_subset(Distribution::Chi2, &params).unwrap();
        assert_eq!(subset.used_df, None);
        let dfs: Vec<u32> = subset.rows.iter().filter_map(|r| r.df).collect();
        assert_eq!(dfs, vec![60, 70, 80, 90, 100]);
        assert!(subset.rows.iter().all(|r| !r.is_highlighted));
    }

    #[test]
    fn test_z_subset_single_row() {
        let subset = table_subset(Distribution::Z, &CriticalParams::new(0.01, Tail::Two)).unwrap();
        assert_eq!(subset.used_alpha, "0.005");
        assert_eq!(subset.rows.len(), 1);
        assert!(subset.rows[0].is_highlighted && subset.rows[0].df.is_none());
        assert_eq!(subset.rows[0].values["0.10"], Some(1.2816));
    }

    #[test]
    fn test_f_subset() {
        let params = CriticalParams::new(0.05, Tail::Right).with_df_pair(3.0, 10.0);
        let subset = table_subset(Distribution::F, &params).unwrap();
        assert_eq!((subset.used_df1, subset.used_df2), (Some(3), Some(10)));
        let df2s: Vec<u32> = subset.rows.iter().filter_map(|r| r.df2).collect();
        assert_eq!(df2s, vec![8, 9, 10, 11, 12, 13]);

        let missing = CriticalParams::new(0.05, Tail::Right).with_df_pair(11.0, 10.0);
        assert!(table_subset(Distribution::F, &missing).unwrap().rows.is_empty());
    }
}
