// =============================================================================
// Bundled Critical-Value Tables
// =============================================================================
//
// Four JSON resource files ship inside the binary via `include_str!`:
//
//   data/critical_values_z.json     alpha → value
//   data/critical_values_t.json     df → alpha → value
//   data/critical_values_chi2.json  df → alpha → value
//   data/critical_values_f.json     "df1_df2" → alpha → value
//
// Alphas are upper-tail probabilities ("0.10" ... "0.005"). Values are
// rounded to 4 decimals and agree with the standard printed tables.
//
// The files are parsed on first access and kept in a process-wide
// `LazyLock`. After that the data is immutable, so any number of threads
// can read it without locking.
//
// =============================================================================

use std::collections::BTreeMap;
use std::sync::LazyLock;

use serde::Deserialize;

use crate::error::{HypotestError, Result};
use crate::types::AlphaLevel;

const Z_JSON: &str = include_str!("../data/critical_values_z.json");
const T_JSON: &str = include_str!("../data/critical_values_t.json");
const CHI2_JSON: &str = include_str!("../data/critical_values_chi2.json");
const F_JSON: &str = include_str!("../data/critical_values_f.json");

/// One table row: alpha column → critical value.
pub type AlphaRow = BTreeMap<AlphaLevel, f64>;

/// On-disk shape shared by all four files.
#[derive(Debug, Deserialize)]
struct TableFile<V> {
    distribution: String,
    values: BTreeMap<String, V>,
}

// =============================================================================
// Table Types
// =============================================================================

/// The single-row z table.
#[derive(Debug, Clone)]
pub struct ZTable {
    values: AlphaRow,
}

impl ZTable {
    pub fn get(&self, alpha: AlphaLevel) -> Option<f64> {
        self.values.get(&alpha).copied()
    }

    pub fn row(&self) -> &AlphaRow {
        &self.values
    }
}

/// A table indexed by a single integer df (t, chi2).
#[derive(Debug, Clone)]
pub struct DfTable {
    rows: BTreeMap<u32, AlphaRow>,
}

impl DfTable {
    pub fn get(&self, df: u32, alpha: AlphaLevel) -> Option<f64> {
        self.rows.get(&df).and_then(|row| row.get(&alpha).copied())
    }

    pub fn row(&self, df: u32) -> Option<&AlphaRow> {
        self.rows.get(&df)
    }

    /// Tabulated df values in ascending order.
    pub fn df_keys(&self) -> Vec<u32> {
        self.rows.keys().copied().collect()
    }

    pub fn max_df(&self) -> Option<u32> {
        self.rows.keys().next_back().copied()
    }

    /// Neighbouring tabulated keys `(lo, hi)` with `lo < df < hi`, if `df`
    /// falls strictly inside the table and is not itself a key.
    pub fn bracket(&self, df: u32) -> Option<(u32, u32)> {
        bracket(&self.df_keys(), df)
    }
}

/// The F table, indexed by `(df1, df2)`.
#[derive(Debug, Clone)]
pub struct FTable {
    rows: BTreeMap<(u32, u32), AlphaRow>,
}

impl FTable {
    pub fn get(&self, df1: u32, df2: u32, alpha: AlphaLevel) -> Option<f64> {
        self.rows.get(&(df1, df2)).and_then(|row| row.get(&alpha).copied())
    }

    pub fn row(&self, df1: u32, df2: u32) -> Option<&AlphaRow> {
        self.rows.get(&(df1, df2))
    }

    /// Tabulated df2 values for a fixed df1, ascending. Empty when df1 has
    /// no rows.
    pub fn df2_keys(&self, df1: u32) -> Vec<u32> {
        self.rows
            .range((df1, 0)..=(df1, u32::MAX))
            .map(|(&(_, df2), _)| df2)
            .collect()
    }
}

/// Neighbours `(lo, hi)` of `value` in ascending `keys`, with
/// `lo < value < hi`. `None` when `value` is a key or outside the range.
pub fn bracket(keys: &[u32], value: u32) -> Option<(u32, u32)> {
    keys.windows(2)
        .find(|w| w[0] < value && value < w[1])
        .map(|w| (w[0], w[1]))
}

/// All four bundled tables.
#[derive(Debug, Clone)]
pub struct CriticalTables {
    pub z: ZTable,
    pub t: DfTable,
    pub chi2: DfTable,
    pub f: FTable,
}

// =============================================================================
// Loading
// =============================================================================

static TABLES: LazyLock<std::result::Result<CriticalTables, String>> =
    LazyLock::new(|| load_bundled().map_err(|e| e.to_string()));

/// The bundled tables, parsed on first use.
pub fn tables() -> Result<&'static CriticalTables> {
    TABLES
        .as_ref()
        .map_err(|message| HypotestError::TableData(message.clone()))
}

fn load_bundled() -> Result<CriticalTables> {
    let tables = CriticalTables {
        z: parse_z(Z_JSON)?,
        t: parse_df_table(T_JSON, "t")?,
        chi2: parse_df_table(CHI2_JSON, "chi2")?,
        f: parse_f_table(F_JSON)?,
    };
    tracing::debug!(
        t_rows = tables.t.rows.len(),
        chi2_rows = tables.chi2.rows.len(),
        f_rows = tables.f.rows.len(),
        "loaded critical-value tables"
    );
    Ok(tables)
}

fn read_file<V: for<'de> Deserialize<'de>>(
    json: &str,
    expected: &str,
) -> Result<BTreeMap<String, V>> {
    let file: TableFile<V> = serde_json::from_str(json)?;
    if file.distribution != expected {
        return Err(HypotestError::TableData(format!(
            "expected a {expected} table, found {:?}",
            file.distribution
        )));
    }
    Ok(file.values)
}

fn parse_alpha_row(raw: BTreeMap<String, f64>, context: &str) -> Result<AlphaRow> {
    raw.into_iter()
        .map(|(key, value)| {
            AlphaLevel::from_key(&key)
                .map(|level| (level, value))
                .ok_or_else(|| {
                    HypotestError::TableData(format!("unknown alpha column {key:?} in {context}"))
                })
        })
        .collect()
}

fn parse_df(key: &str, context: &str) -> Result<u32> {
    key.parse::<u32>()
        .map_err(|_| HypotestError::TableData(format!("bad df key {key:?} in {context}")))
}

fn parse_z(json: &str) -> Result<ZTable> {
    let raw = read_file::<f64>(json, "z")?;
    Ok(ZTable {
        values: parse_alpha_row(raw, "z table")?,
    })
}

fn parse_df_table(json: &str, name: &str) -> Result<DfTable> {
    let raw = read_file::<BTreeMap<String, f64>>(json, name)?;
    let mut rows = BTreeMap::new();
    for (key, row) in raw {
        let context = format!("{name} table row {key}");
        rows.insert(parse_df(&key, &context)?, parse_alpha_row(row, &context)?);
    }
    Ok(DfTable { rows })
}

fn parse_f_table(json: &str) -> Result<FTable> {
    let raw = read_file::<BTreeMap<String, f64>>(json, "f")?;
    let mut rows = BTreeMap::new();
    for (key, row) in raw {
        let context = format!("f table row {key}");
        let (df1, df2) = key
            .split_once('_')
            .ok_or_else(|| HypotestError::TableData(format!("bad key {key:?} in f table")))?;
        rows.insert(
            (parse_df(df1, &context)?, parse_df(df2, &context)?),
            parse_alpha_row(row, &context)?,
        );
    }
    Ok(FTable { rows })
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_tables_load() {
        let t = tables().unwrap();
        assert_eq!(t.z.row().len(), 5);
        assert_eq!(t.t.df_keys().len(), 36);
        assert_eq!(t.chi2.max_df(), Some(100));
        assert_eq!(t.f.df2_keys(1).len(), 33);
    }

    #[test]
    fn test_known_textbook_values() {
        let t = tables().unwrap();
        assert_eq!(t.z.get(AlphaLevel::P025), Some(1.96));
        assert_eq!(t.t.get(24, AlphaLevel::P025), Some(2.0639));
        assert_eq!(t.chi2.get(3, AlphaLevel::P05), Some(7.8147));
        assert_eq!(t.f.get(3, 10, AlphaLevel::P05), Some(3.7083));
    }

    #[test]
    fn test_missing_rows() {
        let t = tables().unwrap();
        assert_eq!(t.t.get(35, AlphaLevel::P05), None);
        assert!(t.f.df2_keys(11).is_empty());
        assert_eq!(t.f.get(11, 10, AlphaLevel::P05), None);
    }

    #[test]
    fn test_bracket_is_strict() {
        let keys = [1, 2, 3, 30, 40, 60];
        assert_eq!(bracket(&keys, 35), Some((30, 40)));
        assert_eq!(bracket(&keys, 30), None);
        assert_eq!(bracket(&keys, 61), None);
        assert_eq!(bracket(&keys, 0), None);
    }

    #[test]
    fn test_rejects_mismatched_file() {
        let err = parse_z(T_JSON).unwrap_err();
        assert!(matches!(err, HypotestError::TableData(_)));
    }

    #[test]
    fn test_rejects_unknown_alpha_column() {
        let json = r#"{"distribution": "z", "values": {"0.2": 0.8416}}"#;
        assert!(matches!(parse_z(json), Err(HypotestError::TableData(_))));
    }
}
