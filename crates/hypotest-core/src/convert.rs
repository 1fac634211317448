// =============================================================================
// Nested Vec → ndarray Conversion
// =============================================================================
//
// JSON callers send contingency tables as arrays of rows. The χ² tests work
// on an `Array2<f64>` so margins come from `sum_axis` rather than hand-written
// loops; this module is the single place that shape-checks the nested input
// and builds the grid.
//
// =============================================================================

use ndarray::{Array1, Array2, Axis};

use crate::error::{HypotestError, Result};

/// Convert row-major nested rows into an `Array2`.
///
/// # Errors
/// `EmptyInput` for no rows or empty rows, `DimensionMismatch` when the
/// rows are ragged.
pub fn to_array2(rows: &[Vec<f64>]) -> Result<Array2<f64>> {
    let nrows = rows.len();
    let ncols = rows.first().map_or(0, Vec::len);
    if nrows == 0 || ncols == 0 {
        return Err(HypotestError::EmptyInput("table has no cells".to_string()));
    }
    if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != ncols) {
        return Err(HypotestError::DimensionMismatch(format!(
            "row {i} has {} columns, expected {ncols}",
            row.len()
        )));
    }

    let flat: Vec<f64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((nrows, ncols), flat)
        .map_err(|e| HypotestError::DimensionMismatch(e.to_string()))
}

/// Row and column totals of a grid.
pub fn margins(grid: &Array2<f64>) -> (Array1<f64>, Array1<f64>) {
    (grid.sum_axis(Axis(1)), grid.sum_axis(Axis(0)))
}

/// Expected counts under independence: E_ij = R_i·C_j / N.
pub fn expected_counts(grid: &Array2<f64>) -> Array2<f64> {
    let (row_sums, col_sums) = margins(grid);
    let total = grid.sum();
    Array2::from_shape_fn(grid.dim(), |(i, j)| row_sums[i] * col_sums[j] / total)
}
