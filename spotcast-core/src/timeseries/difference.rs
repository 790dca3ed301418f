use serde::{Deserialize, Serialize};

use crate::{AlignedTable, SpotcastError};

/// What is needed to turn differenced predictions back into levels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DifferenceState {
    columns: Vec<String>,
    last_row: Vec<f64>,
}

impl DifferenceState {
    /// Last original value of `column`.
    #[must_use]
    pub fn last_value(&self, column: &str) -> Option<f64> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| self.last_row[i])
    }

    /// Rebuild levels from consecutive differences of `column`.
    ///
    /// The first output is the last original value plus `deltas[0]`; each
    /// following output accumulates one more delta.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `column` was not differenced.
    pub fn integrate(&self, column: &str, deltas: &[f64]) -> Result<Vec<f64>, SpotcastError> {
        let start = self
            .last_value(column)
            .ok_or_else(|| SpotcastError::InvalidArg(format!("column {column} was not differenced")))?;
        Ok(deltas
            .iter()
            .scan(start, |level, d| {
                *level += d;
                Some(*level)
            })
            .collect())
    }
}

/// First differences of every column.
///
/// Row `r` of the result is `row[r + 1] - row[r]` of the input, stamped with
/// the later timestamp, so the output has one row fewer. The returned state
/// remembers the input's last row.
///
/// # Errors
/// Returns `InvalidArg` if the table has fewer than two rows.
pub fn difference(table: &AlignedTable) -> Result<(AlignedTable, DifferenceState), SpotcastError> {
    let n = table.row_count();
    if n < 2 {
        return Err(SpotcastError::InvalidArg(format!(
            "differencing needs at least 2 rows, table has {n}"
        )));
    }
    let w = table.num_columns();
    let src = table.data();
    let data: Vec<f64> = (w..src.len()).map(|i| src[i] - src[i - w]).collect();
    let diffed = AlignedTable::new(table.timestamps()[1..].to_vec(), table.columns().to_vec(), data)?;
    let state = DifferenceState {
        columns: table.columns().to_vec(),
        last_row: table.row(n - 1).to_vec(),
    };
    Ok((diffed, state))
}
