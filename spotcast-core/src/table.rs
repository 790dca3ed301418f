use std::collections::HashSet;
use std::ops::Range;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::SpotcastError;
use crate::series::iso_hour;

/// A wide table of aligned hourly rows.
///
/// Values are stored row-major: row `r` occupies
/// `data[r * num_columns .. (r + 1) * num_columns]`. Every cell is present
/// (no `NaN`), timestamps strictly increase, and column names are unique.
/// The only way to obtain a table is through [`AlignedTable::new`] or one of
/// the stages built on it, so these invariants always hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable")]
pub struct AlignedTable {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<String>,
    data: Vec<f64>,
}

#[derive(Deserialize)]
struct RawTable {
    timestamps: Vec<DateTime<Utc>>,
    columns: Vec<String>,
    data: Vec<f64>,
}

impl TryFrom<RawTable> for AlignedTable {
    type Error = SpotcastError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Self::new(raw.timestamps, raw.columns, raw.data)
    }
}

impl AlignedTable {
    /// Build a table, validating every invariant.
    ///
    /// # Errors
    /// - `InvalidArg` if `data` is not `timestamps.len() * columns.len()` long.
    /// - `DuplicateColumn` for repeated column names.
    /// - `UnorderedTimestamps` if timestamps do not strictly increase.
    /// - `AlignmentGap` for the first `NaN` cell.
    pub fn new(
        timestamps: Vec<DateTime<Utc>>,
        columns: Vec<String>,
        data: Vec<f64>,
    ) -> Result<Self, SpotcastError> {
        let width = columns.len();
        if data.len() != timestamps.len() * width {
            return Err(SpotcastError::InvalidArg(format!(
                "table data has {} cells, expected {} rows x {width} columns",
                data.len(),
                timestamps.len()
            )));
        }
        let mut seen = HashSet::with_capacity(width);
        for c in &columns {
            if !seen.insert(c.as_str()) {
                return Err(SpotcastError::DuplicateColumn { column: c.clone() });
            }
        }
        if let Some(row) = timestamps.windows(2).position(|w| w[1] <= w[0]) {
            return Err(SpotcastError::UnorderedTimestamps {
                series: "aligned table".into(),
                row: row + 1,
            });
        }
        if let Some(cell) = data.iter().position(|v| v.is_nan()) {
            let row = cell / width;
            return Err(SpotcastError::AlignmentGap {
                column: columns[cell % width].clone(),
                row,
                timestamp: iso_hour(timestamps[row]),
            });
        }
        Ok(Self {
            timestamps,
            columns,
            data,
        })
    }

    /// Number of rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.timestamps.len()
    }

    /// Number of value columns.
    #[must_use]
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// True when the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Row timestamps, strictly increasing.
    #[must_use]
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// Column names in table order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row-major cell storage.
    #[must_use]
    pub fn data(&self) -> &[f64] {
        &self.data
    }

    /// Position of a column by name.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one row.
    ///
    /// # Panics
    /// Panics if `row >= row_count()`.
    #[must_use]
    pub fn row(&self, row: usize) -> &[f64] {
        let w = self.num_columns();
        &self.data[row * w..(row + 1) * w]
    }

    /// Contiguous rows `[range.start, range.end)` as one row-major slice.
    ///
    /// # Panics
    /// Panics if the range exceeds the table.
    #[must_use]
    pub fn rows(&self, range: Range<usize>) -> &[f64] {
        let w = self.num_columns();
        &self.data[range.start * w..range.end * w]
    }

    /// Single cell.
    #[must_use]
    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.data[row * self.num_columns() + column]
    }

    /// Copy one column out of the table.
    #[must_use]
    pub fn column_values(&self, column: usize) -> Vec<f64> {
        let w = self.num_columns();
        self.data.iter().skip(column).step_by(w).copied().collect()
    }

    /// Copy of the rows in `range` as a new table.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the range exceeds the table.
    pub fn slice_rows(&self, range: Range<usize>) -> Result<Self, SpotcastError> {
        if range.start > range.end || range.end > self.row_count() {
            return Err(SpotcastError::InvalidArg(format!(
                "row range {}..{} outside table of {} rows",
                range.start,
                range.end,
                self.row_count()
            )));
        }
        Ok(Self {
            timestamps: self.timestamps[range.clone()].to_vec(),
            columns: self.columns.clone(),
            data: self.rows(range).to_vec(),
        })
    }

    /// Same timestamps and columns with every cell replaced by `f(column, value)`.
    ///
    /// # Errors
    /// Returns `AlignmentGap` if `f` produces `NaN`.
    pub(crate) fn map_cells(&self, f: impl Fn(usize, f64) -> f64) -> Result<Self, SpotcastError> {
        let w = self.num_columns();
        let data = self
            .data
            .iter()
            .enumerate()
            .map(|(i, v)| f(i % w, *v))
            .collect();
        Self::new(self.timestamps.clone(), self.columns.clone(), data)
    }
}
