use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{AlignedTable, SpotcastError};

/// Median and interquartile range of one column.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColumnScale {
    median: f64,
    iqr: f64,
}

impl ColumnScale {
    fn fit(column: &str, values: &[f64]) -> Result<Self, SpotcastError> {
        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);
        let median = percentile(&sorted, 0.5);
        let iqr = percentile(&sorted, 0.75) - percentile(&sorted, 0.25);
        if iqr == 0.0 || !iqr.is_finite() {
            return Err(SpotcastError::DegenerateColumn {
                column: column.to_string(),
            });
        }
        Ok(Self { median, iqr })
    }

    /// Center of the column.
    #[must_use]
    pub const fn median(&self) -> f64 {
        self.median
    }

    /// Spread between the 25th and 75th percentiles.
    #[must_use]
    pub const fn iqr(&self) -> f64 {
        self.iqr
    }

    /// `(raw - median) / iqr`.
    #[must_use]
    pub fn apply(&self, raw: f64) -> f64 {
        (raw - self.median) / self.iqr
    }

    /// `scaled * iqr + median`.
    #[must_use]
    pub fn invert(&self, scaled: f64) -> f64 {
        scaled.mul_add(self.iqr, self.median)
    }
}

/// Percentile of sorted values with linear interpolation between ranks.
fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let idx = q * (n - 1) as f64;
            let lower = idx.floor() as usize;
            let upper = idx.ceil() as usize;
            let frac = idx - lower as f64;
            sorted[lower] * (1.0 - frac) + sorted[upper] * frac
        }
    }
}

/// Fits robust scaling parameters.
///
/// Only [`RobustScaler::fit`] produces a [`ScalerState`], and it only sees
/// the table it is given. Fit on the training rows; apply the state to both
/// partitions.
#[derive(Debug, Clone, Copy, Default)]
pub struct RobustScaler;

impl RobustScaler {
    /// Compute per-column median and IQR, plus a separate state for `target`.
    ///
    /// # Errors
    /// - `InvalidArg` if the table is empty or `target` is not a column.
    /// - `DegenerateColumn` for the first column whose IQR is zero.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "spotcast::scale::fit",
            skip(table),
            fields(rows = table.row_count(), columns = table.num_columns()),
            err,
        )
    )]
    pub fn fit(table: &AlignedTable, target: &str) -> Result<ScalerState, SpotcastError> {
        if table.is_empty() {
            return Err(SpotcastError::InvalidArg(
                "cannot fit a scaler on an empty table".into(),
            ));
        }
        let target_idx = table.column_index(target).ok_or_else(|| {
            SpotcastError::InvalidArg(format!("target column {target} not in table"))
        })?;
        let scales = table
            .columns()
            .iter()
            .enumerate()
            .map(|(i, name)| ColumnScale::fit(name, &table.column_values(i)))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ScalerState {
            columns: table.columns().to_vec(),
            target: target.to_string(),
            target_scale: scales[target_idx],
            scales,
        })
    }
}

/// Fitted robust scaling parameters.
///
/// Immutable once fitted. Serializes to JSON so a model can be served with
/// the exact state it was trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScalerState")]
pub struct ScalerState {
    columns: Vec<String>,
    scales: Vec<ColumnScale>,
    target: String,
    target_scale: ColumnScale,
}

#[derive(Deserialize)]
struct RawScalerState {
    columns: Vec<String>,
    scales: Vec<ColumnScale>,
    target: String,
    target_scale: ColumnScale,
}

impl TryFrom<RawScalerState> for ScalerState {
    type Error = SpotcastError;

    fn try_from(raw: RawScalerState) -> Result<Self, Self::Error> {
        if raw.columns.len() != raw.scales.len() {
            return Err(SpotcastError::Persist(format!(
                "scaler state has {} columns but {} scales",
                raw.columns.len(),
                raw.scales.len()
            )));
        }
        if !raw.columns.contains(&raw.target) {
            return Err(SpotcastError::Persist(format!(
                "scaler target {} is not a fitted column",
                raw.target
            )));
        }
        for (name, s) in raw
            .columns
            .iter()
            .zip(&raw.scales)
            .chain(std::iter::once((&raw.target, &raw.target_scale)))
        {
            if s.iqr == 0.0 || !s.iqr.is_finite() {
                return Err(SpotcastError::DegenerateColumn {
                    column: name.clone(),
                });
            }
        }
        Ok(Self {
            columns: raw.columns,
            scales: raw.scales,
            target: raw.target,
            target_scale: raw.target_scale,
        })
    }
}

impl ScalerState {
    /// Columns the state was fitted on, in order.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Name of the target column.
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Parameters of one fitted column.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<ColumnScale> {
        self.columns
            .iter()
            .position(|c| c == name)
            .map(|i| self.scales[i])
    }

    /// Parameters of the target column.
    #[must_use]
    pub const fn target_scale(&self) -> ColumnScale {
        self.target_scale
    }

    fn check_columns(&self, table: &AlignedTable) -> Result<(), SpotcastError> {
        if table.columns() != self.columns.as_slice() {
            return Err(SpotcastError::ColumnMismatch {
                expected: self.columns.clone(),
                found: table.columns().to_vec(),
            });
        }
        Ok(())
    }

    /// Scale every column: `(raw - median) / iqr`.
    ///
    /// # Errors
    /// Returns `ColumnMismatch` if the table's columns differ from the fitted ones.
    pub fn transform(&self, table: &AlignedTable) -> Result<AlignedTable, SpotcastError> {
        self.check_columns(table)?;
        table.map_cells(|c, v| self.scales[c].apply(v))
    }

    /// Undo [`ScalerState::transform`].
    ///
    /// # Errors
    /// Returns `ColumnMismatch` if the table's columns differ from the fitted ones.
    pub fn inverse(&self, table: &AlignedTable) -> Result<AlignedTable, SpotcastError> {
        self.check_columns(table)?;
        table.map_cells(|c, v| self.scales[c].invert(v))
    }

    /// Scale a univariate target sequence.
    #[must_use]
    pub fn transform_target(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.target_scale.apply(*v)).collect()
    }

    /// Map scaled target values (e.g. model predictions) back to raw units.
    #[must_use]
    pub fn inverse_target(&self, values: &[f64]) -> Vec<f64> {
        values.iter().map(|v| self.target_scale.invert(*v)).collect()
    }

    /// Write the state as JSON.
    ///
    /// # Errors
    /// Returns `Persist` if the file cannot be written.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SpotcastError> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| SpotcastError::Persist(e.to_string()))?;
        if let Some(parent) = path.as_ref().parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, json)?;
        Ok(())
    }

    /// Read a state written by [`ScalerState::save`].
    ///
    /// # Errors
    /// Returns `Persist` if the file is missing or malformed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SpotcastError> {
        let json = fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(|e| SpotcastError::Persist(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_interpolates_between_ranks() {
        let v = [10.0, 20.0, 30.0, 40.0, 50.0];
        assert!((percentile(&v, 0.0) - 10.0).abs() < 1e-12);
        assert!((percentile(&v, 0.5) - 30.0).abs() < 1e-12);
        assert!((percentile(&v, 1.0) - 50.0).abs() < 1e-12);
        let even = [1.0, 2.0, 3.0, 4.0];
        assert!((percentile(&even, 0.25) - 1.75).abs() < 1e-12);
        assert!((percentile(&even, 0.75) - 3.25).abs() < 1e-12);
    }

    #[test]
    fn constant_column_is_degenerate() {
        assert_eq!(
            ColumnScale::fit("Solar", &[0.0; 24]),
            Err(SpotcastError::DegenerateColumn {
                column: "Solar".into()
            })
        );
    }
}
