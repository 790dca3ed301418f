use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rayon::prelude::*;

use crate::{AlignedTable, SpotcastError, WindowSpec};

/// One supervised example borrowed from an [`AlignedTable`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window<'a> {
    /// Position in time order (0 is the earliest window).
    pub index: usize,
    /// `window_size x num_columns` values, row-major, straight from the table.
    pub features: &'a [f64],
    /// Target column value `gap` hours after the last input row.
    pub target: f64,
    /// Timestamp of the target row.
    pub target_time: DateTime<Utc>,
}

/// Materialized windows ready for a model.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowTensor {
    /// Window features, `shape.0 * shape.1 * shape.2` values, row-major.
    pub features: Vec<f64>,
    /// One target per window.
    pub targets: Vec<f64>,
    /// `(windows, window_size, num_columns)`.
    pub shape: (usize, usize, usize),
}

/// Read-only view of every sliding window of a table.
///
/// Windows share the table's storage; nothing is copied until
/// [`WindowSet::to_tensor`] is called.
#[derive(Debug, Clone, Copy)]
pub struct WindowSet<'a> {
    table: &'a AlignedTable,
    spec: WindowSpec,
    target: usize,
    len: usize,
}

impl<'a> WindowSet<'a> {
    /// Number of windows.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// True when the table is too short for a single window.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Window geometry.
    #[must_use]
    pub const fn spec(&self) -> WindowSpec {
        self.spec
    }

    /// Columns per window row.
    #[must_use]
    pub fn num_features(&self) -> usize {
        self.table.num_columns()
    }

    /// Table the windows are drawn from.
    #[must_use]
    pub const fn table(&self) -> &'a AlignedTable {
        self.table
    }

    /// Window `i`, or `None` past the end.
    #[must_use]
    pub fn get(&self, i: usize) -> Option<Window<'a>> {
        (i < self.len).then(|| self.at(i))
    }

    fn at(&self, i: usize) -> Window<'a> {
        let w = self.spec.window_size;
        let target_row = i + w + self.spec.gap;
        Window {
            index: i,
            features: self.table.rows(i..i + w),
            target: self.table.value(target_row, self.target),
            target_time: self.table.timestamps()[target_row],
        }
    }

    /// Windows in time order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = Window<'a>> {
        let this = *self;
        (0..self.len).map(move |i| this.at(i))
    }

    /// All targets in window order.
    #[must_use]
    pub fn targets(&self) -> Vec<f64> {
        self.iter().map(|w| w.target).collect()
    }

    /// Copy every window into contiguous buffers.
    ///
    /// Windows are copied in parallel; each writes only its own chunk.
    #[must_use]
    pub fn to_tensor(&self) -> WindowTensor {
        let w = self.spec.window_size;
        let f = self.num_features();
        let chunk = w * f;
        let mut features = vec![0.0; self.len * chunk];
        if chunk > 0 {
            features
                .par_chunks_mut(chunk)
                .enumerate()
                .for_each(|(i, out)| out.copy_from_slice(self.table.rows(i..i + w)));
        }
        WindowTensor {
            features,
            targets: self.targets(),
            shape: (self.len, w, f),
        }
    }

    /// Consecutive batches of up to `batch_size` windows, in time order.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `batch_size` is zero.
    pub fn batches(
        &self,
        batch_size: usize,
    ) -> Result<impl Iterator<Item = Vec<Window<'a>>>, SpotcastError> {
        let indices: Vec<usize> = (0..self.len).collect();
        self.batches_of(indices, batch_size)
    }

    /// Batches over a seeded permutation of the windows.
    ///
    /// Only the order windows are visited changes; which rows end up in
    /// training is decided by the chronological split beforehand.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `batch_size` is zero.
    pub fn shuffled_batches(
        &self,
        batch_size: usize,
        seed: u64,
    ) -> Result<impl Iterator<Item = Vec<Window<'a>>>, SpotcastError> {
        let mut indices: Vec<usize> = (0..self.len).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        indices.shuffle(&mut rng);
        self.batches_of(indices, batch_size)
    }

    fn batches_of(
        &self,
        indices: Vec<usize>,
        batch_size: usize,
    ) -> Result<impl Iterator<Item = Vec<Window<'a>>>, SpotcastError> {
        if batch_size == 0 {
            return Err(SpotcastError::InvalidArg("batch size must be positive".into()));
        }
        let this = *self;
        let batches: Vec<Vec<usize>> = indices.chunks(batch_size).map(<[usize]>::to_vec).collect();
        Ok(batches
            .into_iter()
            .map(move |b| b.into_iter().map(|i| this.at(i)).collect()))
    }
}

/// Slice a table into gap-offset sliding windows.
///
/// Window `i` holds rows `[i, i + window_size)` of every column; its target is
/// the `target` column at row `i + window_size + gap`. A table too short for
/// one window, including a `window_size + gap` that overflows `usize`,
/// yields an empty set.
///
/// # Errors
/// Returns `InvalidArg` if `window_size` is zero or `target` is not a column.
pub fn split<'a>(
    table: &'a AlignedTable,
    spec: &WindowSpec,
    target: &str,
) -> Result<WindowSet<'a>, SpotcastError> {
    if spec.window_size == 0 {
        return Err(SpotcastError::InvalidArg("window size must be positive".into()));
    }
    let target = table
        .column_index(target)
        .ok_or_else(|| SpotcastError::InvalidArg(format!("target column {target} not in table")))?;
    let len = spec
        .window_size
        .checked_add(spec.gap)
        .map_or(0, |span| table.row_count().saturating_sub(span));
    Ok(WindowSet {
        table,
        spec: *spec,
        target,
        len,
    })
}

/// Chronological train/test split at `floor((1 - test_fraction) * rows)`.
///
/// # Errors
/// Returns `InvalidArg` if `test_fraction` is outside `[0, 1]`.
pub fn train_test_split(
    table: &AlignedTable,
    test_fraction: f64,
) -> Result<(AlignedTable, AlignedTable), SpotcastError> {
    if !(0.0..=1.0).contains(&test_fraction) {
        return Err(SpotcastError::InvalidArg(format!(
            "test fraction {test_fraction} is not in [0, 1]"
        )));
    }
    let n = table.row_count();
    let at = (((1.0 - test_fraction) * n as f64).floor() as usize).min(n);
    Ok((table.slice_rows(0..at)?, table.slice_rows(at..n)?))
}

/// The most recent `window_size` rows, as fed to a trained model.
///
/// # Errors
/// Returns `InvalidArg` if `window_size` is zero or exceeds the table.
pub fn latest_window(table: &AlignedTable, window_size: usize) -> Result<AlignedTable, SpotcastError> {
    let n = table.row_count();
    if window_size == 0 || window_size > n {
        return Err(SpotcastError::InvalidArg(format!(
            "window of {window_size} rows does not fit a table of {n} rows"
        )));
    }
    table.slice_rows(n - window_size..n)
}
