//! Report envelopes produced by the pipeline.

use serde::{Deserialize, Serialize};

/// What repair did to one source's series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RepairReport {
    /// Name of the repaired series.
    pub series: String,
    /// Points delivered by the source.
    pub raw_rows: usize,
    /// Points in the repaired series.
    pub repaired_rows: usize,
    /// Hours filled by copying the previous day's value.
    pub filled_hours: usize,
    /// Daylight-saving days normalized to 24 hours.
    pub dst_days: usize,
}

/// Summary of building an aligned dataset.
///
/// One [`RepairReport`] per source, in registration order, plus the shape of
/// the aligned table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct DatasetReport {
    /// Per-source repair summaries.
    pub sources: Vec<RepairReport>,
    /// Rows in the aligned table.
    pub rows: usize,
    /// Value columns in the aligned table.
    pub columns: usize,
    /// Rows dropped when truncating series to a common length.
    pub truncated_rows: usize,
}
