use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the spotcast workspace.
///
/// Integrity violations (repair, alignment, scaling) are deterministic functions
/// of the input data. None of them are retried inside the pipeline; retries
/// belong to whatever fetches the raw data.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SpotcastError {
    /// Repair would need data from before the series' history begins.
    #[error("{series}: cannot fill {date} from the previous day; history starts too late")]
    StartTooEarly {
        /// Name of the series being repaired.
        series: String,
        /// Calendar date (ISO-8601) whose hours could not be backfilled.
        date: String,
    },

    /// The raw series reported the same hour twice.
    #[error("{series}: duplicate timestamp {timestamp}")]
    DuplicateTimestamp {
        /// Name of the offending series.
        series: String,
        /// The repeated timestamp (ISO-8601).
        timestamp: String,
    },

    /// The repaired series still does not cover the requested calendar.
    #[error("{series}: calendar repair failed: {reason}")]
    CalendarRepair {
        /// Name of the series being repaired.
        series: String,
        /// Human-readable description of the violated post-condition.
        reason: String,
    },

    /// Two series handed to the aligner have different lengths.
    #[error("row count mismatch: {left} has {left_rows} rows, {right} has {right_rows}")]
    RowCountMismatch {
        /// Name of the first series.
        left: String,
        /// Row count of the first series.
        left_rows: usize,
        /// Name of the mismatching series.
        right: String,
        /// Row count of the mismatching series.
        right_rows: usize,
    },

    /// A cell remained empty after the as-of join.
    #[error("alignment gap in column {column} at row {row} ({timestamp})")]
    AlignmentGap {
        /// Column with the missing value.
        column: String,
        /// Row index in the aligned table.
        row: usize,
        /// Backbone timestamp of the row (ISO-8601).
        timestamp: String,
    },

    /// Timestamps are not strictly increasing.
    #[error("{series}: timestamps are not strictly increasing at row {row}")]
    UnorderedTimestamps {
        /// Name of the offending series or table.
        series: String,
        /// First row that breaks the ordering.
        row: usize,
    },

    /// Two series expose a value column with the same name.
    #[error("duplicate column: {column}")]
    DuplicateColumn {
        /// The repeated column name.
        column: String,
    },

    /// A column has zero interquartile range in the fitting table.
    #[error("column {column} is degenerate (interquartile range is zero)")]
    DegenerateColumn {
        /// Name of the constant column.
        column: String,
    },

    /// A fitted state was applied to a table with a different schema.
    #[error("column mismatch: expected {expected:?}, found {found:?}")]
    ColumnMismatch {
        /// Columns the state was fitted on.
        expected: Vec<String>,
        /// Columns of the table it was applied to.
        found: Vec<String>,
    },

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// An individual raw source returned an error.
    #[error("{source_name} failed: {msg}")]
    Source {
        /// Name of the source that failed.
        source_name: String,
        /// Human-readable error message.
        msg: String,
    },

    /// An individual source call exceeded the configured timeout.
    #[error("source timed out: {source_name}")]
    SourceTimeout {
        /// Name of the source that timed out.
        source_name: String,
    },

    /// The overall request exceeded the configured deadline.
    #[error("request timed out: {capability}")]
    RequestTimeout {
        /// Label of the operation that timed out (e.g. "dataset").
        capability: String,
    },

    /// Reading or writing the persisted cache format failed.
    #[error("persist: {0}")]
    Persist(String),

    /// Every registered source failed; contains the individual failures.
    #[error("all sources failed: {0:?}")]
    AllSourcesFailed(Vec<SpotcastError>),
}

impl SpotcastError {
    /// Helper: build a `Source` error with the source name and message.
    pub fn source_failure(source_name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Source {
            source_name: source_name.into(),
            msg: msg.into(),
        }
    }

    /// Helper: build a `SourceTimeout` error.
    pub fn source_timeout(source_name: impl Into<String>) -> Self {
        Self::SourceTimeout {
            source_name: source_name.into(),
        }
    }

    /// Helper: build a `RequestTimeout` error.
    #[must_use]
    pub fn request_timeout(capability: impl Into<String>) -> Self {
        Self::RequestTimeout {
            capability: capability.into(),
        }
    }

    /// Helper: build a `CalendarRepair` error.
    pub fn calendar(series: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::CalendarRepair {
            series: series.into(),
            reason: reason.into(),
        }
    }

    /// Returns true for violations of data integrity invariants.
    ///
    /// These indicate wrong upstream data or inconsistent configuration rather
    /// than a failed call, and surface to callers unchanged.
    #[must_use]
    pub fn is_integrity_violation(&self) -> bool {
        match self {
            Self::StartTooEarly { .. }
            | Self::DuplicateTimestamp { .. }
            | Self::CalendarRepair { .. }
            | Self::RowCountMismatch { .. }
            | Self::AlignmentGap { .. }
            | Self::UnorderedTimestamps { .. }
            | Self::DuplicateColumn { .. }
            | Self::DegenerateColumn { .. } => true,
            Self::AllSourcesFailed(inner) => inner.iter().any(Self::is_integrity_violation),
            _ => false,
        }
    }

    /// Flatten nested `AllSourcesFailed` structures into a plain vector.
    #[must_use]
    pub fn flatten(self) -> Vec<Self> {
        match self {
            Self::AllSourcesFailed(list) => list.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

impl From<std::io::Error> for SpotcastError {
    fn from(e: std::io::Error) -> Self {
        Self::Persist(e.to_string())
    }
}
