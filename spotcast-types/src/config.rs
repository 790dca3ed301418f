//! Configuration types shared across the pipeline, sources, and middleware.

use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Upper bound of a requested date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndBound {
    /// Up to and including `hour` (0..=23) on `date`.
    At {
        /// Last calendar day of the range.
        date: NaiveDate,
        /// Last hour on that day; 23 requests the full day.
        hour: u32,
    },
    /// As much as the source currently has.
    ///
    /// Sources that are fetched a few moments apart may return different
    /// amounts of data for this bound.
    Latest,
}

impl EndBound {
    /// Full last day: equivalent to `At { date, hour: 23 }`.
    #[must_use]
    pub const fn end_of_day(date: NaiveDate) -> Self {
        Self::At { date, hour: 23 }
    }

    /// Returns true for the `Latest` sentinel.
    #[must_use]
    pub const fn is_latest(&self) -> bool {
        matches!(self, Self::Latest)
    }
}

/// How the aligner reacts to series of different lengths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[non_exhaustive]
pub enum RowCountPolicy {
    /// Every series must have the same number of rows.
    #[default]
    Exact,
    /// Keep the oldest `min_len` rows of every series before joining.
    ///
    /// Used for `EndBound::Latest`, where "now" advances between fetches.
    TruncateToShortest,
}

impl RowCountPolicy {
    /// Policy implied by the end bound of a request.
    #[must_use]
    pub const fn for_end(end: &EndBound) -> Self {
        if end.is_latest() {
            Self::TruncateToShortest
        } else {
            Self::Exact
        }
    }
}

/// Look-back length and forecast gap of a sliding window.
///
/// `gap` is the number of hours skipped between the last input row and the
/// target; the forecast horizon is `gap + 1` hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowSpec {
    /// Number of consecutive rows in each input window.
    pub window_size: usize,
    /// Hours skipped between the window and its target.
    pub gap: usize,
}

impl WindowSpec {
    /// Build a spec from a window size and a gap.
    #[must_use]
    pub const fn new(window_size: usize, gap: usize) -> Self {
        Self { window_size, gap }
    }

    /// Build a spec predicting `horizon_hours` ahead (`gap = horizon - 1`).
    ///
    /// A zero horizon is treated as one hour ahead.
    #[must_use]
    pub const fn for_horizon(window_size: usize, horizon_hours: usize) -> Self {
        Self {
            window_size,
            gap: horizon_hours.saturating_sub(1),
        }
    }

    /// Forecast horizon in hours.
    #[must_use]
    pub const fn horizon_hours(&self) -> usize {
        self.gap + 1
    }
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            window_size: 7 * 24,
            gap: 0,
        }
    }
}

/// Chronological train/test preparation settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitConfig {
    /// Fraction of rows (from the end) reserved for testing, in `[0, 1]`.
    pub test_fraction: f64,
    /// Window geometry applied to both partitions.
    pub window: WindowSpec,
    /// Fit a robust scaler on the training rows and apply it to both partitions.
    pub scale: bool,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_fraction: 0.2,
            window: WindowSpec::default(),
            scale: true,
        }
    }
}

/// Global configuration for the `Pipeline` orchestrator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Column that windows predict and that gets its own target scaler.
    pub target_column: String,
    /// Timeout for each individual source fetch.
    pub source_timeout: Option<Duration>,
    /// Deadline for the whole fetch fan-out.
    pub request_timeout: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: "SPOTPrice".to_string(),
            source_timeout: None,
            request_timeout: None,
        }
    }
}

/// Location of a persisted series cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Root directory; each source gets its own sub-directory.
    pub directory: PathBuf,
    /// File name inside the per-source directory.
    pub file_name: String,
}

impl CacheConfig {
    /// Cache rooted at `directory` with the default file name.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Path of the cache file for a given source.
    #[must_use]
    pub fn path_for(&self, source_name: &str) -> PathBuf {
        self.directory.join(source_name).join(&self.file_name)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("data"),
            file_name: "data.csv".to_string(),
        }
    }
}
