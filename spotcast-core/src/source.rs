use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{EndBound, Series, SpotcastError};

/// A request for raw hourly data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FetchRequest {
    /// First calendar day (inclusive) in the source's market time zone.
    pub start: NaiveDate,
    /// Last day and hour, or the `Latest` sentinel.
    pub end: EndBound,
}

impl FetchRequest {
    /// Build a request.
    #[must_use]
    pub const fn new(start: NaiveDate, end: EndBound) -> Self {
        Self { start, end }
    }

    /// Request whole days from `start` through `end`.
    #[must_use]
    pub const fn days(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end: EndBound::end_of_day(end),
        }
    }

    /// Request everything from `start` up to what the source has now.
    #[must_use]
    pub const fn until_latest(start: NaiveDate) -> Self {
        Self {
            start,
            end: EndBound::Latest,
        }
    }

    /// Validate that the range is not inverted and the end hour is a real hour.
    ///
    /// # Errors
    /// Returns `InvalidArg` describing the problem.
    pub fn validate(&self) -> Result<(), SpotcastError> {
        if let EndBound::At { date, hour } = self.end {
            if date < self.start {
                return Err(SpotcastError::InvalidArg(format!(
                    "end date {date} is before start date {}",
                    self.start
                )));
            }
            if hour > 23 {
                return Err(SpotcastError::InvalidArg(format!(
                    "end hour {hour} is not in 0..=23"
                )));
            }
        }
        Ok(())
    }
}

/// Capability implemented by every raw hourly data provider.
///
/// Providers are independent: calls to distinct sources share no state and
/// may run concurrently. Credentials and endpoints belong in the source's
/// constructor, not here. Sources should not retry internally beyond what
/// their transport does; the pipeline never retries either.
#[async_trait]
pub trait SeriesSource: Send + Sync {
    /// Stable identifier, used to tag errors and name cache directories.
    fn name(&self) -> &str;

    /// Human-readable provider label.
    fn vendor(&self) -> &str {
        self.name()
    }

    /// Fetch raw hourly points for the request.
    ///
    /// The returned series holds UTC instants and its market time zone. It may
    /// contain gaps and daylight-saving irregularities; repair is the
    /// pipeline's job.
    async fn fetch_range(&self, req: &FetchRequest) -> Result<Series, SpotcastError>;
}
