//! Mock sources for CI-safe tests and demos.
//!
//! [`MockSource`] serves deterministic synthetic price, grid, and weather
//! series. [`DynamicMockSource`] defers its behavior to a controller so tests
//! can make a source fail, hang, or deliver damaged data.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use spotcast_core::{
    EndBound, FetchRequest, HourlyPoint, Series, SeriesSource, SpotcastError, local_day_start_utc,
};

mod dynamic;
mod fixtures;

pub use dynamic::{DynamicMockController, DynamicMockSource, MockBehavior};

/// Which synthetic signal a mock source serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixture {
    /// Day-ahead price: `SPOTPrice`.
    Price,
    /// Grid generation and load: `Load`, `Solar`, `Wind`.
    Grid,
    /// Weather observations: `Temp`, `WindSpeed`.
    Weather,
}

impl Fixture {
    /// Value columns of the fixture.
    #[must_use]
    pub fn fields(self) -> Vec<String> {
        let names: &[&str] = match self {
            Self::Price => &["SPOTPrice"],
            Self::Grid => &["Load", "Solar", "Wind"],
            Self::Weather => &["Temp", "WindSpeed"],
        };
        names.iter().map(|n| (*n).to_string()).collect()
    }

    /// Default source name.
    #[must_use]
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::Grid => "grid",
            Self::Weather => "weather",
        }
    }

    fn values(self, ts: chrono::DateTime<chrono::Utc>) -> Vec<f64> {
        match self {
            Self::Price => fixtures::price(ts),
            Self::Grid => fixtures::grid(ts),
            Self::Weather => fixtures::weather(ts),
        }
    }
}

/// Mock source with deterministic fixture data and unlimited history.
#[derive(Debug, Clone)]
pub struct MockSource {
    name: String,
    fixture: Fixture,
    tz: Tz,
    latest: NaiveDateTime,
    latency: Option<Duration>,
}

impl MockSource {
    /// Fixture source in `Europe/Berlin` whose data ends at 2020-03-01 12:00 local.
    #[must_use]
    pub fn new(fixture: Fixture) -> Self {
        let latest = NaiveDate::from_ymd_opt(2020, 3, 1)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .unwrap_or_default();
        Self {
            name: fixture.default_name().to_string(),
            fixture,
            tz: chrono_tz::Europe::Berlin,
            latest,
            latency: None,
        }
    }

    /// Price fixture named `price`.
    #[must_use]
    pub fn price() -> Self {
        Self::new(Fixture::Price)
    }

    /// Grid fixture named `grid`.
    #[must_use]
    pub fn grid() -> Self {
        Self::new(Fixture::Grid)
    }

    /// Weather fixture named `weather`.
    #[must_use]
    pub fn weather() -> Self {
        Self::new(Fixture::Weather)
    }

    /// Rename the source.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Serve data on the calendar of another time zone.
    #[must_use]
    pub const fn with_tz(mut self, tz: Tz) -> Self {
        self.tz = tz;
        self
    }

    /// Last local hour returned for `EndBound::Latest`.
    #[must_use]
    pub const fn with_latest(mut self, latest: NaiveDateTime) -> Self {
        self.latest = latest;
        self
    }

    /// Delay every fetch, to exercise timeouts.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Fixture served by this source.
    #[must_use]
    pub const fn fixture(&self) -> Fixture {
        self.fixture
    }

    /// Build the series a fetch of `req` returns, without latency.
    ///
    /// # Errors
    /// Returns `InvalidArg` for an inverted request.
    pub fn series(&self, req: &FetchRequest) -> Result<Series, SpotcastError> {
        req.validate()?;
        let end_local = match req.end {
            EndBound::At { date, hour } => date.and_hms_opt(hour, 0, 0).ok_or_else(|| {
                SpotcastError::InvalidArg(format!("bad end hour {hour} on {date}"))
            })?,
            EndBound::Latest => self.latest,
        };
        let mut points = Vec::new();
        if let Some(mut ts) = local_day_start_utc(req.start, self.tz) {
            loop {
                let local = self.tz.from_utc_datetime(&ts.naive_utc()).naive_local();
                if local > end_local {
                    break;
                }
                points.push(HourlyPoint::new(ts, self.fixture.values(ts)));
                ts += chrono::Duration::hours(1);
            }
        }
        Ok(Series::new(self.name.clone(), self.fixture.fields(), self.tz).with_points(points))
    }
}

#[async_trait]
impl SeriesSource for MockSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn vendor(&self) -> &str {
        "Mock"
    }

    async fn fetch_range(&self, req: &FetchRequest) -> Result<Series, SpotcastError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.series(req)
    }
}
