use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use spotcast::{FetchRequest, SeriesSource};
use spotcast_mock::MockSource;

/// Price, grid, and weather sources for the demos.
///
/// Set `SPOTCAST_DEMOS_LATENCY_MS` to delay every fetch, which makes the
/// concurrent fan-out visible in the tracing output.
#[must_use]
pub fn get_sources() -> Vec<Arc<dyn SeriesSource>> {
    let latency = std::env::var("SPOTCAST_DEMOS_LATENCY_MS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis);
    [MockSource::price(), MockSource::grid(), MockSource::weather()]
        .into_iter()
        .map(|m| match latency {
            Some(l) => m.with_latency(l),
            None => m,
        })
        .map(|m| Arc::new(m) as Arc<dyn SeriesSource>)
        .collect()
}

/// Six winter weeks, long enough for week-long windows on both partitions.
///
/// # Panics
/// Panics only if the hard-coded dates are invalid.
#[must_use]
pub fn demo_request() -> FetchRequest {
    let start = NaiveDate::from_ymd_opt(2020, 1, 1).expect("valid date");
    let end = NaiveDate::from_ymd_opt(2020, 2, 11).expect("valid date");
    FetchRequest::days(start, end)
}

/// Install a compact subscriber filtered by `RUST_LOG`.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
