#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use spotcast::{Pipeline, SeriesSource};
use spotcast_mock::MockSource;

pub fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

/// UTC instant of a Berlin wall-clock hour in winter (UTC+1).
pub fn berlin_winter(y: i32, m: u32, day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, day, hour, 0, 0).unwrap() - chrono::Duration::hours(1)
}

pub fn src(m: MockSource) -> Arc<dyn SeriesSource> {
    Arc::new(m)
}

/// Price, grid, and weather fixtures, in that order.
pub fn three_source_pipeline() -> Pipeline {
    Pipeline::builder()
        .with_source(src(MockSource::price()))
        .with_source(src(MockSource::grid()))
        .with_source(src(MockSource::weather()))
        .build()
        .unwrap()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
