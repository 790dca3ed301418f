//! spotcast
//!
//! Hourly multi-source dataset pipeline for electricity spot price forecasting.
//!
//! Overview
//! - Fetches every registered [`SeriesSource`] concurrently for one date range,
//!   with optional per-source timeouts and an overall request deadline.
//! - Repairs each raw series onto an unbroken wall-clock calendar (DST days
//!   normalized to 24 hours, missing hours copied from the previous day).
//! - Aligns the repaired series into one [`AlignedTable`], splits it
//!   chronologically, fits a robust scaler on the training rows only, and
//!   slices sliding windows for supervised models.
//!
//! Key behaviors
//! - The first registered source is the timestamp backbone; columns appear in
//!   registration order.
//! - Requests ending at [`EndBound::Latest`] truncate every series to the
//!   shortest one, since sources fetched moments apart can disagree on "now".
//! - Any source failure discards the other results. A single failure keeps its
//!   variant; several become `AllSourcesFailed`.
//! - Integrity violations are never retried.
//!
//! Quickstart
//! ```rust,ignore
//! use std::sync::Arc;
//! use chrono::NaiveDate;
//! use spotcast::{FetchRequest, Pipeline, SplitConfig};
//! use spotcast_mock::MockSource;
//!
//! # async fn run() -> Result<(), spotcast::SpotcastError> {
//! let pipeline = Pipeline::builder()
//!     .with_source(Arc::new(MockSource::price()))
//!     .with_source(Arc::new(MockSource::grid()))
//!     .with_source(Arc::new(MockSource::weather()))
//!     .build()?;
//!
//! let start = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
//! let end = NaiveDate::from_ymd_opt(2020, 1, 31).unwrap();
//! let prepared = pipeline
//!     .prepare(&FetchRequest::days(start, end), &SplitConfig::default())
//!     .await?;
//! let tensor = prepared.train_windows()?.to_tensor();
//! # Ok(()) }
//! ```
//!
//! Tracing
//! - Enable the `tracing` feature to instrument the fetch fan-out, repair,
//!   alignment, and the cache middleware.
#![warn(missing_docs)]

pub(crate) mod core;
mod dataset;
pub(crate) mod util;

pub use crate::core::{Pipeline, PipelineBuilder, tag_err};
pub use crate::dataset::PreparedDataset;
pub use spotcast_core::*;
pub use spotcast_middleware::{CacheLayer, CacheMiddleware, SourceBuilder};
