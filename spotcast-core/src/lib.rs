//! spotcast-core
//!
//! Core types, traits, and time-series stages shared across the spotcast workspace.
//!
//! - `types`: hourly points, named series, and the aligned wide table.
//! - `source`: the `SeriesSource` capability implemented by every raw data provider.
//! - `middleware`: the `Middleware` trait implemented by source wrappers.
//! - `timeseries`: calendar repair, alignment, robust scaling, differencing, and windowing.
//! - `persist`: the flat CSV cache format shared with the storage layer.
//!
//! Every stage in `timeseries` is a pure function of its inputs. Stages never
//! mutate what they are given; each call returns a new value, so a raw series
//! and its repaired counterpart can be inspected side by side.
#![warn(missing_docs)]

/// Middleware trait implemented by source wrappers.
pub mod middleware;
/// Persisted cache format (CSV with a leading `Time` column).
pub mod persist;
mod series;
/// The raw source capability trait and its request type.
pub mod source;
mod table;
/// Hourly time-series stages: repair, align, scale, difference, window.
pub mod timeseries;
pub mod types;

pub use middleware::Middleware;
pub use source::{FetchRequest, SeriesSource};
pub use timeseries::align::align;
pub use timeseries::calendar::{
    CalendarRange, day_length_hours, expected_hours, local_day_start_utc, repair,
    repair_with_stats,
};
pub use timeseries::difference::{DifferenceState, difference};
pub use timeseries::scale::{ColumnScale, RobustScaler, ScalerState};
pub use timeseries::window::{
    Window, WindowSet, WindowTensor, latest_window, split, train_test_split,
};
pub use types::*;
