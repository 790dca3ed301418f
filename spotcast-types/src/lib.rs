//! Spotcast-specific error taxonomy, configuration primitives, and reports.
#![warn(missing_docs)]

mod config;
mod error;
mod reports;

pub use config::{CacheConfig, EndBound, PipelineConfig, RowCountPolicy, SplitConfig, WindowSpec};
pub use error::SpotcastError;
pub use reports::{DatasetReport, RepairReport};
