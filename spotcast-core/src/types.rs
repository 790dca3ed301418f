//! Re-export of the data model and of foundational types from `spotcast-types`.
// Consolidated so downstream crates can depend on `spotcast-core` only

pub use crate::series::{HourlyPoint, Series, iso_hour, truncate_to_hour};
pub use crate::table::AlignedTable;

pub use spotcast_types::{
    CacheConfig, DatasetReport, EndBound, PipelineConfig, RepairReport, RowCountPolicy,
    SpotcastError, SplitConfig, WindowSpec,
};

pub use chrono_tz::Tz;
