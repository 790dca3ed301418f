//! spotcast-middleware
//!
//! Wrappers around `SeriesSource` implementations and a builder to stack them.

mod builder;
mod cache;

pub use crate::builder::SourceBuilder;
pub use crate::cache::{CacheLayer, CacheMiddleware};
