//! Hourly time-series stages shared by the pipeline and its sources.
//!
//! Modules include:
//! - `calendar`: repair a raw series onto a complete wall-clock calendar
//! - `align`: join repaired series into one wide table
//! - `scale`: robust per-column scaling fitted on training rows
//! - `difference`: first differences and their inverse
//! - `window`: chronological split and gap-offset sliding windows
/// Join repaired series by timestamp.
pub mod align;
/// Calendar repair: DST normalization and previous-day filling.
pub mod calendar;
/// First differencing of aligned tables.
pub mod difference;
/// Robust (median/IQR) scaling.
pub mod scale;
/// Train/test splitting and sliding windows.
pub mod window;
