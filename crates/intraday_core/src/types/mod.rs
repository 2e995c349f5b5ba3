//! Core calendar, bucket and error types.
//!
//! This module provides:
//! - `time`: Calendar types (Date, Weekday, DateRange) with ISO / day-first normalisation
//! - `bucket`: Time-of-day buckets and bucket grids
//! - `error`: Structured error types for every engine failure mode
//!
//! # Re-exports
//!
//! For convenience, commonly used types are re-exported at this module level:
//! - [`Date`], [`Weekday`], [`DateRange`] from `time`
//! - [`TimeBucket`], [`BucketGrid`], [`BucketMap`] from `bucket`
//! - [`DateError`], [`BucketError`], [`CurveError`], [`DistributionError`],
//!   [`ExportError`], [`StoreError`], [`EngineError`] from `error`

pub mod bucket;
pub mod error;
pub mod time;

// Re-export commonly used types at module level
pub use bucket::{BucketGrid, BucketMap, TimeBucket, MINUTES_PER_DAY};
pub use error::{
    BucketError, CurveError, DateError, DistributionError, EngineError, ExportError, StoreError,
};
pub use time::{Date, DateRange, Weekday};
