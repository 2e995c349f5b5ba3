//! Error types for structured error handling.
//!
//! This module provides:
//! - `DateError`: Errors from calendar date construction and normalisation
//! - `BucketError`: Errors from time-of-day bucket labels and grids
//! - `CurveError`: Errors from observation construction and weight edits
//! - `DistributionError`: Errors from exact-sum volume distribution
//! - `ExportError`: Errors from writing CSV exports
//! - `StoreError`: Errors from the saved curve/distribution store
//! - `EngineError`: Umbrella error wrapping all of the above

use std::fmt;
use thiserror::Error;

use super::bucket::TimeBucket;

/// Date-related errors.
///
/// Provides structured error handling for date construction and parsing
/// with descriptive context for each failure mode.
///
/// # Variants
/// - `InvalidDate`: Invalid date components (e.g., February 30th)
/// - `Ambiguous`: Input is neither `YYYY-MM-DD` nor `DD/MM/YYYY`
/// - `OutOfRange`: Input has an accepted form but names no real day
///
/// # Examples
/// ```
/// use intraday_core::types::DateError;
///
/// let err = DateError::InvalidDate { year: 2024, month: 2, day: 30 };
/// assert_eq!(format!("{}", err), "Invalid date: 2024-2-30");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DateError {
    /// Invalid date components (e.g., February 30th).
    InvalidDate {
        /// Year component
        year: i32,
        /// Month component (1-12)
        month: u32,
        /// Day component (1-31)
        day: u32,
    },

    /// Date string could not be normalised to a single calendar date.
    Ambiguous {
        /// The offending input, as received
        input: String,
    },

    /// Date string has an accepted form but a component is out of range.
    OutOfRange {
        /// The offending input, as received
        input: String,
    },
}

impl fmt::Display for DateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateError::InvalidDate { year, month, day } => {
                write!(f, "Invalid date: {}-{}-{}", year, month, day)
            }
            DateError::Ambiguous { input } => write!(
                f,
                "Ambiguous date '{}': expected YYYY-MM-DD or DD/MM/YYYY",
                input
            ),
            DateError::OutOfRange { input } => {
                write!(f, "Invalid date '{}': no such calendar day", input)
            }
        }
    }
}

impl std::error::Error for DateError {}

/// Time bucket and bucket grid errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BucketError {
    /// Label is not a valid `HH:MM` time of day.
    #[error("Invalid bucket label: '{0}'")]
    InvalidLabel(String),

    /// Bucket width does not evenly divide a day.
    #[error("Invalid bucket width: {minutes} minutes must divide 1440")]
    InvalidWidth {
        /// Requested width in minutes
        minutes: u32,
    },

    /// Bucket does not start on a multiple of the grid width.
    #[error("Bucket {bucket} is not aligned to a {width}-minute grid")]
    Misaligned {
        /// Offending bucket
        bucket: TimeBucket,
        /// Grid width in minutes
        width: u32,
    },

    /// Labels are not strictly increasing.
    #[error("Bucket labels must be strictly increasing: {previous} then {next}")]
    NotIncreasing {
        /// Earlier label
        previous: TimeBucket,
        /// Label that broke the ordering
        next: TimeBucket,
    },

    /// Grid with no buckets.
    #[error("Bucket grid is empty")]
    Empty,
}

/// Observation and weight errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CurveError {
    /// Weight outside the `[0, 100]` percentage range.
    #[error("Weight {weight} is outside the range 0..=100")]
    WeightOutOfRange {
        /// Rejected weight
        weight: u32,
    },

    /// Fraction outside `[0, 1]` or not finite.
    #[error("Invalid fraction {value} for bucket {bucket}")]
    InvalidFraction {
        /// Bucket carrying the value
        bucket: TimeBucket,
        /// Rejected value
        value: f64,
    },

    /// Raw count negative or not finite.
    #[error("Invalid count {value} for bucket {bucket}")]
    InvalidCount {
        /// Bucket carrying the value
        bucket: TimeBucket,
        /// Rejected value
        value: f64,
    },

    /// Distribution of an active day does not sum to 1.
    #[error("Distribution for {date} sums to {sum}, expected 1.0 or 0.0")]
    NotNormalised {
        /// Observation date (ISO)
        date: String,
        /// Actual sum
        sum: f64,
    },
}

/// Volume distribution errors.
///
/// # Examples
/// ```
/// use intraday_core::types::DistributionError;
///
/// let err = DistributionError::NoCurveAvailable;
/// assert!(format!("{}", err).contains("no weighted curve"));
/// ```
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// The curve is empty or all-zero, so nothing can be distributed.
    #[error("Cannot distribute: no weighted curve available (all observations excluded or zero weight)")]
    NoCurveAvailable,

    /// The curve source holds nothing for the requested grouping.
    #[error("Cannot distribute: no curve registered for grouping {grouping}")]
    MissingCurve {
        /// Grouping label
        grouping: String,
    },

    /// Curve value negative or not finite.
    #[error("Invalid curve value {value} at bucket {bucket}")]
    InvalidCurveValue {
        /// Bucket carrying the value
        bucket: TimeBucket,
        /// Rejected value
        value: f64,
    },

    /// Volume negative or not finite.
    #[error("Invalid volume: {value}")]
    InvalidVolume {
        /// Rejected value
        value: f64,
    },

    /// Year/month pair does not name a calendar month.
    #[error("Invalid month: {year}-{month}")]
    InvalidMonth {
        /// Year component
        year: i32,
        /// Month component
        month: u32,
    },
}

/// CSV export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    /// CSV serialisation failure.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Underlying writer failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Saved curve and distribution store errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No saved curve set with this id.
    #[error("Saved curve {id} not found")]
    CurveNotFound {
        /// Requested id
        id: u64,
    },

    /// No saved distribution with this id.
    #[error("Saved distribution {id} not found")]
    DistributionNotFound {
        /// Requested id
        id: u64,
    },

    /// JSON snapshot could not be encoded or decoded.
    #[error("Snapshot serialisation error: {0}")]
    Serialisation(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialisation(err.to_string())
    }
}

/// Umbrella error for callers that drive the whole engine.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Date error.
    #[error(transparent)]
    Date(#[from] DateError),

    /// Bucket error.
    #[error(transparent)]
    Bucket(#[from] BucketError),

    /// Curve error.
    #[error(transparent)]
    Curve(#[from] CurveError),

    /// Distribution error.
    #[error(transparent)]
    Distribution(#[from] DistributionError),

    /// Export error.
    #[error(transparent)]
    Export(#[from] ExportError),

    /// Store error.
    #[error(transparent)]
    Store(#[from] StoreError),
}
