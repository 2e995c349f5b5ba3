//! # intraday_core: Intraday Demand-Curve Weighting and Volume Distribution
//!
//! Combines historical per-bucket demand distributions into one weighted
//! intraday curve per grouping, then distributes expected daily volumes
//! across the same time buckets with an exact-sum guarantee.
//!
//! ## Pipeline
//!
//! 1. `grouping`: select the instances of a weekday, a holiday or a
//!    specific date ([`grouping::select_group`])
//! 2. `curves`: weight them into a curve, flagging weight totals other
//!    than 100 and excluding outliers ([`curves::compute_curve`])
//! 3. `distribution`: apportion a daily total over the curve's buckets
//!    ([`distribution::distribute`])
//! 4. `export`: build sorted rows for a batch of dated volumes, skipping
//!    dates that fail ([`export::ScenarioExporter`])
//!
//! Supporting modules:
//! - `types`: `Date`, `Weekday`, `TimeBucket`, `BucketGrid` and errors
//! - `calendar`: holiday calendar and expected volumes keyed by date
//! - `store`: saved curve sets and distributions
//!
//! Everything is synchronous and free of I/O apart from the CSV writers,
//! which take any `std::io::Write`.
//!
//! ## Usage Examples
//!
//! ```rust
//! use intraday_core::prelude::*;
//!
//! let ten = TimeBucket::parse("10:00").unwrap();
//! let eleven = TimeBucket::parse("11:00").unwrap();
//! let history = vec![
//!     Observation::new(Date::normalise("04/03/2024").unwrap(), BucketMap::from([(ten, 0.7), (eleven, 0.3)]))
//!         .unwrap()
//!         .with_weight(50)
//!         .unwrap(),
//!     Observation::new(Date::normalise("2024-03-11").unwrap(), BucketMap::from([(ten, 0.5), (eleven, 0.5)]))
//!         .unwrap()
//!         .with_weight(50)
//!         .unwrap(),
//! ];
//!
//! let calendar = HolidayCalendar::new();
//! let group = select_group(&history, &Grouping::Weekday(Weekday::Monday), &calendar);
//! let outcome = compute_curve(&group);
//! assert!(outcome.weight_warning.is_none());
//!
//! let allocated = distribute(&outcome.curve, 101).unwrap();
//! assert_eq!(allocated.values().sum::<u64>(), 101);
//! assert_eq!(allocated[&ten], 61);
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(rustdoc::private_intra_doc_links)]

pub mod calendar;
pub mod curves;
pub mod distribution;
pub mod export;
pub mod grouping;
pub mod store;
pub mod types;

/// Commonly used items in one import.
pub mod prelude {
    pub use crate::calendar::{ExpectedVolumes, HolidayCalendar};
    pub use crate::curves::{
        analyse_group, compute_curve, CurveOutcome, Observation, Weight, WeightWarning,
        WeightedCurve,
    };
    pub use crate::distribution::{distribute, DistributionRow, RowType};
    pub use crate::export::{CurveBook, CurveSource, ScenarioEntry, ScenarioExporter, ScenarioReport};
    pub use crate::grouping::{select_group, Grouping};
    pub use crate::store::{CurveStore, SavedCurve, SavedDistribution};
    pub use crate::types::{
        BucketGrid, BucketMap, Date, DateRange, DistributionError, EngineError, TimeBucket,
        Weekday,
    };
}
