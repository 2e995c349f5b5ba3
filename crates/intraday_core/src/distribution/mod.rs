//! Exact-sum distribution of a total volume across time buckets.
//!
//! [`distribute`] turns a [`WeightedCurve`] and a daily total into
//! integer per-bucket counts whose sum equals the total exactly. Every
//! bucket is rounded independently and the slack is then moved onto the
//! single highest-demand bucket (the first one wins ties).
//!
//! This module also provides:
//! - [`DistributionRow`]: one distributed day with its calendar metadata
//! - `monthly`: month total → daily totals by day-of-month seasonality
//! - `resample`: hourly rows → half-hourly rows

pub(crate) mod apportion;
pub mod monthly;
pub mod resample;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

use crate::curves::WeightedCurve;
use crate::types::{BucketGrid, BucketMap, Date, DistributionError, TimeBucket, Weekday};

pub use monthly::{daily_weights_from_history, distribute_month, DailyAllocation, DailyVolume};
pub use resample::split_hourly_rows;

/// Distributes `total_volume` across the curve's buckets.
///
/// # Errors
///
/// - [`DistributionError::InvalidCurveValue`] for a negative or
///   non-finite curve value
/// - [`DistributionError::NoCurveAvailable`] when the curve is empty or
///   all-zero; a zero-filled row would hide the upstream failure
///
/// # Examples
///
/// ```
/// use intraday_core::curves::WeightedCurve;
/// use intraday_core::distribution::distribute;
/// use intraday_core::types::TimeBucket;
///
/// let a = TimeBucket::parse("09:00").unwrap();
/// let b = TimeBucket::parse("09:30").unwrap();
/// let curve: WeightedCurve = [(a, 0.5), (b, 0.5)].into_iter().collect();
///
/// // 1.5 and 1.5 round to 2 and 2; the first peak bucket gives one back
/// let allocated = distribute(&curve, 3).unwrap();
/// assert_eq!(allocated[&a], 1);
/// assert_eq!(allocated[&b], 2);
/// ```
pub fn distribute(
    curve: &WeightedCurve,
    total_volume: u64,
) -> Result<BucketMap<u64>, DistributionError> {
    for (bucket, value) in curve.iter() {
        if !value.is_finite() || value < 0.0 {
            return Err(DistributionError::InvalidCurveValue { bucket, value });
        }
    }
    if curve.is_zero() {
        return Err(DistributionError::NoCurveAvailable);
    }

    let buckets: Vec<TimeBucket> = curve.iter().map(|(b, _)| b).collect();
    let shares: Vec<f64> = curve.iter().map(|(_, v)| v).collect();
    let allocated = apportion::apportion(&shares, total_volume);

    trace!(
        total_volume,
        buckets = buckets.len(),
        curve_total = curve.total(),
        "volume distributed"
    );
    Ok(buckets.into_iter().zip(allocated).collect())
}

/// Converts an externally supplied volume into a whole count.
///
/// Fractional volumes are rounded half away from zero.
///
/// ```
/// use intraday_core::distribution::checked_volume;
///
/// assert_eq!(checked_volume(1200.4).unwrap(), 1200);
/// assert!(checked_volume(-1.0).is_err());
/// assert!(checked_volume(f64::NAN).is_err());
/// ```
pub fn checked_volume(value: f64) -> Result<u64, DistributionError> {
    if !value.is_finite() || value < 0.0 {
        return Err(DistributionError::InvalidVolume { value });
    }
    Ok(value.round() as u64)
}

/// Type tag of a distributed day.
///
/// Serialised with the codes used in exported sheets: `N` for a normal
/// day, `FESTIVO` for a holiday and `EVENTO` for a special event.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RowType {
    /// Ordinary day
    #[default]
    #[serde(rename = "N", alias = "Normal", alias = "normal")]
    Normal,
    /// Designated holiday
    #[serde(rename = "FESTIVO", alias = "Holiday", alias = "holiday", alias = "H")]
    Holiday,
    /// One-off special event
    #[serde(rename = "EVENTO", alias = "SpecialEvent", alias = "special_event", alias = "E")]
    SpecialEvent,
}

impl RowType {
    /// Export code (`N`, `FESTIVO`, `EVENTO`).
    pub fn code(self) -> &'static str {
        match self {
            RowType::Normal => "N",
            RowType::Holiday => "FESTIVO",
            RowType::SpecialEvent => "EVENTO",
        }
    }
}

impl fmt::Display for RowType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for RowType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "" | "n" | "normal" => Ok(RowType::Normal),
            "festivo" | "holiday" | "h" => Ok(RowType::Holiday),
            "evento" | "specialevent" | "special_event" | "event" | "e" => {
                Ok(RowType::SpecialEvent)
            }
            other => Err(format!("Unknown row type: {}", other)),
        }
    }
}

/// One distributed calendar day.
///
/// # Invariants
///
/// - `values` sums to the total volume the day was distributed with
/// - `day_name` and `iso_week` always agree with `date`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionRow {
    /// Calendar date
    pub date: Date,
    /// Day of week of `date`
    pub day_name: Weekday,
    /// ISO 8601 week number of `date`
    pub iso_week: u32,
    /// Day type tag
    pub row_type: RowType,
    /// Allocated count per bucket
    pub values: BucketMap<u64>,
}

impl DistributionRow {
    /// Builds a row, deriving day name and week from the date.
    pub fn new(date: Date, row_type: RowType, values: BucketMap<u64>) -> Self {
        Self {
            date,
            day_name: date.weekday(),
            iso_week: date.iso_week(),
            row_type,
            values,
        }
    }

    /// Distributes `total_volume` for `date` along `curve`.
    pub fn distribute(
        date: Date,
        row_type: RowType,
        curve: &WeightedCurve,
        total_volume: u64,
    ) -> Result<Self, DistributionError> {
        Ok(Self::new(date, row_type, distribute(curve, total_volume)?))
    }

    /// Sum over all buckets.
    pub fn total(&self) -> u64 {
        self.values.values().sum()
    }

    /// Count for one bucket, 0 when absent.
    pub fn get(&self, bucket: TimeBucket) -> u64 {
        self.values.get(&bucket).copied().unwrap_or(0)
    }

    /// Bucket holding the largest count (first on ties).
    pub fn peak(&self) -> Option<TimeBucket> {
        let mut peak: Option<(TimeBucket, u64)> = None;
        for (bucket, value) in &self.values {
            if peak.map_or(true, |(_, best)| *value > best) {
                peak = Some((*bucket, *value));
            }
        }
        peak.map(|(bucket, _)| bucket)
    }

    /// Ensures every grid bucket has an explicit entry, 0 when missing.
    pub fn fill_grid(&mut self, grid: &BucketGrid) {
        for bucket in grid.iter() {
            self.values.entry(bucket).or_insert(0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bucket(label: &str) -> TimeBucket {
        TimeBucket::parse(label).unwrap()
    }

    fn curve(pairs: &[(&str, f64)]) -> WeightedCurve {
        pairs.iter().map(|(l, v)| (bucket(l), *v)).collect()
    }

    #[test]
    fn test_distribute_exact_curve() {
        let c = curve(&[("09:00", 0.2), ("09:30", 0.3), ("10:00", 0.5)]);
        let result = distribute(&c, 1000).unwrap();
        assert_eq!(result[&bucket("09:00")], 200);
        assert_eq!(result[&bucket("09:30")], 300);
        assert_eq!(result[&bucket("10:00")], 500);
    }

    #[test]
    fn test_distribute_tie_break_is_deterministic() {
        let c = curve(&[("09:00", 0.5), ("09:30", 0.5)]);
        let first = distribute(&c, 3).unwrap();
        for _ in 0..10 {
            assert_eq!(distribute(&c, 3).unwrap(), first);
        }
        assert_eq!(first.values().sum::<u64>(), 3);
        assert_eq!(first[&bucket("09:00")], 1);
    }

    #[test]
    fn test_distribute_all_zero_curve_fails() {
        let c = curve(&[("09:00", 0.0), ("09:30", 0.0)]);
        assert_eq!(distribute(&c, 100), Err(DistributionError::NoCurveAvailable));
        assert_eq!(
            distribute(&WeightedCurve::default(), 100),
            Err(DistributionError::NoCurveAvailable)
        );
    }

    #[test]
    fn test_distribute_rejects_bad_values() {
        let c = curve(&[("09:00", -0.1), ("09:30", 1.1)]);
        assert!(matches!(
            distribute(&c, 10),
            Err(DistributionError::InvalidCurveValue { .. })
        ));
        let c = curve(&[("09:00", f64::NAN)]);
        assert!(distribute(&c, 10).is_err());
    }

    #[test]
    fn test_distribute_zero_volume() {
        let c = curve(&[("09:00", 0.4), ("09:30", 0.6)]);
        let result = distribute(&c, 0).unwrap();
        assert!(result.values().all(|v| *v == 0));
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_distribute_keeps_zero_buckets() {
        let c = curve(&[("08:00", 0.0), ("09:00", 1.0)]);
        let result = distribute(&c, 7).unwrap();
        assert_eq!(result[&bucket("08:00")], 0);
        assert_eq!(result[&bucket("09:00")], 7);
    }

    #[test]
    fn test_row_type_codes() {
        assert_eq!(RowType::default(), RowType::Normal);
        assert_eq!(RowType::Holiday.code(), "FESTIVO");
        assert_eq!("evento".parse::<RowType>().unwrap(), RowType::SpecialEvent);
        assert_eq!("H".parse::<RowType>().unwrap(), RowType::Holiday);
        assert!("weekend".parse::<RowType>().is_err());
        assert_eq!(serde_json::to_string(&RowType::Normal).unwrap(), "\"N\"");
        let parsed: RowType = serde_json::from_str("\"SpecialEvent\"").unwrap();
        assert_eq!(parsed, RowType::SpecialEvent);
    }

    #[test]
    fn test_row_metadata_follows_date() {
        let date = Date::from_ymd(2024, 3, 11).unwrap();
        let c = curve(&[("09:00", 0.25), ("10:00", 0.75)]);
        let row = DistributionRow::distribute(date, RowType::Normal, &c, 40).unwrap();
        assert_eq!(row.day_name, Weekday::Monday);
        assert_eq!(row.iso_week, 11);
        assert_eq!(row.total(), 40);
        assert_eq!(row.peak(), Some(bucket("10:00")));
    }

    #[test]
    fn test_fill_grid_adds_zero_buckets() {
        let date = Date::from_ymd(2024, 3, 11).unwrap();
        let mut row = DistributionRow::new(date, RowType::Normal, BucketMap::from([(bucket("09:00"), 5)]));
        let grid = BucketGrid::from_labels(["08:30", "09:00", "09:30"]).unwrap();
        row.fill_grid(&grid);
        assert_eq!(row.values.len(), 3);
        assert_eq!(row.get(bucket("08:30")), 0);
        assert_eq!(row.total(), 5);
    }

    #[test]
    fn test_row_serialises_with_row_type_code() {
        let date = Date::from_ymd(2024, 3, 11).unwrap();
        let row = DistributionRow::new(date, RowType::Holiday, BucketMap::new());
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["rowType"], "FESTIVO");
        assert_eq!(json["dayName"], "Monday");
        assert_eq!(json["isoWeek"], 11);
    }

    mod property_tests {
        use super::*;

        fn arb_curve() -> impl Strategy<Value = Vec<f64>> {
            prop::collection::vec(0.0f64..1.0, 1..48).prop_filter_map("non-zero", |raw| {
                let total: f64 = raw.iter().sum();
                (total > 1e-9).then(|| raw.iter().map(|v| v / total).collect())
            })
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(500))]

            #[test]
            fn prop_distribution_sums_exactly(shares in arb_curve(), volume in 0u64..1_000_000) {
                let c: WeightedCurve = shares
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (TimeBucket::from_minute(i as u32 * 30).unwrap(), *v))
                    .collect();
                let result = distribute(&c, volume).unwrap();
                prop_assert_eq!(result.values().sum::<u64>(), volume);
                prop_assert_eq!(result.len(), c.len());
            }

            #[test]
            fn prop_distribution_is_reproducible(shares in arb_curve(), volume in 0u64..10_000) {
                let c: WeightedCurve = shares
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (TimeBucket::from_minute(i as u32 * 30).unwrap(), *v))
                    .collect();
                prop_assert_eq!(distribute(&c, volume).unwrap(), distribute(&c, volume).unwrap());
            }
        }
    }
}
