//! Time-of-day buckets.
//!
//! A [`TimeBucket`] names one fixed-width slice of the day by its start
//! minute and is labelled `HH:MM`. A [`BucketGrid`] is the ordered label
//! set a curve or distribution row is laid out on.
//!
//! # Examples
//!
//! ```
//! use intraday_core::types::bucket::{BucketGrid, TimeBucket};
//! use chrono::NaiveTime;
//!
//! let grid = BucketGrid::half_hourly();
//! assert_eq!(grid.len(), 48);
//!
//! let at = NaiveTime::from_hms_opt(10, 17, 0).unwrap();
//! assert_eq!(grid.bucket_of(at), Some(TimeBucket::parse("10:00").unwrap()));
//! ```

use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::BucketError;

/// Minutes in one day.
pub const MINUTES_PER_DAY: u32 = 1440;

/// Ordered mapping from bucket to a per-bucket value.
pub type BucketMap<V> = BTreeMap<TimeBucket, V>;

/// One time-of-day bucket, identified by its start minute.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeBucket {
    start: u16,
}

impl TimeBucket {
    /// Creates a bucket starting at `minute` after midnight.
    pub fn from_minute(minute: u32) -> Result<Self, BucketError> {
        if minute >= MINUTES_PER_DAY {
            return Err(BucketError::InvalidLabel(format!("minute {}", minute)));
        }
        Ok(Self {
            start: minute as u16,
        })
    }

    /// Creates a bucket from hour and minute.
    pub fn from_hm(hour: u32, minute: u32) -> Result<Self, BucketError> {
        if hour >= 24 || minute >= 60 {
            return Err(BucketError::InvalidLabel(format!("{}:{}", hour, minute)));
        }
        Self::from_minute(hour * 60 + minute)
    }

    /// Parses `HH:MM` or `HH:MM:SS` (seconds must be zero).
    ///
    /// # Examples
    ///
    /// ```
    /// use intraday_core::types::bucket::TimeBucket;
    ///
    /// assert_eq!(TimeBucket::parse("08:30").unwrap().start_minute(), 510);
    /// assert_eq!(TimeBucket::parse("8:30:00").unwrap().label(), "08:30");
    /// assert!(TimeBucket::parse("24:00").is_err());
    /// assert!(TimeBucket::parse("08:30:15").is_err());
    /// ```
    pub fn parse(label: &str) -> Result<Self, BucketError> {
        let invalid = || BucketError::InvalidLabel(label.to_string());
        let trimmed = label.trim();

        let time = NaiveTime::parse_from_str(trimmed, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
            .map_err(|_| invalid())?;
        if time.second() != 0 || time.nanosecond() != 0 {
            return Err(invalid());
        }

        Self::from_hm(time.hour(), time.minute()).map_err(|_| invalid())
    }

    /// Start minute after midnight.
    pub fn start_minute(&self) -> u32 {
        u32::from(self.start)
    }

    /// Hour component.
    pub fn hour(&self) -> u32 {
        self.start_minute() / 60
    }

    /// Minute component.
    pub fn minute(&self) -> u32 {
        self.start_minute() % 60
    }

    /// `HH:MM` label.
    pub fn label(&self) -> String {
        format!("{:02}:{:02}", self.hour(), self.minute())
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour(), self.minute())
    }
}

impl FromStr for TimeBucket {
    type Err = BucketError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for TimeBucket {
    type Error = BucketError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<TimeBucket> for String {
    fn from(bucket: TimeBucket) -> Self {
        bucket.label()
    }
}

/// Ordered set of buckets with a uniform width.
///
/// A full-day grid is exhaustive: every instant maps to exactly one
/// bucket. Grids read from a data source may cover only operating
/// hours, in which case [`BucketGrid::bucket_of`] returns `None` outside
/// them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct BucketGrid {
    width: u32,
    buckets: Vec<TimeBucket>,
}

impl BucketGrid {
    /// Default bucket width in minutes.
    pub const DEFAULT_WIDTH_MINUTES: u32 = 30;

    /// Exhaustive grid of `width`-minute buckets starting at 00:00.
    pub fn full_day(width: u32) -> Result<Self, BucketError> {
        validate_width(width)?;
        Ok(Self::uniform(width))
    }

    /// 48 half-hour buckets.
    pub fn half_hourly() -> Self {
        Self::uniform(30)
    }

    /// 24 hourly buckets.
    pub fn hourly() -> Self {
        Self::uniform(60)
    }

    // Caller guarantees `width` divides a day.
    fn uniform(width: u32) -> Self {
        let buckets = (0..MINUTES_PER_DAY / width)
            .map(|i| TimeBucket {
                start: (i * width) as u16,
            })
            .collect();
        Self { width, buckets }
    }

    /// Builds a grid from buckets of a known width.
    ///
    /// Buckets must be strictly increasing and aligned to the width;
    /// gaps between them are allowed.
    pub fn from_buckets(buckets: Vec<TimeBucket>, width: u32) -> Result<Self, BucketError> {
        validate_width(width)?;
        if buckets.is_empty() {
            return Err(BucketError::Empty);
        }
        for bucket in &buckets {
            if bucket.start_minute() % width != 0 {
                return Err(BucketError::Misaligned {
                    bucket: *bucket,
                    width,
                });
            }
        }
        for pair in buckets.windows(2) {
            if pair[1] <= pair[0] {
                return Err(BucketError::NotIncreasing {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }
        Ok(Self { width, buckets })
    }

    /// Builds a grid from labels, inferring the width from the smallest gap.
    ///
    /// A single label falls back to [`BucketGrid::DEFAULT_WIDTH_MINUTES`].
    ///
    /// # Examples
    ///
    /// ```
    /// use intraday_core::types::bucket::BucketGrid;
    ///
    /// let grid = BucketGrid::from_labels(["08:00", "09:00", "10:00"]).unwrap();
    /// assert_eq!(grid.width_minutes(), 60);
    /// assert!(!grid.is_full_day());
    /// ```
    pub fn from_labels<I, S>(labels: I) -> Result<Self, BucketError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let buckets = labels
            .into_iter()
            .map(|l| TimeBucket::parse(l.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        let width = buckets
            .windows(2)
            .map(|pair| pair[1].start_minute().saturating_sub(pair[0].start_minute()))
            .filter(|gap| *gap > 0)
            .min()
            .unwrap_or(Self::DEFAULT_WIDTH_MINUTES);

        Self::from_buckets(buckets, width)
    }

    /// Bucket width in minutes.
    pub fn width_minutes(&self) -> u32 {
        self.width
    }

    /// Number of buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    /// True when the grid has no buckets.
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    /// Buckets in order.
    pub fn buckets(&self) -> &[TimeBucket] {
        &self.buckets
    }

    /// Iterates buckets in order.
    pub fn iter(&self) -> impl Iterator<Item = TimeBucket> + '_ {
        self.buckets.iter().copied()
    }

    /// `HH:MM` labels in order.
    pub fn labels(&self) -> Vec<String> {
        self.buckets.iter().map(TimeBucket::label).collect()
    }

    /// True when the grid covers the whole day without gaps.
    pub fn is_full_day(&self) -> bool {
        self.buckets.len() as u32 * self.width == MINUTES_PER_DAY
    }

    /// True when `bucket` belongs to the grid.
    pub fn contains(&self, bucket: TimeBucket) -> bool {
        self.buckets.binary_search(&bucket).is_ok()
    }

    /// Maps a time of day to the bucket that contains it.
    pub fn bucket_of(&self, time: NaiveTime) -> Option<TimeBucket> {
        let minute = time.hour() * 60 + time.minute();
        let start = minute - minute % self.width;
        let bucket = TimeBucket {
            start: start as u16,
        };
        self.contains(bucket).then_some(bucket)
    }

    /// Splits every bucket into `width`-minute sub-buckets.
    ///
    /// `width` must divide the current width.
    pub fn refine(&self, width: u32) -> Result<Self, BucketError> {
        validate_width(width)?;
        if self.width % width != 0 {
            return Err(BucketError::InvalidWidth { minutes: width });
        }
        let per_bucket = self.width / width;
        let buckets = self
            .buckets
            .iter()
            .flat_map(|b| {
                (0..per_bucket).map(move |i| TimeBucket {
                    start: (b.start_minute() + i * width) as u16,
                })
            })
            .collect();
        Ok(Self { width, buckets })
    }
}

fn validate_width(width: u32) -> Result<(), BucketError> {
    if width == 0 || width > MINUTES_PER_DAY || MINUTES_PER_DAY % width != 0 {
        return Err(BucketError::InvalidWidth { minutes: width });
    }
    Ok(())
}

impl Default for BucketGrid {
    fn default() -> Self {
        Self::half_hourly()
    }
}

impl TryFrom<Vec<String>> for BucketGrid {
    type Error = BucketError;

    fn try_from(labels: Vec<String>) -> Result<Self, Self::Error> {
        Self::from_labels(labels)
    }
}

impl From<BucketGrid> for Vec<String> {
    fn from(grid: BucketGrid) -> Self {
        grid.labels()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels() {
        let b = TimeBucket::parse("10:30").unwrap();
        assert_eq!(b.hour(), 10);
        assert_eq!(b.minute(), 30);
        assert_eq!(b.label(), "10:30");
        assert_eq!(format!("{}", b), "10:30");

        assert_eq!(TimeBucket::parse(" 7:00 ").unwrap().label(), "07:00");
        assert_eq!(TimeBucket::parse("23:30:00").unwrap().start_minute(), 1410);
    }

    #[test]
    fn test_parse_invalid_labels() {
        for label in [
            "",
            "10",
            "10:60",
            "25:00",
            "24:00",
            "aa:bb",
            "10:30:00:00",
            "100:00",
            "10:30:01",
            "10:30:60",
            "10h30",
        ] {
            assert!(TimeBucket::parse(label).is_err(), "{} should fail", label);
        }
    }

    #[test]
    fn test_bucket_ordering_follows_time() {
        let a = TimeBucket::parse("09:30").unwrap();
        let b = TimeBucket::parse("10:00").unwrap();
        assert!(a < b);
    }

    #[test]
    fn test_full_day_grids() {
        let grid = BucketGrid::half_hourly();
        assert_eq!(grid.len(), 48);
        assert_eq!(grid.width_minutes(), 30);
        assert!(grid.is_full_day());
        assert_eq!(grid.labels()[0], "00:00");
        assert_eq!(grid.labels()[47], "23:30");

        assert_eq!(BucketGrid::hourly().len(), 24);
        assert_eq!(BucketGrid::full_day(15).unwrap().len(), 96);
        assert!(BucketGrid::full_day(7).is_err());
        assert!(BucketGrid::full_day(0).is_err());
    }

    #[test]
    fn test_every_minute_maps_to_exactly_one_bucket() {
        let grid = BucketGrid::half_hourly();
        for minute in 0..MINUTES_PER_DAY {
            let time = NaiveTime::from_hms_opt(minute / 60, minute % 60, 0).unwrap();
            let bucket = grid.bucket_of(time).unwrap();
            assert!(bucket.start_minute() <= minute);
            assert!(minute < bucket.start_minute() + 30);
        }
    }

    #[test]
    fn test_partial_grid_bucket_of() {
        let grid = BucketGrid::from_labels(["08:00", "08:30", "09:00"]).unwrap();
        assert!(!grid.is_full_day());
        let inside = NaiveTime::from_hms_opt(8, 45, 0).unwrap();
        let outside = NaiveTime::from_hms_opt(7, 15, 0).unwrap();
        assert_eq!(grid.bucket_of(inside).unwrap().label(), "08:30");
        assert_eq!(grid.bucket_of(outside), None);
    }

    #[test]
    fn test_from_labels_validation() {
        assert_eq!(
            BucketGrid::from_labels(Vec::<String>::new()),
            Err(BucketError::Empty)
        );
        assert!(matches!(
            BucketGrid::from_labels(["09:00", "08:00"]),
            Err(BucketError::NotIncreasing { .. })
        ));
        assert!(matches!(
            BucketGrid::from_labels(["08:00", "08:30", "09:15"]),
            Err(BucketError::Misaligned { .. })
        ));
        // gaps are fine as long as alignment holds
        let grid = BucketGrid::from_labels(["08:00", "08:30", "10:00"]).unwrap();
        assert_eq!(grid.width_minutes(), 30);
        assert_eq!(grid.len(), 3);
    }

    #[test]
    fn test_refine_hourly_to_half_hourly() {
        let grid = BucketGrid::from_labels(["08:00", "09:00"]).unwrap();
        let refined = grid.refine(30).unwrap();
        assert_eq!(refined.labels(), ["08:00", "08:30", "09:00", "09:30"]);
        assert!(grid.refine(45).is_err());
    }

    #[test]
    fn test_grid_serde_as_labels() {
        let grid = BucketGrid::from_labels(["08:00", "08:30"]).unwrap();
        let json = serde_json::to_string(&grid).unwrap();
        assert_eq!(json, "[\"08:00\",\"08:30\"]");
        let parsed: BucketGrid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, grid);
    }

    #[test]
    fn test_bucket_map_keys_serialise_as_labels() {
        let mut map = BucketMap::new();
        map.insert(TimeBucket::parse("08:00").unwrap(), 0.25);
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, "{\"08:00\":0.25}");
        let parsed: BucketMap<f64> = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, map);
    }
}
