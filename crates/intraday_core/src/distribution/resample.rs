//! Hourly → half-hourly resampling of distributed rows.

use super::DistributionRow;
use crate::types::{BucketError, BucketGrid, BucketMap, TimeBucket};

const HALF_HOUR: u32 = 30;

/// Splits rows distributed on an hourly grid into half-hour buckets.
///
/// Each hourly count `v` puts `v / 2` rounded half-to-even at `HH:30`
/// and the remainder at `HH:00`, so every hour keeps its exact total.
/// An odd count of 5 splits 3/2 while 7 splits 3/4. Grid
/// hours missing from a row count as 0. Rows on any other grid width
/// are returned unchanged together with the original grid.
///
/// # Examples
///
/// ```
/// use intraday_core::distribution::{split_hourly_rows, DistributionRow, RowType};
/// use intraday_core::types::{BucketGrid, BucketMap, Date, TimeBucket};
///
/// let nine = TimeBucket::parse("09:00").unwrap();
/// let grid = BucketGrid::from_labels(["09:00", "10:00"]).unwrap();
/// let date = Date::from_ymd(2024, 3, 11).unwrap();
/// let row = DistributionRow::new(date, RowType::Normal, BucketMap::from([(nine, 5)]));
///
/// let (rows, half_hourly) = split_hourly_rows(&[row], &grid).unwrap();
/// assert_eq!(half_hourly.labels(), vec!["09:00", "09:30", "10:00", "10:30"]);
/// assert_eq!(rows[0].get(nine), 3);
/// assert_eq!(rows[0].get(TimeBucket::parse("09:30").unwrap()), 2);
/// assert_eq!(rows[0].total(), 5);
/// ```
pub fn split_hourly_rows(
    rows: &[DistributionRow],
    grid: &BucketGrid,
) -> Result<(Vec<DistributionRow>, BucketGrid), BucketError> {
    if grid.width_minutes() != 60 {
        return Ok((rows.to_vec(), grid.clone()));
    }
    let refined = grid.refine(HALF_HOUR)?;

    let mut split_rows = Vec::with_capacity(rows.len());
    for row in rows {
        let mut values: BucketMap<u64> = BucketMap::new();
        for hour in grid.iter() {
            let value = row.get(hour);
            let second = half_to_even(value);
            let half = TimeBucket::from_minute(hour.start_minute() + HALF_HOUR)?;
            values.insert(hour, value - second);
            values.insert(half, second);
        }
        split_rows.push(DistributionRow::new(row.date, row.row_type, values));
    }
    Ok((split_rows, refined))
}

/// `v / 2` with an exact half rounded to the even neighbour.
fn half_to_even(v: u64) -> u64 {
    let half = v / 2;
    if v % 2 == 1 && half % 2 == 1 {
        half + 1
    } else {
        half
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::distribution::RowType;
    use crate::types::Date;

    fn bucket(label: &str) -> TimeBucket {
        TimeBucket::parse(label).unwrap()
    }

    fn row(values: &[(&str, u64)]) -> DistributionRow {
        DistributionRow::new(
            Date::from_ymd(2024, 3, 12).unwrap(),
            RowType::Holiday,
            values.iter().map(|(l, v)| (bucket(l), *v)).collect(),
        )
    }

    #[test]
    fn test_split_preserves_hour_totals() {
        let grid = BucketGrid::from_labels(["08:00", "09:00", "10:00"]).unwrap();
        let source = row(&[("08:00", 10), ("09:00", 7), ("10:00", 1)]);
        let (rows, refined) = split_hourly_rows(&[source.clone()], &grid).unwrap();

        assert_eq!(refined.width_minutes(), 30);
        assert_eq!(refined.len(), 6);
        let split = &rows[0];
        assert_eq!(split.get(bucket("08:00")), 5);
        assert_eq!(split.get(bucket("08:30")), 5);
        assert_eq!(split.get(bucket("09:00")), 3);
        assert_eq!(split.get(bucket("09:30")), 4);
        assert_eq!(split.get(bucket("10:00")), 1);
        assert_eq!(split.get(bucket("10:30")), 0);
        assert_eq!(split.total(), source.total());
        assert_eq!(split.row_type, RowType::Holiday);
        assert_eq!(split.iso_week, source.iso_week);
    }

    #[test]
    fn test_odd_hours_round_half_to_even() {
        let grid = BucketGrid::from_labels(["09:00"]).unwrap();
        for (value, top, bottom) in [(1, 1, 0), (3, 1, 2), (5, 3, 2), (7, 3, 4), (11, 5, 6)] {
            let (rows, _) = split_hourly_rows(&[row(&[("09:00", value)])], &grid).unwrap();
            assert_eq!(rows[0].get(bucket("09:00")), top, "{} at 09:00", value);
            assert_eq!(rows[0].get(bucket("09:30")), bottom, "{} at 09:30", value);
        }
    }

    #[test]
    fn test_missing_hours_become_zero() {
        let grid = BucketGrid::from_labels(["08:00", "09:00"]).unwrap();
        let (rows, _) = split_hourly_rows(&[row(&[("09:00", 4)])], &grid).unwrap();
        assert_eq!(rows[0].values.len(), 4);
        assert_eq!(rows[0].get(bucket("08:30")), 0);
    }

    #[test]
    fn test_non_hourly_grid_is_untouched() {
        let grid = BucketGrid::half_hourly();
        let source = row(&[("08:00", 3), ("08:30", 4)]);
        let (rows, same) = split_hourly_rows(&[source.clone()], &grid).unwrap();
        assert_eq!(rows, vec![source]);
        assert_eq!(same, grid);
    }

    #[test]
    fn test_full_day_hourly_grid() {
        let grid = BucketGrid::hourly();
        let source = row(&[("23:00", 9)]);
        let (rows, refined) = split_hourly_rows(&[source], &grid).unwrap();
        assert!(refined.is_full_day());
        assert_eq!(refined.len(), 48);
        assert_eq!(rows[0].get(bucket("23:00")), 5);
        assert_eq!(rows[0].get(bucket("23:30")), 4);
        assert_eq!(rows[0].total(), 9);
    }
}
