//! CSV writers for distribution rows, curves and daily splits.
//!
//! Every writer takes any [`std::io::Write`] and lays values out on an
//! explicit [`BucketGrid`], so buckets missing from a row or curve are
//! written as `0` instead of being left out.

use std::collections::BTreeMap;
use std::io::Write;

use crate::curves::WeightedCurve;
use crate::distribution::{DailyAllocation, DistributionRow};
use crate::types::{BucketGrid, ExportError, Weekday};

/// Writes rows as `Date,Day,Week,Type,<labels…>`.
///
/// # Examples
///
/// ```
/// use intraday_core::distribution::{DistributionRow, RowType};
/// use intraday_core::export::write_rows_csv;
/// use intraday_core::types::{BucketGrid, BucketMap, Date, TimeBucket};
///
/// let grid = BucketGrid::from_labels(["09:00", "09:30"]).unwrap();
/// let nine = TimeBucket::parse("09:00").unwrap();
/// let date = Date::from_ymd(2024, 3, 11).unwrap();
/// let row = DistributionRow::new(date, RowType::Normal, BucketMap::from([(nine, 12)]));
///
/// let mut out = Vec::new();
/// write_rows_csv(&mut out, &[row], &grid).unwrap();
/// let text = String::from_utf8(out).unwrap();
/// assert_eq!(text, "Date,Day,Week,Type,09:00,09:30\n2024-03-11,Monday,11,N,12,0\n");
/// ```
pub fn write_rows_csv<W: Write>(
    writer: W,
    rows: &[DistributionRow],
    grid: &BucketGrid,
) -> Result<(), ExportError> {
    let mut wtr = ::csv::Writer::from_writer(writer);

    let mut header = vec![
        "Date".to_string(),
        "Day".to_string(),
        "Week".to_string(),
        "Type".to_string(),
    ];
    header.extend(grid.labels());
    wtr.write_record(&header)?;

    for row in rows {
        let mut record = vec![
            row.date.to_string(),
            row.day_name.name().to_string(),
            row.iso_week.to_string(),
            row.row_type.code().to_string(),
        ];
        record.extend(grid.iter().map(|b| row.get(b).to_string()));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes one curve per weekday as `Day,<labels…>`.
pub fn write_curves_csv<W: Write>(
    writer: W,
    curves: &BTreeMap<Weekday, WeightedCurve>,
    grid: &BucketGrid,
) -> Result<(), ExportError> {
    let mut wtr = ::csv::Writer::from_writer(writer);

    let mut header = vec!["Day".to_string()];
    header.extend(grid.labels());
    wtr.write_record(&header)?;

    for (day, curve) in curves {
        let mut record = vec![day.name().to_string()];
        record.extend(grid.iter().map(|b| format_fraction(curve.get(b))));
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes a single curve as `Interval,Fraction`, one bucket per line.
pub fn write_curve_csv<W: Write>(
    writer: W,
    curve: &WeightedCurve,
    grid: &BucketGrid,
) -> Result<(), ExportError> {
    let mut wtr = ::csv::Writer::from_writer(writer);
    wtr.write_record(["Interval", "Fraction"])?;
    for bucket in grid.iter() {
        wtr.write_record([bucket.label(), format_fraction(curve.get(bucket))])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes a month split as `Date,Day,Volume,Holiday`.
pub fn write_daily_csv<W: Write>(writer: W, days: &[DailyAllocation]) -> Result<(), ExportError> {
    let mut wtr = ::csv::Writer::from_writer(writer);
    wtr.write_record(["Date", "Day", "Volume", "Holiday"])?;
    for day in days {
        wtr.write_record([
            day.date.to_string(),
            day.weekday.name().to_string(),
            day.volume.to_string(),
            day.is_holiday.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

fn format_fraction(value: f64) -> String {
    format!("{:.6}", value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Date, TimeBucket};

    fn bucket(label: &str) -> TimeBucket {
        TimeBucket::parse(label).unwrap()
    }

    fn read_back(bytes: Vec<u8>) -> Vec<Vec<String>> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(false)
            .from_reader(bytes.as_slice());
        reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect()
    }

    #[test]
    fn test_curves_table_has_one_row_per_day() {
        let grid = BucketGrid::from_labels(["09:00", "10:00"]).unwrap();
        let curves = BTreeMap::from([
            (Weekday::Tuesday, [(bucket("09:00"), 1.0)].into_iter().collect()),
            (Weekday::Monday, [(bucket("10:00"), 1.0)].into_iter().collect()),
        ]);

        let mut out = Vec::new();
        write_curves_csv(&mut out, &curves, &grid).unwrap();
        let records = read_back(out);

        assert_eq!(records[0], vec!["Day", "09:00", "10:00"]);
        assert_eq!(records[1], vec!["Monday", "0.000000", "1.000000"]);
        assert_eq!(records[2], vec!["Tuesday", "1.000000", "0.000000"]);
    }

    #[test]
    fn test_single_curve_lists_every_grid_bucket() {
        let grid = BucketGrid::from_labels(["09:00", "09:30", "10:00"]).unwrap();
        let curve: WeightedCurve = [(bucket("09:30"), 0.25)].into_iter().collect();

        let mut out = Vec::new();
        write_curve_csv(&mut out, &curve, &grid).unwrap();
        let records = read_back(out);

        assert_eq!(records.len(), 4);
        assert_eq!(records[2], vec!["09:30", "0.250000"]);
        assert_eq!(records[3], vec!["10:00", "0.000000"]);
    }

    #[test]
    fn test_daily_split_columns() {
        let date = Date::from_ymd(2024, 5, 1).unwrap();
        let days = vec![DailyAllocation {
            date,
            weekday: date.weekday(),
            volume: 42,
            is_holiday: true,
        }];

        let mut out = Vec::new();
        write_daily_csv(&mut out, &days).unwrap();
        let records = read_back(out);

        assert_eq!(records[1], vec!["2024-05-01", "Wednesday", "42", "true"]);
    }
}
