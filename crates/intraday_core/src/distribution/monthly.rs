//! Monthly total → daily totals.
//!
//! Historical daily volumes of the same calendar month give each
//! day-of-month a seasonal weight (its average volume over the history,
//! normalised). A month total is then apportioned over the target
//! month's days with the same exact-sum rule as intraday distribution.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::apportion::apportion;
use crate::calendar::HolidayCalendar;
use crate::types::{Date, DistributionError, Weekday};

/// One historical daily volume.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyVolume {
    /// Calendar date
    pub date: Date,
    /// Volume handled that day
    pub volume: f64,
}

/// One day of a distributed month.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyAllocation {
    /// Calendar date
    pub date: Date,
    /// Day of week
    pub weekday: Weekday,
    /// Allocated volume
    pub volume: u64,
    /// True when the date is in the holiday calendar
    pub is_holiday: bool,
}

/// Day-of-month weights (1..=31) from the history of one calendar month.
///
/// Each day's weight is its mean volume over the history divided by the
/// sum of those means. Non-finite or negative volumes are ignored. An
/// empty map means there is no usable history for that month.
pub fn daily_weights_from_history(history: &[DailyVolume], month: u32) -> BTreeMap<u32, f64> {
    let mut sums: BTreeMap<u32, (f64, u32)> = BTreeMap::new();
    for entry in history
        .iter()
        .filter(|e| e.date.month() == month && e.volume.is_finite() && e.volume >= 0.0)
    {
        let slot = sums.entry(entry.date.day()).or_insert((0.0, 0));
        slot.0 += entry.volume;
        slot.1 += 1;
    }

    let means: BTreeMap<u32, f64> = sums
        .into_iter()
        .map(|(day, (sum, count))| (day, sum / f64::from(count)))
        .collect();
    let total: f64 = means.values().sum();
    if total <= 0.0 {
        return BTreeMap::new();
    }
    means.into_iter().map(|(day, mean)| (day, mean / total)).collect()
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    u32::try_from(next.signed_duration_since(first).num_days()).ok()
}

/// Distributes `total` over the days of `year`-`month`.
///
/// `weights` are day-of-month shares, typically from
/// [`daily_weights_from_history`]. Days absent from `weights` get 0.
/// With no usable weights for the month's days every day gets an even
/// share. Allocations always sum to `total`; the largest-share day
/// absorbs the rounding slack.
///
/// # Examples
///
/// ```
/// use intraday_core::calendar::HolidayCalendar;
/// use intraday_core::distribution::distribute_month;
/// use std::collections::BTreeMap;
///
/// let days = distribute_month(2024, 2, 2900, &BTreeMap::new(), &HolidayCalendar::new()).unwrap();
/// assert_eq!(days.len(), 29);
/// assert!(days.iter().all(|d| d.volume == 100));
/// ```
pub fn distribute_month(
    year: i32,
    month: u32,
    total: u64,
    weights: &BTreeMap<u32, f64>,
    calendar: &HolidayCalendar,
) -> Result<Vec<DailyAllocation>, DistributionError> {
    let day_count = days_in_month(year, month).ok_or(DistributionError::InvalidMonth { year, month })?;

    let mut dates = Vec::with_capacity(day_count as usize);
    for day in 1..=day_count {
        let date = Date::from_ymd(year, month, day)
            .map_err(|_| DistributionError::InvalidMonth { year, month })?;
        dates.push(date);
    }

    let mut shares: Vec<f64> = dates
        .iter()
        .map(|d| weights.get(&d.day()).copied().unwrap_or(0.0))
        .map(|w| if w.is_finite() && w > 0.0 { w } else { 0.0 })
        .collect();
    if shares.iter().all(|s| *s == 0.0) {
        shares = vec![1.0 / f64::from(day_count); dates.len()];
    } else {
        // history may cover days this month lacks (e.g. the 31st)
        let covered: f64 = shares.iter().sum();
        shares.iter_mut().for_each(|s| *s /= covered);
    }

    let volumes = apportion(&shares, total);
    debug!(year, month, total, days = day_count, "month distributed");

    Ok(dates
        .into_iter()
        .zip(volumes)
        .map(|(date, volume)| DailyAllocation {
            date,
            weekday: date.weekday(),
            volume,
            is_holiday: calendar.is_holiday(date),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn volume(y: i32, m: u32, d: u32, v: f64) -> DailyVolume {
        DailyVolume {
            date: Date::from_ymd(y, m, d).unwrap(),
            volume: v,
        }
    }

    #[test]
    fn test_weights_average_across_years() {
        let history = vec![
            volume(2022, 3, 1, 100.0),
            volume(2023, 3, 1, 300.0),
            volume(2023, 3, 2, 200.0),
            volume(2023, 4, 1, 9999.0),
        ];
        let weights = daily_weights_from_history(&history, 3);
        assert_eq!(weights.len(), 2);
        assert!((weights[&1] - 0.5).abs() < 1e-12);
        assert!((weights[&2] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_weights_empty_without_history() {
        assert!(daily_weights_from_history(&[], 3).is_empty());
        let zeros = vec![volume(2023, 3, 1, 0.0)];
        assert!(daily_weights_from_history(&zeros, 3).is_empty());
    }

    #[test]
    fn test_month_sums_exactly() {
        let weights = BTreeMap::from([(1, 0.1), (15, 0.6), (31, 0.3)]);
        let days = distribute_month(2024, 1, 1001, &weights, &HolidayCalendar::new()).unwrap();
        assert_eq!(days.len(), 31);
        assert_eq!(days.iter().map(|d| d.volume).sum::<u64>(), 1001);
        assert_eq!(days[14].volume, 601);
        assert_eq!(days[1].volume, 0);
    }

    #[test]
    fn test_short_month_renormalises_covered_days() {
        // the 31st does not exist in April; its share is spread over the rest
        let weights = BTreeMap::from([(1, 0.25), (30, 0.25), (31, 0.5)]);
        let days = distribute_month(2024, 4, 100, &weights, &HolidayCalendar::new()).unwrap();
        assert_eq!(days.len(), 30);
        assert_eq!(days[0].volume, 50);
        assert_eq!(days[29].volume, 50);
    }

    #[test]
    fn test_holidays_flagged() {
        let (calendar, _) = HolidayCalendar::from_raw([("2024-05-01", "Día del Trabajo")]);
        let days = distribute_month(2024, 5, 310, &BTreeMap::new(), &calendar).unwrap();
        assert!(days[0].is_holiday);
        assert!(!days[1].is_holiday);
        assert_eq!(days[0].weekday, Weekday::Wednesday);
    }

    #[test]
    fn test_invalid_month() {
        let err = distribute_month(2024, 13, 10, &BTreeMap::new(), &HolidayCalendar::new());
        assert_eq!(err, Err(DistributionError::InvalidMonth { year: 2024, month: 13 }));
    }
}
