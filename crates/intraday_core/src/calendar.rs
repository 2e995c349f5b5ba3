//! Holiday calendar and expected-volume map.
//!
//! Both are keyed by [`Date`], so whether a caller supplied
//! `2024-03-15` or `15/03/2024` the lookups agree. Raw string keys are
//! normalised on the way in; keys that cannot be normalised are handed
//! back as [`RejectedDate`]s instead of failing the whole load.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::types::{Date, DateError};

/// A raw date key that could not be normalised.
#[derive(Clone, Debug, PartialEq)]
pub struct RejectedDate {
    /// Input as supplied
    pub input: String,
    /// Why it was rejected
    pub error: DateError,
}

/// Compares holiday names ignoring surrounding whitespace and case.
pub(crate) fn holiday_names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Named holidays by calendar date.
///
/// # Examples
///
/// ```
/// use intraday_core::calendar::HolidayCalendar;
/// use intraday_core::types::Date;
///
/// let mut calendar = HolidayCalendar::new();
/// calendar.insert_raw("01/01/2024", "Año Nuevo").unwrap();
///
/// let new_year = Date::from_ymd(2024, 1, 1).unwrap();
/// assert!(calendar.is_holiday(new_year));
/// assert_eq!(calendar.name_for(new_year), Some("Año Nuevo"));
/// assert_eq!(calendar.dates_for(" año nuevo "), vec![new_year]);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HolidayCalendar {
    holidays: BTreeMap<Date, String>,
}

impl HolidayCalendar {
    /// Empty calendar.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a calendar from raw `(date, name)` pairs, collecting bad dates.
    pub fn from_raw<I, D, N>(entries: I) -> (Self, Vec<RejectedDate>)
    where
        I: IntoIterator<Item = (D, N)>,
        D: AsRef<str>,
        N: Into<String>,
    {
        let mut calendar = Self::new();
        let mut rejected = Vec::new();
        for (date, name) in entries {
            if let Err(error) = calendar.insert_raw(date.as_ref(), name) {
                rejected.push(RejectedDate {
                    input: date.as_ref().to_string(),
                    error,
                });
            }
        }
        (calendar, rejected)
    }

    /// Registers a holiday; a later name for the same date replaces it.
    pub fn insert(&mut self, date: Date, name: impl Into<String>) {
        self.holidays.insert(date, name.into().trim().to_string());
    }

    /// Registers a holiday from an ISO or day-first date string.
    pub fn insert_raw(&mut self, date: &str, name: impl Into<String>) -> Result<Date, DateError> {
        let date = Date::normalise(date)?;
        self.insert(date, name);
        Ok(date)
    }

    /// True when `date` is a designated holiday.
    pub fn is_holiday(&self, date: Date) -> bool {
        self.holidays.contains_key(&date)
    }

    /// Holiday name for `date`, if any.
    pub fn name_for(&self, date: Date) -> Option<&str> {
        self.holidays.get(&date).map(String::as_str)
    }

    /// Every date carrying the holiday `name`, ascending.
    pub fn dates_for(&self, name: &str) -> Vec<Date> {
        self.holidays
            .iter()
            .filter(|(_, n)| holiday_names_match(n, name))
            .map(|(d, _)| *d)
            .collect()
    }

    /// Distinct holiday names, in first-date order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.holidays.values() {
            if !names.iter().any(|n| holiday_names_match(n, name)) {
                names.push(name);
            }
        }
        names
    }

    /// Iterates `(date, name)` ascending by date.
    pub fn iter(&self) -> impl Iterator<Item = (Date, &str)> + '_ {
        self.holidays.iter().map(|(d, n)| (*d, n.as_str()))
    }

    /// Number of holiday dates.
    pub fn len(&self) -> usize {
        self.holidays.len()
    }

    /// True when no holiday is registered.
    pub fn is_empty(&self) -> bool {
        self.holidays.is_empty()
    }
}

/// Expected total volume per calendar date.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpectedVolumes {
    volumes: BTreeMap<Date, u64>,
}

impl ExpectedVolumes {
    /// Empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from raw `(date, volume)` pairs, collecting bad dates.
    pub fn from_raw<I, D>(entries: I) -> (Self, Vec<RejectedDate>)
    where
        I: IntoIterator<Item = (D, u64)>,
        D: AsRef<str>,
    {
        let mut volumes = Self::new();
        let mut rejected = Vec::new();
        for (date, volume) in entries {
            if let Err(error) = volumes.insert_raw(date.as_ref(), volume) {
                rejected.push(RejectedDate {
                    input: date.as_ref().to_string(),
                    error,
                });
            }
        }
        (volumes, rejected)
    }

    /// Sets the volume for `date`.
    pub fn insert(&mut self, date: Date, volume: u64) {
        self.volumes.insert(date, volume);
    }

    /// Sets the volume for an ISO or day-first date string.
    pub fn insert_raw(&mut self, date: &str, volume: u64) -> Result<Date, DateError> {
        let date = Date::normalise(date)?;
        self.insert(date, volume);
        Ok(date)
    }

    /// Volume for `date`, if supplied.
    pub fn get(&self, date: Date) -> Option<u64> {
        self.volumes.get(&date).copied()
    }

    /// Iterates `(date, volume)` ascending by date.
    pub fn iter(&self) -> impl Iterator<Item = (Date, u64)> + '_ {
        self.volumes.iter().map(|(d, v)| (*d, *v))
    }

    /// Sum over all dates.
    pub fn total(&self) -> u64 {
        self.volumes.values().sum()
    }

    /// Number of dates.
    pub fn len(&self) -> usize {
        self.volumes.len()
    }

    /// True when empty.
    pub fn is_empty(&self) -> bool {
        self.volumes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_both_date_forms_hit_the_same_holiday() {
        let mut calendar = HolidayCalendar::new();
        calendar.insert_raw("2024-03-15", "Fallas").unwrap();
        assert!(calendar.is_holiday(Date::normalise("15/03/2024").unwrap()));
        assert!(calendar.is_holiday(date(2024, 3, 15)));
        assert!(!calendar.is_holiday(date(2024, 3, 16)));
    }

    #[test]
    fn test_from_raw_reports_bad_dates() {
        let (calendar, rejected) = HolidayCalendar::from_raw([
            ("2024-12-25", "Navidad"),
            ("25-12-2023", "Navidad"),
            ("06/01/2024", "Reyes"),
        ]);
        assert_eq!(calendar.len(), 2);
        assert_eq!(rejected.len(), 1);
        assert_eq!(rejected[0].input, "25-12-2023");
    }

    #[test]
    fn test_dates_for_matches_names_loosely() {
        let (calendar, _) = HolidayCalendar::from_raw([
            ("2023-12-25", "Navidad"),
            ("2024-12-25", "NAVIDAD "),
            ("2024-01-06", "Reyes"),
        ]);
        assert_eq!(
            calendar.dates_for("navidad"),
            vec![date(2023, 12, 25), date(2024, 12, 25)]
        );
        assert_eq!(calendar.names(), vec!["Navidad", "Reyes"]);
    }

    #[test]
    fn test_expected_volumes_normalise_keys() {
        let (volumes, rejected) =
            ExpectedVolumes::from_raw([("2024-03-15", 1200), ("16/03/2024", 800), ("nope", 5)]);
        assert_eq!(rejected.len(), 1);
        assert_eq!(volumes.get(date(2024, 3, 15)), Some(1200));
        assert_eq!(volumes.get(date(2024, 3, 16)), Some(800));
        assert_eq!(volumes.total(), 2000);
    }

    #[test]
    fn test_calendar_serialises_as_iso_map() {
        let mut calendar = HolidayCalendar::new();
        calendar.insert(date(2024, 5, 1), "Día del Trabajo");
        let json = serde_json::to_string(&calendar).unwrap();
        assert_eq!(json, "{\"2024-05-01\":\"Día del Trabajo\"}");
        let back: HolidayCalendar = serde_json::from_str(&json).unwrap();
        assert_eq!(back, calendar);
    }
}
