//! Calendar types for intraday planning.
//!
//! This module provides:
//! - `Date`: Type-safe calendar date wrapper around chrono::NaiveDate
//! - `Weekday`: Day of week with ISO numbering (Monday = 0 … Sunday = 6)
//! - `DateRange`: Inclusive range of calendar dates
//!
//! Dates are pure year/month/day tuples. Nothing here interprets a
//! timezone, so an ISO string can never shift to the neighbouring day.
//!
//! # Examples
//!
//! ```
//! use intraday_core::types::time::{Date, Weekday};
//!
//! let iso = Date::normalise("2024-03-15").unwrap();
//! let day_first = Date::normalise("15/03/2024").unwrap();
//! assert_eq!(iso, day_first);
//! assert_eq!(iso.weekday(), Weekday::Friday);
//! assert_eq!(iso.iso_week(), 11);
//! ```

use chrono::format::ParseErrorKind;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Sub;
use std::str::FromStr;

use super::error::DateError;

/// Type-safe calendar date wrapper around chrono::NaiveDate.
///
/// Serialises as ISO 8601 (`YYYY-MM-DD`) and deserialises from either
/// ISO or `DD/MM/YYYY`, so every boundary crossing normalises.
///
/// # Examples
///
/// ```
/// use intraday_core::types::time::Date;
///
/// let date = Date::from_ymd(2024, 6, 15).unwrap();
/// assert_eq!(date.year(), 2024);
/// assert_eq!(date.month(), 6);
/// assert_eq!(date.day(), 15);
///
/// let parsed: Date = "15/06/2024".parse().unwrap();
/// assert_eq!(date, parsed);
/// assert_eq!(parsed.to_string(), "2024-06-15");
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Date(NaiveDate);

impl Date {
    /// Creates a Date from year, month, and day components.
    ///
    /// # Returns
    /// `Ok(Date)` if the date is valid, `Err(DateError::InvalidDate)` otherwise.
    ///
    /// # Examples
    ///
    /// ```
    /// use intraday_core::types::time::Date;
    ///
    /// assert!(Date::from_ymd(2024, 2, 29).is_ok());
    /// assert!(Date::from_ymd(2023, 2, 29).is_err());
    /// ```
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Result<Self, DateError> {
        NaiveDate::from_ymd_opt(year, month, day)
            .map(Date)
            .ok_or(DateError::InvalidDate { year, month, day })
    }

    /// Parses a strict ISO 8601 date (`YYYY-MM-DD`).
    ///
    /// # Examples
    ///
    /// ```
    /// use intraday_core::types::time::Date;
    ///
    /// assert!(Date::parse("2024-03-15").is_ok());
    /// assert!(Date::parse("15/03/2024").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, DateError> {
        parse_date(s, &[ISO_FORMAT], &[]).map_err(|kind| date_error(s, kind))
    }

    /// Parses a day-first date (`DD/MM/YYYY`, single-digit day and month allowed).
    ///
    /// # Examples
    ///
    /// ```
    /// use intraday_core::types::time::Date;
    ///
    /// let date = Date::parse_day_first("5/3/2024").unwrap();
    /// assert_eq!(date.to_string(), "2024-03-05");
    /// ```
    pub fn parse_day_first(s: &str) -> Result<Self, DateError> {
        parse_date(s, &[DAY_FIRST_FORMAT], &[]).map_err(|kind| date_error(s, kind))
    }

    /// Normalises a date string in either accepted form.
    ///
    /// Accepts `YYYY-MM-DD` and `DD/MM/YYYY`, optionally followed by a
    /// time-of-day part (`T08:00:00` or ` 00:00:00`) which is discarded
    /// without any timezone interpretation.
    ///
    /// # Returns
    /// - `Err(DateError::Ambiguous)` if the input matches neither form
    /// - `Err(DateError::OutOfRange)` if it matches a form but names no real day
    pub fn normalise(s: &str) -> Result<Self, DateError> {
        parse_date(s.trim(), &[ISO_FORMAT, DAY_FIRST_FORMAT], &TIME_SUFFIXES)
            .map_err(|kind| date_error(s, kind))
    }

    /// Returns the underlying NaiveDate.
    pub fn into_inner(self) -> NaiveDate {
        self.0
    }

    /// Returns the year component.
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Returns the month component (1-12).
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Returns the day component (1-31).
    pub fn day(&self) -> u32 {
        self.0.day()
    }

    /// Returns the day of week from the ISO calendar.
    pub fn weekday(&self) -> Weekday {
        Weekday::from_chrono(self.0.weekday())
    }

    /// Returns the ISO 8601 week number (Monday-start, 1-53).
    ///
    /// # Examples
    ///
    /// ```
    /// use intraday_core::types::time::Date;
    ///
    /// // 2021-01-03 is a Sunday still in ISO week 53 of 2020
    /// assert_eq!(Date::from_ymd(2021, 1, 3).unwrap().iso_week(), 53);
    /// assert_eq!(Date::from_ymd(2021, 1, 4).unwrap().iso_week(), 1);
    /// ```
    pub fn iso_week(&self) -> u32 {
        self.0.iso_week().week()
    }

    /// Returns the next calendar day, or `None` at the end of chrono's range.
    pub fn succ(&self) -> Option<Date> {
        self.0.succ_opt().map(Date)
    }

    /// Formats the date as `DD/MM/YYYY`.
    pub fn to_day_first_string(&self) -> String {
        self.0.format("%d/%m/%Y").to_string()
    }
}

const ISO_FORMAT: &str = "%Y-%m-%d";
const DAY_FIRST_FORMAT: &str = "%d/%m/%Y";
const TIME_SUFFIXES: [&str; 4] = ["T%H:%M:%S%.f", " %H:%M:%S%.f", "T%H:%M", " %H:%M"];

/// Tries each date format, bare and then with each time suffix.
///
/// On failure returns the most specific error kind seen: a form that
/// matched but named no real day beats a plain mismatch.
fn parse_date(s: &str, formats: &[&str], time_suffixes: &[&str]) -> Result<Date, ParseErrorKind> {
    let mut worst = ParseErrorKind::Invalid;
    for format in formats {
        let with_time = time_suffixes.iter().map(|suffix| {
            NaiveDateTime::parse_from_str(s, &format!("{}{}", format, suffix)).map(|dt| dt.date())
        });
        let attempts = std::iter::once(NaiveDate::parse_from_str(s, format)).chain(with_time);
        for attempt in attempts {
            match attempt {
                // unsigned %Y takes 1-4 digits, so "5/3/24" would land in year 24
                Ok(date) if date.year() >= 1000 => return Ok(Date(date)),
                Ok(_) => {}
                Err(e) if is_out_of_range(e.kind()) => worst = e.kind(),
                Err(_) => {}
            }
        }
    }
    Err(worst)
}

fn is_out_of_range(kind: ParseErrorKind) -> bool {
    matches!(kind, ParseErrorKind::OutOfRange | ParseErrorKind::Impossible)
}

fn date_error(s: &str, kind: ParseErrorKind) -> DateError {
    let input = s.to_string();
    if is_out_of_range(kind) {
        DateError::OutOfRange { input }
    } else {
        DateError::Ambiguous { input }
    }
}

impl Sub for Date {
    type Output = i64;

    /// Returns the number of days between two dates.
    fn sub(self, other: Self) -> i64 {
        (self.0 - other.0).num_days()
    }
}

impl FromStr for Date {
    type Err = DateError;

    /// Parses either accepted form; see [`Date::normalise`].
    fn from_str(s: &str) -> Result<Self, DateError> {
        Date::normalise(s)
    }
}

impl TryFrom<String> for Date {
    type Error = DateError;

    fn try_from(s: String) -> Result<Self, DateError> {
        Date::normalise(&s)
    }
}

impl From<Date> for String {
    fn from(date: Date) -> Self {
        date.to_string()
    }
}

impl From<NaiveDate> for Date {
    fn from(date: NaiveDate) -> Self {
        Date(date)
    }
}

impl fmt::Display for Date {
    /// Formats the date as ISO 8601 (YYYY-MM-DD).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// Day of week, ISO ordering.
///
/// # Examples
///
/// ```
/// use intraday_core::types::time::Weekday;
///
/// assert_eq!(Weekday::Monday.index(), 0);
/// assert_eq!(Weekday::from_index(6), Some(Weekday::Sunday));
/// assert_eq!("miércoles".parse::<Weekday>().unwrap(), Weekday::Wednesday);
/// assert_eq!("fri".parse::<Weekday>().unwrap(), Weekday::Friday);
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Weekday {
    /// Monday (index 0)
    Monday,
    /// Tuesday (index 1)
    Tuesday,
    /// Wednesday (index 2)
    Wednesday,
    /// Thursday (index 3)
    Thursday,
    /// Friday (index 4)
    Friday,
    /// Saturday (index 5)
    Saturday,
    /// Sunday (index 6)
    Sunday,
}

impl Weekday {
    /// All weekdays, Monday first.
    pub const ALL: [Weekday; 7] = [
        Weekday::Monday,
        Weekday::Tuesday,
        Weekday::Wednesday,
        Weekday::Thursday,
        Weekday::Friday,
        Weekday::Saturday,
        Weekday::Sunday,
    ];

    /// ISO index, Monday = 0 … Sunday = 6.
    pub fn index(self) -> u32 {
        self as u32
    }

    /// Inverse of [`Weekday::index`].
    pub fn from_index(index: u32) -> Option<Self> {
        Self::ALL.get(index as usize).copied()
    }

    /// English display name.
    pub fn name(self) -> &'static str {
        match self {
            Weekday::Monday => "Monday",
            Weekday::Tuesday => "Tuesday",
            Weekday::Wednesday => "Wednesday",
            Weekday::Thursday => "Thursday",
            Weekday::Friday => "Friday",
            Weekday::Saturday => "Saturday",
            Weekday::Sunday => "Sunday",
        }
    }

    /// Converts from chrono's weekday.
    pub fn from_chrono(day: chrono::Weekday) -> Self {
        match day {
            chrono::Weekday::Mon => Weekday::Monday,
            chrono::Weekday::Tue => Weekday::Tuesday,
            chrono::Weekday::Wed => Weekday::Wednesday,
            chrono::Weekday::Thu => Weekday::Thursday,
            chrono::Weekday::Fri => Weekday::Friday,
            chrono::Weekday::Sat => Weekday::Saturday,
            chrono::Weekday::Sun => Weekday::Sunday,
        }
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Weekday {
    type Err = String;

    /// Parses English names and abbreviations, Spanish names, or the ISO index.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let day = match s.trim().to_lowercase().as_str() {
            "monday" | "mon" | "lunes" | "0" => Weekday::Monday,
            "tuesday" | "tue" | "martes" | "1" => Weekday::Tuesday,
            "wednesday" | "wed" | "miércoles" | "miercoles" | "2" => Weekday::Wednesday,
            "thursday" | "thu" | "jueves" | "3" => Weekday::Thursday,
            "friday" | "fri" | "viernes" | "4" => Weekday::Friday,
            "saturday" | "sat" | "sábado" | "sabado" | "5" => Weekday::Saturday,
            "sunday" | "sun" | "domingo" | "6" => Weekday::Sunday,
            _ => return Err(format!("Unknown weekday: {}", s)),
        };
        Ok(day)
    }
}

impl TryFrom<String> for Weekday {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<Weekday> for String {
    fn from(day: Weekday) -> Self {
        day.name().to_string()
    }
}

/// Inclusive range of calendar dates.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day (inclusive)
    pub start: Date,
    /// Last day (inclusive)
    pub end: Date,
}

impl DateRange {
    /// Creates a range; an inverted range is simply empty.
    pub fn new(start: Date, end: Date) -> Self {
        Self { start, end }
    }

    /// Iterates every day from `start` to `end`, both included.
    pub fn days(&self) -> impl Iterator<Item = Date> + '_ {
        std::iter::successors(Some(self.start), |d| d.succ()).take_while(move |d| *d <= self.end)
    }

    /// Number of days in the range (0 when inverted).
    pub fn len(&self) -> usize {
        (self.end - self.start + 1).max(0) as usize
    }

    /// True when `start > end`.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}
