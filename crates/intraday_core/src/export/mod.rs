//! Scenario export: dated volumes → sorted distribution rows.
//!
//! [`ScenarioExporter::build_rows`] resolves each entry's grouping,
//! fetches its curve from a [`CurveSource`] and distributes the entry's
//! volume. A date that cannot be parsed or distributed is recorded in
//! [`ScenarioReport::skipped_dates`]; the rest of the batch carries on.
//!
//! The `csv` submodule writes rows and curve tables for spreadsheets.

pub mod csv;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, warn};

use crate::calendar::HolidayCalendar;
use crate::curves::{compute_curve, Observation, WeightWarning, WeightedCurve};
use crate::distribution::{DistributionRow, RowType};
use crate::grouping::{group_by_holiday, group_by_weekday, Grouping};
use crate::types::{BucketError, BucketGrid, Date, DateError, DistributionError};

pub use self::csv::{write_curve_csv, write_curves_csv, write_daily_csv, write_rows_csv};

/// One dated volume to distribute.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioEntry {
    /// Date as supplied, ISO or `DD/MM/YYYY`
    pub date: String,
    /// Total volume for the day
    pub total_volume: u64,
    /// Explicit grouping; resolved from the date when absent
    #[serde(default)]
    pub grouping: Option<Grouping>,
    /// Explicit type tag; `FESTIVO` for calendar holidays, else `N`, when absent
    #[serde(default)]
    pub row_type: Option<RowType>,
}

impl ScenarioEntry {
    /// Entry whose grouping and type are resolved from the date.
    pub fn new(date: impl Into<String>, total_volume: u64) -> Self {
        Self {
            date: date.into(),
            total_volume,
            grouping: None,
            row_type: None,
        }
    }

    /// Pins the grouping.
    pub fn with_grouping(mut self, grouping: Grouping) -> Self {
        self.grouping = Some(grouping);
        self
    }

    /// Pins the type tag.
    pub fn with_row_type(mut self, row_type: RowType) -> Self {
        self.row_type = Some(row_type);
        self
    }
}

/// Supplies the weighted curve of a grouping.
///
/// Closures `Fn(&Grouping) -> Result<WeightedCurve, DistributionError>`
/// implement this directly.
pub trait CurveSource {
    /// Curve for `grouping`, or why there is none.
    fn curve_for(&self, grouping: &Grouping) -> Result<WeightedCurve, DistributionError>;

    /// Grouping of a date with no explicit one: holiday, else weekday.
    fn resolve(&self, date: Date, calendar: &HolidayCalendar) -> Grouping {
        Grouping::for_date(date, calendar)
    }
}

impl<F> CurveSource for F
where
    F: Fn(&Grouping) -> Result<WeightedCurve, DistributionError>,
{
    fn curve_for(&self, grouping: &Grouping) -> Result<WeightedCurve, DistributionError> {
        self(grouping)
    }
}

/// Precomputed curves keyed by grouping.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CurveBook {
    curves: BTreeMap<Grouping, WeightedCurve>,
}

impl CurveBook {
    /// Empty book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds weekday and holiday curves from raw instances.
    ///
    /// Weekday groups keep the instances' weights; holiday groups get the
    /// even default. Weight warnings are returned per grouping.
    pub fn from_observations(
        instances: &[Observation],
        calendar: &HolidayCalendar,
    ) -> (Self, Vec<(Grouping, WeightWarning)>) {
        let mut book = Self::new();
        let mut warnings = Vec::new();

        let weekday_groups = group_by_weekday(instances, calendar)
            .into_iter()
            .map(|(day, group)| (Grouping::Weekday(day), group));
        let holiday_groups = group_by_holiday(instances, calendar)
            .into_iter()
            .map(|(name, group)| (Grouping::Holiday(name), group));

        for (grouping, group) in weekday_groups.chain(holiday_groups) {
            let outcome = compute_curve(&group);
            if let Some(warning) = outcome.weight_warning {
                warn!(grouping = %grouping, total = warning.total, "{}", warning);
                warnings.push((grouping.clone(), warning));
            }
            book.insert(grouping, outcome.curve);
        }
        debug!(curves = book.len(), "curve book built");
        (book, warnings)
    }

    /// Adds or replaces the curve of a grouping.
    pub fn insert(&mut self, grouping: Grouping, curve: WeightedCurve) {
        self.curves.insert(grouping, curve);
    }

    /// Curve of a grouping, if present.
    pub fn get(&self, grouping: &Grouping) -> Option<&WeightedCurve> {
        self.curves.get(grouping)
    }

    /// Iterates `(grouping, curve)` in grouping order.
    pub fn iter(&self) -> impl Iterator<Item = (&Grouping, &WeightedCurve)> {
        self.curves.iter()
    }

    /// Number of curves.
    pub fn len(&self) -> usize {
        self.curves.len()
    }

    /// True when the book holds no curve.
    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    /// Grid spanning every bucket of every curve.
    pub fn grid(&self) -> Result<BucketGrid, BucketError> {
        let mut buckets: Vec<_> = self
            .curves
            .values()
            .flat_map(|c| c.values().keys().copied())
            .collect();
        buckets.sort();
        buckets.dedup();
        BucketGrid::from_labels(buckets.iter().map(|b| b.label()))
    }
}

impl CurveSource for CurveBook {
    fn curve_for(&self, grouping: &Grouping) -> Result<WeightedCurve, DistributionError> {
        self.curves
            .get(grouping)
            .cloned()
            .ok_or_else(|| DistributionError::MissingCurve {
                grouping: grouping.to_string(),
            })
    }

    /// A curve for the exact date wins, then the holiday curve if the
    /// date is a holiday and such a curve exists, then the weekday curve.
    fn resolve(&self, date: Date, calendar: &HolidayCalendar) -> Grouping {
        let specific = Grouping::SpecificDate(date);
        if self.curves.contains_key(&specific) {
            return specific;
        }
        if let Some(name) = calendar.name_for(date) {
            let holiday = Grouping::Holiday(name.to_string());
            if self.curves.contains_key(&holiday) {
                return holiday;
            }
        }
        Grouping::Weekday(date.weekday())
    }
}

/// Why a date was left out of a scenario.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// The date string could not be normalised.
    #[error(transparent)]
    Date(#[from] DateError),

    /// No usable curve, or the curve could not be distributed.
    #[error(transparent)]
    Distribution(#[from] DistributionError),
}

/// A date left out of a scenario, with its cause.
#[derive(Clone, Debug, PartialEq)]
pub struct SkippedDate {
    /// Date as supplied
    pub input: String,
    /// Grouping it resolved to, when the date parsed
    pub grouping: Option<Grouping>,
    /// Cause
    pub reason: SkipReason,
}

/// Result of a scenario build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScenarioReport {
    /// Distributed days, ascending by date
    pub rows: Vec<DistributionRow>,
    /// Dates that could not be distributed
    pub skipped_dates: Vec<SkippedDate>,
}

impl ScenarioReport {
    /// True when nothing was skipped.
    pub fn is_complete(&self) -> bool {
        self.skipped_dates.is_empty()
    }

    /// Sum of all distributed volumes.
    pub fn total_volume(&self) -> u64 {
        self.rows.iter().map(DistributionRow::total).sum()
    }

    pub(crate) fn skip(&mut self, input: String, grouping: Option<Grouping>, reason: SkipReason) {
        warn!(date = %input, reason = %reason, "date skipped");
        self.skipped_dates.push(SkippedDate {
            input,
            grouping,
            reason,
        });
    }

    pub(crate) fn sort_rows(&mut self) {
        self.rows.sort_by_key(|row| row.date);
    }
}

/// Builds distribution rows for a batch of dated volumes.
///
/// # Examples
///
/// ```
/// use intraday_core::calendar::HolidayCalendar;
/// use intraday_core::curves::WeightedCurve;
/// use intraday_core::export::{CurveBook, ScenarioEntry, ScenarioExporter};
/// use intraday_core::grouping::Grouping;
/// use intraday_core::types::{TimeBucket, Weekday};
///
/// let ten = TimeBucket::parse("10:00").unwrap();
/// let mut book = CurveBook::new();
/// book.insert(Grouping::Weekday(Weekday::Monday), [(ten, 1.0)].into_iter().collect());
///
/// let calendar = HolidayCalendar::new();
/// let exporter = ScenarioExporter::new(&book, &calendar);
/// let report = exporter.build_rows(&[
///     ScenarioEntry::new("18/03/2024", 50),
///     ScenarioEntry::new("2024-03-11", 40),
///     ScenarioEntry::new("2024-03-12", 30),
/// ]);
///
/// assert_eq!(report.rows.len(), 2);
/// assert_eq!(report.rows[0].date.to_string(), "2024-03-11");
/// assert_eq!(report.skipped_dates.len(), 1);
/// ```
pub struct ScenarioExporter<'a, S: ?Sized> {
    source: &'a S,
    calendar: &'a HolidayCalendar,
    grid: Option<&'a BucketGrid>,
}

impl<'a, S: CurveSource + ?Sized> ScenarioExporter<'a, S> {
    /// Exporter over a curve source and a holiday calendar.
    pub fn new(source: &'a S, calendar: &'a HolidayCalendar) -> Self {
        Self {
            source,
            calendar,
            grid: None,
        }
    }

    /// Fills every row out to `grid`, with 0 for buckets the curve lacks.
    pub fn with_grid(mut self, grid: &'a BucketGrid) -> Self {
        self.grid = Some(grid);
        self
    }

    /// Distributes every entry, collecting failures instead of aborting.
    pub fn build_rows(&self, entries: &[ScenarioEntry]) -> ScenarioReport {
        let mut report = ScenarioReport::default();

        for entry in entries {
            let date = match Date::normalise(&entry.date) {
                Ok(date) => date,
                Err(e) => {
                    report.skip(entry.date.clone(), None, e.into());
                    continue;
                }
            };

            let grouping = entry
                .grouping
                .clone()
                .unwrap_or_else(|| self.source.resolve(date, self.calendar));
            let row_type = entry.row_type.unwrap_or(if self.calendar.is_holiday(date) {
                RowType::Holiday
            } else {
                RowType::Normal
            });

            let row = self.source.curve_for(&grouping).and_then(|curve| {
                DistributionRow::distribute(date, row_type, &curve, entry.total_volume)
            });
            match row {
                Ok(mut row) => {
                    if let Some(grid) = self.grid {
                        row.fill_grid(grid);
                    }
                    report.rows.push(row);
                }
                Err(e) => report.skip(entry.date.clone(), Some(grouping), e.into()),
            }
        }

        report.sort_rows();
        debug!(
            rows = report.rows.len(),
            skipped = report.skipped_dates.len(),
            "scenario built"
        );
        report
    }
}
