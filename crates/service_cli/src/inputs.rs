//! Input file loaders.
//!
//! Bad rows are logged and skipped so one malformed line never sinks a
//! whole file; a missing file or an unreadable header is an error.

use chrono::NaiveTime;
use intraday_core::calendar::{ExpectedVolumes, HolidayCalendar};
use intraday_core::curves::Observation;
use intraday_core::distribution::{checked_volume, DailyVolume, RowType};
use intraday_core::export::ScenarioEntry;
use intraday_core::types::{BucketGrid, BucketMap, Date, TimeBucket};
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::path::Path;
use tracing::{info, warn};

use crate::{CliError, Result};

/// Fail with [`CliError::FileNotFound`] unless `path` exists.
pub fn require_file(path: &Path) -> Result<()> {
    if !path.exists() {
        return Err(CliError::FileNotFound(path.display().to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    date: String,
    #[serde(default)]
    counts: BTreeMap<String, f64>,
    #[serde(default)]
    holiday: Option<String>,
    #[serde(default)]
    weight: Option<u32>,
    #[serde(default)]
    is_outlier: bool,
}

/// Observations read from a history file.
#[derive(Debug, Clone)]
pub struct History {
    /// Usable observations, in file order
    pub observations: Vec<Observation>,
    /// Buckets seen across the observations
    pub grid: BucketGrid,
    /// Records that were skipped
    pub rejected: usize,
}

/// Load a JSON history file, folding count labels onto `grid`.
pub fn load_history(path: &Path, grid: &BucketGrid) -> Result<History> {
    require_file(path)?;
    let source = path.display().to_string();
    let file = File::open(path)?;
    let records: Vec<HistoryRecord> =
        serde_json::from_reader(file).map_err(|e| CliError::input(&source, e))?;

    let mut observations = Vec::with_capacity(records.len());
    let mut seen = BTreeSet::new();
    let mut rejected = 0;

    for (index, record) in records.into_iter().enumerate() {
        let date = record.date.clone();
        match observation_from_record(record, grid) {
            Ok(observation) => {
                seen.extend(observation.distribution().keys().copied());
                observations.push(observation);
            }
            Err(reason) => {
                warn!(file = %source, record = index, date = %date, "skipping history record: {}", reason);
                rejected += 1;
            }
        }
    }

    if observations.is_empty() {
        return Err(CliError::input(source, "no usable history records"));
    }
    let grid = BucketGrid::from_buckets(seen.into_iter().collect(), grid.width_minutes())?;
    info!(
        file = %source,
        observations = observations.len(),
        rejected,
        buckets = grid.len(),
        "history loaded"
    );
    Ok(History {
        observations,
        grid,
        rejected,
    })
}

fn observation_from_record(record: HistoryRecord, grid: &BucketGrid) -> Result<Observation> {
    let date = Date::normalise(&record.date)?;

    let mut counts: BucketMap<f64> = BucketMap::new();
    for (label, count) in &record.counts {
        let bucket = fold_label(label, grid)?;
        *counts.entry(bucket).or_insert(0.0) += count;
    }

    let mut observation = Observation::from_counts(date, counts)?.with_outlier(record.is_outlier);
    if let Some(weight) = record.weight {
        observation = observation.with_weight(weight)?;
    }
    if let Some(name) = record.holiday.filter(|n| !n.trim().is_empty()) {
        observation = observation.with_holiday(name);
    }
    Ok(observation)
}

/// Map a `HH:MM` label onto the bucket of `grid` that contains it.
fn fold_label(label: &str, grid: &BucketGrid) -> Result<TimeBucket> {
    let bucket = TimeBucket::parse(label)?;
    NaiveTime::from_hms_opt(bucket.hour(), bucket.minute(), 0)
        .and_then(|time| grid.bucket_of(time))
        .ok_or_else(|| CliError::invalid_argument(format!("label {} is outside the grid", label)))
}

#[derive(Debug, Deserialize)]
struct VolumeRecord {
    #[serde(alias = "fecha", alias = "Date")]
    date: String,
    #[serde(alias = "volumen", alias = "Volume")]
    volume: f64,
    #[serde(default, rename = "type", alias = "tipo", alias = "Type")]
    row_type: Option<String>,
}

/// Load `date,volume[,type]` rows as scenario entries.
///
/// Dates are passed through unparsed so the exporter can report them.
pub fn load_volumes(path: &Path) -> Result<Vec<ScenarioEntry>> {
    require_file(path)?;
    let source = path.display().to_string();
    let mut reader = csv::Reader::from_path(path).map_err(|e| CliError::input(&source, e))?;

    let mut entries = Vec::new();
    for (index, record) in reader.deserialize::<VolumeRecord>().enumerate() {
        match record
            .map_err(|e| e.to_string())
            .and_then(|r| entry_from_record(r).map_err(|e| e.to_string()))
        {
            Ok(entry) => entries.push(entry),
            Err(reason) => warn!(file = %source, row = index + 1, "skipping volume row: {}", reason),
        }
    }
    info!(file = %source, entries = entries.len(), "volumes loaded");
    Ok(entries)
}

fn entry_from_record(record: VolumeRecord) -> Result<ScenarioEntry> {
    let volume = checked_volume(record.volume)?;
    let mut entry = ScenarioEntry::new(record.date.trim(), volume);
    if let Some(code) = record.row_type.filter(|c| !c.trim().is_empty()) {
        let row_type: RowType = code.parse().map_err(CliError::InvalidArgument)?;
        entry = entry.with_row_type(row_type);
    }
    Ok(entry)
}

/// Load volumes keyed by date, for ranges that fall back to a default.
pub fn load_expected_volumes(path: &Path) -> Result<ExpectedVolumes> {
    let entries = load_volumes(path)?;
    let (volumes, rejected) = ExpectedVolumes::from_raw(
        entries
            .iter()
            .map(|e| (e.date.as_str(), e.total_volume)),
    );
    for bad in &rejected {
        warn!(date = %bad.input, "skipping volume: {}", bad.error);
    }
    Ok(volumes)
}

#[derive(Debug, Deserialize)]
struct HolidayRecord {
    #[serde(alias = "fecha", alias = "Date")]
    date: String,
    #[serde(alias = "nombre", alias = "Name")]
    name: String,
}

/// Load a `date,name` holiday calendar.
pub fn load_holidays(path: &Path) -> Result<HolidayCalendar> {
    require_file(path)?;
    let source = path.display().to_string();
    let mut reader = csv::Reader::from_path(path).map_err(|e| CliError::input(&source, e))?;

    let mut raw = Vec::new();
    for (index, record) in reader.deserialize::<HolidayRecord>().enumerate() {
        match record {
            Ok(r) => raw.push((r.date, r.name)),
            Err(e) => warn!(file = %source, row = index + 1, "skipping holiday row: {}", e),
        }
    }

    let (calendar, rejected) = HolidayCalendar::from_raw(raw);
    for bad in &rejected {
        warn!(file = %source, date = %bad.input, "skipping holiday: {}", bad.error);
    }
    info!(file = %source, holidays = calendar.len(), "holidays loaded");
    Ok(calendar)
}

/// Holiday calendar from an optional file; empty when none is given.
pub fn load_optional_holidays(path: Option<&Path>) -> Result<HolidayCalendar> {
    match path {
        Some(path) => load_holidays(path),
        None => Ok(HolidayCalendar::new()),
    }
}

#[derive(Debug, Deserialize)]
struct DailyRecord {
    #[serde(alias = "fecha", alias = "Date")]
    date: String,
    #[serde(alias = "volumen", alias = "Volume")]
    volume: f64,
}

/// Load `date,volume` daily history for monthly splits.
pub fn load_daily_history(path: &Path) -> Result<Vec<DailyVolume>> {
    require_file(path)?;
    let source = path.display().to_string();
    let mut reader = csv::Reader::from_path(path).map_err(|e| CliError::input(&source, e))?;

    let mut history = Vec::new();
    for (index, record) in reader.deserialize::<DailyRecord>().enumerate() {
        let parsed = record.map_err(|e| e.to_string()).and_then(|r| {
            Date::normalise(&r.date)
                .map(|date| DailyVolume {
                    date,
                    volume: r.volume,
                })
                .map_err(|e| e.to_string())
        });
        match parsed {
            Ok(day) => history.push(day),
            Err(reason) => warn!(file = %source, row = index + 1, "skipping daily row: {}", reason),
        }
    }
    info!(file = %source, days = history.len(), "daily history loaded");
    Ok(history)
}
