//! Expected command implementation
//!
//! Saves the weekday curve set built from history into a curve store and
//! writes the expected per-bucket volumes for a date range.

use clap::Args;
use intraday_core::calendar::ExpectedVolumes;
use intraday_core::curves::{compute_curve, Observation};
use intraday_core::export::write_rows_csv;
use intraday_core::grouping::group_by_weekday;
use intraday_core::store::{CurveStore, NewCurveSet};
use intraday_core::types::{Date, DateRange};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::open_output;
use crate::config::EngineConfig;
use crate::inputs::{load_expected_volumes, load_history, load_optional_holidays};
use crate::{CliError, Result};

/// File name used under `output_dir` when no output path is given
pub const DEFAULT_FILE_NAME: &str = "expected.csv";

/// Arguments of the expected command
#[derive(Debug, Clone, Args)]
pub struct ExpectedArgs {
    /// History file (JSON)
    #[arg(long)]
    pub history: PathBuf,

    /// First date of the range (YYYY-MM-DD or DD/MM/YYYY)
    #[arg(long)]
    pub from: String,

    /// Last date of the range, inclusive
    #[arg(long)]
    pub to: String,

    /// Daily volumes (CSV); missing dates use the configured default
    #[arg(long)]
    pub volumes: Option<PathBuf>,

    /// Holiday calendar (CSV); holidays are left out of weekday curves
    #[arg(long)]
    pub holidays: Option<PathBuf>,

    /// Curve store (JSON), created if missing
    #[arg(long)]
    pub store: Option<PathBuf>,

    /// Segment owning the curve set
    #[arg(long, default_value_t = 1)]
    pub segment: u64,

    /// Curve set name, unique within the segment
    #[arg(long, default_value = "default")]
    pub name: String,

    /// Output file (CSV)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Run the expected command
pub fn run(config: &EngineConfig, args: &ExpectedArgs) -> Result<()> {
    let range = DateRange::new(Date::normalise(&args.from)?, Date::normalise(&args.to)?);
    if range.is_empty() {
        return Err(CliError::invalid_argument(format!(
            "--from {} is after --to {}",
            range.start, range.end
        )));
    }
    info!("Expected volumes from {} to {}", range.start, range.end);

    let history = load_history(&args.history, &config.grid()?)?;
    let calendar = load_optional_holidays(args.holidays.as_deref())?;
    let volumes = match &args.volumes {
        Some(path) => load_expected_volumes(path)?,
        None => ExpectedVolumes::new(),
    };

    let mut curves_by_day = BTreeMap::new();
    for (day, group) in group_by_weekday(&history.observations, &calendar) {
        let outcome = compute_curve(&group);
        if let Some(warning) = outcome.weight_warning {
            if config.strict_weights {
                return Err(CliError::WeightValidation(format!("{}: {}", day, warning)));
            }
            warn!(day = %day, "{}", warning);
        }
        curves_by_day.insert(day, outcome.curve);
    }

    let mut store = open_store(args.store.as_deref())?;
    let curve_id = store.save_curve(NewCurveSet {
        segment_id: args.segment,
        name: args.name.clone(),
        curves_by_day,
        time_labels: history.grid.clone(),
        weeks_analyzed: weeks_spanned(&history.observations),
        date_range: history_range(&history.observations),
    });

    let saved = store.curve(curve_id)?;
    let time_labels = saved.time_labels.clone();
    let report = saved.expected_rows(range, &volumes, config.default_volume);

    let default_path = config.output_path(DEFAULT_FILE_NAME);
    let path = args.output.as_deref().unwrap_or(default_path.as_path());
    write_rows_csv(open_output(Some(path))?, &report.rows, &time_labels)?;

    info!(
        rows = report.rows.len(),
        skipped = report.skipped_dates.len(),
        total_volume = report.total_volume(),
        "expected volumes written"
    );

    if let Some(store_path) = &args.store {
        let distribution_id =
            store.save_distribution(args.segment, report.rows, time_labels, Some(curve_id))?;
        fs::write(store_path, store.to_json()?)?;
        info!(
            path = %store_path.display(),
            curve_id,
            distribution_id,
            "curve store updated"
        );
    }
    Ok(())
}

fn open_store(path: Option<&Path>) -> Result<CurveStore> {
    match path {
        Some(path) if path.exists() => Ok(CurveStore::from_json(&fs::read_to_string(path)?)?),
        _ => Ok(CurveStore::new()),
    }
}

fn history_range(observations: &[Observation]) -> Option<DateRange> {
    let first = observations.iter().map(|o| o.date()).min()?;
    let last = observations.iter().map(|o| o.date()).max()?;
    Some(DateRange::new(first, last))
}

fn weeks_spanned(observations: &[Observation]) -> Option<u32> {
    history_range(observations).map(|r| ((r.end - r.start) / 7 + 1) as u32)
}
