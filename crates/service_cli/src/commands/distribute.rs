//! Distribute command implementation
//!
//! Builds every weekday and holiday curve from history, then distributes
//! a file of dated volumes into a per-bucket CSV sheet.

use intraday_core::distribution::split_hourly_rows;
use intraday_core::export::{write_rows_csv, CurveBook, ScenarioExporter};
use std::path::Path;
use tracing::{info, warn};

use super::open_output;
use crate::config::EngineConfig;
use crate::inputs::{load_history, load_optional_holidays, load_volumes};
use crate::{CliError, Result};

/// File name used under `output_dir` when no output path is given
pub const DEFAULT_FILE_NAME: &str = "distribution.csv";

/// Run the distribute command
pub fn run(
    config: &EngineConfig,
    history: &Path,
    volumes: &Path,
    holidays: Option<&Path>,
    output: Option<&Path>,
    half_hourly: bool,
) -> Result<()> {
    info!("Distributing volumes...");
    info!("  History: {}", history.display());
    info!("  Volumes: {}", volumes.display());

    let history = load_history(history, &config.grid()?)?;
    let calendar = load_optional_holidays(holidays)?;
    let entries = load_volumes(volumes)?;

    let (book, warnings) = CurveBook::from_observations(&history.observations, &calendar);
    if config.strict_weights && !warnings.is_empty() {
        let details: Vec<String> = warnings
            .iter()
            .map(|(grouping, warning)| format!("{}: {}", grouping, warning))
            .collect();
        return Err(CliError::WeightValidation(details.join("; ")));
    }
    info!(curves = book.len(), "curves built");

    let report = ScenarioExporter::new(&book, &calendar)
        .with_grid(&history.grid)
        .build_rows(&entries);

    let (rows, grid) = if half_hourly {
        if history.grid.width_minutes() != 60 {
            warn!(
                width = history.grid.width_minutes(),
                "--half-hourly only splits hourly grids, writing rows unchanged"
            );
        }
        split_hourly_rows(&report.rows, &history.grid)?
    } else {
        (report.rows.clone(), history.grid.clone())
    };

    if rows.is_empty() && !entries.is_empty() {
        warn!(
            entries = entries.len(),
            "every date was skipped, writing the header only"
        );
    }

    let default_path = config.output_path(DEFAULT_FILE_NAME);
    let path = output.unwrap_or(default_path.as_path());
    write_rows_csv(open_output(Some(path))?, &rows, &grid)?;

    info!(
        rows = rows.len(),
        skipped = report.skipped_dates.len(),
        total_volume = report.total_volume(),
        "distribution complete"
    );
    Ok(())
}
