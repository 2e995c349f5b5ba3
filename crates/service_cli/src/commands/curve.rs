//! Curve command implementation
//!
//! Computes the weighted curve of one grouping and prints it as CSV.

use intraday_core::curves::{analyse_group, compute_curve};
use intraday_core::export::write_curve_csv;
use intraday_core::grouping::{select_group, Grouping};
use intraday_core::types::{Date, Weekday};
use std::path::Path;
use tracing::{info, warn};

use super::open_output;
use crate::config::EngineConfig;
use crate::inputs::{load_history, load_optional_holidays};
use crate::{CliError, Result};

/// Build the grouping named by exactly one of the selector flags.
pub fn grouping_from_args(
    weekday: Option<&str>,
    holiday: Option<&str>,
    date: Option<&str>,
) -> Result<Grouping> {
    match (weekday, holiday, date) {
        (Some(day), None, None) => {
            let day: Weekday = day.parse().map_err(CliError::InvalidArgument)?;
            Ok(Grouping::Weekday(day))
        }
        (None, Some(name), None) if !name.trim().is_empty() => {
            Ok(Grouping::Holiday(name.trim().to_string()))
        }
        (None, None, Some(date)) => Ok(Grouping::SpecificDate(Date::normalise(date)?)),
        _ => Err(CliError::invalid_argument(
            "give exactly one of --weekday, --holiday or --date",
        )),
    }
}

/// Run the curve command
pub fn run(
    config: &EngineConfig,
    history: &Path,
    holidays: Option<&Path>,
    grouping: &Grouping,
    analyse: bool,
    output: Option<&Path>,
) -> Result<()> {
    info!("Computing curve for {}", grouping);

    let history = load_history(history, &config.grid()?)?;
    let calendar = load_optional_holidays(holidays)?;

    let mut group = select_group(&history.observations, grouping, &calendar);
    if group.is_empty() {
        warn!(grouping = %grouping, "no history instances match");
    }

    if analyse {
        group = analyse_group(&group)?;
        for instance in group.iter().filter(|o| o.is_outlier()) {
            info!(date = %instance.date(), "flagged as outlier");
        }
        for instance in &group {
            info!(date = %instance.date(), weight = instance.weight().get(), "proposed weight");
        }
    }

    let outcome = compute_curve(&group);
    info!(
        instances = group.len(),
        active = outcome.active_count,
        rejected_records = history.rejected,
        "curve computed"
    );

    if let Some(warning) = outcome.weight_warning {
        if config.strict_weights {
            return Err(CliError::WeightValidation(format!("{}: {}", grouping, warning)));
        }
        warn!(grouping = %grouping, "{}", warning);
    }

    write_curve_csv(open_output(output)?, &outcome.curve, &history.grid)?;
    Ok(())
}
