//! Month command implementation
//!
//! Splits a monthly volume into days using day-of-month history.

use intraday_core::distribution::{daily_weights_from_history, distribute_month};
use intraday_core::export::write_daily_csv;
use std::path::Path;
use tracing::{info, warn};

use super::open_output;
use crate::inputs::{load_daily_history, load_optional_holidays};
use crate::Result;

/// Run the month command
pub fn run(
    history: &Path,
    year: i32,
    month: u32,
    volume: u64,
    holidays: Option<&Path>,
    output: Option<&Path>,
) -> Result<()> {
    info!("Splitting {} over {}-{:02}", volume, year, month);

    let history = load_daily_history(history)?;
    let calendar = load_optional_holidays(holidays)?;

    let weights = daily_weights_from_history(&history, month);
    if weights.is_empty() {
        warn!(month, "no history for this month, splitting evenly");
    }

    let days = distribute_month(year, month, volume, &weights, &calendar)?;
    write_daily_csv(open_output(output)?, &days)?;

    info!(
        days = days.len(),
        holidays = days.iter().filter(|d| d.is_holiday).count(),
        "month split complete"
    );
    Ok(())
}
