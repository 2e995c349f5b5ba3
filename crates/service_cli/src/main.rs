//! Intraday CLI - Command Line Operations for Demand Curves
//!
//! This is the operational entry point for the intraday curve engine.
//!
//! # Commands
//!
//! - `intraday curve --history <file> --weekday <day>` - Weighted curve of one grouping
//! - `intraday distribute --history <file> --volumes <file>` - Per-bucket volume sheet
//! - `intraday month --history <file> --year Y --month M --volume V` - Monthly to daily split
//! - `intraday expected --history <file> --from <date> --to <date>` - Expected volumes from a saved curve set
//! - `intraday check` - Show and validate the configuration
//!
//! # Architecture
//!
//! The engine in `intraday_core` is pure and synchronous; this crate owns
//! every file read and write, the configuration and the log subscriber.

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod commands;
mod config;
mod error;
mod inputs;

pub use error::{CliError, Result};

use commands::expected::ExpectedArgs;
use config::{EngineConfig, LogLevel};

/// Intraday demand-curve weighting and volume distribution CLI
#[derive(Parser)]
#[command(name = "intraday")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "intraday.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the weighted curve of one grouping
    #[command(group(
        ArgGroup::new("grouping")
            .required(true)
            .args(["weekday", "holiday", "date"])
    ))]
    Curve {
        /// History file (JSON)
        #[arg(long)]
        history: PathBuf,

        /// Weekday grouping (e.g. Monday, mon, lunes, 0)
        #[arg(long)]
        weekday: Option<String>,

        /// Holiday grouping by name
        #[arg(long)]
        holiday: Option<String>,

        /// Specific-date grouping
        #[arg(long)]
        date: Option<String>,

        /// Holiday calendar (CSV)
        #[arg(long)]
        holidays: Option<PathBuf>,

        /// Flag outliers and propose weights before weighting
        #[arg(long)]
        analyse: bool,

        /// Output file (CSV); stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Distribute dated volumes over the history curves
    Distribute {
        /// History file (JSON)
        #[arg(long)]
        history: PathBuf,

        /// Volumes file (CSV: date,volume[,type])
        #[arg(long)]
        volumes: PathBuf,

        /// Holiday calendar (CSV)
        #[arg(long)]
        holidays: Option<PathBuf>,

        /// Output file (CSV); defaults to the configured output directory
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Split hourly rows into half-hour buckets
        #[arg(long)]
        half_hourly: bool,
    },

    /// Split a monthly volume into days
    Month {
        /// Daily history file (CSV: date,volume)
        #[arg(long)]
        history: PathBuf,

        /// Target year
        #[arg(long)]
        year: i32,

        /// Target month (1-12)
        #[arg(long)]
        month: u32,

        /// Total volume for the month
        #[arg(long)]
        volume: u64,

        /// Holiday calendar (CSV)
        #[arg(long)]
        holidays: Option<PathBuf>,

        /// Output file (CSV); stdout when omitted
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Save weekday curves and write expected volumes for a date range
    Expected(ExpectedArgs),

    /// Show and validate the configuration
    Check,
}

fn load_config(path: &Path, validate: bool) -> anyhow::Result<EngineConfig> {
    let config = if validate {
        EngineConfig::load_with_env_and_validate(path)
    } else {
        EngineConfig::load_or_default(path).and_then(EngineConfig::with_env_override)
    };
    config.with_context(|| format!("loading configuration from {}", path.display()))
}

fn init_tracing(level: LogLevel, verbose: bool) {
    let default = match (verbose, level) {
        (true, LogLevel::Trace) => LogLevel::Trace,
        (true, _) => LogLevel::Debug,
        (false, level) => level,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default.as_filter_str()));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let is_check = matches!(cli.command, Commands::Check);
    let config = load_config(&cli.config, !is_check)?;

    init_tracing(config.log_level, cli.verbose);

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    match cli.command {
        Commands::Curve {
            history,
            weekday,
            holiday,
            date,
            holidays,
            analyse,
            output,
        } => {
            let grouping = commands::curve::grouping_from_args(
                weekday.as_deref(),
                holiday.as_deref(),
                date.as_deref(),
            )?;
            commands::curve::run(
                &config,
                &history,
                holidays.as_deref(),
                &grouping,
                analyse,
                output.as_deref(),
            )?
        }
        Commands::Distribute {
            history,
            volumes,
            holidays,
            output,
            half_hourly,
        } => commands::distribute::run(
            &config,
            &history,
            &volumes,
            holidays.as_deref(),
            output.as_deref(),
            half_hourly,
        )?,
        Commands::Month {
            history,
            year,
            month,
            volume,
            holidays,
            output,
        } => commands::month::run(
            &history,
            year,
            month,
            volume,
            holidays.as_deref(),
            output.as_deref(),
        )?,
        Commands::Expected(args) => commands::expected::run(&config, &args)?,
        Commands::Check => commands::check::run(&config, &cli.config)?,
    }
    Ok(())
}
