//! Engine configuration for the intraday CLI.
//!
//! Loaded from a TOML file, then overridden from the environment:
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `INTRADAY_BUCKET_MINUTES` | `bucket_minutes` | `30` |
//! | `INTRADAY_DEFAULT_VOLUME` | `default_volume` | `1000` |
//! | `INTRADAY_LOG_LEVEL` | `log_level` | `info` |
//! | `INTRADAY_STRICT_WEIGHTS` | `strict_weights` | `false` |
//! | `INTRADAY_OUTPUT_DIR` | `output_dir` | `./output` |

use intraday_core::store::DEFAULT_DAILY_VOLUME;
use intraday_core::types::{BucketGrid, MINUTES_PER_DAY};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// Log level for the subscriber's default filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Trace level (most verbose)
    Trace,
    /// Debug level
    Debug,
    /// Info level (default)
    #[default]
    Info,
    /// Warning level
    Warn,
    /// Error level (least verbose)
    Error,
}

impl LogLevel {
    /// Filter directive for `tracing_subscriber::EnvFilter`
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            _ => Err(ConfigError::InvalidValue {
                field: "log_level".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_filter_str())
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Width of the time buckets history counts are folded onto
    #[serde(default = "default_bucket_minutes")]
    pub bucket_minutes: u32,

    /// Daily volume for dates without an explicit one
    #[serde(default = "default_volume")]
    pub default_volume: u64,

    /// Default log level (`RUST_LOG` still wins)
    #[serde(default)]
    pub log_level: LogLevel,

    /// Treat weight totals other than 100% as errors
    #[serde(default)]
    pub strict_weights: bool,

    /// Directory for exports written without an explicit path
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_bucket_minutes() -> u32 {
    BucketGrid::DEFAULT_WIDTH_MINUTES
}

fn default_volume() -> u64 {
    DEFAULT_DAILY_VOLUME
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./output")
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            bucket_minutes: default_bucket_minutes(),
            default_volume: default_volume(),
            log_level: LogLevel::default(),
            strict_weights: false,
            output_dir: default_output_dir(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io(e.to_string()))?;
        toml::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load from `path` if it exists, otherwise start from defaults
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            debug!(path = %path.display(), "config file not found, using defaults");
            Ok(Self::default())
        }
    }

    /// Apply `INTRADAY_*` environment overrides
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        if let Some(value) = env_var("INTRADAY_BUCKET_MINUTES") {
            self.bucket_minutes = parse_env("bucket_minutes", &value)?;
        }
        if let Some(value) = env_var("INTRADAY_DEFAULT_VOLUME") {
            self.default_volume = parse_env("default_volume", &value)?;
        }
        if let Some(value) = env_var("INTRADAY_LOG_LEVEL") {
            self.log_level = value.parse()?;
        }
        if let Some(value) = env_var("INTRADAY_STRICT_WEIGHTS") {
            self.strict_weights = parse_env("strict_weights", &value.to_lowercase())?;
        }
        if let Some(value) = env_var("INTRADAY_OUTPUT_DIR") {
            self.output_dir = PathBuf::from(value);
        }
        Ok(self)
    }

    /// Validate the configuration, reporting every problem at once
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.bucket_minutes == 0 || MINUTES_PER_DAY % self.bucket_minutes != 0 {
            errors.push(format!(
                "bucket_minutes must divide {} evenly, got {}",
                MINUTES_PER_DAY, self.bucket_minutes
            ));
        }
        if self.bucket_minutes > 60 {
            errors.push(format!(
                "bucket_minutes must be at most 60, got {}",
                self.bucket_minutes
            ));
        }
        if self.default_volume == 0 {
            errors.push("default_volume must be greater than 0".to_string());
        }
        if self.output_dir.as_os_str().is_empty() {
            errors.push("output_dir must not be empty".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Load, apply environment overrides and validate
    pub fn load_with_env_and_validate(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config = Self::load_or_default(path)?.with_env_override()?;
        config.validate()?;
        Ok(config)
    }

    /// Grid history counts are folded onto
    pub fn grid(&self) -> Result<BucketGrid, ConfigError> {
        BucketGrid::full_day(self.bucket_minutes).map_err(|e| ConfigError::InvalidValue {
            field: "bucket_minutes".to_string(),
            value: e.to_string(),
        })
    }

    /// Default location for an export named `file_name`
    pub fn output_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }
}

fn env_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(field: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        field: field.to_string(),
        value: value.to_string(),
    })
}

/// Configuration error
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// File could not be read
    Io(String),
    /// TOML could not be parsed
    Parse(String),
    /// A single value could not be interpreted
    InvalidValue {
        /// Field name
        field: String,
        /// Rejected value
        value: String,
    },
    /// One or more validation rules failed
    Validation(Vec<String>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value for {}: '{}'", field, value)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation errors: {}", errors.join("; "))
            }
        }
    }
}

impl std::error::Error for ConfigError {}
