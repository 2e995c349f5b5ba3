//! Error types for the intraday CLI.

use intraday_core::types::{
    BucketError, CurveError, DateError, DistributionError, EngineError, ExportError, StoreError,
};
use thiserror::Error;

use crate::config::ConfigError;

/// CLI error type
#[derive(Debug, Error)]
pub enum CliError {
    /// Input file does not exist
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Command-line argument rejected
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Input file could not be read as expected
    #[error("Invalid input in {path}: {message}")]
    Input {
        /// File being read
        path: String,
        /// What was wrong
        message: String,
    },

    /// Weight totals other than 100% while strict weights are on
    #[error("Weight validation failed: {0}")]
    WeightValidation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Engine error
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Create an input error for `path`
    pub fn input(path: impl Into<String>, message: impl std::fmt::Display) -> Self {
        Self::Input {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Create an invalid-argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

macro_rules! engine_error_from {
    ($($source:ty),* $(,)?) => {
        $(
            impl From<$source> for CliError {
                fn from(err: $source) -> Self {
                    CliError::Engine(EngineError::from(err))
                }
            }
        )*
    };
}

engine_error_from!(
    DateError,
    BucketError,
    CurveError,
    DistributionError,
    ExportError,
    StoreError,
);

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
