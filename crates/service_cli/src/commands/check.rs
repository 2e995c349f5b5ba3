//! Check command implementation
//!
//! Prints the effective configuration and validates it.

use std::path::Path;
use tracing::{error, info};

use crate::config::{ConfigError, EngineConfig};
use crate::{CliError, Result};

/// Run the check command
pub fn run(config: &EngineConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        info!("Configuration file: {}", config_path.display());
    } else {
        info!(
            "Configuration file {} not found, using defaults",
            config_path.display()
        );
    }

    let rendered = toml::to_string_pretty(config)
        .map_err(|e| CliError::Config(ConfigError::Parse(e.to_string())))?;
    println!("{}", rendered);

    match config.validate() {
        Ok(()) => {
            info!("Configuration OK");
            Ok(())
        }
        Err(ConfigError::Validation(errors)) => {
            for problem in &errors {
                error!("  {}", problem);
            }
            Err(ConfigError::Validation(errors).into())
        }
        Err(other) => Err(other.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_default_config() {
        let result = run(&EngineConfig::default(), Path::new("/nonexistent/intraday.toml"));
        assert!(result.is_ok());
    }

    #[test]
    fn test_check_reports_invalid_config() {
        let config = EngineConfig {
            bucket_minutes: 0,
            ..EngineConfig::default()
        };
        let result = run(&config, Path::new("/nonexistent/intraday.toml"));
        assert!(matches!(
            result,
            Err(CliError::Config(ConfigError::Validation(_)))
        ));
    }
}
