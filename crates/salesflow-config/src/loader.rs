//! Configuration loading utilities

use crate::{Config, MailTransportKind};
use salesflow_common::Result as PipelineResult;
use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "SALESFLOW_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    ParseError(#[from] serde_yaml::Error),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {source}")]
    EnvParseError {
        var: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl From<ConfigError> for salesflow_common::PipelineError {
    fn from(err: ConfigError) -> Self {
        salesflow_common::PipelineError::config_with_source(err.to_string(), err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: Config = serde_yaml::from_str(&content)?;

        Self::apply_env_overrides(&mut config)?;
        config.validate_all()?;

        info!("Loaded configuration from {}", path.as_ref().display());
        Ok(config)
    }

    /// Load configuration from the first available source:
    /// `SALESFLOW_CONFIG_PATH`, `salesflow.yaml`, `salesflow.yml`, then defaults.
    pub fn load() -> PipelineResult<Config> {
        let config = match Self::discover() {
            Some(path) => Self::load_config(&path)?,
            None => {
                debug!("No configuration file found, using defaults");
                let mut config = Config::default();
                Self::apply_env_overrides(&mut config)?;
                config.validate_all().map_err(ConfigError::ValidationError)?;
                config
            }
        };

        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Config> {
        Ok(Self::load_config(path)?)
    }

    fn discover() -> Option<PathBuf> {
        if let Ok(path) = env::var(CONFIG_PATH_ENV) {
            return Some(PathBuf::from(path));
        }
        ["salesflow.yaml", "salesflow.yml"]
            .into_iter()
            .map(PathBuf::from)
            .find(|candidate| candidate.exists())
    }

    /// Apply process environment overrides to configuration
    fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides(config, |key| env::var(key).ok())
    }

    /// Apply overrides from an arbitrary variable source
    pub fn apply_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Database
        if let Some(url) = lookup("DATABASE_URL") {
            config.database.url = url;
        }
        if let Some(table) = lookup("SALESFLOW_TABLE") {
            config.database.table_name = table;
        }

        // Output
        if let Some(dir) = lookup("SALESFLOW_OUTPUT_DIR") {
            config.output.output_dir = PathBuf::from(dir);
        }

        // Notification
        if let Some(recipient) = lookup("SALESFLOW_RECIPIENT") {
            config.notification.recipient = recipient;
        }
        if let Some(transport) = lookup("SALESFLOW_MAIL_TRANSPORT") {
            config.notification.transport = match transport.to_ascii_lowercase().as_str() {
                "smtp" => MailTransportKind::Smtp,
                "file" => MailTransportKind::File,
                other => {
                    return Err(ConfigError::EnvParseError {
                        var: "SALESFLOW_MAIL_TRANSPORT".to_string(),
                        source: format!("unknown transport '{other}', expected smtp or file").into(),
                    })
                }
            };
        }
        if let Some(host) = lookup("SMTP_HOST") {
            config.notification.smtp.host = host;
        }
        if let Some(port) = lookup("SMTP_PORT") {
            config.notification.smtp.port = parse_var("SMTP_PORT", &port)?;
        }
        if let Some(username) = lookup("SMTP_USERNAME") {
            config.notification.smtp.username = Some(username);
        }
        if let Some(password) = lookup("SMTP_PASSWORD") {
            config.notification.smtp.password = Some(password);
        }

        // Scheduling
        if let Some(cron) = lookup("SALESFLOW_CRON") {
            config.scheduling.cron = cron;
        }
        if let Some(retries) = lookup("SALESFLOW_RETRIES") {
            config.scheduling.retries = parse_var("SALESFLOW_RETRIES", &retries)?;
        }
        if let Some(delay) = lookup("SALESFLOW_RETRY_DELAY") {
            config.scheduling.retry_delay_seconds = parse_var("SALESFLOW_RETRY_DELAY", &delay)?;
        }

        // Logging
        if let Some(level) = lookup("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Some(file) = lookup("LOG_FILE") {
            config.logging.file = Some(PathBuf::from(file));
        }

        Ok(())
    }
}

fn parse_var<T>(var: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::EnvParseError {
        var: var.to_string(),
        source: Box::new(e),
    })
}
