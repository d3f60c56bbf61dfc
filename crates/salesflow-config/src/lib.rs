//! Configuration management for the salesflow pipeline

pub mod loader;
pub mod settings;
pub mod validation;

pub use loader::{ConfigError, ConfigLoader, CONFIG_PATH_ENV};
pub use settings::{
    ChartConfig, Config, DatabaseConfig, LoggingConfig, MailTransportKind, NotificationConfig,
    OutputConfig, PipelineSettings, SchedulingConfig, SmtpConfig,
};
