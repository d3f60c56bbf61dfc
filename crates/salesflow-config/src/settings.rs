//! Application configuration structures

use salesflow_common::{default_seed_records, SalesRecord};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::{Validate, ValidationErrors};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Sales database connection and table
    pub database: DatabaseConfig,

    /// Where the pipeline writes its artifacts
    pub output: OutputConfig,

    /// Chart rendering settings
    pub chart: ChartConfig,

    /// Email delivery settings
    pub notification: NotificationConfig,

    /// Scheduling and retry settings
    pub scheduling: SchedulingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Rows inserted on every table reset
    pub seed_records: Vec<SalesRecord>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Database connection URL
    #[validate(length(min = 1, message = "Database URL cannot be empty"))]
    pub url: String,

    /// Maximum number of database connections in the pool
    #[validate(range(min = 1, max = 100, message = "Max connections must be between 1 and 100"))]
    pub max_connections: u32,

    /// Name of the sales table, interpolated into SQL so restricted to identifiers
    #[validate(regex(path = "crate::validation::IDENTIFIER_REGEX", message = "Table name must be a plain SQL identifier"))]
    pub table_name: String,
}

/// Output locations. Relative file names resolve against `output_dir`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct OutputConfig {
    /// Base directory for every artifact
    pub output_dir: PathBuf,

    /// Aggregated daily revenue CSV
    #[validate(custom(function = "crate::validation::validate_file_path", message = "Invalid aggregated file path"))]
    pub aggregated_file: String,

    /// Text report, overwritten each run
    #[validate(custom(function = "crate::validation::validate_file_path", message = "Invalid report file path"))]
    pub report_file: String,

    /// Directory that accumulates chart images
    #[validate(custom(function = "crate::validation::validate_file_path", message = "Invalid chart directory"))]
    pub chart_dir: String,
}

/// Chart rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct ChartConfig {
    /// Chart width in pixels
    #[validate(range(min = 100, max = 4000, message = "Width must be between 100 and 4000 pixels"))]
    pub width: u32,

    /// Chart height in pixels
    #[validate(range(min = 100, max = 4000, message = "Height must be between 100 and 4000 pixels"))]
    pub height: u32,

    /// Background color (hex format)
    #[validate(regex(path = "crate::validation::HEX_COLOR_REGEX", message = "Background color must be valid hex color"))]
    pub background_color: String,

    /// Color of the revenue line and markers (hex format)
    #[validate(regex(path = "crate::validation::HEX_COLOR_REGEX", message = "Line color must be valid hex color"))]
    pub line_color: String,

    /// Font family for text rendering
    #[validate(length(min = 1, message = "Font family cannot be empty"))]
    pub font_family: String,

    /// Title font size
    #[validate(range(min = 8, max = 72, message = "Title font size must be between 8 and 72"))]
    pub title_font_size: u32,

    /// Axis label font size
    #[validate(range(min = 8, max = 72, message = "Axis font size must be between 8 and 72"))]
    pub axis_font_size: u32,

    /// Marker radius in pixels
    #[validate(range(min = 1, max = 30, message = "Marker size must be between 1 and 30"))]
    pub marker_size: u32,

    /// Whether to show grid lines
    pub show_grid: bool,
}

/// How outgoing mail is delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MailTransportKind {
    /// SMTP relay
    Smtp,
    /// Write `.eml` files into `file_dir`
    File,
}

/// Email notification configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct NotificationConfig {
    /// Recipient of the daily report
    #[validate(email(message = "Recipient must be a valid email address"))]
    pub recipient: String,

    /// Sender mailbox, e.g. `Salesflow <salesflow@example.com>`
    #[validate(custom(function = "crate::validation::validate_mailbox", message = "Sender must be a valid mailbox"))]
    pub from: String,

    /// Subject line; `{date}` is replaced by the run date
    #[validate(length(min = 1, message = "Subject cannot be empty"))]
    pub subject_template: String,

    /// HTML body of the message
    pub html_body: String,

    /// Delivery mechanism
    pub transport: MailTransportKind,

    /// SMTP relay settings, used when `transport` is `smtp`
    pub smtp: SmtpConfig,

    /// Output directory for the file transport
    pub file_dir: PathBuf,
}

/// SMTP relay settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SmtpConfig {
    /// Relay host name
    #[validate(length(min = 1, message = "SMTP host cannot be empty"))]
    pub host: String,

    /// Relay port
    #[validate(range(min = 1, message = "SMTP port cannot be 0"))]
    pub port: u16,

    /// Optional login user
    pub username: Option<String>,

    /// Optional login password
    pub password: Option<String>,

    /// Upgrade the connection with STARTTLS
    pub starttls: bool,
}

/// Scheduling configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct SchedulingConfig {
    /// Whether `serve` registers the daily job
    pub enabled: bool,

    /// Six-field cron expression (sec min hour day month weekday)
    pub cron: String,

    /// Extra attempts for a failed stage
    #[validate(range(max = 10, message = "Retries cannot exceed 10"))]
    pub retries: u32,

    /// Delay between attempts of a failed stage
    #[validate(range(max = 86400, message = "Retry delay cannot exceed one day"))]
    pub retry_delay_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[validate(custom(function = "crate::validation::validate_log_level", message = "Log level must be one of: trace, debug, info, warn, error"))]
    pub level: String,

    /// Optional log file path, rotated daily
    pub file: Option<PathBuf>,

    /// Whether to use colored output (for console logging)
    pub colored: bool,

    /// Whether to include file/line information in logs
    pub include_location: bool,

    /// Compact JSON lines instead of human readable output
    pub json: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://salesflow.db?mode=rwc".to_string(),
            max_connections: 5,
            table_name: "sales".to_string(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("data"),
            aggregated_file: "daily_revenue.csv".to_string(),
            report_file: "revenue_report.txt".to_string(),
            chart_dir: "revenue_plots".to_string(),
        }
    }
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 1200,
            height: 600,
            background_color: "#FFFFFF".to_string(),
            line_color: "#2E86AB".to_string(),
            font_family: "sans-serif".to_string(),
            title_font_size: 28,
            axis_font_size: 16,
            marker_size: 6,
            show_grid: true,
        }
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            recipient: "reports@example.com".to_string(),
            from: "Salesflow <salesflow@example.com>".to_string(),
            subject_template: "📊 Daily Sales Revenue Report".to_string(),
            html_body: "<h3>Attached are today's sales revenue results.</h3>".to_string(),
            transport: MailTransportKind::File,
            smtp: SmtpConfig::default(),
            file_dir: PathBuf::from("data/outbox"),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            username: None,
            password: None,
            starttls: true,
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cron: "0 0 0 * * *".to_string(),
            retries: 1,
            retry_delay_seconds: 300,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            colored: true,
            include_location: false,
            json: false,
        }
    }
}

impl From<&LoggingConfig> for salesflow_common::LoggingConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            level: config.level.clone(),
            json_format: config.json,
            colored: config.colored,
            file_path: config.file.clone(),
            include_location: config.include_location,
            ..Self::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: DatabaseConfig::default(),
            output: OutputConfig::default(),
            chart: ChartConfig::default(),
            notification: NotificationConfig::default(),
            scheduling: SchedulingConfig::default(),
            logging: LoggingConfig::default(),
            seed_records: default_seed_records(),
        }
    }
}

impl SchedulingConfig {
    /// Custom validation for scheduling configuration
    pub fn validate_scheduling(&self) -> Result<(), ValidationErrors> {
        self.validate()?;

        let mut errors = ValidationErrors::new();
        if let Err(err) = crate::validation::validate_cron_expression(&self.cron) {
            errors.add("cron", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Config {
    /// Comprehensive validation of the entire configuration
    pub fn validate_all(&self) -> Result<(), ValidationErrors> {
        self.database.validate()?;
        self.output.validate()?;
        self.chart.validate()?;
        self.notification.validate()?;
        if self.notification.transport == MailTransportKind::Smtp {
            self.notification.smtp.validate()?;
        }
        self.scheduling.validate_scheduling()?;
        self.logging.validate()?;
        crate::validation::validate_seed_records(&self.seed_records)?;
        Ok(())
    }

    /// The explicit settings every pipeline stage receives
    pub fn pipeline_settings(&self) -> PipelineSettings {
        let output_dir = self.output.output_dir.clone();
        PipelineSettings {
            seed_records: self.seed_records.clone(),
            table_name: self.database.table_name.clone(),
            aggregated_file: resolve(&output_dir, &self.output.aggregated_file),
            report_path: resolve(&output_dir, &self.output.report_file),
            chart_dir: resolve(&output_dir, &self.output.chart_dir),
            output_dir,
            recipient: self.notification.recipient.clone(),
            subject_template: self.notification.subject_template.clone(),
            html_body: self.notification.html_body.clone(),
        }
    }
}

fn resolve(base: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Resolved, run-invariant inputs shared by the pipeline stages.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineSettings {
    pub seed_records: Vec<SalesRecord>,
    pub table_name: String,
    pub output_dir: PathBuf,
    pub aggregated_file: PathBuf,
    pub report_path: PathBuf,
    pub chart_dir: PathBuf,
    pub recipient: String,
    pub subject_template: String,
    pub html_body: String,
}

impl PipelineSettings {
    /// Render the subject line for a run on `date` (formatted `YYYY-MM-DD`)
    pub fn subject_for(&self, date: &str) -> String {
        self.subject_template.replace("{date}", date)
    }
}
