//! Structured logging infrastructure for salesflow

use std::path::{Path, PathBuf};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::{PipelineError, Result};

/// Configuration for the logging system
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "salesflow_pipeline=trace")
    pub level: String,
    /// Whether to enable compact machine-friendly output
    pub json_format: bool,
    /// Whether to use ANSI colors on the console
    pub colored: bool,
    /// Optional log file; rotated daily next to the given path
    pub file_path: Option<PathBuf>,
    /// Whether to log span open/close events (one per pipeline stage)
    pub include_spans: bool,
    /// Whether to include file/line information
    pub include_location: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
            colored: true,
            file_path: None,
            include_spans: true,
            include_location: false,
        }
    }
}

/// Initialize the tracing subscriber with the given configuration
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.level)
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| PipelineError::config_with_source("Invalid log filter", e))?;

    let span_events = if config.include_spans {
        FmtSpan::NEW | FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    let console = fmt::layer()
        .with_span_events(span_events.clone())
        .with_ansi(config.colored)
        .with_file(config.include_location)
        .with_line_number(config.include_location)
        .with_target(true);

    // The file layer's subscriber type differs per arm, so each arm builds its own
    let result = match (&config.file_path, config.json_format) {
        (Some(path), true) => {
            let file_layer = fmt::layer()
                .with_span_events(span_events)
                .with_ansi(false)
                .with_writer(rolling_appender(path)?)
                .json();
            registry.with(console.json()).with(file_layer).try_init()
        }
        (Some(path), false) => {
            let file_layer = fmt::layer()
                .with_span_events(span_events)
                .with_ansi(false)
                .with_writer(rolling_appender(path)?);
            registry.with(console).with(file_layer).try_init()
        }
        (None, true) => registry.with(console.json()).try_init(),
        (None, false) => registry.with(console).try_init(),
    };

    result.map_err(|e| PipelineError::config_with_source("Logging already initialized", e))
}

fn rolling_appender(path: &Path) -> Result<tracing_appender::rolling::RollingFileAppender> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    let prefix = path
        .file_name()
        .ok_or_else(|| PipelineError::config(format!("Log file path has no file name: {}", path.display())))?;

    std::fs::create_dir_all(&directory)?;
    Ok(tracing_appender::rolling::daily(directory, prefix))
}
