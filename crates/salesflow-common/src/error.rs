//! Error types and utilities for salesflow

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for salesflow operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for pipeline operations
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database related errors
    #[error("Database error: {message}")]
    Database {
        /// Error message
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Tabular data errors (CSV encoding, malformed rows, bad values)
    #[error("Data error: {message}")]
    Data {
        /// Error message
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Chart rendering errors
    #[error("Graph error: {message}")]
    Graph {
        /// Error message
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Mail composition or delivery errors
    #[error("Mail error: {message}")]
    Mail {
        /// Error message
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error message
        message: String,
        /// Field that failed validation, if known
        field: Option<String>,
    },

    /// An artifact a stage depends on does not exist
    #[error("Missing {kind}: nothing found at {}", location.display())]
    MissingArtifact {
        /// What was expected, e.g. "revenue chart"
        kind: String,
        /// Where it was looked for
        location: PathBuf,
    },

    /// A pipeline stage failed after exhausting its retries
    #[error("Stage '{stage}' failed after {attempts} attempt(s): {source}")]
    Stage {
        /// Stage name, e.g. `visualize_revenue`
        stage: String,
        /// Attempts made, including the first
        attempts: u32,
        /// Error of the last attempt
        #[source]
        source: Box<PipelineError>,
    },

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        /// Error message
        message: String,
        /// Underlying cause, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PipelineError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new generic error with a custom message and source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generic {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new database error with source
    pub fn database_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Database {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new data error
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new data error with source
    pub fn data_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Data {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new graph error
    pub fn graph(msg: impl Into<String>) -> Self {
        Self::Graph {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new graph error with source
    pub fn graph_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Graph {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new mail error
    pub fn mail(msg: impl Into<String>) -> Self {
        Self::Mail {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new mail error with source
    pub fn mail_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Mail {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: None,
        }
    }

    /// Create a new validation error with field name
    pub fn validation_field(msg: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
            field: Some(field.into()),
        }
    }

    /// Create a missing-artifact error
    pub fn missing_artifact(kind: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self::MissingArtifact {
            kind: kind.into(),
            location: location.into(),
        }
    }

    /// Wrap the final error of a stage together with its attempt count
    pub fn stage(stage: impl Into<String>, attempts: u32, source: PipelineError) -> Self {
        Self::Stage {
            stage: stage.into(),
            attempts,
            source: Box::new(source),
        }
    }

    /// Name of the failed stage, if this error came out of the stage runner
    pub fn failed_stage(&self) -> Option<&str> {
        match self {
            Self::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

// Error conversion implementations for external types

/// Convert from csv::Error to PipelineError
impl From<csv::Error> for PipelineError {
    fn from(err: csv::Error) -> Self {
        if err.is_io_error() {
            Self::data_with_source("CSV I/O failure", err)
        } else {
            let line = err
                .position()
                .map(|pos| format!(" at line {}", pos.line()))
                .unwrap_or_default();
            Self::data_with_source(format!("Malformed CSV{line}"), err)
        }
    }
}

#[cfg(feature = "database")]
/// Convert from sqlx::Error to PipelineError
impl From<sqlx::Error> for PipelineError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => Self::database_with_source("Connection pool timed out", err),
            sqlx::Error::RowNotFound => Self::database_with_source("Row not found", err),
            _ => Self::database_with_source("Query failed", err),
        }
    }
}

#[cfg(feature = "plotters")]
/// Convert from plotters drawing errors to PipelineError
impl<T> From<plotters::drawing::DrawingAreaErrorKind<T>> for PipelineError
where
    T: std::error::Error + Send + Sync + 'static,
{
    fn from(err: plotters::drawing::DrawingAreaErrorKind<T>) -> Self {
        Self::graph_with_source("Graph rendering failed", err)
    }
}
