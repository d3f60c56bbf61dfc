//! Application-wide error types using thiserror.

use salesflow_common::PipelineError;
use tokio_cron_scheduler::JobSchedulerError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    /// Pipeline, configuration or stage error.
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// Scheduler error.
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] JobSchedulerError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the application.
pub type AppResult<T> = Result<T, AppError>;
