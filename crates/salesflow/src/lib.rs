//! # Salesflow
//!
//! Command line entry points and the cron scheduler for the daily sales
//! revenue pipeline.

#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod app;
pub mod cli;
pub mod error;
pub mod scheduler;

pub use cli::{Cli, Command};
pub use error::{AppError, AppResult};
pub use scheduler::SchedulerService;
