//! # Salesflow Common
//!
//! Shared types, errors, logging and utilities for the salesflow pipeline.
//!
//! Every other crate in the workspace builds on the domain types defined
//! here: [`SalesRecord`], [`DailyRevenue`] and the exact money type
//! [`Amount`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod macros;
pub mod types;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

// Re-export commonly used types
pub use error::{PipelineError, Result};
pub use logging::{init_logging, LoggingConfig};
pub use types::*;
pub use utils::*;
