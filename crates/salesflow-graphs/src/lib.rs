//! Revenue chart rendering and chart artifact bookkeeping for salesflow

pub mod registry;
pub mod renderer;
pub mod types;

pub use registry::{ChartArtifact, ChartRegistry};
pub use renderer::{ChartRenderer, RevenueChartRenderer};
pub use types::*;
