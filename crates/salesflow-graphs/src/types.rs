//! Chart description and styling types

use serde::{Deserialize, Serialize};

/// Everything needed to draw the daily revenue chart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChartSpec {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub x_label: String,
    pub y_label: String,
    pub style: StyleConfig,
}

impl Default for ChartSpec {
    fn default() -> Self {
        Self {
            title: "Daily Revenue Analysis".to_string(),
            width: 1200,
            height: 600,
            x_label: "Date".to_string(),
            y_label: "Revenue ($)".to_string(),
            style: StyleConfig::default(),
        }
    }
}

/// Font configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FontConfig {
    pub family: String,
    pub size: u32,
}

impl Default for FontConfig {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 16,
        }
    }
}

/// Margin configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarginConfig {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Default for MarginConfig {
    fn default() -> Self {
        // Bottom leaves room for vertical date labels
        Self {
            top: 20,
            right: 30,
            bottom: 110,
            left: 90,
        }
    }
}

/// Line, marker and grid styling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StyleConfig {
    pub background_color: Option<String>,
    pub line_color: String,
    pub line_width: u32,
    pub marker_size: u32,
    pub title_font: FontConfig,
    pub axis_font: FontConfig,
    pub margins: MarginConfig,
    pub show_grid: bool,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            background_color: Some("#FFFFFF".to_string()),
            line_color: "#2E86AB".to_string(),
            line_width: 2,
            marker_size: 6,
            title_font: FontConfig {
                family: "sans-serif".to_string(),
                size: 28,
            },
            axis_font: FontConfig::default(),
            margins: MarginConfig::default(),
            show_grid: true,
        }
    }
}
