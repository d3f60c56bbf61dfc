//! Chart rendering trait and the plotters implementation

use crate::ChartSpec;
use chrono::{Duration, NaiveDate};
use plotters::prelude::*;
use plotters::style::FontTransform;
use salesflow_common::{bail, DailyRevenue, Result};
use std::path::Path;

/// Trait for rendering the revenue time series to an image
#[async_trait::async_trait]
pub trait ChartRenderer: Send + Sync {
    /// Render a chart of `data` to `path`, replacing whatever is there
    async fn render_to_file(&self, spec: &ChartSpec, data: &[DailyRevenue], path: &Path) -> Result<()>;

    /// Parse a color string (hex format) to RGBColor
    fn parse_color(&self, color_str: &str) -> RGBColor {
        if let Some(hex) = color_str.strip_prefix('#') {
            if hex.len() == 6 {
                if let (Ok(r), Ok(g), Ok(b)) = (
                    u8::from_str_radix(&hex[0..2], 16),
                    u8::from_str_radix(&hex[2..4], 16),
                    u8::from_str_radix(&hex[4..6], 16),
                ) {
                    return RGBColor(r, g, b);
                }
            }
        }
        // Default to black if parsing fails
        RGBColor(0, 0, 0)
    }

    /// Get background color from the chart spec
    fn background_color(&self, spec: &ChartSpec) -> RGBColor {
        spec.style
            .background_color
            .as_ref()
            .map(|color| self.parse_color(color))
            .unwrap_or(RGBColor(255, 255, 255))
    }
}

/// Line chart with one marker per day, drawn with the bitmap backend
pub struct RevenueChartRenderer;

impl RevenueChartRenderer {
    pub fn new() -> Self {
        Self
    }

    /// X coordinates are day offsets from the first date so gaps stay proportional
    fn to_points(data: &[DailyRevenue]) -> Option<(NaiveDate, Vec<(i64, f64)>)> {
        let first = data.iter().map(|row| row.order_date).min()?;
        let points = data
            .iter()
            .map(|row| {
                let offset = (row.order_date - first).num_days();
                (offset, row.daily_revenue.as_f64())
            })
            .collect();
        Some((first, points))
    }

    /// Calculate padded axis ranges for the plotted points
    fn calculate_data_ranges(points: &[(i64, f64)]) -> (i64, i64, f64, f64) {
        if points.is_empty() {
            return (0, 1, 0.0, 1.0);
        }

        let x_max = points.iter().map(|(x, _)| *x).max().unwrap_or(0);
        let mut y_min = f64::INFINITY;
        let mut y_max = f64::NEG_INFINITY;
        for (_, y) in points {
            y_min = y_min.min(*y);
            y_max = y_max.max(*y);
        }

        // Flat series still need a visible band
        let spread = if y_max > y_min { y_max - y_min } else { y_max.abs().max(1.0) };
        let y_padding = spread * 0.1;

        (-1, x_max + 1, y_min - y_padding, y_max + y_padding)
    }
}

#[async_trait::async_trait]
impl ChartRenderer for RevenueChartRenderer {
    async fn render_to_file(&self, spec: &ChartSpec, data: &[DailyRevenue], path: &Path) -> Result<()> {
        let Some((first_date, points)) = Self::to_points(data) else {
            bail!("No revenue rows to plot");
        };

        let root = BitMapBackend::new(path, (spec.width, spec.height)).into_drawing_area();
        root.fill(&self.background_color(spec))?;

        let (x_min, x_max, y_min, y_max) = Self::calculate_data_ranges(&points);
        let style = &spec.style;

        let title_font = (style.title_font.family.as_str(), style.title_font.size);
        let mut chart = ChartBuilder::on(&root)
            .caption(&spec.title, title_font)
            .margin_top(style.margins.top)
            .margin_right(style.margins.right)
            .x_label_area_size(style.margins.bottom)
            .y_label_area_size(style.margins.left)
            .build_cartesian_2d(x_min..x_max, y_min..y_max)?;

        let axis_font = (style.axis_font.family.as_str(), style.axis_font.size);
        let tick_font = (style.axis_font.family.as_str(), style.axis_font.size.saturating_sub(4).max(8));
        let date_label = |offset: &i64| (first_date + Duration::days(*offset)).format("%Y-%m-%d").to_string();
        let amount_label = |value: &f64| format!("{value:.0}");
        let x_ticks = usize::try_from(x_max - x_min + 1).unwrap_or(usize::MAX);

        let mut mesh = chart.configure_mesh();
        mesh.x_desc(spec.x_label.as_str())
            .y_desc(spec.y_label.as_str())
            .axis_desc_style(axis_font)
            .x_labels(x_ticks)
            .x_label_formatter(&date_label)
            .y_label_formatter(&amount_label)
            .x_label_style(tick_font.into_font().transform(FontTransform::Rotate90))
            .y_label_style(tick_font);
        if !style.show_grid {
            mesh.disable_mesh();
        }
        mesh.draw()?;

        let color = self.parse_color(&style.line_color);
        chart.draw_series(LineSeries::new(points.iter().copied(), color.stroke_width(style.line_width)))?;
        chart.draw_series(
            points
                .iter()
                .map(|point| Circle::new(*point, style.marker_size, color.filled())),
        )?;

        root.present()?;

        tracing::info!("Rendered revenue chart with {} points to {}", points.len(), path.display());
        Ok(())
    }
}

impl Default for RevenueChartRenderer {
    fn default() -> Self {
        Self::new()
    }
}
