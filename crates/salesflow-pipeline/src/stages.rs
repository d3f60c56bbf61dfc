//! The five pipeline stages.
//!
//! Every stage starts cold: it receives its collaborators and the resolved
//! settings explicitly and re-reads whatever the previous stage persisted.

use chrono::{NaiveDate, NaiveDateTime};
use salesflow_common::{DailyRevenue, PipelineError, Result};
use salesflow_config::PipelineSettings;
use salesflow_graphs::{ChartArtifact, ChartRegistry, ChartRenderer, ChartSpec};
use tracing::{info, warn};

use crate::mail::{Attachment, EmailMessage, MailClient};
use crate::report::RevenueSummary;
use crate::revenue_file::{self, AGGREGATED_FILE_KIND};
use crate::store::SalesStore;

/// Reset the sales table to the seed rows; returns the number inserted
pub async fn init_sales_table(store: &SalesStore, settings: &PipelineSettings) -> Result<u64> {
    let inserted = store.reset_table(&settings.table_name, &settings.seed_records).await?;
    info!("Sales table '{}' reset with {} rows", settings.table_name, inserted);
    Ok(inserted)
}

/// Aggregate revenue per day and write the aggregated CSV
pub async fn calculate_daily_revenue(store: &SalesStore, settings: &PipelineSettings) -> Result<Vec<DailyRevenue>> {
    let rows = store.daily_revenue(&settings.table_name).await?;
    revenue_file::write_daily_revenue(&settings.aggregated_file, &rows)?;

    for row in &rows {
        info!(order_date = %row.order_date, daily_revenue = %row.daily_revenue, "Daily revenue");
    }
    info!(
        "Daily revenue data saved to {}\n{}",
        settings.aggregated_file.display(),
        revenue_file::render_table(&rows)
    );
    Ok(rows)
}

/// Render a new timestamped chart of the aggregated CSV
pub async fn visualize_revenue(
    renderer: &dyn ChartRenderer,
    settings: &PipelineSettings,
    spec: &ChartSpec,
    now: NaiveDateTime,
) -> Result<ChartArtifact> {
    let rows = revenue_file::read_daily_revenue(&settings.aggregated_file)?;
    if rows.is_empty() {
        return Err(PipelineError::validation_field("No daily revenue rows to plot", "daily_revenue"));
    }

    let registry = ChartRegistry::new(&settings.chart_dir);
    let chart = registry.allocate(now).await?;

    if let Err(e) = renderer.render_to_file(spec, &rows, &chart.path).await {
        registry.discard(&chart).await;
        return Err(e);
    }

    info!("Revenue plot saved: {}", chart.path.display());
    Ok(chart)
}

/// Summarize the aggregated CSV into the text report
pub async fn generate_report(settings: &PipelineSettings) -> Result<RevenueSummary> {
    let rows = revenue_file::read_daily_revenue(&settings.aggregated_file)?;
    let summary = RevenueSummary::from_rows(&rows)?;
    summary.write_to(&settings.report_path)?;

    info!(
        days = summary.days,
        total = %summary.total,
        "Revenue report written to {}",
        settings.report_path.display()
    );
    Ok(summary)
}

/// Mail the aggregated CSV, the report and the newest chart
pub async fn send_email_report(
    mailer: &dyn MailClient,
    settings: &PipelineSettings,
    run_date: NaiveDate,
) -> Result<ChartArtifact> {
    let registry = ChartRegistry::new(&settings.chart_dir);
    let Some(chart) = registry.latest().await? else {
        warn!("No chart found in {}, not sending the report", settings.chart_dir.display());
        return Err(PipelineError::missing_artifact("revenue chart", &settings.chart_dir));
    };

    let attachments = vec![
        Attachment::from_path(&settings.aggregated_file, "text/csv", AGGREGATED_FILE_KIND).await?,
        Attachment::from_path(&settings.report_path, "text/plain", "revenue report").await?,
        Attachment::from_path(&chart.path, "image/png", "revenue chart").await?,
    ];

    let message = EmailMessage {
        to: settings.recipient.clone(),
        subject: settings.subject_for(&run_date.format("%Y-%m-%d").to_string()),
        html_body: settings.html_body.clone(),
        attachments,
    };

    mailer.send(message).await?;
    info!("Report emailed to {} with chart {}", settings.recipient, chart.file_name());
    Ok(chart)
}
