//! End-to-end tests for the sales revenue pipeline.
//!
//! The database is in-memory SQLite, chart rendering is stubbed and mail is
//! captured in memory, so the tests exercise stage ordering, artifacts on
//! disk and the message handed to the mail client.

use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use salesflow_common::test_utils::{date, init_test_logging, timestamp};
use salesflow_common::{DailyRevenue, PipelineError, Result};
use salesflow_config::{Config, PipelineSettings};
use salesflow_graphs::{ChartRegistry, ChartRenderer, ChartSpec};
use salesflow_pipeline::stages;
use salesflow_pipeline::{EmailMessage, MailClient, Pipeline, RetryPolicy, SalesStore, Stage};
use tempfile::TempDir;

/// Writes a placeholder image instead of drawing
struct StubRenderer;

#[async_trait::async_trait]
impl ChartRenderer for StubRenderer {
    async fn render_to_file(&self, _spec: &ChartSpec, data: &[DailyRevenue], path: &Path) -> Result<()> {
        tokio::fs::write(path, format!("PNG stub with {} points", data.len())).await?;
        Ok(())
    }
}

/// Fails the first `failures` renders
struct FlakyRenderer {
    failures: u32,
    calls: AtomicU32,
}

#[async_trait::async_trait]
impl ChartRenderer for FlakyRenderer {
    async fn render_to_file(&self, spec: &ChartSpec, data: &[DailyRevenue], path: &Path) -> Result<()> {
        if self.calls.fetch_add(1, Ordering::SeqCst) < self.failures {
            return Err(PipelineError::graph("font cache unavailable"));
        }
        StubRenderer.render_to_file(spec, data, path).await
    }
}

#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<EmailMessage>>,
}

impl RecordingMailer {
    fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl MailClient for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<()> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }
}

struct Fixture {
    _dir: TempDir,
    settings: PipelineSettings,
    store: SalesStore,
    mailer: Arc<RecordingMailer>,
}

async fn fixture() -> Fixture {
    init_test_logging();
    let dir = tempfile::tempdir().unwrap();

    let mut config = Config::default();
    config.output.output_dir = dir.path().join("data");
    config.notification.recipient = "finance@example.com".to_string();
    config.notification.subject_template = "📊 Daily Sales Revenue Report {date}".to_string();

    Fixture {
        settings: config.pipeline_settings(),
        store: SalesStore::connect("sqlite::memory:", 1).await.unwrap(),
        mailer: Arc::new(RecordingMailer::default()),
        _dir: dir,
    }
}

fn pipeline(fixture: &Fixture, renderer: Arc<dyn ChartRenderer>) -> Pipeline {
    Pipeline::new(fixture.store.clone(), renderer, fixture.mailer.clone(), fixture.settings.clone())
        .with_retry_policy(RetryPolicy::new(1, Duration::ZERO))
}

#[tokio::test]
async fn test_full_run_produces_artifacts_and_email() {
    let fixture = fixture().await;
    let report = pipeline(&fixture, Arc::new(StubRenderer)).run().await.unwrap();

    assert!(report.succeeded());
    assert_eq!(report.outcomes.len(), 5);
    assert!(report.skipped().is_empty());

    let csv = std::fs::read_to_string(&fixture.settings.aggregated_file).unwrap();
    assert!(csv.starts_with("order_date,daily_revenue\n2024-01-01,3127.50\n"));

    let text = std::fs::read_to_string(&fixture.settings.report_path).unwrap();
    assert!(text.contains("Total Period: 4 days"));
    assert!(text.contains("Total Revenue: $7,129.00"));
    assert!(text.contains("Best Performing Day: 2024-01-01 - $3,127.50"));

    let sent = fixture.mailer.sent();
    assert_eq!(sent.len(), 1);
    let message = &sent[0];
    assert_eq!(message.to, "finance@example.com");
    assert!(message.subject.starts_with("📊 Daily Sales Revenue Report 20"));
    let names: Vec<&str> = message.attachments.iter().map(|a| a.filename.as_str()).collect();
    assert_eq!(names[0], "daily_revenue.csv");
    assert_eq!(names[1], "revenue_report.txt");
    assert!(names[2].starts_with("daily_revenue_") && names[2].ends_with(".png"));
    let types: Vec<&str> = message.attachments.iter().map(|a| a.content_type.as_str()).collect();
    assert_eq!(types, vec!["text/csv", "text/plain", "image/png"]);
}

#[tokio::test]
async fn test_running_twice_keeps_eight_rows_and_two_charts() {
    let fixture = fixture().await;
    let pipeline = pipeline(&fixture, Arc::new(StubRenderer));

    pipeline.run().await.unwrap();
    pipeline.run().await.unwrap();

    assert_eq!(fixture.store.count("sales").await.unwrap(), 8);
    let charts = ChartRegistry::new(&fixture.settings.chart_dir).list().await.unwrap();
    assert_eq!(charts.len(), 2);
    assert_eq!(fixture.mailer.sent().len(), 2);
}

#[tokio::test]
async fn test_visualize_same_second_writes_distinct_files() {
    let fixture = fixture().await;
    stages::init_sales_table(&fixture.store, &fixture.settings).await.unwrap();
    stages::calculate_daily_revenue(&fixture.store, &fixture.settings).await.unwrap();

    let at = timestamp(2024, 1, 5, 0, 0, 0);
    let spec = ChartSpec::default();
    let first = stages::visualize_revenue(&StubRenderer, &fixture.settings, &spec, at).await.unwrap();
    let second = stages::visualize_revenue(&StubRenderer, &fixture.settings, &spec, at).await.unwrap();

    assert_ne!(first.path, second.path);
    assert!(first.path.exists() && second.path.exists());
}

#[tokio::test]
async fn test_notifier_attaches_latest_chart() {
    let fixture = fixture().await;
    stages::init_sales_table(&fixture.store, &fixture.settings).await.unwrap();
    stages::calculate_daily_revenue(&fixture.store, &fixture.settings).await.unwrap();
    stages::generate_report(&fixture.settings).await.unwrap();

    let spec = ChartSpec::default();
    for at in [
        timestamp(2024, 1, 6, 0, 0, 0),
        timestamp(2024, 1, 7, 0, 0, 0),
        timestamp(2024, 1, 5, 23, 59, 59),
    ] {
        stages::visualize_revenue(&StubRenderer, &fixture.settings, &spec, at).await.unwrap();
    }

    let chart = stages::send_email_report(fixture.mailer.as_ref(), &fixture.settings, date(2024, 1, 7))
        .await
        .unwrap();

    assert_eq!(chart.file_name(), "daily_revenue_20240107_000000.png");
    let sent = fixture.mailer.sent();
    assert_eq!(sent[0].attachments[2].filename, "daily_revenue_20240107_000000.png");
    assert_eq!(sent[0].subject, "📊 Daily Sales Revenue Report 2024-01-07");
}

#[tokio::test]
async fn test_notifier_without_chart_is_missing_artifact() {
    let fixture = fixture().await;
    stages::init_sales_table(&fixture.store, &fixture.settings).await.unwrap();
    stages::calculate_daily_revenue(&fixture.store, &fixture.settings).await.unwrap();
    stages::generate_report(&fixture.settings).await.unwrap();

    let err = tokio_test::assert_err!(
        stages::send_email_report(fixture.mailer.as_ref(), &fixture.settings, date(2024, 1, 7)).await
    );

    assert!(matches!(err, PipelineError::MissingArtifact { .. }));
    assert!(fixture.mailer.sent().is_empty());
}

#[tokio::test]
async fn test_report_and_chart_reject_empty_csv() {
    let fixture = fixture().await;
    fixture.store.reset_table("sales", &[]).await.unwrap();
    let rows = stages::calculate_daily_revenue(&fixture.store, &fixture.settings).await.unwrap();
    assert!(rows.is_empty());

    let report = stages::generate_report(&fixture.settings).await.unwrap_err();
    let chart = stages::visualize_revenue(&StubRenderer, &fixture.settings, &ChartSpec::default(), timestamp(2024, 1, 5, 0, 0, 0))
        .await
        .unwrap_err();

    assert!(matches!(report, PipelineError::Validation { .. }));
    assert!(matches!(chart, PipelineError::Validation { .. }));
}

#[tokio::test]
async fn test_retry_recovers_flaky_stage() {
    let fixture = fixture().await;
    let renderer = Arc::new(FlakyRenderer {
        failures: 1,
        calls: AtomicU32::new(0),
    });

    let report = pipeline(&fixture, renderer).run().await.unwrap();

    assert_eq!(report.outcome(Stage::VisualizeRevenue).unwrap().attempts, 2);
    assert_eq!(report.outcome(Stage::GenerateReport).unwrap().attempts, 1);
    // The failed attempt's reservation is removed
    let charts = ChartRegistry::new(&fixture.settings.chart_dir).list().await.unwrap();
    assert_eq!(charts.len(), 1);
}

#[tokio::test]
async fn test_failed_branch_blocks_notifier_but_not_sibling() {
    let fixture = fixture().await;
    let renderer = Arc::new(FlakyRenderer {
        failures: u32::MAX,
        calls: AtomicU32::new(0),
    });

    let report = pipeline(&fixture, renderer).execute().await;

    assert!(!report.succeeded());
    assert_eq!(report.outcome(Stage::VisualizeRevenue).unwrap().attempts, 2);
    assert!(report.outcome(Stage::GenerateReport).unwrap().succeeded());
    assert_eq!(report.skipped(), vec![Stage::SendEmailReport]);
    assert!(fixture.settings.report_path.exists());
    assert!(fixture.mailer.sent().is_empty());

    let err = report.into_result().unwrap_err();
    assert_eq!(err.failed_stage(), Some("visualize_revenue"));
}

#[tokio::test]
async fn test_run_single_stage() {
    let fixture = fixture().await;
    let pipeline = pipeline(&fixture, Arc::new(StubRenderer));

    let outcome = pipeline.run_stage(Stage::CreateSalesTable).await.unwrap();
    assert_eq!(outcome.attempts, 1);
    assert_eq!(fixture.store.count("sales").await.unwrap(), 8);

    let err = pipeline.run_stage(Stage::GenerateReport).await.unwrap_err();
    assert!(matches!(err, PipelineError::Stage { attempts: 2, .. }));
}
