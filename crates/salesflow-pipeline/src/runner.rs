//! Pipeline runner: stage ordering, retries and the per-run report

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use salesflow_common::{format_timestamp, now, PipelineError, Result};
use salesflow_config::{ChartConfig, Config, PipelineSettings, SchedulingConfig};
use salesflow_graphs::{ChartRenderer, ChartSpec, FontConfig, RevenueChartRenderer};
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::mail::{create_mail_client, DynMailClient};
use crate::stages;
use crate::store::SalesStore;

/// The stages of a run, in dependency order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    CreateSalesTable,
    CalculateDailyRevenue,
    VisualizeRevenue,
    GenerateReport,
    SendEmailReport,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::CreateSalesTable,
        Stage::CalculateDailyRevenue,
        Stage::VisualizeRevenue,
        Stage::GenerateReport,
        Stage::SendEmailReport,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Stage::CreateSalesTable => "create_sales_table",
            Stage::CalculateDailyRevenue => "calculate_daily_revenue",
            Stage::VisualizeRevenue => "visualize_revenue",
            Stage::GenerateReport => "generate_report",
            Stage::SendEmailReport => "send_email_report",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| {
                let known: Vec<&str> = Stage::ALL.iter().map(|stage| stage.name()).collect();
                PipelineError::validation_field(
                    format!("Unknown stage '{s}', expected one of: {}", known.join(", ")),
                    "stage",
                )
            })
    }
}

/// How often and how patiently a failed stage is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Single attempt, no retries
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    fn strategy(&self) -> impl Iterator<Item = Duration> {
        FixedInterval::new(self.delay).take(self.retries as usize)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(1, Duration::from_secs(300))
    }
}

impl From<&SchedulingConfig> for RetryPolicy {
    fn from(config: &SchedulingConfig) -> Self {
        Self::new(config.retries, Duration::from_secs(config.retry_delay_seconds))
    }
}

/// Outcome of one stage in a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOutcome {
    pub stage: Stage,
    pub attempts: u32,
    pub elapsed: Duration,
    pub error: Option<String>,
}

impl StageOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

/// Record of a pipeline run
#[derive(Debug)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: NaiveDateTime,
    pub outcomes: Vec<StageOutcome>,
    failure: Option<PipelineError>,
}

impl RunReport {
    fn new() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            started_at: now(),
            outcomes: Vec::new(),
            failure: None,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    pub fn outcome(&self, stage: Stage) -> Option<&StageOutcome> {
        self.outcomes.iter().find(|outcome| outcome.stage == stage)
    }

    /// Stages that never ran because an upstream stage failed
    pub fn skipped(&self) -> Vec<Stage> {
        Stage::ALL
            .into_iter()
            .filter(|stage| self.outcome(*stage).is_none())
            .collect()
    }

    /// The error that stopped the run, if any
    pub fn failure(&self) -> Option<&PipelineError> {
        self.failure.as_ref()
    }

    /// `Err` with the first stage failure, `Ok(self)` otherwise
    pub fn into_result(mut self) -> Result<Self> {
        match self.failure.take() {
            Some(err) => Err(err),
            None => Ok(self),
        }
    }

    fn record<T>(&mut self, outcome: StageOutcome, result: Result<T>) -> Option<T> {
        let stage = outcome.stage;
        let attempts = outcome.attempts;
        self.outcomes.push(outcome);
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                if self.failure.is_none() {
                    self.failure = Some(PipelineError::stage(stage.name(), attempts, err));
                }
                None
            }
        }
    }

    pub fn log(&self) {
        for outcome in &self.outcomes {
            match &outcome.error {
                None => info!(
                    run_id = %self.run_id,
                    stage = %outcome.stage,
                    attempts = outcome.attempts,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    "Stage succeeded"
                ),
                Some(err) => error!(
                    run_id = %self.run_id,
                    stage = %outcome.stage,
                    attempts = outcome.attempts,
                    elapsed_ms = outcome.elapsed.as_millis() as u64,
                    error = %err,
                    "Stage failed"
                ),
            }
        }
        for stage in self.skipped() {
            warn!(run_id = %self.run_id, stage = %stage, "Stage skipped, upstream failed");
        }
        let started_at = format_timestamp(&self.started_at);
        if self.succeeded() {
            info!(run_id = %self.run_id, "Pipeline run started at {} completed", started_at);
        } else {
            error!(run_id = %self.run_id, "Pipeline run started at {} failed", started_at);
        }
    }
}

/// Chart description from the chart settings
pub fn chart_spec(config: &ChartConfig) -> ChartSpec {
    let mut spec = ChartSpec {
        width: config.width,
        height: config.height,
        ..ChartSpec::default()
    };
    spec.style.background_color = Some(config.background_color.clone());
    spec.style.line_color = config.line_color.clone();
    spec.style.marker_size = config.marker_size;
    spec.style.show_grid = config.show_grid;
    spec.style.title_font = FontConfig {
        family: config.font_family.clone(),
        size: config.title_font_size,
    };
    spec.style.axis_font = FontConfig {
        family: config.font_family.clone(),
        size: config.axis_font_size,
    };
    spec
}

/// The daily sales revenue pipeline and its collaborators
pub struct Pipeline {
    store: SalesStore,
    renderer: Arc<dyn ChartRenderer>,
    mailer: DynMailClient,
    settings: PipelineSettings,
    chart: ChartSpec,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(
        store: SalesStore,
        renderer: Arc<dyn ChartRenderer>,
        mailer: DynMailClient,
        settings: PipelineSettings,
    ) -> Self {
        Self {
            store,
            renderer,
            mailer,
            settings,
            chart: ChartSpec::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Connect to the database and build the collaborators from configuration
    pub async fn from_config(config: &Config) -> Result<Self> {
        let store = SalesStore::connect(&config.database.url, config.database.max_connections).await?;
        let mailer = create_mail_client(&config.notification)?;

        Ok(Self::new(store, Arc::new(RevenueChartRenderer::new()), mailer, config.pipeline_settings())
            .with_chart_spec(chart_spec(&config.chart))
            .with_retry_policy(RetryPolicy::from(&config.scheduling)))
    }

    pub fn with_chart_spec(mut self, chart: ChartSpec) -> Self {
        self.chart = chart;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn settings(&self) -> &PipelineSettings {
        &self.settings
    }

    pub fn store(&self) -> &SalesStore {
        &self.store
    }

    /// Run every stage and return the report; stage failures are recorded in it
    pub async fn execute(&self) -> RunReport {
        let mut report = RunReport::new();
        let span = info_span!("pipeline_run", run_id = %report.run_id);

        async {
            info!("Starting sales revenue pipeline");

            if !self.run_and_record(&mut report, Stage::CreateSalesTable).await {
                return;
            }
            if !self.run_and_record(&mut report, Stage::CalculateDailyRevenue).await {
                return;
            }

            // Both branches run to completion even when the other fails
            let (chart, summary) = tokio::join!(
                self.attempt(Stage::VisualizeRevenue),
                self.attempt(Stage::GenerateReport)
            );
            let chart_ok = report.record(chart.0, chart.1).is_some();
            let summary_ok = report.record(summary.0, summary.1).is_some();
            if !(chart_ok && summary_ok) {
                return;
            }

            self.run_and_record(&mut report, Stage::SendEmailReport).await;
        }
        .instrument(span)
        .await;

        report.log();
        report
    }

    /// Run every stage; `Err` names the first failed stage
    pub async fn run(&self) -> Result<RunReport> {
        self.execute().await.into_result()
    }

    /// Run a single stage with the retry policy
    pub async fn run_stage(&self, stage: Stage) -> Result<StageOutcome> {
        let span = info_span!("pipeline_run", run_id = %Uuid::new_v4());
        let (outcome, result) = self.attempt(stage).instrument(span).await;
        match result {
            Ok(()) => Ok(outcome),
            Err(err) => Err(PipelineError::stage(stage.name(), outcome.attempts, err)),
        }
    }

    async fn run_and_record(&self, report: &mut RunReport, stage: Stage) -> bool {
        let (outcome, result) = self.attempt(stage).await;
        report.record(outcome, result).is_some()
    }

    async fn attempt(&self, stage: Stage) -> (StageOutcome, Result<()>) {
        let started = Instant::now();
        let (attempts, result) = self
            .with_retries(stage, || self.dispatch(stage))
            .instrument(info_span!("stage", name = stage.name()))
            .await;

        let outcome = StageOutcome {
            stage,
            attempts,
            elapsed: started.elapsed(),
            error: result.as_ref().err().map(ToString::to_string),
        };
        (outcome, result)
    }

    async fn dispatch(&self, stage: Stage) -> Result<()> {
        let settings = &self.settings;
        match stage {
            Stage::CreateSalesTable => stages::init_sales_table(&self.store, settings).await.map(drop),
            Stage::CalculateDailyRevenue => stages::calculate_daily_revenue(&self.store, settings).await.map(drop),
            Stage::VisualizeRevenue => {
                stages::visualize_revenue(self.renderer.as_ref(), settings, &self.chart, now())
                    .await
                    .map(drop)
            }
            Stage::GenerateReport => stages::generate_report(settings).await.map(drop),
            Stage::SendEmailReport => {
                stages::send_email_report(self.mailer.as_ref(), settings, now().date())
                    .await
                    .map(drop)
            }
        }
    }

    async fn with_retries<F, Fut>(&self, stage: Stage, mut op: F) -> (u32, Result<()>)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut attempts = 0u32;
        let total = self.retry.retries + 1;
        let result = Retry::spawn(self.retry.strategy(), || {
            attempts += 1;
            let attempt = attempts;
            let fut = op();
            async move {
                let result = fut.await;
                if let Err(err) = &result {
                    warn!(stage = %stage, attempt, total, error = %err, "Stage attempt failed");
                }
                result
            }
        })
        .await;
        (attempts, result)
    }
}
