//! Command dispatch for the `salesflow` binary

use std::fmt::Write as _;
use std::sync::Arc;

use salesflow_common::{init_logging, PipelineError};
use salesflow_config::{Config, ConfigError, ConfigLoader, MailTransportKind};
use salesflow_pipeline::{Pipeline, Stage};
use tracing::{error, info, warn};

use crate::cli::{Cli, Command};
use crate::scheduler::SchedulerService;
use crate::AppResult;

const PIPELINE_JOB: &str = "sales_revenue_pipeline";

/// Resolve the configuration for this invocation.
///
/// An explicit `--config` wins over discovery, and `--log-level` wins over
/// the configured level.
pub fn load_config(cli: &Cli) -> AppResult<Config> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    if let Some(level) = &cli.log_level {
        config.logging.level = level.clone();
        config
            .validate_all()
            .map_err(|e| PipelineError::from(ConfigError::from(e)))?;
    }

    Ok(config)
}

/// Load configuration, initialise logging and run the requested command
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    init_logging((&config.logging).into())?;

    match cli.command {
        Command::Run => run_once(&config).await?,
        Command::Stage { name } => run_single_stage(&config, name).await?,
        Command::Serve => serve(config).await?,
        Command::CheckConfig => print!("{}", describe_config(&config)),
    }

    Ok(())
}

async fn run_once(config: &Config) -> AppResult<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let report = pipeline.run().await?;
    info!(run_id = %report.run_id, "Pipeline finished");
    Ok(())
}

async fn run_single_stage(config: &Config, stage: Stage) -> AppResult<()> {
    let pipeline = Pipeline::from_config(config).await?;
    let outcome = pipeline.run_stage(stage).await?;
    info!(
        stage = %outcome.stage,
        attempts = outcome.attempts,
        elapsed_ms = outcome.elapsed.as_millis() as u64,
        "Stage finished"
    );
    Ok(())
}

/// Run the pipeline on its cron schedule until Ctrl-C
async fn serve(config: Config) -> AppResult<()> {
    if !config.scheduling.enabled {
        warn!("Scheduling is disabled in the configuration, nothing to serve");
        return Ok(());
    }

    let pipeline = Arc::new(Pipeline::from_config(&config).await?);
    let scheduler = SchedulerService::new().await?;

    scheduler
        .add_exclusive_job(PIPELINE_JOB, &config.scheduling.cron, move || {
            let pipeline = Arc::clone(&pipeline);
            async move {
                // Failures are logged by the run report; the next firing starts fresh
                let report = pipeline.execute().await;
                if let Some(err) = report.failure() {
                    error!(run_id = %report.run_id, "Scheduled run failed: {}", err);
                }
            }
        })
        .await?;

    scheduler.start().await?;
    info!("Waiting for schedule '{}' (UTC), press Ctrl-C to stop", config.scheduling.cron);

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    scheduler.stop().await?;
    Ok(())
}

/// Human readable summary of the effective configuration
pub fn describe_config(config: &Config) -> String {
    let settings = config.pipeline_settings();
    let transport = match config.notification.transport {
        MailTransportKind::Smtp => format!(
            "smtp ({}:{})",
            config.notification.smtp.host, config.notification.smtp.port
        ),
        MailTransportKind::File => format!("file ({})", config.notification.file_dir.display()),
    };

    let mut out = String::from("Configuration OK\n");
    let _ = writeln!(out, "  database:        {}", config.database.url);
    let _ = writeln!(out, "  table:           {}", settings.table_name);
    let _ = writeln!(out, "  seed records:    {}", settings.seed_records.len());
    let _ = writeln!(out, "  aggregated file: {}", settings.aggregated_file.display());
    let _ = writeln!(out, "  report:          {}", settings.report_path.display());
    let _ = writeln!(out, "  charts:          {}", settings.chart_dir.display());
    let _ = writeln!(out, "  recipient:       {}", settings.recipient);
    let _ = writeln!(out, "  transport:       {transport}");
    let _ = writeln!(
        out,
        "  schedule:        {} ({})",
        config.scheduling.cron,
        if config.scheduling.enabled { "enabled" } else { "disabled" }
    );
    let _ = writeln!(
        out,
        "  retries:         {} x {}s",
        config.scheduling.retries, config.scheduling.retry_delay_seconds
    );
    out
}
