//! Command line arguments

use clap::{Parser, Subcommand};
use salesflow_pipeline::Stage;
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level, overrides the configured one
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the whole pipeline once
    Run,

    /// Run a single stage, e.g. `calculate_daily_revenue`
    Stage {
        /// Stage name
        name: Stage,
    },

    /// Run the pipeline on the configured cron schedule until interrupted
    Serve,

    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_with_config() {
        let cli = Cli::try_parse_from(["salesflow", "--config", "/etc/salesflow.yaml", "run"]).unwrap();
        assert_eq!(cli.command, Command::Run);
        assert_eq!(cli.config, Some(PathBuf::from("/etc/salesflow.yaml")));
        assert!(cli.log_level.is_none());
    }

    #[test]
    fn test_parse_stage() {
        let cli = Cli::try_parse_from(["salesflow", "stage", "generate_report", "-l", "debug"]).unwrap();
        assert_eq!(cli.command, Command::Stage { name: Stage::GenerateReport });
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_unknown_stage_rejected() {
        assert!(Cli::try_parse_from(["salesflow", "stage", "load_warehouse"]).is_err());
    }

    #[test]
    fn test_subcommand_required() {
        assert!(Cli::try_parse_from(["salesflow"]).is_err());
        let cli = Cli::try_parse_from(["salesflow", "check-config"]).unwrap();
        assert_eq!(cli.command, Command::CheckConfig);
    }
}
