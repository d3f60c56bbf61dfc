//! Main entry point for salesflow.

use clap::Parser;
use salesflow::{app, Cli};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    app::run(cli).await
}
