use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use talign_db::TruthSource;
use talign_sync::{maybe_build_scheduler, AlignConfig, AlignmentPipeline};

#[derive(Debug, Parser)]
#[command(name = "talign")]
#[command(about = "Truth alignment reconciler for the coaching mirror database")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Run one reconciliation pass and print the run report.
    Align,
    /// Serve the HTTP trigger, snapshot endpoint, and operator page.
    Serve,
    /// Print the real-time ops snapshot from the selected replica.
    Snapshot,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AlignConfig::from_env();

    match cli.command.unwrap_or(Commands::Align) {
        Commands::Align => {
            let summary = AlignmentPipeline::new(config).run_once().await?;
            println!(
                "alignment complete: run_id={} replica={} matched={} aligned={} unmatched={} duplicates={}",
                summary.run_id,
                summary.replica,
                summary.report.matched,
                summary.report.aligned,
                summary.report.unmatched,
                summary.report.duplicate_truth_emails,
            );
        }
        Commands::Serve => {
            if let Some(scheduler) = maybe_build_scheduler(config.clone()).await? {
                scheduler.start().await?;
                info!(cron = %config.align_cron, "in-process alignment scheduler started");
            }
            info!(port = config.web_port, "serving truth alignment API");
            talign_web::serve(config).await?;
        }
        Commands::Snapshot => {
            let snapshot = TruthSource::new(config.replica_config().clone())
                .ops_snapshot()
                .await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}
