//! Command line interface for the release pipeline.
//!
//! Parses configuration, checks that the external tools exist, wires the
//! production collaborators into a [`ReleasePipeline`] and maps the outcome to
//! an exit code.

mod args;

pub use args::Args;

use crate::config::ReleaseConfig;
use crate::error::{CliError, Result};
use crate::pipeline::{ReleasePipeline, RunSummary};
use crate::process::{SystemCommandRunner, ensure_tools_available};
use crate::storage::AwsCliStore;
use std::path::Path;

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    run_with_args(&args).await
}

/// Runs the pipeline for already-parsed arguments.
pub async fn run_with_args(args: &Args) -> Result<i32> {
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    ensure_tools_available(&[args.sam_bin.as_str(), args.aws_bin.as_str()])?;

    let config = ReleaseConfig::from(args);
    let runner = SystemCommandRunner::new().with_timeout(args.command_timeout());
    let store = AwsCliStore::new(runner.clone(), args.aws_bin.as_str());

    let mut pipeline =
        ReleasePipeline::new(config, runner, store).with_sam_bin(args.sam_bin.as_str());
    let outcome = pipeline.run().await;

    if let Some(report_path) = &args.report {
        if let Err(e) = write_report(report_path, pipeline.summary()).await {
            if outcome.is_ok() {
                return Err(e);
            }
            log::error!("Failed to write run summary to {}: {e}", report_path.display());
        }
    }

    let summary = outcome?;
    if let Some(published) = &summary.published {
        log::info!(
            "✓ Release {} published to {} (sha256 {})",
            args.version_number,
            published.destination,
            published.checksum
        );
    }
    Ok(0)
}

/// Writes the run summary as pretty-printed JSON.
pub async fn write_report(path: &Path, summary: &RunSummary) -> Result<()> {
    let json = serde_json::to_vec_pretty(summary)?;
    tokio::fs::write(path, json).await?;
    log::info!("Run summary written to {}", path.display());
    Ok(())
}
