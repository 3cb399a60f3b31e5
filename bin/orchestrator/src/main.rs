//! Orchestrator entry point.

use anyhow::Result;
use clap::Parser;
use orchestrator_service::Orchestrator;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
use cli::OrchestratorArgs;

#[tokio::main]
async fn main() -> Result<()> {
    let args = OrchestratorArgs::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let orchestrator = Arc::new(Orchestrator::new(args.into_config()));

    let runner = orchestrator.clone();
    let mut run_handle = tokio::spawn(async move { runner.run().await });

    tokio::select! {
        result = &mut run_handle => {
            // The orchestrator stopped on its own: fatal store or listener
            // failure surfaces here as a non-zero exit.
            return Ok(result??);
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping orchestrator");
            orchestrator.stop();
        }
    }

    run_handle.await??;
    Ok(())
}
