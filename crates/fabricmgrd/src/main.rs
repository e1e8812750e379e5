//! fabricmgrd - OS10-FE fabric agent daemon
//!
//! Entry point. Loads the agent configuration, builds the RESTCONF gateway
//! and fabric manager for the managed switch, and optionally applies one
//! attachment request before settling into serve mode.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use os10fe_common::FabricConfig;
use os10fe_fabricmgrd::{AttachmentRequest, FabricManager, WriteMemoryCallback};
use os10fe_restconf::RestconfClient;

#[derive(Debug, Parser)]
#[command(name = "fabricmgrd", about = "OS10-FE fabric reconciliation agent")]
struct Args {
    /// Path to the agent configuration file (YAML).
    #[arg(long, short)]
    config: String,

    /// Apply one attachment request (YAML) and exit.
    #[arg(long)]
    ensure: Option<String>,
}

/// Initializes tracing/logging subsystem
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Arc::new(
        FabricConfig::from_yaml_file(&args.config)
            .with_context(|| format!("loading config from {}", args.config))?,
    );
    info!(
        switch = %config.switch_address,
        category = config.category.as_str(),
        "--- Starting fabricmgrd ---"
    );

    let gateway = Arc::new(RestconfClient::new(
        &config.switch_address,
        &config.username,
        &config.password,
    )?);
    let manager = FabricManager::new(Arc::clone(&config), Arc::clone(&gateway))
        .with_callback(WriteMemoryCallback::new(gateway));

    if let Some(path) = &args.ensure {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading attachment request from {}", path))?;
        let request: AttachmentRequest =
            serde_yaml::from_str(&text).context("parsing attachment request")?;
        let report = manager.ensure_configuration(&request).await?;
        info!(writes = report.writes, "attachment converged");
        return Ok(());
    }

    info!("no request given, exiting after startup checks");
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();

    let args = Args::parse();
    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("fabricmgrd failed: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
