//! Replication Manager - job registry service
//!
//! Loads the manager configuration, builds the job registry and serves the
//! REST API until Ctrl+C.

use anyhow::Context;
use clap::Parser;
use replication_manager::api::{ApiServer, ApiServerConfig, AppState};
use replication_manager::config::{CliArgs, LogFormat, ManagerConfig};
use replication_manager::jobs::JobRegistry;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

fn main() {
    // Parse CLI arguments
    let args = CliArgs::parse();

    // Initialize logging
    init_logging(&args);

    // Handle result
    if let Err(e) = run(args) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(args: &CliArgs) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level()));

    match args.log_format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init(),
    }
}

fn run(args: CliArgs) -> anyhow::Result<()> {
    let config = args
        .load_config()
        .context("failed to load manager configuration")?;
    config.log_with();

    if config.ssl {
        tracing::warn!(
            "ssl is enabled in the configuration; TLS must be terminated in front of this service"
        );
    }

    let rt = tokio::runtime::Runtime::new().context("failed to create runtime")?;
    rt.block_on(serve(config))
}

async fn serve(config: ManagerConfig) -> anyhow::Result<()> {
    // The registry lives for the whole process and is shared with every handler
    let registry = Arc::new(JobRegistry::new());
    let state = Arc::new(AppState::new(registry, &config.service_name));

    let server = ApiServer::bind(ApiServerConfig::from(&config), state)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr()))?;

    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for Ctrl+C: {}", e);
                std::future::pending::<()>().await;
            }
            tracing::info!("Received Ctrl+C");
        })
        .await?;

    Ok(())
}
