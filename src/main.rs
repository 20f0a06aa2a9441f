//! offline-sync - offline pointage synchronization service

use anyhow::Context;
use clap::Parser;
use pointage_sync::config::Config;
use pointage_sync::core::sync::SyncPipeline;
use pointage_sync::server::HttpServer;
use pointage_sync::utils::{logging, shutdown::GracefulShutdown};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info};

/// Time allowed for workers to finish their current batch
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Parser)]
#[command(name = "offline-sync", version, about = "Offline pointage batch synchronization")]
struct Cli {
    /// YAML configuration file; defaults and environment only when omitted
    #[arg(short, long, env = "OFFLINE_SYNC_CONFIG")]
    config: Option<PathBuf>,

    /// Apply database migrations and exit
    #[arg(long)]
    migrate_only: bool,

    /// Run the workers without the HTTP server
    #[arg(long)]
    no_server: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::from_file(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::from_env().context("loading configuration from environment")?,
    };

    logging::init(config.logging()).context("initializing logging")?;
    info!(version = pointage_sync::VERSION, "Starting offline-sync");

    if cli.migrate_only {
        let db = pointage_sync::storage::Database::new(&config.storage().database)
            .await
            .context("connecting to database")?;
        db.migrate().await.context("running migrations")?;
        db.close().await.context("closing database")?;
        info!("Migrations applied");
        return Ok(());
    }

    let pipeline = SyncPipeline::from_config(&config)
        .await
        .context("building sync pipeline")?;
    let workers = pipeline.start_workers();
    let shutdown = GracefulShutdown::new(SHUTDOWN_TIMEOUT);

    if cli.no_server {
        shutdown.wait_for_signal().await?;
    } else {
        HttpServer::new(&config, &pipeline)
            .start()
            .await
            .context("running HTTP server")?;
    }

    shutdown.drain(workers.shutdown()).await?;
    info!("offline-sync stopped");
    Ok(())
}
