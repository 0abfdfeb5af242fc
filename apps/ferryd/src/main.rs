//! `ferryd` — receiving server for ferry file transfers.

mod config;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Config;
use ferry_transfer::{ServerConfig, TransferServer};

#[derive(Parser, Debug)]
#[command(name = "ferryd", version, about = "Receive ferry file transfers")]
struct Args {
    /// Listening port (overrides the config file).
    #[arg(long)]
    port: Option<u16>,

    /// Directory receiving transferred files (overrides the config file).
    #[arg(long)]
    output: Option<PathBuf>,

    /// Alternative configuration file.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(output) = args.output {
        config.output_dir = output;
    }

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .with_context(|| format!("failed to create {}", config.output_dir.display()))?;

    let server = TransferServer::new(ServerConfig {
        port: config.port,
        output_dir: config.output_dir.clone(),
    });

    let runner = Arc::clone(&server);
    let mut run_task = tokio::spawn(async move { runner.run().await });

    tokio::select! {
        result = &mut run_task => result??,
        _ = tokio::signal::ctrl_c() => {
            info!("ctrl-c received, shutting down");
            server.shutdown();
            run_task.await??;
        }
    }

    Ok(())
}
