//! `ferry` — send a file, or a directory zipped on the fly, to a
//! `ferryd` server.

mod archive;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use ferry_transfer::{Progress, TransferClient};

#[derive(Parser, Debug)]
#[command(name = "ferry", version, about = "Send files to a ferryd server")]
struct Args {
    /// Directory to zip and send.
    #[arg(long, conflicts_with = "file")]
    path: Option<PathBuf>,

    /// Archive name to use when zipping a directory.
    #[arg(long, requires = "path")]
    output: Option<String>,

    /// Existing file to send as-is.
    #[arg(long)]
    file: Option<PathBuf>,

    /// Server host name or address.
    #[arg(long, default_value = "localhost")]
    ip: String,

    /// Server port.
    #[arg(long, default_value_t = 8080)]
    port: u16,

    /// Continue a previously interrupted transfer of the same file.
    #[arg(long)]
    resume: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let source = match (&args.path, &args.file) {
        (Some(dir), None) => archive::compress_directory(dir, args.output.as_deref())?,
        (None, Some(file)) => file.clone(),
        _ => bail!("pass exactly one of --path or --file"),
    };

    let total = tokio::fs::metadata(&source)
        .await
        .with_context(|| format!("failed to read {}", source.display()))?
        .len();

    let (tx, rx) = mpsc::channel::<Progress>(256);
    let bar = tokio::spawn(render_progress(rx, total));

    let client = TransferClient::new(args.ip.clone(), args.port);
    let sent = client
        .send_file(&source, args.resume, tx)
        .await
        .with_context(|| format!("transfer to {}:{} failed", args.ip, args.port))?;

    bar.await?;
    info!(file = %source.display(), sent, "done");
    Ok(())
}

/// Draws a terminal progress bar from the client's per-chunk reports.
async fn render_progress(mut rx: mpsc::Receiver<Progress>, total: u64) {
    let bar = ProgressBar::new(total);
    bar.set_style(
        ProgressStyle::with_template("[{bar:50}] {percent}% ({bytes}/{total_bytes})")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    while let Some(progress) = rx.recv().await {
        bar.set_position(progress.bytes);
    }
    bar.finish();
}
