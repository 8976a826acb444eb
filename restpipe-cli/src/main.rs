//! restpipe command-line client
//!
//! Usage:
//!   restpipe --base-url https://api.example.org/ read widgets --limit 10
//!   restpipe --base-url https://api.example.org/ login bob secret

use anyhow::{Context, Result};
use clap::Parser;
use restpipe_cli::{Cli, run};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let result = run(&cli).await?;
    let rendered = serde_json::to_string_pretty(&result).context("Failed to render result")?;
    println!("{rendered}");
    Ok(())
}
