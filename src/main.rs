use anyhow::{Context, Result};
use clap::Parser;
use std::collections::BTreeSet;
use std::path::PathBuf;
use tracing::info;

use shift_watcher::{AppConfig, Poller};

#[derive(Parser, Debug)]
#[command(name = "shift-watcher", version, about = "Watches a shift sign-up form and notifies on new openings")]
struct Args {
    /// Path to the JSON configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Run a single check cycle and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("shift_watcher=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::load(&args.config).context("Failed to load configuration")?;
    let poller = Poller::new(config)?;

    if args.once {
        let mut previous = BTreeSet::new();
        if !poller.run_cycle(&mut previous).await {
            std::process::exit(1);
        }
        return Ok(());
    }

    tokio::select! {
        result = poller.run() => result?,
        _ = tokio::signal::ctrl_c() => info!("Shutting down..."),
    }

    Ok(())
}
