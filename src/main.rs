mod auction;
mod config;
mod event;
mod event_log;
mod market;
mod report;
mod service;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Buyers racing each other for a shared pool of items
#[derive(Parser, Debug)]
#[command(name = "transfer-market")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML config file; the built-in roster is used if omitted
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// Random seed for reproducible shopping orders and delays
    #[arg(long)]
    seed: Option<u64>,

    /// Overall auction deadline in seconds
    #[arg(short = 't', long)]
    timeout_secs: Option<u64>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => config::Config::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => config::Config::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(timeout_secs) = args.timeout_secs {
        config.timeout_secs = timeout_secs;
    }
    config.validate()?;

    let auction = auction::Auction::from_config(&config)?;
    let svc_ctl = service::ServiceControl::new();

    ctrlc::set_handler({
        let svc_ctl = svc_ctl.clone();
        move || {
            eprintln!("Stopping all buyers...");
            svc_ctl.stop_all();
        }
    })?;

    let outcome = auction.run(
        &svc_ctl,
        &auction::RunOptions::from_config(&config),
        event_log::TracingLog::new_shared(),
    )?;
    info!(
        timed_out = outcome.timed_out,
        cancelled = outcome.cancelled(),
        "transfer window closed"
    );

    let summary = report::Summary::collect(auction.buyers(), auction.catalog());
    println!("{summary}");

    if !summary.is_balanced() {
        bail!("accounting mismatch: spent {} but sold {}", summary.total_spent, summary.sold_value);
    }
    Ok(())
}

#[cfg(test)]
mod tests;
