//! beat-exporter - Elastic Beat stats collector
//!
//! This binary polls a Beat's HTTP monitoring endpoint on a fixed interval
//! and writes every cycle's measurements to stdout as InfluxDB line protocol.

use std::future::Future;
use std::io::Write;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tracing::{error, info};

use beat_exporter::accumulator::{LineProtocolFormatter, MemoryAccumulator};
use beat_exporter::cli::Cli;
use beat_exporter::collector::Beat;
use beat_exporter::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse();

    if cli.sample_config {
        print!("{}", Beat::sample_config());
        return Ok(());
    }

    // Initialize logging
    beat_exporter::init_logging(&cli.log_level.to_string())?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Starting beat-exporter"
    );

    // Load configuration
    let mut config = if cli.validate {
        Config::load(&cli.config)
    } else {
        Config::load_or_default(&cli.config)
    }
    .with_context(|| format!("Failed to load {}", cli.config.display()))?;
    cli.apply_overrides(&mut config);
    config.validate()?;

    if cli.validate {
        println!("Configuration is valid: {}", cli.config.display());
        return Ok(());
    }

    let formatter = LineProtocolFormatter::new().with_timestamps(cli.timestamps);
    let interval = config.agent.interval;
    let beat = Beat::new(config.beat);

    if cli.once {
        return run_cycle(&beat, &formatter).await;
    }

    info!(interval = ?interval, url = %beat.config().url, "Collecting Beat stats");

    run_loop(&beat, &formatter, interval, signal::ctrl_c()).await
}

/// Collect on every tick until `shutdown` resolves
///
/// `shutdown` is polled across cycles, so a signal raised while a cycle is
/// running ends the loop once that cycle finishes.
async fn run_loop<F: Future>(
    beat: &Beat,
    formatter: &LineProtocolFormatter,
    interval: Duration,
    shutdown: F,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if let Err(e) = run_cycle(beat, formatter).await {
                    error!(error = %e, "Collection cycle failed");
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                return Ok(());
            }
        }
    }
}

/// Run one collection cycle and print its measurements
async fn run_cycle(beat: &Beat, formatter: &LineProtocolFormatter) -> Result<()> {
    let mut acc = MemoryAccumulator::new();
    beat.gather(&mut acc).await?;

    let output = formatter.format(acc.measurements());
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(output.as_bytes())?;
    stdout.flush()?;

    Ok(())
}
