use anyhow::{Context, Result};
use burstwatch_server::app::{App, InputOutcome};
use burstwatch_server::config::AppConfig;
use burstwatch_server::ingest;
use burstwatch_server::logging;
use std::io::BufReader;
use tokio::signal;

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  burstwatch [config.toml]    Read product events (JSON lines) from stdin");
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    if matches!(args.get(1).map(String::as_str), Some("--help" | "-h")) {
        print_usage();
        return Ok(());
    }

    let config_path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("config/burstwatch.toml");
    let config = AppConfig::load(config_path)
        .with_context(|| format!("failed to load configuration from {config_path}"))?;

    logging::init(&config.logging)?;

    tracing::info!(
        threshold = config.detector.threshold,
        window_secs = config.detector.window_secs,
        workers = config.ingest.workers,
        notify = ?config.notify.mode,
        machine_id = config.alert_ids.machine_id,
        node_id = config.alert_ids.node_id,
        "Starting burstwatch"
    );

    // stdin is read on its own thread; a read still blocked there after
    // Ctrl+C does not hold up the exit
    let lines = ingest::spawn_line_reader(
        BufReader::new(std::io::stdin()),
        config.ingest.queue_capacity,
    )
    .context("failed to start stdin reader")?;

    let shutdown = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!(error = %e, "Ctrl+C handler unavailable; running until EOF");
            std::future::pending::<()>().await;
        }
    };

    let summary = App::new(config).run(lines, shutdown).await?;
    match summary.input {
        InputOutcome::Failed(e) => Err(e),
        InputOutcome::Exhausted(_) | InputOutcome::Interrupted => Ok(()),
    }
}
