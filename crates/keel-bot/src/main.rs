//! keel: reconciliation-driven market maker, entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{error, info};

use keel_bot::{allocate, config, AppConfig, PairEngine};
use keel_exchange::RestClient;

/// Reconciliation-driven market-making engine
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via KEEL_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    keel_telemetry::init_logging();

    let args = Args::parse();
    let config_path = args
        .config
        .or_else(|| std::env::var("KEEL_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "loading configuration");
    let config = AppConfig::from_file(&config_path)?;
    info!(
        pairs = config.pairs.len(),
        capital = %config.capital,
        ?config.mode,
        "configuration loaded"
    );

    let credentials = config::credentials_from_env()?;
    let client = Arc::new(RestClient::with_timeout(
        &config.exchange.api_url,
        credentials,
        config.request_timeout(),
    )?);

    if config.metrics.enabled {
        let listen: SocketAddr = config
            .metrics
            .listen
            .parse()
            .context("invalid metrics listen address")?;
        tokio::spawn(async move {
            if let Err(err) = keel_telemetry::serve_metrics(listen).await {
                error!(error = %err, "metrics server stopped");
            }
        });
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut engines = JoinSet::new();
    for (pair, portion) in allocate(config.capital, &config.pairs) {
        let mut engine = PairEngine::new(client.clone(), pair, portion, &config);
        let rx = shutdown_rx.clone();
        engines.spawn(async move {
            let pair_code = engine.pair_code().to_string();
            engine.run(rx).await.map(|()| pair_code)
        });
    }
    drop(shutdown_rx);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, stopping after in-flight cycles");
                let _ = shutdown_tx.send(true);
            }
            joined = engines.join_next() => match joined {
                None => break,
                Some(Ok(Ok(pair_code))) => info!(pair = %pair_code, "engine finished"),
                Some(Ok(Err(err))) => {
                    // Fail-stop: one engine hit an unrecoverable write
                    // failure. Stop the others cleanly, then exit non-zero
                    // so an operator inspects exchange state before any
                    // restart.
                    error!(error = %err, "engine failed, stopping all runs");
                    let _ = shutdown_tx.send(true);
                    while engines.join_next().await.is_some() {}
                    return Err(err.into());
                }
                Some(Err(join_err)) => {
                    let _ = shutdown_tx.send(true);
                    return Err(join_err.into());
                }
            }
        }
    }

    info!("all engines finished");
    Ok(())
}
