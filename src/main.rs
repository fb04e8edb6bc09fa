//! Mirage Binary Entry Point
//!
//! Thin process supervisor: loads configuration, starts the export pipeline
//! and the update scheduler, blocks on a termination signal, then performs a
//! bounded-time final flush. Core functionality is provided by the `mirage`
//! library crate.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use mirage::{
    config::Config,
    export::{self, DEFAULT_COLLECT_PERIOD, FLUSH_TIMEOUT},
    generator::{InstrumentSet, UpdateScheduler},
};
use opentelemetry::metrics::MeterProvider;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Mirage - Synthetic OTLP Metrics Generator
#[derive(Parser, Debug)]
#[command(name = "mirage", version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.yaml", env = "MIRAGE_CONFIG")]
    config: String,

    /// Export target (overrides the environment default)
    #[arg(long, env = "OTLP_EXPORTER_OTLP_ENDPOINT")]
    endpoint: Option<String>,

    /// Collection period of the exporter (e.g. "3s", "500ms")
    #[arg(long, default_value = "3s", value_parser = humantime::parse_duration)]
    collect_period: Duration,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,mirage=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Mirage - Synthetic OTLP Metrics Generator");

    let cli = Cli::parse();

    // Load configuration; any failure falls back to the documented defaults.
    tracing::info!("Loading configuration from: {}", cli.config);
    let config = Config::load_or_default(&cli.config);
    tracing::info!(
        host = %config.host,
        port = %config.port,
        update_interval_seconds = config.update_interval_seconds,
        "Configuration loaded"
    );

    // Start the exporter controller. Its periodic reader drives the
    // asynchronous instruments on its own clock from here on.
    let collect_period = if cli.collect_period.is_zero() {
        tracing::warn!("Collection period must be positive, using default");
        DEFAULT_COLLECT_PERIOD
    } else {
        cli.collect_period
    };
    let endpoint = export::resolve_endpoint(cli.endpoint);
    let provider = export::init_provider(&endpoint, collect_period)?;

    // Instrument registration is fatal on failure: the process must not run
    // with a half-registered instrument set.
    let meter = provider.meter("mirage");
    let instruments = Arc::new(InstrumentSet::register(&meter, &config)?);

    // Start the synchronous update loop.
    let scheduler_handle = UpdateScheduler::new(&config, instruments).spawn();

    tracing::info!("Reporting measurements to {}", endpoint);
    tracing::info!("Press Ctrl+C to shutdown");

    shutdown_signal().await;

    // The update loop carries no shutdown obligation; abandon it.
    scheduler_handle.abort();

    tracing::info!("Flushing final metrics...");
    if let Err(e) = export::shutdown_with_timeout(provider, FLUSH_TIMEOUT).await {
        tracing::error!(error = %e, "Final export flush failed");
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Block until an interrupt, quit, or terminate signal arrives.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    let quit = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::quit())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    #[cfg(not(unix))]
    let quit = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            tracing::info!("Received terminate signal");
        }
        _ = quit => {
            tracing::info!("Received quit signal");
        }
    }
}
