//! TR-064 exporter
//!
//! Discovers the pollable actions of a TR-064 device once at startup,
//! then refreshes one Prometheus gauge per numeric action output on a
//! fixed cadence and serves them on `/metrics`.

use anyhow::{Context, Result};
use clap::Parser;
use exporter_lib::{
    health::{components, HealthRegistry},
    mapping::{discover, Device, ScrapeLoopBuilder},
    observability::{ExporterMetrics, StructuredLogger},
    tr64::Tr64Client,
    MetricRegistry,
};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;

const EXPORTER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and env filter
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    let cli = config::Cli::parse();
    let config = config::ExporterConfig::load(&cli)?;
    info!(host = %config.host, port = config.port, "Exporter configured");

    let logger = StructuredLogger::new(&config.host);
    logger.log_startup(EXPORTER_VERSION, config.listen_port);

    let health_registry = HealthRegistry::new();
    health_registry.register(components::DISCOVERY).await;
    health_registry.register(components::DEVICE).await;

    let registry = MetricRegistry::new();
    let metrics = ExporterMetrics::register(&registry)?;

    // Serve health probes while discovery is still running
    let app_state = Arc::new(api::AppState::new(health_registry.clone(), registry.clone()));
    let api_handle = tokio::spawn(api::serve(config.listen_port, app_state));

    let device: Arc<dyn Device> =
        Arc::new(Tr64Client::new(config.tr64()).context("Failed to set up TR-064 client")?);

    let bindings = match discover(device.as_ref(), &registry, &config.discovery()?).await {
        Ok(bindings) => bindings,
        Err(e) => {
            error!(error = %e, "Discovery failed, no metrics can be exported");
            health_registry
                .set_unhealthy(components::DISCOVERY, e.to_string())
                .await;
            return Err(e.into());
        }
    };
    metrics.set_bound_metrics(bindings.len());

    let scrape = config.scrape();
    let scrape_loop = ScrapeLoopBuilder::new()
        .device(device)
        .bindings(bindings)
        .interval(scrape.interval)
        .invoke_timeout(scrape.invoke_timeout)
        .concurrency(scrape.concurrency)
        .metrics(metrics)
        .health(health_registry.clone())
        .build()?;

    logger.log_discovery(scrape_loop.bindings().len());
    health_registry.set_ready(true);

    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel(1);
    let scrape_handle = tokio::spawn(scrape_loop.run(shutdown_rx));

    tokio::select! {
        result = api_handle => {
            result.context("Metrics server task panicked")??;
            anyhow::bail!("Metrics server exited unexpectedly");
        }
        _ = tokio::signal::ctrl_c() => {
            logger.log_shutdown("SIGINT received");
        }
    }

    let _ = shutdown_tx.send(());
    scrape_handle.await?;
    info!("Shutting down");

    Ok(())
}
