//! Scrape orchestrator
//!
//! Refreshes every discovered binding on a fixed cadence. A failing
//! binding is logged and counted; it never stops the cycle or the loop.

use super::{ControlUrlCache, Device, MetricBinding};
use crate::health::{components, HealthRegistry};
use crate::observability::ExporterMetrics;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Configuration for the scrape loop
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Pause between cycles (default: 2 seconds)
    pub interval: Duration,
    /// Upper bound for a single action invocation (default: 5 seconds)
    pub invoke_timeout: Duration,
    /// Refreshes in flight per cycle (default: 1, sequential)
    pub concurrency: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(2),
            invoke_timeout: Duration::from_secs(5),
            concurrency: 1,
        }
    }
}

/// Results from a scrape cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScrapeResults {
    pub refreshed: usize,
    pub failed: usize,
}

/// Loop that refreshes a fixed set of bindings forever
pub struct ScrapeLoop {
    device: Arc<dyn Device>,
    bindings: Vec<MetricBinding>,
    cache: ControlUrlCache,
    config: ScrapeConfig,
    metrics: Option<ExporterMetrics>,
    health: Option<HealthRegistry>,
}

impl ScrapeLoop {
    pub fn new(device: Arc<dyn Device>, bindings: Vec<MetricBinding>, config: ScrapeConfig) -> Self {
        Self {
            device,
            bindings,
            cache: ControlUrlCache::new(),
            config,
            metrics: None,
            health: None,
        }
    }

    pub fn bindings(&self) -> &[MetricBinding] {
        &self.bindings
    }

    /// Run until `shutdown` fires
    pub async fn run(self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            interval_ms = self.config.interval.as_millis(),
            bindings = self.bindings.len(),
            "Starting scrape loop"
        );

        let mut ticker = interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut cycles = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let start = Instant::now();
                    let results = self.scrape_once().await;
                    let elapsed = start.elapsed();
                    cycles += 1;

                    if let Some(metrics) = &self.metrics {
                        metrics.observe_scrape_duration(elapsed.as_secs_f64());
                    }
                    self.report_health(results).await;

                    debug!(
                        cycle = cycles,
                        refreshed = results.refreshed,
                        failed = results.failed,
                        elapsed_ms = elapsed.as_millis(),
                        "Scrape cycle complete"
                    );
                }
                _ = shutdown.recv() => {
                    info!("Shutting down scrape loop");
                    break;
                }
            }
        }
    }

    /// Refresh every binding once
    pub async fn scrape_once(&self) -> ScrapeResults {
        let refreshes: Vec<_> = self.bindings.iter().map(|b| self.refresh_one(b)).collect();
        let outcomes: Vec<bool> = stream::iter(refreshes)
            .buffer_unordered(self.config.concurrency.max(1))
            .collect()
            .await;

        let refreshed = outcomes.iter().filter(|ok| **ok).count();
        ScrapeResults {
            refreshed,
            failed: outcomes.len() - refreshed,
        }
    }

    async fn refresh_one(&self, binding: &MetricBinding) -> bool {
        match binding
            .refresh(self.device.as_ref(), &self.cache, self.config.invoke_timeout)
            .await
        {
            Ok(_) => true,
            Err(e) => {
                if let Some(metrics) = &self.metrics {
                    metrics.inc_refresh_errors(e.kind());
                }
                debug!(
                    metric = %binding.name(),
                    service = %binding.service(),
                    action = %binding.action(),
                    error = %e,
                    "Failed to refresh metric"
                );
                false
            }
        }
    }

    async fn report_health(&self, results: ScrapeResults) {
        let Some(health) = &self.health else {
            return;
        };

        if results.failed == 0 {
            health.set_healthy(components::DEVICE).await;
        } else if results.refreshed == 0 {
            warn!(failed = results.failed, "Every refresh failed this cycle");
            health
                .set_unhealthy(components::DEVICE, format!("all {} refreshes failed", results.failed))
                .await;
        } else {
            health
                .set_degraded(
                    components::DEVICE,
                    format!("{} of {} refreshes failed", results.failed, results.failed + results.refreshed),
                )
                .await;
        }
    }
}

/// Builder for creating the scrape loop
pub struct ScrapeLoopBuilder {
    device: Option<Arc<dyn Device>>,
    bindings: Vec<MetricBinding>,
    config: ScrapeConfig,
    metrics: Option<ExporterMetrics>,
    health: Option<HealthRegistry>,
}

impl ScrapeLoopBuilder {
    /// Create a new builder with default configuration
    pub fn new() -> Self {
        Self {
            device: None,
            bindings: Vec::new(),
            config: ScrapeConfig::default(),
            metrics: None,
            health: None,
        }
    }

    /// Set the device to poll
    pub fn device(mut self, device: Arc<dyn Device>) -> Self {
        self.device = Some(device);
        self
    }

    /// Set the bindings produced by discovery
    pub fn bindings(mut self, bindings: Vec<MetricBinding>) -> Self {
        self.bindings = bindings;
        self
    }

    /// Set the pause between cycles
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Set the per-invocation timeout
    pub fn invoke_timeout(mut self, timeout: Duration) -> Self {
        self.config.invoke_timeout = timeout;
        self
    }

    /// Set how many refreshes may run at once
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn metrics(mut self, metrics: ExporterMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn health(mut self, health: HealthRegistry) -> Self {
        self.health = Some(health);
        self
    }

    /// Build the scrape loop
    pub fn build(self) -> Result<ScrapeLoop> {
        let device = self
            .device
            .ok_or_else(|| anyhow::anyhow!("Device is required"))?;
        if self.config.interval.is_zero() {
            anyhow::bail!("Scrape interval must be positive");
        }

        let mut scrape_loop = ScrapeLoop::new(device, self.bindings, self.config);
        scrape_loop.metrics = self.metrics;
        scrape_loop.health = self.health;
        Ok(scrape_loop)
    }
}

impl Default for ScrapeLoopBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scrape_config_default() {
        let config = ScrapeConfig::default();
        assert_eq!(config.interval, Duration::from_secs(2));
        assert_eq!(config.invoke_timeout, Duration::from_secs(5));
        assert_eq!(config.concurrency, 1);
    }

    #[test]
    fn test_builder_missing_device() {
        let result = ScrapeLoopBuilder::new().interval(Duration::from_secs(1)).build();
        assert!(result.is_err());
    }
}
