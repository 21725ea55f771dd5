//! Observability infrastructure for the exporter
//!
//! Provides:
//! - Self-metrics (scrape latency, refresh errors by kind, bound metric count)
//! - Structured JSON logging of lifecycle events with tracing

use crate::error::RegistryError;
use crate::registry::MetricRegistry;
use prometheus::{Histogram, HistogramOpts, IntCounterVec, IntGauge, Opts};
use tracing::{info, warn};

/// Histogram buckets for scrape cycle duration (in seconds)
const SCRAPE_DURATION_BUCKETS: &[f64] = &[0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0];

/// Exporter self-metrics
///
/// Cloning is cheap; clones share the underlying collectors.
#[derive(Clone)]
pub struct ExporterMetrics {
    scrape_duration_seconds: Histogram,
    refresh_errors: IntCounterVec,
    bound_metrics: IntGauge,
}

impl ExporterMetrics {
    /// Create the self-metrics and register them in `registry`
    pub fn register(registry: &MetricRegistry) -> Result<Self, RegistryError> {
        let scrape_duration_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "tr64_exporter_scrape_duration_seconds",
                "Time spent refreshing every bound metric once",
            )
            .buckets(SCRAPE_DURATION_BUCKETS.to_vec()),
        )?;
        let refresh_errors = IntCounterVec::new(
            Opts::new(
                "tr64_exporter_refresh_errors_total",
                "Failed metric refreshes by error kind",
            ),
            &["kind"],
        )?;
        let bound_metrics = IntGauge::new(
            "tr64_exporter_bound_metrics",
            "Number of device values exported as gauges",
        )?;

        registry.register_collector(scrape_duration_seconds.clone())?;
        registry.register_collector(refresh_errors.clone())?;
        registry.register_collector(bound_metrics.clone())?;

        Ok(Self {
            scrape_duration_seconds,
            refresh_errors,
            bound_metrics,
        })
    }

    pub fn observe_scrape_duration(&self, duration_secs: f64) {
        self.scrape_duration_seconds.observe(duration_secs);
    }

    pub fn inc_refresh_errors(&self, kind: &str) {
        self.refresh_errors.with_label_values(&[kind]).inc();
    }

    pub fn refresh_errors(&self, kind: &str) -> u64 {
        self.refresh_errors.with_label_values(&[kind]).get()
    }

    pub fn set_bound_metrics(&self, count: usize) {
        self.bound_metrics.set(count as i64);
    }
}

/// Structured logger for exporter lifecycle events
#[derive(Clone)]
pub struct StructuredLogger {
    device: String,
}

impl StructuredLogger {
    pub fn new(device: impl Into<String>) -> Self {
        Self {
            device: device.into(),
        }
    }

    pub fn log_startup(&self, version: &str, listen_port: u16) {
        info!(
            event = "exporter_started",
            device = %self.device,
            exporter_version = %version,
            listen_port = listen_port,
            "TR-064 exporter started"
        );
    }

    pub fn log_discovery(&self, bound: usize) {
        if bound == 0 {
            warn!(
                event = "discovery_complete",
                device = %self.device,
                bound = bound,
                "Discovery found nothing to export"
            );
        } else {
            info!(
                event = "discovery_complete",
                device = %self.device,
                bound = bound,
                "Metrics bound, starting scrape loop"
            );
        }
    }

    pub fn log_shutdown(&self, reason: &str) {
        info!(
            event = "exporter_shutdown",
            device = %self.device,
            reason = %reason,
            "TR-064 exporter shutting down"
        );
    }
}
