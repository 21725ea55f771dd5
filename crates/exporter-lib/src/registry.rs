//! Prometheus registry adapter
//!
//! Hands out settable gauges for synthesized names and refuses a name
//! that has already been handed out.

use crate::error::RegistryError;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use prometheus::core::Collector;
use prometheus::proto::MetricFamily;
use prometheus::{Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

/// Registry of device gauges and exporter self-metrics
#[derive(Clone, Default)]
pub struct MetricRegistry {
    registry: Registry,
    gauges: Arc<DashMap<String, Gauge>>,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a gauge under `name`
    ///
    /// Returns [`RegistryError::DuplicateMetric`] if the name is taken,
    /// whether by an earlier gauge or by a self-metric.
    pub fn register_gauge(&self, name: &str, help: &str) -> Result<Gauge, RegistryError> {
        match self.gauges.entry(name.to_string()) {
            Entry::Occupied(_) => Err(RegistryError::DuplicateMetric(name.to_string())),
            Entry::Vacant(slot) => {
                let gauge = Gauge::with_opts(Opts::new(name, help))?;
                self.registry
                    .register(Box::new(gauge.clone()))
                    .map_err(|e| match e {
                        prometheus::Error::AlreadyReg => {
                            RegistryError::DuplicateMetric(name.to_string())
                        }
                        other => RegistryError::Prometheus(other),
                    })?;
                slot.insert(gauge.clone());
                Ok(gauge)
            }
        }
    }

    /// Register an arbitrary collector (used for self-metrics)
    pub fn register_collector<C>(&self, collector: C) -> Result<(), RegistryError>
    where
        C: Collector + 'static,
    {
        self.registry.register(Box::new(collector))?;
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.gauges.contains_key(name)
    }

    /// Number of device gauges handed out
    pub fn len(&self) -> usize {
        self.gauges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gauges.is_empty()
    }

    pub fn gather(&self) -> Vec<MetricFamily> {
        self.registry.gather()
    }

    /// Render all metrics in the Prometheus text exposition format
    pub fn encode_text(&self) -> Result<String, RegistryError> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}
