//! Service-discovery-to-metric mapping engine
//!
//! Reads a device's catalog once, keeps the zero-argument actions with
//! numeric outputs, names a gauge for each output and refreshes those
//! gauges on a fixed cadence.

mod binding;
mod control_url;
mod discovery;
mod filter;
mod naming;
mod scrape;


pub use binding::MetricBinding;
pub use control_url::ControlUrlCache;
pub use discovery::{discover, DiscoveryOptions};
pub use filter::{ActionFilter, FilterDecision, RejectReason, ACCEPTED_TYPES, DEFAULT_EXCLUDED_ACTIONS};
pub use naming::{action_metric_name, parameter_metric_name, NameScheme, METRIC_NAMESPACE};
pub use scrape::{ScrapeConfig, ScrapeLoop, ScrapeLoopBuilder, ScrapeResults};

use crate::catalog::{Catalog, ServiceType};
use crate::error::TransportError;
use std::collections::HashMap;
use std::time::Duration;

pub use async_trait::async_trait;

/// Remote-control capability of a single device
#[async_trait]
pub trait Device: Send + Sync {
    /// Stable identity of the device, used to key cached control URLs
    fn id(&self) -> &str;

    /// Load every advertised service and action
    async fn load_catalog(&self) -> Result<Catalog, TransportError>;

    /// Resolve the endpoint used to invoke actions of `service`
    async fn resolve_control_url(&self, service: &ServiceType) -> Result<String, TransportError>;

    /// Invoke a zero-argument action and return its output values by name
    async fn invoke(
        &self,
        control_url: &str,
        service: &ServiceType,
        action: &str,
        timeout: Duration,
    ) -> Result<HashMap<String, String>, TransportError>;
}
