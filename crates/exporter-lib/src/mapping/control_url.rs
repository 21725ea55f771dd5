//! Memoized control URL resolution

use super::Device;
use crate::catalog::ServiceType;
use crate::error::DiscoveryError;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::debug;

/// Control URLs keyed by (device id, service type)
///
/// Concurrent first lookups of the same key share one resolution. A failed
/// resolution leaves the slot empty so the next lookup retries.
#[derive(Debug, Default)]
pub struct ControlUrlCache {
    entries: DashMap<(String, ServiceType), Arc<OnceCell<String>>>,
}

impl ControlUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn resolve(
        &self,
        device: &dyn Device,
        service: &ServiceType,
    ) -> Result<String, DiscoveryError> {
        // Clone the cell out so no map guard is held across the await
        let cell = self
            .entries
            .entry((device.id().to_string(), service.clone()))
            .or_default()
            .clone();

        let url = cell
            .get_or_try_init(|| async {
                debug!(device = %device.id(), service = %service, "Resolving control URL");
                device
                    .resolve_control_url(service)
                    .await
                    .map_err(|source| DiscoveryError::ControlUrl {
                        service: service.to_string(),
                        source,
                    })
            })
            .await?;

        Ok(url.clone())
    }

    /// Number of resolved entries
    pub fn len(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.value().initialized())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
