//! One-shot discovery pass: catalog to registered bindings

use super::naming::{action_metric_name, parameter_metric_name, NameScheme};
use super::{ActionFilter, Device, FilterDecision, MetricBinding};
use crate::error::{DiscoveryError, RegistryError};
use crate::registry::MetricRegistry;
use tracing::{debug, info, warn};

/// Knobs for the discovery pass
#[derive(Debug, Clone, Default)]
pub struct DiscoveryOptions {
    pub filter: ActionFilter,
    pub scheme: NameScheme,
    /// Name single-output actions after the action instead of the output
    pub name_scalar_actions_by_action: bool,
}

/// Load the catalog of `device` and register one binding per numeric output
///
/// Only a catalog failure is returned as an error. Name collisions are
/// logged and skipped; the remaining bindings are still produced.
pub async fn discover(
    device: &dyn Device,
    registry: &MetricRegistry,
    options: &DiscoveryOptions,
) -> Result<Vec<MetricBinding>, DiscoveryError> {
    let catalog = device
        .load_catalog()
        .await
        .map_err(DiscoveryError::Catalog)?;

    info!(
        device = %device.id(),
        services = catalog.service_count(),
        actions = catalog.action_count(),
        "Loaded service catalog"
    );

    let mut bindings = Vec::new();
    let mut skipped = 0usize;

    for (service, actions) in catalog.services() {
        for (action_name, action) in actions {
            let outputs = match options.filter.evaluate(action) {
                FilterDecision::Accepted(outputs) => outputs,
                FilterDecision::Rejected(reason) => {
                    debug!(service = %service, action = %action_name, reason = reason.as_str(), "Dropping action");
                    continue;
                }
            };

            let scalar = options.name_scalar_actions_by_action && outputs.len() == 1;

            for output in outputs {
                let name = if scalar {
                    action_metric_name(service, action_name, options.scheme)
                } else {
                    parameter_metric_name(service, &output, options.scheme)
                };

                match MetricBinding::register(registry, name, service.clone(), action_name.clone(), output) {
                    Ok(binding) => {
                        debug!(metric = %binding.name(), service = %service, action = %action_name, "Bound metric");
                        bindings.push(binding);
                    }
                    Err(RegistryError::DuplicateMetric(metric)) => {
                        skipped += 1;
                        warn!(metric = %metric, service = %service, action = %action_name, "Skipping duplicate metric");
                    }
                    Err(e) => {
                        skipped += 1;
                        warn!(service = %service, action = %action_name, error = %e, "Skipping unregistrable metric");
                    }
                }
            }
        }
    }

    info!(
        device = %device.id(),
        bound = bindings.len(),
        skipped = skipped,
        "Discovery complete"
    );

    Ok(bindings)
}
