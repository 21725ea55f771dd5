//! A synthesized gauge tied to the protocol coordinates of its value

use super::{ControlUrlCache, Device};
use crate::catalog::ServiceType;
use crate::error::{RefreshError, RegistryError, TransportError};
use crate::registry::MetricRegistry;
use prometheus::Gauge;
use std::collections::HashMap;
use std::time::Duration;

/// One gauge fed by one output of one zero-argument action
#[derive(Clone)]
pub struct MetricBinding {
    name: String,
    service: ServiceType,
    action: String,
    output_key: String,
    gauge: Gauge,
}

impl std::fmt::Debug for MetricBinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricBinding")
            .field("name", &self.name)
            .field("service", &self.service)
            .field("action", &self.action)
            .field("output_key", &self.output_key)
            .finish()
    }
}

impl MetricBinding {
    /// Register `name` and bind it to `service#action` output `output_key`
    pub fn register(
        registry: &MetricRegistry,
        name: impl Into<String>,
        service: ServiceType,
        action: impl Into<String>,
        output_key: impl Into<String>,
    ) -> Result<Self, RegistryError> {
        let name = name.into();
        let action = action.into();
        let output_key = output_key.into();

        let help = format!("{output_key} returned by {action} ({service})");
        let gauge = registry.register_gauge(&name, &help)?;

        Ok(Self {
            name,
            service,
            action,
            output_key,
            gauge,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service(&self) -> &ServiceType {
        &self.service
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn output_key(&self) -> &str {
        &self.output_key
    }

    /// Last value written to the gauge
    pub fn value(&self) -> f64 {
        self.gauge.get()
    }

    /// Invoke the action and store the bound output in the gauge
    ///
    /// On failure the gauge keeps its previous value.
    pub async fn refresh(
        &self,
        device: &dyn Device,
        cache: &ControlUrlCache,
        timeout: Duration,
    ) -> Result<f64, RefreshError> {
        let control_url = cache.resolve(device, &self.service).await?;

        let result = tokio::time::timeout(
            timeout,
            device.invoke(&control_url, &self.service, &self.action, timeout),
        )
        .await
        .map_err(|_| RefreshError::Timeout {
            service: self.service.to_string(),
            action: self.action.clone(),
            timeout,
        })?
        .map_err(|source| match source {
            TransportError::Timeout(_) => RefreshError::Timeout {
                service: self.service.to_string(),
                action: self.action.clone(),
                timeout,
            },
            source => RefreshError::Invoke {
                service: self.service.to_string(),
                action: self.action.clone(),
                source,
            },
        })?;

        let value = self.extract(&result)?;
        self.gauge.set(value);
        Ok(value)
    }

    fn extract(&self, result: &HashMap<String, String>) -> Result<f64, RefreshError> {
        let raw = result
            .get(&self.output_key)
            .ok_or_else(|| RefreshError::MissingKey {
                action: self.action.clone(),
                key: self.output_key.clone(),
            })?;

        let trimmed = raw.trim();
        trimmed
            .parse::<i64>()
            .map(|v| v as f64)
            .or_else(|_| trimmed.parse::<f64>())
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| RefreshError::TypeCoercion {
                key: self.output_key.clone(),
                value: raw.clone(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(registry: &MetricRegistry) -> MetricBinding {
        MetricBinding::register(
            registry,
            "tr64_deviceinfo_1_uptime",
            ServiceType::new("urn:dslforum-org:service:DeviceInfo:1"),
            "GetInfo",
            "NewUpTime",
        )
        .unwrap()
    }

    fn result(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_register_duplicate_fails() {
        let registry = MetricRegistry::new();
        binding(&registry);

        let err = MetricBinding::register(
            &registry,
            "tr64_deviceinfo_1_uptime",
            ServiceType::new("Other:1"),
            "GetOther",
            "NewUpTime",
        )
        .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateMetric(_)));
    }

    #[test]
    fn test_extract_integer() {
        let registry = MetricRegistry::new();
        let binding = binding(&registry);
        let value = binding
            .extract(&result(&[("NewUpTime", " 123456 "), ("NewDescription", "box")]))
            .unwrap();
        assert_eq!(value, 123456.0);
    }

    #[test]
    fn test_extract_negative() {
        let registry = MetricRegistry::new();
        let binding = binding(&registry);
        assert_eq!(binding.extract(&result(&[("NewUpTime", "-7")])).unwrap(), -7.0);
    }

    #[test]
    fn test_extract_missing_key() {
        let registry = MetricRegistry::new();
        let binding = binding(&registry);
        let err = binding.extract(&result(&[("NewOther", "1")])).unwrap_err();
        assert!(matches!(err, RefreshError::MissingKey { key, .. } if key == "NewUpTime"));
    }

    #[test]
    fn test_extract_not_a_number() {
        let registry = MetricRegistry::new();
        let binding = binding(&registry);
        for raw in ["abc", "", "NaN", "inf"] {
            let err = binding.extract(&result(&[("NewUpTime", raw)])).unwrap_err();
            assert!(matches!(err, RefreshError::TypeCoercion { .. }), "{raw}");
        }
    }

    #[test]
    fn test_help_text_mentions_coordinates() {
        let registry = MetricRegistry::new();
        binding(&registry);
        let text = registry.encode_text().unwrap();
        assert!(text.contains(
            "# HELP tr64_deviceinfo_1_uptime NewUpTime returned by GetInfo (urn:dslforum-org:service:DeviceInfo:1)"
        ));
    }
}
