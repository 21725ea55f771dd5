//! Service/action catalog advertised by a device

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Protocol service identifier, e.g. `urn:dslforum-org:service:WANIPConnection:1`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceType(String);

impl ServiceType {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Colon-separated components of the token
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split(':')
    }

    /// Second to last segment, or the whole token when it has no version
    pub fn short_name(&self) -> &str {
        let mut segments = self.0.rsplit(':');
        let last = segments.next().unwrap_or_default();
        segments.next().unwrap_or(last)
    }

    /// Last segment, if the token has at least two
    pub fn version(&self) -> Option<&str> {
        let mut segments = self.0.rsplitn(2, ':');
        let last = segments.next()?;
        segments.next().map(|_| last)
    }
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ServiceType {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Named action argument with its declared data type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    pub data_type: String,
}

impl Parameter {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Remote action exposed by a service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionDescriptor {
    pub name: String,
    pub inputs: Vec<Parameter>,
    pub outputs: Vec<Parameter>,
}

impl ActionDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    pub fn with_input(mut self, name: &str, data_type: &str) -> Self {
        self.inputs.push(Parameter::new(name, data_type));
        self
    }

    pub fn with_output(mut self, name: &str, data_type: &str) -> Self {
        self.outputs.push(Parameter::new(name, data_type));
        self
    }
}

/// Every service and action a device advertises
///
/// Ordered maps keep discovery (and therefore duplicate resolution) deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    services: BTreeMap<ServiceType, BTreeMap<String, ActionDescriptor>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a service with no actions (replaces nothing if it already exists)
    pub fn insert_service(&mut self, service: ServiceType) {
        self.services.entry(service).or_default();
    }

    pub fn insert_action(&mut self, service: ServiceType, action: ActionDescriptor) {
        self.services
            .entry(service)
            .or_default()
            .insert(action.name.clone(), action);
    }

    pub fn services(&self) -> impl Iterator<Item = (&ServiceType, &BTreeMap<String, ActionDescriptor>)> {
        self.services.iter()
    }

    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    pub fn action_count(&self) -> usize {
        self.services.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_type_segments() {
        let service = ServiceType::new("urn:dslforum-org:service:WANIPConnection:1");
        assert_eq!(service.short_name(), "WANIPConnection");
        assert_eq!(service.version(), Some("1"));
        assert_eq!(service.segments().count(), 5);
    }

    #[test]
    fn test_service_type_without_version() {
        let service = ServiceType::new("Svc");
        assert_eq!(service.short_name(), "Svc");
        assert_eq!(service.version(), None);

        let service = ServiceType::new("Svc:1");
        assert_eq!(service.short_name(), "Svc");
        assert_eq!(service.version(), Some("1"));
    }

    #[test]
    fn test_catalog_counts() {
        let mut catalog = Catalog::new();
        catalog.insert_action(
            "A:1".into(),
            ActionDescriptor::new("GetInfo").with_output("NewUpTime", "ui4"),
        );
        catalog.insert_action("A:1".into(), ActionDescriptor::new("GetStats"));
        catalog.insert_service("B:1".into());

        assert_eq!(catalog.service_count(), 2);
        assert_eq!(catalog.action_count(), 2);
        assert!(!catalog.is_empty());
    }
}
