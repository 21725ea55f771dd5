//! Exporter library for TR-064 devices
//!
//! This crate provides the core functionality for:
//! - Loading a device's service/action catalog over TR-064
//! - Selecting pollable actions and deriving metric names
//! - Binding device values to Prometheus gauges and refreshing them
//! - Health checks and observability

pub mod catalog;
pub mod error;
pub mod health;
pub mod mapping;
pub mod observability;
pub mod registry;
pub mod tr64;

pub use catalog::{ActionDescriptor, Catalog, Parameter, ServiceType};
pub use error::{DiscoveryError, RefreshError, RegistryError, TransportError};
pub use health::{
    ComponentHealth, ComponentStatus, HealthRegistry, HealthResponse, ReadinessResponse,
};
pub use observability::{ExporterMetrics, StructuredLogger};
pub use registry::MetricRegistry;
