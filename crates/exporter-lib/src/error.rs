//! Error types shared by the mapping engine and the transport

use std::time::Duration;
use thiserror::Error;

/// Failures talking to the device
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    Status { status: u16, url: String },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("malformed description document: {0}")]
    Description(#[from] quick_xml::DeError),

    #[error("SOAP fault {code}: {description}")]
    Fault { code: String, description: String },

    #[error("service {0} is not advertised by the device")]
    UnknownService(String),

    #[error("call timed out after {0:?}")]
    Timeout(Duration),
}

/// Catalog or control URL resolution failed
///
/// Fatal at startup: without a catalog no metrics can be produced.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("failed to load service catalog: {0}")]
    Catalog(#[source] TransportError),

    #[error("failed to resolve control URL for {service}: {source}")]
    ControlUrl {
        service: String,
        #[source]
        source: TransportError,
    },
}

/// Gauge registration failures
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("metric {0} is already registered")]
    DuplicateMetric(String),

    #[error("prometheus rejected metric: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Per-binding failure during a scrape cycle
#[derive(Debug, Error)]
pub enum RefreshError {
    #[error(transparent)]
    ControlUrl(#[from] DiscoveryError),

    #[error("invoking {service}#{action} failed: {source}")]
    Invoke {
        service: String,
        action: String,
        #[source]
        source: TransportError,
    },

    #[error("{service}#{action} did not answer within {timeout:?}")]
    Timeout {
        service: String,
        action: String,
        timeout: Duration,
    },

    #[error("result of {action} has no {key}")]
    MissingKey { action: String, key: String },

    #[error("{key}={value:?} is not a number")]
    TypeCoercion { key: String, value: String },
}

impl RefreshError {
    /// Stable label used for the refresh error counter
    pub fn kind(&self) -> &'static str {
        match self {
            RefreshError::ControlUrl(_) => "control_url",
            RefreshError::Invoke { .. } => "invoke",
            RefreshError::Timeout { .. } => "timeout",
            RefreshError::MissingKey { .. } => "missing_key",
            RefreshError::TypeCoercion { .. } => "type_coercion",
        }
    }
}
