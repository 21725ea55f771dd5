//! HTTP client for a single TR-064 device

use super::description::{parse_description, parse_scpd, ServiceEntry};
use super::soap::{build_envelope, parse_response};
use crate::catalog::{Catalog, ServiceType};
use crate::error::TransportError;
use crate::mapping::{async_trait, Device};
use reqwest::{Client, RequestBuilder, StatusCode};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use url::Url;

/// Connection settings for a TR-064 device
#[derive(Debug, Clone)]
pub struct Tr64Config {
    /// Host name or address of the device (default: fritz.box)
    pub host: String,
    /// TR-064 port (default: 49000)
    pub port: u16,
    /// Path of the device description document
    pub description_path: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Timeout for description and SCPD downloads
    pub request_timeout: Duration,
}

impl Default for Tr64Config {
    fn default() -> Self {
        Self {
            host: "fritz.box".to_string(),
            port: 49000,
            description_path: "tr64desc.xml".to_string(),
            username: None,
            password: None,
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// TR-064 device reached over HTTP
pub struct Tr64Client {
    http: Client,
    base_url: Url,
    id: String,
    config: Tr64Config,
    /// Service entries from the last description download
    services: RwLock<HashMap<ServiceType, ServiceEntry>>,
}

impl Tr64Client {
    pub fn new(config: Tr64Config) -> Result<Self, TransportError> {
        let base_url = Url::parse(&format!("http://{}:{}/", config.host, config.port))?;
        let http = Client::builder().timeout(config.request_timeout).build()?;

        Ok(Self {
            http,
            id: base_url.to_string(),
            base_url,
            config,
            services: RwLock::new(HashMap::new()),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn authenticated(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.username {
            Some(user) => request.basic_auth(user, self.config.password.as_deref()),
            None => request,
        }
    }

    async fn fetch(&self, path: &str) -> Result<String, TransportError> {
        let url = self.base_url.join(path)?;
        debug!(url = %url, "Fetching document");

        let response = self.authenticated(self.http.get(url.clone())).send().await?;
        if !response.status().is_success() {
            return Err(TransportError::Status {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        Ok(response.text().await?)
    }

    /// Download the device description and remember its services
    async fn load_services(&self) -> Result<Vec<ServiceEntry>, TransportError> {
        let xml = self.fetch(&self.config.description_path).await?;
        let entries = parse_description(&xml)?;

        let mut services = self.services.write().await;
        services.clear();
        services.extend(
            entries
                .iter()
                .map(|entry| (entry.service_type.clone(), entry.clone())),
        );

        Ok(entries)
    }
}

#[async_trait]
impl Device for Tr64Client {
    fn id(&self) -> &str {
        &self.id
    }

    async fn load_catalog(&self) -> Result<Catalog, TransportError> {
        let entries = self.load_services().await?;
        let mut catalog = Catalog::new();

        for entry in entries {
            let xml = self.fetch(&entry.scpd_url).await?;
            let actions = parse_scpd(&xml)?;
            debug!(service = %entry.service_type, actions = actions.len(), "Loaded SCPD");

            catalog.insert_service(entry.service_type.clone());
            for action in actions {
                catalog.insert_action(entry.service_type.clone(), action);
            }
        }

        info!(device = %self.id, services = catalog.service_count(), "Loaded device description");
        Ok(catalog)
    }

    async fn resolve_control_url(&self, service: &ServiceType) -> Result<String, TransportError> {
        if self.services.read().await.is_empty() {
            self.load_services().await?;
        }

        let services = self.services.read().await;
        let entry = services
            .get(service)
            .ok_or_else(|| TransportError::UnknownService(service.to_string()))?;
        Ok(self.base_url.join(&entry.control_url)?.to_string())
    }

    async fn invoke(
        &self,
        control_url: &str,
        service: &ServiceType,
        action: &str,
        timeout: Duration,
    ) -> Result<HashMap<String, String>, TransportError> {
        let request = self
            .http
            .post(control_url)
            .timeout(timeout)
            .header("Content-Type", r#"text/xml; charset="utf-8""#)
            .header("SOAPAction", format!("\"{service}#{action}\""))
            .body(build_envelope(service.as_str(), action));

        let response = self.authenticated(request).send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout(timeout)
            } else {
                TransportError::Http(e)
            }
        })?;

        let status = response.status();
        let body = response.text().await?;

        match (status.is_success(), parse_response(&body)) {
            (_, Err(fault @ TransportError::Fault { .. })) => Err(fault),
            (true, result) => result,
            (false, _) => {
                if status == StatusCode::UNAUTHORIZED {
                    warn!(service = %service, action = %action, "Device rejected credentials");
                }
                Err(TransportError::Status {
                    status: status.as_u16(),
                    url: control_url.to_string(),
                })
            }
        }
    }
}
