//! Consul HTTP API client.
//!
//! # Responsibilities
//! - Check agent reachability
//! - Register and deregister this instance with the local agent
//! - Look up service instances in the catalog
//!
//! # Design Decisions
//! - Wire structs are private; callers see only the `Discovery` types
//! - Durations are sent as Go duration strings in whole seconds

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::config::ConsulConfig;
use crate::discovery::types::{
    Discovery, DiscoveryError, DiscoveryRegistration, ServiceInstance,
};

/// Consul agent client.
#[derive(Debug, Clone)]
pub struct ConsulClient {
    base_url: Url,
    http: reqwest::Client,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceRegistration<'a> {
    #[serde(rename = "ID")]
    id: &'a str,
    name: &'a str,
    tags: &'a [String],
    address: &'a str,
    port: u16,
    enable_tag_override: bool,
    check: AgentServiceCheck,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct AgentServiceCheck {
    #[serde(rename = "HTTP")]
    http: String,
    interval: String,
    timeout: String,
    deregister_critical_service_after: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CatalogService {
    #[serde(default)]
    address: String,
    #[serde(default)]
    service_address: String,
    service_port: u16,
}

impl From<CatalogService> for ServiceInstance {
    fn from(svc: CatalogService) -> Self {
        let address = if svc.service_address.is_empty() {
            svc.address
        } else {
            svc.service_address
        };
        ServiceInstance::new(address, svc.service_port)
    }
}

fn go_duration(d: Duration) -> String {
    format!("{}s", d.as_secs())
}

impl ConsulClient {
    /// Create a client for the agent at `host:port`.
    pub fn new(host: &str, port: u16) -> Result<Self, DiscoveryError> {
        let endpoint = ServiceInstance::new(host, port).authority();
        let base_url = Url::parse(&format!("http://{}/", endpoint)).map_err(|e| {
            DiscoveryError::Connect {
                endpoint: endpoint.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            base_url,
            http: reqwest::Client::new(),
        })
    }

    /// Create a client from configuration.
    pub fn from_config(config: &ConsulConfig) -> Result<Self, DiscoveryError> {
        Self::new(&config.host, config.port)
    }

    fn endpoint(&self, path: &str) -> Result<Url, DiscoveryError> {
        self.base_url.join(path).map_err(|e| DiscoveryError::Connect {
            endpoint: self.base_url.to_string(),
            reason: e.to_string(),
        })
    }

    fn check_status(operation: &str, response: &reqwest::Response) -> Result<(), DiscoveryError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(DiscoveryError::Status {
                operation: operation.to_string(),
                status: status.as_u16(),
            })
        }
    }
}

#[async_trait]
impl Discovery for ConsulClient {
    async fn check_connection(&self) -> Result<(), DiscoveryError> {
        let url = self.endpoint("v1/status/leader")?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| DiscoveryError::Connect {
                endpoint: self.base_url.to_string(),
                reason: e.to_string(),
            })?;
        Self::check_status("status/leader", &response)
    }

    async fn register(&self, registration: &DiscoveryRegistration) -> Result<(), DiscoveryError> {
        let check = &registration.health_check;
        let body = AgentServiceRegistration {
            id: &registration.instance_id,
            name: &registration.service_name,
            tags: &registration.tags,
            address: &registration.address,
            port: registration.port,
            enable_tag_override: false,
            check: AgentServiceCheck {
                http: check.http_url.clone(),
                interval: go_duration(check.interval),
                timeout: go_duration(check.timeout),
                deregister_critical_service_after: go_duration(check.deregister_after),
            },
        };

        let url = self.endpoint("v1/agent/service/register")?;
        let response = self.http.put(url).json(&body).send().await?;
        Self::check_status("agent/service/register", &response)
    }

    async fn deregister(&self, instance_id: &str) -> Result<(), DiscoveryError> {
        let mut url = self.endpoint("v1/agent/service/deregister/")?;
        url.path_segments_mut()
            .map_err(|_| DiscoveryError::Connect {
                endpoint: self.base_url.to_string(),
                reason: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push(instance_id);
        let response = self.http.put(url).send().await?;
        Self::check_status("agent/service/deregister", &response)
    }

    async fn lookup(&self, service_name: &str) -> Result<Vec<ServiceInstance>, DiscoveryError> {
        let mut url = self.endpoint("v1/catalog/service/")?;
        url.path_segments_mut()
            .map_err(|_| DiscoveryError::Connect {
                endpoint: self.base_url.to_string(),
                reason: "base URL cannot carry a path".to_string(),
            })?
            .pop_if_empty()
            .push(service_name);
        let response = self.http.get(url).send().await?;
        Self::check_status("catalog/service", &response)?;

        let services: Vec<CatalogService> = response.json().await?;
        Ok(services.into_iter().map(ServiceInstance::from).collect())
    }
}
