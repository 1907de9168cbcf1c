//! Discovery contract types and error definitions.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// A discovered peer. Produced fresh for every lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    pub address: String,
    pub port: u16,
}

impl ServiceInstance {
    pub fn new(address: impl Into<String>, port: u16) -> Self {
        Self {
            address: address.into(),
            port,
        }
    }

    /// `host:port` authority, bracketing IPv6 literals.
    pub fn authority(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}

/// HTTP health check attached to a registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HealthCheck {
    pub http_url: String,
    pub interval: Duration,
    pub timeout: Duration,
    /// Deregister automatically after being critical this long.
    pub deregister_after: Duration,
}

impl HealthCheck {
    pub const INTERVAL: Duration = Duration::from_secs(10);
    pub const TIMEOUT: Duration = Duration::from_secs(1);
    pub const DEREGISTER_AFTER: Duration = Duration::from_secs(15 * 60);

    /// The standard check against an HTTP endpoint.
    pub fn http(url: impl Into<String>) -> Self {
        Self {
            http_url: url.into(),
            interval: Self::INTERVAL,
            timeout: Self::TIMEOUT,
            deregister_after: Self::DEREGISTER_AFTER,
        }
    }
}

/// Everything submitted when registering this instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryRegistration {
    pub instance_id: String,
    pub service_name: String,
    pub tags: Vec<String>,
    pub address: String,
    pub port: u16,
    pub health_check: HealthCheck,
}

/// Errors raised by a discovery backend.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The discovery service could not be reached.
    #[error("discovery service unreachable at {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    /// The discovery service answered with an error status.
    #[error("discovery service returned {status} for {operation}")]
    Status { operation: String, status: u16 },

    /// Transport or decoding failure.
    #[error("discovery request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Service registration and lookup.
#[async_trait]
pub trait Discovery: Send + Sync {
    /// Verify that the discovery service is reachable.
    async fn check_connection(&self) -> Result<(), DiscoveryError>;

    /// Register an instance.
    async fn register(&self, registration: &DiscoveryRegistration) -> Result<(), DiscoveryError>;

    /// Remove an instance by ID.
    async fn deregister(&self, instance_id: &str) -> Result<(), DiscoveryError>;

    /// Instances of a service, in the order the backend returns them.
    /// An empty list is a valid answer.
    async fn lookup(&self, service_name: &str) -> Result<Vec<ServiceInstance>, DiscoveryError>;
}
