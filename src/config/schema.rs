//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Root configuration for the edge gateway.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Address and port the listener binds to.
    pub entry_point: EntryPoint,

    /// Directory served for requests that match no route.
    pub root_folder: String,

    /// Name this instance registers under.
    pub service_name: String,

    /// Rewrite unmatched, non-asset paths to `/` before static serving.
    pub spa_mode: bool,

    /// Discovery service connection and registration.
    pub consul: ConsulConfig,

    /// Where to fetch route mappings and tags from at startup.
    pub config_origin: OriginPolicy,

    /// Where to fetch additional registration tags from at startup.
    ///
    /// These tags are appended after the static and config-origin tags,
    /// duplicates dropped; they do not replace the static tags.
    pub tags_origin: OriginPolicy,

    /// Commands run in order before serving starts.
    pub pre_init: Vec<PreInitCommand>,

    /// Statically configured reverse-proxy routes, keyed by name.
    pub routes: BTreeMap<String, RouteMapping>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            entry_point: EntryPoint::default(),
            root_folder: "/var/www/html".to_string(),
            service_name: "unknown".to_string(),
            spa_mode: false,
            consul: ConsulConfig::default(),
            config_origin: OriginPolicy::default(),
            tags_origin: OriginPolicy::default(),
            pre_init: Vec::new(),
            routes: BTreeMap::new(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener entry point.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct EntryPoint {
    /// Bind address (e.g., "0.0.0.0").
    pub address: String,

    /// Bind port; 0 asks the OS for an ephemeral port.
    pub port: u16,

    /// Address announced to discovery instead of the detected one.
    pub advertise_address: Option<String>,
}

impl Default for EntryPoint {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 0,
            advertise_address: None,
        }
    }
}

impl EntryPoint {
    /// The `address:port` pair handed to the socket layer.
    pub fn bind_target(&self) -> String {
        if self.address.contains(':') && !self.address.starts_with('[') {
            format!("[{}]:{}", self.address, self.port)
        } else {
            format!("{}:{}", self.address, self.port)
        }
    }
}

/// Error returned by the `host:port` style parsers.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected HOST:PORT, got '{input}': {reason}")]
pub struct HostPortParseError {
    pub input: String,
    pub reason: String,
}

fn split_host_port(s: &str) -> Result<(String, u16), HostPortParseError> {
    let fail = |reason: &str| HostPortParseError {
        input: s.to_string(),
        reason: reason.to_string(),
    };
    let (host, port) = s.rsplit_once(':').ok_or_else(|| fail("missing ':'"))?;
    let port = port
        .parse::<u16>()
        .map_err(|e| fail(&format!("invalid port: {}", e)))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(fail("empty host"));
    }
    Ok((host.to_string(), port))
}

impl FromStr for EntryPoint {
    type Err = HostPortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, port) = split_host_port(s)?;
        Ok(Self {
            address,
            port,
            advertise_address: None,
        })
    }
}

/// Consul agent address given on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsulAddress {
    pub host: String,
    pub port: u16,
}

impl FromStr for ConsulAddress {
    type Err = HostPortParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = split_host_port(s)?;
        Ok(Self { host, port })
    }
}

/// Discovery service (Consul agent) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ConsulConfig {
    /// Register this instance on startup.
    pub register: bool,

    /// Agent host.
    pub host: String,

    /// Agent HTTP port.
    pub port: u16,

    /// Tags attached to the registration.
    pub tags: Vec<String>,
}

impl Default for ConsulConfig {
    fn default() -> Self {
        Self {
            register: true,
            host: "127.0.0.1".to_string(),
            port: 8500,
            tags: vec!["traefik.enable=false".to_string()],
        }
    }
}

/// Where a remote document is fetched from and how failure is treated.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OriginPolicy {
    /// Fetch the document at startup.
    pub enabled: bool,

    /// Service whose instances serve the document.
    pub service_name: String,

    /// Resource path requested on each instance.
    pub path: String,

    /// Abort startup when no instance yields a document.
    pub fatal: bool,
}

impl Default for OriginPolicy {
    fn default() -> Self {
        Self {
            enabled: false,
            service_name: "config".to_string(),
            path: "/unknown/config.yml".to_string(),
            fatal: true,
        }
    }
}

/// A single pre-init command line.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PreInitCommand {
    pub command: String,
}

/// Reverse-proxy rule for a path prefix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct RouteMapping {
    /// Path prefix to match.
    pub path: String,

    /// Target scheme.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Target `host[:port]`.
    pub host: String,

    /// Remove the matched prefix before forwarding.
    #[serde(default)]
    pub strip_prefix: bool,

    /// Prepended to the forwarded path.
    #[serde(default)]
    pub prefix_path: String,
}

fn default_scheme() -> String {
    "http".to_string()
}

/// Timeout configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Whole-request timeout in seconds; unset disables it.
    pub request_secs: Option<u64>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogFormat::Json => f.write_str("json"),
            LogFormat::Pretty => f.write_str("pretty"),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Json,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
