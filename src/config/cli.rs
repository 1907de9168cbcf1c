//! Command-line overrides.

use clap::Parser;
use std::path::PathBuf;

use crate::config::schema::{ConsulAddress, EntryPoint, GatewayConfig, LogFormat};

/// Static file server and edge gateway with discovery registration.
#[derive(Debug, Parser)]
#[command(name = "edge-httpd", version)]
pub struct Cli {
    /// Configuration file to use (TOML).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listener entry point as ADDR:PORT.
    #[arg(long, value_name = "ADDR:PORT")]
    pub entry_point: Option<EntryPoint>,

    /// Directory to serve static files from.
    #[arg(long)]
    pub root_folder: Option<String>,

    /// Service name used for registration.
    #[arg(long)]
    pub service_name: Option<String>,

    /// Enable single-page-application index fallback.
    #[arg(long)]
    pub spa_mode: bool,

    /// Consul agent as HOST:PORT.
    #[arg(long, value_name = "HOST:PORT")]
    pub consul: Option<ConsulAddress>,

    /// Do not register with Consul.
    #[arg(long)]
    pub no_register: bool,

    /// Registration tag; repeat to add several. Replaces configured tags.
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Log level.
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log output format.
    #[arg(long, value_enum)]
    pub log_format: Option<LogFormat>,
}

impl Cli {
    /// Apply command-line values on top of a loaded configuration.
    pub fn apply(&self, config: &mut GatewayConfig) {
        if let Some(ep) = &self.entry_point {
            config.entry_point.address = ep.address.clone();
            config.entry_point.port = ep.port;
        }
        if let Some(root) = &self.root_folder {
            config.root_folder = root.clone();
        }
        if let Some(name) = &self.service_name {
            config.service_name = name.clone();
        }
        if self.spa_mode {
            config.spa_mode = true;
        }
        if let Some(consul) = &self.consul {
            config.consul.host = consul.host.clone();
            config.consul.port = consul.port;
        }
        if self.no_register {
            config.consul.register = false;
        }
        if !self.tags.is_empty() {
            config.consul.tags = self.tags.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
        if let Some(format) = self.log_format {
            config.observability.log_format = format;
        }
    }
}
