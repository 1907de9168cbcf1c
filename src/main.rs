//! edge-httpd
//!
//! Serves a static site and reverse-proxies configured path prefixes, while
//! registering itself with Consul for the lifetime of the process.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ ┌──────────────────────────────────────────────┐
//!                     │ http::server (RequestDispatcher)             │
//!                     │   /health ─────────▶ 200 OK                  │
//!                     │   prefix match ────▶ http::proxy ────────────┼──▶ Upstream
//!                     │   otherwise ───────▶ http::static_files      │
//!                     └──────────────────────────────────────────────┘
//!                                    ▲ frozen RouteTable
//!     ┌─────────┐   ┌─────────────┐  │  ┌───────────┐
//!     │ config  │──▶│  lifecycle  │──┴─▶│  routing  │
//!     │toml+cli │   │ bind, serve │     └───────────┘
//!     └─────────┘   └──────┬──────┘            ▲
//!                          │ register          │ proxies
//!                          ▼                   │
//!                   ┌─────────────┐     ┌──────┴──────┐
//!                   │  discovery  │◀────│   remote    │──▶ config peers
//!                   │   consul    │     │  resolver   │
//!                   └─────────────┘     └─────────────┘
//! ```

use clap::Parser;
use std::net::SocketAddr;
use std::process::ExitCode;

use edge_httpd::config::{load_from_cli, Cli};
use edge_httpd::lifecycle::startup;
use edge_httpd::observability::{logging, metrics};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load_from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to boot: {e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "edge-httpd booting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    match startup::run(config).await {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to boot");
            ExitCode::FAILURE
        }
    }
}
