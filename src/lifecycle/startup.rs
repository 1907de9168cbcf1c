//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize all subsystems in dependency order
//! - Resolve remote configuration before anything is served
//! - Hand the frozen route table to the dispatcher and serve
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - Listeners accept traffic last (only when routes are final)

use std::sync::Arc;

use crate::config::GatewayConfig;
use crate::discovery::{ConsulClient, Discovery};
use crate::error::GatewayError;
use crate::http::{DispatcherSettings, RequestDispatcher};
use crate::lifecycle::manager::ServiceLifecycle;
use crate::lifecycle::preinit::PreInitRunner;
use crate::lifecycle::shutdown::{wait_for_shutdown, Shutdown};
use crate::lifecycle::signals::spawn_signal_handler;
use crate::remote::{RemoteConfigDocument, RemoteConfigResolver, RemoteTagsDocument};
use crate::routing::RouteTable;

/// Run the gateway against the configured Consul agent until a signal arrives.
pub async fn run(config: GatewayConfig) -> Result<(), GatewayError> {
    let discovery: Arc<dyn Discovery> = Arc::new(ConsulClient::from_config(&config.consul)?);
    let shutdown = Shutdown::new();
    let signals = spawn_signal_handler(shutdown.clone());

    let result = run_with(config, discovery, &shutdown).await;
    signals.abort();
    result
}

/// Run the gateway with an explicit discovery backend and shutdown source.
///
/// A shutdown during startup abandons whatever step is in progress,
/// deregisters if registration already happened, and returns `Ok(())`.
pub async fn run_with(
    config: GatewayConfig,
    discovery: Arc<dyn Discovery>,
    shutdown: &Shutdown,
) -> Result<(), GatewayError> {
    // Subscribe first so a signal during startup is not lost.
    let mut shutdown_rx = shutdown.subscribe();

    tracing::info!(
        service = %config.service_name,
        entry_point = %config.entry_point.bind_target(),
        "edge-httpd starting"
    );

    let mut lifecycle = ServiceLifecycle::new(discovery.clone(), config.service_name.clone());

    let prepared = tokio::select! {
        prepared = prepare(&config, &mut lifecycle, discovery) => Some(prepared),
        reason = wait_for_shutdown(&mut shutdown_rx) => {
            tracing::info!(reason = ?reason, "Shutdown requested during startup");
            None
        }
    };

    let Some(prepared) = prepared else {
        lifecycle.deregister().await;
        tracing::info!("Terminated");
        return Ok(());
    };

    let dispatcher = prepared?;
    lifecycle.serve(dispatcher, shutdown_rx).await?;
    Ok(())
}

/// Everything between process start and the first accepted request.
async fn prepare(
    config: &GatewayConfig,
    lifecycle: &mut ServiceLifecycle,
    discovery: Arc<dyn Discovery>,
) -> Result<RequestDispatcher, GatewayError> {
    lifecycle.bind(&config.entry_point).await?;

    let resolver = RemoteConfigResolver::new(discovery);
    let remote_config: RemoteConfigDocument = resolver.resolve(&config.config_origin).await?;
    let remote_tags: RemoteTagsDocument = resolver.resolve(&config.tags_origin).await?;

    let tags = merge_tags(&[&config.consul.tags, &remote_config.tags, &remote_tags.tags]);

    PreInitRunner::new(config.pre_init.clone()).run().await?;

    let routes = RouteTable::build(config.routes.clone(), remote_config.proxies)?;

    if config.consul.register {
        lifecycle.register(tags).await?;
    } else {
        tracing::info!("Discovery registration disabled");
    }

    Ok(RequestDispatcher::new(routes, DispatcherSettings::from(config)))
}

/// Concatenate tag lists in order, keeping the first occurrence of each tag.
pub fn merge_tags(sources: &[&Vec<String>]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::new();
    for tag in sources.iter().flat_map(|tags| tags.iter()) {
        if !merged.contains(tag) {
            merged.push(tag.clone());
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_merge_tags_keeps_order_and_drops_duplicates() {
        let static_tags = tags(&["traefik.enable=false", "edge"]);
        let config_tags = tags(&["edge", "zone=a"]);
        let tag_doc = tags(&["zone=a", "canary"]);

        assert_eq!(
            merge_tags(&[&static_tags, &config_tags, &tag_doc]),
            tags(&["traefik.enable=false", "edge", "zone=a", "canary"])
        );
    }

    #[test]
    fn test_merge_tags_empty() {
        assert!(merge_tags(&[&Vec::new(), &Vec::new()]).is_empty());
    }
}
