//! Service lifecycle: bind, register, serve, deregister.
//!
//! # Responsibilities
//! - Own the listener and the instance identity
//! - Register with discovery and deregister exactly once
//! - Run the dispatcher until a shutdown signal arrives
//!
//! # Design Decisions
//! - Every failure up to serving is fatal and typed
//! - Shutdown is abrupt: the listener is closed without draining in-flight
//!   requests
//! - Transitions are checked; calling out of order is an error, not a panic

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::EntryPoint;
use crate::discovery::{
    Discovery, DiscoveryError, DiscoveryRegistration, HealthCheck, ServiceInstance,
};
use crate::http::{RequestDispatcher, HEALTH_PATH};
use crate::lifecycle::identity;
use crate::lifecycle::shutdown::{wait_for_shutdown, ShutdownReason};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Unbound,
    Bound,
    Registered,
    Serving,
    Terminating,
    Terminated,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to determine advertised address: {0}")]
    AddressResolution(String),

    #[error("unable to connect to discovery: {0}")]
    DiscoveryConnect(#[source] DiscoveryError),

    #[error("registration failed: {0}")]
    Registration(#[source] DiscoveryError),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),

    #[error("cannot {operation} while {state:?}")]
    InvalidState {
        operation: &'static str,
        state: LifecycleState,
    },
}

/// Who this process is, as announced to discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdentity {
    pub instance_id: String,
    pub address: String,
    pub port: u16,
}

pub struct ServiceLifecycle {
    discovery: Arc<dyn Discovery>,
    service_name: String,
    state: LifecycleState,
    listener: Option<TcpListener>,
    local_addr: Option<SocketAddr>,
    identity: Option<InstanceIdentity>,
    /// Instance ID currently registered, if any.
    registration: Option<String>,
}

impl ServiceLifecycle {
    pub fn new(discovery: Arc<dyn Discovery>, service_name: impl Into<String>) -> Self {
        Self {
            discovery,
            service_name: service_name.into(),
            state: LifecycleState::Unbound,
            listener: None,
            local_addr: None,
            identity: None,
            registration: None,
        }
    }

    /// Open the listener and derive the instance identity.
    pub async fn bind(&mut self, entry_point: &EntryPoint) -> Result<&InstanceIdentity, LifecycleError> {
        self.expect_state("bind", &[LifecycleState::Unbound])?;

        let target = entry_point.bind_target();
        let listener = TcpListener::bind(&target)
            .await
            .map_err(|source| LifecycleError::Bind {
                address: target.clone(),
                source,
            })?;
        let local_addr = listener.local_addr().map_err(|source| LifecycleError::Bind {
            address: target.clone(),
            source,
        })?;

        let address = identity::advertised_address(entry_point.advertise_address.as_deref())
            .map_err(LifecycleError::AddressResolution)?;
        let instance_id = identity::instance_id(&self.service_name, local_addr.port());

        tracing::info!(
            address = %local_addr,
            advertised = %address,
            instance_id = %instance_id,
            "Listening for connections"
        );

        self.listener = Some(listener);
        self.local_addr = Some(local_addr);
        self.state = LifecycleState::Bound;
        Ok(self.identity.insert(InstanceIdentity {
            instance_id,
            address,
            port: local_addr.port(),
        }))
    }

    /// Register this instance with discovery.
    pub async fn register(&mut self, tags: Vec<String>) -> Result<(), LifecycleError> {
        self.expect_state("register", &[LifecycleState::Bound])?;
        let identity = self.identity.clone().ok_or(LifecycleError::InvalidState {
            operation: "register",
            state: self.state,
        })?;

        self.discovery
            .check_connection()
            .await
            .map_err(LifecycleError::DiscoveryConnect)?;

        let health_url = format!(
            "http://{}{}",
            ServiceInstance::new(identity.address.clone(), identity.port).authority(),
            HEALTH_PATH
        );
        let registration = DiscoveryRegistration {
            instance_id: identity.instance_id.clone(),
            service_name: self.service_name.clone(),
            tags,
            address: identity.address.clone(),
            port: identity.port,
            health_check: HealthCheck::http(health_url),
        };

        self.discovery
            .register(&registration)
            .await
            .map_err(LifecycleError::Registration)?;

        tracing::info!(
            instance_id = %registration.instance_id,
            service = %registration.service_name,
            tags = ?registration.tags,
            "Registered with discovery"
        );

        self.registration = Some(identity.instance_id);
        self.state = LifecycleState::Registered;
        Ok(())
    }

    /// Serve until `shutdown` fires, then deregister and close the listener.
    ///
    /// Returns as soon as the listener is closed; requests still in flight are
    /// not awaited.
    pub async fn serve(
        &mut self,
        dispatcher: RequestDispatcher,
        mut shutdown: broadcast::Receiver<ShutdownReason>,
    ) -> Result<(), LifecycleError> {
        self.expect_state(
            "serve",
            &[LifecycleState::Bound, LifecycleState::Registered],
        )?;
        let listener = self.listener.take().ok_or(LifecycleError::InvalidState {
            operation: "serve",
            state: self.state,
        })?;

        self.state = LifecycleState::Serving;
        let app = dispatcher
            .into_router()
            .into_make_service_with_connect_info::<SocketAddr>();
        let mut server = Box::pin(axum::serve(listener, app).into_future());

        let outcome = tokio::select! {
            result = &mut server => result.map_err(LifecycleError::Serve),
            reason = wait_for_shutdown(&mut shutdown) => {
                tracing::info!(reason = ?reason, "Terminating");
                Ok(())
            }
        };

        self.state = LifecycleState::Terminating;
        self.deregister().await;
        // Dropping the server future closes the listener; spawned connection
        // tasks are left to finish or die with the runtime.
        drop(server);
        self.state = LifecycleState::Terminated;
        tracing::info!("Terminated");

        outcome
    }

    /// Remove the registration, if any. Safe to call repeatedly.
    pub async fn deregister(&mut self) {
        let Some(instance_id) = self.registration.take() else {
            return;
        };

        match self.discovery.deregister(&instance_id).await {
            Ok(()) => tracing::info!(instance_id = %instance_id, "Deregistered from discovery"),
            Err(e) => {
                tracing::warn!(instance_id = %instance_id, error = %e, "Deregistration failed")
            }
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn identity(&self) -> Option<&InstanceIdentity> {
        self.identity.as_ref()
    }

    pub fn is_registered(&self) -> bool {
        self.registration.is_some()
    }

    fn expect_state(
        &self,
        operation: &'static str,
        allowed: &[LifecycleState],
    ) -> Result<(), LifecycleError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(LifecycleError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }
}
