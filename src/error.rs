//! Top-level error type for the gateway.

use thiserror::Error;

use crate::config::ConfigError;
use crate::discovery::DiscoveryError;
use crate::lifecycle::{LifecycleError, PreInitError};
use crate::remote::ResolutionError;
use crate::routing::RouteError;

/// Any condition that aborts startup or serving.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Routes(#[from] RouteError),

    #[error(transparent)]
    PreInit(#[from] PreInitError),

    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}
