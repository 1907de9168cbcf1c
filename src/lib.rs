//! Edge gateway library: static files, prefix reverse proxy, discovery
//! registration and remotely resolved configuration.

pub mod config;
pub mod discovery;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod remote;
pub mod routing;

pub use config::schema::GatewayConfig;
pub use error::GatewayError;
pub use http::RequestDispatcher;
pub use lifecycle::Shutdown;
