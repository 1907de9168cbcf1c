//! Service discovery subsystem.
//!
//! # Data Flow
//! ```text
//! lifecycle (register / deregister)  ─┐
//!                                      ├→ dyn Discovery → consul.rs → Consul HTTP API
//! remote resolver (lookup)           ─┘
//! ```
//!
//! # Design Decisions
//! - Core code depends on the `Discovery` trait only
//! - Lookups are never cached; every call hits the backend

pub mod consul;
pub mod types;

pub use consul::ConsulClient;
pub use types::{
    Discovery, DiscoveryError, DiscoveryRegistration, HealthCheck, ServiceInstance,
};
