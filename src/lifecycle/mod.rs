//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bind → Resolve remote config/tags → Pre-init → Build routes
//!     → Register (optional) → Serve
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Deregister → Close listener → Return
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: identity first, then remote state, then listeners
//! - No drain: in-flight requests are not awaited on shutdown

pub mod identity;
pub mod manager;
pub mod preinit;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use manager::{InstanceIdentity, LifecycleError, LifecycleState, ServiceLifecycle};
pub use preinit::{PreInitError, PreInitRunner};
pub use shutdown::{Shutdown, ShutdownReason};
