//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at startup):
//!     static routes (config) + remote proxies (resolver)
//!     → merge by name, remote wins
//!     → validate, sort by prefix length desc then name
//!     → Freeze as immutable RouteTable
//!
//! Incoming Request (path)
//!     → router.rs (route lookup)
//!     → matcher.rs (prefix test, upstream URI rewrite)
//!     → Return: matched Route or NoMatch
//! ```

pub mod matcher;
pub mod router;

use thiserror::Error;

pub use router::{Route, RouteTable};

/// Errors raised while assembling or applying routes.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("route '{name}' is invalid: {reason}")]
    InvalidRoute { name: String, reason: String },

    #[error("cannot build upstream URI {target}: {reason}")]
    InvalidTarget { target: String, reason: String },
}
