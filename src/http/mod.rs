//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve, task per connection)
//!     → request.rs (assign x-request-id)
//!     → middleware/access_log.rs (capture final status)
//!     → server.rs
//!         /health            → fixed 200
//!         route prefix match → proxy.rs → upstream
//!         otherwise          → static_files.rs (SPA rewrite, ServeDir)
//!     → response.rs (hop-by-hop header hygiene)
//!     → Send to client
//! ```

pub mod middleware;
pub mod proxy;
pub mod request;
pub mod response;
pub mod server;
pub mod static_files;

pub use request::{UuidRequestId, X_REQUEST_ID};
pub use server::{DispatcherSettings, RequestDispatcher, HEALTH_BODY, HEALTH_PATH};
