//! Remote configuration subsystem.
//!
//! # Data Flow
//! ```text
//! OriginPolicy
//!     → resolver.rs (lookup, sequential failover over instances)
//!     → document.rs (YAML decode + validation against the schema)
//!     → RemoteConfigDocument / RemoteTagsDocument
//!     → merged into route table and tags, then dropped
//! ```

pub mod document;
pub mod resolver;

pub use document::{RemoteConfigDocument, RemoteDocument, RemoteTagsDocument};
pub use resolver::{RemoteConfigResolver, ResolutionError};
