//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)          command line
//!     → loader.rs (parse)         → cli.rs (typed flags)
//!     └──────────── merge ───────────┘
//!     → validation.rs (semantic checks, all errors at once)
//!     → GatewayConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload
//! - All fields have defaults to allow minimal configs
//! - Compound flag values (`ADDR:PORT`) have dedicated `FromStr` parsers

pub mod cli;
pub mod loader;
pub mod schema;
pub mod validation;

pub use cli::Cli;
pub use loader::{load_config, load_from_cli, ConfigError};
pub use schema::{
    ConsulConfig, EntryPoint, GatewayConfig, LogFormat, ObservabilityConfig, OriginPolicy,
    PreInitCommand, RouteMapping, TimeoutConfig,
};
