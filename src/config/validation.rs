//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate route mappings, origin policies and pre-init commands
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;

use crate::config::schema::{GatewayConfig, OriginPolicy, RouteMapping};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: String },

    #[error("route '{name}': {reason}")]
    Route { name: String, reason: String },
}

/// Check a route mapping on its own. Shared with the route table and the
/// remote document schema.
pub fn check_route(mapping: &RouteMapping) -> Result<(), String> {
    if mapping.path.is_empty() {
        return Err("path prefix must not be empty".to_string());
    }
    if mapping.host.is_empty() {
        return Err("target host must not be empty".to_string());
    }
    if mapping.scheme != "http" {
        return Err(format!("unsupported scheme '{}'", mapping.scheme));
    }
    Ok(())
}

fn check_origin(label: &str, origin: &OriginPolicy, errors: &mut Vec<ValidationError>) {
    if !origin.enabled {
        return;
    }
    if origin.service_name.is_empty() {
        errors.push(ValidationError::Empty {
            field: format!("{}.service_name", label),
        });
    }
    if origin.path.is_empty() {
        errors.push(ValidationError::Empty {
            field: format!("{}.path", label),
        });
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.service_name.is_empty() {
        errors.push(ValidationError::Empty { field: "service_name".into() });
    }
    if config.root_folder.is_empty() {
        errors.push(ValidationError::Empty { field: "root_folder".into() });
    }
    if config.entry_point.address.is_empty() {
        errors.push(ValidationError::Empty { field: "entry_point.address".into() });
    }
    if config.consul.host.is_empty() {
        errors.push(ValidationError::Empty { field: "consul.host".into() });
    }

    check_origin("config_origin", &config.config_origin, &mut errors);
    check_origin("tags_origin", &config.tags_origin, &mut errors);

    for (i, cmd) in config.pre_init.iter().enumerate() {
        if cmd.command.trim().is_empty() {
            errors.push(ValidationError::Empty {
                field: format!("pre_init[{}].command", i),
            });
        }
    }

    for (name, mapping) in &config.routes {
        if let Err(reason) = check_route(mapping) {
            errors.push(ValidationError::Route { name: name.clone(), reason });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
