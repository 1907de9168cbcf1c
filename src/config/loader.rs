//! Configuration loading from disk.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::config::cli::Cli;
use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Locations searched when no explicit file is given.
pub const DEFAULT_CONFIG_PATHS: &[&str] = &["/etc/edge-httpd.toml", "edge-httpd.toml"];

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse configuration from a TOML file without validating it.
pub fn read_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let config = read_config(path)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Resolve the effective configuration for a command line.
///
/// The explicit `--config` file wins; otherwise the first existing file in
/// [`DEFAULT_CONFIG_PATHS`] is used, falling back to defaults. Command-line
/// values are applied last and the result is validated.
pub fn load_from_cli(cli: &Cli) -> Result<GatewayConfig, ConfigError> {
    let source = match &cli.config {
        Some(path) => Some(path.clone()),
        None => DEFAULT_CONFIG_PATHS
            .iter()
            .map(PathBuf::from)
            .find(|p| p.is_file()),
    };

    let mut config = match source {
        Some(path) => read_config(&path)?,
        None => GatewayConfig::default(),
    };
    cli.apply(&mut config);

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::io::Write;

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "service_name = \"frontend\"\nspa_mode = true").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.service_name, "frontend");
        assert!(config.spa_mode);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/edge-httpd.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_invalid_route_fails_validation() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[routes.api]\npath = \"\"\nhost = \"backend\"").unwrap();

        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("route 'api'"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "service_name = \"from-file\"").unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let cli = Cli::parse_from(["edge-httpd", "-c", &path, "--service-name", "from-cli"]);
        let config = load_from_cli(&cli).unwrap();
        assert_eq!(config.service_name, "from-cli");
    }
}
