//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GroupConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Why a configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<GroupConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<GroupConfig, ConfigError> {
    let config: GroupConfig = toml::from_str(content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;
    use crate::lifecycle::Signal;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = parse_config("").unwrap();
        assert_eq!(config.shutdown.timeout_ms, 10_000);
        assert_eq!(config.shutdown.signals, vec![Signal::Interrupt, Signal::Terminate]);
        assert!(config.servers.is_empty());
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_full_config() {
        let config = parse_config(
            r#"
            [shutdown]
            timeout_ms = 2500
            signals = ["terminate"]

            [observability]
            log_level = "debug"
            log_format = "json"

            [[servers]]
            name = "public"
            bind_address = "0.0.0.0:8080"

            [[servers]]
            name = "admin"
            bind_address = "127.0.0.1:8081"
            request_timeout_secs = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.shutdown.timeout().as_millis(), 2500);
        assert_eq!(config.shutdown.signals, vec![Signal::Terminate]);
        assert_eq!(config.servers.len(), 2);
        assert_eq!(config.servers[0].request_timeout_secs, 30);
        assert_eq!(config.servers[1].name, "admin");
        assert_eq!(config.servers[1].request_timeout_secs, 5);
        assert_eq!(config.observability.log_format, LogFormat::Json);
    }

    #[test]
    fn test_parse_error() {
        let err = parse_config("[shutdown]\ntimeout_ms = \"soon\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_validation_error_lists_all_problems() {
        let err = parse_config(
            r#"
            [shutdown]
            timeout_ms = 0

            [[servers]]
            name = "a"
            bind_address = "not-an-address"
            "#,
        )
        .unwrap_err();

        assert!(err.to_string().starts_with("invalid configuration: "));
        assert!(err.to_string().contains("; "));
        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let err = load_config(Path::new("/nonexistent/server-group.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
