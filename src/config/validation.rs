//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Detect conflicting servers (duplicate names or bind addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GroupConfig → Result<(), Vec<ValidationError>>

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GroupConfig;
use crate::lifecycle::Signal;

/// A semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("shutdown.timeout_ms must be greater than zero")]
    ZeroShutdownTimeout,

    #[error("signal '{0}' is listed more than once")]
    DuplicateSignal(Signal),

    #[error("server #{0} has an empty name")]
    EmptyServerName(usize),

    #[error("server name '{0}' is used more than once")]
    DuplicateServerName(String),

    #[error("server '{name}' has an invalid bind address '{address}'")]
    InvalidBindAddress { name: String, address: String },

    #[error("bind address '{0}' is used by more than one server")]
    DuplicateBindAddress(String),

    #[error("server '{0}' must have a request timeout greater than zero")]
    ZeroRequestTimeout(String),

    #[error("invalid metrics address '{0}'")]
    InvalidMetricsAddress(String),
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &GroupConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.shutdown.timeout_ms == 0 {
        errors.push(ValidationError::ZeroShutdownTimeout);
    }

    let mut signals = HashSet::new();
    for signal in &config.shutdown.signals {
        if !signals.insert(*signal) {
            errors.push(ValidationError::DuplicateSignal(*signal));
        }
    }

    let mut names = HashSet::new();
    let mut addresses = HashSet::new();
    for (index, server) in config.servers.iter().enumerate() {
        if server.name.trim().is_empty() {
            errors.push(ValidationError::EmptyServerName(index));
        } else if !names.insert(server.name.as_str()) {
            errors.push(ValidationError::DuplicateServerName(server.name.clone()));
        }

        match server.bind_address.parse::<SocketAddr>() {
            // Port 0 picks a free port, so it never conflicts.
            Ok(addr) if addr.port() != 0 && !addresses.insert(addr) => {
                errors.push(ValidationError::DuplicateBindAddress(server.bind_address.clone()));
            }
            Ok(_) => {}
            Err(_) => errors.push(ValidationError::InvalidBindAddress {
                name: server.name.clone(),
                address: server.bind_address.clone(),
            }),
        }

        if server.request_timeout_secs == 0 {
            errors.push(ValidationError::ZeroRequestTimeout(server.name.clone()));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
