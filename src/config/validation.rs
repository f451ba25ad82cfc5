//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (limits > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::ServerConfig;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("invalid socket address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("limits.max_body_bytes ({body}) exceeds limits.max_frame_bytes ({frame})")]
    BodyExceedsFrame { body: usize, frame: usize },

    #[error("files.directory {0} is not a directory")]
    NotADirectory(String),
}

/// Check a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    let positive = [
        ("listener.max_connections", config.listener.max_connections),
        ("listener.backlog", config.listener.backlog as usize),
        ("limits.max_frame_bytes", config.limits.max_frame_bytes),
        ("limits.max_body_bytes", config.limits.max_body_bytes),
        ("limits.max_field_bytes", config.limits.max_field_bytes),
        ("limits.max_encodings", config.limits.max_encodings),
        ("timeouts.read_secs", config.timeouts.read_secs as usize),
    ];
    for (field, value) in positive {
        if value == 0 {
            errors.push(ValidationError::Zero { field });
        }
    }

    if config.limits.max_body_bytes > config.limits.max_frame_bytes {
        errors.push(ValidationError::BodyExceedsFrame {
            body: config.limits.max_body_bytes,
            frame: config.limits.max_frame_bytes,
        });
    }

    if let Some(dir) = &config.files.directory {
        if !dir.is_dir() {
            errors.push(ValidationError::NotADirectory(dir.display().to_string()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
