//! Configuration validation.
//!
//! Semantic checks that serde cannot express. All errors are collected,
//! not just the first.

use std::net::SocketAddr;

use crate::config::schema::GatewayConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address '{0}' is not a socket address")]
    BindAddress(String),
    #[error("forwarded path '{0}' must start with '/'")]
    ForwardedPath(String),
    #[error("feed.command must not be empty")]
    EmptyFeedCommand,
    #[error("websocket.max_message_size must be greater than zero")]
    MessageSize,
    #[error("timeouts.request_secs must be greater than zero")]
    RequestTimeout,
    #[error("timeouts.shutdown_secs must be greater than zero")]
    ShutdownTimeout,
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    for path in &config.forwarded_paths {
        if !path.starts_with('/') {
            errors.push(ValidationError::ForwardedPath(path.clone()));
        }
    }

    if config.feed.command.trim().is_empty() {
        errors.push(ValidationError::EmptyFeedCommand);
    }

    if config.websocket.max_message_size == 0 {
        errors.push(ValidationError::MessageSize);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    if config.timeouts.shutdown_secs == 0 {
        errors.push(ValidationError::ShutdownTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
