// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde
//! attributes. Collects all errors rather than failing fast.

use thiserror::Error;

use crate::model::RelayqConfig;

/// A configuration error discovered during loading or validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config could not be parsed or merged.
    #[error("{0}")]
    Parse(String),

    /// A parsed value violates a semantic constraint.
    #[error("{message}")]
    Validation { message: String },
}

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or every collected error.
pub fn validate_config(config: &RelayqConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.server.host.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "server.host must not be empty".to_string(),
        });
    }

    let url = config.firebase.database_url.trim();
    if url.is_empty() {
        errors.push(ConfigError::Validation {
            message: "firebase.database_url must be set (e.g. https://my-project.firebaseio.com)"
                .to_string(),
        });
    } else if !url.starts_with("http://") && !url.starts_with("https://") {
        errors.push(ConfigError::Validation {
            message: format!("firebase.database_url `{url}` must be an http(s) URL"),
        });
    }

    if config.firebase.collection.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "firebase.collection must not be empty".to_string(),
        });
    }

    if config.rate_limit.window_ms == 0 {
        errors.push(ConfigError::Validation {
            message: "rate_limit.window_ms must be greater than zero".to_string(),
        });
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ConfigError::Validation {
            message: "rate_limit.max_requests must be greater than zero".to_string(),
        });
    }

    if !matches!(
        config.log.level.as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    ) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level must be one of trace, debug, info, warn, error; got `{}`",
                config.log.level
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
