// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for relayq.

use serde::Serialize;
use thiserror::Error;

/// A single field-level validation failure.
///
/// Serialized into the `errors` array of a 400 response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    /// The offending request field (e.g. `phoneNumber`, `messages[3].message`).
    pub field: String,
    /// Human-readable description of the constraint that failed.
    pub message: String,
}

impl FieldError {
    /// Convenience constructor.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The primary error type used across all relayq crates.
#[derive(Debug, Error)]
pub enum RelayqError {
    /// Configuration errors (invalid TOML, missing required fields).
    #[error("configuration error: {0}")]
    Config(String),

    /// Malformed input; carries one entry per failing field.
    #[error("validation failed: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    /// A record lookup by id found nothing.
    #[error("{resource} not found")]
    NotFound { resource: &'static str },

    /// Missing or invalid shared-secret API key.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The external store is unreachable or an operation against it failed.
    #[error("upstream error: {message}")]
    Upstream {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The database gateway was used before a successful `initialize()`.
    #[error("database gateway not initialized -- call initialize() first")]
    Uninitialized,

    /// A bounded operation ran out of time.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },
}

impl RelayqError {
    /// Shorthand for a not-found message record.
    pub fn message_not_found() -> Self {
        RelayqError::NotFound {
            resource: "Message",
        }
    }

    /// Shorthand for an upstream failure without a source error.
    pub fn upstream(message: impl Into<String>) -> Self {
        RelayqError::Upstream {
            message: message.into(),
            source: None,
        }
    }
}

fn format_fields(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}
