// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the relayq message gateway.
//!
//! Provides TOML configuration parsing with strict validation
//! (`deny_unknown_fields`), XDG file hierarchy lookup, and environment
//! variable overrides.
//!
//! # Usage
//!
//! ```no_run
//! use relayq_config::load_and_validate;
//!
//! let config = load_and_validate().expect("config errors");
//! println!("serving on port {}", config.server.port);
//! ```

pub mod loader;
pub mod model;
pub mod validation;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::RelayqConfig;
pub use validation::{ConfigError, validate_config};

/// Load configuration from the XDG hierarchy and validate it.
///
/// Returns either a valid `RelayqConfig` or the full list of errors.
pub fn load_and_validate() -> Result<RelayqConfig, Vec<ConfigError>> {
    match loader::load_config() {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Parse(err.to_string())]),
    }
}

/// Load configuration from a TOML string and validate it.
///
/// Useful for testing and explicit configuration.
pub fn load_and_validate_str(toml_content: &str) -> Result<RelayqConfig, Vec<ConfigError>> {
    match loader::load_config_from_str(toml_content) {
        Ok(config) => {
            validation::validate_config(&config)?;
            Ok(config)
        }
        Err(err) => Err(vec![ConfigError::Parse(err.to_string())]),
    }
}

/// Render config errors to stderr, one line per error.
pub fn render_errors(errors: &[ConfigError]) {
    for error in errors {
        eprintln!("config error: {error}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_and_validate_str_rejects_default_config() {
        // Defaults alone are not servable: database_url is required.
        assert!(load_and_validate_str("").is_err());
    }

    #[test]
    fn load_and_validate_str_accepts_minimal_config() {
        let config = load_and_validate_str(
            "[firebase]\ndatabase_url = \"https://example.firebaseio.com\"\n",
        )
        .unwrap();
        assert_eq!(config.firebase.collection, "messages");
    }
}
