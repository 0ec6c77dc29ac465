// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for relayq.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level relayq configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. All sections are optional and default to sensible
/// values, except that `firebase.database_url` must be set before serving.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RelayqConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Firebase Realtime Database settings.
    #[serde(default)]
    pub firebase: FirebaseConfig,

    /// API authentication settings.
    #[serde(default)]
    pub auth: AuthSettings,

    /// Per-IP rate limiting settings.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,

    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

/// Firebase Realtime Database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FirebaseConfig {
    /// Base URL of the database, e.g. `https://my-project.firebaseio.com`.
    #[serde(default)]
    pub database_url: String,

    /// Database secret appended as `?auth=` to every request. Optional; an
    /// open database needs none.
    #[serde(default)]
    pub auth_token: Option<String>,

    /// Collection node that holds message records.
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for FirebaseConfig {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            auth_token: None,
            collection: default_collection(),
        }
    }
}

fn default_collection() -> String {
    "messages".to_string()
}

/// API authentication configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AuthSettings {
    /// Shared-secret API key expected in `X-API-Key` or `?apiKey=`.
    /// When unset, the auth gate is disabled entirely.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Fixed-window per-IP rate limiting configuration, applied to `/api/` paths.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RateLimitConfig {
    /// Window length in milliseconds.
    #[serde(default = "default_rate_window_ms")]
    pub window_ms: u64,

    /// Maximum requests per IP per window.
    #[serde(default = "default_rate_max_requests")]
    pub max_requests: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_ms: default_rate_window_ms(),
            max_requests: default_rate_max_requests(),
        }
    }
}

fn default_rate_window_ms() -> u64 {
    15 * 60 * 1000
}

fn default_rate_max_requests() -> u32 {
    100
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = RelayqConfig::default();
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.firebase.collection, "messages");
        assert!(config.firebase.auth_token.is_none());
        assert!(config.auth.api_key.is_none());
        assert_eq!(config.rate_limit.window_ms, 900_000);
        assert_eq!(config.rate_limit.max_requests, 100);
        assert_eq!(config.log.level, "info");
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result: Result<RelayqConfig, _> =
            toml::from_str("[server]\nhost = \"127.0.0.1\"\nbogus = 1\n");
        assert!(result.is_err());
    }
}
