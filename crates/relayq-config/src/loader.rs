// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports the XDG hierarchy: `./relayq.toml` > `~/.config/relayq/relayq.toml`
//! > `/etc/relayq/relayq.toml` with environment variable overrides via the
//! `RELAYQ_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::RelayqConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/relayq/relayq.toml` (system-wide)
/// 3. `~/.config/relayq/relayq.toml` (user XDG config)
/// 4. `./relayq.toml` (local directory)
/// 5. `RELAYQ_*` environment variables
pub fn load_config() -> Result<RelayqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RelayqConfig::default()))
        .merge(Toml::file("/etc/relayq/relayq.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("relayq/relayq.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("relayq.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env vars).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<RelayqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RelayqConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<RelayqConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(RelayqConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `RELAYQ_FIREBASE_DATABASE_URL` must map
/// to `firebase.database_url`, not `firebase.database.url`.
fn env_provider() -> Env {
    Env::prefixed("RELAYQ_").map(|key| {
        // The process environment hands keys over in their original
        // uppercase form; normalize before matching section names.
        let key = key.as_str().to_ascii_lowercase();
        // Only the leading section prefix becomes a dot; the rest of the
        // key may itself contain section names (firebase_auth_token).
        for section in ["server", "firebase", "auth", "rate_limit", "log"] {
            if let Some(rest) = key.strip_prefix(section)
                && let Some(rest) = rest.strip_prefix('_')
                && !rest.is_empty()
            {
                return format!("{section}.{rest}").into();
            }
        }
        key.into()
    })
}
