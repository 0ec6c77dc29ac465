// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared-secret API key middleware.
//!
//! The key is accepted in the `X-API-Key` header or the `apiKey` query
//! parameter. When no key is configured, the gate is disabled entirely and
//! every request passes.

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Query, Request, State},
    http::{StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Authentication configuration for the API routes.
#[derive(Clone)]
pub struct AuthConfig {
    /// Expected API key. `None` disables the gate.
    pub api_key: Option<String>,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .finish()
    }
}

/// Middleware that validates the shared-secret API key.
///
/// Responds 401 when no key is supplied and 403 when the supplied key does
/// not match.
pub async fn auth_middleware(
    State(auth): State<AuthConfig>,
    request: Request,
    next: Next,
) -> Response {
    let Some(ref expected) = auth.api_key else {
        return next.run(request).await;
    };

    let supplied = request
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| query_api_key(request.uri()));

    match supplied {
        None => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "success": false,
                "error": "API key is required. Provide it in X-API-Key header or apiKey query parameter.",
            })),
        )
            .into_response(),
        Some(key) if key != *expected => (
            StatusCode::FORBIDDEN,
            Json(json!({
                "success": false,
                "error": "Invalid API key",
            })),
        )
            .into_response(),
        Some(_) => next.run(request).await,
    }
}

/// Pulls `apiKey` out of the query string, percent-decoded, so keys with
/// reserved characters match the configured value.
fn query_api_key(uri: &Uri) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params.get("apiKey").cloned()
}
