// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state. The `/api/` routes sit
//! behind the rate limiter and the API key gate; the banner and health
//! endpoints are public.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tracing::info;

use relayq_config::model::ServerConfig;
use relayq_core::RelayqError;
use relayq_firebase::FirebaseGateway;
use relayq_store::MessageStore;

use crate::auth::{AuthConfig, auth_middleware};
use crate::handlers;
use crate::ratelimit::{RateLimiter, rate_limit_middleware};

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Typed operations over the messages collection.
    pub store: MessageStore,
    /// Database gateway, for health probes.
    pub gateway: Arc<FirebaseGateway>,
    /// Process start time for uptime calculation.
    pub start_time: Instant,
}

/// Builds the full application router.
///
/// The rate limiter runs before the auth gate, so rejected bursts still
/// count against the window even when they carry no key.
pub fn build_router(state: AppState, auth: AuthConfig, limiter: RateLimiter) -> Router {
    let api_routes = Router::new()
        .route("/api/messages/send", post(handlers::send_message))
        .route("/api/messages/send-bulk", post(handlers::send_bulk))
        .route("/api/messages/cleanup", post(handlers::cleanup_messages))
        .route("/api/messages", get(handlers::list_messages))
        .route(
            "/api/messages/{message_id}",
            get(handlers::get_message).delete(handlers::delete_message),
        )
        .route("/api/stats", get(handlers::get_stats))
        .route("/api/stats/recent", get(handlers::get_recent_stats))
        .route_layer(axum_middleware::from_fn_with_state(auth, auth_middleware))
        .route_layer(axum_middleware::from_fn_with_state(
            limiter,
            rate_limit_middleware,
        ))
        .with_state(state.clone());

    let public_routes = Router::new()
        .route("/", get(handlers::banner))
        .route("/health", get(handlers::health))
        .with_state(state);

    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .fallback(handlers::not_found)
        .layer(CorsLayer::permissive())
}

/// Starts the gateway HTTP server and serves until the listener fails.
///
/// Connections are served with `ConnectInfo` so the rate limiter sees real
/// client addresses.
pub async fn start_server(config: &ServerConfig, app: Router) -> Result<(), RelayqError> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener =
        tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| RelayqError::Upstream {
                message: format!("failed to bind gateway to {addr}: {e}"),
                source: Some(Box::new(e)),
            })?;

    info!("gateway listening on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .map_err(|e| RelayqError::Upstream {
        message: format!("gateway server error: {e}"),
        source: Some(Box::new(e)),
    })?;

    Ok(())
}
