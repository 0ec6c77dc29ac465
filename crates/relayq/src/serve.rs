// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `relayq serve` command implementation.
//!
//! Wires the database gateway, message store, and HTTP router together
//! and serves until the process receives a shutdown signal. A failed
//! gateway initialization is fatal here; the library layers only report
//! it.

use std::sync::Arc;
use std::time::Instant;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use relayq_config::RelayqConfig;
use relayq_core::RelayqError;
use relayq_firebase::FirebaseGateway;
use relayq_gateway::{AppState, AuthConfig, RateLimiter, build_router, start_server};
use relayq_store::MessageStore;

/// Runs the `relayq serve` command.
pub async fn run_serve(config: RelayqConfig) -> Result<(), RelayqError> {
    init_tracing(&config.log.level);

    info!("starting relayq serve");

    let gateway = Arc::new(FirebaseGateway::new(&config.firebase)?);
    gateway.initialize().await?;

    let store = MessageStore::new(gateway.messages()?);
    let state = AppState {
        store,
        gateway,
        start_time: Instant::now(),
    };

    let auth = AuthConfig {
        api_key: config.auth.api_key.clone(),
    };
    if auth.api_key.is_none() {
        warn!("no API key configured; API routes are open");
    }
    let limiter = RateLimiter::new(&config.rate_limit);

    info!(
        host = %config.server.host,
        port = config.server.port,
        collection = %config.firebase.collection,
        "gateway configured"
    );

    let app = build_router(state, auth, limiter);

    tokio::select! {
        result = start_server(&config.server, app) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
            Ok(())
        }
    }
}

/// Initializes the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise the configured level applies to
/// relayq crates and `warn` to everything else.
fn init_tracing(level: &str) {
    // Target prefixes do not cross underscores, so each crate is listed.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "relayq={level},relayq_config={level},relayq_firebase={level},\
             relayq_store={level},relayq_gateway={level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
