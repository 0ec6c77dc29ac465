// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP boundary for the relayq message gateway.
//!
//! Translates the REST surface into [`relayq_store`] operations: request
//! validation, the shared-secret auth gate, per-IP rate limiting, and the
//! `success` JSON envelope on every response.

pub mod auth;
pub mod handlers;
pub mod ratelimit;
pub mod server;

pub use auth::AuthConfig;
pub use ratelimit::RateLimiter;
pub use server::{AppState, build_router, start_server};
