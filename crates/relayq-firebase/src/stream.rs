// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SSE stream parser for Realtime Database streaming subscriptions.
//!
//! Converts a reqwest response byte stream into typed [`DbEvent`] variants
//! using the `eventsource-stream` crate for SSE protocol compliance.

use std::pin::Pin;

use eventsource_stream::Eventsource;
use futures::stream::{Stream, StreamExt};
use relayq_core::RelayqError;
use serde::Deserialize;

/// Payload of a `put` or `patch` event.
///
/// `path` is relative to the subscribed node (`/` means the node itself);
/// `data` is the new value at that path, `null` on deletion.
#[derive(Debug, Clone, Deserialize)]
pub struct EventPayload {
    pub path: String,
    pub data: serde_json::Value,
}

/// Typed events from the Realtime Database streaming protocol.
#[derive(Debug, Clone)]
pub enum DbEvent {
    /// The value at `path` was replaced. The first event after subscribing
    /// is always a `put` of the node's current value.
    Put(EventPayload),
    /// Children at `path` were merged.
    Patch(EventPayload),
    /// Periodic keep-alive, no payload.
    KeepAlive,
    /// The server revoked the subscription (e.g. rule change).
    Cancel,
    /// The auth credential expired; the subscription must be re-established.
    AuthRevoked,
}

/// Parses a reqwest streaming response into a stream of typed [`DbEvent`]s.
///
/// Unknown event types are silently skipped so new server-side event types
/// do not break the subscription.
pub fn parse_event_stream(
    response: reqwest::Response,
) -> Pin<Box<dyn Stream<Item = Result<DbEvent, RelayqError>> + Send>> {
    let byte_stream = response.bytes_stream();
    let event_stream = byte_stream.eventsource();

    let mapped = event_stream.filter_map(|result| async move {
        match result {
            Ok(event) => {
                let parsed = match event.event.as_str() {
                    "put" => serde_json::from_str::<EventPayload>(&event.data)
                        .map(DbEvent::Put)
                        .map_err(|e| RelayqError::Upstream {
                            message: format!("failed to parse put event: {e}"),
                            source: Some(Box::new(e)),
                        }),
                    "patch" => serde_json::from_str::<EventPayload>(&event.data)
                        .map(DbEvent::Patch)
                        .map_err(|e| RelayqError::Upstream {
                            message: format!("failed to parse patch event: {e}"),
                            source: Some(Box::new(e)),
                        }),
                    "keep-alive" => Ok(DbEvent::KeepAlive),
                    "cancel" => Ok(DbEvent::Cancel),
                    "auth_revoked" => Ok(DbEvent::AuthRevoked),
                    _ => return None,
                };
                Some(parsed)
            }
            Err(e) => Some(Err(RelayqError::Upstream {
                message: format!("SSE stream error: {e}"),
                source: None,
            })),
        }
    });

    Box::pin(mapped)
}
