// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the message gateway REST API.
//!
//! Every response carries the `success` envelope. Validation failures
//! return an `errors` array with one entry per failing field; upstream
//! failures surface as 500 with the store's message passed through.

use std::str::FromStr;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use relayq_core::types::{MessageRecord, SOURCE_API, SOURCE_API_BULK};
use relayq_core::{MessageStatus, RelayqError, validate};
use relayq_store::records::{DEFAULT_LIST_LIMIT, NewMessage};
use relayq_store::{compute_recent_stats, compute_stats, spawn_status_logger};

use crate::server::AppState;

/// Window of the recent-stats scan.
const RECENT_WINDOW_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Request body for POST /api/messages/send.
///
/// Fields are optional at the serde level so that missing fields produce
/// field errors instead of a deserialization rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request body for POST /api/messages/send-bulk.
#[derive(Debug, Deserialize)]
pub struct BulkRequest {
    #[serde(default)]
    pub messages: Option<Vec<BulkItem>>,
}

/// One entry of a bulk-send request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkItem {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Request body for POST /api/messages/cleanup.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleanupRequest {
    #[serde(default)]
    pub days_old: Option<i64>,
}

/// Query parameters for GET /api/messages.
#[derive(Debug, Deserialize)]
pub struct ListParams {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub limit: Option<String>,
}

/// POST /api/messages/send
pub async fn send_message(
    State(state): State<AppState>,
    Json(body): Json<SendRequest>,
) -> Response {
    let phone_number = body.phone_number.unwrap_or_default();
    let message = body.message.unwrap_or_default();

    let mut errors = Vec::new();
    validate::check_phone_number("phoneNumber", &phone_number, &mut errors);
    validate::check_message_body("message", &message, &mut errors);
    if !errors.is_empty() {
        return error_response(RelayqError::Validation(errors));
    }

    match state.store.create(&phone_number, &message, SOURCE_API).await {
        Ok((id, record)) => {
            // Best-effort status observation; the response does not wait for
            // it (see DESIGN.md).
            spawn_status_logger(state.store.collection().clone(), id.clone());

            (
                StatusCode::CREATED,
                Json(json!({
                    "success": true,
                    "message": "Message queued successfully",
                    "data": {
                        "messageId": id,
                        "phoneNumber": record.phone_number,
                        "status": record.status,
                        "createdAt": record.created_at,
                    },
                })),
            )
                .into_response()
        }
        Err(e) => error_response(e),
    }
}

/// POST /api/messages/send-bulk
pub async fn send_bulk(State(state): State<AppState>, Json(body): Json<BulkRequest>) -> Response {
    let mut errors = Vec::new();

    let items = body.messages.unwrap_or_default();
    if !(validate::BULK_MIN_ITEMS..=validate::BULK_MAX_ITEMS).contains(&items.len()) {
        errors.push(relayq_core::FieldError::new(
            "messages",
            "Messages must be an array with 1-100 items",
        ));
    } else {
        for (i, item) in items.iter().enumerate() {
            validate::check_phone_number(
                &format!("messages[{i}].phoneNumber"),
                item.phone_number.as_deref().unwrap_or_default(),
                &mut errors,
            );
            validate::check_message_body(
                &format!("messages[{i}].message"),
                item.message.as_deref().unwrap_or_default(),
                &mut errors,
            );
        }
    }
    if !errors.is_empty() {
        return error_response(RelayqError::Validation(errors));
    }

    let new_messages: Vec<NewMessage> = items
        .into_iter()
        .map(|item| NewMessage {
            phone_number: item.phone_number.unwrap_or_default(),
            message: item.message.unwrap_or_default(),
        })
        .collect();

    match state.store.create_bulk(&new_messages, SOURCE_API_BULK).await {
        Ok(queued) => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "message": format!("{} messages queued successfully", queued.len()),
                "data": {
                    "total": queued.len(),
                    "messages": queued,
                },
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/messages/{message_id}
pub async fn get_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Response {
    match state.store.get_by_id(&message_id).await {
        Ok(record) => Json(json!({
            "success": true,
            "data": with_id(&message_id, &record),
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/messages
pub async fn list_messages(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Response {
    let limit = params
        .limit
        .as_deref()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(DEFAULT_LIST_LIMIT);

    let status = match params.status.as_deref() {
        None | Some("") => None,
        Some(s) => match MessageStatus::from_str(s) {
            Ok(status) => Some(status),
            // An unknown status matches no record; short-circuit the scan.
            Err(_) => return list_response(Vec::new()),
        },
    };

    match state.store.list(status, limit).await {
        Ok(rows) => list_response(rows),
        Err(e) => error_response(e),
    }
}

fn list_response(rows: Vec<(String, MessageRecord)>) -> Response {
    let messages: Vec<serde_json::Value> = rows
        .iter()
        .map(|(id, record)| with_id(id, record))
        .collect();
    Json(json!({
        "success": true,
        "data": {
            "total": messages.len(),
            "messages": messages,
        },
    }))
    .into_response()
}

/// DELETE /api/messages/{message_id}
pub async fn delete_message(
    State(state): State<AppState>,
    Path(message_id): Path<String>,
) -> Response {
    match state.store.delete_by_id(&message_id).await {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Message deleted successfully",
            "data": { "messageId": message_id },
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// POST /api/messages/cleanup
pub async fn cleanup_messages(
    State(state): State<AppState>,
    body: Option<Json<CleanupRequest>>,
) -> Response {
    let days_old = body
        .map(|Json(b)| b)
        .unwrap_or_default()
        .days_old
        .unwrap_or(7);

    if let Err(e) = validate::validate_days_old(days_old) {
        return error_response(e);
    }

    match state.store.cleanup_older_than(days_old).await {
        Ok(deleted_count) => Json(json!({
            "success": true,
            "message": format!("Cleaned up {deleted_count} old messages"),
            "data": {
                "deletedCount": deleted_count,
                "daysOld": days_old,
            },
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/stats
pub async fn get_stats(State(state): State<AppState>) -> Response {
    match compute_stats(state.store.collection()).await {
        Ok(stats) => Json(json!({ "success": true, "data": stats })).into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /api/stats/recent
pub async fn get_recent_stats(State(state): State<AppState>) -> Response {
    let since = chrono::Utc::now().timestamp_millis() - RECENT_WINDOW_MILLIS;
    match compute_recent_stats(state.store.collection(), since).await {
        Ok(stats) => Json(json!({
            "success": true,
            "data": stats,
            "timeframe": "Last 24 hours",
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

/// GET /
pub async fn banner() -> Response {
    Json(json!({
        "success": true,
        "message": "relayq message gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
    .into_response()
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Response {
    let connected = state.gateway.test_connectivity().await;
    let uptime = state.start_time.elapsed().as_secs_f64();

    let status_code = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(json!({
            "success": connected,
            "status": if connected { "healthy" } else { "unhealthy" },
            "uptime": uptime,
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "firebase": {
                "connected": connected,
                "status": if connected { "online" } else { "offline" },
            },
        })),
    )
        .into_response()
}

/// Fallback for unmatched routes.
pub async fn not_found(uri: Uri) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "success": false,
            "error": "Endpoint not found",
            "path": uri.path(),
        })),
    )
        .into_response()
}

/// Flattens a record and its id into one response object.
fn with_id(id: &str, record: &MessageRecord) -> serde_json::Value {
    let mut value = serde_json::to_value(record).unwrap_or_else(|_| json!({}));
    value["messageId"] = json!(id);
    value
}

/// Maps a [`RelayqError`] onto the HTTP error envelope.
fn error_response(err: RelayqError) -> Response {
    match err {
        RelayqError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "success": false, "errors": errors })),
        )
            .into_response(),
        RelayqError::NotFound { .. } => (
            StatusCode::NOT_FOUND,
            Json(json!({ "success": false, "error": err.to_string() })),
        )
            .into_response(),
        RelayqError::Auth(_) => (
            StatusCode::FORBIDDEN,
            Json(json!({ "success": false, "error": err.to_string() })),
        )
            .into_response(),
        other => {
            error!(error = %other, "request failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "success": false, "error": other.to_string() })),
            )
                .into_response()
        }
    }
}
