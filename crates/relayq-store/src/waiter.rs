// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Short-lived status subscription for freshly created records.
//!
//! After a record is written, the single-send path opens a streaming
//! subscription on it and waits a bounded time for the external sender to
//! advance the status away from `pending`. The subscription is detached on
//! every exit path by dropping the stream; the timer owns cancellation.

use std::pin::Pin;
use std::str::FromStr;
use std::time::Duration;

use futures::{Stream, StreamExt};
use tracing::debug;

use relayq_core::types::MessageRecord;
use relayq_core::{MessageStatus, RelayqError};
use relayq_firebase::{CollectionRef, DbEvent};

/// How long the waiter observes a new record before giving up.
pub const STATUS_WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Result of a status wait. Exactly one outcome occurs per wait.
#[derive(Debug, Clone)]
pub enum WaitOutcome {
    /// The status moved away from `pending` within the window; carries the
    /// record as last observed.
    Updated(MessageRecord),
    /// The window elapsed with the record still `pending`. The caller-facing
    /// status for this outcome is "queued".
    TimedOut,
}

/// Waits up to `timeout` for the record at `id` to leave `pending`.
///
/// Opening the subscription can fail (that error propagates); once open,
/// the wait itself always resolves. `tokio::time::timeout` drops the
/// subscription stream on expiry, which is the detach path.
pub async fn wait_for_status(
    collection: &CollectionRef,
    id: &str,
    timeout: Duration,
) -> Result<WaitOutcome, RelayqError> {
    let stream = collection.stream_child(id).await?;
    match tokio::time::timeout(timeout, watch_for_update(stream)).await {
        Ok(outcome) => outcome,
        Err(_) => Ok(WaitOutcome::TimedOut),
    }
}

/// Spawns a background wait on a freshly created record and logs its
/// outcome.
///
/// The creation endpoint responds before this resolves and never reads the
/// result; only these logs observe it (see DESIGN.md).
pub fn spawn_status_logger(collection: CollectionRef, id: String) {
    tokio::spawn(async move {
        match wait_for_status(&collection, &id, STATUS_WAIT_TIMEOUT).await {
            Ok(WaitOutcome::Updated(record)) => {
                debug!(id, status = %record.status, "status advanced shortly after enqueue");
            }
            Ok(WaitOutcome::TimedOut) => {
                debug!(id, "still queued after status wait window");
            }
            Err(e) => {
                debug!(id, error = %e, "status wait subscription failed");
            }
        }
    });
}

/// Consumes subscription events until the record's status is no longer
/// `pending`.
///
/// The first event after subscribing is a `put` of the whole record;
/// later changes arrive either as root-level puts/patches or as a put of
/// the `/status` child. A stream that ends without an update resolves as
/// timed out (the record was deleted or the server closed the stream).
async fn watch_for_update(
    mut stream: Pin<Box<dyn Stream<Item = Result<DbEvent, RelayqError>> + Send>>,
) -> Result<WaitOutcome, RelayqError> {
    let mut current: Option<MessageRecord> = None;

    while let Some(event) = stream.next().await {
        match event? {
            DbEvent::Put(payload) | DbEvent::Patch(payload) => {
                match payload.path.as_str() {
                    "/" => {
                        if payload.data.is_null() {
                            // Record deleted while waiting.
                            continue;
                        }
                        match serde_json::from_value::<MessageRecord>(payload.data.clone()) {
                            Ok(record) => current = Some(record),
                            Err(_) => {
                                // Partial root patch; merge the status field
                                // into the record we already saw.
                                if let Some(record) = current.as_mut()
                                    && let Some(status) = parse_status(&payload.data["status"])
                                {
                                    record.status = status;
                                }
                            }
                        }
                    }
                    "/status" => {
                        if let Some(record) = current.as_mut()
                            && let Some(status) = parse_status(&payload.data)
                        {
                            record.status = status;
                        }
                    }
                    _ => {}
                }

                if let Some(record) = current.as_ref()
                    && record.status != MessageStatus::Pending
                {
                    return Ok(WaitOutcome::Updated(record.clone()));
                }
            }
            DbEvent::KeepAlive => {}
            DbEvent::Cancel | DbEvent::AuthRevoked => {
                return Err(RelayqError::upstream("status subscription revoked"));
            }
        }
    }

    Ok(WaitOutcome::TimedOut)
}

fn parse_status(value: &serde_json::Value) -> Option<MessageStatus> {
    value
        .as_str()
        .and_then(|s| MessageStatus::from_str(s).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayq_config::model::FirebaseConfig;
    use relayq_firebase::FirebaseGateway;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn collection_for(server: &MockServer) -> CollectionRef {
        let config = FirebaseConfig {
            database_url: server.uri(),
            auth_token: None,
            collection: "messages".to_string(),
        };
        let gateway = FirebaseGateway::new(&config).unwrap();
        Mock::given(method("GET"))
            .and(path("/.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .mount(server)
            .await;
        gateway.initialize().await.unwrap();
        gateway.messages().unwrap()
    }

    fn sse_mock(sse_body: &str) -> Mock {
        Mock::given(method("GET"))
            .and(path("/messages/-Nwait.json"))
            .and(header("accept", "text/event-stream"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/event-stream")
                    .set_body_string(sse_body.to_string()),
            )
    }

    const INITIAL_PENDING: &str = "event: put\ndata: {\"path\":\"/\",\"data\":{\"phoneNumber\":\"+1234567890\",\"message\":\"hi\",\"status\":\"pending\",\"createdAt\":1,\"source\":\"api\"}}\n\n";

    #[tokio::test]
    async fn resolves_updated_when_status_leaves_pending() {
        let server = MockServer::start().await;
        let collection = collection_for(&server).await;

        let sse = format!(
            "{INITIAL_PENDING}event: put\ndata: {{\"path\":\"/status\",\"data\":\"sent\"}}\n\n"
        );
        sse_mock(&sse).mount(&server).await;

        let outcome = wait_for_status(&collection, "-Nwait", Duration::from_secs(5))
            .await
            .unwrap();
        match outcome {
            WaitOutcome::Updated(record) => assert_eq!(record.status, MessageStatus::Sent),
            WaitOutcome::TimedOut => panic!("expected Updated"),
        }
    }

    #[tokio::test]
    async fn resolves_updated_on_root_patch() {
        let server = MockServer::start().await;
        let collection = collection_for(&server).await;

        let sse = format!(
            "{INITIAL_PENDING}event: patch\ndata: {{\"path\":\"/\",\"data\":{{\"status\":\"processing\"}}}}\n\n"
        );
        sse_mock(&sse).mount(&server).await;

        let outcome = wait_for_status(&collection, "-Nwait", Duration::from_secs(5))
            .await
            .unwrap();
        assert!(matches!(
            outcome,
            WaitOutcome::Updated(record) if record.status == MessageStatus::Processing
        ));
    }

    #[tokio::test]
    async fn times_out_when_only_keep_alives_arrive() {
        let server = MockServer::start().await;
        let collection = collection_for(&server).await;

        // Only the initial pending snapshot and keep-alives arrive; the
        // status never leaves pending.
        let sse = format!("{INITIAL_PENDING}event: keep-alive\ndata: null\n\n");
        sse_mock(&sse).mount(&server).await;

        let outcome = wait_for_status(&collection, "-Nwait", Duration::from_millis(300))
            .await
            .unwrap();
        assert!(matches!(outcome, WaitOutcome::TimedOut));
    }

    #[tokio::test]
    async fn subscription_failure_propagates() {
        let server = MockServer::start().await;
        let collection = collection_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/messages/-Nwait.json"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let result = wait_for_status(&collection, "-Nwait", Duration::from_secs(1)).await;
        assert!(result.is_err());
    }
}
