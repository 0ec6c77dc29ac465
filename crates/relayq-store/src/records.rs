// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! CRUD operations against the messages collection.

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info};

use relayq_core::types::MessageRecord;
use relayq_core::{MessageStatus, RelayqError, normalize_phone, validate};
use relayq_firebase::{CollectionRef, Query, is_valid_key};

/// Default cap on `list` results.
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Milliseconds per day, for the cleanup cutoff.
const DAY_MILLIS: i64 = 86_400_000;

/// One item of a bulk-send request.
#[derive(Debug, Clone)]
pub struct NewMessage {
    pub phone_number: String,
    pub message: String,
}

/// Per-item result of a bulk send.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkQueued {
    pub message_id: String,
    pub phone_number: String,
    pub status: &'static str,
}

/// Typed operations over the messages collection.
///
/// Validation is enforced here again even though the HTTP boundary already
/// validates; the store never assumes well-formed input.
#[derive(Debug, Clone)]
pub struct MessageStore {
    collection: CollectionRef,
}

impl MessageStore {
    pub fn new(collection: CollectionRef) -> Self {
        Self { collection }
    }

    /// The underlying collection handle (used by the status waiter).
    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }

    /// Persists one message with `status=pending` and `createdAt=now`.
    ///
    /// Returns the store-generated id together with the record as written.
    pub async fn create(
        &self,
        phone_number: &str,
        message: &str,
        source: &str,
    ) -> Result<(String, MessageRecord), RelayqError> {
        validate::validate_send(phone_number, message)?;

        let record = MessageRecord {
            phone_number: normalize_phone(phone_number),
            message: message.to_string(),
            status: MessageStatus::Pending,
            created_at: now_millis(),
            source: Some(source.to_string()),
        };

        let id = self.collection.push(&record).await?;
        debug!(id, phone = %record.phone_number, "message queued");
        Ok((id, record))
    }

    /// Persists a batch of messages sequentially, in input order.
    ///
    /// The batch is not atomic: the first failing write aborts the rest and
    /// propagates its error, leaving prior items persisted. Abort-on-first-
    /// failure is a flagged design choice (see DESIGN.md).
    pub async fn create_bulk(
        &self,
        items: &[NewMessage],
        source: &str,
    ) -> Result<Vec<BulkQueued>, RelayqError> {
        let mut results = Vec::with_capacity(items.len());
        for item in items {
            let (id, record) = self.create(&item.phone_number, &item.message, source).await?;
            results.push(BulkQueued {
                message_id: id,
                phone_number: record.phone_number,
                status: "queued",
            });
        }
        Ok(results)
    }

    /// Reads one record by id.
    pub async fn get_by_id(&self, id: &str) -> Result<MessageRecord, RelayqError> {
        if !is_valid_key(id) {
            return Err(RelayqError::message_not_found());
        }
        self.collection
            .get_child::<MessageRecord>(id)
            .await?
            .ok_or_else(RelayqError::message_not_found)
    }

    /// Lists up to `limit` records, most recent first, optionally filtered
    /// by status.
    ///
    /// The limit is applied server-side BEFORE the status filter runs in
    /// memory, so a filtered listing may return fewer than `limit` records
    /// even when more matches exist. Deliberate; see DESIGN.md.
    pub async fn list(
        &self,
        status: Option<MessageStatus>,
        limit: usize,
    ) -> Result<Vec<(String, MessageRecord)>, RelayqError> {
        let query = Query::by_created_at().limit_to_last(limit);
        let records = self.collection.query::<MessageRecord>(&query).await?;

        let mut rows: Vec<(String, MessageRecord)> = records
            .into_iter()
            .filter(|(_, record)| status.is_none_or(|s| record.status == s))
            .collect();
        rows.sort_by(|a, b| b.1.created_at.cmp(&a.1.created_at));
        Ok(rows)
    }

    /// Deletes one record by id. Fails with `NotFound` when the record does
    /// not exist (the existence check runs first; the delete itself is
    /// unconditional).
    pub async fn delete_by_id(&self, id: &str) -> Result<(), RelayqError> {
        // get_by_id performs the key guard and the existence check.
        self.get_by_id(id).await?;
        self.collection.delete_child(id).await?;
        info!(id, "message deleted");
        Ok(())
    }

    /// Deletes every record older than `days` days whose status is terminal
    /// (`sent` or `error`). `pending`/`processing` records are never
    /// auto-deleted regardless of age.
    ///
    /// Deletes are issued concurrently once the scan completes. The returned
    /// count is the number of matching records found, not verified
    /// post-delete.
    pub async fn cleanup_older_than(&self, days: i64) -> Result<u64, RelayqError> {
        validate::validate_days_old(days)?;

        let cutoff = now_millis() - days * DAY_MILLIS;
        let records = self.collection.query::<MessageRecord>(&Query::default()).await?;

        let doomed: Vec<String> = records
            .into_iter()
            .filter(|(_, record)| record.created_at < cutoff && record.status.is_terminal())
            .map(|(id, _)| id)
            .collect();
        let count = doomed.len() as u64;

        let deletes = doomed.iter().map(|id| self.collection.delete_child(id));
        for result in join_all(deletes).await {
            result?;
        }

        info!(count, days, "cleanup sweep complete");
        Ok(count)
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayq_config::model::FirebaseConfig;
    use relayq_firebase::FirebaseGateway;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn store_for(server: &MockServer) -> MessageStore {
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
        MessageStore::new(gateway.messages().unwrap())
    }

    fn record(status: &str, created_at: i64) -> serde_json::Value {
        json!({
            "phoneNumber": "+1234567890",
            "message": "hi",
            "status": status,
            "createdAt": created_at,
            "source": "api"
        })
    }

    #[tokio::test]
    async fn create_normalizes_phone_and_writes_pending() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;

        Mock::given(method("POST"))
            .and(path("/messages.json"))
            .and(body_partial_json(json!({
                "phoneNumber": "+1234567890",
                "message": "hi",
                "status": "pending",
                "source": "api"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "-Nnew"})))
            .expect(1)
            .mount(&server)
            .await;

        let (id, written) = store.create("1234567890", "hi", "api").await.unwrap();
        assert_eq!(id, "-Nnew");
        assert_eq!(written.phone_number, "+1234567890");
        assert_eq!(written.status, MessageStatus::Pending);
        assert!(written.created_at > 0);
    }

    #[tokio::test]
    async fn create_rejects_invalid_input_without_a_write() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;
        // No POST mock mounted: a write attempt would fail the test via 404.

        let err = store.create("123", "hi", "api").await.unwrap_err();
        assert!(matches!(err, RelayqError::Validation(_)));
    }

    #[tokio::test]
    async fn get_by_id_maps_absent_to_not_found() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/messages/-Ngone.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let err = store.get_by_id("-Ngone").await.unwrap_err();
        assert_eq!(err.to_string(), "Message not found");
    }

    #[tokio::test]
    async fn get_by_id_rejects_malformed_keys_without_a_request() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;

        let err = store.get_by_id("a/b").await.unwrap_err();
        assert!(matches!(err, RelayqError::NotFound { .. }));
    }

    #[tokio::test]
    async fn list_sorts_descending_and_caps_server_side() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/messages.json"))
            .and(query_param("orderBy", "\"createdAt\""))
            .and(query_param("limitToLast", "50"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "a": record("pending", 100),
                "b": record("sent", 300),
                "c": record("pending", 200)
            })))
            .mount(&server)
            .await;

        let rows = store.list(None, DEFAULT_LIST_LIMIT).await.unwrap();
        let created: Vec<i64> = rows.iter().map(|(_, r)| r.created_at).collect();
        assert_eq!(created, vec![300, 200, 100]);
    }

    #[tokio::test]
    async fn list_filters_after_the_limit() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;

        // The server returns the 2 most recent records; only one is "sent",
        // so the filtered result is smaller than the limit even if older
        // sent records exist beyond the window.
        Mock::given(method("GET"))
            .and(path("/messages.json"))
            .and(query_param("limitToLast", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "a": record("pending", 100),
                "b": record("sent", 300)
            })))
            .mount(&server)
            .await;

        let rows = store.list(Some(MessageStatus::Sent), 2).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].0, "b");
        assert!(rows.iter().all(|(_, r)| r.status == MessageStatus::Sent));
    }

    #[tokio::test]
    async fn delete_by_id_checks_existence_first() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/messages/-Nx.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(record("pending", 1)))
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/messages/-Nx.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .expect(1)
            .mount(&server)
            .await;

        store.delete_by_id("-Nx").await.unwrap();
    }

    #[tokio::test]
    async fn delete_by_id_absent_is_not_found() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;

        Mock::given(method("GET"))
            .and(path("/messages/-Nmissing.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;
        // No DELETE mock: issuing one would fail the test.

        let err = store.delete_by_id("-Nmissing").await.unwrap_err();
        assert!(matches!(err, RelayqError::NotFound { .. }));
    }

    #[tokio::test]
    async fn cleanup_deletes_only_old_terminal_records() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;

        let now = chrono::Utc::now().timestamp_millis();
        let eight_days_ago = now - 8 * DAY_MILLIS;
        let yesterday = now - DAY_MILLIS;

        Mock::given(method("GET"))
            .and(path("/messages.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "old_sent": record("sent", eight_days_ago),
                "old_error": record("error", eight_days_ago),
                "old_pending": record("pending", eight_days_ago),
                "old_processing": record("processing", eight_days_ago),
                "new_sent": record("sent", yesterday)
            })))
            .mount(&server)
            .await;

        for id in ["old_sent", "old_error"] {
            Mock::given(method("DELETE"))
                .and(path(format!("/messages/{id}.json")))
                .respond_with(ResponseTemplate::new(200).set_body_string("null"))
                .expect(1)
                .mount(&server)
                .await;
        }
        // No DELETE mocks for the pending/processing/new records: touching
        // them would fail verification.

        let deleted = store.cleanup_older_than(7).await.unwrap();
        assert_eq!(deleted, 2);
        server.verify().await;
    }

    #[tokio::test]
    async fn cleanup_rejects_out_of_range_days() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;

        assert!(matches!(
            store.cleanup_older_than(400).await.unwrap_err(),
            RelayqError::Validation(_)
        ));
        assert!(matches!(
            store.cleanup_older_than(0).await.unwrap_err(),
            RelayqError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn bulk_create_preserves_input_order() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;

        let ids = std::sync::Arc::new(std::sync::Mutex::new(vec!["-N1", "-N2"]));
        let ids_clone = ids.clone();
        Mock::given(method("POST"))
            .and(path("/messages.json"))
            .respond_with(move |_: &wiremock::Request| {
                let id = ids_clone.lock().unwrap().remove(0);
                ResponseTemplate::new(200).set_body_json(json!({"name": id}))
            })
            .expect(2)
            .mount(&server)
            .await;

        let items = vec![
            NewMessage {
                phone_number: "1234567890".to_string(),
                message: "first".to_string(),
            },
            NewMessage {
                phone_number: "+4912345678901".to_string(),
                message: "second".to_string(),
            },
        ];
        let queued = store.create_bulk(&items, "api-bulk").await.unwrap();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].message_id, "-N1");
        assert_eq!(queued[0].phone_number, "+1234567890");
        assert_eq!(queued[1].message_id, "-N2");
        assert!(queued.iter().all(|q| q.status == "queued"));
    }

    #[tokio::test]
    async fn bulk_create_aborts_on_first_invalid_item() {
        let server = MockServer::start().await;
        let store = store_for(&server).await;

        Mock::given(method("POST"))
            .and(path("/messages.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "-N1"})))
            .expect(1)
            .mount(&server)
            .await;

        let items = vec![
            NewMessage {
                phone_number: "1234567890".to_string(),
                message: "ok".to_string(),
            },
            NewMessage {
                phone_number: "bad".to_string(),
                message: "never written".to_string(),
            },
            NewMessage {
                phone_number: "1234567890".to_string(),
                message: "never reached".to_string(),
            },
        ];
        let err = store.create_bulk(&items, "api-bulk").await.unwrap_err();
        assert!(matches!(err, RelayqError::Validation(_)));
        // Only the first item was written.
        server.verify().await;
    }
}
