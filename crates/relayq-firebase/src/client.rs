// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Firebase Realtime Database REST API.
//!
//! Provides [`FirebaseClient`] which handles request construction, the
//! optional `?auth=` database secret, range queries, and SSE streaming
//! subscriptions.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::time::Duration;

use futures::Stream;
use relayq_core::RelayqError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::stream::{self, DbEvent};

/// Server-side query parameters for a collection read.
///
/// Mirrors the RTDB REST query surface this service uses: `orderBy`,
/// `limitToLast`, and `startAt`. `orderBy` values are JSON-encoded on the
/// wire (the child key is sent in double quotes), which is handled here.
#[derive(Debug, Clone, Default)]
pub struct Query {
    /// Child key to index on, e.g. `createdAt`.
    pub order_by: Option<String>,
    /// Return only the last N records in index order.
    pub limit_to_last: Option<usize>,
    /// Inclusive lower bound on the indexed value.
    pub start_at: Option<i64>,
}

impl Query {
    /// Order by `createdAt`, the only index this service queries on.
    pub fn by_created_at() -> Self {
        Self {
            order_by: Some("createdAt".to_string()),
            ..Self::default()
        }
    }

    /// Cap the result to the last `n` records in index order.
    pub fn limit_to_last(mut self, n: usize) -> Self {
        self.limit_to_last = Some(n);
        self
    }

    /// Only records whose indexed value is `>= value`.
    pub fn start_at(mut self, value: i64) -> Self {
        self.start_at = Some(value);
        self
    }

    fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(ref key) = self.order_by {
            params.push(("orderBy", format!("\"{key}\"")));
        }
        if let Some(n) = self.limit_to_last {
            params.push(("limitToLast", n.to_string()));
        }
        if let Some(v) = self.start_at {
            params.push(("startAt", v.to_string()));
        }
        params
    }
}

/// Response body of a REST `POST` (push): the generated child key.
#[derive(Debug, serde::Deserialize)]
struct PushResponse {
    name: String,
}

/// Thin typed wrapper over the Realtime Database REST API.
///
/// Cheap to clone; the underlying `reqwest::Client` pools connections.
/// The client carries no per-request timeout so that streaming
/// subscriptions stay open; bounded operations pass their own deadline.
#[derive(Debug, Clone)]
pub struct FirebaseClient {
    http: reqwest::Client,
    base_url: String,
    auth_token: Option<String>,
}

impl FirebaseClient {
    /// Creates a client for the database at `database_url`.
    ///
    /// `auth_token` is the database secret appended as `?auth=` to every
    /// request; `None` for an open database.
    pub fn new(database_url: &str, auth_token: Option<String>) -> Result<Self, RelayqError> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|e| RelayqError::Upstream {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: database_url.trim_end_matches('/').to_string(),
            auth_token,
        })
    }

    /// REST URL of a database node: `<base>/<path>.json`.
    fn node_url(&self, path: &str) -> String {
        format!("{}/{}.json", self.base_url, path.trim_matches('/'))
    }

    fn auth_params(&self) -> Vec<(&'static str, String)> {
        match self.auth_token {
            Some(ref token) => vec![("auth", token.clone())],
            None => Vec::new(),
        }
    }

    /// Writes `value` under a store-generated key and returns that key.
    pub async fn push<T: Serialize>(&self, path: &str, value: &T) -> Result<String, RelayqError> {
        let response = self
            .http
            .post(self.node_url(path))
            .query(&self.auth_params())
            .json(value)
            .send()
            .await
            .map_err(request_error)?;

        let body = read_success_body(response).await?;
        let pushed: PushResponse =
            serde_json::from_str(&body).map_err(|e| RelayqError::Upstream {
                message: format!("unexpected push response: {e}"),
                source: Some(Box::new(e)),
            })?;
        debug!(path, id = %pushed.name, "record pushed");
        Ok(pushed.name)
    }

    /// Reads a single node. A JSON `null` body means the node is absent.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, RelayqError> {
        let response = self
            .http
            .get(self.node_url(path))
            .query(&self.auth_params())
            .send()
            .await
            .map_err(request_error)?;

        let body = read_success_body(response).await?;
        serde_json::from_str::<Option<T>>(&body).map_err(|e| RelayqError::Upstream {
            message: format!("failed to parse record at {path}: {e}"),
            source: Some(Box::new(e)),
        })
    }

    /// Reads a collection node with server-side query parameters.
    ///
    /// Returns a key-to-record map; an absent node yields an empty map.
    pub async fn get_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &Query,
    ) -> Result<BTreeMap<String, T>, RelayqError> {
        let mut params = self.auth_params();
        params.extend(query.params());

        let response = self
            .http
            .get(self.node_url(path))
            .query(&params)
            .send()
            .await
            .map_err(request_error)?;

        let body = read_success_body(response).await?;
        let records: Option<BTreeMap<String, T>> =
            serde_json::from_str(&body).map_err(|e| RelayqError::Upstream {
                message: format!("failed to parse collection at {path}: {e}"),
                source: Some(Box::new(e)),
            })?;
        Ok(records.unwrap_or_default())
    }

    /// Deletes a node. Deleting an absent node succeeds (the REST API
    /// returns 200 either way); callers that need existence semantics must
    /// read first.
    pub async fn delete(&self, path: &str) -> Result<(), RelayqError> {
        let response = self
            .http
            .delete(self.node_url(path))
            .query(&self.auth_params())
            .send()
            .await
            .map_err(request_error)?;

        read_success_body(response).await?;
        debug!(path, "node deleted");
        Ok(())
    }

    /// Bounded connectivity read: a shallow `GET` of the database root.
    ///
    /// Succeeds iff the database answered 2xx within `timeout`.
    pub async fn shallow_root(&self, timeout: Duration) -> Result<(), RelayqError> {
        let mut params = self.auth_params();
        params.push(("shallow", "true".to_string()));

        let response = self
            .http
            .get(format!("{}/.json", self.base_url))
            .query(&params)
            .timeout(timeout)
            .send()
            .await
            .map_err(request_error)?;

        read_success_body(response).await?;
        Ok(())
    }

    /// Opens an SSE streaming subscription on a node.
    ///
    /// The subscription stays open until the returned stream is dropped;
    /// dropping it is the detach path.
    pub async fn stream(
        &self,
        path: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<DbEvent, RelayqError>> + Send>>, RelayqError>
    {
        let response = self
            .http
            .get(self.node_url(path))
            .query(&self.auth_params())
            .header("accept", "text/event-stream")
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayqError::Upstream {
                message: format!("stream subscription failed ({status}): {body}"),
                source: None,
            });
        }

        debug!(path, "streaming subscription opened");
        Ok(stream::parse_event_stream(response))
    }
}

fn request_error(e: reqwest::Error) -> RelayqError {
    RelayqError::Upstream {
        message: format!("database request failed: {e}"),
        source: Some(Box::new(e)),
    }
}

/// Converts a non-2xx response into an `Upstream` error, otherwise returns
/// the body text.
async fn read_success_body(response: reqwest::Response) -> Result<String, RelayqError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| RelayqError::Upstream {
        message: format!("failed to read response body: {e}"),
        source: Some(Box::new(e)),
    })?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(RelayqError::Upstream {
            message: format!("database returned {status}: {body}"),
            source: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> FirebaseClient {
        FirebaseClient::new(&server.uri(), None).unwrap()
    }

    #[tokio::test]
    async fn push_returns_generated_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/messages.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "-Nabc123"})))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let id = client
            .push("messages", &json!({"message": "hi"}))
            .await
            .unwrap();
        assert_eq!(id, "-Nabc123");
    }

    #[tokio::test]
    async fn get_maps_null_body_to_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/messages/missing.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let record: Option<serde_json::Value> = client.get("messages/missing").await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn get_query_sends_quoted_order_by_and_range() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/messages.json"))
            .and(query_param("orderBy", "\"createdAt\""))
            .and(query_param("limitToLast", "50"))
            .and(query_param("startAt", "1000"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "a": {"message": "one"},
                "b": {"message": "two"}
            })))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let query = Query::by_created_at().limit_to_last(50).start_at(1000);
        let records: BTreeMap<String, serde_json::Value> =
            client.get_query("messages", &query).await.unwrap();
        assert_eq!(records.len(), 2);
    }

    #[tokio::test]
    async fn get_query_empty_collection_yields_empty_map() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/messages.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let client = test_client(&server);
        let records: BTreeMap<String, serde_json::Value> = client
            .get_query("messages", &Query::by_created_at())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn auth_token_is_sent_on_every_request() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/messages/x.json"))
            .and(query_param("auth", "db-secret"))
            .respond_with(ResponseTemplate::new(200).set_body_string("null"))
            .mount(&server)
            .await;

        let client = FirebaseClient::new(&server.uri(), Some("db-secret".to_string())).unwrap();
        let record: Option<serde_json::Value> = client.get("messages/x").await.unwrap();
        assert!(record.is_none());
    }

    #[tokio::test]
    async fn non_success_status_is_an_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/messages.json"))
            .respond_with(
                ResponseTemplate::new(401).set_body_json(json!({"error": "Permission denied"})),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result: Result<Option<serde_json::Value>, _> = client.get("messages").await;
        let err = result.unwrap_err().to_string();
        assert!(err.contains("401"), "got: {err}");
        assert!(err.contains("Permission denied"), "got: {err}");
    }

    #[tokio::test]
    async fn shallow_root_times_out_against_slow_database() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("true")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let client = test_client(&server);
        let result = client.shallow_root(Duration::from_millis(100)).await;
        assert!(result.is_err());
    }
}
