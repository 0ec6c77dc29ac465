// SPDX-FileCopyrightText: 2026 Relayq Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Database gateway: session lifecycle over the REST client.
//!
//! The gateway is constructed once by the composition root and shared by
//! reference; after a successful [`FirebaseGateway::initialize`] it is
//! read-only shared state.

use std::collections::BTreeMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures::Stream;
use relayq_config::model::FirebaseConfig;
use relayq_core::RelayqError;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;

use crate::client::{FirebaseClient, Query};
use crate::retry;
use crate::stream::DbEvent;

/// Initialization attempts before giving up.
pub const INIT_ATTEMPTS: u32 = 3;

/// Fixed delay between initialization attempts.
pub const INIT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Bound on connectivity probes.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Owns the connection to the external store and hands out the messages
/// collection handle.
pub struct FirebaseGateway {
    client: FirebaseClient,
    collection: String,
    ready: AtomicBool,
}

impl FirebaseGateway {
    /// Builds the gateway from configuration. No I/O happens here; call
    /// [`initialize`](Self::initialize) before using the collection.
    pub fn new(config: &FirebaseConfig) -> Result<Self, RelayqError> {
        let client = FirebaseClient::new(&config.database_url, config.auth_token.clone())?;
        Ok(Self {
            client,
            collection: config.collection.clone(),
            ready: AtomicBool::new(false),
        })
    }

    /// Establishes the session by probing the database.
    ///
    /// Idempotent: calling again after success logs and returns Ok. On
    /// failure the probe is retried up to [`INIT_ATTEMPTS`] times with
    /// [`INIT_RETRY_DELAY`] between attempts; the final error is returned
    /// and the caller decides whether it is fatal.
    pub async fn initialize(&self) -> Result<(), RelayqError> {
        if self.ready.load(Ordering::Acquire) {
            info!("database gateway already initialized");
            return Ok(());
        }

        retry::bounded(INIT_ATTEMPTS, INIT_RETRY_DELAY, "database probe", || {
            self.client.shallow_root(PROBE_TIMEOUT)
        })
        .await?;

        self.ready.store(true, Ordering::Release);
        info!(collection = %self.collection, "database gateway initialized");
        Ok(())
    }

    /// Handle to the messages collection.
    ///
    /// Fails with [`RelayqError::Uninitialized`] before a successful
    /// [`initialize`](Self::initialize).
    pub fn messages(&self) -> Result<CollectionRef, RelayqError> {
        if !self.ready.load(Ordering::Acquire) {
            return Err(RelayqError::Uninitialized);
        }
        Ok(CollectionRef {
            client: self.client.clone(),
            path: self.collection.clone(),
        })
    }

    /// Single bounded connectivity probe. Network failure maps to `false`,
    /// never to an error.
    pub async fn test_connectivity(&self) -> bool {
        self.client.shallow_root(PROBE_TIMEOUT).await.is_ok()
    }

    /// Raw client access for diagnostics.
    pub fn client(&self) -> &FirebaseClient {
        &self.client
    }
}

/// Returns true if `id` is usable as a database key (push ids always are;
/// caller-supplied ids from URL paths may not be).
pub fn is_valid_key(id: &str) -> bool {
    !id.is_empty() && !id.contains(['.', '#', '$', '[', ']', '/'])
}

/// Cloneable handle to one collection node.
#[derive(Debug, Clone)]
pub struct CollectionRef {
    client: FirebaseClient,
    path: String,
}

impl CollectionRef {
    fn child_path(&self, id: &str) -> String {
        format!("{}/{}", self.path, id)
    }

    /// Writes `value` under a generated key and returns the key.
    pub async fn push<T: Serialize>(&self, value: &T) -> Result<String, RelayqError> {
        self.client.push(&self.path, value).await
    }

    /// Reads one child record; `None` when absent.
    pub async fn get_child<T: DeserializeOwned>(&self, id: &str) -> Result<Option<T>, RelayqError> {
        self.client.get(&self.child_path(id)).await
    }

    /// Reads the collection with server-side query parameters.
    pub async fn query<T: DeserializeOwned>(
        &self,
        query: &Query,
    ) -> Result<BTreeMap<String, T>, RelayqError> {
        self.client.get_query(&self.path, query).await
    }

    /// Deletes one child record.
    pub async fn delete_child(&self, id: &str) -> Result<(), RelayqError> {
        self.client.delete(&self.child_path(id)).await
    }

    /// Opens a streaming subscription on one child record.
    pub async fn stream_child(
        &self,
        id: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Result<DbEvent, RelayqError>> + Send>>, RelayqError>
    {
        self.client.stream(&self.child_path(id)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(url: &str) -> FirebaseGateway {
        let config = FirebaseConfig {
            database_url: url.to_string(),
            auth_token: None,
            collection: "messages".to_string(),
        };
        FirebaseGateway::new(&config).unwrap()
    }

    #[tokio::test]
    async fn messages_before_initialize_is_uninitialized() {
        let gateway = gateway_for("http://127.0.0.1:1");
        let err = gateway.messages().unwrap_err();
        assert!(matches!(err, RelayqError::Uninitialized));
    }

    #[tokio::test]
    async fn initialize_succeeds_and_is_idempotent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server.uri());
        gateway.initialize().await.unwrap();
        assert!(gateway.messages().is_ok());

        // Second call is a no-op.
        gateway.initialize().await.unwrap();
    }

    #[tokio::test]
    async fn initialize_recovers_on_third_attempt() {
        let server = MockServer::start().await;

        // First two probes fail, third succeeds.
        Mock::given(method("GET"))
            .and(path("/.json"))
            .respond_with(ResponseTemplate::new(500))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("true"))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server.uri());
        gateway.initialize().await.unwrap();
        assert!(gateway.messages().is_ok());
    }

    #[tokio::test]
    async fn initialize_fails_after_three_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/.json"))
            .respond_with(ResponseTemplate::new(503))
            .expect(3)
            .mount(&server)
            .await;

        let gateway = gateway_for(&server.uri());
        assert!(gateway.initialize().await.is_err());
        assert!(matches!(
            gateway.messages().unwrap_err(),
            RelayqError::Uninitialized
        ));
    }

    #[tokio::test]
    async fn test_connectivity_never_errors() {
        // Nothing listens on port 1; probe must map failure to false.
        let gateway = gateway_for("http://127.0.0.1:1");
        assert!(!gateway.test_connectivity().await);
    }

    #[test]
    fn key_validity() {
        assert!(is_valid_key("-Nabc123XYZ"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("a/b"));
        assert!(!is_valid_key("a.b"));
        assert!(!is_valid_key("$priority"));
    }
}
