use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info};

use super::ApiError;
use crate::cache::SnapshotCache;
use crate::models::SnapshotKind;
use crate::session::SessionId;

/// Full-replace write of one session resource.
#[async_trait]
pub trait OverwriteTransport: Send + Sync {
    /// Replace the server-side `kind` resource of session `id` with `body`
    /// and return the server's JSON acknowledgment.
    async fn overwrite(
        &self,
        kind: SnapshotKind,
        id: &SessionId,
        body: String,
    ) -> Result<Value, ApiError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum RestoreOutcome {
    /// No snapshot cached; the server was not contacted.
    NothingCached,
    /// The server accepted the cached snapshot.
    Restored { acknowledgment: Value },
}

impl RestoreOutcome {
    pub fn is_restored(&self) -> bool {
        matches!(self, RestoreOutcome::Restored { .. })
    }
}

/// Pushes cached snapshots back to the server, last write wins.
///
/// The request body is the cached blob byte for byte. Failures go back to the
/// caller untouched: there is no retry and the cache is never modified here.
#[derive(Clone)]
pub struct RestoreClient {
    cache: SnapshotCache,
    transport: Arc<dyn OverwriteTransport>,
}

impl RestoreClient {
    pub fn new(cache: SnapshotCache, transport: Arc<dyn OverwriteTransport>) -> Self {
        Self { cache, transport }
    }

    pub async fn restore(
        &self,
        id: &SessionId,
        kind: SnapshotKind,
    ) -> Result<RestoreOutcome, ApiError> {
        let Some(blob) = self.cache.load(id, kind) else {
            debug!(session = %id, kind = %kind, "Nothing cached to restore");
            return Ok(RestoreOutcome::NothingCached);
        };

        let acknowledgment = self
            .transport
            .overwrite(kind, id, blob.into_string())
            .await?;
        info!(session = %id, kind = %kind, "Restored cached snapshot");
        Ok(RestoreOutcome::Restored { acknowledgment })
    }

    pub async fn restore_progress(&self, id: &SessionId) -> Result<RestoreOutcome, ApiError> {
        self.restore(id, SnapshotKind::Progress).await
    }

    pub async fn restore_data(&self, id: &SessionId) -> Result<RestoreOutcome, ApiError> {
        self.restore(id, SnapshotKind::Data).await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::models::{DataSnapshot, ProgressSnapshot, TodoItem};
    use crate::store::{KeyValueStore, MemoryStore};

    /// Records every overwrite and answers with a canned result.
    #[derive(Default)]
    pub(crate) struct RecordingTransport {
        pub calls: Mutex<Vec<(SnapshotKind, SessionId, String)>>,
        pub fail: bool,
    }

    impl RecordingTransport {
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> Vec<(SnapshotKind, SessionId, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl OverwriteTransport for RecordingTransport {
        async fn overwrite(
            &self,
            kind: SnapshotKind,
            id: &SessionId,
            body: String,
        ) -> Result<Value, ApiError> {
            self.calls.lock().unwrap().push((kind, id.clone(), body));
            if self.fail {
                Err(ApiError::ServerError("boom".to_string()))
            } else {
                Ok(json!({"status": "ok"}))
            }
        }
    }

    fn id(s: &str) -> SessionId {
        SessionId::new(s).unwrap()
    }

    fn setup(transport: RecordingTransport) -> (Arc<MemoryStore>, Arc<RecordingTransport>, RestoreClient) {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(transport);
        let client = RestoreClient::new(SnapshotCache::new(store.clone()), transport.clone());
        (store, transport, client)
    }

    #[tokio::test]
    async fn test_nothing_cached_makes_no_call() {
        let (_, transport, client) = setup(RecordingTransport::default());

        let outcome = client.restore_progress(&id("abc")).await.unwrap();
        assert_eq!(outcome, RestoreOutcome::NothingCached);
        assert_eq!(client.restore_data(&id("abc")).await.unwrap(), RestoreOutcome::NothingCached);
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_blob_makes_no_call() {
        let (store, transport, client) = setup(RecordingTransport::default());
        store.set("abc.progress", "{truncated").unwrap();
        store.set("abc.data", "not json at all").unwrap();

        assert_eq!(
            client.restore_progress(&id("abc")).await.unwrap(),
            RestoreOutcome::NothingCached
        );
        assert_eq!(
            client.restore_data(&id("abc")).await.unwrap(),
            RestoreOutcome::NothingCached
        );
        assert!(transport.calls().is_empty());
        assert_eq!(store.get("abc.progress").as_deref(), Some("{truncated"));
    }

    #[tokio::test]
    async fn test_restore_sends_cached_bytes_verbatim() {
        let (store, transport, client) = setup(RecordingTransport::default());
        let cached = r#"{"challengeStatus":{"a":true},"xChallenger":"xyz"}"#;
        store.set("xyz.progress", cached).unwrap();

        let outcome = client.restore_progress(&id("xyz")).await.unwrap();

        assert_eq!(
            outcome,
            RestoreOutcome::Restored {
                acknowledgment: json!({"status": "ok"})
            }
        );
        assert_eq!(
            transport.calls(),
            vec![(SnapshotKind::Progress, id("xyz"), cached.to_string())]
        );
    }

    #[tokio::test]
    async fn test_restore_data_sends_sorted_blob() {
        let (store, transport, client) = setup(RecordingTransport::default());
        let cache = SnapshotCache::new(store.clone());
        cache
            .save_data(
                &id("abc"),
                &DataSnapshot::new(vec![TodoItem::new(2), TodoItem::new(1)]),
            )
            .unwrap();

        client.restore_data(&id("abc")).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, SnapshotKind::Data);
        assert_eq!(calls[0].2, r#"{"todos":[{"id":1},{"id":2}]}"#);
    }

    #[tokio::test]
    async fn test_failure_leaves_cache_intact() {
        let (store, transport, client) = setup(RecordingTransport::failing());
        let cache = SnapshotCache::new(store.clone());
        cache
            .save_progress(&id("abc"), &ProgressSnapshot::default())
            .unwrap();
        let before = store.get("abc.progress");

        let result = client.restore_progress(&id("abc")).await;

        assert!(matches!(result, Err(ApiError::ServerError(_))));
        assert_eq!(transport.calls().len(), 1);
        assert_eq!(store.get("abc.progress"), before);

        // Still available for another attempt
        assert!(client.restore_progress(&id("abc")).await.is_err());
        assert_eq!(transport.calls().len(), 2);
    }
}
