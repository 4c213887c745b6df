//! Session tracker: the single entry point tying the marker, registry,
//! snapshot cache and restore client together over one store.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

use crate::api::{ApiError, OverwriteTransport, RestoreClient, RestoreOutcome};
use crate::cache::SnapshotCache;
use crate::models::{DataSnapshot, ProgressSnapshot};
use crate::session::{SessionId, SessionMarker, SessionRegistry};
use crate::status::{session_status, SessionStatus};
use crate::store::KeyValueStore;

pub struct ChallengeTracker {
    marker: SessionMarker,
    registry: SessionRegistry,
    cache: SnapshotCache,
    restorer: RestoreClient,
    marker_ttl_days: i64,
}

impl ChallengeTracker {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        transport: Arc<dyn OverwriteTransport>,
        marker_ttl_days: i64,
    ) -> Self {
        let marker = SessionMarker::new(store.clone());
        let registry = SessionRegistry::new(store.clone(), marker.clone());
        let cache = SnapshotCache::new(store);
        let restorer = RestoreClient::new(cache.clone(), transport);
        Self {
            marker,
            registry,
            cache,
            restorer,
            // adopt must always leave a current session behind
            marker_ttl_days: marker_ttl_days.max(1),
        }
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    pub fn current(&self) -> Option<SessionId> {
        self.marker.get()
    }

    /// Known sessions, current one included
    pub fn sessions(&self) -> Vec<SessionId> {
        self.registry.list()
    }

    /// Make `id` the current session and remember it.
    pub fn adopt(&self, id: &SessionId) -> Result<()> {
        self.registry
            .add(id)
            .with_context(|| format!("Failed to register session {}", id))?;
        self.marker.set(Some(id), self.marker_ttl_days);
        info!(session = %id, "Adopted session");
        Ok(())
    }

    /// Drop every trace of a session: cached snapshots, registry membership
    /// and the current marker if it points at it.
    ///
    /// Snapshots go first so a failure leaves the session listed and the
    /// forget can be retried, instead of leaving unreachable blobs behind.
    pub fn forget(&self, id: &SessionId) -> Result<()> {
        self.cache
            .forget(id)
            .with_context(|| format!("Failed to remove cached snapshots for {}", id))?;
        self.registry
            .remove(id)
            .with_context(|| format!("Failed to remove session {} from registry", id))?;
        info!(session = %id, "Forgot session");
        Ok(())
    }

    pub fn save_progress(&self, id: &SessionId, live: &ProgressSnapshot) -> Result<()> {
        self.cache.save_progress(id, live)
    }

    pub fn save_data(&self, id: &SessionId, live: &DataSnapshot) -> Result<()> {
        self.cache.save_data(id, live)
    }

    pub fn status(
        &self,
        id: &SessionId,
        live_progress: Option<&ProgressSnapshot>,
        live_data: Option<&DataSnapshot>,
    ) -> SessionStatus {
        session_status(&self.cache, id, live_progress, live_data)
    }

    pub async fn restore_progress(&self, id: &SessionId) -> Result<RestoreOutcome, ApiError> {
        self.restorer.restore_progress(id).await
    }

    pub async fn restore_data(&self, id: &SessionId) -> Result<RestoreOutcome, ApiError> {
        self.restorer.restore_data(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::restore::tests::RecordingTransport;
    use crate::models::{SnapshotKind, TodoItem};
    use crate::store::MemoryStore;

    fn id(s: &str) -> SessionId {
        SessionId::new(s).unwrap()
    }

    fn tracker() -> (Arc<MemoryStore>, Arc<RecordingTransport>, ChallengeTracker) {
        let store = Arc::new(MemoryStore::new());
        let transport = Arc::new(RecordingTransport::default());
        let tracker = ChallengeTracker::new(store.clone(), transport.clone(), 30);
        (store, transport, tracker)
    }

    #[test]
    fn test_adopt_sets_current_and_registers() {
        let (_, _, tracker) = tracker();
        tracker.adopt(&id("a")).unwrap();
        tracker.adopt(&id("b")).unwrap();

        assert_eq!(tracker.current(), Some(id("b")));
        assert_eq!(tracker.sessions(), vec![id("a"), id("b")]);
    }

    #[test]
    fn test_adopt_with_non_positive_ttl_still_sets_current() {
        let store = Arc::new(MemoryStore::new());
        let tracker = ChallengeTracker::new(store, Arc::new(RecordingTransport::default()), 0);

        tracker.adopt(&id("abc")).unwrap();
        assert_eq!(tracker.current(), Some(id("abc")));
    }

    #[test]
    fn test_forget_removes_everything() {
        let (store, _, tracker) = tracker();
        tracker.adopt(&id("abc")).unwrap();
        tracker
            .save_progress(&id("abc"), &ProgressSnapshot::default())
            .unwrap();
        tracker
            .save_data(&id("abc"), &DataSnapshot::new(vec![TodoItem::new(1)]))
            .unwrap();

        tracker.forget(&id("abc")).unwrap();

        assert!(!tracker.sessions().contains(&id("abc")));
        assert!(tracker.current().is_none());
        assert!(!tracker.cache().has(&id("abc"), SnapshotKind::Progress));
        assert!(!tracker.cache().has(&id("abc"), SnapshotKind::Data));
        assert!(store.is_empty());
    }

    #[test]
    fn test_forget_unknown_session_is_ok() {
        let (_, _, tracker) = tracker();
        tracker.adopt(&id("a")).unwrap();
        tracker.forget(&id("zzz")).unwrap();
        assert_eq!(tracker.sessions(), vec![id("a")]);
    }

    #[tokio::test]
    async fn test_save_then_restore_round_trip() {
        let (_, transport, tracker) = tracker();
        let mut live = ProgressSnapshot::default();
        live.challenge_status.insert("a".into(), true);
        live.challenge_status.insert("b".into(), false);

        assert!(tracker.status(&id("abc"), Some(&live), None).progress.can_save());
        tracker.save_progress(&id("abc"), &live).unwrap();
        assert!(!tracker.status(&id("abc"), Some(&live), None).progress.can_save());

        let outcome = tracker.restore_progress(&id("abc")).await.unwrap();
        assert!(outcome.is_restored());
        assert_eq!(
            transport.calls()[0].2,
            r#"{"challengeStatus":{"a":true,"b":false}}"#
        );

        assert_eq!(
            tracker.restore_data(&id("abc")).await.unwrap(),
            RestoreOutcome::NothingCached
        );
        assert_eq!(transport.calls().len(), 1);
    }
}
