use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::models::{DataSnapshot, ProgressSnapshot, Snapshot, SnapshotKind};
use crate::session::SessionId;
use crate::store::{KeyValueStore, StoreError};

/// Storage key for one snapshot of one session
pub fn cache_key(id: &SessionId, kind: SnapshotKind) -> String {
    format!("{}.{}", id, kind.key_suffix())
}

/// A stored snapshot exactly as it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedBlob {
    pub kind: SnapshotKind,
    json: String,
}

impl CachedBlob {
    pub fn as_str(&self) -> &str {
        &self.json
    }

    pub fn into_string(self) -> String {
        self.json
    }

    pub fn decode<S: Snapshot>(&self) -> Option<S> {
        match serde_json::from_str(&self.json) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                debug!(kind = %self.kind, error = %e, "Cached blob does not decode as snapshot");
                None
            }
        }
    }
}

#[derive(Clone)]
pub struct SnapshotCache {
    store: Arc<dyn KeyValueStore>,
}

impl SnapshotCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Store the canonical serialization of `snapshot`. Saving an equal
    /// snapshot again writes identical bytes.
    pub fn save<S: Snapshot>(&self, id: &SessionId, snapshot: &S) -> Result<()> {
        let json = snapshot
            .canonical_json()
            .with_context(|| format!("Failed to serialize {} snapshot for {}", S::KIND, id))?;
        self.store
            .set(&cache_key(id, S::KIND), &json)
            .with_context(|| format!("Failed to store {} snapshot for {}", S::KIND, id))?;
        debug!(session = %id, kind = %S::KIND, bytes = json.len(), "Saved snapshot");
        Ok(())
    }

    pub fn save_progress(&self, id: &SessionId, snapshot: &ProgressSnapshot) -> Result<()> {
        self.save(id, snapshot)
    }

    /// Todos are stored sorted by id.
    pub fn save_data(&self, id: &SessionId, snapshot: &DataSnapshot) -> Result<()> {
        self.save(id, snapshot)
    }

    /// Raw stored blob. Anything that is not JSON counts as absent.
    pub fn load(&self, id: &SessionId, kind: SnapshotKind) -> Option<CachedBlob> {
        let json = self.store.get(&cache_key(id, kind))?;
        if let Err(e) = serde_json::from_str::<serde_json::Value>(&json) {
            warn!(session = %id, kind = %kind, error = %e, "Ignoring malformed cached snapshot");
            return None;
        }
        Some(CachedBlob { kind, json })
    }

    pub fn load_snapshot<S: Snapshot>(&self, id: &SessionId) -> Option<S> {
        self.load(id, S::KIND)?.decode()
    }

    pub fn load_progress(&self, id: &SessionId) -> Option<ProgressSnapshot> {
        self.load_snapshot(id)
    }

    pub fn load_data(&self, id: &SessionId) -> Option<DataSnapshot> {
        self.load_snapshot(id)
    }

    pub fn has(&self, id: &SessionId, kind: SnapshotKind) -> bool {
        self.load(id, kind).is_some()
    }

    /// Drop both snapshots for a session
    pub fn forget(&self, id: &SessionId) -> Result<(), StoreError> {
        for kind in SnapshotKind::ALL {
            self.store.remove(&cache_key(id, kind))?;
        }
        debug!(session = %id, "Forgot cached snapshots");
        Ok(())
    }
}
