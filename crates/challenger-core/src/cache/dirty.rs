use tracing::warn;

use super::SnapshotCache;
use crate::models::Snapshot;
use crate::session::SessionId;

impl SnapshotCache {
    /// Whether saving `live` would change the cache.
    ///
    /// True when nothing is cached for this session and kind, or the cached
    /// bytes differ from the canonical serialization of `live`. Never writes.
    pub fn is_dirty<S: Snapshot>(&self, id: &SessionId, live: &S) -> bool {
        let Some(cached) = self.load(id, S::KIND) else {
            return true;
        };
        match live.canonical_json() {
            Ok(json) => json != cached.as_str(),
            Err(e) => {
                warn!(session = %id, kind = %S::KIND, error = %e, "Failed to serialize live snapshot");
                true
            }
        }
    }
}
