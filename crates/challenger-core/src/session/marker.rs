use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::SessionId;
use crate::store::KeyValueStore;

/// Slot holding the current session. Same name the server uses for the
/// database-selection cookie.
pub const MARKER_KEY: &str = "X-THINGIFIER-DATABASE-NAME";

/// Upper bound on the marker lifetime, keeps the expiry representable
const MAX_TTL_DAYS: i64 = 36_500;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MarkerSlot {
    value: String,
    expires_at: DateTime<Utc>,
}

impl MarkerSlot {
    fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }
}

/// The "current session" marker: at most one session id with a time-to-live.
#[derive(Clone)]
pub struct SessionMarker {
    store: Arc<dyn KeyValueStore>,
}

impl SessionMarker {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Current session, if one is set and has not expired.
    /// Absent, expired and unreadable slots all read as `None`.
    pub fn get(&self) -> Option<SessionId> {
        let raw = self.store.get(MARKER_KEY)?;
        let slot: MarkerSlot = match serde_json::from_str(&raw) {
            Ok(slot) => slot,
            Err(e) => {
                debug!(error = %e, "Unreadable session marker, treating as unset");
                return None;
            }
        };
        if slot.is_expired() {
            return None;
        }
        SessionId::new(slot.value).ok()
    }

    /// Set the current session for `ttl_days`.
    ///
    /// `None` or a non-positive ttl clears the slot. Store failures are
    /// logged and otherwise ignored; the marker is a convenience, not state
    /// anything depends on for correctness.
    pub fn set(&self, id: Option<&SessionId>, ttl_days: i64) {
        let result = match id {
            Some(id) if ttl_days > 0 => {
                let slot = MarkerSlot {
                    value: id.to_string(),
                    expires_at: Utc::now() + Duration::days(ttl_days.min(MAX_TTL_DAYS)),
                };
                match serde_json::to_string(&slot) {
                    Ok(json) => self.store.set(MARKER_KEY, &json),
                    Err(e) => {
                        warn!(error = %e, "Failed to serialize session marker");
                        return;
                    }
                }
            }
            _ => self.store.remove(MARKER_KEY),
        };

        if let Err(e) = result {
            warn!(error = %e, "Failed to update session marker");
        }
    }

    /// Forget the current session
    pub fn clear(&self) {
        self.set(None, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn marker() -> (Arc<MemoryStore>, SessionMarker) {
        let store = Arc::new(MemoryStore::new());
        let marker = SessionMarker::new(store.clone());
        (store, marker)
    }

    #[test]
    fn test_set_and_get() {
        let (_, marker) = marker();
        assert!(marker.get().is_none());

        let id = SessionId::new("abc").unwrap();
        marker.set(Some(&id), 7);
        assert_eq!(marker.get(), Some(id));
    }

    #[test]
    fn test_empty_with_zero_ttl_clears() {
        let (store, marker) = marker();
        marker.set(Some(&SessionId::new("abc").unwrap()), 7);

        marker.set(None, 0);
        assert!(marker.get().is_none());
        assert!(store.get(MARKER_KEY).is_none());
    }

    #[test]
    fn test_zero_ttl_with_id_clears() {
        let (_, marker) = marker();
        let id = SessionId::new("abc").unwrap();
        marker.set(Some(&id), 7);
        marker.set(Some(&id), 0);
        assert!(marker.get().is_none());
    }

    #[test]
    fn test_expired_slot_reads_empty() {
        let (store, marker) = marker();
        let slot = MarkerSlot {
            value: "abc".to_string(),
            expires_at: Utc::now() - Duration::minutes(1),
        };
        store
            .set(MARKER_KEY, &serde_json::to_string(&slot).unwrap())
            .unwrap();

        assert!(marker.get().is_none());
    }

    #[test]
    fn test_corrupt_slot_reads_empty() {
        let (store, marker) = marker();
        store.set(MARKER_KEY, "abc; expires=Thu").unwrap();
        assert!(marker.get().is_none());

        store
            .set(MARKER_KEY, r#"{"value":"","expires_at":"2999-01-01T00:00:00Z"}"#)
            .unwrap();
        assert!(marker.get().is_none());
    }
}
