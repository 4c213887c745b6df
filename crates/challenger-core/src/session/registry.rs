use std::sync::Arc;

use tracing::{debug, warn};

use super::id::DELIMITER;
use super::{SessionId, SessionMarker};
use crate::store::{KeyValueStore, StoreError};

/// Slot holding the encoded registry
pub const REGISTRY_KEY: &str = "challenges-guids";

/// Encode members as `|id1||id2|...`.
pub fn encode(ids: &[SessionId]) -> String {
    let mut out = String::new();
    for id in ids {
        out.push(DELIMITER);
        out.push_str(id.as_str());
        out.push(DELIMITER);
    }
    out
}

/// Decode a `|id1||id2|...` string into members in encounter order.
///
/// Every complete `|token|` is kept. Stray text between tokens and an
/// unterminated tail are skipped, so one damaged fragment never costs the
/// intact members. Empty or invalid tokens are skipped; repeated ids keep
/// their first position.
pub fn decode(encoded: &str) -> Vec<SessionId> {
    let mut ids: Vec<SessionId> = Vec::new();
    let mut skipped = 0;
    let mut rest = encoded;

    while !rest.is_empty() {
        let Some(open) = rest.find(DELIMITER) else {
            skipped += 1;
            break;
        };
        if open > 0 {
            skipped += 1;
        }
        let body = &rest[open + DELIMITER.len_utf8()..];
        let Some(close) = body.find(DELIMITER) else {
            skipped += 1;
            break;
        };

        let token = &body[..close];
        if !token.is_empty() {
            match SessionId::new(token) {
                Ok(id) if !ids.contains(&id) => ids.push(id),
                Ok(_) => {}
                Err(e) => debug!(token, error = %e, "Skipping invalid registry token"),
            }
        }
        rest = &body[close + DELIMITER.len_utf8()..];
    }

    if skipped > 0 {
        warn!(fragments = skipped, "Ignoring malformed text in session registry");
    }
    ids
}

/// Every session the client has touched, in the order first seen.
///
/// The set is persisted as one delimited string. The current session marker
/// is folded into `list()` at read time without being written back.
#[derive(Clone)]
pub struct SessionRegistry {
    store: Arc<dyn KeyValueStore>,
    marker: SessionMarker,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn KeyValueStore>, marker: SessionMarker) -> Self {
        Self { store, marker }
    }

    /// Persisted members only, malformed fragments dropped.
    fn stored(&self) -> Vec<SessionId> {
        self.store
            .get(REGISTRY_KEY)
            .map(|encoded| decode(&encoded))
            .unwrap_or_default()
    }

    fn write(&self, ids: &[SessionId]) -> Result<(), StoreError> {
        if ids.is_empty() {
            self.store.remove(REGISTRY_KEY)
        } else {
            self.store.set(REGISTRY_KEY, &encode(ids))
        }
    }

    /// All known sessions, including the current one
    pub fn list(&self) -> Vec<SessionId> {
        let mut ids = self.stored();
        if let Some(current) = self.marker.get() {
            if !ids.contains(&current) {
                ids.push(current);
            }
        }
        ids
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.list().contains(id)
    }

    /// Record a session. Adding an existing member changes nothing.
    pub fn add(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut ids = self.stored();
        if ids.contains(id) {
            return Ok(());
        }
        ids.push(id.clone());
        debug!(session = %id, "Adding session to registry");
        self.write(&ids)
    }

    /// Drop a session, clearing the current marker if it points at it.
    /// Removing a non-member is a no-op.
    pub fn remove(&self, id: &SessionId) -> Result<(), StoreError> {
        let mut ids = self.stored();
        let before = ids.len();
        ids.retain(|member| member != id);
        if ids.len() != before {
            debug!(session = %id, "Removing session from registry");
            self.write(&ids)?;
        }

        if self.marker.get().as_ref() == Some(id) {
            self.marker.clear();
        }
        Ok(())
    }
}
